pub mod analytics;
pub mod catalog;
pub mod comments;
pub mod favorites;
pub mod overlay;
pub mod progress;
