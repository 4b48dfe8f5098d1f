use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Admin-curated overlay for one catalog movie, keyed by slug
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct TitleOverride {
    pub slug: String,
    pub custom_title: String,
    /// Catalog name captured the first time the movie was seen with an override
    pub original_title: Option<String>,
    pub custom_description: Option<String>,
    pub is_hidden: bool,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl TitleOverride {
    pub fn has_original_title(&self) -> bool {
        self.original_title
            .as_deref()
            .is_some_and(|title| !title.is_empty())
    }

    /// Name to show in place of the catalog name, if the admin set one
    pub fn display_title(&self) -> Option<&str> {
        let title = self.custom_title.trim();
        (!title.is_empty()).then_some(title)
    }

    /// Description to show in place of the catalog description
    pub fn display_description(&self) -> Option<&str> {
        self.custom_description
            .as_deref()
            .map(str::trim)
            .filter(|description| !description.is_empty())
    }

    pub(crate) fn touch(&mut self, actor: Option<&str>) {
        self.updated_at = Utc::now();
        self.updated_by = actor.map(str::to_string);
    }
}

/// Admin edit of a movie's title and description
#[derive(Debug, Clone, Deserialize)]
pub struct OverrideEdit {
    pub custom_title: String,
    #[serde(default)]
    pub custom_description: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
}

/// Hidden movie resolved for the admin listing
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HiddenMovie {
    pub slug: String,
    pub title: String,
    pub original_title: Option<String>,
    pub poster_url: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}
