use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Header carrying the authenticated user id, set by the upstream proxy
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the user's role, set by the upstream proxy
pub const USER_ROLE_HEADER: &str = "x-user-role";

const ADMIN_ROLE: &str = "admin";

/// Caller identity forwarded by the upstream proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub is_admin: bool,
}

/// Caller that carries the admin role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser(pub CurrentUser);

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl CurrentUser {
    fn from_parts(parts: &Parts) -> Option<Self> {
        let id = header_value(parts, USER_ID_HEADER)?;
        let is_admin = header_value(parts, USER_ROLE_HEADER)
            .is_some_and(|role| role.eq_ignore_ascii_case(ADMIN_ROLE));

        Some(Self {
            id: id.to_string(),
            is_admin,
        })
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        CurrentUser::from_parts(parts)
            .ok_or_else(|| AppError::Unauthorized("Missing user identity".to_string()))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let is_admin = header_value(parts, USER_ROLE_HEADER)
            .is_some_and(|role| role.eq_ignore_ascii_case(ADMIN_ROLE));
        if !is_admin {
            return Err(AppError::Forbidden("Admin role required".to_string()));
        }

        // Admin calls without a user id are still attributed, just anonymously
        let id = header_value(parts, USER_ID_HEADER)
            .unwrap_or("admin")
            .to_string();

        Ok(AdminUser(CurrentUser { id, is_admin: true }))
    }
}
