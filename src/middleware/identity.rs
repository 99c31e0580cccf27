use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the authenticated caller's user id
///
/// Authentication happens upstream (gateway or session layer); this service
/// only trusts the resolved identity it is handed.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The calling user, resolved from `x-user-id`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Missing caller identity".to_string()))?;

        value
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Invalid caller identity".to_string()))
    }
}
