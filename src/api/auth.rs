//! Caller identity.

use super::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Header set by the authentication layer in front of this service.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Missing or invalid x-user-id header"))?;
        Ok(UserId(value.to_string()))
    }
}
