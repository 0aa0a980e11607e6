//! Owner identity extracted from the request.
//!
//! Authentication happens in front of this service. The authenticating
//! proxy sets `X-Fragments-Owner` to an opaque, already-validated owner id
//! (typically a hash of the user's email); this layer only checks that it
//! is present.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::response::ApiError;

pub const OWNER_HEADER: &str = "x-fragments-owner";

/// The owner every fragment operation in a request is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

impl Owner {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(ApiError::unauthorized)?;
        Ok(Owner(owner.to_string()))
    }
}
