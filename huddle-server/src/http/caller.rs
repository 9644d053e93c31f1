use crate::http::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use huddle_core::{HuddleError, USER_HEADER, UserId};

/// The user id a request acts as, taken from the `x-huddle-user` header.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub UserId);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_HEADER)
            .ok_or(HuddleError::Unauthorized)?;

        value
            .to_str()
            .ok()
            .and_then(|raw| raw.parse().ok())
            .map(Caller)
            .ok_or_else(|| HuddleError::BadRequest(format!("malformed {USER_HEADER} header")).into())
    }
}
