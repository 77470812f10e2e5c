//! Authenticated user identity.
//!
//! Credentials are handled upstream; requests arrive with the caller's id in
//! the `x-user-id` header.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller, as identified by the `x-user-id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

fn parse_header(parts: &Parts) -> Result<Option<Uuid>, ApiError> {
    let Some(value) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .map(Some)
        .ok_or_else(|| ApiError::Unauthenticated(format!("{USER_ID_HEADER} is not a valid UUID")))
}

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parse_header(parts)?
            .map(Self)
            .ok_or_else(|| {
                ApiError::Unauthenticated(format!("{USER_ID_HEADER} header is required"))
            })
    }
}

/// Anonymous requests extract as `None`; a malformed header is still
/// rejected.
impl<S: Send + Sync> OptionalFromRequestParts<S> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parse_header(parts)?.map(Self))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_valid_header_extracts_user() {
        let user_id = Uuid::new_v4();
        let mut parts = parts_with(Some(&user_id.to_string()));

        let user = <AuthenticatedUser as FromRequestParts<()>>::from_request_parts(&mut parts, &())
            .await
            .unwrap();

        assert_eq!(user, AuthenticatedUser(user_id));
    }

    #[tokio::test]
    async fn test_missing_header_is_rejected() {
        let mut parts = parts_with(None);

        let result =
            <AuthenticatedUser as FromRequestParts<()>>::from_request_parts(&mut parts, &()).await;

        assert!(matches!(result, Err(ApiError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn test_malformed_header_is_rejected() {
        let mut parts = parts_with(Some("not-a-uuid"));

        let result =
            <AuthenticatedUser as FromRequestParts<()>>::from_request_parts(&mut parts, &()).await;

        assert!(matches!(result, Err(ApiError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn test_optional_extraction_of_missing_header_is_none() {
        let mut parts = parts_with(None);

        let user =
            <AuthenticatedUser as OptionalFromRequestParts<()>>::from_request_parts(&mut parts, &())
                .await
                .unwrap();

        assert!(user.is_none());
    }
}
