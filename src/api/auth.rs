//! Caller identity extraction.
//!
//! Authentication happens upstream; the gateway trusts the principal
//! forwarded in the [`USER_ID_HEADER`] header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::UserId;
use crate::error::GatewayError;

/// Header carrying the authenticated principal.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Principal making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| GatewayError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?
            .to_str()
            .map_err(|_| GatewayError::Unauthorized(format!("{USER_ID_HEADER} is not ASCII")))?;

        UserId::parse(raw)
            .map(Self)
            .ok_or_else(|| GatewayError::Unauthorized(format!("invalid {USER_ID_HEADER} value")))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(header: Option<&str>) -> Result<AuthenticatedUser, GatewayError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let Ok(request) = builder.body(()) else {
            panic!("request builds");
        };
        let (mut parts, ()) = request.into_parts();
        AuthenticatedUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_trimmed_principal() {
        let Ok(AuthenticatedUser(user)) = extract(Some("  alice ")).await else {
            panic!("expected principal");
        };
        assert_eq!(user.as_str(), "alice");
    }

    #[tokio::test]
    async fn missing_or_blank_header_is_unauthorized() {
        assert!(matches!(
            extract(None).await,
            Err(GatewayError::Unauthorized(_))
        ));
        assert!(matches!(
            extract(Some("   ")).await,
            Err(GatewayError::Unauthorized(_))
        ));
    }
}
