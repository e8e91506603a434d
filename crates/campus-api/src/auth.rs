//! Static bearer tokens for the admin API and the cron endpoints.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};

use crate::AppState;
use crate::error::ApiError;

/// The token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

// Digests have a fixed length, so the comparison does not leak the token length.
fn token_matches(expected: &str, presented: &str) -> bool {
    Sha256::digest(expected.as_bytes()) == Sha256::digest(presented.as_bytes())
}

/// Check `headers` against a configured secret.
///
/// An unset secret disables the endpoint rather than opening it.
pub fn authorize(expected: Option<&str>, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = expected.filter(|s| !s.is_empty()) else {
        return Err(ApiError::Unavailable("endpoint is not configured".to_string()));
    };
    match bearer_token(headers) {
        Some(token) if token_matches(expected, token) => Ok(()),
        Some(_) => Err(ApiError::Unauthorized("invalid token".to_string())),
        None => Err(ApiError::Unauthorized("missing bearer token".to_string())),
    }
}

/// Middleware guarding the admin API.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(err) = authorize(state.config.admin_token.as_deref(), request.headers()) {
        tracing::warn!(path = %request.uri().path(), error = %err, "Rejected admin request");
        return Err(err);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer  abc ")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_authorize() {
        assert!(authorize(Some("s3cret"), &headers("Bearer s3cret")).is_ok());
        assert!(matches!(
            authorize(Some("s3cret"), &headers("Bearer wrong")),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize(Some("s3cret"), &HeaderMap::new()),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize(None, &headers("Bearer s3cret")),
            Err(ApiError::Unavailable(_))
        ));
        assert!(matches!(
            authorize(Some(""), &headers("Bearer ")),
            Err(ApiError::Unavailable(_))
        ));
    }
}
