//! # Authentication Module
//!
//! API key authentication for the Rational Onion HTTP API.
//!
//! ## Configuration
//!
//! Keys come from `Settings::api_keys` (`ONION_API_KEYS`, comma-separated).
//! With no keys configured, authentication is disabled.
//!
//! ## Usage
//!
//! Send a key in either header:
//! ```text
//! X-API-Key: <your-api-key>
//! Authorization: Bearer <your-api-key>
//! ```

use super::error::ApiError;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Paths served without a key.
const PUBLIC_PATHS: [&str; 2] = ["/", "/health"];

/// The configured key list.
pub type ApiKeys = Arc<[String]>;

// =============================================================================
// API KEY AUTHENTICATION
// =============================================================================

/// Extract the caller's key: `X-API-Key` first, then `Authorization`.
fn provided_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(key);
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v))
}

/// Constant-time comparison of two keys.
///
/// Both sides are padded to the same length so `ct_eq` always runs over
/// the same number of bytes.
fn key_matches(provided: &str, expected: &str) -> bool {
    let provided_bytes = provided.as_bytes();
    let expected_bytes = expected.as_bytes();

    let max_len = provided_bytes.len().max(expected_bytes.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided_bytes.len()].copy_from_slice(provided_bytes);
    padded_expected[..expected_bytes.len()].copy_from_slice(expected_bytes);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided_bytes.len() == expected_bytes.len()
}

/// Whether `provided` matches any configured key.
///
/// Every key is compared, so timing does not reveal which one matched.
pub fn is_authorized(keys: &[String], provided: &str) -> bool {
    keys.iter()
        .fold(false, |found, key| key_matches(provided, key) | found)
}

/// API key authentication middleware.
///
/// `/` and `/health` are always allowed. Every other path needs a key from
/// the configured list.
pub async fn api_key_auth_middleware(
    State(keys): State<ApiKeys>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if keys.is_empty() || PUBLIC_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let verdict = provided_key(request.headers()).map(|key| is_authorized(&keys, key));

    match verdict {
        Some(true) => Ok(next.run(request).await),
        Some(false) => {
            tracing::warn!(
                event = "auth_failure",
                reason = "invalid_api_key",
                path = request.uri().path(),
                "Authentication failed: invalid API key"
            );
            Err(ApiError::unauthorized("Invalid API key"))
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_api_key",
                path = request.uri().path(),
                "Missing API key"
            );
            Err(ApiError::unauthorized("API key is required"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn matching_requires_equal_length() {
        assert!(key_matches("secret", "secret"));
        assert!(!key_matches("secret", "secret2"));
        assert!(!key_matches("", "secret"));
    }

    #[test]
    fn any_configured_key_is_accepted() {
        let keys = vec!["first".to_string(), "second".to_string()];
        assert!(is_authorized(&keys, "second"));
        assert!(!is_authorized(&keys, "third"));
    }

    #[test]
    fn header_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-bearer"),
        );
        assert_eq!(provided_key(&headers), Some("from-bearer"));

        headers.insert(API_KEY_HEADER, HeaderValue::from_static("from-header"));
        assert_eq!(provided_key(&headers), Some("from-header"));
    }
}
