//! Bearer-token authentication middleware.
//!
//! # Token Extraction
//!
//! Tokens can be presented in two ways:
//! 1. **Authorization header**: `Authorization: Bearer <token>` - used for REST calls
//! 2. **Query parameter**: `?token=<token>` - used for the SSE endpoint
//!    (`EventSource` cannot set request headers)
//!
//! The token is resolved to a username through the session store before
//! any hub operation runs; an unknown or expired token gets 401.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::state::SharedState;

/// Username resolved from the caller's session, inserted into request
/// extensions by [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

/// Extract a bearer token from the Authorization header.
///
/// Returns None if the header is missing, malformed, or uses a different
/// auth scheme.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Extract a token from the URL query string (`?token=<value>`).
pub(crate) fn query_token(uri: &Uri) -> Option<String> {
    uri.query().and_then(|query| {
        query.split('&').find_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let value = parts.next()?;
            if key == "token" {
                Some(value.to_string())
            } else {
                None
            }
        })
    })
}

/// Middleware: resolve the presented token to a live session, or 401.
pub async fn require_session(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = bearer_token(req.headers())
        .map(str::to_string)
        .or_else(|| query_token(req.uri()));

    let session = token.and_then(|token| state.sessions.get_session(&token));

    match session {
        Some(session) => {
            req.extensions_mut().insert(CurrentUser(session.username));
            next.run(req).await
        }
        None => (StatusCode::UNAUTHORIZED, "Invalid or expired session").into_response(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn bearer_token_valid() {
        let headers = headers_with_auth("Bearer test-token-123");
        assert_eq!(bearer_token(&headers), Some("test-token-123"));
    }

    #[test]
    fn bearer_token_missing() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn bearer_token_wrong_scheme() {
        let headers = headers_with_auth("Basic dXNlcjpwYXNz");
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn query_token_valid() {
        let uri: Uri = "/api/events?token=test-token-456".parse().unwrap();
        assert_eq!(query_token(&uri), Some("test-token-456".to_string()));
    }

    #[test]
    fn query_token_with_other_params() {
        let uri: Uri = "/api/events?foo=bar&token=my-token&baz=qux".parse().unwrap();
        assert_eq!(query_token(&uri), Some("my-token".to_string()));
    }

    #[test]
    fn query_token_missing() {
        let uri: Uri = "/api/events?foo=bar".parse().unwrap();
        assert_eq!(query_token(&uri), None);
    }
}
