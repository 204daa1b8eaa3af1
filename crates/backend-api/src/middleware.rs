//! Middleware for authentication and the process-wide layers.

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use billbuddy_auth::Claims;

use crate::error::ApiError;
use crate::state::AppState;
use crate::util::require_bearer;

/// Decoded claims of the authenticated caller, attached to the request
/// extensions by [`authenticate`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

/// The sole gate on every protected route. Verifies the bearer token and
/// attaches the decoded claims; never touches the database.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = require_bearer(request.headers())?;

    let claims = state
        .authenticator()
        .verify_token(&token)
        .map_err(|_| ApiError::invalid_token())?;

    request.extensions_mut().insert(AuthUser(claims));

    Ok(next.run(request).await)
}

/// Fixed-window rate limit applied ahead of routing.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = client_key(&request);

    if !state.rate_limiter().allow(&key).await {
        return Err(ApiError::rate_limited());
    }

    Ok(next.run(request).await)
}

/// Security headers stamped onto every response.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        "strict-transport-security",
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("x-xss-protection", HeaderValue::from_static("1; mode=block"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'self'"),
    );
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

/// Rate-limit key for a request: the first forwarded address when the
/// service sits behind a proxy, otherwise a single local bucket.
fn client_key(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| "local".to_string())
}
