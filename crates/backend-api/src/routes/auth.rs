//! Authentication endpoints: register, login, refresh, logout, profile.

use axum::{extract::State, Extension, Json};
use billbuddy_auth::{AuthError, User};
use serde::Deserialize;
use serde_json::json;

use crate::envelope::ApiSuccess;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub household_id: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub token: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<ApiSuccess<User>, ApiError> {
    let username = request.username.unwrap_or_default();
    let password = request.password.unwrap_or_default();

    let user = state
        .authenticator()
        .register(
            &username,
            &password,
            request.household_id.as_deref(),
            request.role.as_deref(),
        )
        .await
        .map_err(|err| match err {
            AuthError::MissingCredentials => {
                ApiError::validation("Missing required fields")
                    .with_details(json!({ "username": username }))
            }
            AuthError::Database(cause) => ApiError::server_error("Failed to register user", cause),
            other => ApiError::from(other),
        })?;

    Ok(ApiSuccess::created(user))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<ApiSuccess<serde_json::Value>, ApiError> {
    let token = state
        .authenticator()
        .login(
            request.username.as_deref().unwrap_or_default(),
            request.password.as_deref().unwrap_or_default(),
        )
        .await
        .map_err(|err| match err {
            AuthError::Database(cause) => ApiError::server_error("Failed to login", cause),
            other => ApiError::from(other),
        })?;

    Ok(ApiSuccess::new(json!({ "token": token })))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<ApiSuccess<serde_json::Value>, ApiError> {
    let Some(token) = request.token.filter(|token| !token.is_empty()) else {
        return Err(ApiError::missing_token());
    };

    let token = state.authenticator().refresh(&token)?;

    Ok(ApiSuccess::new(json!({ "token": token })))
}

/// Stateless tokens cannot be revoked server-side; logout only
/// acknowledges so clients have a uniform call to drop their copy.
pub async fn logout() -> ApiSuccess<serde_json::Value> {
    ApiSuccess::new(json!({ "message": "Logged out" }))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> Result<ApiSuccess<User>, ApiError> {
    let user = state
        .authenticator()
        .user_profile(&claims.sub)
        .await
        .map_err(|err| match err {
            AuthError::Database(cause) => ApiError::server_error("Failed to fetch profile", cause),
            other => ApiError::from(other),
        })?;

    Ok(ApiSuccess::new(user))
}
