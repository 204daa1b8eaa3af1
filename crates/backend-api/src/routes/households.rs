//! Household endpoints.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use billbuddy_database::{CreateHouseholdRequest, Household, UpdateHouseholdRequest};
use serde::Deserialize;

use crate::envelope::ApiSuccess;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::household;
use crate::state::AppState;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list_households(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> Result<ApiSuccess<Vec<Household>>, ApiError> {
    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    let (households, total) = household::list_households(state.pool(), &claims, page, limit).await?;

    Ok(ApiSuccess::new(households)
        .with_meta("page", page)
        .with_meta("limit", limit)
        .with_meta("total", total))
}

pub async fn create_household(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(request): Json<CreateHouseholdRequest>,
) -> Result<ApiSuccess<Household>, ApiError> {
    let created = household::create_household(state.pool(), &claims, request).await?;
    Ok(ApiSuccess::created(created))
}

pub async fn update_household(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(household_id): Path<String>,
    Json(patch): Json<UpdateHouseholdRequest>,
) -> Result<ApiSuccess<Household>, ApiError> {
    let updated = household::update_household(state.pool(), &claims, &household_id, patch).await?;
    Ok(ApiSuccess::new(updated))
}
