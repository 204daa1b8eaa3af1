//! Bill endpoints.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use billbuddy_database::{
    Bill, BillListFilter, BillSort, CreateBillRequest, UpdateBillRequest,
};
use serde::Deserialize;
use serde_json::json;

use crate::envelope::ApiSuccess;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::bill;
use crate::state::AppState;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillListQuery {
    pub household_id: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
}

pub async fn list_bills(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Query(query): Query<BillListQuery>,
) -> Result<ApiSuccess<Vec<Bill>>, ApiError> {
    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    let filter = BillListFilter {
        household_id: query.household_id,
        status: query.status,
        sort: query.sort.as_deref().map(BillSort::from).unwrap_or_default(),
        page,
        limit,
    };

    let (bills, total) = bill::list_bills(state.pool(), &claims, &filter).await?;

    Ok(ApiSuccess::new(bills)
        .with_meta("page", page)
        .with_meta("limit", limit)
        .with_meta("total", total))
}

pub async fn get_bill(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(bill_id): Path<String>,
) -> Result<ApiSuccess<Bill>, ApiError> {
    let found = bill::get_bill(state.pool(), &claims, &bill_id).await?;
    Ok(ApiSuccess::new(found))
}

pub async fn create_bill(
    State(state): State<AppState>,
    Extension(AuthUser(_claims)): Extension<AuthUser>,
    Json(request): Json<CreateBillRequest>,
) -> Result<ApiSuccess<Bill>, ApiError> {
    let created = bill::create_bill(state.pool(), request).await?;
    Ok(ApiSuccess::created(created))
}

pub async fn update_bill(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(bill_id): Path<String>,
    Json(patch): Json<UpdateBillRequest>,
) -> Result<ApiSuccess<Bill>, ApiError> {
    let updated = bill::update_bill(state.pool(), &claims, &bill_id, patch).await?;
    Ok(ApiSuccess::new(updated))
}

pub async fn delete_bill(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(bill_id): Path<String>,
) -> Result<ApiSuccess<serde_json::Value>, ApiError> {
    bill::delete_bill(state.pool(), &claims, &bill_id).await?;
    Ok(ApiSuccess::new(json!({ "id": bill_id })))
}
