//! Admin panel endpoints for compliance, risk, and webhook records.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use billbuddy_database::{
    ComplianceStatus, CreateRiskFlagRequest, RiskFlag, RiskFlagFilter, UpdateRiskFlagRequest,
    UpdateStatusRequest, WebhookStatus,
};
use serde::Deserialize;
use serde_json::json;

use crate::envelope::ApiSuccess;
use crate::error::ApiError;
use crate::services::admin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: Option<String>,
}

// ===== COMPLIANCE =====

pub async fn create_compliance(
    State(state): State<AppState>,
    Json(body): Json<StatusBody>,
) -> Result<ApiSuccess<ComplianceStatus>, ApiError> {
    let created = admin::create_compliance(state.pool(), body.status).await?;
    Ok(ApiSuccess::created(created))
}

pub async fn update_compliance(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
    Json(patch): Json<UpdateStatusRequest>,
) -> Result<ApiSuccess<ComplianceStatus>, ApiError> {
    let updated = admin::update_compliance(state.pool(), &record_id, patch.status).await?;
    Ok(ApiSuccess::new(updated))
}

pub async fn delete_compliance(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> Result<ApiSuccess<serde_json::Value>, ApiError> {
    admin::delete_compliance(state.pool(), &record_id).await?;
    Ok(ApiSuccess::new(json!({ "id": record_id })))
}

pub async fn list_compliance(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<ComplianceStatus>>, ApiError> {
    let statuses = admin::list_compliance(state.pool()).await?;
    Ok(ApiSuccess::new(statuses))
}

pub async fn compliance_metrics(
    State(state): State<AppState>,
) -> Result<ApiSuccess<serde_json::Value>, ApiError> {
    let compliant_count = admin::compliant_count(state.pool()).await?;
    Ok(ApiSuccess::new(json!({ "compliantCount": compliant_count })))
}

// ===== RISK FLAGS =====

pub async fn create_risk_flag(
    State(state): State<AppState>,
    Json(request): Json<CreateRiskFlagRequest>,
) -> Result<ApiSuccess<RiskFlag>, ApiError> {
    let created = admin::create_risk_flag(state.pool(), request).await?;
    Ok(ApiSuccess::created(created))
}

pub async fn update_risk_flag(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
    Json(patch): Json<UpdateRiskFlagRequest>,
) -> Result<ApiSuccess<RiskFlag>, ApiError> {
    let updated = admin::update_risk_flag(state.pool(), &record_id, patch).await?;
    Ok(ApiSuccess::new(updated))
}

pub async fn delete_risk_flag(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> Result<ApiSuccess<serde_json::Value>, ApiError> {
    admin::delete_risk_flag(state.pool(), &record_id).await?;
    Ok(ApiSuccess::new(json!({ "id": record_id })))
}

pub async fn list_risk_flags(
    State(state): State<AppState>,
    Query(filter): Query<RiskFlagFilter>,
) -> Result<ApiSuccess<Vec<RiskFlag>>, ApiError> {
    let flags = admin::list_risk_flags(state.pool(), &filter).await?;
    Ok(ApiSuccess::new(flags))
}

/// Unfiltered flag listing used by the dashboard refresh button.
pub async fn refresh_risk_flags(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<RiskFlag>>, ApiError> {
    let flags = admin::list_risk_flags(state.pool(), &RiskFlagFilter::default()).await?;
    Ok(ApiSuccess::new(flags))
}

// ===== WEBHOOKS =====

pub async fn create_webhook(
    State(state): State<AppState>,
    Json(body): Json<StatusBody>,
) -> Result<ApiSuccess<WebhookStatus>, ApiError> {
    let created = admin::create_webhook(state.pool(), body.status).await?;
    Ok(ApiSuccess::created(created))
}

pub async fn update_webhook(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
    Json(patch): Json<UpdateStatusRequest>,
) -> Result<ApiSuccess<WebhookStatus>, ApiError> {
    let updated = admin::update_webhook(state.pool(), &record_id, patch.status).await?;
    Ok(ApiSuccess::new(updated))
}

pub async fn delete_webhook(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> Result<ApiSuccess<serde_json::Value>, ApiError> {
    admin::delete_webhook(state.pool(), &record_id).await?;
    Ok(ApiSuccess::new(json!({ "id": record_id })))
}

pub async fn list_webhooks(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<WebhookStatus>>, ApiError> {
    let webhooks = admin::list_webhooks(state.pool()).await?;
    Ok(ApiSuccess::new(webhooks))
}

pub async fn webhook_health(
    State(state): State<AppState>,
) -> Result<ApiSuccess<serde_json::Value>, ApiError> {
    let healthy = admin::webhooks_healthy(state.pool()).await?;
    Ok(ApiSuccess::new(json!({ "healthy": healthy })))
}
