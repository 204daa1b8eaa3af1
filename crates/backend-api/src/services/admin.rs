//! Admin panel operations over the compliance, risk, and webhook
//! records. Gated by authentication only; any repository failure —
//! including an unknown record id on update or delete — surfaces as a
//! SERVER_ERROR with the cause attached as detail.

use billbuddy_database::{
    ComplianceRepository, ComplianceStatus, CreateRiskFlagRequest, RiskFlag, RiskFlagFilter,
    RiskFlagRepository, UpdateRiskFlagRequest, WebhookRepository, WebhookStatus,
};
use sqlx::SqlitePool;

use crate::error::ApiError;

// ===== COMPLIANCE =====

pub async fn create_compliance(
    pool: &SqlitePool,
    status: Option<String>,
) -> Result<ComplianceStatus, ApiError> {
    let Some(status) = status.filter(|value| !value.is_empty()) else {
        return Err(ApiError::validation("Missing status"));
    };

    ComplianceRepository::new(pool.clone())
        .create(&status)
        .await
        .map_err(|err| ApiError::server_error("Failed to create compliance status", err))
}

pub async fn update_compliance(
    pool: &SqlitePool,
    record_id: &str,
    status: Option<String>,
) -> Result<ComplianceStatus, ApiError> {
    ComplianceRepository::new(pool.clone())
        .update(record_id, status.as_deref())
        .await
        .map_err(|err| ApiError::server_error("Failed to update compliance status", err))
}

pub async fn delete_compliance(pool: &SqlitePool, record_id: &str) -> Result<(), ApiError> {
    ComplianceRepository::new(pool.clone())
        .delete(record_id)
        .await
        .map_err(|err| ApiError::server_error("Failed to delete compliance status", err))
}

pub async fn list_compliance(pool: &SqlitePool) -> Result<Vec<ComplianceStatus>, ApiError> {
    ComplianceRepository::new(pool.clone())
        .list()
        .await
        .map_err(|err| ApiError::server_error("Failed to fetch compliance statuses", err))
}

pub async fn compliant_count(pool: &SqlitePool) -> Result<i64, ApiError> {
    ComplianceRepository::new(pool.clone())
        .count_by_status("compliant")
        .await
        .map_err(|err| ApiError::server_error("Failed to fetch compliance metrics", err))
}

// ===== RISK FLAGS =====

pub async fn create_risk_flag(
    pool: &SqlitePool,
    request: CreateRiskFlagRequest,
) -> Result<RiskFlag, ApiError> {
    let complete = request.user_id.as_deref().is_some_and(|v| !v.is_empty())
        && request.user_name.as_deref().is_some_and(|v| !v.is_empty())
        && request.flag_type.as_deref().is_some_and(|v| !v.is_empty())
        && request.category.as_deref().is_some_and(|v| !v.is_empty())
        && request.title.as_deref().is_some_and(|v| !v.is_empty())
        && request.description.as_deref().is_some_and(|v| !v.is_empty())
        && request.severity.is_some()
        && request.status.as_deref().is_some_and(|v| !v.is_empty());

    if !complete {
        return Err(ApiError::validation("Missing required fields"));
    }

    RiskFlagRepository::new(pool.clone())
        .create(&request)
        .await
        .map_err(|err| ApiError::server_error("Failed to create risk flag", err))
}

pub async fn update_risk_flag(
    pool: &SqlitePool,
    record_id: &str,
    patch: UpdateRiskFlagRequest,
) -> Result<RiskFlag, ApiError> {
    RiskFlagRepository::new(pool.clone())
        .update(record_id, &patch)
        .await
        .map_err(|err| ApiError::server_error("Failed to update risk flag", err))
}

pub async fn delete_risk_flag(pool: &SqlitePool, record_id: &str) -> Result<(), ApiError> {
    RiskFlagRepository::new(pool.clone())
        .delete(record_id)
        .await
        .map_err(|err| ApiError::server_error("Failed to delete risk flag", err))
}

pub async fn list_risk_flags(
    pool: &SqlitePool,
    filter: &RiskFlagFilter,
) -> Result<Vec<RiskFlag>, ApiError> {
    RiskFlagRepository::new(pool.clone())
        .list(filter)
        .await
        .map_err(|err| ApiError::server_error("Failed to fetch risk flags", err))
}

// ===== WEBHOOKS =====

pub async fn create_webhook(
    pool: &SqlitePool,
    status: Option<String>,
) -> Result<WebhookStatus, ApiError> {
    let Some(status) = status.filter(|value| !value.is_empty()) else {
        return Err(ApiError::validation("Missing status"));
    };

    WebhookRepository::new(pool.clone())
        .create(&status)
        .await
        .map_err(|err| ApiError::server_error("Failed to create webhook status", err))
}

pub async fn update_webhook(
    pool: &SqlitePool,
    record_id: &str,
    status: Option<String>,
) -> Result<WebhookStatus, ApiError> {
    WebhookRepository::new(pool.clone())
        .update(record_id, status.as_deref())
        .await
        .map_err(|err| ApiError::server_error("Failed to update webhook status", err))
}

pub async fn delete_webhook(pool: &SqlitePool, record_id: &str) -> Result<(), ApiError> {
    WebhookRepository::new(pool.clone())
        .delete(record_id)
        .await
        .map_err(|err| ApiError::server_error("Failed to delete webhook status", err))
}

pub async fn list_webhooks(pool: &SqlitePool) -> Result<Vec<WebhookStatus>, ApiError> {
    WebhookRepository::new(pool.clone())
        .list()
        .await
        .map_err(|err| ApiError::server_error("Failed to fetch webhook statuses", err))
}

/// Overall webhook health: true when every recorded status is healthy
/// (vacuously true with no records).
pub async fn webhooks_healthy(pool: &SqlitePool) -> Result<bool, ApiError> {
    let webhooks = WebhookRepository::new(pool.clone())
        .list()
        .await
        .map_err(|err| ApiError::server_error("Failed to fetch webhook health", err))?;

    Ok(webhooks.iter().all(|webhook| webhook.status == "healthy"))
}
