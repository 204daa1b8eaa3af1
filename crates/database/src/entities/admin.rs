//! Admin panel record definitions: compliance, risk, and webhook rows.
//!
//! These are independent flat records with no cross-entity invariants.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceStatus {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(rename = "id")]
    pub public_id: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookStatus {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(rename = "id")]
    pub public_id: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFlag {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(rename = "id")]
    pub public_id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(rename = "type")]
    pub flag_type: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub severity: i64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Patch for the status-only admin records (compliance, webhooks).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRiskFlagRequest {
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    #[serde(rename = "type")]
    pub flag_type: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRiskFlagRequest {
    pub user_name: Option<String>,
    #[serde(rename = "type")]
    pub flag_type: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<i64>,
    pub status: Option<String>,
}

/// Equality filters for risk flag listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskFlagFilter {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub flag_type: Option<String>,
    pub category: Option<String>,
}
