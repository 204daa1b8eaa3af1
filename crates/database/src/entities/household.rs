//! Household entity definitions

use serde::{Deserialize, Serialize};

/// A household with its current member set.
///
/// The numeric `id` is the internal row id; only `public_id` leaves the
/// process, serialized as `id`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Household {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(rename = "id")]
    pub public_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub household_type: String,
    #[serde(rename = "role")]
    pub role_label: String,
    pub total_monthly_outflow: f64,
    pub upcoming_joint_bills: f64,
    pub created_at: String,
    pub updated_at: String,
    pub members: Vec<HouseholdMember>,
}

/// Member summary embedded in household responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdMember {
    #[serde(rename = "id")]
    pub public_id: String,
    pub username: String,
    pub role: String,
    pub joined_at: String,
}

/// Request for creating a new household
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHouseholdRequest {
    pub name: Option<String>,
    #[serde(rename = "type", default = "CreateHouseholdRequest::default_type")]
    pub household_type: String,
    #[serde(rename = "role", default = "CreateHouseholdRequest::default_role")]
    pub role_label: String,
}

impl CreateHouseholdRequest {
    fn default_type() -> String {
        "home".to_string()
    }

    fn default_role() -> String {
        "owner".to_string()
    }
}

/// Allow-listed patch for household updates. Identifier and membership
/// fields are deliberately absent so a request body cannot overwrite them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHouseholdRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub household_type: Option<String>,
    #[serde(rename = "role")]
    pub role_label: Option<String>,
    pub total_monthly_outflow: Option<f64>,
    pub upcoming_joint_bills: Option<f64>,
}

impl UpdateHouseholdRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.household_type.is_none()
            && self.role_label.is_none()
            && self.total_monthly_outflow.is_none()
            && self.upcoming_joint_bills.is_none()
    }
}
