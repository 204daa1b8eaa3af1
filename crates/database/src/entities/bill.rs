//! Bill entity definitions

use serde::{Deserialize, Serialize};

/// A bill belonging to exactly one household.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(rename = "id")]
    pub public_id: String,
    /// Public id of the owning household.
    pub household_id: String,
    pub amount: f64,
    pub due_date: String,
    pub status: String,
    pub biller_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_recurring: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_amount: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request for creating a new bill. Required fields are optional here so
/// missing input surfaces as a validation error, not a decode failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillRequest {
    pub household_id: Option<String>,
    pub amount: Option<f64>,
    pub due_date: Option<String>,
    pub status: Option<String>,
    pub biller_name: Option<String>,
    pub category: Option<String>,
    pub is_recurring: Option<bool>,
    pub predicted_amount: Option<f64>,
}

/// Allow-listed patch for bill updates; the owning household cannot be
/// reassigned through this surface.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBillRequest {
    pub amount: Option<f64>,
    pub due_date: Option<String>,
    pub status: Option<String>,
    pub biller_name: Option<String>,
    pub category: Option<String>,
    pub is_recurring: Option<bool>,
    pub predicted_amount: Option<f64>,
}

impl UpdateBillRequest {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
            && self.biller_name.is_none()
            && self.category.is_none()
            && self.is_recurring.is_none()
            && self.predicted_amount.is_none()
    }
}

/// Sortable bill list columns. The query value is matched against this
/// allow-list; anything else falls back to the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillSort {
    DueDate,
    Amount,
    Status,
    CreatedAt,
}

impl BillSort {
    pub fn column(&self) -> &'static str {
        match self {
            BillSort::DueDate => "due_date",
            BillSort::Amount => "amount",
            BillSort::Status => "status",
            BillSort::CreatedAt => "created_at",
        }
    }
}

impl From<&str> for BillSort {
    fn from(s: &str) -> Self {
        match s {
            "amount" => BillSort::Amount,
            "status" => BillSort::Status,
            "createdAt" => BillSort::CreatedAt,
            _ => BillSort::DueDate,
        }
    }
}

impl Default for BillSort {
    fn default() -> Self {
        BillSort::DueDate
    }
}
