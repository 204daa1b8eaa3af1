//! Bill operations. Read, update, and delete run the membership guard
//! against the owning household on every call; creation deliberately
//! does not (any authenticated user may attach a bill to any existing
//! household id — current behavior, kept as-is).

use billbuddy_auth::Claims;
use billbuddy_database::{
    Bill, BillListFilter, BillRepository, CreateBillRequest, DatabaseError, HouseholdRepository,
    NewBill, UpdateBillRequest,
};
use sqlx::SqlitePool;

use crate::error::ApiError;

pub async fn list_bills(
    pool: &SqlitePool,
    caller: &Claims,
    filter: &BillListFilter,
) -> Result<(Vec<Bill>, i64), ApiError> {
    BillRepository::new(pool.clone())
        .list_for_user(&caller.sub, filter)
        .await
        .map_err(|err| ApiError::server_error("Failed to list bills", err))
}

pub async fn get_bill(pool: &SqlitePool, caller: &Claims, bill_id: &str) -> Result<Bill, ApiError> {
    ensure_bill_access(pool, caller, bill_id, "Failed to get bill").await
}

pub async fn create_bill(
    pool: &SqlitePool,
    request: CreateBillRequest,
) -> Result<Bill, ApiError> {
    let (Some(household_id), Some(amount), Some(due_date), Some(biller_name)) = (
        request.household_id.filter(|value| !value.is_empty()),
        request.amount,
        request.due_date.filter(|value| !value.is_empty()),
        request.biller_name.filter(|value| !value.is_empty()),
    ) else {
        return Err(ApiError::validation("Missing required fields"));
    };

    let new_bill = NewBill {
        household_public_id: household_id,
        amount,
        due_date,
        status: request.status.unwrap_or_else(|| "upcoming".to_string()),
        biller_name,
        category: request.category,
        is_recurring: request.is_recurring,
        predicted_amount: request.predicted_amount,
    };

    BillRepository::new(pool.clone())
        .create(&new_bill)
        .await
        .map_err(|err| match err {
            DatabaseError::NotFound => ApiError::not_found("Household not found"),
            other => ApiError::server_error("Failed to create bill", other),
        })
}

pub async fn update_bill(
    pool: &SqlitePool,
    caller: &Claims,
    bill_id: &str,
    patch: UpdateBillRequest,
) -> Result<Bill, ApiError> {
    ensure_bill_access(pool, caller, bill_id, "Failed to update bill").await?;

    BillRepository::new(pool.clone())
        .update(bill_id, &patch)
        .await
        .map_err(|err| match err {
            DatabaseError::NotFound => ApiError::not_found("Bill not found"),
            other => ApiError::server_error("Failed to update bill", other),
        })
}

pub async fn delete_bill(
    pool: &SqlitePool,
    caller: &Claims,
    bill_id: &str,
) -> Result<(), ApiError> {
    ensure_bill_access(pool, caller, bill_id, "Failed to delete bill").await?;

    BillRepository::new(pool.clone())
        .delete(bill_id)
        .await
        .map_err(|err| match err {
            DatabaseError::NotFound => ApiError::not_found("Bill not found"),
            other => ApiError::server_error("Failed to delete bill", other),
        })
}

/// The membership guard for a single bill: a missing bill is 404, an
/// existing bill outside the caller's households is 403. The asymmetry
/// with household updates (which answer 404 either way) is intentional.
async fn ensure_bill_access(
    pool: &SqlitePool,
    caller: &Claims,
    bill_id: &str,
    failure_message: &str,
) -> Result<Bill, ApiError> {
    let bill = BillRepository::new(pool.clone())
        .find_by_public_id(bill_id)
        .await
        .map_err(|err| ApiError::server_error(failure_message, err))?;

    let Some(bill) = bill else {
        return Err(ApiError::not_found("Bill not found"));
    };

    let is_member = HouseholdRepository::new(pool.clone())
        .is_member(&bill.household_id, &caller.sub)
        .await
        .map_err(|err| ApiError::server_error(failure_message, err))?;

    if !is_member {
        return Err(ApiError::forbidden("Not a household member"));
    }

    Ok(bill)
}
