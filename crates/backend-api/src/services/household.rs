//! Household operations: membership-scoped listing, creation with
//! auto-enrolment, and the guard-gated update.

use billbuddy_auth::Claims;
use billbuddy_database::{
    CreateHouseholdRequest, DatabaseError, Household, HouseholdRepository, UpdateHouseholdRequest,
};
use sqlx::SqlitePool;

use crate::error::ApiError;

pub async fn list_households(
    pool: &SqlitePool,
    caller: &Claims,
    page: i64,
    limit: i64,
) -> Result<(Vec<Household>, i64), ApiError> {
    HouseholdRepository::new(pool.clone())
        .list_for_user(&caller.sub, page, limit)
        .await
        .map_err(|err| ApiError::server_error("Failed to list households", err))
}

pub async fn create_household(
    pool: &SqlitePool,
    caller: &Claims,
    request: CreateHouseholdRequest,
) -> Result<Household, ApiError> {
    if request.name.as_deref().unwrap_or_default().is_empty() {
        return Err(ApiError::validation("Household name required"));
    }

    HouseholdRepository::new(pool.clone())
        .create(&request, &caller.sub)
        .await
        .map_err(|err| ApiError::server_error("Failed to create household", err))
}

/// Update a household the caller belongs to. A household that does not
/// exist and a household the caller cannot see produce the same 404, so
/// non-members learn nothing.
pub async fn update_household(
    pool: &SqlitePool,
    caller: &Claims,
    household_id: &str,
    patch: UpdateHouseholdRequest,
) -> Result<Household, ApiError> {
    let repo = HouseholdRepository::new(pool.clone());

    let is_member = repo
        .is_member(household_id, &caller.sub)
        .await
        .map_err(|err| ApiError::server_error("Failed to update household", err))?;
    if !is_member {
        return Err(ApiError::not_found("Household not found"));
    }

    // Membership was checked above, but nothing holds a lock between the
    // check and this write; a concurrent membership change can slip in.
    repo.update(household_id, &patch)
        .await
        .map_err(|err| match err {
            DatabaseError::NotFound => ApiError::not_found("Household not found"),
            other => ApiError::server_error("Failed to update household", other),
        })
}
