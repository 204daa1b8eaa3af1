//! BillBuddy persistence layer.
//!
//! Connection management, migrations, entity definitions, and the
//! repository implementations used by the API services.

use sqlx::SqlitePool;

use billbuddy_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod error;
pub mod migrations;
pub mod repos;

pub use connection::prepare_database;
pub use error::{DatabaseError, DbResult};
pub use migrations::{run_migrations, MIGRATOR};

pub use entities::{
    admin::{
        ComplianceStatus, CreateRiskFlagRequest, RiskFlag, RiskFlagFilter, UpdateRiskFlagRequest,
        UpdateStatusRequest, WebhookStatus,
    },
    bill::{Bill, BillSort, CreateBillRequest, UpdateBillRequest},
    household::{CreateHouseholdRequest, Household, HouseholdMember, UpdateHouseholdRequest},
};

pub use repos::{
    BillListFilter, BillRepository, ComplianceRepository, HouseholdRepository, NewBill,
    RiskFlagRepository, WebhookRepository,
};

/// Prepare the connection pool and bring the schema up to date.
pub async fn initialize_database(config: &DatabaseConfig) -> DbResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

    Ok(pool)
}

/// Generate a new collision-resistant public identifier.
pub fn new_public_id() -> String {
    cuid2::create_id()
}
