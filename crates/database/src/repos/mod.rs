//! Repository implementations

pub mod admin_repository;
pub mod bill_repository;
pub mod household_repository;

pub use admin_repository::{ComplianceRepository, RiskFlagRepository, WebhookRepository};
pub use bill_repository::{BillListFilter, BillRepository, NewBill};
pub use household_repository::HouseholdRepository;
