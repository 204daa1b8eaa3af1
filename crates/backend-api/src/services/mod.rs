//! Business logic between the route handlers and the repositories.

pub mod admin;
pub mod bill;
pub mod household;
