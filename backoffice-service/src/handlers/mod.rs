//! HTTP handlers for backoffice-service.

pub mod health;
pub mod loans;
pub mod procurements;
pub mod sales;

pub use health::{health_check, metrics_endpoint, readiness_check};
