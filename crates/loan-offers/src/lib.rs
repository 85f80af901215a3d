//! Loan acceptance scoring service, tiered offer decisions, and offer notifications.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
