//! Mortgage origination backend: eligibility rules, amortization, and the application
//! review lifecycle, plus the configuration and telemetry the API service runs on.

pub mod applications;
pub mod config;
pub mod error;
pub mod telemetry;
