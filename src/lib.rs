//! Spendwise - personal expense tracking service
//!
//! Records expenses in any of eight currencies, normalizes spending to USD
//! through a rate-limited, cached exchange rate provider, and attaches
//! budget advice from a generative model with retry, model fallback and
//! stale-suggestion degradation.

pub mod advisor;
pub mod api;
pub mod budgets;
pub mod cli;
pub mod clock;
pub mod config;
pub mod domain;
pub mod expenses;
pub mod logging;
pub mod metrics;
pub mod rates;
pub mod store;
pub mod sweep;
