//! Ownership Gate
//!
//! Per-route ownership authorization: a strategy holds a table of named
//! ownership rules, and for each request runs the rule bound to the route
//! (optionally after a companion strategy has produced the credentials).
//!
//! - [`domain::StrategyConfig`] - validated, immutable strategy configuration
//! - [`domain::OwnershipStrategy`] - per-request decision engine
//! - [`domain::StrategyRegistry`] - host-side registry resolving companions
//! - [`api::rest`] - axum middleware translating decisions into responses
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod config;
pub mod domain;

pub use config::{DEFAULT_ERROR_MESSAGE, OwnershipGateConfig, StrategySettings};
pub use domain::{NoCompanions, OwnershipStrategy, StrategyConfig, StrategyOptions, StrategyRegistry};
pub use ownership_gate_sdk as sdk;
