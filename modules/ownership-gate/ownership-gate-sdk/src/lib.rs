#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Ownership Gate SDK
//!
//! This crate provides the contract shared by hosts and rule authors:
//!
//! - [`OwnershipRule`] - Capability that decides ownership for one resource kind
//! - [`CompanionAuthenticator`] - Host seam for running a companion strategy
//! - [`Credentials`] - Opaque attribute bag for the authenticated principal
//! - [`GateRequest`], [`RouteOwnershipBinding`] - What a rule gets to look at
//! - [`RuleVerdict`], [`Decision`] - Rule output and terminal outcome
//! - [`ConfigError`], [`GateError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use ownership_gate_sdk::{RuleVerdict, rule_fn};
//!
//! let account = rule_fn(|request, credentials| async move {
//!     let owner = credentials.str_at(&["account", "id"]);
//!     Ok(RuleVerdict::from_bool(owner.is_some() && request.param("id") == owner))
//! });
//! ```

pub mod api;
pub mod error;
pub mod models;
pub mod rule_fn;

// Re-export main types at crate root
pub use api::{CompanionAuthenticator, OwnershipRule, RuleSet};
pub use error::{ConfigError, GateError};
pub use models::{Credentials, Decision, GateRequest, RouteOwnershipBinding, RuleName, RuleVerdict};
pub use rule_fn::{FnRule, rule_fn};
