//! Domain layer for the ownership gate.

pub mod registry;
pub mod service;
pub mod strategy;

pub use registry::{NoCompanions, StrategyRegistry};
pub use service::OwnershipStrategy;
pub use strategy::{StrategyConfig, StrategyOptions};
