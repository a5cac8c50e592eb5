//! Host integrations.

pub mod rest;
