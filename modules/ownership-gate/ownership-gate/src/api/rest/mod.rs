//! axum integration: route binding, middleware, and error responses.

pub mod middleware;
pub mod problem;

pub use middleware::{GateState, guard, ownership_middleware};
pub use problem::Problem;
