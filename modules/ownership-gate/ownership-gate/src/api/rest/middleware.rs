//! Ownership middleware for axum routes.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, Request, State};
use axum::http::request::Parts;
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::routing::MethodRouter;
use ownership_gate_sdk::{
    CompanionAuthenticator, Credentials, Decision, GateError, GateRequest, RouteOwnershipBinding,
};
use tracing::{error, warn};

use super::problem::Problem;
use crate::domain::{NoCompanions, OwnershipStrategy};

/// Shared state for the ownership middleware.
#[derive(Clone)]
pub struct GateState {
    pub strategy: OwnershipStrategy,
    pub companions: Arc<dyn CompanionAuthenticator>,
}

impl GateState {
    #[must_use]
    pub fn new(strategy: OwnershipStrategy, companions: Arc<dyn CompanionAuthenticator>) -> Self {
        Self {
            strategy,
            companions,
        }
    }

    /// State for a strategy that has no companion.
    #[must_use]
    pub fn standalone(strategy: OwnershipStrategy) -> Self {
        Self::new(strategy, Arc::new(NoCompanions))
    }
}

impl std::fmt::Debug for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateState")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

/// Guard a route with an ownership strategy and bind it to `rule`.
///
/// Pass an empty `rule` to run the strategy (and its companion) without an
/// ownership check.
///
/// ```ignore
/// let router = Router::new().route(
///     "/account/{id}",
///     guard(post(handler), state, "account"),
/// );
/// ```
pub fn guard<S>(route: MethodRouter<S>, state: GateState, rule: &str) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route
        .layer::<_, Infallible>(from_fn_with_state(state, ownership_middleware))
        .layer(Extension(RouteOwnershipBinding::new(rule)))
}

/// Ownership middleware.
///
/// For each request:
/// 1. Builds a [`GateRequest`] from the route's binding, path params, and headers
/// 2. Uses a `Credentials` extension set by upstream authentication as base credentials
/// 3. Runs the strategy
/// 4. Authorized: inserts the resulting `Credentials` and continues;
///    denied: `401` with the strategy's message, the denial's `Credentials`
///    attached to the response extensions for audit layers;
///    companion denied: `401` with the companion's message; fatal: `500`
pub async fn ownership_middleware(
    State(state): State<GateState>,
    req: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();
    let gate_request = gate_request_from_parts(&mut parts).await;
    let base = parts.extensions.get::<Credentials>().cloned();

    match state
        .strategy
        .authenticate(&gate_request, base, state.companions.as_ref())
        .await
    {
        Ok(Decision::Authorized { credentials }) => {
            parts.extensions.insert(credentials);
            next.run(Request::from_parts(parts, body)).await
        }
        Ok(Decision::Denied {
            reason,
            credentials,
        }) => {
            let mut response = Problem::unauthorized(&reason).into_response();
            response.extensions_mut().insert(credentials);
            response
        }
        Err(GateError::CompanionDenied { strategy, reason }) => {
            warn!(companion = %strategy, path = %gate_request.path(), "Companion strategy denied access");
            Problem::unauthorized(&reason).into_response()
        }
        Err(err) => {
            error!(error = %err, path = %gate_request.path(), "Ownership check failed");
            Problem::internal().into_response()
        }
    }
}

async fn gate_request_from_parts(parts: &mut Parts) -> GateRequest {
    // Routes without path params reject the extractor; treat that as "no params".
    let params = Path::<HashMap<String, String>>::from_request_parts(parts, &())
        .await
        .map(|Path(params)| params)
        .unwrap_or_default();

    let mut request = GateRequest::new(parts.method.as_str(), parts.uri.path()).with_params(params);
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }
    if let Some(binding) = parts.extensions.get::<RouteOwnershipBinding>() {
        request = request.with_binding(binding.clone());
    }
    request
}
