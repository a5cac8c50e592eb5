//! Router wiring: strategies, registry, and guarded routes.

use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Json, Router};
use ownership_gate::api::rest::{GateState, guard};
use ownership_gate::sdk::{Credentials, RouteOwnershipBinding, RuleVerdict, rule_fn};
use ownership_gate::{OwnershipGateConfig, OwnershipStrategy, StrategyOptions, StrategyRegistry};
use serde_json::{Value, json};
use tracing::info;

use crate::config::{OWNERSHIP_STRATEGY, SESSION_STRATEGY};
use crate::rules::{AccountOwnerRule, SessionRule};

const ACCOUNT_RULE: &str = "account";
const SELF_RULE: &str = "self";

/// Rule bound to each guarded route; checked against the strategies at startup.
const BINDINGS: &[&str] = &[ACCOUNT_RULE, SELF_RULE];

/// Build the strategies from configuration and mount the routes.
///
/// The session strategy registers its rule under every key a route binds,
/// since a companion runs against the same route metadata.
pub fn build_router(cfg: &OwnershipGateConfig) -> anyhow::Result<Router> {
    let session = OwnershipStrategy::new(
        &StrategyOptions::new()
            .rule(ACCOUNT_RULE, Arc::new(SessionRule))
            .rule(SELF_RULE, Arc::new(SessionRule))
            .with_settings(&cfg.strategy(SESSION_STRATEGY)),
    )?;
    let ownership = OwnershipStrategy::new(
        &StrategyOptions::new()
            .rule(ACCOUNT_RULE, Arc::new(AccountOwnerRule))
            .rule(
                SELF_RULE,
                rule_fn(|_, credentials| async move {
                    Ok::<_, anyhow::Error>(RuleVerdict::from_bool(
                        credentials.str_at(&["account", "id"]).is_some(),
                    ))
                }),
            )
            .with_settings(&cfg.strategy(OWNERSHIP_STRATEGY)),
    )?;

    let bindings: Vec<RouteOwnershipBinding> =
        BINDINGS.iter().map(|rule| RouteOwnershipBinding::new(*rule)).collect();
    session.config().validate_bindings(&bindings)?;
    ownership.config().validate_bindings(&bindings)?;

    let mut registry = StrategyRegistry::new();
    registry.register(SESSION_STRATEGY, session)?;
    registry.register(OWNERSHIP_STRATEGY, ownership.clone())?;
    registry.validate()?;
    info!(
        rules = ?ownership.config().rule_names(),
        companion = ?ownership.config().companion_strategy(),
        "Ownership strategies ready"
    );

    let state = GateState::new(ownership, Arc::new(registry));

    Ok(Router::new()
        .route("/health", get(health))
        .route("/me", guard(get(whoami), state.clone(), SELF_RULE))
        .route("/accounts/{id}", guard(get(whoami), state, ACCOUNT_RULE)))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn whoami(Extension(credentials): Extension<Credentials>) -> Json<Credentials> {
    Json(credentials)
}
