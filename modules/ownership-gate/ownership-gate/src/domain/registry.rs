//! Host-side strategy registry.

use std::collections::HashMap;

use async_trait::async_trait;
use ownership_gate_sdk::{
    CompanionAuthenticator, ConfigError, Credentials, Decision, GateError, GateRequest,
};
use tracing::debug;

use super::service::OwnershipStrategy;

/// Companion authenticator for hosts without a registry.
///
/// Every lookup fails with [`GateError::UnknownStrategy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompanions;

#[async_trait]
impl CompanionAuthenticator for NoCompanions {
    async fn authenticate(
        &self,
        strategy: &str,
        _request: &GateRequest,
    ) -> Result<Option<Credentials>, GateError> {
        Err(GateError::UnknownStrategy {
            strategy: strategy.to_owned(),
        })
    }
}

/// Named ownership strategies, resolvable as each other's companions.
///
/// Populate during setup, call [`StrategyRegistry::validate`], then share it
/// read-only (typically behind an `Arc`).
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<String, OwnershipStrategy>,
}

impl StrategyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy under `name`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateStrategy`] if the name is taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        strategy: OwnershipStrategy,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if self.strategies.contains_key(&name) {
            return Err(ConfigError::DuplicateStrategy { name });
        }
        self.strategies.insert(name, strategy);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OwnershipStrategy> {
        self.strategies.get(name)
    }

    /// Check that every companion reference resolves and that no chain of
    /// companions loops back on itself.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnknownCompanion`] for a dangling reference
    /// - [`ConfigError::CompanionCycle`] with the offending chain
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names: Vec<&String> = self.strategies.keys().collect();
        names.sort();

        for start in names {
            let mut path = vec![start.clone()];
            let mut current = start.as_str();

            while let Some(companion) = self
                .strategies
                .get(current)
                .and_then(|s| s.config().companion_strategy())
            {
                if !self.strategies.contains_key(companion) {
                    return Err(ConfigError::UnknownCompanion {
                        strategy: current.to_owned(),
                        companion: companion.to_owned(),
                    });
                }
                let seen = path.iter().any(|p| p == companion);
                path.push(companion.to_owned());
                if seen {
                    return Err(ConfigError::CompanionCycle { path });
                }
                current = companion;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CompanionAuthenticator for StrategyRegistry {
    #[tracing::instrument(skip_all, fields(companion = strategy))]
    async fn authenticate(
        &self,
        strategy: &str,
        request: &GateRequest,
    ) -> Result<Option<Credentials>, GateError> {
        let companion = self
            .get(strategy)
            .ok_or_else(|| GateError::UnknownStrategy {
                strategy: strategy.to_owned(),
            })?;

        match companion.authenticate(request, None, self).await? {
            Decision::Authorized { credentials } => {
                debug!("Companion strategy authorized");
                Ok(Some(credentials))
            }
            Decision::Denied { reason, .. } => Err(GateError::CompanionDenied {
                strategy: strategy.to_owned(),
                reason,
            }),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use ownership_gate_sdk::{RouteOwnershipBinding, RuleSet, RuleVerdict, rule_fn};
    use serde_json::json;

    use super::*;
    use crate::domain::StrategyOptions;

    fn plain() -> OwnershipStrategy {
        OwnershipStrategy::new(&StrategyOptions::new().rules(RuleSet::new())).unwrap()
    }

    fn chained(companion: &str) -> OwnershipStrategy {
        OwnershipStrategy::new(
            &StrategyOptions::new()
                .rules(RuleSet::new())
                .companion_strategy(companion),
        )
        .unwrap()
    }

    fn account_request() -> GateRequest {
        GateRequest::new("POST", "/account/123")
            .with_param("id", "123")
            .with_binding(RouteOwnershipBinding::new("account"))
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = StrategyRegistry::new();
        registry.register("ownership", plain()).unwrap();

        assert_eq!(
            registry.register("ownership", plain()),
            Err(ConfigError::DuplicateStrategy {
                name: "ownership".to_owned()
            })
        );
    }

    #[test]
    fn validate_accepts_chains() {
        let mut registry = StrategyRegistry::new();
        registry.register("session", plain()).unwrap();
        registry.register("account", chained("session")).unwrap();
        registry.register("invoice", chained("account")).unwrap();

        assert!(registry.validate().is_ok());
    }

    #[test]
    fn validate_reports_dangling_companion() {
        let mut registry = StrategyRegistry::new();
        registry.register("ownership", chained("session")).unwrap();

        assert_eq!(
            registry.validate(),
            Err(ConfigError::UnknownCompanion {
                strategy: "ownership".to_owned(),
                companion: "session".to_owned(),
            })
        );
    }

    #[test]
    fn validate_reports_cycles() {
        let mut registry = StrategyRegistry::new();
        registry.register("a", chained("b")).unwrap();
        registry.register("b", chained("a")).unwrap();

        assert_eq!(
            registry.validate(),
            Err(ConfigError::CompanionCycle {
                path: vec!["a".to_owned(), "b".to_owned(), "a".to_owned()],
            })
        );
    }

    #[test]
    fn validate_reports_self_reference() {
        let mut registry = StrategyRegistry::new();
        registry.register("loop", chained("loop")).unwrap();

        assert!(matches!(
            registry.validate(),
            Err(ConfigError::CompanionCycle { .. })
        ));
    }

    #[tokio::test]
    async fn companion_strategy_credentials_are_used() {
        let companion = OwnershipStrategy::new(&StrategyOptions::new().rule(
            "account",
            rule_fn(|_, _| async {
                Ok(RuleVerdict::allow().with_credentials(
                    Credentials::from_value(json!({"account": {"id": "123"}})).unwrap_or_default(),
                ))
            }),
        ))
        .unwrap();
        let ownership = OwnershipStrategy::new(
            &StrategyOptions::new()
                .rule(
                    "account",
                    rule_fn(|request, credentials| async move {
                        Ok(RuleVerdict::from_bool(
                            request.param("id") == credentials.str_at(&["account", "id"]),
                        ))
                    }),
                )
                .companion_strategy("companion"),
        )
        .unwrap();

        let mut registry = StrategyRegistry::new();
        registry.register("companion", companion).unwrap();
        registry.register("ownership", ownership.clone()).unwrap();
        registry.validate().unwrap();

        let decision = ownership
            .authenticate(&account_request(), None, &registry)
            .await
            .unwrap();

        assert!(decision.is_authorized());
    }

    #[tokio::test]
    async fn companion_rule_error_passes_through_unchanged() {
        let companion = OwnershipStrategy::new(&StrategyOptions::new().rule(
            "account",
            rule_fn(|_, _| async { Err(anyhow::anyhow!("blah blah")) }),
        ))
        .unwrap();
        let mut registry = StrategyRegistry::new();
        registry.register("companion", companion).unwrap();

        let ownership = OwnershipStrategy::new(
            &StrategyOptions::new()
                .rule("account", rule_fn(|_, _| async { Ok(RuleVerdict::allow()) }))
                .companion_strategy("companion"),
        )
        .unwrap();

        let result = ownership
            .authenticate(&account_request(), None, &registry)
            .await;

        match result {
            Err(GateError::Rule { rule, source }) => {
                assert_eq!(rule, "account");
                assert_eq!(source.to_string(), "blah blah");
            }
            other => panic!("Expected companion's Rule error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn companion_denial_is_an_error() {
        let companion = OwnershipStrategy::new(
            &StrategyOptions::new()
                .rule("account", rule_fn(|_, _| async { Ok(RuleVerdict::deny()) }))
                .error_message("not signed in"),
        )
        .unwrap();
        let mut registry = StrategyRegistry::new();
        registry.register("session", companion).unwrap();

        let result = registry.authenticate("session", &account_request()).await;

        match result {
            Err(GateError::CompanionDenied { strategy, reason }) => {
                assert_eq!(strategy, "session");
                assert_eq!(reason, "not signed in");
            }
            other => panic!("Expected CompanionDenied, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_companion_is_an_error() {
        let registry = StrategyRegistry::new();

        let result = registry.authenticate("session", &account_request()).await;

        assert!(matches!(result, Err(GateError::UnknownStrategy { strategy }) if strategy == "session"));
    }

    #[tokio::test]
    async fn no_companions_rejects_every_lookup() {
        let result = NoCompanions
            .authenticate("anything", &GateRequest::default())
            .await;

        assert!(matches!(result, Err(GateError::UnknownStrategy { .. })));
    }
}
