//! Request authorizer: one decision per request.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use ownership_gate_sdk::{
    CompanionAuthenticator, ConfigError, Credentials, Decision, GateError, GateRequest,
    RuleVerdict,
};
use tracing::{debug, error, warn};

use super::strategy::{StrategyConfig, StrategyOptions};

/// Ownership strategy.
///
/// Built once at setup time; cheap to clone (`Arc` inside) and safe to share
/// across concurrent requests, since its configuration is read-only.
///
/// Routes without an ownership binding are authorized without running any
/// rule. This fail-open default is deliberate: routes opt in to ownership
/// checks by naming a rule.
#[derive(Clone, Debug)]
pub struct OwnershipStrategy {
    config: Arc<StrategyConfig>,
}

impl OwnershipStrategy {
    /// Validate options and build a strategy.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] raised by [`StrategyConfig::from_options`].
    pub fn new(options: &StrategyOptions) -> Result<Self, ConfigError> {
        StrategyConfig::from_options(Some(options)).map(Self::from_config)
    }

    #[must_use]
    pub fn from_config(config: StrategyConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Decide whether the principal may act on the resource named in `request`.
    ///
    /// When a companion strategy is configured it runs first and its
    /// credentials replace `base`; otherwise `base` (or empty credentials)
    /// is handed to the rule.
    ///
    /// # Errors
    ///
    /// - whatever the companion failed with (the rule is not run)
    /// - [`GateError::UnknownRule`] if the route names an unregistered rule
    /// - [`GateError::Rule`] / [`GateError::RulePanicked`] if the rule fails
    #[tracing::instrument(skip_all, fields(method = %request.method(), path = %request.path()))]
    pub async fn authenticate(
        &self,
        request: &GateRequest,
        base: Option<Credentials>,
        companions: &dyn CompanionAuthenticator,
    ) -> Result<Decision, GateError> {
        let credentials = match self.config.companion_strategy() {
            Some(companion) => companions
                .authenticate(companion, request)
                .await
                .inspect_err(|e| error!(companion, error = %e, "Companion strategy failed"))?
                .unwrap_or_default(),
            None => base.unwrap_or_default(),
        };

        self.decide(request, credentials).await
    }

    async fn decide(
        &self,
        request: &GateRequest,
        credentials: Credentials,
    ) -> Result<Decision, GateError> {
        let Some(rule_name) = request.ownership_rule() else {
            debug!("No ownership rule bound to route; authorized");
            return Ok(Decision::Authorized { credentials });
        };

        let Some(rule) = self.config.rule(rule_name) else {
            error!(
                rule = rule_name,
                known = ?self.config.rule_names(),
                "Route is bound to an unregistered ownership rule"
            );
            return Err(GateError::UnknownRule {
                rule: rule_name.to_owned(),
            });
        };

        let verdict = AssertUnwindSafe(rule.check(request, &credentials))
            .catch_unwind()
            .await
            .map_err(|panic| GateError::RulePanicked {
                rule: rule_name.to_owned(),
                message: panic_message(panic.as_ref()),
            })?
            .map_err(|source| GateError::Rule {
                rule: rule_name.to_owned(),
                source,
            })
            .inspect_err(|e| error!(rule = rule_name, error = %e, "Ownership rule failed"))?;

        let RuleVerdict {
            authorized,
            credentials: replaced,
        } = verdict;
        let credentials = replaced.unwrap_or(credentials);

        if authorized {
            debug!(rule = rule_name, "Ownership confirmed");
            Ok(Decision::Authorized { credentials })
        } else {
            warn!(rule = rule_name, "Ownership check denied access");
            Ok(Decision::Denied {
                reason: self.config.error_message().to_owned(),
                credentials,
            })
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
