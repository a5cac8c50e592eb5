//! Error types for the ownership gate.

use thiserror::Error;

/// Configuration errors.
///
/// Raised while building a strategy or wiring routes; these are meant to
/// stop startup, not to be handled per request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No options were supplied for the strategy.
    #[error("missing options for ownership-access strategy")]
    MissingOptions,

    /// Options were supplied without a rule table.
    #[error("missing options.rules for ownership-access strategy")]
    MissingRules,

    /// A rule was registered under an empty name.
    #[error("ownership rule names must not be empty")]
    EmptyRuleName,

    /// A route binding names a rule that was never registered.
    #[error("rule '{rule}' not found for ownership-access strategy; check the configured rules")]
    UnknownRule { rule: String },

    /// Two strategies were registered under the same name.
    #[error("strategy '{name}' is already registered")]
    DuplicateStrategy { name: String },

    /// A strategy names a companion that is not registered.
    #[error("strategy '{strategy}' references unknown companion strategy '{companion}'")]
    UnknownCompanion { strategy: String, companion: String },

    /// Companion references loop back onto themselves.
    #[error("companion strategies form a cycle: {}", path.join(" -> "))]
    CompanionCycle { path: Vec<String> },
}

/// Fatal per-request errors.
///
/// Access denial is expressed via [`crate::Decision::Denied`], not as an
/// error variant. Hosts answer [`GateError::CompanionDenied`] as a denial
/// carrying the companion's message; everything else is an internal error.
#[derive(Debug, Error)]
pub enum GateError {
    /// The route is bound to a rule the strategy does not know.
    #[error("rule '{rule}' not found for ownership-access strategy; check the configured rules")]
    UnknownRule { rule: String },

    /// The companion strategy is not registered with the host.
    #[error("companion strategy '{strategy}' is not registered")]
    UnknownStrategy { strategy: String },

    /// The companion strategy failed.
    #[error("companion strategy '{strategy}' failed: {source}")]
    Companion {
        strategy: String,
        #[source]
        source: anyhow::Error,
    },

    /// The companion strategy ran but refused the principal.
    #[error("companion strategy '{strategy}' denied access: {reason}")]
    CompanionDenied { strategy: String, reason: String },

    /// The ownership rule reported an error.
    #[error("ownership rule '{rule}' failed: {source}")]
    Rule {
        rule: String,
        #[source]
        source: anyhow::Error,
    },

    /// The ownership rule panicked while running.
    #[error("ownership rule '{rule}' panicked: {message}")]
    RulePanicked { rule: String, message: String },
}

impl GateError {
    /// Wrap an arbitrary companion failure.
    #[must_use]
    pub fn companion(strategy: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Companion {
            strategy: strategy.into(),
            source: source.into(),
        }
    }
}
