//! Configuration for the ownership gate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Denial message used when a strategy does not configure one.
pub const DEFAULT_ERROR_MESSAGE: &str = "You do not have access to this resource";

/// Data part of one strategy's options.
///
/// Rules are code and are supplied separately through
/// [`crate::StrategyOptions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategySettings {
    /// Message returned to the caller on denial.
    pub error_message: String,

    /// Strategy whose credentials feed this one's rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub companion_strategy: Option<String>,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            error_message: DEFAULT_ERROR_MESSAGE.to_owned(),
            companion_strategy: None,
        }
    }
}

/// Settings for every named strategy a host configures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OwnershipGateConfig {
    pub strategies: BTreeMap<String, StrategySettings>,
}

impl OwnershipGateConfig {
    /// Settings for `name`, falling back to defaults.
    #[must_use]
    pub fn strategy(&self, name: &str) -> StrategySettings {
        self.strategies.get(name).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let settings: StrategySettings = serde_json::from_value(json!({})).unwrap();
        assert_eq!(settings.error_message, "You do not have access to this resource");
        assert_eq!(settings.companion_strategy, None);
    }

    #[test]
    fn custom_values_are_read() {
        let settings: StrategySettings = serde_json::from_value(json!({
            "error_message": "OOPS",
            "companion_strategy": "session",
        }))
        .unwrap();
        assert_eq!(settings.error_message, "OOPS");
        assert_eq!(settings.companion_strategy.as_deref(), Some("session"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_value::<StrategySettings>(json!({"errorMessage": "OOPS"}));
        assert!(result.is_err());
    }

    #[test]
    fn gate_config_falls_back_per_strategy() {
        let cfg: OwnershipGateConfig = serde_json::from_value(json!({
            "strategies": { "ownership": { "error_message": "OOPS" } }
        }))
        .unwrap();

        assert_eq!(cfg.strategy("ownership").error_message, "OOPS");
        assert_eq!(cfg.strategy("other"), StrategySettings::default());
    }
}
