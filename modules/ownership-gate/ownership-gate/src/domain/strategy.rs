//! Strategy configuration: options in, immutable snapshot out.

use std::collections::HashMap;
use std::sync::Arc;

use ownership_gate_sdk::{ConfigError, OwnershipRule, RouteOwnershipBinding, RuleName, RuleSet};

use crate::config::{DEFAULT_ERROR_MESSAGE, StrategySettings};

/// Options for one ownership strategy instance.
///
/// `rules` is required; an explicitly empty rule table is valid and means
/// every route is bound to nothing (or fails on lookup).
///
/// ```ignore
/// let options = StrategyOptions::new()
///     .rule("account", account_rule)
///     .error_message("OOPS")
///     .companion_strategy("session");
/// ```
#[derive(Clone, Default)]
pub struct StrategyOptions {
    rules: Option<RuleSet>,
    error_message: Option<String>,
    companion_strategy: Option<String>,
}

impl StrategyOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the whole rule table (replaces any previously set).
    #[must_use]
    pub fn rules(mut self, rules: RuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Add a single rule.
    #[must_use]
    pub fn rule(mut self, name: impl Into<String>, rule: Arc<dyn OwnershipRule>) -> Self {
        self.rules
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), rule);
        self
    }

    #[must_use]
    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn companion_strategy(mut self, name: impl Into<String>) -> Self {
        self.companion_strategy = Some(name.into());
        self
    }

    /// Apply loaded settings on top of these options.
    #[must_use]
    pub fn with_settings(mut self, settings: &StrategySettings) -> Self {
        self.error_message = Some(settings.error_message.clone());
        self.companion_strategy.clone_from(&settings.companion_strategy);
        self
    }
}

impl std::fmt::Debug for StrategyOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut rules: Option<Vec<&String>> = self.rules.as_ref().map(|r| r.keys().collect());
        if let Some(names) = rules.as_mut() {
            names.sort();
        }
        f.debug_struct("StrategyOptions")
            .field("rules", &rules)
            .field("error_message", &self.error_message)
            .field("companion_strategy", &self.companion_strategy)
            .finish()
    }
}

/// Validated, immutable configuration of one strategy.
///
/// Owns its own copy of the rule table, so changes to the options it was
/// built from never reach it. Shared read-only across concurrent requests.
#[derive(Clone)]
pub struct StrategyConfig {
    rules: HashMap<RuleName, Arc<dyn OwnershipRule>>,
    error_message: String,
    companion_strategy: Option<String>,
}

impl StrategyConfig {
    /// Validate options and freeze them.
    ///
    /// Empty `error_message` or `companion_strategy` values count as unset.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingOptions`] if `options` is `None`
    /// - [`ConfigError::MissingRules`] if no rule table was given
    /// - [`ConfigError::EmptyRuleName`] if a rule is registered under `""`
    pub fn from_options(options: Option<&StrategyOptions>) -> Result<Self, ConfigError> {
        let options = options.ok_or(ConfigError::MissingOptions)?;
        let rules = options.rules.as_ref().ok_or(ConfigError::MissingRules)?;

        let mut table = HashMap::with_capacity(rules.len());
        for (name, rule) in rules {
            table.insert(RuleName::new(name.as_str())?, Arc::clone(rule));
        }

        let error_message = options
            .error_message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_owned());

        let companion_strategy = options.companion_strategy.clone().filter(|c| !c.is_empty());

        Ok(Self {
            rules: table,
            error_message,
            companion_strategy,
        })
    }

    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&Arc<dyn OwnershipRule>> {
        self.rules.get(name)
    }

    #[must_use]
    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Registered rule names, sorted.
    #[must_use]
    pub fn rule_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(RuleName::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    #[must_use]
    pub fn companion_strategy(&self) -> Option<&str> {
        self.companion_strategy.as_deref()
    }

    /// Check route bindings against the rule table at startup, so a typo in
    /// route metadata fails deployment instead of the first request.
    ///
    /// Empty bindings are skipped.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownRule`] for the first binding naming an unregistered rule.
    pub fn validate_bindings<'a>(
        &self,
        bindings: impl IntoIterator<Item = &'a RouteOwnershipBinding>,
    ) -> Result<(), ConfigError> {
        bindings
            .into_iter()
            .filter_map(RouteOwnershipBinding::rule)
            .find(|rule| !self.has_rule(rule))
            .map_or(Ok(()), |rule| {
                Err(ConfigError::UnknownRule {
                    rule: rule.to_owned(),
                })
            })
    }
}

impl std::fmt::Debug for StrategyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyConfig")
            .field("rules", &self.rule_names())
            .field("error_message", &self.error_message)
            .field("companion_strategy", &self.companion_strategy)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use ownership_gate_sdk::{RuleVerdict, rule_fn};

    use super::*;

    fn allow() -> Arc<dyn OwnershipRule> {
        rule_fn(|_, _| async { Ok(RuleVerdict::allow()) })
    }

    #[test]
    fn missing_options_is_rejected() {
        let err = StrategyConfig::from_options(None).unwrap_err();
        assert_eq!(err, ConfigError::MissingOptions);
    }

    #[test]
    fn missing_rules_is_rejected() {
        let options = StrategyOptions::new().error_message("OOPS");
        let err = StrategyConfig::from_options(Some(&options)).unwrap_err();
        assert_eq!(err, ConfigError::MissingRules);
    }

    #[test]
    fn empty_rule_table_is_accepted() {
        let options = StrategyOptions::new().rules(RuleSet::new());
        let cfg = StrategyConfig::from_options(Some(&options)).unwrap();
        assert!(cfg.rule_names().is_empty());
    }

    #[test]
    fn empty_rule_name_is_rejected() {
        let options = StrategyOptions::new().rule("", allow());
        let err = StrategyConfig::from_options(Some(&options)).unwrap_err();
        assert_eq!(err, ConfigError::EmptyRuleName);
    }

    #[test]
    fn error_message_defaults() {
        let options = StrategyOptions::new().rules(RuleSet::new());
        let cfg = StrategyConfig::from_options(Some(&options)).unwrap();
        assert_eq!(cfg.error_message(), "You do not have access to this resource");

        let blank = StrategyOptions::new().rules(RuleSet::new()).error_message("");
        let cfg = StrategyConfig::from_options(Some(&blank)).unwrap();
        assert_eq!(cfg.error_message(), "You do not have access to this resource");
    }

    #[test]
    fn error_message_custom() {
        let options = StrategyOptions::new().rules(RuleSet::new()).error_message("OOPS");
        let cfg = StrategyConfig::from_options(Some(&options)).unwrap();
        assert_eq!(cfg.error_message(), "OOPS");
    }

    #[test]
    fn blank_companion_counts_as_unset() {
        let options = StrategyOptions::new()
            .rules(RuleSet::new())
            .companion_strategy("");
        let cfg = StrategyConfig::from_options(Some(&options)).unwrap();
        assert_eq!(cfg.companion_strategy(), None);
    }

    #[test]
    fn settings_override_options() {
        let settings = StrategySettings {
            error_message: "OOPS".to_owned(),
            companion_strategy: Some("session".to_owned()),
        };
        let options = StrategyOptions::new()
            .rules(RuleSet::new())
            .with_settings(&settings);
        let cfg = StrategyConfig::from_options(Some(&options)).unwrap();

        assert_eq!(cfg.error_message(), "OOPS");
        assert_eq!(cfg.companion_strategy(), Some("session"));
    }

    #[test]
    fn config_is_a_snapshot_of_options() {
        let options = StrategyOptions::new().rule("account", allow());
        let cfg = StrategyConfig::from_options(Some(&options)).unwrap();

        let options = options.rule("late", allow()).error_message("changed");
        assert_eq!(cfg.rule_names(), vec!["account"]);
        assert_eq!(cfg.error_message(), "You do not have access to this resource");
        assert!(format!("{options:?}").contains("late"));
    }

    #[test]
    fn bindings_are_validated_eagerly() {
        let options = StrategyOptions::new().rule("account", allow());
        let cfg = StrategyConfig::from_options(Some(&options)).unwrap();

        let good = [
            RouteOwnershipBinding::new("account"),
            RouteOwnershipBinding::new(""),
        ];
        assert!(cfg.validate_bindings(&good).is_ok());

        let bad = [
            RouteOwnershipBinding::new("account"),
            RouteOwnershipBinding::new("invoice"),
        ];
        assert_eq!(
            cfg.validate_bindings(&bad),
            Err(ConfigError::UnknownRule {
                rule: "invoice".to_owned()
            })
        );
    }

    #[test]
    fn debug_lists_rule_names_only() {
        let options = StrategyOptions::new().rule("b", allow()).rule("a", allow());
        let cfg = StrategyConfig::from_options(Some(&options)).unwrap();
        let dbg = format!("{cfg:?}");
        assert!(dbg.contains(r#"rules: ["a", "b"]"#));
    }
}
