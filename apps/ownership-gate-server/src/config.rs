use std::path::Path;

use anyhow::{Context, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use ownership_gate::{OwnershipGateConfig, StrategySettings};
use serde::{Deserialize, Serialize};

pub const SESSION_STRATEGY: &str = "session";
pub const OWNERSHIP_STRATEGY: &str = "ownership";

/// Prefix for environment overrides, e.g. `OWNERSHIP_GATE__SERVER__BIND`.
const ENV_PREFIX: &str = "OWNERSHIP_GATE__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gate: OwnershipGateConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8087".to_owned(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut gate = OwnershipGateConfig::default();
        gate.strategies.insert(
            SESSION_STRATEGY.to_owned(),
            StrategySettings {
                error_message: "Missing session".to_owned(),
                companion_strategy: None,
            },
        );
        gate.strategies.insert(
            OWNERSHIP_STRATEGY.to_owned(),
            StrategySettings {
                companion_strategy: Some(SESSION_STRATEGY.to_owned()),
                ..StrategySettings::default()
            },
        );
        Self {
            server: ServerConfig::default(),
            gate,
        }
    }
}

impl AppConfig {
    /// Defaults, then the YAML file (if given), then environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.exists() {
                bail!("configuration file {} does not exist", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("failed to load configuration")
    }
}
