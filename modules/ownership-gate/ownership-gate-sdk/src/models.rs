//! Domain models for the ownership gate.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Attribute bag describing the authenticated principal.
///
/// Created by the authentication (or companion) step. Rules may replace it
/// wholesale by returning new credentials; the gate never edits it in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(Map<String, Value>);

impl Credentials {
    /// Empty credentials (`{}`).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build credentials from a JSON value. Returns `None` unless the value is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Add or replace a top-level attribute.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Walk nested objects, e.g. `["account", "id"]`.
    #[must_use]
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.0.get(*first)?, |value, key| value.get(*key))
    }

    /// Like [`Credentials::lookup`], for string leaves.
    #[must_use]
    pub fn str_at(&self, path: &[&str]) -> Option<&str> {
        self.lookup(path).and_then(Value::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Credentials {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Per-route metadata naming the ownership rule that guards the route.
///
/// An empty rule name is the same as no binding at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteOwnershipBinding {
    #[serde(default)]
    pub ownership_rule: String,
}

impl RouteOwnershipBinding {
    #[must_use]
    pub fn new(rule: impl Into<String>) -> Self {
        Self {
            ownership_rule: rule.into(),
        }
    }

    /// The bound rule name, or `None` when the binding is empty.
    #[must_use]
    pub fn rule(&self) -> Option<&str> {
        Some(self.ownership_rule.as_str()).filter(|r| !r.is_empty())
    }
}

/// Validated ownership rule key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleName(String);

impl RuleName {
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyRuleName`] for an empty name.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::EmptyRuleName);
        }
        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RuleName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transport-independent view of an incoming request.
///
/// Built by the host from whatever request type it serves; rules read
/// path parameters and headers from here.
#[derive(Debug, Clone, Default)]
pub struct GateRequest {
    method: String,
    path: String,
    params: HashMap<String, String>,
    headers: HashMap<String, String>,
    binding: Option<RouteOwnershipBinding>,
}

impl GateRequest {
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Add a single path parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Set all path parameters at once (replaces any previously set).
    #[must_use]
    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    /// Add a header. Names are stored lower-cased.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Attach the route's ownership binding.
    #[must_use]
    pub fn with_binding(mut self, binding: RouteOwnershipBinding) -> Self {
        self.binding = Some(binding);
        self
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn binding(&self) -> Option<&RouteOwnershipBinding> {
        self.binding.as_ref()
    }

    /// Rule bound to the current route, if any.
    #[must_use]
    pub fn ownership_rule(&self) -> Option<&str> {
        self.binding.as_ref().and_then(RouteOwnershipBinding::rule)
    }
}

/// What an ownership rule reports back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleVerdict {
    /// Whether the principal may act on the resource.
    pub authorized: bool,
    /// Replacement credentials. Applied on denial as well.
    pub credentials: Option<Credentials>,
}

impl RuleVerdict {
    #[must_use]
    pub fn allow() -> Self {
        Self::from_bool(true)
    }

    #[must_use]
    pub fn deny() -> Self {
        Self::from_bool(false)
    }

    #[must_use]
    pub fn from_bool(authorized: bool) -> Self {
        Self {
            authorized,
            credentials: None,
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

/// Terminal outcome of one pass through the gate.
///
/// Fatal outcomes are reported as [`crate::GateError`] instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The principal may proceed; credentials are attached for downstream use.
    Authorized { credentials: Credentials },
    /// The principal was refused. Credentials are kept for audit logging.
    Denied {
        reason: String,
        credentials: Credentials,
    },
}

impl Decision {
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized { .. })
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        match self {
            Self::Authorized { credentials } | Self::Denied { credentials, .. } => credentials,
        }
    }

    #[must_use]
    pub fn into_credentials(self) -> Credentials {
        match self {
            Self::Authorized { credentials } | Self::Denied { credentials, .. } => credentials,
        }
    }

    /// Denial reason, `None` when authorized.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Authorized { .. } => None,
            Self::Denied { reason, .. } => Some(reason),
        }
    }
}
