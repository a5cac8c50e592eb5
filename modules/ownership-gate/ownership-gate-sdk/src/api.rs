//! Trait seams between the gate, its rules, and the host.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::GateError;
use crate::models::{Credentials, GateRequest, RuleVerdict};

/// Rule table handed to a strategy at setup time, keyed by rule name.
pub type RuleSet = HashMap<String, Arc<dyn OwnershipRule>>;

/// Ownership rule for one resource kind.
///
/// Decides whether the principal described by `credentials` owns (or may
/// act on) the resource instance named in `request`. Rules are stateless as
/// far as the gate is concerned; they are shared across concurrent requests.
///
/// ```ignore
/// struct AccountRule { repo: Arc<dyn AccountRepo> }
///
/// #[async_trait]
/// impl OwnershipRule for AccountRule {
///     async fn check(&self, request: &GateRequest, credentials: &Credentials)
///         -> anyhow::Result<RuleVerdict>
///     {
///         let id = request.param("id").unwrap_or_default();
///         let owner = self.repo.owner_of(id).await?;
///         Ok(RuleVerdict::from_bool(credentials.str_at(&["user", "id"]) == Some(&owner)))
///     }
/// }
/// ```
#[async_trait]
pub trait OwnershipRule: Send + Sync {
    /// Check ownership.
    ///
    /// # Errors
    ///
    /// Any error is treated as a fatal per-request failure, never as a denial.
    async fn check(
        &self,
        request: &GateRequest,
        credentials: &Credentials,
    ) -> anyhow::Result<RuleVerdict>;
}

/// Host seam for running another, previously configured strategy.
///
/// The host owns the strategy registry; the gate only knows the name of the
/// companion it should consult before running its own rule.
#[async_trait]
pub trait CompanionAuthenticator: Send + Sync {
    /// Authenticate `request` with the named strategy.
    ///
    /// `Ok(None)` means the companion succeeded without producing credentials.
    ///
    /// # Errors
    ///
    /// - `UnknownStrategy` if no strategy is registered under `strategy`
    /// - `CompanionDenied` if the companion refused the principal
    /// - any error the companion itself failed with
    async fn authenticate(
        &self,
        strategy: &str,
        request: &GateRequest,
    ) -> Result<Option<Credentials>, GateError>;
}
