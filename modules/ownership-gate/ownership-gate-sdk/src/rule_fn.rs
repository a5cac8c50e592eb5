//! Closure-backed ownership rules.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::api::OwnershipRule;
use crate::models::{Credentials, GateRequest, RuleVerdict};

/// [`OwnershipRule`] backed by an async closure.
///
/// The closure receives owned copies of the request and credentials so the
/// returned future does not borrow from the gate.
pub struct FnRule<F> {
    f: F,
}

impl<F> FnRule<F> {
    #[must_use]
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

/// Wrap an async closure as a shareable rule.
///
/// ```ignore
/// let rule = rule_fn(|request, _credentials| async move {
///     Ok(RuleVerdict::from_bool(request.param("id") == Some("123")))
/// });
/// ```
pub fn rule_fn<F, Fut>(f: F) -> Arc<dyn OwnershipRule>
where
    F: Fn(GateRequest, Credentials) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<RuleVerdict>> + Send + 'static,
{
    Arc::new(FnRule::new(f))
}

#[async_trait]
impl<F, Fut> OwnershipRule for FnRule<F>
where
    F: Fn(GateRequest, Credentials) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<RuleVerdict>> + Send,
{
    async fn check(
        &self,
        request: &GateRequest,
        credentials: &Credentials,
    ) -> anyhow::Result<RuleVerdict> {
        (self.f)(request.clone(), credentials.clone()).await
    }
}

impl<F> std::fmt::Debug for FnRule<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnRule").finish_non_exhaustive()
    }
}
