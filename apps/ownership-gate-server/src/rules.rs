//! Demo ownership rules.

use async_trait::async_trait;
use ownership_gate::sdk::{Credentials, GateRequest, OwnershipRule, RuleVerdict};
use serde_json::json;

/// Header carrying the caller's account id (stands in for a real session).
pub const ACCOUNT_HEADER: &str = "x-account-id";

/// Session rule: turns the account header into credentials, denies without it.
#[derive(Debug, Default)]
pub struct SessionRule;

#[async_trait]
impl OwnershipRule for SessionRule {
    async fn check(
        &self,
        request: &GateRequest,
        _credentials: &Credentials,
    ) -> anyhow::Result<RuleVerdict> {
        let Some(account_id) = request.header(ACCOUNT_HEADER).filter(|id| !id.is_empty()) else {
            return Ok(RuleVerdict::deny());
        };
        let credentials = Credentials::empty().with("account", json!({ "id": account_id }));
        Ok(RuleVerdict::allow().with_credentials(credentials))
    }
}

/// Account rule: the `id` path parameter must be the caller's own account.
#[derive(Debug, Default)]
pub struct AccountOwnerRule;

#[async_trait]
impl OwnershipRule for AccountOwnerRule {
    async fn check(
        &self,
        request: &GateRequest,
        credentials: &Credentials,
    ) -> anyhow::Result<RuleVerdict> {
        let owner = credentials.str_at(&["account", "id"]);
        let target = request.param("id");
        Ok(RuleVerdict::from_bool(owner.is_some() && owner == target))
    }
}
