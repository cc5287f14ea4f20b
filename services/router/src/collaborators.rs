//! External collaborators consumed by the router
//!
//! Persistence is best-effort: the router logs and swallows its failures.
//! Risk is a synchronous per-asset flag checked before any work. Execution
//! receives a finalized quote and returns the settlement result.

use async_trait::async_trait;
use dashmap::DashSet;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::{LimitOrder, QuoteId, Route, SwapQuote};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("{service} unavailable: {reason}")]
    Unavailable { service: &'static str, reason: String },
}

/// Opaque signing material forwarded untouched to execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningMaterial {
    pub signer: String,
    pub payload: Vec<u8>,
}

/// Settlement outcome reported by the execution collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub quote_id: QuoteId,
    pub route: Route,
    pub amount_in: u128,
    pub amount_out: u128,
    /// Venue- or chain-specific settlement reference
    pub reference: String,
    pub settled_at_ns: u64,
}

#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Record the latest state of an order
    async fn record_order(&self, order: &LimitOrder) -> Result<(), CollaboratorError>;

    async fn record_execution(&self, result: &ExecutionResult) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait ExecutionService: Send + Sync {
    async fn execute(
        &self,
        quote: &SwapQuote,
        signing: &SigningMaterial,
    ) -> Result<ExecutionResult, CollaboratorError>;
}

pub trait RiskCheck: Send + Sync {
    fn is_blocked(&self, asset: &str) -> bool;
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NoopPersistence;

#[async_trait]
impl PersistenceSink for NoopPersistence {
    async fn record_order(&self, _order: &LimitOrder) -> Result<(), CollaboratorError> {
        Ok(())
    }

    async fn record_execution(&self, _result: &ExecutionResult) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

/// Keeps every recorded event in memory, in arrival order
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    orders: RwLock<Vec<LimitOrder>>,
    executions: RwLock<Vec<ExecutionResult>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> Vec<LimitOrder> {
        self.orders.read().clone()
    }

    pub fn executions(&self) -> Vec<ExecutionResult> {
        self.executions.read().clone()
    }
}

#[async_trait]
impl PersistenceSink for InMemoryHistory {
    async fn record_order(&self, order: &LimitOrder) -> Result<(), CollaboratorError> {
        self.orders.write().push(order.clone());
        Ok(())
    }

    async fn record_execution(&self, result: &ExecutionResult) -> Result<(), CollaboratorError> {
        self.executions.write().push(result.clone());
        Ok(())
    }
}

/// Execution backend for deployments without settlement wired in
#[derive(Debug, Default)]
pub struct UnconfiguredExecution;

#[async_trait]
impl ExecutionService for UnconfiguredExecution {
    async fn execute(
        &self,
        _quote: &SwapQuote,
        _signing: &SigningMaterial,
    ) -> Result<ExecutionResult, CollaboratorError> {
        Err(CollaboratorError::Unavailable {
            service: "execution",
            reason: "no execution backend configured".to_string(),
        })
    }
}

/// Set of blocked asset identifiers
#[derive(Debug, Default)]
pub struct AssetBlocklist {
    blocked: DashSet<String>,
}

impl AssetBlocklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&self, asset: impl Into<String>) {
        self.blocked.insert(asset.into());
    }

    pub fn unblock(&self, asset: &str) -> bool {
        self.blocked.remove(asset).is_some()
    }
}

impl<S: Into<String>> FromIterator<S> for AssetBlocklist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            blocked: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl RiskCheck for AssetBlocklist {
    fn is_blocked(&self, asset: &str) -> bool {
        self.blocked.contains(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocklist() {
        let list: AssetBlocklist = ["0xbad"].into_iter().collect();
        assert!(list.is_blocked("0xbad"));
        assert!(!list.is_blocked("0xgood"));
        list.block("0xgood");
        assert!(list.is_blocked("0xgood"));
        assert!(list.unblock("0xbad"));
        assert!(!list.is_blocked("0xbad"));
    }
}
