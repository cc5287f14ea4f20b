//! Pool registry
//!
//! One pool per canonical pair, each behind its own lock so updates to one
//! market never contend with reads of another. Readers receive cloned
//! snapshots taken under a short read lock.

use crate::error::Result;
use crate::pool::PoolState;
use crate::pool_traits::{AmmPool, SwapSimulation};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use types::{AssetPair, BasisPoints, Price};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_pools: usize,
    pub total_updates: u64,
    pub last_update_ns: u64,
}

/// Manages state for all pools
#[derive(Default)]
pub struct PoolRegistry {
    pools: DashMap<AssetPair, Arc<RwLock<PoolState>>>,
    stats: RwLock<RegistryStats>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pool or replace the reserves of an existing one
    pub fn upsert(&self, pool: PoolState) -> Result<()> {
        pool.validate()?;
        let pair = pool.pair.clone();
        let updated_at = pool.last_update_ns;

        self.pools
            .entry(pair.clone())
            .and_modify(|existing| *existing.write() = pool.clone())
            .or_insert_with(|| Arc::new(RwLock::new(pool)));

        let mut stats = self.stats.write();
        stats.total_pools = self.pools.len();
        stats.total_updates += 1;
        stats.last_update_ns = stats.last_update_ns.max(updated_at);
        debug!(%pair, "pool state updated");
        Ok(())
    }

    /// Load a batch of pools at startup
    pub fn initialize_from_seed(&self, pools: Vec<PoolState>) -> Result<usize> {
        let count = pools.len();
        for pool in pools {
            self.upsert(pool)?;
        }
        info!("✅ PoolRegistry initialized: {} pools", self.pools.len());
        Ok(count)
    }

    /// Snapshot of the pool for `pair`
    pub fn get(&self, pair: &AssetPair) -> Option<PoolState> {
        self.pools.get(pair).map(|entry| entry.read().clone())
    }

    /// Marginal quote-per-base price and fee rate
    pub fn get_price(&self, pair: &AssetPair) -> Result<Option<(Price, BasisPoints)>> {
        match self.get(pair) {
            Some(pool) => Ok(Some((pool.spot_price()?, pool.fee))),
            None => Ok(None),
        }
    }

    /// Price a swap against the current snapshot; `None` if no pool exists
    pub fn simulate_swap(
        &self,
        pair: &AssetPair,
        token_in: &str,
        amount_in: u128,
    ) -> Result<Option<SwapSimulation>> {
        match self.get(pair) {
            Some(pool) => Ok(Some(pool.simulate_swap(token_in, amount_in)?)),
            None => Ok(None),
        }
    }

    pub fn pairs(&self) -> Vec<AssetPair> {
        self.pools.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(reserve_base: u128, reserve_quote: u128) -> PoolState {
        let pair = AssetPair::canonical("usei", "uatom").unwrap();
        PoolState::new(pair, reserve_base, reserve_quote, 30, 7).unwrap()
    }

    #[test]
    fn test_upsert_replaces_existing_pool() {
        let registry = PoolRegistry::new();
        registry.upsert(pool(1_000, 2_000)).unwrap();
        registry.upsert(pool(3_000, 4_000)).unwrap();

        let pair = AssetPair::canonical("uatom", "usei").unwrap();
        let snapshot = registry.get(&pair).unwrap();
        assert_eq!(snapshot.reserve_base, 3_000);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.stats().total_updates, 2);
    }

    #[test]
    fn test_missing_pool_is_none_not_error() {
        let registry = PoolRegistry::new();
        let pair = AssetPair::canonical("a", "b").unwrap();
        assert_eq!(registry.simulate_swap(&pair, "a", 10).unwrap(), None);
        assert_eq!(registry.get_price(&pair).unwrap(), None);
    }

    #[test]
    fn test_simulation_leaves_registry_unchanged() {
        let registry = PoolRegistry::new();
        registry.upsert(pool(1_000_000, 2_000_000)).unwrap();
        let pair = AssetPair::canonical("uatom", "usei").unwrap();

        let sim = registry.simulate_swap(&pair, "uatom", 10_000).unwrap().unwrap();
        assert!(sim.amount_out > 0);
        assert_eq!(registry.get(&pair).unwrap().reserve_base, 1_000_000);
    }
}
