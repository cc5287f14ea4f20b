//! Pool seed loading
//!
//! Reads a JSON file of pool snapshots with human-readable decimal reserves
//! and converts them to raw-unit [`PoolState`]s. Invalid entries are skipped
//! with a warning; an unreadable or malformed file is an error.

use amm::PoolState;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use types::{amount_from_decimal_str, AssetPair};

#[derive(Debug, Deserialize, Serialize)]
struct PoolSeedJson {
    version: u32,
    pools: Vec<PoolJson>,
}

#[derive(Debug, Deserialize, Serialize)]
struct PoolJson {
    token_a: String,
    token_b: String,
    /// Decimal string in token_a units
    reserve_a: String,
    reserve_b: String,
    decimals_a: u32,
    decimals_b: u32,
    fee_bps: u32,
}

/// Load pool seed from a JSON file
pub fn load_pool_seed(seed_path: &Path, now_ns: u64) -> Result<Vec<PoolState>> {
    info!("Loading pool seed from {:?}", seed_path);

    let json_content = fs::read_to_string(seed_path)
        .with_context(|| format!("Failed to read pool seed file {}", seed_path.display()))?;
    let seed: PoolSeedJson =
        serde_json::from_str(&json_content).context("Failed to parse pool seed JSON")?;

    info!("Found {} pools in seed version {}", seed.pools.len(), seed.version);

    let mut pools = Vec::with_capacity(seed.pools.len());
    for pool_json in seed.pools {
        match parse_pool(&pool_json, now_ns) {
            Ok(pool) => pools.push(pool),
            Err(e) => {
                warn!(
                    "Skipping pool {}/{}: {:#}",
                    pool_json.token_a, pool_json.token_b, e
                );
            }
        }
    }

    info!("Loaded {} pools from seed", pools.len());
    Ok(pools)
}

fn parse_pool(pool_json: &PoolJson, now_ns: u64) -> Result<PoolState> {
    let pair = AssetPair::canonical(pool_json.token_a.as_str(), pool_json.token_b.as_str())?;
    let reserve_a = amount_from_decimal_str(&pool_json.reserve_a, pool_json.decimals_a)
        .with_context(|| format!("reserve of {}", pool_json.token_a))?;
    let reserve_b = amount_from_decimal_str(&pool_json.reserve_b, pool_json.decimals_b)
        .with_context(|| format!("reserve of {}", pool_json.token_b))?;

    let (reserve_base, reserve_quote) = if pair.base() == pool_json.token_a {
        (reserve_a, reserve_b)
    } else {
        (reserve_b, reserve_a)
    };
    Ok(PoolState::new(pair, reserve_base, reserve_quote, pool_json.fee_bps, now_ns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const E18: u128 = 1_000_000_000_000_000_000;

    fn write_seed(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_loads_pools_in_canonical_orientation() {
        // token_a sorts after token_b, so reserves swap into base/quote
        let file = write_seed(
            r#"{
                "version": 1,
                "pools": [
                    {
                        "token_a": "0xusdc", "token_b": "0xaweth",
                        "reserve_a": "1500", "reserve_b": "1000",
                        "decimals_a": 6, "decimals_b": 18, "fee_bps": 30
                    }
                ]
            }"#,
        );
        let pools = load_pool_seed(file.path(), 42).unwrap();
        assert_eq!(pools.len(), 1);
        let pool = &pools[0];
        assert_eq!(pool.pair.base(), "0xaweth");
        assert_eq!(pool.reserve_base, 1_000 * E18);
        assert_eq!(pool.reserve_quote, 1_500_000_000);
        assert_eq!(pool.fee.get(), 30);
        assert_eq!(pool.last_update_ns, 42);
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let file = write_seed(
            r#"{
                "version": 1,
                "pools": [
                    { "token_a": "a", "token_b": "a", "reserve_a": "1", "reserve_b": "1",
                      "decimals_a": 0, "decimals_b": 0, "fee_bps": 30 },
                    { "token_a": "a", "token_b": "b", "reserve_a": "0.001", "reserve_b": "1",
                      "decimals_a": 2, "decimals_b": 0, "fee_bps": 30 },
                    { "token_a": "a", "token_b": "c", "reserve_a": "0", "reserve_b": "1",
                      "decimals_a": 0, "decimals_b": 0, "fee_bps": 30 },
                    { "token_a": "a", "token_b": "d", "reserve_a": "1", "reserve_b": "1",
                      "decimals_a": 0, "decimals_b": 0, "fee_bps": 10000 },
                    { "token_a": "a", "token_b": "e", "reserve_a": "2.5", "reserve_b": "7",
                      "decimals_a": 1, "decimals_b": 0, "fee_bps": 5 }
                ]
            }"#,
        );
        let pools = load_pool_seed(file.path(), 0).unwrap();
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].reserve_base, 25);
        assert_eq!(pools[0].reserve_quote, 7);
    }

    #[test]
    fn test_missing_or_malformed_file_fails() {
        assert!(load_pool_seed(Path::new("/nonexistent/pools.json"), 0).is_err());
        let file = write_seed("not json");
        assert!(load_pool_seed(file.path(), 0).is_err());
    }

    #[test]
    fn test_shipped_seed_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/pools.json");
        let pools = load_pool_seed(&path, 0).unwrap();
        assert_eq!(pools.len(), 2);
        assert!(pools.iter().all(|pool| pool.validate().is_ok()));
    }
}
