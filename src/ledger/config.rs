//! Ledger configuration options.

use crate::oracle::StalenessPolicy;
use crate::types::TokenId;
use serde::{Deserialize, Serialize};

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Token locked as collateral by every position.
    pub collateral_token: TokenId,
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
    /// Freshness bound on oracle reports. Off by default.
    #[serde(default)]
    pub staleness: StalenessPolicy,
}

impl LedgerConfig {
    pub fn with_collateral(collateral_token: TokenId) -> Self {
        Self {
            collateral_token,
            ..Self::default()
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            collateral_token: TokenId::new("USDC"),
            max_events: 100_000,
            staleness: StalenessPolicy::disabled(),
        }
    }
}
