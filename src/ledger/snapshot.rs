// 8.4 ledger/snapshot.rs: serializable copy of the durable ledger state.
// the event log and clock are not part of it. restore re-checks every
// structural invariant before handing back a ledger.

use super::config::LedgerConfig;
use super::core::Ledger;
use super::results::LedgerError;
use crate::oracle::PriceOracle;
use crate::position::Position;
use crate::registry::{AssetConfig, AssetRegistry};
use crate::token::TokenBoundary;
use crate::types::{AccountId, PositionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub assets: Vec<AssetConfig>,
    pub positions: Vec<Position>,
    pub next_position_id: PositionId,
}

impl LedgerSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl<O: PriceOracle, T: TokenBoundary> Ledger<O, T> {
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            assets: self.registry.iter().cloned().collect(),
            positions: self.positions.values().cloned().collect(),
            next_position_id: PositionId(self.next_position_id),
        }
    }

    /// Rebuild a ledger from a snapshot. Token balances are not touched, the
    /// boundary handed in is assumed to already hold the matching custody.
    pub fn restore(
        config: LedgerConfig,
        admin: AccountId,
        snapshot: LedgerSnapshot,
        oracle: O,
        tokens: T,
    ) -> Result<Self, LedgerError> {
        let mut registry = AssetRegistry::new();
        for asset in snapshot.assets {
            let asset_id = asset.asset_id.clone();
            registry.register(asset).map_err(|err| {
                LedgerError::InvalidSnapshot(format!("asset {}: {}", asset_id, err))
            })?;
        }

        let next = snapshot.next_position_id;
        let mut positions = BTreeMap::new();
        for position in snapshot.positions {
            if position.id >= next {
                return Err(LedgerError::InvalidSnapshot(format!(
                    "position {} not below next id {}",
                    position.id.0, next.0
                )));
            }
            if !registry.is_registered(&position.asset_id) {
                return Err(LedgerError::InvalidSnapshot(format!(
                    "position {} references unregistered asset {}",
                    position.id.0, position.asset_id
                )));
            }
            if let Some(dup) = positions.insert(position.id, position) {
                return Err(LedgerError::InvalidSnapshot(format!(
                    "duplicate position {}",
                    dup.id.0
                )));
            }
        }

        tracing::info!(
            assets = registry.len(),
            positions = positions.len(),
            next_position_id = next.0,
            "ledger restored from snapshot"
        );

        let mut ledger = Ledger::new(config, admin, oracle, tokens);
        ledger.registry = registry;
        ledger.positions = positions;
        ledger.next_position_id = next.0;
        Ok(ledger)
    }
}
