// 6.0: one collateralized loan. collateral locked in custody against
// synthetic asset debt issued to the owner.
// 6.1 has the pure state transitions the ledger commits.

use crate::types::{AccountId, Amount, AssetId, CollateralRatio, PositionId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub owner: AccountId,
    pub collateral_amount: Amount,
    pub asset_id: AssetId,
    pub asset_amount: Amount,
    pub opened_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Position {
    pub fn new(
        id: PositionId,
        owner: AccountId,
        collateral_amount: Amount,
        asset_id: AssetId,
        asset_amount: Amount,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            owner,
            collateral_amount,
            asset_id,
            asset_amount,
            opened_at: timestamp,
            updated_at: timestamp,
        }
    }

    pub fn is_owned_by(&self, account: AccountId) -> bool {
        self.owner == account
    }

    // 6.1: transitions. each returns the would-be position without touching self
    // so the ledger can validate it before committing anything.

    pub fn with_collateral_added(&self, amount: Amount, timestamp: Timestamp) -> Option<Position> {
        let collateral_amount = self.collateral_amount.checked_add(amount)?;
        Some(Position {
            collateral_amount,
            updated_at: timestamp,
            ..self.clone()
        })
    }

    pub fn with_collateral_removed(&self, amount: Amount, timestamp: Timestamp) -> Option<Position> {
        let collateral_amount = self.collateral_amount.checked_sub(amount)?;
        Some(Position {
            collateral_amount,
            updated_at: timestamp,
            ..self.clone()
        })
    }

    pub fn with_debt_added(&self, amount: Amount, timestamp: Timestamp) -> Option<Position> {
        let asset_amount = self.asset_amount.checked_add(amount)?;
        Some(Position {
            asset_amount,
            updated_at: timestamp,
            ..self.clone()
        })
    }

    pub fn with_debt_removed(&self, amount: Amount, timestamp: Timestamp) -> Option<Position> {
        let asset_amount = self.asset_amount.checked_sub(amount)?;
        Some(Position {
            asset_amount,
            updated_at: timestamp,
            ..self.clone()
        })
    }
}

/// Point-in-time risk view of a position against its asset's floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionHealth {
    pub position_id: PositionId,
    pub ratio: CollateralRatio,
    pub min_ratio: CollateralRatio,
    pub healthy: bool,
}

impl PositionHealth {
    pub fn new(position_id: PositionId, ratio: CollateralRatio, min_ratio: CollateralRatio) -> Self {
        Self {
            position_id,
            ratio,
            min_ratio,
            healthy: ratio.meets(min_ratio),
        }
    }

    // percentage points above the floor, zero when under it. None for debt-free positions.
    pub fn headroom(&self) -> Option<u128> {
        if self.ratio.is_unbounded() {
            return None;
        }
        Some(self.ratio.value().saturating_sub(self.min_ratio.value()))
    }
}
