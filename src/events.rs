// 7.0: every committed ledger operation produces an event. used for audit trails
// and notifying external systems. rejected operations leave a single
// OperationRejected event in the ledger's rejection log and nothing else.

use crate::types::{AccountId, Amount, AssetId, CollateralRatio, PositionId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    // Registry events
    AssetRegistered(AssetRegisteredEvent),

    // Position lifecycle
    PositionOpened(PositionOpenedEvent),
    PositionClosed(PositionClosedEvent),

    // Position mutations
    CollateralDeposited(CollateralEvent),
    CollateralWithdrawn(CollateralEvent),
    AssetMinted(DebtEvent),
    AssetBurned(DebtEvent),

    OperationRejected(OperationRejectedEvent),
}

// Ledger entry points, for rejection audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Register,
    Open,
    Close,
    Deposit,
    Withdraw,
    Mint,
    Burn,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Register => "register",
            Operation::Open => "open",
            Operation::Close => "close",
            Operation::Deposit => "deposit",
            Operation::Withdraw => "withdraw",
            Operation::Mint => "mint",
            Operation::Burn => "burn",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRegisteredEvent {
    pub asset_id: AssetId,
    pub min_collateral_ratio: CollateralRatio,
    pub decimals: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionOpenedEvent {
    pub position_id: PositionId,
    pub owner: AccountId,
    pub asset_id: AssetId,
    pub collateral_amount: Amount,
    pub asset_amount: Amount,
    pub requested_ratio: CollateralRatio,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionClosedEvent {
    pub position_id: PositionId,
    pub owner: AccountId,
    pub collateral_returned: Amount,
    pub asset_burned: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralEvent {
    pub position_id: PositionId,
    pub owner: AccountId,
    pub amount: Amount,
    pub new_collateral: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtEvent {
    pub position_id: PositionId,
    pub owner: AccountId,
    pub amount: Amount,
    pub new_asset_amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRejectedEvent {
    pub operation: Operation,
    pub caller: AccountId,
    pub position_id: Option<PositionId>,
    pub reason: String,
}
