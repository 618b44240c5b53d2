// 8.0.2: errors for ledger operations. every failure is a rejected call,
// never a crash, and never a partial commit.

use crate::oracle::OracleError;
use crate::ratio::RatioError;
use crate::registry::RegistryError;
use crate::token::TokenError;
use crate::types::{AccountId, Amount, AssetId, CollateralRatio, OracleRef, PositionId, Price};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    // registry
    #[error("Asset {0} is not registered")]
    NotRegistered(AssetId),

    #[error("Asset {0} is already registered")]
    AlreadyRegistered(AssetId),

    #[error("Invalid asset config: {0}")]
    InvalidConfig(String),

    #[error("Account {0:?} may not register assets")]
    Unauthorized(AccountId),

    // position preconditions
    #[error("Position {0:?} not found")]
    NotFound(PositionId),

    #[error("Account {caller:?} does not own position {position_id:?}")]
    NotOwner {
        position_id: PositionId,
        caller: AccountId,
    },

    #[error("Collateral ratio {actual} below minimum {minimum}")]
    RatioTooLow {
        actual: CollateralRatio,
        minimum: CollateralRatio,
    },

    #[error("Insufficient collateral: requested {requested}, locked {available}")]
    InsufficientCollateral { requested: Amount, available: Amount },

    #[error("Insufficient debt: requested {requested}, outstanding {outstanding}")]
    InsufficientDebt { requested: Amount, outstanding: Amount },

    #[error("Invalid amount: {0}")]
    InvalidAmount(&'static str),

    // boundaries
    #[error("Token transfer failed: {0}")]
    TransferFailed(#[from] TokenError),

    #[error("Oracle feed {0} unavailable")]
    OracleUnavailable(OracleRef),

    #[error("Oracle feed {feed} stale: age {age_ms}ms exceeds {max_age_ms}ms")]
    StalePrice {
        feed: OracleRef,
        age_ms: i64,
        max_age_ms: i64,
    },

    #[error("Oracle price {0} is not positive")]
    InvalidPrice(Price),

    #[error("Arithmetic overflow")]
    MathOverflow,

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl From<RegistryError> for LedgerError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotRegistered(id) => LedgerError::NotRegistered(id),
            RegistryError::AlreadyRegistered(id) => LedgerError::AlreadyRegistered(id),
            RegistryError::InvalidConfig { reason } => LedgerError::InvalidConfig(reason),
        }
    }
}

impl From<OracleError> for LedgerError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::Unavailable(feed) => LedgerError::OracleUnavailable(feed),
            OracleError::Stale {
                feed,
                age_ms,
                max_age_ms,
            } => LedgerError::StalePrice {
                feed,
                age_ms,
                max_age_ms,
            },
        }
    }
}

impl From<RatioError> for LedgerError {
    fn from(err: RatioError) -> Self {
        match err {
            RatioError::NonPositivePrice(price) => LedgerError::InvalidPrice(price),
            RatioError::ZeroRatio => LedgerError::RatioTooLow {
                actual: CollateralRatio::new(0),
                minimum: CollateralRatio::new(1),
            },
            RatioError::Overflow => LedgerError::MathOverflow,
        }
    }
}
