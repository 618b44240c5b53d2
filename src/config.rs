// 9.0 config.rs: protocol settings in one place. ledger options, the admin
// account, and the genesis asset list registered at startup.
// 9.1 environment presets. mainnet turns on the oracle staleness bound.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::ledger::{Ledger, LedgerConfig, LedgerError};
use crate::oracle::{PriceOracle, StalenessPolicy};
use crate::registry::AssetConfig;
use crate::token::TokenBoundary;
use crate::types::{AccountId, AssetId, CollateralRatio, OracleRef, Timestamp, TokenId};

// Complete configuration for a ledger deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub ledger: LedgerConfig,
    // Account allowed to register synthetic assets
    pub admin: AccountId,
    // Assets registered when the ledger is built
    #[serde(default)]
    pub assets: Vec<AssetConfig>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig::default(),
            admin: AccountId(0),
            assets: vec![
                AssetConfig::new(
                    AssetId::new("sETH"),
                    TokenId::new("sETH"),
                    CollateralRatio::new(150),
                    18,
                    OracleRef::new("ETH/USDC"),
                ),
                AssetConfig::new(
                    AssetId::new("sBTC"),
                    TokenId::new("sBTC"),
                    CollateralRatio::new(200),
                    8,
                    OracleRef::new("BTC/USDC"),
                ),
            ],
        }
    }
}

impl ProtocolConfig {
    pub fn testnet() -> Self {
        let mut config = Self::default();
        config.ledger.max_events = 10_000;
        config
    }

    // Production settings: prices older than an hour are refused
    pub fn mainnet() -> Self {
        let mut config = Self::default();
        config.ledger.staleness = StalenessPolicy::max_age_secs(3600);
        config.ledger.max_events = 1_000_000;
        config
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ProtocolConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    // Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.collateral_token.is_null() {
            return Err(ConfigError::InvalidLedger {
                reason: "collateral token must be set".to_string(),
            });
        }

        if self.ledger.max_events == 0 {
            return Err(ConfigError::InvalidLedger {
                reason: "event log must retain at least one event".to_string(),
            });
        }

        if let Some(max_age) = self.ledger.staleness.max_age_ms {
            if max_age <= 0 {
                return Err(ConfigError::InvalidLedger {
                    reason: "staleness bound must be positive".to_string(),
                });
            }
        }

        let mut seen = BTreeSet::new();
        for asset in &self.assets {
            asset.validate().map_err(|e| ConfigError::InvalidAsset {
                asset: asset.asset_id.clone(),
                reason: e.to_string(),
            })?;
            if !seen.insert(&asset.asset_id) {
                return Err(ConfigError::DuplicateAsset(asset.asset_id.clone()));
            }
        }

        Ok(())
    }

    /// Validate, construct the ledger on the wall clock and register every
    /// genesis asset through the admin account.
    pub fn build_ledger<O: PriceOracle, T: TokenBoundary>(
        &self,
        oracle: O,
        tokens: T,
    ) -> Result<Ledger<O, T>, ConfigError> {
        self.build_ledger_at(oracle, tokens, Timestamp::now())
    }

    // same as build_ledger with an explicit start time
    pub fn build_ledger_at<O: PriceOracle, T: TokenBoundary>(
        &self,
        oracle: O,
        tokens: T,
        start: Timestamp,
    ) -> Result<Ledger<O, T>, ConfigError> {
        self.validate()?;

        let mut ledger = Ledger::new(self.ledger.clone(), self.admin, oracle, tokens).with_clock(start);
        for asset in &self.assets {
            ledger.register_asset(self.admin, asset.clone())?;
        }

        tracing::info!(
            admin = self.admin.0,
            collateral = %self.ledger.collateral_token,
            assets = self.assets.len(),
            start_ms = start.as_millis(),
            "ledger built from config"
        );
        Ok(ledger)
    }
}

// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid ledger settings: {reason}")]
    InvalidLedger { reason: String },

    #[error("invalid asset {asset}: {reason}")]
    InvalidAsset { asset: AssetId, reason: String },

    #[error("asset {0} listed twice")]
    DuplicateAsset(AssetId),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("genesis registration failed: {0}")]
    Genesis(#[from] LedgerError),
}

// Environment presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Testnet,
    Mainnet,
}

impl Environment {
    pub fn config(&self) -> ProtocolConfig {
        match self {
            Environment::Development => ProtocolConfig::default(),
            Environment::Testnet => ProtocolConfig::testnet(),
            Environment::Mainnet => ProtocolConfig::mainnet(),
        }
    }
}
