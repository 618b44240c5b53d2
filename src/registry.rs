//! Synthetic asset registry.
//!
//! Each synthetic asset is registered once with the token that represents it,
//! the minimum collateral ratio positions against it must hold, its decimal
//! exponent and the oracle feed that prices it. Configs are immutable after
//! registration: there is no update or unregister.

use crate::types::{AssetId, CollateralRatio, OracleRef, TokenId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub asset_id: AssetId,
    pub token_id: TokenId,
    pub min_collateral_ratio: CollateralRatio,
    /// Decimal exponent of the synthetic asset. Scales collateral in ratio math.
    pub decimals: u32,
    pub oracle: OracleRef,
}

impl AssetConfig {
    pub fn new(
        asset_id: AssetId,
        token_id: TokenId,
        min_collateral_ratio: CollateralRatio,
        decimals: u32,
        oracle: OracleRef,
    ) -> Self {
        Self {
            asset_id,
            token_id,
            min_collateral_ratio,
            decimals,
            oracle,
        }
    }

    /// Checks everything about the config that does not depend on registry state.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.asset_id.is_null() {
            return Err(RegistryError::InvalidConfig {
                reason: "asset id is empty".to_string(),
            });
        }
        if self.token_id.is_null() {
            return Err(RegistryError::InvalidConfig {
                reason: "token id is empty".to_string(),
            });
        }
        if self.min_collateral_ratio.value() < 1 {
            return Err(RegistryError::InvalidConfig {
                reason: "minimum collateral ratio must be at least 1".to_string(),
            });
        }
        if 10u128.checked_pow(self.decimals).is_none() {
            return Err(RegistryError::InvalidConfig {
                reason: format!("decimals {} overflow the amount range", self.decimals),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Asset {0} is not registered")]
    NotRegistered(AssetId),

    #[error("Asset {0} is already registered")]
    AlreadyRegistered(AssetId),

    #[error("Invalid asset config: {reason}")]
    InvalidConfig { reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    assets: BTreeMap<AssetId, AssetConfig>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // write-once: a second registration for the same id fails
    pub fn register(&mut self, config: AssetConfig) -> Result<(), RegistryError> {
        config.validate()?;
        if self.assets.contains_key(&config.asset_id) {
            return Err(RegistryError::AlreadyRegistered(config.asset_id));
        }
        self.assets.insert(config.asset_id.clone(), config);
        Ok(())
    }

    pub fn is_registered(&self, asset_id: &AssetId) -> bool {
        self.assets.contains_key(asset_id)
    }

    pub fn config_of(&self, asset_id: &AssetId) -> Result<&AssetConfig, RegistryError> {
        self.assets
            .get(asset_id)
            .ok_or_else(|| RegistryError::NotRegistered(asset_id.clone()))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetConfig> {
        self.assets.values()
    }
}
