//! Position operations: open, close, deposit, withdraw, mint, burn.
//!
//! Each public operation delegates to a `try_*` body and records a rejection
//! event if it fails. Inside a body the order is always the same: check
//! preconditions and compute the new position, run the token plan, then
//! commit. Nothing is written to `positions` or the id counter before the
//! plan succeeds.

use super::core::Ledger;
use super::results::LedgerError;
use super::transfers::TransferPlan;
use crate::events::{
    CollateralEvent, DebtEvent, EventPayload, Operation, PositionClosedEvent, PositionOpenedEvent,
};
use crate::oracle::PriceOracle;
use crate::position::{Position, PositionHealth};
use crate::ratio::{mint_amount_for, ratio_of};
use crate::registry::AssetConfig;
use crate::token::{TokenBoundary, TokenOp};
use crate::types::{AccountId, Amount, AssetId, CollateralRatio, PositionId, Price};

impl<O: PriceOracle, T: TokenBoundary> Ledger<O, T> {
    /// Lock `collateral` and issue synthetic asset at the requested ratio.
    pub fn open(
        &mut self,
        caller: AccountId,
        collateral: Amount,
        asset_id: &AssetId,
        collateral_ratio: CollateralRatio,
    ) -> Result<PositionId, LedgerError> {
        let result = self.try_open(caller, collateral, asset_id, collateral_ratio);
        result.map_err(|err| self.reject(Operation::Open, caller, None, err))
    }

    /// Burn the full debt, release the full collateral and erase the position.
    pub fn close(&mut self, caller: AccountId, position_id: PositionId) -> Result<(), LedgerError> {
        let result = self.try_close(caller, position_id);
        result.map_err(|err| self.reject(Operation::Close, caller, Some(position_id), err))
    }

    pub fn deposit(
        &mut self,
        caller: AccountId,
        position_id: PositionId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let result = self.try_deposit(caller, position_id, amount);
        result.map_err(|err| self.reject(Operation::Deposit, caller, Some(position_id), err))
    }

    // a withdrawal that would breach the floor is rejected with RatioTooLow
    pub fn withdraw(
        &mut self,
        caller: AccountId,
        position_id: PositionId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let result = self.try_withdraw(caller, position_id, amount);
        result.map_err(|err| self.reject(Operation::Withdraw, caller, Some(position_id), err))
    }

    /// Issue additional synthetic asset against an existing position.
    pub fn mint(
        &mut self,
        caller: AccountId,
        position_id: PositionId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let result = self.try_mint(caller, position_id, amount);
        result.map_err(|err| self.reject(Operation::Mint, caller, Some(position_id), err))
    }

    /// Repay part of the outstanding synthetic asset debt.
    pub fn burn(
        &mut self,
        caller: AccountId,
        position_id: PositionId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let result = self.try_burn(caller, position_id, amount);
        result.map_err(|err| self.reject(Operation::Burn, caller, Some(position_id), err))
    }

    pub fn get_position(&self, position_id: PositionId) -> Result<&Position, LedgerError> {
        self.positions
            .get(&position_id)
            .ok_or(LedgerError::NotFound(position_id))
    }

    /// Live ratio of a position at the current oracle price.
    pub fn collateral_ratio(&self, position_id: PositionId) -> Result<CollateralRatio, LedgerError> {
        let position = self.get_position(position_id)?;
        let config = self.registry.config_of(&position.asset_id)?;
        self.ratio_for(config, position.collateral_amount, position.asset_amount)
    }

    pub fn health(&self, position_id: PositionId) -> Result<PositionHealth, LedgerError> {
        let position = self.get_position(position_id)?;
        let config = self.registry.config_of(&position.asset_id)?;
        let ratio = self.ratio_for(config, position.collateral_amount, position.asset_amount)?;
        Ok(PositionHealth::new(position_id, ratio, config.min_collateral_ratio))
    }

    fn try_open(
        &mut self,
        caller: AccountId,
        collateral: Amount,
        asset_id: &AssetId,
        collateral_ratio: CollateralRatio,
    ) -> Result<PositionId, LedgerError> {
        if collateral.is_zero() {
            return Err(LedgerError::InvalidAmount("collateral must be positive"));
        }
        let config = self.registry.config_of(asset_id)?.clone();
        if !collateral_ratio.meets(config.min_collateral_ratio) {
            return Err(LedgerError::RatioTooLow {
                actual: collateral_ratio,
                minimum: config.min_collateral_ratio,
            });
        }

        let price = self.live_price(&config)?;
        let asset_amount = mint_amount_for(collateral, price, config.decimals, collateral_ratio)?;
        if asset_amount.is_zero() {
            return Err(LedgerError::InvalidAmount("collateral too small to issue any asset"));
        }

        let position_id = PositionId(self.next_position_id);
        let next_id = self
            .next_position_id
            .checked_add(1)
            .ok_or(LedgerError::MathOverflow)?;

        TransferPlan::new()
            .then(TokenOp::TransferIn, &self.config.collateral_token, caller, collateral)
            .then(TokenOp::Mint, &config.token_id, caller, asset_amount)
            .execute(&mut self.tokens)?;

        let position = Position::new(
            position_id,
            caller,
            collateral,
            asset_id.clone(),
            asset_amount,
            self.current_time,
        );
        self.positions.insert(position_id, position);
        self.next_position_id = next_id;

        tracing::info!(
            position = position_id.0,
            owner = caller.0,
            asset = %asset_id,
            collateral = %collateral,
            issued = %asset_amount,
            ratio = %collateral_ratio,
            "position opened"
        );
        self.emit_event(EventPayload::PositionOpened(PositionOpenedEvent {
            position_id,
            owner: caller,
            asset_id: asset_id.clone(),
            collateral_amount: collateral,
            asset_amount,
            requested_ratio: collateral_ratio,
        }));

        Ok(position_id)
    }

    fn try_close(&mut self, caller: AccountId, position_id: PositionId) -> Result<(), LedgerError> {
        let position = self.owned_position(caller, position_id)?.clone();
        let config = self.registry.config_of(&position.asset_id)?;

        TransferPlan::new()
            .then(TokenOp::Burn, &config.token_id, caller, position.asset_amount)
            .then(
                TokenOp::TransferOut,
                &self.config.collateral_token,
                caller,
                position.collateral_amount,
            )
            .execute(&mut self.tokens)?;

        // erased, not tombstoned. the id is never handed out again.
        self.positions.remove(&position_id);

        tracing::info!(
            position = position_id.0,
            owner = caller.0,
            collateral_returned = %position.collateral_amount,
            burned = %position.asset_amount,
            "position closed"
        );
        self.emit_event(EventPayload::PositionClosed(PositionClosedEvent {
            position_id,
            owner: caller,
            collateral_returned: position.collateral_amount,
            asset_burned: position.asset_amount,
        }));

        Ok(())
    }

    fn try_deposit(
        &mut self,
        caller: AccountId,
        position_id: PositionId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount("deposit must be positive"));
        }
        // deposits only improve the ratio, no oracle read needed
        let updated = self
            .owned_position(caller, position_id)?
            .with_collateral_added(amount, self.current_time)
            .ok_or(LedgerError::MathOverflow)?;

        TransferPlan::new()
            .then(TokenOp::TransferIn, &self.config.collateral_token, caller, amount)
            .execute(&mut self.tokens)?;

        let new_collateral = updated.collateral_amount;
        self.positions.insert(position_id, updated);

        tracing::info!(
            position = position_id.0,
            amount = %amount,
            collateral = %new_collateral,
            "collateral deposited"
        );
        self.emit_event(EventPayload::CollateralDeposited(CollateralEvent {
            position_id,
            owner: caller,
            amount,
            new_collateral,
        }));

        Ok(())
    }

    fn try_withdraw(
        &mut self,
        caller: AccountId,
        position_id: PositionId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount("withdrawal must be positive"));
        }
        let position = self.owned_position(caller, position_id)?;
        let updated = position
            .with_collateral_removed(amount, self.current_time)
            .ok_or(LedgerError::InsufficientCollateral {
                requested: amount,
                available: position.collateral_amount,
            })?;

        let config = self.registry.config_of(&updated.asset_id)?;
        self.ensure_ratio(config, updated.collateral_amount, updated.asset_amount)?;

        TransferPlan::new()
            .then(TokenOp::TransferOut, &self.config.collateral_token, caller, amount)
            .execute(&mut self.tokens)?;

        let new_collateral = updated.collateral_amount;
        self.positions.insert(position_id, updated);

        tracing::info!(
            position = position_id.0,
            amount = %amount,
            collateral = %new_collateral,
            "collateral withdrawn"
        );
        self.emit_event(EventPayload::CollateralWithdrawn(CollateralEvent {
            position_id,
            owner: caller,
            amount,
            new_collateral,
        }));

        Ok(())
    }

    fn try_mint(
        &mut self,
        caller: AccountId,
        position_id: PositionId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount("mint must be positive"));
        }
        let updated = self
            .owned_position(caller, position_id)?
            .with_debt_added(amount, self.current_time)
            .ok_or(LedgerError::MathOverflow)?;

        let config = self.registry.config_of(&updated.asset_id)?;
        self.ensure_ratio(config, updated.collateral_amount, updated.asset_amount)?;
        let token_id = config.token_id.clone();

        TransferPlan::new()
            .then(TokenOp::Mint, &token_id, caller, amount)
            .execute(&mut self.tokens)?;

        let new_asset_amount = updated.asset_amount;
        self.positions.insert(position_id, updated);

        tracing::info!(
            position = position_id.0,
            amount = %amount,
            debt = %new_asset_amount,
            "synthetic asset minted"
        );
        self.emit_event(EventPayload::AssetMinted(DebtEvent {
            position_id,
            owner: caller,
            amount,
            new_asset_amount,
        }));

        Ok(())
    }

    fn try_burn(
        &mut self,
        caller: AccountId,
        position_id: PositionId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount("burn must be positive"));
        }
        let position = self.owned_position(caller, position_id)?;
        let updated = position
            .with_debt_removed(amount, self.current_time)
            .ok_or(LedgerError::InsufficientDebt {
                requested: amount,
                outstanding: position.asset_amount,
            })?;

        // burning only improves the ratio, no oracle read needed
        let token_id = self.registry.config_of(&updated.asset_id)?.token_id.clone();

        TransferPlan::new()
            .then(TokenOp::Burn, &token_id, caller, amount)
            .execute(&mut self.tokens)?;

        let new_asset_amount = updated.asset_amount;
        self.positions.insert(position_id, updated);

        tracing::info!(
            position = position_id.0,
            amount = %amount,
            debt = %new_asset_amount,
            "synthetic asset burned"
        );
        self.emit_event(EventPayload::AssetBurned(DebtEvent {
            position_id,
            owner: caller,
            amount,
            new_asset_amount,
        }));

        Ok(())
    }

    fn owned_position(&self, caller: AccountId, position_id: PositionId) -> Result<&Position, LedgerError> {
        let position = self.get_position(position_id)?;
        if !position.is_owned_by(caller) {
            return Err(LedgerError::NotOwner {
                position_id,
                caller,
            });
        }
        Ok(position)
    }

    // oracle read with the staleness policy applied
    fn live_price(&self, config: &AssetConfig) -> Result<Price, LedgerError> {
        let report = self.oracle.latest(&config.oracle)?;
        self.config
            .staleness
            .check(&config.oracle, &report, self.current_time)?;
        if !report.price.is_positive() {
            return Err(LedgerError::InvalidPrice(report.price));
        }
        Ok(report.price)
    }

    fn ratio_for(
        &self,
        config: &AssetConfig,
        collateral: Amount,
        asset_amount: Amount,
    ) -> Result<CollateralRatio, LedgerError> {
        let price = self.live_price(config)?;
        let ratio = ratio_of(collateral, asset_amount, price, config.decimals)?;
        tracing::debug!(
            asset = %config.asset_id,
            price = %price,
            collateral = %collateral,
            debt = %asset_amount,
            ratio = %ratio,
            "ratio evaluated"
        );
        Ok(ratio)
    }

    fn ensure_ratio(
        &self,
        config: &AssetConfig,
        collateral: Amount,
        asset_amount: Amount,
    ) -> Result<CollateralRatio, LedgerError> {
        let ratio = self.ratio_for(config, collateral, asset_amount)?;
        if !ratio.meets(config.min_collateral_ratio) {
            return Err(LedgerError::RatioTooLow {
                actual: ratio,
                minimum: config.min_collateral_ratio,
            });
        }
        Ok(ratio)
    }
}
