//! Collateral-ratio math.
//!
//! Both formulas run strictly left to right with floor division at every
//! step:
//!
//! ```text
//! mint amount = collateral * 10^decimals / price / ratio
//! ratio       = collateral * 10^decimals / price / asset_amount
//! ```
//!
//! Only the synthetic asset's decimal exponent is applied. The oracle's own
//! scale is never queried. The operation order is part of the contract:
//! rearranging it changes rounded results.

use crate::types::{Amount, CollateralRatio, Price};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RatioError {
    #[error("Price {0} is not positive")]
    NonPositivePrice(Price),

    #[error("Collateral ratio must be positive")]
    ZeroRatio,

    #[error("Arithmetic overflow in ratio math")]
    Overflow,
}

/// 10^decimals as an amount scale.
pub fn scale_for(decimals: u32) -> Result<u128, RatioError> {
    10u128.checked_pow(decimals).ok_or(RatioError::Overflow)
}

// collateral * 10^decimals / price, the shared prefix of both formulas
fn collateral_over_price(
    collateral: Amount,
    price: Price,
    decimals: u32,
) -> Result<Amount, RatioError> {
    let price = price.positive().ok_or(RatioError::NonPositivePrice(price))?;
    let scaled = collateral
        .checked_mul(scale_for(decimals)?)
        .ok_or(RatioError::Overflow)?;
    scaled.checked_div(price).ok_or(RatioError::Overflow)
}

/// How much synthetic asset `collateral` may issue when opened at `ratio`.
pub fn mint_amount_for(
    collateral: Amount,
    price: Price,
    decimals: u32,
    ratio: CollateralRatio,
) -> Result<Amount, RatioError> {
    if ratio.value() == 0 {
        return Err(RatioError::ZeroRatio);
    }
    collateral_over_price(collateral, price, decimals)?
        .checked_div(ratio.value())
        .ok_or(RatioError::Overflow)
}

/// Current ratio of a position. A position with no debt has an unbounded ratio.
pub fn ratio_of(
    collateral: Amount,
    asset_amount: Amount,
    price: Price,
    decimals: u32,
) -> Result<CollateralRatio, RatioError> {
    // price is validated even when there is no debt
    let per_price = collateral_over_price(collateral, price, decimals)?;
    if asset_amount.is_zero() {
        return Ok(CollateralRatio::MAX);
    }
    let ratio = per_price
        .checked_div(asset_amount.value())
        .ok_or(RatioError::Overflow)?;
    Ok(CollateralRatio::new(ratio.value()))
}
