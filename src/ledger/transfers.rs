//! Compensating transfer plans.
//!
//! An operation that moves more than one token (open pulls collateral then
//! mints, close burns then releases collateral) runs its boundary calls as a
//! plan. If step N fails, steps 0..N are undone in reverse with their inverse
//! call, so no half-finished movement outlives the failed operation.

use crate::token::{TokenBoundary, TokenError, TokenOp};
use crate::types::{AccountId, Amount, TokenId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TransferStep {
    pub op: TokenOp,
    pub token: TokenId,
    pub account: AccountId,
    pub amount: Amount,
}

impl TransferStep {
    pub fn new(op: TokenOp, token: &TokenId, account: AccountId, amount: Amount) -> Self {
        Self {
            op,
            token: token.clone(),
            account,
            amount,
        }
    }

    fn apply<T: TokenBoundary>(&self, tokens: &mut T) -> Result<(), TokenError> {
        match self.op {
            TokenOp::TransferIn => tokens.transfer_in(&self.token, self.account, self.amount),
            TokenOp::TransferOut => tokens.transfer_out(&self.token, self.account, self.amount),
            TokenOp::Mint => tokens.mint(&self.token, self.account, self.amount),
            TokenOp::Burn => tokens.burn(&self.token, self.account, self.amount),
        }
    }

    fn inverse(&self) -> TransferStep {
        let op = match self.op {
            TokenOp::TransferIn => TokenOp::TransferOut,
            TokenOp::TransferOut => TokenOp::TransferIn,
            TokenOp::Mint => TokenOp::Burn,
            TokenOp::Burn => TokenOp::Mint,
        };
        TransferStep { op, ..self.clone() }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TransferPlan {
    steps: Vec<TransferStep>,
}

impl TransferPlan {
    pub fn new() -> Self {
        Self::default()
    }

    // zero-amount steps are dropped, there is nothing to move
    pub fn then(mut self, op: TokenOp, token: &TokenId, account: AccountId, amount: Amount) -> Self {
        if !amount.is_zero() {
            self.steps.push(TransferStep::new(op, token, account, amount));
        }
        self
    }

    #[cfg(test)]
    pub fn steps(&self) -> &[TransferStep] {
        &self.steps
    }

    pub fn execute<T: TokenBoundary>(self, tokens: &mut T) -> Result<(), TokenError> {
        for (idx, step) in self.steps.iter().enumerate() {
            if let Err(err) = step.apply(tokens) {
                tracing::warn!(
                    op = %step.op,
                    token = %step.token,
                    amount = %step.amount,
                    error = %err,
                    "boundary call failed, unwinding {} completed step(s)",
                    idx
                );
                Self::unwind(&self.steps[..idx], tokens);
                return Err(err);
            }
        }
        Ok(())
    }

    fn unwind<T: TokenBoundary>(completed: &[TransferStep], tokens: &mut T) {
        for step in completed.iter().rev() {
            let inverse = step.inverse();
            if let Err(err) = inverse.apply(tokens) {
                tracing::error!(
                    op = %inverse.op,
                    token = %inverse.token,
                    account = inverse.account.0,
                    amount = %inverse.amount,
                    error = %err,
                    "compensating transfer failed"
                );
            }
        }
    }
}
