// 5.0 token.rs: the fungible-token boundary. collateral moves in and out of
// custody, synthetic assets are minted to and burned from callers.
// InMemoryTokens is a balance book with failure injection for tests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::types::{AccountId, Amount, TokenId};

// Which boundary call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenOp {
    TransferIn,
    TransferOut,
    Mint,
    Burn,
}

impl fmt::Display for TokenOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenOp::TransferIn => "transfer_in",
            TokenOp::TransferOut => "transfer_out",
            TokenOp::Mint => "mint",
            TokenOp::Burn => "burn",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("{op} of {requested} {token}: insufficient balance {available}")]
    InsufficientBalance {
        op: TokenOp,
        token: TokenId,
        available: Amount,
        requested: Amount,
    },

    #[error("{op} of {token} rejected: {reason}")]
    Rejected {
        op: TokenOp,
        token: TokenId,
        reason: String,
    },

    #[error("{op} of {token} overflows the supply")]
    Overflow { op: TokenOp, token: TokenId },
}

/// The movements the ledger depends on. An `Err` is a failed call; the ledger
/// treats it exactly like a thrown error and aborts the operation.
pub trait TokenBoundary {
    // pull `amount` from `from` into custody
    fn transfer_in(&mut self, token: &TokenId, from: AccountId, amount: Amount) -> Result<(), TokenError>;

    // release `amount` from custody to `to`
    fn transfer_out(&mut self, token: &TokenId, to: AccountId, amount: Amount) -> Result<(), TokenError>;

    fn mint(&mut self, token: &TokenId, to: AccountId, amount: Amount) -> Result<(), TokenError>;

    fn burn(&mut self, token: &TokenId, from: AccountId, amount: Amount) -> Result<(), TokenError>;
}

/// Balance book keyed by (token, holder). Custody holds pulled collateral.
#[derive(Debug, Clone)]
pub struct InMemoryTokens {
    custody: AccountId,
    balances: HashMap<(TokenId, AccountId), Amount>,
    supply: HashMap<TokenId, Amount>,
    fail_next: Vec<TokenOp>,
    fail_always: Vec<TokenOp>,
    calls: u64,
}

impl InMemoryTokens {
    pub fn new(custody: AccountId) -> Self {
        Self {
            custody,
            balances: HashMap::new(),
            supply: HashMap::new(),
            fail_next: Vec::new(),
            fail_always: Vec::new(),
            calls: 0,
        }
    }

    // seed a holder's balance outside the ledger (faucet)
    pub fn credit(&mut self, token: &TokenId, holder: AccountId, amount: Amount) {
        let balance = self.balances.entry((token.clone(), holder)).or_default();
        *balance = balance.checked_add(amount).unwrap_or(Amount::new(u128::MAX));
        let supply = self.supply.entry(token.clone()).or_default();
        *supply = supply.checked_add(amount).unwrap_or(Amount::new(u128::MAX));
    }

    pub fn balance_of(&self, token: &TokenId, holder: AccountId) -> Amount {
        self.balances
            .get(&(token.clone(), holder))
            .copied()
            .unwrap_or_default()
    }

    pub fn custody_balance(&self, token: &TokenId) -> Amount {
        self.balance_of(token, self.custody)
    }

    pub fn total_supply(&self, token: &TokenId) -> Amount {
        self.supply.get(token).copied().unwrap_or_default()
    }

    /// The next call of `op` fails once.
    pub fn fail_next(&mut self, op: TokenOp) {
        self.fail_next.push(op);
    }

    /// Every call of `op` fails until `clear_failures`.
    pub fn fail_always(&mut self, op: TokenOp) {
        if !self.fail_always.contains(&op) {
            self.fail_always.push(op);
        }
    }

    pub fn clear_failures(&mut self) {
        self.fail_next.clear();
        self.fail_always.clear();
    }

    // number of boundary calls attempted, failed ones included
    pub fn call_count(&self) -> u64 {
        self.calls
    }

    fn check_injected(&mut self, op: TokenOp, token: &TokenId) -> Result<(), TokenError> {
        self.calls += 1;
        if self.fail_always.contains(&op) {
            return Err(TokenError::Rejected {
                op,
                token: token.clone(),
                reason: "injected failure".to_string(),
            });
        }
        if let Some(idx) = self.fail_next.iter().position(|o| *o == op) {
            self.fail_next.remove(idx);
            return Err(TokenError::Rejected {
                op,
                token: token.clone(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn debit(
        &mut self,
        op: TokenOp,
        token: &TokenId,
        holder: AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let available = self.balance_of(token, holder);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| TokenError::InsufficientBalance {
                op,
                token: token.clone(),
                available,
                requested: amount,
            })?;
        self.balances.insert((token.clone(), holder), remaining);
        Ok(())
    }

    fn add_to(
        &mut self,
        op: TokenOp,
        token: &TokenId,
        holder: AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let current = self.balance_of(token, holder);
        let updated = current.checked_add(amount).ok_or_else(|| TokenError::Overflow {
            op,
            token: token.clone(),
        })?;
        self.balances.insert((token.clone(), holder), updated);
        Ok(())
    }

    fn transfer(
        &mut self,
        op: TokenOp,
        token: &TokenId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        // check the credit side first so a failed move leaves both balances untouched
        self.balance_of(token, to)
            .checked_add(amount)
            .ok_or_else(|| TokenError::Overflow {
                op,
                token: token.clone(),
            })?;
        self.debit(op, token, from, amount)?;
        self.add_to(op, token, to, amount)
    }
}

impl TokenBoundary for InMemoryTokens {
    fn transfer_in(&mut self, token: &TokenId, from: AccountId, amount: Amount) -> Result<(), TokenError> {
        self.check_injected(TokenOp::TransferIn, token)?;
        let custody = self.custody;
        self.transfer(TokenOp::TransferIn, token, from, custody, amount)
    }

    fn transfer_out(&mut self, token: &TokenId, to: AccountId, amount: Amount) -> Result<(), TokenError> {
        self.check_injected(TokenOp::TransferOut, token)?;
        let custody = self.custody;
        self.transfer(TokenOp::TransferOut, token, custody, to, amount)
    }

    fn mint(&mut self, token: &TokenId, to: AccountId, amount: Amount) -> Result<(), TokenError> {
        self.check_injected(TokenOp::Mint, token)?;
        let supply = self.total_supply(token);
        let new_supply = supply.checked_add(amount).ok_or_else(|| TokenError::Overflow {
            op: TokenOp::Mint,
            token: token.clone(),
        })?;
        self.add_to(TokenOp::Mint, token, to, amount)?;
        self.supply.insert(token.clone(), new_supply);
        Ok(())
    }

    fn burn(&mut self, token: &TokenId, from: AccountId, amount: Amount) -> Result<(), TokenError> {
        self.check_injected(TokenOp::Burn, token)?;
        self.debit(TokenOp::Burn, token, from, amount)?;
        let supply = self.total_supply(token);
        self.supply
            .insert(token.clone(), supply.checked_sub(amount).unwrap_or_default());
        Ok(())
    }
}
