//! Thread-safe handle around a [`Ledger`].
//!
//! Every call takes the lock for its whole duration, so operations are
//! linearized and two concurrent opens can never observe the same id.

use super::core::Ledger;
use super::results::LedgerError;
use super::snapshot::LedgerSnapshot;
use crate::oracle::PriceOracle;
use crate::position::{Position, PositionHealth};
use crate::token::TokenBoundary;
use crate::types::{AccountId, Amount, AssetId, CollateralRatio, PositionId};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
pub struct SharedLedger<O, T> {
    inner: Arc<Mutex<Ledger<O, T>>>,
}

impl<O, T> Clone for SharedLedger<O, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O: PriceOracle, T: TokenBoundary> SharedLedger<O, T> {
    pub fn new(ledger: Ledger<O, T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Run `f` with exclusive access to the ledger.
    pub fn with<R>(&self, f: impl FnOnce(&mut Ledger<O, T>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    pub fn open(
        &self,
        caller: AccountId,
        collateral: Amount,
        asset_id: &AssetId,
        collateral_ratio: CollateralRatio,
    ) -> Result<PositionId, LedgerError> {
        self.inner.lock().open(caller, collateral, asset_id, collateral_ratio)
    }

    pub fn close(&self, caller: AccountId, position_id: PositionId) -> Result<(), LedgerError> {
        self.inner.lock().close(caller, position_id)
    }

    pub fn deposit(&self, caller: AccountId, position_id: PositionId, amount: Amount) -> Result<(), LedgerError> {
        self.inner.lock().deposit(caller, position_id, amount)
    }

    pub fn withdraw(&self, caller: AccountId, position_id: PositionId, amount: Amount) -> Result<(), LedgerError> {
        self.inner.lock().withdraw(caller, position_id, amount)
    }

    pub fn mint(&self, caller: AccountId, position_id: PositionId, amount: Amount) -> Result<(), LedgerError> {
        self.inner.lock().mint(caller, position_id, amount)
    }

    pub fn burn(&self, caller: AccountId, position_id: PositionId, amount: Amount) -> Result<(), LedgerError> {
        self.inner.lock().burn(caller, position_id, amount)
    }

    // owned copy, the lock is released on return
    pub fn get_position(&self, position_id: PositionId) -> Result<Position, LedgerError> {
        self.inner.lock().get_position(position_id).cloned()
    }

    pub fn health(&self, position_id: PositionId) -> Result<PositionHealth, LedgerError> {
        self.inner.lock().health(position_id)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.inner.lock().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerConfig;
    use crate::oracle::MockOracle;
    use crate::registry::AssetConfig;
    use crate::token::InMemoryTokens;
    use crate::types::{OracleRef, Timestamp, TokenId};
    use std::collections::BTreeSet;
    use std::thread;

    const ADMIN: AccountId = AccountId(100);

    fn shared() -> SharedLedger<MockOracle, InMemoryTokens> {
        let oracle = MockOracle::new().with_price(OracleRef::new("ETH/USD"), 2, Timestamp::from_millis(0));
        let mut tokens = InMemoryTokens::new(AccountId(0));
        for account in 1..=8 {
            tokens.credit(&TokenId::new("USDC"), AccountId(account), Amount::new(100_000));
        }
        let mut ledger = Ledger::new(LedgerConfig::default(), ADMIN, oracle, tokens);
        ledger
            .register_asset(
                ADMIN,
                AssetConfig::new(
                    AssetId::new("sETH"),
                    TokenId::new("sETH"),
                    CollateralRatio::new(150),
                    0,
                    OracleRef::new("ETH/USD"),
                ),
            )
            .unwrap();
        SharedLedger::new(ledger)
    }

    #[test]
    fn concurrent_opens_get_unique_ids() {
        let ledger = shared();
        let handles: Vec<_> = (1..=8)
            .map(|account| {
                let ledger = ledger.clone();
                thread::spawn(move || {
                    (0..25)
                        .map(|_| {
                            ledger
                                .open(AccountId(account), Amount::new(300), &AssetId::new("sETH"), CollateralRatio::new(150))
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = BTreeSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(ids.insert(id), "id {:?} issued twice", id);
            }
        }

        assert_eq!(ids.len(), 200);
        assert_eq!(ids.iter().next_back(), Some(&PositionId(199)));
        assert_eq!(ledger.with(|l| l.position_count()), 200);
    }

    #[test]
    fn get_position_returns_copy() {
        let ledger = shared();
        let id = ledger
            .open(AccountId(1), Amount::new(300), &AssetId::new("sETH"), CollateralRatio::new(150))
            .unwrap();
        let before = ledger.get_position(id).unwrap();
        ledger.deposit(AccountId(1), id, Amount::new(10)).unwrap();

        assert_eq!(before.collateral_amount, Amount::new(300));
        assert_eq!(ledger.get_position(id).unwrap().collateral_amount, Amount::new(310));
        assert!(ledger.health(id).unwrap().healthy);
    }
}
