// 8.0: the position ledger. owns the position table and id counter, enforces
// ownership and the collateral ratio floor, and drives the token boundary.
// every operation validates and computes first, moves tokens second, and
// commits last, so a failure anywhere leaves positions untouched.

mod config;
mod core;
mod operations;
mod results;
mod shared;
mod snapshot;
mod transfers;

pub use config::LedgerConfig;
pub use core::Ledger;
pub use results::LedgerError;
pub use shared::SharedLedger;
pub use snapshot::LedgerSnapshot;
