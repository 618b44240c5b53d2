// synth-ledger: collateralized synthetic asset position ledger.
// invariant-first: every live position stays at or above its asset's
// collateral ratio floor, and a failed operation changes nothing.
// token movement and prices come from injected boundaries, no I/O here.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: PositionId, AccountId, AssetId, Amount, Price, CollateralRatio
//   2.x  registry.rs: synthetic asset configs, registration rules
//   3.x  oracle.rs: price oracle seam, staleness policy, mock feed
//   4.x  ratio.rs: floor-division mint and ratio math
//   5.x  token.rs: token boundary seam, in-memory tokens
//   6.x  position.rs: position struct, pure transitions, health view
//   7.x  events.rs: state transition events for audit
//   8.x  ledger/: core ledger: open, close, deposit, withdraw, mint, burn
//   8.4  ledger/snapshot.rs: serializable state, validated restore
//   9.x  config.rs: protocol config, genesis assets, env presets

pub mod events;
pub mod ledger;
pub mod position;
pub mod ratio;
pub mod registry;
pub mod types;

// boundary modules
pub mod oracle;
pub mod token;

pub mod config;

// re exports for convenience
pub use config::{ConfigError, Environment, ProtocolConfig};
pub use events::*;
pub use ledger::{Ledger, LedgerConfig, LedgerError, LedgerSnapshot, SharedLedger};
pub use oracle::{MockOracle, OracleError, PriceOracle, PriceReport, StalenessPolicy};
pub use position::{Position, PositionHealth};
pub use ratio::RatioError;
pub use registry::{AssetConfig, AssetRegistry, RegistryError};
pub use token::{InMemoryTokens, TokenBoundary, TokenError, TokenOp};
pub use types::*;
