//! Synthetic asset ledger simulation.
//!
//! Walks the position lifecycle against in-memory tokens and a mock oracle:
//! opening, collateral moves, minting and burning, failed boundary calls,
//! price shocks, concurrent callers and snapshot restore.

use synth_ledger::*;
use tracing_subscriber::EnvFilter;

const ADMIN: AccountId = AccountId(1000);
const CUSTODY: AccountId = AccountId(0);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("synth_ledger=info")),
        )
        .init();

    println!("Synthetic Asset Ledger Simulation");
    println!("Over-collateralized positions, floor-division ratio math\n");

    scenario_1_reference_lifecycle();
    scenario_2_genesis_config();
    scenario_3_atomic_failures();
    scenario_4_price_shock();
    scenario_5_concurrent_callers();
    scenario_6_snapshot_restore();

    println!("\nAll simulations completed successfully.");
}

fn reference_ledger() -> Ledger<MockOracle, InMemoryTokens> {
    let oracle = MockOracle::new().with_price(OracleRef::new("A/USD"), 2, Timestamp::from_millis(0));
    let mut tokens = InMemoryTokens::new(CUSTODY);
    for account in 1..=4 {
        tokens.credit(&TokenId::new("USDC"), AccountId(account), Amount::new(10_000));
    }

    let mut ledger = Ledger::new(LedgerConfig::default(), ADMIN, oracle, tokens);
    ledger
        .register_asset(
            ADMIN,
            AssetConfig::new(AssetId::new("A"), TokenId::new("A"), CollateralRatio::new(150), 0, OracleRef::new("A/USD")),
        )
        .unwrap();
    ledger
}

/// Open, attempt to withdraw everything, close.
fn scenario_1_reference_lifecycle() {
    println!("Scenario 1: Reference Lifecycle\n");

    let mut ledger = reference_ledger();
    let alice = AccountId(1);
    let asset = AssetId::new("A");

    let id = ledger.open(alice, Amount::new(300), &asset, CollateralRatio::new(150)).unwrap();
    let pos = ledger.get_position(id).unwrap();
    println!("  Alice opens with 300 collateral at 150, price 2");
    println!("  Position {}: {} collateral, {} issued", id.0, pos.collateral_amount, pos.asset_amount);

    let result = ledger.withdraw(alice, id, Amount::new(300));
    println!("  Withdraw 300: {}", result.unwrap_err());

    ledger.close(alice, id).unwrap();
    println!("  Closed. Alice collateral balance: {}", ledger.tokens().balance_of(&TokenId::new("USDC"), alice));
    println!("  Lookup after close: {}\n", ledger.get_position(id).unwrap_err());
}

/// Build a ledger from the development preset and open against an 18-decimal asset.
fn scenario_2_genesis_config() {
    println!("Scenario 2: Genesis Config\n");

    let config = Environment::Development.config();
    let oracle = MockOracle::new()
        .with_price(OracleRef::new("ETH/USDC"), 2_000_000_000, Timestamp::from_millis(0))
        .with_price(OracleRef::new("BTC/USDC"), 60_000_000_000, Timestamp::from_millis(0));
    let mut tokens = InMemoryTokens::new(CUSTODY);
    let bob = AccountId(2);
    tokens.credit(&config.ledger.collateral_token, bob, Amount::new(50_000_000_000));

    let mut ledger = config.build_ledger(oracle, tokens).unwrap();
    println!("  Registered {} assets from config", ledger.registry().len());

    let seth = AssetId::new("sETH");
    let id = ledger.open(bob, Amount::new(3_000_000_000), &seth, CollateralRatio::new(150)).unwrap();
    println!("  Bob locks 3,000 USDC at 150 -> {} sETH base units", ledger.get_position(id).unwrap().asset_amount);

    let sbtc = AssetId::new("sBTC");
    let result = ledger.open(bob, Amount::new(3_000_000_000), &sbtc, CollateralRatio::new(150));
    println!("  sBTC at 150 rejected: {}\n", result.unwrap_err());
}

/// Boundary failures unwind earlier token moves and leave the ledger untouched.
fn scenario_3_atomic_failures() {
    println!("Scenario 3: Atomic Failures\n");

    let mut ledger = reference_ledger();
    let carol = AccountId(3);
    let asset = AssetId::new("A");
    let usdc = TokenId::new("USDC");

    ledger.tokens_mut().fail_next(TokenOp::Mint);
    let result = ledger.open(carol, Amount::new(600), &asset, CollateralRatio::new(150));
    println!("  Open with failing mint: {}", result.unwrap_err());
    println!("  Positions: {}, next id still {}", ledger.position_count(), ledger.next_position_id().0);
    println!("  Carol collateral balance: {}", ledger.tokens().balance_of(&usdc, carol));

    let id = ledger.open(carol, Amount::new(600), &asset, CollateralRatio::new(150)).unwrap();
    ledger.tokens_mut().fail_next(TokenOp::TransferOut);
    let result = ledger.close(carol, id);
    println!("  Close with failing release: {}", result.unwrap_err());
    let pos = ledger.get_position(id).unwrap();
    println!("  Position {} intact: {} collateral, {} debt\n", id.0, pos.collateral_amount, pos.asset_amount);
}

/// Health drops below the floor when the price rises, and repayment restores it.
fn scenario_4_price_shock() {
    println!("Scenario 4: Price Shock\n");

    let mut ledger = reference_ledger();
    let dave = AccountId(4);
    let id = ledger.open(dave, Amount::new(3_000), &AssetId::new("A"), CollateralRatio::new(150)).unwrap();
    print_health(&ledger, id);

    ledger.oracle_mut().set_price(OracleRef::new("A/USD"), 3, Timestamp::from_millis(0));
    println!("  Price moves 2 -> 3");
    print_health(&ledger, id);

    let result = ledger.mint(dave, id, Amount::new(1));
    println!("  Further mint: {}", result.unwrap_err());

    ledger.burn(dave, id, Amount::new(4)).unwrap();
    println!("  Dave burns 4");
    print_health(&ledger, id);
    println!();
}

fn print_health(ledger: &Ledger<MockOracle, InMemoryTokens>, id: PositionId) {
    let health = ledger.health(id).unwrap();
    println!(
        "    ratio {} (floor {}), healthy: {}, headroom: {:?}",
        health.ratio, health.min_ratio, health.healthy, health.headroom()
    );
}

/// Several threads open through one shared handle.
fn scenario_5_concurrent_callers() {
    println!("Scenario 5: Concurrent Callers\n");

    let shared = SharedLedger::new(reference_ledger());
    let handles: Vec<_> = (1..=4)
        .map(|account| {
            let shared = shared.clone();
            std::thread::spawn(move || {
                for _ in 0..10 {
                    shared
                        .open(AccountId(account), Amount::new(300), &AssetId::new("A"), CollateralRatio::new(150))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let (count, next) = shared.with(|l| (l.position_count(), l.next_position_id()));
    println!("  4 threads x 10 opens: {} positions, next id {}\n", count, next.0);
}

/// Snapshot to JSON and restore into a fresh ledger.
fn scenario_6_snapshot_restore() {
    println!("Scenario 6: Snapshot Restore\n");

    let mut ledger = reference_ledger();
    let alice = AccountId(1);
    let asset = AssetId::new("A");
    let first = ledger.open(alice, Amount::new(300), &asset, CollateralRatio::new(150)).unwrap();
    ledger.open(alice, Amount::new(900), &asset, CollateralRatio::new(300)).unwrap();
    ledger.close(alice, first).unwrap();

    let json = ledger.snapshot().to_json().unwrap();
    println!("  Snapshot is {} bytes of JSON", json.len());

    let snapshot = LedgerSnapshot::from_json(&json).unwrap();
    let oracle = MockOracle::new().with_price(OracleRef::new("A/USD"), 2, Timestamp::from_millis(0));
    let mut restored =
        Ledger::restore(LedgerConfig::default(), ADMIN, snapshot, oracle, ledger.tokens().clone()).unwrap();

    let id = restored.open(alice, Amount::new(300), &asset, CollateralRatio::new(150)).unwrap();
    println!("  Restored {} position(s); next open got id {}", restored.position_count() - 1, id.0);
}
