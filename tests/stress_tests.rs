//! End-to-end lifecycle and stress tests.
//!
//! Full position lifecycles, large position books, many concurrent callers,
//! snapshot round trips and config-built deployments.

use synth_ledger::*;

const ADMIN: AccountId = AccountId(1000);
const CUSTODY: AccountId = AccountId(0);

fn usdc() -> TokenId {
    TokenId::new("USDC")
}

fn reference_ledger(accounts: u64, balance: u128) -> Ledger<MockOracle, InMemoryTokens> {
    let oracle = MockOracle::new().with_price(OracleRef::new("A/USD"), 2, Timestamp::from_millis(0));
    let mut tokens = InMemoryTokens::new(CUSTODY);
    for account in 1..=accounts {
        tokens.credit(&usdc(), AccountId(account), Amount::new(balance));
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

#[test]
fn test_reference_lifecycle() {
    let mut ledger = reference_ledger(1, 1_000);
    let owner = AccountId(1);
    let asset = AssetId::new("A");

    let id = ledger.open(owner, Amount::new(300), &asset, CollateralRatio::new(150)).unwrap();
    assert_eq!(id, PositionId(0));
    let position = ledger.get_position(id).unwrap().clone();
    assert_eq!(position.collateral_amount, Amount::new(300));
    assert_eq!(position.asset_amount, Amount::new(1));

    let result = ledger.withdraw(owner, id, Amount::new(300));
    assert!(matches!(result, Err(LedgerError::RatioTooLow { .. })));
    assert_eq!(ledger.get_position(id).unwrap(), &position);

    ledger.close(owner, id).unwrap();
    assert_eq!(ledger.get_position(id), Err(LedgerError::NotFound(id)));
    assert_eq!(ledger.tokens().balance_of(&usdc(), owner), Amount::new(1_000));
    assert_eq!(ledger.tokens().balance_of(&TokenId::new("A"), owner), Amount::zero());

    let kinds: Vec<&str> = ledger
        .events()
        .iter()
        .map(|e| match &e.payload {
            EventPayload::AssetRegistered(_) => "registered",
            EventPayload::PositionOpened(_) => "opened",
            EventPayload::PositionClosed(_) => "closed",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["registered", "opened", "closed"]);
    assert_eq!(ledger.rejections().len(), 1);
    assert!(matches!(
        &ledger.rejections()[0].payload,
        EventPayload::OperationRejected(ev) if ev.operation == Operation::Withdraw
    ));
}

#[test]
fn test_full_lifecycle_with_every_operation() {
    let mut ledger = reference_ledger(1, 100_000);
    let owner = AccountId(1);
    let id = ledger
        .open(owner, Amount::new(6_000), &AssetId::new("A"), CollateralRatio::new(200))
        .unwrap();
    // 6000 / 2 / 200 = 15
    assert_eq!(ledger.get_position(id).unwrap().asset_amount, Amount::new(15));

    ledger.deposit(owner, id, Amount::new(1_500)).unwrap();
    ledger.mint(owner, id, Amount::new(10)).unwrap();
    // 7500 / 2 / 25 = 150
    assert_eq!(ledger.collateral_ratio(id).unwrap(), CollateralRatio::new(150));

    ledger.burn(owner, id, Amount::new(5)).unwrap();
    // 3750 / 20 = 187, room to withdraw 1500: 6000 / 2 / 20 = 150
    ledger.withdraw(owner, id, Amount::new(1_500)).unwrap();
    assert_eq!(ledger.collateral_ratio(id).unwrap(), CollateralRatio::new(150));

    ledger.close(owner, id).unwrap();
    assert_eq!(ledger.position_count(), 0);
    assert_eq!(ledger.tokens().balance_of(&usdc(), owner), Amount::new(100_000));
    assert_eq!(ledger.tokens().total_supply(&TokenId::new("A")), Amount::zero());
}

#[test]
fn test_many_positions() {
    let accounts = 20u64;
    let mut ledger = reference_ledger(accounts, 10_000_000);
    let asset = AssetId::new("A");

    let mut ids = Vec::new();
    for i in 0..1_000u64 {
        let owner = AccountId(1 + i % accounts);
        let collateral = Amount::new(300 + (i as u128 % 50) * 30);
        ids.push((owner, ledger.open(owner, collateral, &asset, CollateralRatio::new(150)).unwrap()));
    }
    assert_eq!(ledger.position_count(), 1_000);
    assert_eq!(ledger.next_position_id(), PositionId(1_000));

    // close every third one
    for (owner, id) in ids.iter().step_by(3) {
        ledger.close(*owner, *id).unwrap();
    }
    assert_eq!(ledger.position_count(), 666);

    for account in 1..=accounts {
        for position in ledger.positions_of(AccountId(account)) {
            assert_eq!(position.owner, AccountId(account));
            assert!(ledger.health(position.id).unwrap().healthy);
        }
    }

    let collateral: u128 = ledger.positions_iter().map(|p| p.collateral_amount.value()).sum();
    assert_eq!(ledger.tokens().custody_balance(&usdc()).value(), collateral);
}

#[test]
fn test_event_log_retention_under_load() {
    let config = LedgerConfig {
        max_events: 50,
        ..LedgerConfig::default()
    };
    let oracle = MockOracle::new().with_price(OracleRef::new("A/USD"), 2, Timestamp::from_millis(0));
    let mut tokens = InMemoryTokens::new(CUSTODY);
    tokens.credit(&usdc(), AccountId(1), Amount::new(1_000_000));
    let mut ledger = Ledger::new(config, ADMIN, oracle, tokens);
    ledger
        .register_asset(
            ADMIN,
            AssetConfig::new(AssetId::new("A"), TokenId::new("A"), CollateralRatio::new(150), 0, OracleRef::new("A/USD")),
        )
        .unwrap();

    for _ in 0..200 {
        ledger
            .open(AccountId(1), Amount::new(300), &AssetId::new("A"), CollateralRatio::new(150))
            .unwrap();
    }

    assert_eq!(ledger.events().len(), 50);
    // 1 registration + 200 opens
    assert_eq!(ledger.events().last().unwrap().id, EventId(201));
    assert_eq!(ledger.recent_events(5).len(), 5);
}

#[test]
fn test_concurrent_lifecycles() {
    let shared = SharedLedger::new(reference_ledger(8, 1_000_000));

    let handles: Vec<_> = (1..=8u64)
        .map(|account| {
            let shared = shared.clone();
            std::thread::spawn(move || {
                let owner = AccountId(account);
                for round in 0..50u128 {
                    let id = shared
                        .open(owner, Amount::new(3_000 + round), &AssetId::new("A"), CollateralRatio::new(150))
                        .unwrap();
                    shared.deposit(owner, id, Amount::new(100)).unwrap();
                    shared.burn(owner, id, Amount::new(1)).unwrap();
                    if round % 2 == 0 {
                        shared.close(owner, id).unwrap();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let (count, next) = shared.with(|l| (l.position_count(), l.next_position_id()));
    assert_eq!(count, 200);
    assert_eq!(next, PositionId(400));

    shared.with(|l| {
        let collateral: u128 = l.positions_iter().map(|p| p.collateral_amount.value()).sum();
        assert_eq!(l.tokens().custody_balance(&usdc()).value(), collateral);
    });
}

#[test]
fn test_snapshot_round_trip_preserves_behavior() {
    let mut ledger = reference_ledger(3, 100_000);
    let asset = AssetId::new("A");
    for owner in 1..=3 {
        let id = ledger
            .open(AccountId(owner), Amount::new(3_000), &asset, CollateralRatio::new(150))
            .unwrap();
        ledger.deposit(AccountId(owner), id, Amount::new(owner as u128 * 100)).unwrap();
    }
    ledger.close(AccountId(2), PositionId(1)).unwrap();

    let json = ledger.snapshot().to_json().unwrap();
    let oracle = MockOracle::new().with_price(OracleRef::new("A/USD"), 2, Timestamp::from_millis(0));
    let mut restored = Ledger::restore(
        LedgerConfig::default(),
        ADMIN,
        LedgerSnapshot::from_json(&json).unwrap(),
        oracle,
        ledger.tokens().clone(),
    )
    .unwrap();

    assert_eq!(restored.snapshot(), ledger.snapshot());
    assert_eq!(restored.get_position(PositionId(1)), Err(LedgerError::NotFound(PositionId(1))));

    // both copies answer the same way from here on
    for l in [&mut ledger, &mut restored] {
        assert!(matches!(
            l.withdraw(AccountId(3), PositionId(2), Amount::new(301)),
            Err(LedgerError::RatioTooLow { .. })
        ));
        l.withdraw(AccountId(3), PositionId(2), Amount::new(300)).unwrap();
        assert_eq!(
            l.open(AccountId(1), Amount::new(300), &asset, CollateralRatio::new(150)).unwrap(),
            PositionId(3)
        );
    }
    assert_eq!(restored.snapshot(), ledger.snapshot());
}

#[test]
fn test_config_built_deployment() {
    let config = ProtocolConfig::from_json(
        r#"{
            "ledger": { "collateral_token": "USDC", "max_events": 1000, "staleness": { "max_age_ms": 60000 } },
            "admin": 1000,
            "assets": [
                {
                    "asset_id": "sETH",
                    "token_id": "sETH",
                    "min_collateral_ratio": 150,
                    "decimals": 18,
                    "oracle": "ETH/USDC"
                }
            ]
        }"#,
    )
    .unwrap();

    let oracle = MockOracle::new().with_price(OracleRef::new("ETH/USDC"), 2_000_000_000, Timestamp::from_secs(100));
    let mut tokens = InMemoryTokens::new(CUSTODY);
    tokens.credit(&usdc(), AccountId(1), Amount::new(10_000_000_000));
    let mut ledger = config.build_ledger(oracle, tokens).unwrap();

    // registration is closed to everyone but the configured admin
    let other = AssetConfig::new(
        AssetId::new("sBTC"),
        TokenId::new("sBTC"),
        CollateralRatio::new(200),
        8,
        OracleRef::new("BTC/USDC"),
    );
    assert_eq!(
        ledger.register_asset(AccountId(1), other.clone()),
        Err(LedgerError::Unauthorized(AccountId(1)))
    );
    ledger.register_asset(AccountId(1000), other).unwrap();

    ledger.set_time(Timestamp::from_secs(130));
    let seth = AssetId::new("sETH");
    let id = ledger
        .open(AccountId(1), Amount::new(3_000_000_000), &seth, CollateralRatio::new(150))
        .unwrap();
    // 3e9 * 1e18 / 2e9 / 150
    assert_eq!(ledger.get_position(id).unwrap().asset_amount, Amount::new(10_000_000_000_000_000));

    // one minute is the bound, at 61s old the report is refused
    ledger.set_time(Timestamp::from_secs(161));
    assert!(matches!(
        ledger.mint(AccountId(1), id, Amount::new(1)),
        Err(LedgerError::StalePrice { .. })
    ));

    ledger
        .oracle_mut()
        .set_price(OracleRef::new("ETH/USDC"), 2_000_000_000, Timestamp::from_secs(160));
    ledger.close(AccountId(1), id).unwrap();
    assert_eq!(ledger.tokens().balance_of(&usdc(), AccountId(1)), Amount::new(10_000_000_000));
}
