// 8.0 ledger/core.rs: main ledger. holds the registry, positions, id counter,
// event logs, and the injected oracle and token boundary.
// committed events and rejections live in separate bounded logs so failed
// calls can never evict committed history.

use super::config::LedgerConfig;
use super::results::LedgerError;
use crate::events::{
    AssetRegisteredEvent, Event, EventId, EventPayload, Operation, OperationRejectedEvent,
};
use crate::oracle::PriceOracle;
use crate::position::Position;
use crate::registry::{AssetConfig, AssetRegistry};
use crate::token::TokenBoundary;
use crate::types::{AccountId, AssetId, PositionId, Timestamp};
use std::collections::BTreeMap;

/** 8.1: main ledger struct. all position state lives here */
#[derive(Debug)]
pub struct Ledger<O, T> {
    pub(super) config: LedgerConfig,
    pub(super) admin: AccountId,
    pub(super) registry: AssetRegistry,
    pub(super) positions: BTreeMap<PositionId, Position>,
    pub(super) next_position_id: u64,
    pub(super) oracle: O,
    pub(super) tokens: T,
    pub(super) events: Vec<Event>,
    pub(super) rejections: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) current_time: Timestamp,
}

impl<O: PriceOracle, T: TokenBoundary> Ledger<O, T> {
    pub fn new(config: LedgerConfig, admin: AccountId, oracle: O, tokens: T) -> Self {
        Self {
            config,
            admin,
            registry: AssetRegistry::new(),
            positions: BTreeMap::new(),
            next_position_id: 0,
            oracle,
            tokens,
            events: Vec::new(),
            rejections: Vec::new(),
            next_event_id: 1,
            current_time: Timestamp::from_millis(0),
        }
    }

    /// Start the ledger clock at `start` instead of zero.
    pub fn with_clock(mut self, start: Timestamp) -> Self {
        self.current_time = start;
        self
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = Timestamp::from_millis(self.current_time.as_millis().saturating_add(millis));
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn admin(&self) -> AccountId {
        self.admin
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    pub fn tokens(&self) -> &T {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut T {
        &mut self.tokens
    }

    // privileged: only the admin registers synthetic assets
    pub fn register_asset(&mut self, caller: AccountId, config: AssetConfig) -> Result<(), LedgerError> {
        let result = self.try_register(caller, config);
        result.map_err(|err| self.reject(Operation::Register, caller, None, err))
    }

    fn try_register(&mut self, caller: AccountId, config: AssetConfig) -> Result<(), LedgerError> {
        if caller != self.admin {
            return Err(LedgerError::Unauthorized(caller));
        }
        let event = AssetRegisteredEvent {
            asset_id: config.asset_id.clone(),
            min_collateral_ratio: config.min_collateral_ratio,
            decimals: config.decimals,
        };
        self.registry.register(config)?;

        tracing::info!(
            asset = %event.asset_id,
            min_ratio = %event.min_collateral_ratio,
            decimals = event.decimals,
            "asset registered"
        );
        self.emit_event(EventPayload::AssetRegistered(event));
        Ok(())
    }

    pub fn is_registered(&self, asset_id: &AssetId) -> bool {
        self.registry.is_registered(asset_id)
    }

    pub fn asset_config(&self, asset_id: &AssetId) -> Result<&AssetConfig, LedgerError> {
        Ok(self.registry.config_of(asset_id)?)
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions_iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn positions_of(&self, owner: AccountId) -> Vec<&Position> {
        self.positions
            .values()
            .filter(|p| p.is_owned_by(owner))
            .collect()
    }

    // the id the next successful open will receive
    pub fn next_position_id(&self) -> PositionId {
        PositionId(self.next_position_id)
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    /// Committed operations only.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    // rejected calls, kept apart from committed events
    pub fn rejections(&self) -> &[Event] {
        &self.rejections
    }

    fn next_event(&mut self, payload: EventPayload) -> Event {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;
        tracing::debug!(event_id = event.id.0, payload = ?event.payload, "event");
        event
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = self.next_event(payload);
        push_bounded(&mut self.events, event, self.config.max_events);
    }

    // record a rejected call for audit and hand the error back
    pub(super) fn reject(
        &mut self,
        operation: Operation,
        caller: AccountId,
        position_id: Option<PositionId>,
        err: LedgerError,
    ) -> LedgerError {
        tracing::warn!(
            %operation,
            caller = caller.0,
            position = ?position_id.map(|p| p.0),
            error = %err,
            "operation rejected"
        );
        let event = self.next_event(EventPayload::OperationRejected(OperationRejectedEvent {
            operation,
            caller,
            position_id,
            reason: err.to_string(),
        }));
        push_bounded(&mut self.rejections, event, self.config.max_events);
        err
    }
}

fn push_bounded(log: &mut Vec<Event>, event: Event, max: usize) {
    log.push(event);
    if log.len() > max {
        let drain_count = log.len() - max;
        log.drain(0..drain_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MockOracle;
    use crate::token::InMemoryTokens;
    use crate::types::{CollateralRatio, OracleRef, TokenId};

    const ADMIN: AccountId = AccountId(100);

    fn setup_ledger() -> Ledger<MockOracle, InMemoryTokens> {
        Ledger::new(
            LedgerConfig::default(),
            ADMIN,
            MockOracle::new(),
            InMemoryTokens::new(AccountId(0)),
        )
    }

    fn seth() -> AssetConfig {
        AssetConfig::new(
            AssetId::new("sETH"),
            TokenId::new("sETH"),
            CollateralRatio::new(150),
            0,
            OracleRef::new("ETH/USD"),
        )
    }

    #[test]
    fn admin_registers_asset() {
        let mut ledger = setup_ledger();
        ledger.register_asset(ADMIN, seth()).unwrap();

        assert!(ledger.is_registered(&AssetId::new("sETH")));
        assert!(matches!(
            ledger.events().last().map(|e| &e.payload),
            Some(EventPayload::AssetRegistered(_))
        ));
    }

    #[test]
    fn non_admin_cannot_register() {
        let mut ledger = setup_ledger();
        let result = ledger.register_asset(AccountId(1), seth());

        assert_eq!(result, Err(LedgerError::Unauthorized(AccountId(1))));
        assert!(!ledger.is_registered(&AssetId::new("sETH")));
        assert!(ledger.events().is_empty());
        assert!(matches!(
            ledger.rejections().last().map(|e| &e.payload),
            Some(EventPayload::OperationRejected(_))
        ));
    }

    #[test]
    fn duplicate_registration_maps_to_ledger_error() {
        let mut ledger = setup_ledger();
        ledger.register_asset(ADMIN, seth()).unwrap();

        let result = ledger.register_asset(ADMIN, seth());
        assert_eq!(result, Err(LedgerError::AlreadyRegistered(AssetId::new("sETH"))));
        assert!(matches!(
            ledger.asset_config(&AssetId::new("sBTC")),
            Err(LedgerError::NotRegistered(_))
        ));
    }

    #[test]
    fn rejection_log_is_bounded() {
        let config = LedgerConfig {
            max_events: 3,
            ..LedgerConfig::default()
        };
        let mut ledger = Ledger::new(config, ADMIN, MockOracle::new(), InMemoryTokens::new(AccountId(0)));

        for _ in 0..5 {
            let _ = ledger.register_asset(AccountId(1), seth());
        }

        assert_eq!(ledger.rejections().len(), 3);
        assert_eq!(ledger.rejections()[0].id, EventId(3));
        assert_eq!(ledger.rejections()[2].id, EventId(5));
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn rejections_never_evict_committed_events() {
        let config = LedgerConfig {
            max_events: 2,
            ..LedgerConfig::default()
        };
        let mut ledger = Ledger::new(config, ADMIN, MockOracle::new(), InMemoryTokens::new(AccountId(0)));
        ledger.register_asset(ADMIN, seth()).unwrap();

        for _ in 0..10 {
            let _ = ledger.register_asset(AccountId(666), seth());
        }

        assert_eq!(ledger.events().len(), 1);
        assert!(matches!(ledger.events()[0].payload, EventPayload::AssetRegistered(_)));
        assert_eq!(ledger.recent_events(1)[0].id, EventId(1));
        assert_eq!(ledger.rejections().len(), 2);
    }

    #[test]
    fn clock_saturates() {
        let mut ledger = setup_ledger();
        ledger.set_time(Timestamp::from_millis(i64::MAX - 1));
        ledger.advance_time(10);
        assert_eq!(ledger.time(), Timestamp::from_millis(i64::MAX));
    }

    #[test]
    fn clock() {
        let mut ledger = setup_ledger();
        ledger.set_time(Timestamp::from_secs(10));
        ledger.advance_time(500);
        assert_eq!(ledger.time(), Timestamp::from_millis(10_500));
    }
}
