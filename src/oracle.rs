// Price Oracle Adapter
//
// The ledger never owns prices. It asks an oracle for the latest report on a
// feed and uses it for the duration of one operation. Whether the report comes
// from Chainlink, Pyth or a test double is invisible to the ledger.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{OracleRef, Price, Timestamp};

/// Latest answer of a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceReport {
    pub price: Price,
    pub updated_at: Timestamp,
}

impl PriceReport {
    pub fn new(price: Price, updated_at: Timestamp) -> Self {
        Self { price, updated_at }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("Oracle feed {0} is unavailable")]
    Unavailable(OracleRef),

    #[error("Oracle feed {feed} is stale: age {age_ms}ms exceeds {max_age_ms}ms")]
    Stale {
        feed: OracleRef,
        age_ms: i64,
        max_age_ms: i64,
    },
}

/// Anything that can answer "what is the latest price on this feed".
pub trait PriceOracle {
    fn latest(&self, feed: &OracleRef) -> Result<PriceReport, OracleError>;
}

/// Freshness bound applied by the ledger to every report it consumes.
/// Disabled (`None`) unless a deployment opts in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StalenessPolicy {
    pub max_age_ms: Option<i64>,
}

impl StalenessPolicy {
    pub fn disabled() -> Self {
        Self { max_age_ms: None }
    }

    pub fn max_age_secs(secs: i64) -> Self {
        Self {
            max_age_ms: Some(secs.saturating_mul(1000)),
        }
    }

    pub fn check(
        &self,
        feed: &OracleRef,
        report: &PriceReport,
        now: Timestamp,
    ) -> Result<(), OracleError> {
        let Some(max_age_ms) = self.max_age_ms else {
            return Ok(());
        };
        let age_ms = report.updated_at.age_at(now);
        if age_ms > max_age_ms {
            return Err(OracleError::Stale {
                feed: feed.clone(),
                age_ms,
                max_age_ms,
            });
        }
        Ok(())
    }
}

/// In-memory oracle for tests and simulations
#[derive(Debug, Clone, Default)]
pub struct MockOracle {
    feeds: HashMap<OracleRef, PriceReport>,
    down: Vec<OracleRef>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, feed: OracleRef, price: i128, updated_at: Timestamp) -> Self {
        self.set_price(feed, price, updated_at);
        self
    }

    pub fn set_price(&mut self, feed: OracleRef, price: i128, updated_at: Timestamp) {
        self.down.retain(|f| f != &feed);
        self.feeds
            .insert(feed, PriceReport::new(Price::new(price), updated_at));
    }

    pub fn set_unavailable(&mut self, feed: &OracleRef) {
        if !self.down.contains(feed) {
            self.down.push(feed.clone());
        }
    }
}

impl PriceOracle for MockOracle {
    fn latest(&self, feed: &OracleRef) -> Result<PriceReport, OracleError> {
        if self.down.contains(feed) {
            return Err(OracleError::Unavailable(feed.clone()));
        }
        self.feeds
            .get(feed)
            .copied()
            .ok_or_else(|| OracleError::Unavailable(feed.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eth() -> OracleRef {
        OracleRef::new("ETH/USD")
    }

    #[test]
    fn mock_oracle_reports_latest() {
        let mut oracle = MockOracle::new().with_price(eth(), 2000, Timestamp::from_secs(1));
        assert_eq!(oracle.latest(&eth()).unwrap().price, Price::new(2000));

        oracle.set_price(eth(), 2100, Timestamp::from_secs(2));
        let report = oracle.latest(&eth()).unwrap();
        assert_eq!(report.price, Price::new(2100));
        assert_eq!(report.updated_at, Timestamp::from_secs(2));
    }

    #[test]
    fn unknown_and_down_feeds() {
        let mut oracle = MockOracle::new().with_price(eth(), 2000, Timestamp::from_secs(1));
        assert!(matches!(
            oracle.latest(&OracleRef::new("BTC/USD")),
            Err(OracleError::Unavailable(_))
        ));

        oracle.set_unavailable(&eth());
        assert!(matches!(oracle.latest(&eth()), Err(OracleError::Unavailable(_))));

        // a fresh answer brings the feed back
        oracle.set_price(eth(), 1900, Timestamp::from_secs(3));
        assert!(oracle.latest(&eth()).is_ok());
    }

    #[test]
    fn staleness_policy() {
        let report = PriceReport::new(Price::new(2000), Timestamp::from_secs(1000));

        let disabled = StalenessPolicy::disabled();
        assert!(disabled
            .check(&eth(), &report, Timestamp::from_secs(1_000_000))
            .is_ok());

        let policy = StalenessPolicy::max_age_secs(60);
        assert!(policy.check(&eth(), &report, Timestamp::from_secs(1060)).is_ok()); // exactly at bound
        assert!(matches!(
            policy.check(&eth(), &report, Timestamp::from_secs(1061)),
            Err(OracleError::Stale { .. })
        ));
    }
}
