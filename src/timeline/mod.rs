//! Composed replay timeline
//!
//! One strictly ordered sequence of events merged from every recorded
//! source. The order key is the timestamp an event would have become
//! knowable to the live bot, which is distinct from any domain timestamp
//! the event itself carries.

mod composer;

pub use composer::TimelineComposer;

use crate::data::DataGap;
use crate::error::BacktestError;
use crate::events::{Event, EventKind};
use chrono::{DateTime, Utc};
use std::cell::Cell;
use std::rc::Rc;
use std::str::FromStr;

/// Shared view of the replay's current position.
///
/// The driver advances it to each event's order key before dispatching, so
/// subscribers can stamp intents and fills with the time the triggering
/// event became knowable — which under a synthetic latency model is not any
/// timestamp the event payload carries.
#[derive(Debug, Clone, Default)]
pub struct ReplayClock(Rc<Cell<Option<DateTime<Utc>>>>);

impl ReplayClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, to: DateTime<Utc>) {
        self.0.set(Some(to));
    }

    /// Order key of the event currently being dispatched; `None` before the
    /// first dispatch.
    pub fn now(&self) -> Option<DateTime<Utc>> {
        self.0.get()
    }
}

/// How weather-observation order keys are derived.
///
/// Only weather is affected: the observation feed is delayed separately
/// from the market feed, so snapshot order keys always use the recorded
/// push time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyModel {
    /// Order key = recorded `received_time`; fully realistic, the default.
    Actual,
    /// Order key = `ob_time` + N seconds. A sensitivity-analysis mode: N is
    /// deliberately unconstrained, so an observation may be "known" earlier
    /// than is physically plausible end-to-end. Opt-in only.
    Fixed(u32),
}

impl Default for LatencyModel {
    fn default() -> Self {
        LatencyModel::Actual
    }
}

impl FromStr for LatencyModel {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "actual" {
            return Ok(LatencyModel::Actual);
        }
        if let Some(n) = s.strip_prefix("fixed_") {
            return n
                .parse::<u32>()
                .map(LatencyModel::Fixed)
                .map_err(|_| BacktestError::Config(format!("bad latency model `{s}`")));
        }
        Err(BacktestError::Config(format!(
            "unknown latency model `{s}` (expected `actual` or `fixed_N`)"
        )))
    }
}

impl std::fmt::Display for LatencyModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LatencyModel::Actual => write!(f, "actual"),
            LatencyModel::Fixed(n) => write!(f, "fixed_{n}"),
        }
    }
}

/// One atom of the composed timeline
#[derive(Debug, Clone, PartialEq)]
pub struct SimEvent {
    /// Sequencing timestamp; never a domain timestamp
    pub order_key: DateTime<Utc>,
    /// Per-source load sequence number; final tiebreak
    pub seq: u64,
    pub event: Event,
}

impl SimEvent {
    /// Discovery sorts before same-timestamp data events so a day's ladder
    /// exists before any data for that day is dispatched.
    fn type_priority(&self) -> u8 {
        match self.event.kind() {
            EventKind::MarketDiscovery => 0,
            EventKind::OrderbookSnapshot => 1,
            EventKind::WeatherObservation => 2,
            EventKind::OrderIntent => 3,
        }
    }

    fn label(&self) -> &str {
        match &self.event {
            Event::MarketDiscovery(e) => &e.series,
            Event::OrderbookSnapshot(e) => &e.market_ticker,
            Event::WeatherObservation(e) => &e.station,
            Event::OrderIntent(e) => &e.market_ticker,
        }
    }

    /// Total order: identical inputs always merge to an identical sequence
    /// regardless of source iteration order.
    pub fn sort_key(&self) -> (DateTime<Utc>, u8, &str, u64) {
        (self.order_key, self.type_priority(), self.label(), self.seq)
    }
}

/// Output of the composer: the merged event sequence plus the gaps noticed
/// while loading it.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    pub events: Vec<SimEvent>,
    pub gaps: Vec<DataGap>,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.event.kind() == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MarketDiscoveryEvent, OrderbookSnapshotEvent, WeatherObservationEvent};
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn test_latency_model_parse_actual() {
        assert_eq!("actual".parse::<LatencyModel>().unwrap(), LatencyModel::Actual);
    }

    #[test]
    fn test_latency_model_parse_fixed() {
        assert_eq!(
            "fixed_180".parse::<LatencyModel>().unwrap(),
            LatencyModel::Fixed(180)
        );
        assert_eq!("fixed_0".parse::<LatencyModel>().unwrap(), LatencyModel::Fixed(0));
    }

    #[test]
    fn test_latency_model_parse_rejects_unknown() {
        assert!("realtime".parse::<LatencyModel>().is_err());
        assert!("fixed_".parse::<LatencyModel>().is_err());
        assert!("fixed_-5".parse::<LatencyModel>().is_err());
    }

    #[test]
    fn test_latency_model_display_round_trips() {
        for s in ["actual", "fixed_30"] {
            assert_eq!(s.parse::<LatencyModel>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_discovery_sorts_before_same_timestamp_data() {
        let t = Utc.with_ymd_and_hms(2026, 2, 20, 9, 0, 0).unwrap();
        let disc = SimEvent {
            order_key: t,
            seq: 5,
            event: Event::MarketDiscovery(MarketDiscoveryEvent {
                series: "KXHIGHCHI".to_string(),
                day: NaiveDate::from_ymd_opt(2026, 2, 20).unwrap(),
                tickers: vec![],
            }),
        };
        let snap = SimEvent {
            order_key: t,
            seq: 0,
            event: Event::OrderbookSnapshot(OrderbookSnapshotEvent {
                market_ticker: "AAA".to_string(),
                snapshot_time: t,
                depth: Default::default(),
            }),
        };
        let obs = SimEvent {
            order_key: t,
            seq: 0,
            event: Event::WeatherObservation(WeatherObservationEvent {
                station: "AAA".to_string(),
                ob_time: t,
                received_time: t,
                value: 40.0,
            }),
        };
        assert!(disc.sort_key() < snap.sort_key());
        assert!(snap.sort_key() < obs.sort_key());
    }
}
