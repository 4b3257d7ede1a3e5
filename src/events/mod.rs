//! Event model for the replay engine
//!
//! A closed set of event variants replaces the dynamic event records the
//! live bot passes around: adding a new kind is a compile-time-checked
//! change at every dispatch and registration site.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contract side of a binary market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Yes => "yes",
            Side::No => "no",
        }
    }

    /// The side whose resting orders a buy on this side consumes
    pub fn opposing(&self) -> Side {
        match self {
            Side::Yes => Side::No,
            Side::No => Side::Yes,
        }
    }
}

/// Per-side resting depth: price in cents → contract quantity.
///
/// BTreeMap keeps levels in price order so iteration is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Depth {
    pub yes: BTreeMap<u32, u32>,
    pub no: BTreeMap<u32, u32>,
}

impl Depth {
    pub fn side(&self, side: Side) -> &BTreeMap<u32, u32> {
        match side {
            Side::Yes => &self.yes,
            Side::No => &self.no,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut BTreeMap<u32, u32> {
        match side {
            Side::Yes => &mut self.yes,
            Side::No => &mut self.no,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.yes.is_empty() && self.no.is_empty()
    }
}

/// Start-of-day marker for a series: announces the day's market tickers
/// before any data for that series flows.
///
/// Always synthesized by the timeline composer, never read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketDiscoveryEvent {
    pub series: String,
    pub day: NaiveDate,
    pub tickers: Vec<String>,
}

/// A complete replacement of one market's book state.
///
/// Snapshots fully supersede all prior depth knowledge for the market;
/// there is no incremental merge inside the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderbookSnapshotEvent {
    pub market_ticker: String,
    pub snapshot_time: DateTime<Utc>,
    pub depth: Depth,
}

/// One weather observation, carrying both the physical sample time and the
/// time it became knowable to the live system.
///
/// `ob_time` is for domain window filtering only; sequencing uses the
/// timeline order key, never `ob_time`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherObservationEvent {
    pub station: String,
    pub ob_time: DateTime<Utc>,
    pub received_time: DateTime<Utc>,
    pub value: f64,
}

/// Order request emitted by a strategy handler in direct response to a
/// dispatched event; always causally downstream of some timeline event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIntent {
    pub market_ticker: String,
    pub side: Side,
    pub max_price_cents: u32,
    /// Spend cap in cents for this intent's sweep; 0 means uncapped.
    pub max_spend_cents: u32,
    pub desired_quantity: u32,
    pub strategy_id: String,
    pub issued_at: DateTime<Utc>,
}

/// Everything the bus can dispatch.
///
/// The first three variants are materialized by the timeline composer;
/// `OrderIntent` is only ever published from inside a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    MarketDiscovery(MarketDiscoveryEvent),
    OrderbookSnapshot(OrderbookSnapshotEvent),
    WeatherObservation(WeatherObservationEvent),
    OrderIntent(OrderIntent),
}

/// Discriminant used for handler registration and dispatch routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MarketDiscovery,
    OrderbookSnapshot,
    WeatherObservation,
    OrderIntent,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::MarketDiscovery,
        EventKind::OrderbookSnapshot,
        EventKind::WeatherObservation,
        EventKind::OrderIntent,
    ];
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::MarketDiscovery(_) => EventKind::MarketDiscovery,
            Event::OrderbookSnapshot(_) => EventKind::OrderbookSnapshot,
            Event::WeatherObservation(_) => EventKind::WeatherObservation,
            Event::OrderIntent(_) => EventKind::OrderIntent,
        }
    }
}
