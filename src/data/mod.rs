//! Recorded-data access
//!
//! The collection subsystem writes date-partitioned JSON-lines files, one
//! directory per source, one file per UTC calendar day:
//!
//! ```text
//! data/
//!   orderbook/2026-02-20.jsonl   per-level book rows
//!   weather/2026-02-20.jsonl     station observations
//!   markets/2026-02-20.jsonl     series → ticker definitions
//! ```
//!
//! This layout is a fixed contract; the engine only reads it.

mod store;

pub use store::{DataGap, DayStore};

use crate::events::Side;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// A typed row from one recorded source.
///
/// `validate` covers constraints serde cannot express; a violation is fatal
/// to timeline construction.
pub trait RecordedRow: DeserializeOwned {
    /// Subdirectory name under the data root
    const SOURCE: &'static str;

    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// One resting level of one market's book at one snapshot push
#[derive(Debug, Clone, Deserialize)]
pub struct OrderbookLevelRow {
    pub market_ticker: String,
    pub snapshot_time: DateTime<Utc>,
    pub side: Side,
    pub price_cents: u32,
    pub quantity: u32,
}

impl RecordedRow for OrderbookLevelRow {
    const SOURCE: &'static str = "orderbook";

    fn validate(&self) -> Result<(), String> {
        if !(1..=99).contains(&self.price_cents) {
            return Err(format!(
                "price_cents {} outside 1..=99 for {}",
                self.price_cents, self.market_ticker
            ));
        }
        Ok(())
    }
}

/// One station observation with both its sample time and the time the
/// feed delivered it
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherObservationRow {
    pub station: String,
    pub ob_time: DateTime<Utc>,
    pub received_time: DateTime<Utc>,
    pub value: f64,
}

impl RecordedRow for WeatherObservationRow {
    const SOURCE: &'static str = "weather";

    fn validate(&self) -> Result<(), String> {
        if !self.value.is_finite() {
            return Err(format!("non-finite value for station {}", self.station));
        }
        if self.station.is_empty() {
            return Err("empty station identifier".to_string());
        }
        Ok(())
    }
}

/// Ties a market ticker to the series it trades under
#[derive(Debug, Clone, Deserialize)]
pub struct MarketDefinitionRow {
    pub series: String,
    pub market_ticker: String,
}

impl RecordedRow for MarketDefinitionRow {
    const SOURCE: &'static str = "markets";

    fn validate(&self) -> Result<(), String> {
        if self.series.is_empty() || self.market_ticker.is_empty() {
            return Err("empty series or market_ticker".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orderbook_row_rejects_zero_price() {
        let row: OrderbookLevelRow = serde_json::from_str(
            r#"{"market_ticker":"T","snapshot_time":"2026-02-20T10:01:00Z","side":"yes","price_cents":0,"quantity":5}"#,
        )
        .unwrap();
        assert!(row.validate().is_err());
    }

    #[test]
    fn test_orderbook_row_rejects_price_above_99() {
        let row: OrderbookLevelRow = serde_json::from_str(
            r#"{"market_ticker":"T","snapshot_time":"2026-02-20T10:01:00Z","side":"no","price_cents":100,"quantity":5}"#,
        )
        .unwrap();
        assert!(row.validate().is_err());
    }

    #[test]
    fn test_orderbook_row_accepts_valid() {
        let row: OrderbookLevelRow = serde_json::from_str(
            r#"{"market_ticker":"T","snapshot_time":"2026-02-20T10:01:00Z","side":"yes","price_cents":55,"quantity":5}"#,
        )
        .unwrap();
        assert!(row.validate().is_ok());
        assert_eq!(row.side, Side::Yes);
    }

    #[test]
    fn test_weather_row_rejects_nan() {
        let row = WeatherObservationRow {
            station: "KMDW".to_string(),
            ob_time: Utc::now(),
            received_time: Utc::now(),
            value: f64::NAN,
        };
        assert!(row.validate().is_err());
    }

    #[test]
    fn test_negative_quantity_fails_deserialization() {
        let parsed: Result<OrderbookLevelRow, _> = serde_json::from_str(
            r#"{"market_ticker":"T","snapshot_time":"2026-02-20T10:01:00Z","side":"yes","price_cents":10,"quantity":-3}"#,
        );
        assert!(parsed.is_err());
    }
}
