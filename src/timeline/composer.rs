//! Multi-source timeline merge

use super::{LatencyModel, SimEvent, Timeline};
use crate::data::{
    DataGap, DayStore, MarketDefinitionRow, OrderbookLevelRow, RecordedRow, WeatherObservationRow,
};
use crate::error::Result;
use crate::events::{Depth, Event, MarketDiscoveryEvent, OrderbookSnapshotEvent, WeatherObservationEvent};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Merges per-day, per-source recordings into one ordered event sequence.
///
/// Discovery events are synthesized here rather than read from storage:
/// in production the market registry refresh runs before the feeds start,
/// so each (series, day) discovery gets an order key one microsecond below
/// the earliest data event of that day.
pub struct TimelineComposer {
    store: DayStore,
    start_date: NaiveDate,
    end_date: NaiveDate,
    series_filter: Option<Vec<String>>,
    latency_model: LatencyModel,
}

impl TimelineComposer {
    pub fn new(
        store: DayStore,
        start_date: NaiveDate,
        end_date: NaiveDate,
        series_filter: Option<Vec<String>>,
        latency_model: LatencyModel,
    ) -> Self {
        Self {
            store,
            start_date,
            end_date,
            series_filter,
            latency_model,
        }
    }

    fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |d| *d <= self.end_date)
    }

    fn ticker_in_scope(&self, market_ticker: &str) -> bool {
        match &self.series_filter {
            None => true,
            Some(series) => series.iter().any(|s| market_ticker.starts_with(s.as_str())),
        }
    }

    fn series_in_scope(&self, series: &str) -> bool {
        match &self.series_filter {
            None => true,
            Some(filter) => filter.iter().any(|s| s == series),
        }
    }

    /// Load one source across the date range, recording gaps for missing
    /// day-files.
    fn load_source<R: RecordedRow>(&self, gaps: &mut Vec<DataGap>) -> Result<Vec<R>> {
        let mut rows = Vec::new();
        for day in self.days() {
            match self.store.read_day::<R>(day)? {
                Some(mut day_rows) => rows.append(&mut day_rows),
                None => {
                    tracing::warn!(source = R::SOURCE, %day, "missing day-file, skipping");
                    gaps.push(DataGap {
                        source: R::SOURCE.to_string(),
                        day,
                    });
                }
            }
        }
        Ok(rows)
    }

    fn weather_events(&self, rows: Vec<WeatherObservationRow>, seq: &mut u64) -> Vec<SimEvent> {
        rows.into_iter()
            .map(|row| {
                let order_key = match self.latency_model {
                    LatencyModel::Actual => row.received_time,
                    LatencyModel::Fixed(n) => row.ob_time + Duration::seconds(i64::from(n)),
                };
                let ev = SimEvent {
                    order_key,
                    seq: *seq,
                    event: Event::WeatherObservation(WeatherObservationEvent {
                        station: row.station,
                        ob_time: row.ob_time,
                        received_time: row.received_time,
                        value: row.value,
                    }),
                };
                *seq += 1;
                ev
            })
            .collect()
    }

    /// Group per-level rows into one full-replacement snapshot event per
    /// (push time, market). BTreeMap keying makes the grouping order
    /// independent of row order within the files.
    fn snapshot_events(&self, rows: Vec<OrderbookLevelRow>, seq: &mut u64) -> Vec<SimEvent> {
        let mut grouped: BTreeMap<(DateTime<Utc>, String), Depth> = BTreeMap::new();
        for row in rows {
            if !self.ticker_in_scope(&row.market_ticker) {
                continue;
            }
            let depth = grouped
                .entry((row.snapshot_time, row.market_ticker))
                .or_default();
            depth.side_mut(row.side).insert(row.price_cents, row.quantity);
        }

        grouped
            .into_iter()
            .map(|((snapshot_time, market_ticker), depth)| {
                let ev = SimEvent {
                    order_key: snapshot_time,
                    seq: *seq,
                    event: Event::OrderbookSnapshot(OrderbookSnapshotEvent {
                        market_ticker,
                        snapshot_time,
                        depth,
                    }),
                };
                *seq += 1;
                ev
            })
            .collect()
    }

    /// Synthesize one discovery per (series, day) at min(day's data order
    /// keys) − 1 µs. Days with definitions but no data produce nothing:
    /// there is no anchor to sequence against and nothing to trade.
    fn discovery_events(
        &self,
        defs_by_day: &BTreeMap<NaiveDate, Vec<MarketDefinitionRow>>,
        data_events: &[SimEvent],
        seq: &mut u64,
    ) -> Vec<SimEvent> {
        let mut earliest_by_day: BTreeMap<NaiveDate, DateTime<Utc>> = BTreeMap::new();
        for ev in data_events {
            let day = ev.order_key.date_naive();
            earliest_by_day
                .entry(day)
                .and_modify(|t| {
                    if ev.order_key < *t {
                        *t = ev.order_key;
                    }
                })
                .or_insert(ev.order_key);
        }

        let mut out = Vec::new();
        for (day, defs) in defs_by_day {
            let Some(&day_min) = earliest_by_day.get(day) else {
                tracing::debug!(%day, "market definitions but no data events, no discovery");
                continue;
            };
            let order_key = day_min - Duration::microseconds(1);

            let mut tickers_by_series: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
            for def in defs {
                if !self.series_in_scope(&def.series) {
                    continue;
                }
                tickers_by_series
                    .entry(def.series.as_str())
                    .or_default()
                    .push(def.market_ticker.as_str());
            }

            for (series, mut tickers) in tickers_by_series {
                tickers.sort_unstable();
                tickers.dedup();
                out.push(SimEvent {
                    order_key,
                    seq: *seq,
                    event: Event::MarketDiscovery(MarketDiscoveryEvent {
                        series: series.to_string(),
                        day: *day,
                        tickers: tickers.into_iter().map(String::from).collect(),
                    }),
                });
                *seq += 1;
            }
        }
        out
    }

    /// Build the merged timeline for the configured date range.
    pub fn compose(&self) -> Result<Timeline> {
        let mut gaps = Vec::new();
        let mut seq = 0u64;

        let weather_rows = self.load_source::<WeatherObservationRow>(&mut gaps)?;
        let level_rows = self.load_source::<OrderbookLevelRow>(&mut gaps)?;

        let mut defs_by_day: BTreeMap<NaiveDate, Vec<MarketDefinitionRow>> = BTreeMap::new();
        for day in self.days() {
            match self.store.read_day::<MarketDefinitionRow>(day)? {
                Some(rows) => {
                    defs_by_day.insert(day, rows);
                }
                None => {
                    tracing::warn!(source = MarketDefinitionRow::SOURCE, %day, "missing day-file, skipping");
                    gaps.push(DataGap {
                        source: MarketDefinitionRow::SOURCE.to_string(),
                        day,
                    });
                }
            }
        }

        let mut events = self.snapshot_events(level_rows, &mut seq);
        events.extend(self.weather_events(weather_rows, &mut seq));

        let discovery = self.discovery_events(&defs_by_day, &events, &mut seq);
        events.extend(discovery);

        events.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        tracing::info!(
            events = events.len(),
            gaps = gaps.len(),
            start = %self.start_date,
            end = %self.end_date,
            latency = %self.latency_model,
            "timeline composed"
        );

        Ok(Timeline { events, gaps })
    }
}
