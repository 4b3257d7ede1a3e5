//! Strategy boundary
//!
//! Trading logic is an external collaborator of the engine: a strategy is
//! any `bus::EventHandler` registered for the three data event kinds that
//! may publish `OrderIntent`s from inside its handler. On a new
//! `MarketDiscovery` for its series a strategy is expected to discard the
//! prior day's accumulated state; the timeline's discovery-first ordering
//! is what makes that reset deterministic.
//!
//! One small reference strategy ships here so the CLI can exercise the
//! full pipeline end to end.

use crate::bus::{EventBus, EventHandler, SharedHandler};
use crate::config::StrategyConfig;
use crate::error::{BacktestError, Result};
use crate::events::{Event, OrderIntent, Side};
use crate::timeline::ReplayClock;
use std::cell::RefCell;
use std::rc::Rc;

/// Buys every ticker of its series once the monitored station reports N
/// consecutive observations at or above the trigger value, at most once
/// per day.
pub struct ThresholdStrategy {
    id: String,
    series: String,
    station: String,
    trigger_value: f64,
    consecutive_obs: u32,
    side: Side,
    max_price_cents: u32,
    max_spend_cents: u32,
    quantity: u32,
    clock: ReplayClock,

    // Per-day state, reset on every discovery for the series
    tickers: Vec<String>,
    streak: u32,
    fired: bool,
}

impl ThresholdStrategy {
    pub fn from_config(cfg: &StrategyConfig, clock: ReplayClock) -> Self {
        Self {
            id: cfg.id.clone(),
            series: cfg.series.clone(),
            station: cfg.station.clone(),
            trigger_value: cfg.trigger_value,
            consecutive_obs: cfg.consecutive_obs,
            side: cfg.side,
            max_price_cents: cfg.max_price_cents,
            max_spend_cents: cfg.max_spend_cents,
            quantity: cfg.quantity,
            clock,
            tickers: Vec::new(),
            streak: 0,
            fired: false,
        }
    }
}

impl EventHandler for ThresholdStrategy {
    fn on_event(&mut self, event: &Event, bus: &EventBus) -> anyhow::Result<()> {
        match event {
            Event::MarketDiscovery(e) => {
                if e.series != self.series {
                    return Ok(());
                }
                // New event day: yesterday's observations are irrelevant
                self.tickers = e.tickers.clone();
                self.streak = 0;
                self.fired = false;
                tracing::info!(
                    strategy = %self.id,
                    series = %self.series,
                    day = %e.day,
                    tickers = self.tickers.len(),
                    "tracking new day"
                );
            }
            Event::OrderbookSnapshot(_) => {}
            Event::WeatherObservation(obs) => {
                if obs.station != self.station {
                    return Ok(());
                }
                if obs.value >= self.trigger_value {
                    self.streak += 1;
                } else {
                    self.streak = 0;
                }
                if self.fired || self.streak < self.consecutive_obs {
                    return Ok(());
                }

                self.fired = true;
                let issued_at = self.clock.now().unwrap_or(obs.received_time);
                tracing::info!(
                    strategy = %self.id,
                    station = %self.station,
                    value = obs.value,
                    streak = self.streak,
                    "trigger reached, emitting intents"
                );
                for ticker in self.tickers.clone() {
                    bus.publish(&Event::OrderIntent(OrderIntent {
                        market_ticker: ticker,
                        side: self.side,
                        max_price_cents: self.max_price_cents,
                        max_spend_cents: self.max_spend_cents,
                        desired_quantity: self.quantity,
                        strategy_id: self.id.clone(),
                        issued_at,
                    }))?;
                }
            }
            Event::OrderIntent(_) => {}
        }
        Ok(())
    }
}

/// Instantiate the strategies named in the configuration.
///
/// Unknown `kind` values are configuration errors, rejected before the run
/// starts.
pub fn build(configs: &[StrategyConfig], clock: &ReplayClock) -> Result<Vec<SharedHandler>> {
    let mut handlers: Vec<SharedHandler> = Vec::with_capacity(configs.len());
    for cfg in configs {
        match cfg.kind.as_str() {
            "threshold" => {
                tracing::info!(
                    id = %cfg.id,
                    series = %cfg.series,
                    station = %cfg.station,
                    trigger = cfg.trigger_value,
                    "loaded threshold strategy"
                );
                handlers.push(Rc::new(RefCell::new(ThresholdStrategy::from_config(
                    cfg,
                    clock.clone(),
                ))));
            }
            other => {
                return Err(BacktestError::Config(format!(
                    "unknown strategy kind `{other}` for `{}`",
                    cfg.id
                )))
            }
        }
    }
    Ok(handlers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MarketDiscoveryEvent, WeatherObservationEvent};
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    fn t(sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 20, 12, 0, 0).unwrap() + chrono::Duration::seconds(sec as i64)
    }

    fn cfg() -> StrategyConfig {
        StrategyConfig {
            id: "chi-43".to_string(),
            kind: "threshold".to_string(),
            series: "KXHIGHCHI".to_string(),
            station: "KMDW".to_string(),
            trigger_value: 43.0,
            consecutive_obs: 2,
            side: Side::No,
            max_price_cents: 95,
            max_spend_cents: 0,
            quantity: 10,
        }
    }

    fn discovery(day: u32, tickers: &[&str]) -> Event {
        Event::MarketDiscovery(MarketDiscoveryEvent {
            series: "KXHIGHCHI".to_string(),
            day: NaiveDate::from_ymd_opt(2026, 2, day).unwrap(),
            tickers: tickers.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn observation(station: &str, value: f64, sec: u32) -> Event {
        Event::WeatherObservation(WeatherObservationEvent {
            station: station.to_string(),
            ob_time: t(sec),
            received_time: t(sec),
            value,
        })
    }

    /// Captures intents published back on the bus
    struct IntentLog(Rc<RefCell<Vec<OrderIntent>>>);

    impl EventHandler for IntentLog {
        fn on_event(&mut self, event: &Event, _bus: &EventBus) -> anyhow::Result<()> {
            if let Event::OrderIntent(intent) = event {
                self.0.borrow_mut().push(intent.clone());
            }
            Ok(())
        }
    }

    fn rig() -> (ThresholdStrategy, EventBus, Rc<RefCell<Vec<OrderIntent>>>) {
        let strategy = ThresholdStrategy::from_config(&cfg(), ReplayClock::new());
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.subscribe(
            crate::events::EventKind::OrderIntent,
            Rc::new(RefCell::new(IntentLog(log.clone()))),
        );
        (strategy, bus, log)
    }

    #[test]
    fn test_fires_after_consecutive_observations() {
        let (mut s, bus, log) = rig();
        s.on_event(&discovery(20, &["A", "B"]), &bus).unwrap();
        s.on_event(&observation("KMDW", 43.5, 0), &bus).unwrap();
        assert!(log.borrow().is_empty());
        s.on_event(&observation("KMDW", 44.0, 60), &bus).unwrap();

        let intents = log.borrow();
        assert_eq!(intents.len(), 2);
        assert_eq!(intents[0].market_ticker, "A");
        assert_eq!(intents[1].market_ticker, "B");
        assert_eq!(intents[0].strategy_id, "chi-43");
    }

    #[test]
    fn test_streak_resets_on_cold_observation() {
        let (mut s, bus, log) = rig();
        s.on_event(&discovery(20, &["A"]), &bus).unwrap();
        s.on_event(&observation("KMDW", 43.5, 0), &bus).unwrap();
        s.on_event(&observation("KMDW", 41.0, 60), &bus).unwrap();
        s.on_event(&observation("KMDW", 43.5, 120), &bus).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_fires_at_most_once_per_day() {
        let (mut s, bus, log) = rig();
        s.on_event(&discovery(20, &["A"]), &bus).unwrap();
        for sec in [0, 60, 120, 180] {
            s.on_event(&observation("KMDW", 44.0, sec), &bus).unwrap();
        }
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_discovery_resets_for_new_day() {
        let (mut s, bus, log) = rig();
        s.on_event(&discovery(20, &["A"]), &bus).unwrap();
        s.on_event(&observation("KMDW", 44.0, 0), &bus).unwrap();
        s.on_event(&observation("KMDW", 44.0, 60), &bus).unwrap();
        assert_eq!(log.borrow().len(), 1);

        s.on_event(&discovery(21, &["C"]), &bus).unwrap();
        s.on_event(&observation("KMDW", 44.0, 120), &bus).unwrap();
        s.on_event(&observation("KMDW", 44.0, 180), &bus).unwrap();

        let intents = log.borrow();
        assert_eq!(intents.len(), 2);
        assert_eq!(intents[1].market_ticker, "C");
    }

    #[test]
    fn test_ignores_other_stations_and_series() {
        let (mut s, bus, log) = rig();
        s.on_event(&discovery(20, &["A"]), &bus).unwrap();
        s.on_event(&observation("KNYC", 50.0, 0), &bus).unwrap();
        s.on_event(&observation("KNYC", 50.0, 60), &bus).unwrap();
        assert!(log.borrow().is_empty());

        let other = Event::MarketDiscovery(MarketDiscoveryEvent {
            series: "KXHIGHNY".to_string(),
            day: NaiveDate::from_ymd_opt(2026, 2, 20).unwrap(),
            tickers: vec!["X".to_string()],
        });
        s.on_event(&other, &bus).unwrap();
        assert_eq!(s.tickers, vec!["A"]);
    }

    #[test]
    fn test_build_rejects_unknown_kind() {
        let mut bad = cfg();
        bad.kind = "martingale".to_string();
        let err = match build(&[bad], &ReplayClock::new()) {
            Ok(_) => panic!("expected build to fail"),
            Err(e) => e,
        };
        assert!(matches!(err, BacktestError::Config(_)));
    }

    #[test]
    fn test_build_threshold() {
        let handlers = build(&[cfg()], &ReplayClock::new()).unwrap();
        assert_eq!(handlers.len(), 1);
    }
}
