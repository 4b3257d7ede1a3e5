//! Replay driver
//!
//! Walks the composed timeline strictly forward, publishing each event on
//! the bus, then finalizes the aggregator into a `BacktestResult`. The
//! driver never rewinds and never inspects events beyond the current one.

use crate::bus::{EventBus, SharedHandler};
use crate::data::DayStore;
use crate::error::{BacktestError, Result};
use crate::events::EventKind;
use crate::execution::ExecutionSimulator;
use crate::results::{BacktestResult, ResultAggregator, RunMeta};
use crate::timeline::{LatencyModel, ReplayClock, Timeline, TimelineComposer};
use chrono::NaiveDate;
use std::cell::RefCell;
use std::rc::Rc;

/// Selection parameters for one run
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub series_filter: Option<Vec<String>>,
    pub latency_model: LatencyModel,
}

impl RunSpec {
    pub fn validate(&self) -> Result<()> {
        if self.start_date > self.end_date {
            return Err(BacktestError::Config(format!(
                "start date {} after end date {}",
                self.start_date, self.end_date
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Finalized,
}

/// Owns one run's object graph: timeline, bus, execution simulator, and
/// fill aggregator. Nothing is shared across driver instances, so parallel
/// parameter sweeps are just independently constructed drivers.
pub struct ReplayDriver {
    spec: RunSpec,
    timeline: Timeline,
    bus: EventBus,
    aggregator: Rc<RefCell<ResultAggregator>>,
    clock: ReplayClock,
    state: RunState,
}

impl ReplayDriver {
    /// Wire a driver around an already-composed timeline. The execution
    /// simulator is registered before any strategy, so book state is always
    /// current when a strategy handler fires for the same event.
    pub fn new(spec: RunSpec, timeline: Timeline) -> Self {
        let bus = EventBus::new();
        let aggregator = Rc::new(RefCell::new(ResultAggregator::new()));
        let clock = ReplayClock::new();

        let simulator = Rc::new(RefCell::new(ExecutionSimulator::new(
            aggregator.clone(),
            clock.clone(),
        )));
        bus.subscribe(EventKind::MarketDiscovery, simulator.clone());
        bus.subscribe(EventKind::OrderbookSnapshot, simulator.clone());
        bus.subscribe(EventKind::OrderIntent, simulator);

        Self {
            spec,
            timeline,
            bus,
            aggregator,
            clock,
            state: RunState::Idle,
        }
    }

    /// Clock tracking the order key of the event being dispatched; give a
    /// clone to strategies that stamp their intents.
    pub fn clock(&self) -> ReplayClock {
        self.clock.clone()
    }

    /// Compose the timeline from recorded data and wire a driver around it
    pub fn from_store(store: DayStore, spec: RunSpec) -> Result<Self> {
        spec.validate()?;
        let timeline = TimelineComposer::new(
            store,
            spec.start_date,
            spec.end_date,
            spec.series_filter.clone(),
            spec.latency_model,
        )
        .compose()?;
        Ok(Self::new(spec, timeline))
    }

    /// Subscribe a strategy to the three data event kinds. Strategies
    /// publish intents back through the bus; they never see each other.
    pub fn register_strategy(&self, handler: SharedHandler) {
        self.bus.subscribe(EventKind::MarketDiscovery, handler.clone());
        self.bus.subscribe(EventKind::OrderbookSnapshot, handler.clone());
        self.bus.subscribe(EventKind::WeatherObservation, handler);
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Replay the timeline to completion.
    ///
    /// Fatal conditions (handler faults) unwind here and abort the run; no
    /// partial result is returned. A driver runs exactly once.
    pub fn run(&mut self) -> Result<BacktestResult> {
        if self.state != RunState::Idle {
            return Err(BacktestError::Config(
                "replay driver has already run".to_string(),
            ));
        }
        self.state = RunState::Running;

        let total = self.timeline.len();
        tracing::info!(
            events = total,
            start = %self.spec.start_date,
            end = %self.spec.end_date,
            latency = %self.spec.latency_model,
            "backtest start"
        );

        let progress_step = (total / 10).max(1);
        for (i, sim_event) in self.timeline.events.iter().enumerate() {
            self.clock.advance(sim_event.order_key);
            self.bus.publish(&sim_event.event)?;

            if (i + 1) % progress_step == 0 {
                tracing::info!(
                    pct = 100 * (i + 1) / total,
                    processed = i + 1,
                    total,
                    fills = self.aggregator.borrow().len(),
                    "replay progress"
                );
            }
        }

        self.state = RunState::Finalized;
        tracing::info!(
            discovery = self.timeline.count(EventKind::MarketDiscovery),
            snapshots = self.timeline.count(EventKind::OrderbookSnapshot),
            observations = self.timeline.count(EventKind::WeatherObservation),
            fills = self.aggregator.borrow().len(),
            "backtest complete"
        );

        let aggregator = std::mem::take(&mut *self.aggregator.borrow_mut());
        let result = aggregator.finalize(RunMeta {
            start_date: self.spec.start_date,
            end_date: self.spec.end_date,
            latency_model: self.spec.latency_model,
            timeline_length: total,
            gaps: self.timeline.gaps.clone(),
        });
        result.log_summary();
        Ok(result)
    }
}
