//! Fill accumulation and run reporting

use crate::data::DataGap;
use crate::execution::Fill;
use crate::timeline::LatencyModel;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;

/// Run-level metadata attached to the result at finalization
#[derive(Debug, Clone)]
pub struct RunMeta {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub latency_model: LatencyModel,
    pub timeline_length: usize,
    pub gaps: Vec<DataGap>,
}

/// Accumulates fills in dispatch order during a run.
///
/// Consumed by `finalize`; after that only the read-only `BacktestResult`
/// exists.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    fills: Vec<Fill>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, fill: Fill) {
        self.fills.push(fill);
    }

    pub fn len(&self) -> usize {
        self.fills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }

    pub fn finalize(self, meta: RunMeta) -> BacktestResult {
        BacktestResult {
            fills: self.fills,
            meta,
        }
    }
}

/// Immutable outcome of one replay run
#[derive(Debug, Clone)]
pub struct BacktestResult {
    fills: Vec<Fill>,
    meta: RunMeta,
}

impl BacktestResult {
    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn n_fills(&self) -> usize {
        self.fills.len()
    }

    pub fn total_contracts(&self) -> u64 {
        self.fills.iter().map(|f| u64::from(f.quantity)).sum()
    }

    pub fn total_cost_cents(&self) -> u64 {
        self.fills.iter().map(|f| f.cost_cents).sum()
    }

    pub fn meta(&self) -> &RunMeta {
        &self.meta
    }

    /// Fills grouped by strategy, in deterministic key order
    pub fn fills_by_strategy(&self) -> BTreeMap<&str, Vec<&Fill>> {
        let mut out: BTreeMap<&str, Vec<&Fill>> = BTreeMap::new();
        for f in &self.fills {
            out.entry(f.strategy_id.as_str()).or_default().push(f);
        }
        out
    }

    /// Fills grouped by the UTC calendar day they executed on
    pub fn fills_by_day(&self) -> BTreeMap<NaiveDate, Vec<&Fill>> {
        let mut out: BTreeMap<NaiveDate, Vec<&Fill>> = BTreeMap::new();
        for f in &self.fills {
            out.entry(f.timestamp.date_naive()).or_default().push(f);
        }
        out
    }

    /// Export fills in dispatch order.
    ///
    /// Columns: timestamp, market_ticker, side, price_cents, quantity,
    /// cost_cents, strategy_id. `side` is part of the contract: without it
    /// a fill row cannot be settled against the market outcome downstream.
    pub fn write_csv(&self, path: &Path) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for fill in &self.fills {
            writer.serialize(fill)?;
        }
        writer.flush()?;
        tracing::info!(fills = self.fills.len(), path = %path.display(), "exported fills");
        Ok(())
    }

    /// Human-readable summary for CLI output
    pub fn format_table(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            r#"
══════════════════════════════════════════════════════
               BACKTEST RESULTS
══════════════════════════════════════════════════════
Date range:       {} → {}
Latency model:    {}
Timeline events:  {}
Data gaps:        {}

Fills:            {}
Contracts:        {}
Total cost:       ${:.2}
"#,
            self.meta.start_date,
            self.meta.end_date,
            self.meta.latency_model,
            self.meta.timeline_length,
            self.meta.gaps.len(),
            self.n_fills(),
            self.total_contracts(),
            self.total_cost_cents() as f64 / 100.0,
        ));

        let by_strategy = self.fills_by_strategy();
        if !by_strategy.is_empty() {
            out.push_str("\nBY STRATEGY\n───────────────────────────────────────────────────────\n");
            for (sid, fills) in &by_strategy {
                let contracts: u64 = fills.iter().map(|f| u64::from(f.quantity)).sum();
                let cost: u64 = fills.iter().map(|f| f.cost_cents).sum();
                out.push_str(&format!(
                    "{:<28} {:>4} fills {:>6} contracts  ${:.2}\n",
                    sid,
                    fills.len(),
                    contracts,
                    cost as f64 / 100.0,
                ));
            }
        }

        if !self.meta.gaps.is_empty() {
            out.push_str("\nDATA GAPS (skipped)\n───────────────────────────────────────────────────────\n");
            for gap in &self.meta.gaps {
                out.push_str(&format!("{gap}\n"));
            }
        }

        out.push_str("══════════════════════════════════════════════════════\n");
        out
    }

    pub fn log_summary(&self) {
        tracing::info!(
            fills = self.n_fills(),
            contracts = self.total_contracts(),
            total_cost_cents = self.total_cost_cents(),
            gaps = self.meta.gaps.len(),
            "backtest summary"
        );
        for (sid, fills) in self.fills_by_strategy() {
            let cost: u64 = fills.iter().map(|f| f.cost_cents).sum();
            tracing::info!(strategy = sid, fills = fills.len(), cost_cents = cost, "strategy total");
        }
    }
}
