//! Liquidity-sweep execution simulator

use super::{available_levels, Fill};
use crate::bus::{EventBus, EventHandler};
use crate::events::{Depth, Event, OrderIntent};
use crate::results::ResultAggregator;
use crate::timeline::ReplayClock;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Consumes order intents against per-market depth tables.
///
/// Depth only ever changes through dispatched snapshot events, each a
/// wholesale replacement of the market's book. An intent therefore sees
/// exactly the book state as of its own position in the dispatch order —
/// the no-look-ahead property holds structurally.
pub struct ExecutionSimulator {
    books: HashMap<String, Depth>,
    sink: Rc<RefCell<ResultAggregator>>,
    clock: ReplayClock,
}

impl ExecutionSimulator {
    pub fn new(sink: Rc<RefCell<ResultAggregator>>, clock: ReplayClock) -> Self {
        Self {
            books: HashMap::new(),
            sink,
            clock,
        }
    }

    /// Current depth for a market, if any snapshot has been dispatched
    pub fn book(&self, market_ticker: &str) -> Option<&Depth> {
        self.books.get(market_ticker)
    }

    /// Walk the opposing side's levels in ascending cost order, taking
    /// contracts up to the intent's price, spend, and quantity limits.
    /// Emits one fill per level consumed; zero fills is not an error.
    fn sweep(&mut self, intent: &OrderIntent) {
        let Some(depth) = self.books.get(&intent.market_ticker) else {
            tracing::debug!(
                strategy = %intent.strategy_id,
                market = %intent.market_ticker,
                "no book for intent, skipping"
            );
            return;
        };

        let mut filled = 0u32;
        let mut spent = 0u64;
        let mut fills = Vec::new();

        for (price, qty) in available_levels(depth, intent.side) {
            if price > intent.max_price_cents {
                break;
            }
            if filled >= intent.desired_quantity {
                break;
            }

            let mut take = qty.min(intent.desired_quantity - filled);
            if intent.max_spend_cents > 0 {
                let remaining = u64::from(intent.max_spend_cents) - spent;
                let affordable = remaining / u64::from(price);
                take = take.min(u32::try_from(affordable).unwrap_or(u32::MAX));
                if take == 0 {
                    break;
                }
            }

            let cost = u64::from(take) * u64::from(price);
            fills.push(Fill {
                timestamp: self.clock.now().unwrap_or(intent.issued_at),
                market_ticker: intent.market_ticker.clone(),
                side: intent.side,
                price_cents: price,
                quantity: take,
                cost_cents: cost,
                strategy_id: intent.strategy_id.clone(),
            });
            filled += take;
            spent += cost;
        }

        if fills.is_empty() {
            tracing::debug!(
                strategy = %intent.strategy_id,
                market = %intent.market_ticker,
                max_price = intent.max_price_cents,
                "no liquidity under price cap"
            );
            return;
        }

        tracing::info!(
            strategy = %intent.strategy_id,
            market = %intent.market_ticker,
            side = intent.side.as_str(),
            contracts = filled,
            cost_cents = spent,
            levels = fills.len(),
            "filled"
        );
        let mut sink = self.sink.borrow_mut();
        for fill in fills {
            sink.record(fill);
        }
    }
}

impl EventHandler for ExecutionSimulator {
    fn on_event(&mut self, event: &Event, _bus: &EventBus) -> anyhow::Result<()> {
        match event {
            Event::MarketDiscovery(e) => {
                for ticker in &e.tickers {
                    self.books.entry(ticker.clone()).or_default();
                }
            }
            Event::OrderbookSnapshot(e) => {
                // Wholesale replacement: prior depth for this market is gone
                self.books.insert(e.market_ticker.clone(), e.depth.clone());
            }
            Event::WeatherObservation(_) => {}
            Event::OrderIntent(intent) => self.sweep(intent),
        }
        Ok(())
    }
}
