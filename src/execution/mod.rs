//! Simulated order execution
//!
//! Consumes order intents against the most recently dispatched book state
//! and produces fills via a liquidity sweep. There is no price-impact
//! modeling beyond static depth consumption.

mod simulator;

pub use simulator::ExecutionSimulator;

use crate::events::{Depth, Side};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One price level actually consumed by a sweep. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fill {
    pub timestamp: DateTime<Utc>,
    pub market_ticker: String,
    pub side: Side,
    pub price_cents: u32,
    pub quantity: u32,
    pub cost_cents: u64,
    pub strategy_id: String,
}

/// Resting liquidity available to a buyer of `side`, as (cost, quantity)
/// pairs sorted by ascending cost.
///
/// Buying one side of a binary market consumes the opposing side's resting
/// orders: a NO order resting at 90¢ fills a YES buyer at 10¢.
pub fn available_levels(depth: &Depth, side: Side) -> Vec<(u32, u32)> {
    let mut levels: Vec<(u32, u32)> = depth
        .side(side.opposing())
        .iter()
        .filter(|(_, &qty)| qty > 0)
        .map(|(&price, &qty)| (100 - price, qty))
        .collect();
    levels.sort_unstable();
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_levels_transform_and_order() {
        let mut depth = Depth::default();
        depth.no.insert(90, 5); // costs a YES buyer 10¢
        depth.no.insert(89, 3); // costs a YES buyer 11¢
        depth.no.insert(95, 0); // empty level dropped

        let levels = available_levels(&depth, Side::Yes);
        assert_eq!(levels, vec![(10, 5), (11, 3)]);
    }

    #[test]
    fn test_available_levels_no_side() {
        let mut depth = Depth::default();
        depth.yes.insert(40, 7);
        depth.yes.insert(45, 2);

        // Buying NO consumes YES resting orders
        let levels = available_levels(&depth, Side::No);
        assert_eq!(levels, vec![(55, 2), (60, 7)]);
    }

    #[test]
    fn test_available_levels_empty_book() {
        let depth = Depth::default();
        assert!(available_levels(&depth, Side::Yes).is_empty());
    }
}
