//! wxarb: deterministic backtester for Kalshi weather temperature markets
//!
//! This library provides the core components for:
//! - Composing recorded market and weather streams into one ordered timeline
//! - Selectable latency models for weather-observation arrival
//! - Synchronous publish/subscribe dispatch with exact causal ordering
//! - Liquidity-sweep execution simulation against snapshot depth
//! - Fill aggregation, summaries, and CSV export
//!
//! The engine is single-threaded and fully synchronous: replaying the same
//! recorded inputs with the same configuration always produces an identical
//! fill sequence, and no handler can ever observe data from later in the
//! timeline.

pub mod bus;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod execution;
pub mod replay;
pub mod results;
pub mod strategy;
pub mod telemetry;
pub mod timeline;
