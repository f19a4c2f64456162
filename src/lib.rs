//! Ladder-Arb - Core Library
//! Rate-driven futures/spot market maker with ladder quoting, arbitrage
//! detection and spot hedging.

// Public modules
pub mod core;
pub mod engine;
pub mod execution;
pub mod feeds;
pub mod state;
pub mod strategy;
pub mod tick;

// Re-exports
pub use core::{Config, Error, Result};
pub use engine::{Engine, EngineStats};
