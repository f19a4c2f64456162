//! Quoting and hedging decisions. Everything here is a pure function of
//! configuration and [`crate::state::MarketState`]; the engine turns the
//! results into order actions.

pub mod arbitrage;
pub mod hedger;
pub mod market_maker;

pub use arbitrage::{ArbDirection, ArbQuote, ArbSignal, ArbitrageDetector};
pub use hedger::{HedgeOrder, HedgeReason, SpotHedger};
pub use market_maker::{compute_ladder, Ladder, Quote, SideLadder};
