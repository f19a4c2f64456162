//! Rate-implied futures/spot arbitrage.
//!
//! With annualized rates for the two currencies, the futures leg should trade
//! at `fair_ratio = (1 + foreign) / (1 + domestic)` times spot. When the book
//! crosses that ratio we quote both legs back toward it:
//!
//! - futures bid / spot ask above the ratio: sell futures, buy spot
//! - futures ask / spot bid below the ratio: buy futures, sell spot

use crate::core::{ArbPairConfig, Instrument, Price, Side};
use crate::state::MarketState;

/// One corrective quote: rest `side` on `instrument` around `fair`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArbQuote {
    pub instrument: Instrument,
    pub side: Side,
    pub fair: Price,
}

/// Which check produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbDirection {
    /// Futures rich against spot
    High,
    /// Futures cheap against spot
    Low,
}

/// Mispricing found on one pair, with the paired quotes to send.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArbSignal {
    pub direction: ArbDirection,
    pub fair_ratio: f64,
    pub actual_ratio: f64,
    pub futures: ArbQuote,
    pub spot: ArbQuote,
}

/// Detector for a single futures/spot pair
#[derive(Debug, Clone)]
pub struct ArbitrageDetector {
    pair: ArbPairConfig,
}

impl ArbitrageDetector {
    pub fn new(pair: ArbPairConfig) -> Self {
        Self { pair }
    }

    /// No-arbitrage ratio, if both rates have been published.
    pub fn fair_ratio(&self, state: &MarketState) -> Option<f64> {
        let rates = state.rates();
        let foreign = rates.get(self.pair.foreign)?;
        let domestic = rates.get(self.pair.domestic)?;
        Some((1.0 + foreign) / (1.0 + domestic))
    }

    /// Run both checks. Missing rates or prices silently yield nothing.
    pub fn evaluate(&self, state: &MarketState) -> Vec<ArbSignal> {
        let Some(fair_ratio) = self.fair_ratio(state) else {
            return Vec::new();
        };

        [self.check_high(state, fair_ratio), self.check_low(state, fair_ratio)]
            .into_iter()
            .flatten()
            .collect()
    }

    fn check_high(&self, state: &MarketState, fair_ratio: f64) -> Option<ArbSignal> {
        let futures_bid = state.best_bid(self.pair.futures)?;
        let spot_ask = state.best_ask(self.pair.spot)?;
        let actual_ratio = futures_bid / spot_ask;

        (actual_ratio > fair_ratio).then(|| ArbSignal {
            direction: ArbDirection::High,
            fair_ratio,
            actual_ratio,
            futures: ArbQuote {
                instrument: self.pair.futures,
                side: Side::Sell,
                fair: spot_ask * fair_ratio,
            },
            spot: ArbQuote {
                instrument: self.pair.spot,
                side: Side::Buy,
                fair: futures_bid / fair_ratio,
            },
        })
    }

    fn check_low(&self, state: &MarketState, fair_ratio: f64) -> Option<ArbSignal> {
        let futures_ask = state.best_ask(self.pair.futures)?;
        let spot_bid = state.best_bid(self.pair.spot)?;
        let actual_ratio = futures_ask / spot_bid;

        (actual_ratio < fair_ratio).then(|| ArbSignal {
            direction: ArbDirection::Low,
            fair_ratio,
            actual_ratio,
            futures: ArbQuote {
                instrument: self.pair.futures,
                side: Side::Buy,
                fair: spot_bid * fair_ratio,
            },
            spot: ArbQuote {
                instrument: self.pair.spot,
                side: Side::Sell,
                fair: futures_ask / fair_ratio,
            },
        })
    }
}
