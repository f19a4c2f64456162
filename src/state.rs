//! Session market state - inventory, cash, top of book, fair values and rates
//!
//! One `MarketState` lives inside the engine for the whole session. It is
//! only mutated by the engine's update handlers; strategies read it.

use crate::core::{Instrument, InstrumentRegistry, Position, Price, RateCode, Side};
use crate::feeds::{Fill, InstrumentBook, RateUpdate};

/// Per-instrument slice of the market state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InstrumentState {
    pub position: Position,
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    pub fair: Option<Price>,
}

impl InstrumentState {
    pub fn mid(&self) -> Option<Price> {
        Some((self.best_bid? + self.best_ask?) / 2.0)
    }
}

/// Most recent announced rates. Codes never announced are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateSignals {
    rates: [Option<f64>; 3],
    targets: [Option<f64>; 3],
    last_timestamp: Option<u64>,
}

impl RateSignals {
    pub fn get(&self, code: RateCode) -> Option<f64> {
        self.rates[code.index()]
    }

    pub fn set(&mut self, code: RateCode, rate: f64) {
        self.rates[code.index()] = Some(rate);
    }

    /// Latest announced target for `code`. Informational only.
    pub fn target(&self, code: RateCode) -> Option<f64> {
        self.targets[code.index()]
    }

    pub fn set_target(&mut self, code: RateCode, target: f64) {
        self.targets[code.index()] = Some(target);
    }

    pub fn apply(&mut self, update: &RateUpdate) {
        for (code, rate) in update.rates() {
            self.set(code, rate);
        }
        self.last_timestamp = Some(update.timestamp);
    }

    pub fn last_timestamp(&self) -> Option<u64> {
        self.last_timestamp
    }
}

/// Global market state for one session
#[derive(Debug, Clone, Default)]
pub struct MarketState {
    instruments: [InstrumentState; Instrument::COUNT],
    cash: f64,
    rates: RateSignals,
}

impl MarketState {
    /// Fresh session state; fair values start from the configured values.
    pub fn new(registry: &InstrumentRegistry) -> Self {
        let mut state = Self::default();
        for (instrument, spec) in registry.iter() {
            state.instruments[instrument.index()].fair = Some(spec.fair);
        }
        state
    }

    #[inline(always)]
    pub fn instrument(&self, instrument: Instrument) -> &InstrumentState {
        &self.instruments[instrument.index()]
    }

    #[inline(always)]
    fn instrument_mut(&mut self, instrument: Instrument) -> &mut InstrumentState {
        &mut self.instruments[instrument.index()]
    }

    pub fn position(&self, instrument: Instrument) -> Position {
        self.instrument(instrument).position
    }

    /// Overwrite a position, e.g. after reconciling with the venue.
    pub fn set_position(&mut self, instrument: Instrument, position: Position) {
        self.instrument_mut(instrument).position = position;
    }

    pub fn best_bid(&self, instrument: Instrument) -> Option<Price> {
        self.instrument(instrument).best_bid
    }

    pub fn best_ask(&self, instrument: Instrument) -> Option<Price> {
        self.instrument(instrument).best_ask
    }

    pub fn mid(&self, instrument: Instrument) -> Option<Price> {
        self.instrument(instrument).mid()
    }

    pub fn fair(&self, instrument: Instrument) -> Option<Price> {
        self.instrument(instrument).fair
    }

    pub fn set_fair(&mut self, instrument: Instrument, fair: Price) {
        self.instrument_mut(instrument).fair = Some(fair);
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn rates(&self) -> &RateSignals {
        &self.rates
    }

    pub fn rates_mut(&mut self) -> &mut RateSignals {
        &mut self.rates
    }

    /// Record top of book. An empty side clears the stored price.
    pub fn apply_book(&mut self, book: &InstrumentBook) {
        let slot = self.instrument_mut(book.instrument);
        slot.best_bid = book.best_bid();
        slot.best_ask = book.best_ask();
    }

    /// Track inventory and cash from one of our fills.
    pub fn apply_fill(&mut self, fill: &Fill) {
        let qty = Position::from(fill.quantity);
        let notional = f64::from(fill.quantity) * fill.price;
        match fill.side {
            Side::Buy => {
                self.instrument_mut(fill.instrument).position += qty;
                self.cash -= notional;
            }
            Side::Sell => {
                self.instrument_mut(fill.instrument).position -= qty;
                self.cash += notional;
            }
        }
    }

    /// Cash plus every open position marked at its mid. Positions without
    /// a two-sided book contribute nothing.
    pub fn mark_to_market(&self) -> f64 {
        self.cash
            + Instrument::ALL
                .iter()
                .filter_map(|&i| {
                    let s = self.instrument(i);
                    s.mid().map(|mid| s.position as f64 * mid)
                })
                .sum::<f64>()
    }
}
