//! Spot hedger - flattens net spot-equivalent delta with market orders.
//!
//! `net = round(spot + weight * Σ basket)`. The spot limit is enforced first;
//! inside the limit the net delta is traded toward zero, capped by the
//! headroom on the side being traded.

use tracing::debug;

use crate::core::{HedgeConfig, Instrument, Position, Side, Size};
use crate::state::MarketState;

/// Why a hedge was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HedgeReason {
    /// Spot long at or past its limit
    SpotOverLong,
    /// Spot short at or past its limit
    SpotOverShort,
    /// Net delta long
    NetLong,
    /// Net delta short
    NetShort,
}

/// Immediate market order on the spot instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HedgeOrder {
    pub instrument: Instrument,
    pub side: Side,
    pub size: Size,
    pub reason: HedgeReason,
}

pub struct SpotHedger {
    cfg: HedgeConfig,
}

impl SpotHedger {
    pub fn new(cfg: HedgeConfig) -> Self {
        Self { cfg }
    }

    /// Spot position plus weighted basket exposure, to the nearest lot
    /// (ties to even).
    pub fn net_position(&self, state: &MarketState) -> Position {
        let basket: f64 = self
            .cfg
            .basket
            .iter()
            .map(|&i| self.cfg.weight * state.position(i) as f64)
            .sum();
        (state.position(self.cfg.spot) as f64 + basket).round_ties_even() as Position
    }

    /// Decide the hedge for the current state. `None` when nothing to send.
    pub fn evaluate(&self, state: &MarketState) -> Option<HedgeOrder> {
        let spot_position = state.position(self.cfg.spot);
        let limit = Position::from(self.cfg.spot_limit);
        let net = self.net_position(state);

        let bids_left = limit - spot_position;
        let asks_left = limit + spot_position;

        let (side, size, reason) = if bids_left <= 0 {
            (Side::Sell, bids_left.abs(), HedgeReason::SpotOverLong)
        } else if asks_left <= 0 {
            (Side::Buy, asks_left.abs(), HedgeReason::SpotOverShort)
        } else if net > 0 {
            (Side::Sell, net.min(asks_left), HedgeReason::NetLong)
        } else if net < 0 {
            (Side::Buy, net.abs().min(bids_left), HedgeReason::NetShort)
        } else {
            return None;
        };

        if size == 0 {
            debug!(
                "Hedge {:?} on {} sized to zero (spot={}, net={})",
                reason, self.cfg.spot, spot_position, net
            );
            return None;
        }

        Some(HedgeOrder {
            instrument: self.cfg.spot,
            side,
            size: Size::try_from(size).unwrap_or(Size::MAX),
            reason,
        })
    }
}
