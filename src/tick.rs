//! Tick rounding.
//!
//! Prices are computed in `f64`; the venue only accepts multiples of the
//! instrument's tick. The result is snapped through `rust_decimal` to the
//! number of decimal places the tick itself carries, so `0.00001` always
//! yields five places and never `4.995000000000001`.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::core::Price;

/// Decimal places implied by a tick size (`0.00002` → 5, `0.25` → 2, `1` → 0).
pub fn tick_decimals(tick: f64) -> u32 {
    Decimal::from_f64(tick)
        .map(|d| d.normalize().scale())
        .unwrap_or(0)
}

/// Round `price` to the nearest multiple of `tick`.
///
/// Idempotent. Non-finite prices and non-positive ticks are returned as-is;
/// a zero tick is rejected when the configuration is validated.
pub fn round_to_tick(price: Price, tick: f64) -> Price {
    if !price.is_finite() || !(tick > 0.0) {
        return price;
    }

    let raw = (price / tick).round_ties_even() * tick;
    Decimal::from_f64(raw)
        .and_then(|d| d.round_dp(tick_decimals(tick)).to_f64())
        .unwrap_or(raw)
}
