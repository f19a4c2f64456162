//! Core types - Strong typing for safety

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::Error;

/// Price in venue units.
pub type Price = f64;

/// Order or level size in whole contracts.
pub type Size = u32;

/// Signed inventory in whole contracts. Positive = long.
pub type Position = i64;

/// Every contract listed on the venue.
///
/// `6R*` are ROR/USD futures, `6H*` HAP/USD futures, `RH*` ROR/HAP futures,
/// one per delivery month (H, M, U, Z). `RORUSD` is the spot pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Instrument {
    #[serde(rename = "6RH")]
    RorUsdH,
    #[serde(rename = "6RM")]
    RorUsdM,
    #[serde(rename = "6RU")]
    RorUsdU,
    #[serde(rename = "6RZ")]
    RorUsdZ,
    #[serde(rename = "6HH")]
    HapUsdH,
    #[serde(rename = "6HM")]
    HapUsdM,
    #[serde(rename = "6HU")]
    HapUsdU,
    #[serde(rename = "6HZ")]
    HapUsdZ,
    #[serde(rename = "RHH")]
    RorHapH,
    #[serde(rename = "RHM")]
    RorHapM,
    #[serde(rename = "RHU")]
    RorHapU,
    #[serde(rename = "RHZ")]
    RorHapZ,
    #[serde(rename = "RORUSD")]
    RorUsdSpot,
}

impl Instrument {
    pub const COUNT: usize = 13;

    pub const ALL: [Instrument; Self::COUNT] = [
        Instrument::RorUsdH,
        Instrument::RorUsdM,
        Instrument::RorUsdU,
        Instrument::RorUsdZ,
        Instrument::HapUsdH,
        Instrument::HapUsdM,
        Instrument::HapUsdU,
        Instrument::HapUsdZ,
        Instrument::RorHapH,
        Instrument::RorHapM,
        Instrument::RorHapU,
        Instrument::RorHapZ,
        Instrument::RorUsdSpot,
    ];

    /// Venue ticker.
    pub fn as_str(&self) -> &'static str {
        match self {
            Instrument::RorUsdH => "6RH",
            Instrument::RorUsdM => "6RM",
            Instrument::RorUsdU => "6RU",
            Instrument::RorUsdZ => "6RZ",
            Instrument::HapUsdH => "6HH",
            Instrument::HapUsdM => "6HM",
            Instrument::HapUsdU => "6HU",
            Instrument::HapUsdZ => "6HZ",
            Instrument::RorHapH => "RHH",
            Instrument::RorHapM => "RHM",
            Instrument::RorHapU => "RHU",
            Instrument::RorHapZ => "RHZ",
            Instrument::RorUsdSpot => "RORUSD",
        }
    }

    /// Dense index for per-instrument arrays.
    #[inline(always)]
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn is_spot(&self) -> bool {
        matches!(self, Instrument::RorUsdSpot)
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Instrument {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Instrument::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| Error::Config(format!("unknown instrument: {}", s)))
    }
}

/// Interest-rate codes published in rate messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RateCode {
    Ror,
    Hap,
    Usd,
}

impl RateCode {
    pub const ALL: [RateCode; 3] = [RateCode::Ror, RateCode::Hap, RateCode::Usd];

    pub fn as_str(&self) -> &'static str {
        match self {
            RateCode::Ror => "ROR",
            RateCode::Hap => "HAP",
            RateCode::Usd => "USD",
        }
    }

    #[inline(always)]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for RateCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RateCode::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::Config(format!("unknown rate code: {}", s)))
    }
}

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BID"),
            Side::Sell => write!(f, "ASK"),
        }
    }
}

/// Ladder level. Level one is closest to the adjusted fair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    First,
    Second,
}

impl Level {
    pub const ALL: [Level; 2] = [Level::First, Level::Second];

    #[inline(always)]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::First => write!(f, "L1"),
            Level::Second => write!(f, "L2"),
        }
    }
}

/// Opaque venue handle of a resting order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderHandle(pub String);

impl OrderHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for OrderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Price level in an order book
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Price,
    pub quantity: u64,
}

/// Limit order request. `handle: None` places, `Some` modifies.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitOrder {
    pub instrument: Instrument,
    pub side: Side,
    pub price: Price,
    pub size: Size,
    pub handle: Option<OrderHandle>,
}

/// Market order request
#[derive(Debug, Clone, PartialEq)]
pub struct MarketOrder {
    pub instrument: Instrument,
    pub side: Side,
    pub size: Size,
}
