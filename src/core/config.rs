//! Configuration - Type-safe, validated config
//!
//! Loaded once at startup from TOML. `Config::validate` turns the raw file
//! into an [`EngineConfig`] whose instrument registry is the only place the
//! engine looks up per-instrument parameters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::core::{Error, Instrument, RateCode, Result, Size};

/// Quoting parameters for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    /// Minimum price increment
    pub tick: f64,
    /// Max resting size per ladder level
    pub clip: Size,
    /// Quoted spread width (bid1 to ask1)
    pub width: f64,
    /// Absolute position limit
    pub limit: Size,
    /// Total fair-value adjustment allowed at the position limit
    pub max_range: f64,
    /// Initial fair value until one is supplied by the feed
    #[serde(default = "default_fair")]
    pub fair: f64,
}

fn default_fair() -> f64 {
    5.0
}

impl InstrumentSpec {
    fn validate(&self, instrument: Instrument) -> Result<()> {
        let fail = |what: &str| Err(Error::Config(format!("{}: {}", instrument, what)));
        if !(self.tick.is_finite() && self.tick > 0.0) {
            return fail("tick must be a positive number");
        }
        if !(self.width.is_finite() && self.width >= 0.0) {
            return fail("width must be non-negative");
        }
        if self.limit == 0 {
            return fail("limit must be positive");
        }
        if !(self.max_range.is_finite() && self.max_range >= 0.0) {
            return fail("max_range must be non-negative");
        }
        if !self.fair.is_finite() {
            return fail("fair must be finite");
        }
        Ok(())
    }
}

/// Spot hedge parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeConfig {
    /// Spot instrument being hedged
    pub spot: Instrument,
    /// Futures whose exposure is netted into the spot position
    pub basket: Vec<Instrument>,
    /// Spot-equivalent units per futures contract
    pub weight: f64,
    /// Absolute spot position limit
    pub spot_limit: Size,
}

/// One futures/spot pair watched for rate-implied mispricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbPairConfig {
    pub futures: Instrument,
    pub spot: Instrument,
    /// Rate in the numerator of the no-arbitrage ratio
    pub foreign: RateCode,
    /// Rate in the denominator of the no-arbitrage ratio
    pub domestic: RateCode,
}

/// Application configuration (raw, as read from disk)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Per-instrument quoting parameters, keyed by venue ticker
    #[serde(default)]
    pub instruments: BTreeMap<String, InstrumentSpec>,

    /// Spot hedging; disabled when absent
    #[serde(default)]
    pub hedge: Option<HedgeConfig>,

    /// Futures/spot arbitrage pairs
    #[serde(default)]
    pub arbitrage: Vec<ArbPairConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let futures = |tick: f64| InstrumentSpec {
            tick,
            clip: 10,
            width: 0.005,
            limit: 100,
            max_range: 0.005,
            fair: default_fair(),
        };

        let mut instruments = BTreeMap::new();
        for inst in Instrument::ALL {
            let spec = match inst {
                Instrument::RorUsdH
                | Instrument::RorUsdM
                | Instrument::RorUsdU
                | Instrument::RorUsdZ => futures(0.00001),
                Instrument::HapUsdH
                | Instrument::HapUsdM
                | Instrument::HapUsdU
                | Instrument::HapUsdZ => futures(0.00002),
                Instrument::RorHapH
                | Instrument::RorHapM
                | Instrument::RorHapU
                | Instrument::RorHapZ => futures(0.0001),
                Instrument::RorUsdSpot => InstrumentSpec {
                    tick: 0.00001,
                    clip: 5,
                    width: 0.001,
                    limit: 10,
                    max_range: 0.001,
                    fair: default_fair(),
                },
            };
            instruments.insert(inst.as_str().to_string(), spec);
        }

        Self {
            instruments,
            hedge: Some(HedgeConfig {
                spot: Instrument::RorUsdSpot,
                basket: vec![
                    Instrument::RorHapH,
                    Instrument::RorHapM,
                    Instrument::RorHapU,
                    Instrument::RorHapZ,
                ],
                weight: 0.05,
                spot_limit: 10,
            }),
            arbitrage: [
                Instrument::RorUsdH,
                Instrument::RorUsdM,
                Instrument::RorUsdU,
                Instrument::RorUsdZ,
            ]
            .into_iter()
            .map(|futures| ArbPairConfig {
                futures,
                spot: Instrument::RorUsdSpot,
                foreign: RateCode::Usd,
                domestic: RateCode::Ror,
            })
            .collect(),
        }
    }
}

impl Config {
    /// Load from TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from the default location (project root config.toml).
    pub fn load_default() -> Self {
        let candidates = [
            "config.toml",
            concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml"),
        ];

        for path in &candidates {
            if let Ok(cfg) = Self::load(Path::new(path)) {
                tracing::info!("📋 Loaded config from {}", path);
                return cfg;
            }
        }

        tracing::warn!("⚠️ No config.toml found, using defaults");
        Self::default()
    }

    /// Check every invariant and resolve tickers into a registry.
    pub fn validate(&self) -> Result<EngineConfig> {
        let mut registry = InstrumentRegistry::default();
        for (ticker, spec) in &self.instruments {
            let instrument: Instrument = ticker.parse()?;
            spec.validate(instrument)?;
            registry.insert(instrument, *spec);
        }

        if let Some(hedge) = &self.hedge {
            if hedge.spot_limit == 0 {
                return Err(Error::Config("hedge: spot_limit must be positive".into()));
            }
            if !hedge.weight.is_finite() {
                return Err(Error::Config("hedge: weight must be finite".into()));
            }
            if hedge.basket.contains(&hedge.spot) {
                return Err(Error::Config(format!(
                    "hedge: spot {} cannot be part of its own basket",
                    hedge.spot
                )));
            }
        }

        for pair in &self.arbitrage {
            if pair.futures == pair.spot {
                return Err(Error::Config(format!(
                    "arbitrage: {} cannot be paired with itself",
                    pair.futures
                )));
            }
            if pair.foreign == pair.domestic {
                return Err(Error::Config(format!(
                    "arbitrage {}/{}: foreign and domestic rates must differ",
                    pair.futures, pair.spot
                )));
            }
            for leg in [pair.futures, pair.spot] {
                if registry.get(leg).is_none() {
                    return Err(Error::Config(format!(
                        "arbitrage leg {} has no [instruments.{}] entry",
                        leg, leg
                    )));
                }
            }
        }

        Ok(EngineConfig {
            registry,
            hedge: self.hedge.clone(),
            arbitrage: self.arbitrage.clone(),
        })
    }
}

/// Validated instrument table, built once at startup
#[derive(Debug, Clone, Default)]
pub struct InstrumentRegistry {
    specs: [Option<InstrumentSpec>; Instrument::COUNT],
}

impl InstrumentRegistry {
    pub fn insert(&mut self, instrument: Instrument, spec: InstrumentSpec) {
        self.specs[instrument.index()] = Some(spec);
    }

    #[inline(always)]
    pub fn get(&self, instrument: Instrument) -> Option<&InstrumentSpec> {
        self.specs[instrument.index()].as_ref()
    }

    /// Configured instruments, in enumeration order
    pub fn iter(&self) -> impl Iterator<Item = (Instrument, &InstrumentSpec)> {
        Instrument::ALL
            .iter()
            .filter_map(|&i| self.get(i).map(|spec| (i, spec)))
    }

    pub fn len(&self) -> usize {
        self.specs.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Configuration after validation
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub registry: InstrumentRegistry,
    pub hedge: Option<HedgeConfig>,
    pub arbitrage: Vec<ArbPairConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let cfg = Config::default().validate().unwrap();
        assert_eq!(cfg.registry.len(), Instrument::COUNT);
        assert_eq!(cfg.arbitrage.len(), 4);

        let tick = cfg.registry.get(Instrument::HapUsdZ).unwrap().tick;
        assert_eq!(tick, 0.00002);
        let hedge = cfg.hedge.unwrap();
        assert_eq!(hedge.spot_limit, 10);
        assert_eq!(hedge.weight, 0.05);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [instruments.6RH]
            tick = 0.00001
            clip = 10
            width = 0.01
            limit = 100
            max_range = 0.1

            [instruments.RORUSD]
            tick = 0.00001
            clip = 5
            width = 0.001
            limit = 10
            max_range = 0.001
            fair = 0.25

            [hedge]
            spot = "RORUSD"
            basket = ["RHH", "RHM"]
            weight = 0.05
            spot_limit = 10

            [[arbitrage]]
            futures = "6RH"
            spot = "RORUSD"
            foreign = "USD"
            domestic = "ROR"
        "#;
        let cfg = Config::from_toml(toml).unwrap().validate().unwrap();
        assert_eq!(cfg.registry.len(), 2);
        let spec = cfg.registry.get(Instrument::RorUsdH).unwrap();
        assert_eq!(spec.fair, 5.0);
        assert_eq!(spec.width, 0.01);
        assert_eq!(cfg.registry.get(Instrument::RorUsdSpot).unwrap().fair, 0.25);
        assert_eq!(cfg.hedge.unwrap().basket, vec![Instrument::RorHapH, Instrument::RorHapM]);
        assert_eq!(cfg.arbitrage[0].foreign, RateCode::Usd);
    }

    #[test]
    fn test_zero_tick_rejected() {
        let mut cfg = Config::default();
        cfg.instruments.get_mut("6RH").unwrap().tick = 0.0;
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let mut cfg = Config::default();
        cfg.instruments.get_mut("RHZ").unwrap().limit = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_unknown_ticker_rejected() {
        let mut cfg = Config::default();
        cfg.instruments.insert("BTCUSD".into(), cfg.instruments["6RH"]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_arbitrage_leg_must_be_configured() {
        let mut cfg = Config::default();
        cfg.instruments.remove("RORUSD");
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("RORUSD"));
    }
}
