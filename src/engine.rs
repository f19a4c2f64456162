//! Session engine - the single actor that owns all mutable session state.
//!
//! Feed events are consumed strictly one at a time. Each handler mutates the
//! [`MarketState`], requotes instruments whose ladder inputs changed, then
//! re-runs every arbitrage detector and the spot hedger. Order actions are
//! awaited inline, so the next event is never looked at before the current
//! one is fully handled.

use std::sync::Arc;

use flume::Receiver;
use tracing::{debug, info, warn};

use crate::core::{
    EngineConfig, Instrument, InstrumentRegistry, MarketOrder, OrderEntry, Position, Price, Side,
};
use crate::execution::{OrderSlotSync, SyncReport};
use crate::feeds::{parse_message, FeedEvent, MessageEvent};
use crate::state::MarketState;
use crate::strategy::{compute_ladder, ArbSignal, ArbitrageDetector, SpotHedger};

const BOTH_SIDES: [Side; 2] = [Side::Buy, Side::Sell];

/// Session counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub events: u64,
    pub unrecognized_messages: u64,
    pub arb_signals: u64,
    pub hedges_sent: u64,
    pub order_actions: u64,
    pub order_failures: u64,
}

impl EngineStats {
    fn record_sync(&mut self, report: SyncReport) {
        self.order_actions += u64::from(report.actions());
        self.order_failures += u64::from(report.failed);
    }
}

pub struct Engine {
    registry: InstrumentRegistry,
    state: MarketState,
    slots: OrderSlotSync,
    detectors: Vec<ArbitrageDetector>,
    hedger: Option<SpotHedger>,
    venue: Arc<dyn OrderEntry>,
    stats: EngineStats,
}

impl Engine {
    pub fn new(cfg: EngineConfig, venue: Arc<dyn OrderEntry>) -> Self {
        let state = MarketState::new(&cfg.registry);
        Self {
            state,
            slots: OrderSlotSync::new(),
            detectors: cfg.arbitrage.into_iter().map(ArbitrageDetector::new).collect(),
            hedger: cfg.hedge.map(SpotHedger::new),
            registry: cfg.registry,
            venue,
            stats: EngineStats::default(),
        }
    }

    pub fn state(&self) -> &MarketState {
        &self.state
    }

    pub fn slots(&self) -> &OrderSlotSync {
        &self.slots
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Overwrite a position from an external reconciliation and requote it.
    pub async fn reconcile_position(&mut self, instrument: Instrument, position: Position) {
        if self.state.position(instrument) != position {
            info!(
                "⚖️ {} position reconciled {} -> {}",
                instrument,
                self.state.position(instrument),
                position
            );
            self.state.set_position(instrument, position);
            self.requote(instrument).await;
        }
    }

    /// Consume the feed until every sender is gone.
    pub async fn run(&mut self, rx: Receiver<FeedEvent>) -> EngineStats {
        info!(
            "🚀 Engine running on {} venue: {} instruments, {} arb pairs, hedger {}",
            self.venue.name(),
            self.registry.len(),
            self.detectors.len(),
            if self.hedger.is_some() { "on" } else { "off" }
        );

        while let Ok(event) = rx.recv_async().await {
            self.handle_event(event).await;
        }

        info!(
            "🛑 Feed closed after {} events | cash={:.5} m2m={:.5} resting={} actions={} failures={}",
            self.stats.events,
            self.state.cash(),
            self.state.mark_to_market(),
            self.slots.resting_count(),
            self.stats.order_actions,
            self.stats.order_failures
        );
        self.stats
    }

    /// Handle one feed event to completion.
    pub async fn handle_event(&mut self, event: FeedEvent) {
        self.stats.events += 1;
        debug!("Event #{}: {}", self.stats.events, event.kind());

        match event {
            FeedEvent::Book { books } => {
                for book in &books {
                    self.state.apply_book(book);
                }
            }
            FeedEvent::Message { text } => self.handle_message(&text),
            FeedEvent::Fill(fill) => {
                self.state.apply_fill(&fill);
                info!(
                    "💰 Fill {} {} {}@{} -> position {}",
                    fill.instrument,
                    fill.side,
                    fill.quantity,
                    fill.price,
                    self.state.position(fill.instrument)
                );
                // fills carry no handle; resting sizes are unknown now
                self.slots.invalidate(fill.instrument);
                self.requote(fill.instrument).await;
            }
            FeedEvent::Pnl { m2m } => {
                info!(
                    "📊 PnL venue={:.5} tracked={:.5}",
                    m2m,
                    self.state.mark_to_market()
                );
            }
            FeedEvent::Fair { instrument, fair } => {
                if fair.is_finite() {
                    self.state.set_fair(instrument, fair);
                    self.requote(instrument).await;
                } else {
                    warn!("Ignoring non-finite fair for {}: {}", instrument, fair);
                }
            }
            FeedEvent::Position {
                instrument,
                position,
            } => self.reconcile_position(instrument, position).await,
        }

        self.run_arbitrage().await;
        self.run_hedge().await;
    }

    fn handle_message(&mut self, text: &str) {
        match parse_message(text) {
            MessageEvent::RateUpdate(update) => {
                self.state.rates_mut().apply(&update);
                info!(
                    "📈 Rates @{}: ROR={} HAP={} USD={}",
                    update.timestamp, update.ror, update.hap, update.usd
                );
            }
            MessageEvent::RateTarget { code, target } => {
                self.state.rates_mut().set_target(code, target);
                info!("🏦 {} target rate announced: {}", code, target);
            }
            MessageEvent::Unrecognized => {
                self.stats.unrecognized_messages += 1;
                debug!("Unrecognized message: {}", text);
            }
        }
    }

    /// Requote both sides of `instrument` around its current fair value.
    async fn requote(&mut self, instrument: Instrument) {
        let Some(fair) = self.state.fair(instrument) else {
            debug!("{} has no fair value, not quoting", instrument);
            return;
        };
        self.quote(instrument, fair, &BOTH_SIDES).await;
    }

    /// Compute the ladder for `fair` and sync the requested sides.
    async fn quote(&mut self, instrument: Instrument, fair: Price, sides: &[Side]) {
        let Some(spec) = self.registry.get(instrument).copied() else {
            debug!("{} is not configured for quoting", instrument);
            return;
        };

        let position = self.state.position(instrument);
        let ladder = compute_ladder(&spec, fair, position);
        debug!(
            "{} ladder fair={} pos={} adj={:.6} bids={:?} asks={:?}",
            instrument, fair, position, ladder.adjusted_fair, ladder.bids, ladder.asks
        );

        let report = self
            .slots
            .sync(self.venue.as_ref(), instrument, &spec, &ladder, sides)
            .await;
        self.stats.record_sync(report);
    }

    async fn run_arbitrage(&mut self) {
        let signals: Vec<ArbSignal> = self
            .detectors
            .iter()
            .flat_map(|d| d.evaluate(&self.state))
            .collect();

        for signal in signals {
            self.stats.arb_signals += 1;
            info!(
                "🚨 ARB {:?} {}/{} actual={:.6} fair={:.6} | {} {} @{:.6} | {} {} @{:.6}",
                signal.direction,
                signal.futures.instrument,
                signal.spot.instrument,
                signal.actual_ratio,
                signal.fair_ratio,
                signal.futures.instrument,
                signal.futures.side,
                signal.futures.fair,
                signal.spot.instrument,
                signal.spot.side,
                signal.spot.fair
            );
            for leg in [signal.futures, signal.spot] {
                self.quote(leg.instrument, leg.fair, &[leg.side]).await;
            }
        }
    }

    async fn run_hedge(&mut self) {
        let Some(hedge) = self.hedger.as_ref().and_then(|h| h.evaluate(&self.state)) else {
            return;
        };

        info!(
            "🛡️ Hedge {:?}: market {} {} {}",
            hedge.reason, hedge.instrument, hedge.side, hedge.size
        );
        let order = MarketOrder {
            instrument: hedge.instrument,
            side: hedge.side,
            size: hedge.size,
        };
        match self.venue.place_market(order).await {
            Ok(()) => {
                self.stats.hedges_sent += 1;
                self.stats.order_actions += 1;
            }
            Err(e) => {
                warn!("Hedge order failed: {}", e);
                self.stats.order_failures += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Config, Level, PriceLevel};
    use crate::execution::{PaperVenue, VenueAction};
    use crate::feeds::{Fill, InstrumentBook};

    fn engine() -> (Engine, Arc<PaperVenue>) {
        let venue = Arc::new(PaperVenue::new());
        let cfg = Config::default().validate().unwrap();
        (Engine::new(cfg, venue.clone()), venue)
    }

    fn book(instrument: Instrument, bid: f64, ask: f64) -> InstrumentBook {
        InstrumentBook {
            instrument,
            bids: vec![PriceLevel { price: bid, quantity: 50 }],
            asks: vec![PriceLevel { price: ask, quantity: 50 }],
        }
    }

    fn market_orders(venue: &PaperVenue) -> Vec<MarketOrder> {
        venue
            .actions()
            .into_iter()
            .filter_map(|a| match a {
                VenueAction::Market(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_fair_value_places_full_ladder() {
        let (mut engine, venue) = engine();
        engine
            .handle_event(FeedEvent::Fair {
                instrument: Instrument::RorHapH,
                fair: 2.0,
            })
            .await;

        // width 0.005, clip*fade = 10 * 0.000025 = 0.00025
        let bids = venue.resting_on(Instrument::RorHapH, Side::Buy);
        let asks = venue.resting_on(Instrument::RorHapH, Side::Sell);
        assert_eq!(bids.len(), 2);
        assert_eq!(asks.len(), 2);
        assert_eq!(bids[0].price, 1.9975);
        assert!((bids[1].price - 1.99725).abs() <= 0.00006);
        assert_eq!(asks[0].price, 2.0025);
        assert!((asks[1].price - 2.00275).abs() <= 0.00006);
        assert_eq!(engine.stats().order_actions, 4);
    }

    #[tokio::test]
    async fn test_fill_updates_position_and_requotes() {
        let (mut engine, venue) = engine();
        engine
            .handle_event(FeedEvent::Fair {
                instrument: Instrument::RorHapH,
                fair: 2.0,
            })
            .await;
        venue.take_actions();

        engine
            .handle_event(FeedEvent::Fill(Fill {
                instrument: Instrument::RorHapH,
                side: Side::Buy,
                quantity: 40,
                price: 1.9975,
            }))
            .await;

        assert_eq!(engine.state().position(Instrument::RorHapH), 40);
        assert!((engine.state().cash() + 40.0 * 1.9975).abs() < 1e-9);

        // fade 0.000025 * 40 = 0.001 lower
        let bids = venue.resting_on(Instrument::RorHapH, Side::Buy);
        assert_eq!(bids[0].price, 1.9965);
        let modifies = venue
            .actions()
            .iter()
            .filter(|a| matches!(a, VenueAction::Modify { .. }))
            .count();
        assert_eq!(modifies, 4);
    }

    #[tokio::test]
    async fn test_long_limit_fill_pulls_bids() {
        let (mut engine, venue) = engine();
        engine
            .handle_event(FeedEvent::Fair {
                instrument: Instrument::RorUsdM,
                fair: 0.25,
            })
            .await;
        engine
            .handle_event(FeedEvent::Fill(Fill {
                instrument: Instrument::RorUsdM,
                side: Side::Buy,
                quantity: 100,
                price: 0.25,
            }))
            .await;

        assert!(venue.resting_on(Instrument::RorUsdM, Side::Buy).is_empty());
        let asks = venue.resting_on(Instrument::RorUsdM, Side::Sell);
        assert_eq!(asks.len(), 2);
        assert!(asks.iter().all(|o| o.size == 10));
        assert!(!engine
            .slots()
            .slot(Instrument::RorUsdM, Side::Buy, Level::First)
            .is_resting());
    }

    #[tokio::test]
    async fn test_rates_and_books_trigger_arbitrage_quotes() {
        let (mut engine, venue) = engine();
        engine
            .handle_event(FeedEvent::Message {
                text: "10, 0.01, 0.03, 0.02".into(),
            })
            .await;
        assert!(venue.actions().is_empty());

        engine
            .handle_event(FeedEvent::Book {
                books: vec![
                    book(Instrument::RorUsdH, 0.2550, 0.2560),
                    book(Instrument::RorUsdSpot, 0.2490, 0.2500),
                ],
            })
            .await;

        assert_eq!(engine.stats().arb_signals, 1);

        // futures: asks only, around 0.25 * 1.02 / 1.01
        assert!(venue.resting_on(Instrument::RorUsdH, Side::Buy).is_empty());
        let fut_asks = venue.resting_on(Instrument::RorUsdH, Side::Sell);
        assert_eq!(fut_asks.len(), 2);
        let expected_ask1 = 0.25 * 1.02 / 1.01 + 0.0025;
        assert!((fut_asks[0].price - expected_ask1).abs() <= 0.00001);

        // spot: bids only, around 0.255 / (1.02 / 1.01) = 0.2525
        assert!(venue.resting_on(Instrument::RorUsdSpot, Side::Sell).is_empty());
        let spot_bids = venue.resting_on(Instrument::RorUsdSpot, Side::Buy);
        assert_eq!(spot_bids.len(), 2);
        assert_eq!(spot_bids[0].price, 0.252);
        assert_eq!(spot_bids[0].size, 5);
    }

    #[tokio::test]
    async fn test_arbitrage_needs_both_rates() {
        let (mut engine, venue) = engine();
        engine
            .handle_event(FeedEvent::Message {
                text: "USD NEW FEDERAL FUNDS TARGET 0.02".into(),
            })
            .await;
        engine
            .handle_event(FeedEvent::Book {
                books: vec![
                    book(Instrument::RorUsdH, 0.2550, 0.2560),
                    book(Instrument::RorUsdSpot, 0.2490, 0.2500),
                ],
            })
            .await;

        assert_eq!(engine.state().rates().target(crate::core::RateCode::Usd), Some(0.02));
        assert_eq!(engine.stats().arb_signals, 0);
        assert!(venue.actions().is_empty());
    }

    #[tokio::test]
    async fn test_spot_over_limit_is_hedged() {
        let (mut engine, venue) = engine();
        engine
            .handle_event(FeedEvent::Fill(Fill {
                instrument: Instrument::RorUsdSpot,
                side: Side::Buy,
                quantity: 12,
                price: 0.25,
            }))
            .await;

        let markets = market_orders(&venue);
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].side, Side::Sell);
        assert_eq!(markets[0].size, 2);
        assert_eq!(engine.stats().hedges_sent, 1);
    }

    #[tokio::test]
    async fn test_futures_basket_exposure_is_hedged_with_spot() {
        let (mut engine, venue) = engine();
        engine
            .handle_event(FeedEvent::Fill(Fill {
                instrument: Instrument::RorHapZ,
                side: Side::Sell,
                quantity: 60,
                price: 2.0,
            }))
            .await;

        // net = 0.05 * -60 = -3 -> buy 3 spot
        let markets = market_orders(&venue);
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].instrument, Instrument::RorUsdSpot);
        assert_eq!(markets[0].side, Side::Buy);
        assert_eq!(markets[0].size, 3);
    }

    #[tokio::test]
    async fn test_unrecognized_message_is_counted_only() {
        let (mut engine, venue) = engine();
        engine
            .handle_event(FeedEvent::Message {
                text: "Welcome to the round".into(),
            })
            .await;
        assert_eq!(engine.stats().unrecognized_messages, 1);
        assert!(venue.actions().is_empty());
    }

    #[tokio::test]
    async fn test_venue_rejections_are_tolerated() {
        let (mut engine, venue) = engine();
        venue.set_reject_all(true);
        engine
            .handle_event(FeedEvent::Fair {
                instrument: Instrument::RorHapH,
                fair: 2.0,
            })
            .await;
        assert_eq!(engine.stats().order_failures, 4);
        assert_eq!(engine.slots().resting_count(), 0);

        venue.set_reject_all(false);
        engine
            .handle_event(FeedEvent::Fair {
                instrument: Instrument::RorHapH,
                fair: 2.0,
            })
            .await;
        assert_eq!(engine.slots().resting_count(), 4);
    }

    #[tokio::test]
    async fn test_non_finite_fair_is_ignored() {
        let (mut engine, venue) = engine();
        engine
            .handle_event(FeedEvent::Fair {
                instrument: Instrument::RorHapH,
                fair: f64::NAN,
            })
            .await;
        assert_eq!(engine.state().fair(Instrument::RorHapH), Some(5.0));
        assert!(venue.actions().is_empty());
    }

    #[tokio::test]
    async fn test_full_fill_without_fade_replaces_filled_level() {
        let venue = Arc::new(PaperVenue::new());
        let mut cfg = Config::default();
        cfg.instruments.get_mut("RHH").unwrap().max_range = 0.0;
        let mut engine = Engine::new(cfg.validate().unwrap(), venue.clone());

        engine
            .handle_event(FeedEvent::Fair {
                instrument: Instrument::RorHapH,
                fair: 2.0,
            })
            .await;
        assert_eq!(venue.resting_count(), 4);

        // the venue consumes the first bid entirely
        let filled = engine
            .slots()
            .slot(Instrument::RorHapH, Side::Buy, Level::First)
            .handle
            .clone()
            .unwrap();
        venue.cancel(&filled).await.unwrap();
        venue.take_actions();

        engine
            .handle_event(FeedEvent::Fill(Fill {
                instrument: Instrument::RorHapH,
                side: Side::Buy,
                quantity: 10,
                price: 1.9975,
            }))
            .await;

        let limit_actions = venue
            .actions()
            .iter()
            .filter(|a| matches!(a, VenueAction::Place { .. } | VenueAction::Modify { .. }))
            .count();
        assert_eq!(limit_actions, 4);
        let bids = venue.resting_on(Instrument::RorHapH, Side::Buy);
        assert_eq!(bids.len(), 2);
        assert_eq!(bids[0].price, 1.9975);
        assert_eq!(bids[0].size, 10);
        assert_eq!(venue.resting_count(), 4);
    }

    #[tokio::test]
    async fn test_position_event_reconciles_and_requotes() {
        let (mut engine, venue) = engine();
        engine
            .handle_event(FeedEvent::Position {
                instrument: Instrument::RorHapU,
                position: -100,
            })
            .await;
        assert_eq!(engine.state().position(Instrument::RorHapU), -100);
        assert!(venue.resting_on(Instrument::RorHapU, Side::Sell).is_empty());
        assert_eq!(venue.resting_on(Instrument::RorHapU, Side::Buy).len(), 2);
    }

    #[tokio::test]
    async fn test_run_consumes_events_in_order() {
        let (mut engine, venue) = engine();
        let (tx, rx) = flume::unbounded();
        tx.send(FeedEvent::Fair {
            instrument: Instrument::RorHapM,
            fair: 2.0,
        })
        .unwrap();
        tx.send(FeedEvent::Fair {
            instrument: Instrument::RorHapM,
            fair: 2.1,
        })
        .unwrap();
        drop(tx);

        let stats = engine.run(rx).await;
        assert_eq!(stats.events, 2);
        assert_eq!(engine.state().fair(Instrument::RorHapM), Some(2.1));
        let bids = venue.resting_on(Instrument::RorHapM, Side::Buy);
        assert_eq!(bids[0].price, 2.0975);
    }
}
