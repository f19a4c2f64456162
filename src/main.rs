use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;
use tracing_subscriber::{fmt, EnvFilter};

use ladder_arb::execution::PaperVenue;
use ladder_arb::feeds::read_json_lines;
use ladder_arb::{Config, Engine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // 1. Logger
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ladder_arb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("🦀 Ladder-Arb starting (paper venue, JSON-lines feed on stdin)...");

    // 2. Config: CLI arg, then LADDER_ARB_CONFIG, then config.toml / defaults
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("LADDER_ARB_CONFIG").ok())
        .map(PathBuf::from);

    let config = match config_path {
        Some(path) => Config::load(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default(),
    };
    let engine_config = config.validate().context("invalid configuration")?;

    // 3. Venue + engine
    let venue = Arc::new(PaperVenue::new());
    let mut engine = Engine::new(engine_config, venue);

    // 4. Feed reader -> engine
    let (tx, rx) = flume::unbounded();
    let reader = tokio::spawn(async move {
        read_json_lines(BufReader::new(tokio::io::stdin()), tx).await
    });

    let stats = engine.run(rx).await;

    match reader.await {
        Ok(Ok(lines)) => tracing::info!("📥 Feed reader done ({} lines)", lines),
        Ok(Err(e)) => tracing::error!("Feed reader failed: {}", e),
        Err(e) => tracing::error!("Feed reader task panicked: {}", e),
    }

    tracing::info!(
        "👋 Session over: {} events, {} arb signals, {} hedges, {} order actions ({} failed)",
        stats.events,
        stats.arb_signals,
        stats.hedges_sent,
        stats.order_actions,
        stats.order_failures
    );
    Ok(())
}
