mod analysis;
mod api;
mod config;
mod display;
mod error;
mod feed;
mod rate_limit;
mod session;

use analysis::recommender::{dispatch_events, PipelineSettings, RecommendationPipeline};
use anyhow::Context;
use api::client::{OpenDotaClient, StatsGateway};
use clap::Parser;
use config::Config;
use display::output::{display_error, display_info, render_panel};
use feed::health;
use feed::ingestor::FeedIngestor;
use feed::log_tail::{LogTailer, DEFAULT_REOPEN_BACKOFF};
use feed::patterns::HeroRevealMatcher;
use feed::server::{self, FeedServerState};
use session::catalog::bootstrap_catalog;
use session::store::{SelfTest, SessionStore, DEFAULT_LOG_RING};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CATALOG_ATTEMPTS: u32 = 3;
const CATALOG_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "Dota Counters")]
#[command(about = "Live counter-pick recommendations from the game feed and console log", long_about = None)]
struct Args {
    /// Feed listener address (overrides FEED_ADDR)
    #[arg(long)]
    feed_addr: Option<String>,

    /// Console log to tail (overrides DOTA_CONSOLE_LOG)
    #[arg(long)]
    console_log: Option<PathBuf>,

    /// Pause between roster matchup requests, in milliseconds
    #[arg(long, default_value = "100")]
    request_delay_ms: u64,

    /// Deadline for each roster matchup request, in seconds
    #[arg(long, default_value = "10")]
    request_timeout_secs: u64,

    /// Deadline for the picked hero's matchup request, in seconds
    #[arg(long, default_value = "20")]
    lookup_timeout_secs: u64,

    /// Bound on one whole recommendation run, in seconds
    #[arg(long, default_value = "60")]
    run_timeout_secs: u64,

    /// Deadline for the hero catalog request, in seconds
    #[arg(long, default_value = "15")]
    catalog_timeout_secs: u64,

    /// Console log poll interval at end of file, in milliseconds
    #[arg(long, default_value = "100")]
    log_poll_ms: u64,

    /// Diagnostic log lines kept in the session
    #[arg(long, default_value_t = DEFAULT_LOG_RING)]
    log_ring: usize,

    /// Print the text panel every N seconds (0 = off)
    #[arg(long, default_value = "0")]
    panel_interval_secs: u64,

    /// Skip posting a test document to the feed listener at startup
    #[arg(long)]
    no_self_test: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(addr) = &args.feed_addr {
        config.feed_addr = config::parse_addr(addr)?;
    }
    if let Some(path) = args.console_log.clone() {
        config.console_log = path;
    }

    let settings = PipelineSettings {
        lookup_timeout: Duration::from_secs(args.lookup_timeout_secs),
        request_timeout: Duration::from_secs(args.request_timeout_secs),
        run_timeout: Duration::from_secs(args.run_timeout_secs),
        request_delay: Duration::from_millis(args.request_delay_ms),
        ..PipelineSettings::default()
    };

    display_info(&format!(
        "Feed on http://{} | console log {}",
        config.feed_addr,
        config.console_log.display()
    ));

    let store = Arc::new(SessionStore::new(args.log_ring));
    let gateway: Arc<dyn StatsGateway> = Arc::new(OpenDotaClient::new(
        config.base_url.clone(),
        config.api_key.clone(),
    ));
    let matcher = HeroRevealMatcher::standard().context("compiling hero reveal patterns")?;
    let ingestor = Arc::new(FeedIngestor::new(store.clone(), matcher));
    let pipeline = RecommendationPipeline::new(gateway.clone(), store.clone(), settings);
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    tokio::spawn(bootstrap_catalog(
        gateway,
        store.clone(),
        Duration::from_secs(args.catalog_timeout_secs),
        CATALOG_ATTEMPTS,
        CATALOG_BACKOFF,
    ));
    tokio::spawn(dispatch_events(events_rx, store.clone(), pipeline));
    let tailer = LogTailer::new(config.console_log.clone())
        .with_intervals(Duration::from_millis(args.log_poll_ms), DEFAULT_REOPEN_BACKOFF);
    tokio::spawn(tailer.run(ingestor.clone(), store.clone(), events_tx.clone()));
    tokio::spawn(health::run_health_check(
        store.clone(),
        health::CHECK_INTERVAL,
        health::STALE_AFTER,
    ));

    if args.no_self_test {
        store.set_self_test(SelfTest::Skipped);
    } else {
        tokio::spawn(health::self_test(config.feed_addr, store.clone()));
    }

    if args.panel_interval_secs > 0 {
        tokio::spawn(print_panel(
            store.clone(),
            Duration::from_secs(args.panel_interval_secs),
        ));
    }

    let state = FeedServerState::new(store, ingestor, events_tx);
    tokio::select! {
        served = server::serve(config.feed_addr, state) => {
            served.context("feed listener stopped")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    }

    Ok(())
}

async fn print_panel(store: Arc<SessionStore>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        println!("{}", render_panel(&store.snapshot(DEFAULT_LOG_RING)));
    }
}
