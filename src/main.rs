use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsprpoll::band::Band;
use wsprpoll::config::Config;
use wsprpoll::dedup::RedisDedupStore;
use wsprpoll::fetch::HttpFetcher;
use wsprpoll::publish::RedisPublisher;
use wsprpoll::scheduler::Scheduler;

#[derive(Parser)]
#[command(
    name = "wsprpoll",
    version,
    about = "Adaptive per-band WSPR spot poller",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll all bands and publish new spots until interrupted
    Run {
        /// Restrict polling to specific bands (repeatable, e.g. --band 40m)
        #[arg(short, long)]
        band: Vec<String>,
    },

    /// List known bands and their upstream query codes
    Bands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    match cli.command {
        Commands::Run { band } => run(band).await?,
        Commands::Bands => bands(),
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("wsprpoll=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("wsprpoll=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}

async fn run(band_ids: Vec<String>) -> Result<()> {
    let config = Config::from_env()?;

    let bands = resolve_bands(&band_ids)?;

    let pool = deadpool_redis::Config::from_url(&config.redis.url)
        .builder()
        .context("failed to create redis pool builder")?
        .max_size(config.redis.pool_size)
        .runtime(deadpool_redis::Runtime::Tokio1)
        .build()
        .context("failed to create redis connection pool")?;

    let fetcher = Arc::new(HttpFetcher::new(&config.fetch_config())?);
    let dedup = Arc::new(RedisDedupStore::new(
        pool.clone(),
        config.redis.key_prefix.clone(),
    ));
    let sink = Arc::new(RedisPublisher::new(
        pool,
        config.publish.channel_prefix.clone(),
    ));

    // Connectivity probe for the log only; outages are handled per cycle.
    match dedup.ping().await {
        Ok(()) => tracing::info!("connected to redis"),
        Err(e) => tracing::warn!(error = %e, "redis not reachable yet, cycles will retry"),
    }

    let scheduler = Scheduler::new(
        fetcher,
        dedup,
        sink,
        config.runner_tuning(),
        config.initial_jitter_max(),
    )
    .with_bands(bands);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown requested, stopping band loops");
    let _ = shutdown_tx.send(true);

    scheduler_handle
        .await
        .context("scheduler task terminated abnormally")?;
    tracing::info!("wsprpoll stopped");

    Ok(())
}

fn resolve_bands(ids: &[String]) -> Result<Vec<Band>> {
    if ids.is_empty() {
        return Ok(Band::all());
    }
    ids.iter()
        .map(|id| Band::from_id(id).with_context(|| format!("unknown band: {id}")))
        .collect()
}

fn bands() {
    println!("{:<12} {:<6}", "band", "code");
    for band in Band::all() {
        println!("{:<12} {:<6}", band.label(), band.code());
    }
}
