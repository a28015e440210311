//! zp-send - Daemon that posts a random ZpDIC entry on a fixed interval
//!
//! In serve mode the last post is also cached and served over HTTP.

use anyhow::Context;
use clap::Parser;
use libzpcast::config::{load_dotenv, log_dotenv, Config, Credentials, RunMode};
use libzpcast::{server, Runner, ZpcastError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration, Instant};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "zp-send")]
#[command(version)]
#[command(about = "Daemon that posts a random ZpDIC entry to Bluesky on a fixed interval")]
#[command(long_about = "\
zp-send - Daemon that posts a random ZpDIC entry to Bluesky on a fixed interval

DESCRIPTION:
    zp-send runs one post immediately and then one per interval until it is
    stopped. A failed run is logged and the next one happens on schedule.

    In serve mode every post is cached and the last one is served over
    HTTP at /, /last.json and /last.txt.

USAGE:
    # Post hourly (the default)
    zp-send

    # Post every 30 minutes and serve the last post
    zp-send --interval 30m --mode serve --bind 0.0.0.0:8000

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (finishes the current run)

CONFIGURATION:
    Configuration file: ~/.config/zpcast/config.toml

    mode = \"serve\"

    [schedule]
    interval = \"1h\"

    [server]
    bind = \"0.0.0.0:8000\"

    [cache]
    path = \"~/.local/share/zpcast/cache.db\"

EXIT CODES:
    0 - Clean shutdown
    1 - Runtime error
    2 - Configuration error
    3 - Bluesky authentication error (--once only)
    4 - Invalid input
")]
struct Cli {
    /// Time between posts, e.g. 1h or 30m (overrides config)
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    interval: Option<Duration>,

    /// Runtime mode: local or serve (overrides config)
    #[arg(long, value_name = "MODE")]
    mode: Option<RunMode>,

    /// Address for the HTTP endpoint in serve mode (overrides config)
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Run once and exit (for testing)
    #[arg(long, hide = true)]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let dotenv = load_dotenv();
    libzpcast::logging::init_default(cli.verbose);
    log_dotenv(&dotenv);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<ZpcastError>()
        .map_or(1, ZpcastError::exit_code)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    let interval = match cli.interval {
        Some(interval) if interval.is_zero() => {
            return Err(ZpcastError::InvalidInput("--interval must be positive".to_string()).into())
        }
        Some(interval) => interval,
        None => config.schedule.interval()?,
    };

    let credentials = Credentials::from_env()?;
    let mut runner = Runner::from_config(&config, credentials).await?;

    if cli.once {
        let report = runner.run_once().await?;
        info!(uri = %report.post_uri, "zp-send: posted once, exiting");
        return Ok(());
    }

    info!(
        mode = %config.mode,
        interval = %humantime::format_duration(interval),
        "zp-send daemon starting"
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone())?;

    let server = match (config.mode, runner.cache()) {
        (RunMode::Serve, Some(cache)) => {
            let listener = server::bind(&config.server.bind)
                .await
                .with_context(|| format!("Failed to bind {}", config.server.bind))?;
            Some(tokio::spawn(server::serve_listener(
                listener,
                cache,
                wait_for_shutdown(shutdown.clone()),
            )))
        }
        _ => None,
    };

    run_daemon_loop(&mut runner, interval, shutdown.clone()).await;

    if let Some(server) = server {
        shutdown.store(true, Ordering::Relaxed);
        server
            .await
            .context("HTTP server task panicked")?
            .context("HTTP server failed")?;
    }

    info!("zp-send daemon stopped");
    Ok(())
}

/// Set up signal handlers for graceful shutdown
#[cfg(unix)]
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("Signal setup failed")?;

    std::thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            info!(signal = sig, "Received shutdown signal, stopping gracefully...");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    Ok(())
}

#[cfg(not(unix))]
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> anyhow::Result<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, stopping gracefully...");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    Ok(())
}

async fn wait_for_shutdown(shutdown: Arc<AtomicBool>) {
    while !shutdown.load(Ordering::Relaxed) {
        sleep(Duration::from_millis(250)).await;
    }
}

/// Post, then sleep out the interval; failed runs are logged, not fatal
async fn run_daemon_loop(runner: &mut Runner, interval: Duration, shutdown: Arc<AtomicBool>) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("Shutdown requested, stopping daemon loop");
            break;
        }

        if let Err(e) = runner.run_once().await {
            error!(error = %e, exit_code = e.exit_code(), "Run failed");
        }

        // Check shutdown every second while waiting for the next run
        let next_run = Instant::now() + interval;
        while !shutdown.load(Ordering::Relaxed) {
            let remaining = next_run.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            sleep(remaining.min(Duration::from_secs(1))).await;
        }
    }
}
