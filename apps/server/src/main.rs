//! Remote VSCS Server - standalone headless bridge.
//!
//! Runs the Remote VSCS bridge against an in-memory simulated panel, so the
//! browser client can be developed and demonstrated without the host
//! application.

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use remote_vscs_core::{
    bootstrap_services, start_servers, AppState, HostEvents, LoggingEventListener, SimulatedHost,
};
use tokio::signal;

use crate::config::ServerConfig;

/// How long to wait for the listeners to wind down after shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Remote VSCS Server - VSCS panel bridge for browser clients.
#[derive(Parser, Debug)]
#[command(name = "remote-vscs-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "REMOTE_VSCS_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// HTTP port; WebSocket uses port + 1 (overrides config file).
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Bind address (overrides config file).
    #[arg(short = 'b', long)]
    bind: Option<std::net::IpAddr>,

    /// Asset directory containing the bootstrap page (overrides config file).
    #[arg(short = 'a', long)]
    asset_dir: Option<PathBuf>,

    /// Start the simulated panel without a valid ATC session (transmit refused).
    #[arg(long)]
    no_atc: bool,

    /// Start with an empty simulated panel instead of the demo one.
    #[arg(long)]
    empty_panel: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Remote VSCS Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.base_port = port;
    }
    if let Some(ip) = args.bind {
        config.bind_address = ip;
    }
    if let Some(dir) = args.asset_dir {
        config.asset_dir = dir;
    }
    if args.no_atc {
        config.valid_atc = false;
    }
    if args.empty_panel {
        config.demo_panel = false;
    }

    log::info!(
        "Configuration: bind={}, base_port={}, asset_dir={}, valid_atc={}",
        config.bind_address,
        config.base_port,
        config.asset_dir.display(),
        config.valid_atc
    );

    // Simulated host panel
    let host = Arc::new(if config.demo_panel {
        SimulatedHost::demo_panel()
    } else {
        SimulatedHost::new()
    });
    host.set_valid_atc(config.valid_atc);
    if config.log_host_events {
        host.subscribe(Arc::new(LoggingEventListener));
    }

    // Bootstrap services
    let core_config = config.to_core_config();
    let services =
        bootstrap_services(&core_config, host).context("Failed to bootstrap services")?;

    log::info!("Services bootstrapped successfully");

    services.start_background_tasks();

    // Bind both listeners; failure here is fatal
    let app_state = AppState::new(&services);
    let handles = start_servers(app_state)
        .await
        .context("Failed to start listeners")?;

    log::info!(
        "Open http://{} in a browser (WebSocket on port {})",
        handles.http_addr,
        handles.ws_addr.port()
    );

    // Wait for shutdown signal
    shutdown_signal().await;

    log::info!("Shutdown signal received, cleaning up...");

    // Graceful shutdown
    services.shutdown();

    if tokio::time::timeout(SHUTDOWN_GRACE, handles.join())
        .await
        .is_err()
    {
        log::warn!("Listeners did not stop within {:?}", SHUTDOWN_GRACE);
    }

    log::info!("Shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
