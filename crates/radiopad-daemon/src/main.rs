mod error;
mod gamepad;
mod http;
mod mpv;
mod playback;
mod supervisor;
#[cfg(test)]
mod test_support;

use anyhow::Context;
use clap::Parser;
use radiopad_proto::catalog::Catalog;
use radiopad_proto::config::Config;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::gamepad::GamepadListener;
use crate::mpv::IpcChannel;
use crate::playback::PlaybackController;
use crate::supervisor::MpvSupervisor;

#[derive(Parser, Debug)]
#[command(name = "radiopad", version)]
#[command(about = "Gamepad and HTTP remote control for an mpv radio player")]
struct Args {
    /// Path to the JSON config file
    #[arg(long, default_value_os_t = radiopad_proto::platform::default_config_path())]
    config: PathBuf,

    /// HTTP port (overrides config file)
    #[arg(long)]
    port: Option<u16>,

    /// Address the HTTP server binds to
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Gamepad device path (overrides config file)
    #[arg(long)]
    gamepad: Option<PathBuf>,

    /// Stations API URL or local JSON file (overrides config file)
    #[arg(long)]
    api: Option<String>,

    /// mpv IPC socket path
    #[arg(long, default_value = radiopad_proto::platform::DEFAULT_MPV_SOCKET)]
    socket: PathBuf,

    /// mpv binary (default: beside this executable, then PATH)
    #[arg(long)]
    mpv: Option<PathBuf>,

    /// Timeout for each mpv IPC command, in milliseconds
    #[arg(long, default_value_t = 2000)]
    ipc_timeout_ms: u64,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,radiopad_daemon=debug"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_writer(file).with_ansi(false))
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Shutdown signal received");
}

/// Load the catalog, then bind the HTTP port.  No stations, nothing to
/// serve: an unusable catalog never opens the port.
async fn load_and_bind(config: &Config, bind: &str) -> anyhow::Result<(Catalog, TcpListener)> {
    let catalog = Catalog::load(&config.stations_api_url)
        .await
        .context("loading station catalog")?;

    let addr = format!("{}:{}", bind, config.server_port);
    let tcp = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding HTTP server to {}", addr))?;
    Ok((catalog, tcp))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;
    info!("radiopad v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(&args.config)?;
    info!("Config loaded from: {}", args.config.display());
    if let Some(port) = args.port {
        config.server_port = port;
    }
    if let Some(gamepad) = args.gamepad {
        config.gamepad_device_path = gamepad;
    }
    if let Some(api) = args.api {
        config.stations_api_url = api;
    }

    let (catalog, tcp) = load_and_bind(&config, &args.bind).await?;
    info!("HTTP API server listening on http://{}", tcp.local_addr()?);

    let mpv_binary = args
        .mpv
        .or_else(radiopad_proto::platform::find_mpv_binary)
        .unwrap_or_else(|| {
            warn!("mpv binary not found beside executable or on PATH, trying plain 'mpv'");
            PathBuf::from(radiopad_proto::platform::mpv_binary_name())
        });
    info!("Using mpv binary: {}", mpv_binary.display());

    let channel =
        IpcChannel::new(&args.socket).with_timeout(Duration::from_millis(args.ipc_timeout_ms));
    let controller = Arc::new(PlaybackController::new(
        catalog,
        MpvSupervisor::new(mpv_binary, channel),
    ));

    let cancel = CancellationToken::new();
    let listener = GamepadListener::new(
        config.button_mappings.clone(),
        controller.clone(),
        cancel.clone(),
    );
    let device = config.gamepad_device_path.clone();
    let gamepad_handle = tokio::spawn(async move {
        if let Err(e) = listener.run_device(&device).await {
            error!("Gamepad listener error: {}", e);
        }
    });

    let served = axum::serve(tcp, http::router(controller.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    cancel.cancel();
    if tokio::time::timeout(Duration::from_secs(2), gamepad_handle)
        .await
        .is_err()
    {
        warn!("Gamepad listener did not stop in time");
    }
    controller.shutdown().await;
    info!("radiopad stopped");

    served.context("HTTP server error")
}
