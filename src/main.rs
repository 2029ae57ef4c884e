//! subfwd: DNS-driven subdomain forwarding.
//!
//! ```text
//!     Client Request
//!     ───────────────▶ dispatch ──┬── favicon ─▶ 404
//!                                 ├── admin host ─▶ /, /static, /stats, /headers, /setup
//!                                 └── other host
//!                                        │
//!                                        ▼
//!                            TXT lookups (joined, concurrent)
//!                              subproxy-<sub>.<domain>
//!                              subfwd-<sub>.<domain>
//!                              subfwd-default.<domain>
//!                                        │
//!                             ┌──────────┴──────────┐
//!                             ▼                     ▼
//!                       reverse proxy          302 redirect
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use subfwd::config::load_config;
use subfwd::http::HttpServer;
use subfwd::lifecycle::{signals, Shutdown};
use subfwd::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "subfwd", version, about = "DNS-driven subdomain forwarding")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port; overrides the configured bind address port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.listener.set_port(port);
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "subfwd starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        admin_host = %config.hosts.admin_host,
        dns_mode = ?config.dns.mode,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
