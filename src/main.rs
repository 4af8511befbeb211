//! SSL helper demo server.
//!
//! Serves the routes declared in the config file, guarding each one by the
//! configured `[[rules]]`, and exposes the generated `ssl_`/`plain_` URL
//! helpers under `/_ssl/helpers`.
//!
//! ```text
//!     Client ──▶ plain listener ─┐
//!                                ├─▶ guard ──▶ page / 30x / 421
//!     Client ──▶ TLS listener ───┘
//!
//!     config file ──▶ watcher ──▶ SslState::reload (policy + helpers swap)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use ssl_helper::config::{load_config, watcher::ConfigWatcher};
use ssl_helper::lifecycle::{signals::shutdown_on_ctrl_c, Shutdown};
use ssl_helper::observability;
use ssl_helper::HttpServer;

#[derive(Parser)]
#[command(name = "ssl-helper")]
#[command(about = "Serve a site with HTTP/HTTPS enforcement", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "ssl-helper.toml")]
    config: PathBuf,

    /// Validate the configuration, print the generated helpers and exit.
    #[arg(long)]
    check: bool,

    /// Do not reload the configuration when the file changes.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args.config)?;
    observability::logging::init(&config.observability.log_level);

    tracing::info!("ssl-helper v{} starting", env!("CARGO_PKG_VERSION"));

    let server = HttpServer::new(config.clone())?;
    {
        let settings = server.state().settings();
        tracing::info!(
            secure = %settings.policy.secure().origin(),
            insecure = %settings.policy.insecure().origin(),
            mode = ?settings.policy.mode(),
            routes = config.routes.len(),
            "Configuration loaded"
        );
    }

    if args.check {
        match server.state().registry() {
            Some(registry) => {
                for name in registry.helper_names() {
                    println!("{name}");
                }
            }
            None => println!("no helpers generated"),
        }
        return Ok(());
    }

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let (watcher, updates) = ConfigWatcher::new(&args.config);
    // Keep the notify handle alive for the life of the server.
    let _watch = if args.no_watch {
        None
    } else {
        match watcher.run() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "Config watcher unavailable; hot reload disabled");
                None
            }
        }
    };

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(async move { shutdown_on_ctrl_c(&shutdown).await });

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    server.run(listener, updates, signal).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
