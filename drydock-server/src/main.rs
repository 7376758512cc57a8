//! Drydock server binary.

use std::process::exit;
use std::sync::Arc;

use clap::Parser;

use drydock_core::{Config, ServerContext, StoragePool};
use drydock_server::service::{create_app, App};
use drydock_server::{background, build_registry};

#[derive(Parser)]
#[command(name = "drydock", version, about = "Repository self-service backend")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "drydock.toml")]
    config: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, path = %cli.config, "cannot load configuration");
            exit(1);
        }
    };

    let storage = match StoragePool::open(&config.database.path).await {
        Ok(pool) => pool,
        Err(error) => {
            tracing::error!(%error, "cannot open session database");
            exit(1);
        }
    };

    let addr = config.server.addr;
    let ctx = ServerContext { config, storage };

    let registry = match build_registry(&ctx.config) {
        Ok(registry) => registry,
        Err(error) => {
            tracing::error!(%error, "cannot build endpoint registry");
            exit(1);
        }
    };

    let app = Arc::new(App { ctx, registry });

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, %addr, "cannot bind listener");
            exit(1);
        }
    };

    tracing::info!(%addr, version = env!("CARGO_PKG_VERSION"), "drydock listening");

    tokio::spawn(background::run_tasks(Arc::clone(&app)));

    if let Err(error) = axum::serve(listener, create_app(app)).await {
        tracing::error!(%error, "server terminated");
        exit(1);
    }
}
