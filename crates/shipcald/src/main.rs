//! shipcald — the shipcal daemon.
//!
//! Single binary that assembles the shipcal backend:
//! - State store (redb)
//! - REST API (calendar windows, deployment facts)
//!
//! # Usage
//!
//! ```text
//! shipcald serve --port 8400 --data-dir /var/lib/shipcal
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "shipcald", about = "shipcal daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API server.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "8400")]
        port: u16,

        /// Data directory for persistent state.
        #[arg(long, default_value = "/var/lib/shipcal")]
        data_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,shipcald=debug,shipcal=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port, data_dir } => run_serve(port, data_dir).await,
    }
}

async fn run_serve(port: u16, data_dir: PathBuf) -> anyhow::Result<()> {
    info!("shipcal daemon starting");

    // Ensure data directory exists.
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("shipcal.redb");

    let state = shipcal_state::StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    let router = shipcal_api::build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
    });

    server.await?;

    info!("shipcal daemon stopped");
    Ok(())
}
