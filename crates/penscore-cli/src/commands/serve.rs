//! Serve command - run the web application.

use clap::Args;
use console::style;
use tokio::net::TcpListener;
use tracing::info;

use crate::web::{router, AppState};

use super::config::{load_or_default, resolve_path};

#[derive(Args)]
pub struct ServeArgs {
    /// Interface to bind (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_or_default(&resolve_path(config_path))?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let addr = config.bind_addr();
    let state = AppState::open(config)?;
    let listener = TcpListener::bind(&addr).await?;

    info!("Listening on http://{}", addr);
    println!("{} Serving on http://{}", style("✓").green(), addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
