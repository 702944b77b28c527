use std::net::SocketAddr;

use agent::api::routes;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use util::config;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("agent=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr: SocketAddr = match format!("{}:{}", config::agent_host(), config::agent_port()).parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Invalid agent address: {e}");
            std::process::exit(1);
        }
    };

    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on {}", addr);

    if let Err(e) = axum::serve(listener, routes()).await {
        tracing::error!(error = %e, "agent server error");
    }
}
