use std::net::SocketAddr;

use auctions::{make_router, run_app};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let addr = std::env::var("BIND_ADDR")
        .ok()
        .and_then(|addr| addr.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3001)));
    let router = make_router();
    info!("Server started on {}", addr);
    if let Err(error) = run_app(router, addr).await {
        error!("Error: {}", error);
    }
}
