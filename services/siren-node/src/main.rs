use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use siren_stream::websocket::WsServer;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing::{error, info};

mod config;
mod handlers;
mod logging;
mod state;

use config::{Config, LogFormat};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;
    match config.log_format {
        LogFormat::Json => logging::init_json(),
        LogFormat::Text => logging::init(),
    }

    let state = Arc::new(AppState::new(config.clone()).map_err(|e| anyhow::anyhow!("{e}"))?);

    let ws_addr: SocketAddr = format!("{}:{}", config.host, config.ws_port).parse()?;
    let ws_server = Arc::new(WsServer::new(ws_addr, state.distributor.clone()));
    tokio::spawn(async move {
        if let Err(e) = ws_server.run().await {
            error!("subscription endpoint failed: {e}");
        }
    });

    let app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/alerts", post(handlers::submit_alert).get(handlers::list_alerts))
        .route("/alerts/:id/cancel", post(handlers::cancel_alert))
        .route("/alerts/:id/status", post(handlers::update_status))
        .route("/alerts/:id/assign", post(handlers::assign_alert))
        .route("/alerts/:id/transitions", get(handlers::alert_transitions))
        .route("/profiles", axum::routing::put(handlers::upsert_profile))
        .route("/units/:id/availability", post(handlers::set_unit_availability))
        .with_state(state)
        .layer(ServiceBuilder::new().into_inner());

    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("siren-node listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
