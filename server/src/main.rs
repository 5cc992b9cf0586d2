// Tradewire event distribution server
use std::net::SocketAddr;

use dotenvy::dotenv;
use tracing::info;

use tradewire_common::Config;
use tradewire_server::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "tradewire_server=info,axum=info".to_string()),
        )
        .init();

    info!("Starting Tradewire event server v{}", env!("CARGO_PKG_VERSION"));

    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    let prometheus = recorder.handle();
    metrics::set_global_recorder(recorder)
        .expect("Failed to install Prometheus metrics recorder");

    let config = Config::from_env();
    let (state, shutdown_tx) = AppState::new(config);
    let app = build_router(state.with_prometheus(prometheus));

    let port = std::env::var("TRADEWIRE_PORT")
        .unwrap_or_else(|_| "3900".to_string())
        .parse::<u16>()
        .unwrap_or(3900);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Tradewire server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received, draining connections");
        let _ = shutdown_tx.send(true);
    })
    .await?;

    Ok(())
}
