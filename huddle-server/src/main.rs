use clap::Parser;
use huddle_server::{AppState, ServerConfig, logging, router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let config = ServerConfig::parse();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(AppState::from_config(&config))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(config.bind).await?;
    info!("Signaling server listening on http://{}", config.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
