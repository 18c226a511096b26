use anyhow::Result;
use axum::Router;
use solar_site_analyzer::{api, config, pipeline, telemetry};
use config::Config;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;

    if cfg.ai.enabled && cfg.ai.api_key.is_empty() {
        warn!(
            "AI analysis enabled but no API key configured - falling back to \
            rule-based recommendations. Set SSA__AI__API_KEY to enable it."
        );
    }

    let app_state = pipeline::AppState::new(cfg.clone())?;

    let app: Router = api::router(app_state, &cfg);

    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!(
            "WARNING: Server binding to 0.0.0.0 - service will be accessible from network! \
            For production, bind to 127.0.0.1 unless behind a firewall/reverse proxy."
        );
    }

    info!(%addr, "starting Solar Site Analyzer");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
