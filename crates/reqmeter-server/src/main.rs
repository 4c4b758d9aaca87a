//! reqmeter service
//!
//! - `/`, `/data/` : application endpoints (measured)
//! - `/healthz`    : liveness (measured)
//! - `/metrics`    : exposition (not measured)
//! - background sampler for process CPU time and RSS

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use reqmeter_server::{app_state, config, router};

const CONFIG_ENV: &str = "REQMETER_CONFIG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "reqmeter.yaml".to_string());
    let cfg = config::load_or_default(&path)?;
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .map_err(|e| format!("server.listen must be a valid SocketAddr: {e}"))?;

    let state = app_state::AppState::new(cfg)?;
    state.start_sampler();
    let app = router::build_router(state);

    tracing::info!(%listen, "reqmeter starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    axum::serve(listener, app).await?;
    Ok(())
}
