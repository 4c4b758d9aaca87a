//! Axum router wiring.
//!
//! Every route sits behind the metrics interceptor; the interceptor itself
//! skips the exposition path.

use axum::{middleware, routing::get, Router};

use crate::{app_state::AppState, middleware::track_http, ops, services};

pub fn build_router(state: AppState) -> Router {
    let metrics_path = state.metrics_path().to_owned();

    Router::new()
        .route("/", get(services::root))
        .route("/data/", get(services::get_data).post(services::post_data))
        .route("/healthz", get(ops::healthz))
        .route(&metrics_path, get(ops::metrics))
        .fallback(ops::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), track_http))
        .with_state(state)
}
