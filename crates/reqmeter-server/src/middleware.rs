//! Request interceptor feeding `HttpMetrics`.
//!
//! Per request: take `t0`, run the rest of the stack, then record method,
//! raw path, resulting status and elapsed seconds. Handlers are infallible
//! at this layer, so any downstream failure (rejection, 404, 5xx) arrives as
//! a response and is recorded with its status. The exposition path is passed
//! through unmeasured.
//!
//! Every distinct path becomes its own series. Cardinality is not capped.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;

use crate::app_state::AppState;

pub async fn track_http(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if req.uri().path() == state.metrics_path() {
        return next.run(req).await;
    }

    let method = req.method().as_str().to_owned();
    let endpoint = req.uri().path().to_owned();
    let t0 = Instant::now();

    let resp = next.run(req).await;

    let elapsed = t0.elapsed().as_secs_f64();
    let status = resp.status().as_u16();
    if let Err(e) = state
        .http_metrics()
        .record_request(&method, &endpoint, status, elapsed)
    {
        tracing::error!(error = %e, %method, %endpoint, status, "failed to record request metrics");
    }

    resp
}
