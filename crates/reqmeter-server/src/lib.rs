//! reqmeter service library entry.
//!
//! Wires the metrics engine from `reqmeter-core` into an axum service: config
//! loading, the request interceptor, the process sampler, and the exposition
//! endpoint. Consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod middleware;
pub mod obs;
pub mod ops;
pub mod router;
pub mod services;
