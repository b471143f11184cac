//! HTTP API application wiring (Axum router + middleware stack).
//!
//! - `services.rs`: store wiring (in-memory or Postgres)
//! - `routes/`: HTTP handlers (one file per resource)
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: error → JSON response mapping

use std::sync::Arc;

use axum::{Extension, Router, middleware::{from_fn, from_fn_with_state}};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
///
/// Layer order, outermost first: request tracing, authentication, services.
pub fn build_app(services: AppServices) -> Router {
    let services = Arc::new(services);

    routes::router().layer(
        ServiceBuilder::new()
            .layer(from_fn(middleware::trace_middleware))
            .layer(from_fn_with_state(services.clone(), middleware::auth_middleware))
            .layer(Extension(services)),
    )
}
