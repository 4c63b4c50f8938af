//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store wiring and the employee operations
//! - `routes/`: HTTP routes + handlers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, ServiceError};

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
///
/// Any origin, header and method is allowed cross-origin.
pub fn build_app(services: Arc<AppServices>) -> Router {
    let resources = routes::router().layer(Extension(services));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(resources)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
