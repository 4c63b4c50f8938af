use axum::Router;

pub mod employees;
pub mod system;

/// Router for the resource endpoints.
pub fn router() -> Router {
    Router::new().nest("/employees", employees::router())
}
