use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use crate::app::services::ServiceError;

/// Client errors (400/404) carry no body; server faults carry a JSON error.
pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND.into_response(),
        ServiceError::Invalid(e) => {
            tracing::debug!("rejected request: {e}");
            StatusCode::BAD_REQUEST.into_response()
        }
        ServiceError::UnresolvedConflict(id) => {
            tracing::error!(%id, "unresolved concurrency conflict");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "conflict",
                format!("employee {id} was modified concurrently"),
            )
        }
        ServiceError::Store(e) => {
            tracing::error!("store failure: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
