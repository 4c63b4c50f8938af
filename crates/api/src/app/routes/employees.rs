use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use staffroll_core::EmployeeId;
use staffroll_employees::Employee;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route(
            "/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
}

/// `Location` of the get-by-id resource for `id`.
pub fn employee_location(id: EmployeeId) -> String {
    format!("/employees/{id}")
}

pub async fn list_employees(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.list().await {
        Ok(employees) => (StatusCode::OK, Json(employees)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<EmployeeId>,
) -> axum::response::Response {
    match services.get(id).await {
        Ok(employee) => (StatusCode::OK, Json(employee)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Employee>,
) -> axum::response::Response {
    let created = match services.create(body).await {
        Ok(c) => c,
        Err(e) => return errors::service_error_to_response(e),
    };

    (
        StatusCode::CREATED,
        [(header::LOCATION, employee_location(created.id))],
        Json(created),
    )
        .into_response()
}

pub async fn update_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<EmployeeId>,
    Json(body): Json<Employee>,
) -> axum::response::Response {
    match services.update(id, body).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<EmployeeId>,
) -> axum::response::Response {
    match services.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
