use axum::{Router, routing::any};

use crate::app::errors::ApiError;

pub mod employees;
pub mod manager;

/// Every route accepts any method; the authorizer decides which verbs apply.
/// A single trailing slash is accepted on each path.
pub fn router() -> Router {
    Router::new()
        .route("/employees", any(employees::collection))
        .route("/employees/", any(employees::collection))
        .route("/employees/:id", any(employees::item))
        .route("/employees/:id/", any(employees::item))
        .route("/manager", any(manager::without_id))
        .route("/manager/", any(manager::without_id))
        .route("/manager/:id", any(manager::team))
        .route("/manager/:id/", any(manager::team))
        .fallback(not_found)
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Resource not found")
}
