use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::PathRejection},
    http::Method,
};

use roster_auth::{AccessRequest, Identity, Verb};
use roster_core::OwnerKey;

use crate::app::dto::{self, EmployeeView};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz;

/// `/manager` with no id. Rejected before any role check.
pub async fn without_id() -> ApiError {
    ApiError::ManagerIdRequired
}

/// `/manager/{id}`: the employees whose `manager_id` is `id`.
pub async fn team(
    method: Method,
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<EmployeeView>>, ApiError> {
    let verb = Verb::from(method.as_str());
    authz::require(&services, &identity, AccessRequest::manager_team(verb)).await?;
    let Path(manager) = path?;

    let rows = services
        .employees
        .list_by_manager(&OwnerKey::new(manager))
        .await?;
    Ok(Json(dto::employee_views(rows)))
}
