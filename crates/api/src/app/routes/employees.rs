use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Extension, Path, Query, rejection::PathRejection},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::info;

use roster_auth::{AccessRequest, AuthzError, Identity, Verb};
use roster_core::EmployeeId;

use crate::app::dto::{self, CreatedResponse, EmployeeBody, EmployeeView, MessageResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz;

const EMPLOYEE_NOT_FOUND: &str = "Employee not found";

/// `/employees`
pub async fn collection(
    method: Method,
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let verb = Verb::from(method.as_str());
    authz::require(&services, &identity, AccessRequest::employees(verb, None)).await?;

    match verb {
        Verb::Get => {
            let limit = dto::parse_limit(query.get("limit").map(String::as_str));
            let rows = services.employees.list(limit).await?;
            Ok(Json(dto::employee_views(rows)).into_response())
        }
        Verb::Post => create(&services, &body).await,
        // Denied by the authorizer before reaching here.
        Verb::Put | Verb::Delete | Verb::Other => Err(AuthzError::MethodNotAllowed.into()),
    }
}

/// `/employees/{id}`
pub async fn item(
    method: Method,
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    path: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let verb = Verb::from(method.as_str());
    // The role gate runs before a bad id is reported.
    let id = path
        .map_err(ApiError::from)
        .and_then(|Path(raw)| raw.parse::<EmployeeId>().map_err(ApiError::from));
    let target = id.as_ref().ok().copied();
    authz::require(&services, &identity, AccessRequest::employee_item(verb, target)).await?;
    let id = id?;

    match verb {
        Verb::Get => {
            let employee = services
                .employees
                .get(id)
                .await?
                .ok_or(ApiError::NotFound(EMPLOYEE_NOT_FOUND))?;
            Ok(Json(EmployeeView::from(employee)).into_response())
        }
        // Creation ignores a path id; the store assigns one.
        Verb::Post => create(&services, &body).await,
        Verb::Put => {
            let changes = EmployeeBody::parse(&body)?.into_changes()?;
            if !services.employees.update(id, &changes).await? {
                return Err(ApiError::NotFound(EMPLOYEE_NOT_FOUND));
            }
            info!(employee_id = %id, role = %identity.role(), "employee updated");
            Ok(Json(MessageResponse {
                message: "Employee updated",
            })
            .into_response())
        }
        Verb::Delete => {
            if !services.employees.delete(id).await? {
                return Err(ApiError::NotFound(EMPLOYEE_NOT_FOUND));
            }
            info!(employee_id = %id, "employee deleted");
            Ok(Json(MessageResponse {
                message: "Employee deleted",
            })
            .into_response())
        }
        Verb::Other => Err(AuthzError::MethodNotAllowed.into()),
    }
}

async fn create(services: &AppServices, body: &[u8]) -> Result<Response, ApiError> {
    let new = EmployeeBody::parse(body)?.into_new_employee()?;
    let employee_id = services.employees.create(new).await?;
    info!(%employee_id, "employee created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Employee created",
            employee_id,
        }),
    )
        .into_response())
}
