//! API-side authorization guard.
//!
//! Called by every handler before it touches a store; bridges the decision
//! function to the request's `Identity` and the configured ownership lookup.

use tracing::warn;

use roster_auth::{AccessRequest, Identity, authorize_with};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub async fn require(
    services: &AppServices,
    identity: &Identity,
    request: AccessRequest,
) -> Result<(), ApiError> {
    let decision = authorize_with(identity, &request, services.ownership.as_ref()).await?;

    decision.into_result().map_err(|e| {
        warn!(
            role = %identity.role(),
            verb = ?request.verb,
            target = ?request.target,
            reason = %e.reason(),
            "request denied"
        );
        ApiError::from(e)
    })
}
