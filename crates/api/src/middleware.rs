use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, info, info_span};

use roster_auth::{AuthError, authenticate};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::RequestId;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Resolve the bearer credential and attach the caller's `Identity`.
///
/// Runs in front of routing, so unknown paths are authenticated too.
pub async fn auth_middleware(
    State(services): State<Arc<AppServices>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = authorization_header(req.headers())?;
    let identity = authenticate(header.as_deref(), services.credentials.as_ref()).await?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// A header that is present but not visible ASCII is malformed, not missing.
fn authorization_header(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    headers
        .get(AUTHORIZATION)
        .map(|value| {
            value
                .to_str()
                .map(str::to_owned)
                .map_err(|_| ApiError::Auth(AuthError::MalformedCredential))
        })
        .transpose()
}

/// Wrap each request in a span with a fresh request id and log its outcome.
pub async fn trace_middleware(mut req: Request, next: Next) -> Response {
    let request_id = RequestId::new();
    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    req.extensions_mut().insert(request_id);

    let started = Instant::now();
    let mut response = next.run(req).instrument(span.clone()).await;

    span.in_scope(|| {
        info!(
            status = response.status().as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "request completed"
        )
    });

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
