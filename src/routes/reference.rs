use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use opentelemetry::KeyValue;

use super::RouteState;
use crate::{
    http_objects::{ApiError, ReferenceRequest, ReferenceResponse},
    metrics::Timer,
};

/// Resolve a blob to a stable download reference
#[utoipa::path(
    post,
    path = "/blob/reference",
    request_body = ReferenceRequest,
    tag = "blobs",
    responses(
        (status = 200, description = "reference resolved", body = ReferenceResponse),
        (status = 400, description = "invalid identifier or request body", body = ApiError),
        (status = 401, description = "rejected by the authorization layer in front of the gateway", body = ApiError),
        (status = 404, description = "no blob recorded under the key", body = ApiError),
        (status = INTERNAL_SERVER_ERROR, description = "unable to resolve reference", body = ApiError)
    ),
)]
pub async fn blob_reference(
    State(state): State<RouteState>,
    payload: Result<Json<ReferenceRequest>, JsonRejection>,
) -> Result<Json<ReferenceResponse>, ApiError> {
    let timer_kvs = &[KeyValue::new("op", "reference")];
    let _timer = Timer::start_with_labels(&state.metrics.request_latency, timer_kvs);

    let Json(request) = payload.map_err(|err| ApiError::bad_request(&err.body_text()))?;

    let reference = state
        .gateway
        .reference(&request.namespace, &request.key)
        .await?;

    Ok(Json(reference.into()))
}
