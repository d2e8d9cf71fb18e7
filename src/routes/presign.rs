use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use data_model::Visibility;
use opentelemetry::KeyValue;

use super::RouteState;
use crate::{
    http_objects::{ApiError, PresignUploadRequest, PresignUploadResponse},
    metrics::Timer,
};

/// Create a presigned upload URL for a blob
#[utoipa::path(
    post,
    path = "/blob/presign",
    request_body = PresignUploadRequest,
    tag = "blobs",
    responses(
        (status = 200, description = "presigned upload url issued", body = PresignUploadResponse),
        (status = 400, description = "invalid identifier or request body", body = ApiError),
        (status = 401, description = "rejected by the authorization layer in front of the gateway", body = ApiError),
        (status = 503, description = "store does not support presigned uploads", body = ApiError),
        (status = INTERNAL_SERVER_ERROR, description = "unable to issue presigned url", body = ApiError)
    ),
)]
pub async fn presign_upload(
    State(state): State<RouteState>,
    payload: Result<Json<PresignUploadRequest>, JsonRejection>,
) -> Result<Json<PresignUploadResponse>, ApiError> {
    let timer_kvs = &[KeyValue::new("op", "presign")];
    let _timer = Timer::start_with_labels(&state.metrics.request_latency, timer_kvs);

    let Json(request) = payload.map_err(|err| ApiError::bad_request(&err.body_text()))?;

    let signed = state
        .gateway
        .presign_upload(
            &request.namespace,
            &request.key,
            request.content_type,
            request.size,
            Visibility::from_public_flag(request.is_public),
        )
        .await?;

    state.metrics.presigned_uploads.add(1, &[]);

    Ok(Json(PresignUploadResponse {
        upload_url: signed.url,
        expires_at: signed.expires_at,
    }))
}
