use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use blob_store::BlobError;
use data_model::{BlobMetadata, Visibility};
use futures::StreamExt;
use opentelemetry::KeyValue;

use super::RouteState;
use crate::{
    http_objects::{ApiError, UploadQuery},
    metrics::Timer,
};

/// Upload a blob in the request body
#[utoipa::path(
    post,
    path = "/blob/upload/{namespace}/{key}",
    request_body(content_type = "application/octet-stream", content = inline(String), description = "Raw blob bytes"),
    tag = "blobs",
    params(
        ("namespace" = String, Path, description = "Namespace the blob belongs to"),
        ("key" = String, Path, description = "Key of the blob within the namespace"),
        UploadQuery,
    ),
    responses(
        (status = 200, description = "blob stored", body = BlobMetadata),
        (status = 400, description = "invalid identifier or empty payload", body = ApiError),
        (status = 401, description = "rejected by the authorization layer in front of the gateway", body = ApiError),
        (status = INTERNAL_SERVER_ERROR, description = "unable to store blob", body = ApiError)
    ),
)]
pub async fn upload_blob(
    State(state): State<RouteState>,
    Path((namespace, key)): Path<(String, String)>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<BlobMetadata>, ApiError> {
    let timer_kvs = &[KeyValue::new("op", "upload")];
    let _timer = Timer::start_with_labels(&state.metrics.request_latency, timer_kvs);

    let content_type = headers
        .get("Content-Type")
        .and_then(|value| value.to_str().ok())
        .map(|s| s.to_string());

    let payload_stream = body.into_data_stream().map(|res| {
        res.map_err(|err| BlobError::Stream {
            reason: err.to_string(),
        })
    });

    let metadata = state
        .gateway
        .upload(
            &namespace,
            &key,
            content_type,
            Visibility::from_public_flag(query.is_public),
            payload_stream,
        )
        .await?;

    state.metrics.uploads.add(1, &[]);
    state.metrics.upload_bytes.add(metadata.size, &[]);

    Ok(Json(metadata))
}
