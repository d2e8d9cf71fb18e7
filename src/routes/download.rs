use axum::{
    body::Body,
    extract::{Path, State},
    response::Response,
};
use data_model::encode_path_segment;
use opentelemetry::KeyValue;

use super::RouteState;
use crate::{http_objects::ApiError, metrics::Timer};

/// Stream a blob back to the caller
#[utoipa::path(
    get,
    path = "/blob/download/{namespace}/{key}",
    tag = "blobs",
    params(
        ("namespace" = String, Path, description = "Namespace the blob belongs to"),
        ("key" = String, Path, description = "Key of the blob within the namespace"),
    ),
    responses(
        (status = 200, description = "raw blob bytes"),
        (status = 400, description = "invalid identifier", body = ApiError),
        (status = 401, description = "rejected by the authorization layer in front of the gateway", body = ApiError),
        (status = 404, description = "no blob recorded, or object not yet available", body = ApiError),
        (status = INTERNAL_SERVER_ERROR, description = "unable to read blob", body = ApiError)
    ),
)]
pub async fn download_blob(
    State(state): State<RouteState>,
    Path((namespace, key)): Path<(String, String)>,
) -> Result<Response<Body>, ApiError> {
    let timer_kvs = &[KeyValue::new("op", "download")];
    let _timer = Timer::start_with_labels(&state.metrics.request_latency, timer_kvs);

    let download = state.gateway.download(&namespace, &key).await?;
    let metadata = download.metadata;

    state.metrics.downloads.add(1, &[]);
    state.metrics.download_bytes.add(metadata.size, &[]);

    Response::builder()
        .header("Content-Type", metadata.content_type)
        .header("Content-Length", metadata.size.to_string())
        .header(
            "Content-Disposition",
            format!(
                "attachment; filename=\"{}\"",
                encode_path_segment(&metadata.key)
            ),
        )
        .body(Body::from_stream(download.stream))
        .map_err(|e| ApiError::internal_error_str(&e.to_string()))
}
