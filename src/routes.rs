use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, MatchedPath, Request},
    http::Method,
    routing::{get, post},
    Json,
    Router,
};
use data_model::BlobMetadata;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

mod download;
mod presign;
mod reference;
mod upload;
use download::download_blob;
use presign::presign_upload;
use reference::blob_reference;
use upload::upload_blob;

use crate::{
    gateway::BlobGateway,
    http_objects::{
        ApiError,
        PresignUploadRequest,
        PresignUploadResponse,
        ReferenceRequest,
        ReferenceResponse,
    },
    metrics::ApiMetrics,
};

#[derive(OpenApi)]
#[openapi(
        paths(
            upload::upload_blob,
            presign::presign_upload,
            reference::blob_reference,
            download::download_blob,
        ),
        components(
            schemas(
                ApiError,
                BlobMetadata,
                PresignUploadRequest,
                PresignUploadResponse,
                ReferenceRequest,
                ReferenceResponse,
            )
        ),
        tags(
            (name = "depot", description = "Depot blob gateway API")
        )
    )]

struct ApiDoc;

#[derive(Clone)]
pub struct RouteState {
    pub gateway: BlobGateway,
    pub metrics: Arc<ApiMetrics>,
}

pub fn create_routes(route_state: RouteState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/docs/openapi.json", get(openapi_spec))
        .route(
            "/blob/upload/{namespace}/{key}",
            post(upload_blob).with_state(route_state.clone()),
        )
        .route(
            "/blob/presign",
            post(presign_upload).with_state(route_state.clone()),
        )
        .route(
            "/blob/reference",
            post(blob_reference).with_state(route_state.clone()),
        )
        .route(
            "/blob/download/{namespace}/{key}",
            get(download_blob).with_state(route_state.clone()),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    let method = req.method();
                    let uri = req.uri();

                    let matched_path = req
                        .extensions()
                        .get::<MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::debug_span!("request", %method, %uri, matched_path)
                })
                .on_failure(()),
        )
        .layer(cors)
        .layer(DefaultBodyLimit::max(usize::MAX))
}

async fn index() -> &'static str {
    "Depot Server"
}

async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
