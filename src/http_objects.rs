use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use data_model::BlobMetadata;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::gateway::{BlobReference, GatewayError};

/// Error body returned by every failing endpoint: a numeric code matching
/// the HTTP status plus a human-readable message. Success responses never
/// carry these fields.
#[derive(Debug, ToSchema, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(skip)]
    status_code: StatusCode,
    code: u16,
    message: String,
}

impl ApiError {
    pub fn new(status_code: StatusCode, message: &str) -> Self {
        Self {
            status_code,
            code: status_code.as_u16(),
            message: message.to_string(),
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal_error_str(message: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("API Error: {} - {}", self.status_code, self.message);
        let status_code = self.status_code;
        (status_code, Json(self)).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let status_code = match &err {
            GatewayError::InvalidIdentifier(_)
            | GatewayError::EmptyPayload
            | GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::BlobNotFound { .. } | GatewayError::ObjectNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            GatewayError::SigningUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::StorageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::new(status_code, &err.to_string())
    }
}

/// Query parameters for direct upload.
#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    /// Store the blob in the public store. Defaults to private.
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignUploadRequest {
    pub namespace: String,
    pub key: String,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Declared payload size in bytes. Must be positive.
    pub size: i64,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignUploadResponse {
    pub upload_url: String,
    #[schema(value_type = String)]
    pub expires_at: Timestamp,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReferenceRequest {
    pub namespace: String,
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReferenceResponse {
    pub url: String,
    pub metadata: BlobMetadata,
}

impl From<BlobReference> for ReferenceResponse {
    fn from(reference: BlobReference) -> Self {
        Self {
            url: reference.url,
            metadata: reference.metadata,
        }
    }
}
