use std::{fmt, sync::Arc};

use blob_store::{BlobError, BlobResult, BlobStoreSet, SignedUrl};
use bytes::Bytes;
use data_model::{
    BlobKey,
    BlobMetadata,
    InvalidIdentifier,
    Visibility,
    DEFAULT_CONTENT_TYPE,
};
use futures::{stream::BoxStream, Stream};
use jiff::Timestamp;
use metadata_store::MetadataStore;
use tracing::{info, warn};

/// Everything the blob API can fail with. The HTTP layer maps each variant
/// to a status and numeric code; nothing is swallowed or retried here.
#[derive(Debug)]
pub enum GatewayError {
    InvalidIdentifier(String),
    EmptyPayload,
    InvalidRequest(String),
    /// No metadata record for the blob.
    BlobNotFound { key: String },
    /// Metadata exists but the bytes are absent: an orphaned record, or a
    /// presigned upload that has not landed yet.
    ObjectNotFound { key: String },
    SigningUnavailable,
    StorageUnavailable(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::InvalidIdentifier(message) => write!(f, "{}", message),
            GatewayError::EmptyPayload => write!(f, "payload must not be empty"),
            GatewayError::InvalidRequest(message) => write!(f, "{}", message),
            GatewayError::BlobNotFound { key } => write!(f, "blob not found: {}", key),
            GatewayError::ObjectNotFound { key } => {
                write!(f, "object not yet available: {}", key)
            }
            GatewayError::SigningUnavailable => {
                write!(f, "presigned uploads are not configured for this store")
            }
            GatewayError::StorageUnavailable(message) => {
                write!(f, "storage unavailable: {}", message)
            }
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<InvalidIdentifier> for GatewayError {
    fn from(err: InvalidIdentifier) -> Self {
        GatewayError::InvalidIdentifier(err.to_string())
    }
}

impl From<BlobError> for GatewayError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::NotFound { key } => GatewayError::ObjectNotFound { key },
            BlobError::EmptyPayload => GatewayError::EmptyPayload,
            BlobError::SigningUnavailable => GatewayError::SigningUnavailable,
            err => GatewayError::StorageUnavailable(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for GatewayError {
    fn from(err: anyhow::Error) -> Self {
        GatewayError::StorageUnavailable(format!("{:#}", err))
    }
}

/// A resolved download: the authoritative metadata plus the byte stream.
pub struct BlobDownload {
    pub metadata: BlobMetadata,
    pub stream: BoxStream<'static, BlobResult<Bytes>>,
}

impl fmt::Debug for BlobDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobDownload")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// A stable gateway-relative locator plus the metadata it resolves to.
#[derive(Debug)]
pub struct BlobReference {
    pub url: String,
    pub metadata: BlobMetadata,
}

/// Coordinates the two backing stores for the three blob paths: direct
/// upload, presigned upload, and retrieval.
///
/// There is no transaction spanning the stores. Direct uploads write bytes
/// strictly before metadata, presigned uploads write metadata strictly
/// before handing out the URL, and concurrent writers to the same key are
/// last-write-wins at both stores.
#[derive(Clone)]
pub struct BlobGateway {
    stores: Arc<BlobStoreSet>,
    metadata: MetadataStore,
}

impl BlobGateway {
    pub fn new(stores: BlobStoreSet, metadata: MetadataStore) -> Self {
        Self {
            stores: Arc::new(stores),
            metadata,
        }
    }

    /// Streams a payload into the visibility-selected store, then records
    /// the metadata. A crash in between leaves an orphaned object, never a
    /// record pointing at missing bytes.
    pub async fn upload(
        &self,
        namespace: &str,
        key: &str,
        content_type: Option<String>,
        visibility: Visibility,
        payload: impl Stream<Item = BlobResult<Bytes>> + Send + Unpin,
    ) -> Result<BlobMetadata, GatewayError> {
        let blob_key = BlobKey::new(namespace, key)?;
        let content_type = content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let put_result = self
            .stores
            .store(visibility)
            .storage()
            .put(&blob_key.storage_key(), &content_type, payload)
            .await?;

        let metadata = BlobMetadata {
            namespace: blob_key.namespace().to_string(),
            key: blob_key.key().to_string(),
            size: put_result.size_bytes,
            content_type,
            uploaded_at: Timestamp::now(),
            is_public: visibility.is_public(),
        };
        self.metadata
            .put(&blob_key.metadata_key(), &metadata)
            .await?;

        info!(
            blob = %blob_key,
            %visibility,
            size = put_result.size_bytes,
            sha256 = %put_result.sha256_hash,
            "stored blob",
        );
        Ok(metadata)
    }

    /// Issues a time-boxed upload URL and writes the provisional metadata
    /// record before the URL leaves the gateway, so a racing retrieval sees
    /// a record with absent bytes rather than no record.
    ///
    /// The declared size and content type are trusted as-is; the gateway
    /// never observes the client's direct upload.
    pub async fn presign_upload(
        &self,
        namespace: &str,
        key: &str,
        content_type: Option<String>,
        size: i64,
        visibility: Visibility,
    ) -> Result<SignedUrl, GatewayError> {
        let blob_key = BlobKey::new(namespace, key)?;
        if size <= 0 {
            return Err(GatewayError::InvalidRequest(
                "size must be a positive integer".to_string(),
            ));
        }
        let size = size as u64;
        let content_type = content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let signer = self.stores.store(visibility).signer()?;
        let signed = signer
            .signed_upload_url(&blob_key.storage_key(), &content_type, size)
            .await?;

        let metadata = BlobMetadata {
            namespace: blob_key.namespace().to_string(),
            key: blob_key.key().to_string(),
            size,
            content_type,
            uploaded_at: Timestamp::now(),
            is_public: visibility.is_public(),
        };
        self.metadata
            .put(&blob_key.metadata_key(), &metadata)
            .await?;

        info!(
            blob = %blob_key,
            %visibility,
            declared_size = size,
            expires_at = %signed.expires_at,
            "issued presigned upload url",
        );
        Ok(signed)
    }

    /// Resolves a blob to a stable download locator. The locator carries no
    /// expiry; whatever access control fronts the gateway governs it.
    pub async fn reference(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<BlobReference, GatewayError> {
        let blob_key = BlobKey::new(namespace, key)?;
        let metadata = self
            .metadata
            .get(&blob_key.metadata_key())
            .await?
            .ok_or_else(|| GatewayError::BlobNotFound {
                key: blob_key.to_string(),
            })?;
        Ok(BlobReference {
            url: blob_key.download_path(),
            metadata,
        })
    }

    /// Resolves metadata, then opens the byte stream from the store the
    /// record's visibility selects. Size and content type are served from
    /// the record, never re-measured from the stream.
    pub async fn download(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<BlobDownload, GatewayError> {
        let blob_key = BlobKey::new(namespace, key)?;
        let Some(metadata) = self.metadata.get(&blob_key.metadata_key()).await? else {
            return Err(GatewayError::BlobNotFound {
                key: blob_key.to_string(),
            });
        };

        let storage = self.stores.store(metadata.visibility()).storage();
        let stream = match storage.get(&blob_key.storage_key()).await {
            Ok(stream) => stream,
            Err(BlobError::NotFound { .. }) => {
                warn!(blob = %blob_key, "metadata present but object missing");
                return Err(GatewayError::ObjectNotFound {
                    key: blob_key.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        Ok(BlobDownload { metadata, stream })
    }
}
