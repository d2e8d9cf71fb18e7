use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{config::Region, presigning::PresigningConfig, Client as S3Client};
use jiff::Timestamp;
use object_store::path::Path;

use crate::{BlobError, BlobResult};

/// Validity window of every signed upload URL. Fixed; expired URLs are
/// rejected by the object store itself.
pub const UPLOAD_URL_EXPIRY: Duration = Duration::from_secs(60 * 60);

/// A time-boxed URL a client can PUT bytes to without going through the
/// gateway.
#[derive(Debug, Clone)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: Timestamp,
}

/// Produces time-limited upload URLs scoped to a single object key,
/// content type and declared length.
#[async_trait]
pub trait UrlSigner: Send + Sync {
    async fn signed_upload_url(
        &self,
        key: &str,
        content_type: &str,
        size: u64,
    ) -> BlobResult<SignedUrl>;
}

/// Signs S3 PUT URLs with the credentials from the ambient AWS config.
pub struct S3UrlSigner {
    client: S3Client,
    bucket: String,
    base: Path,
}

impl S3UrlSigner {
    pub async fn from_store_url(url: &str, region: Option<String>) -> BlobResult<Self> {
        let (bucket, prefix) = parse_s3_url(url)?;
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let aws_config = loader.load().await;
        Ok(Self {
            client: S3Client::new(&aws_config),
            bucket,
            base: Path::from(prefix),
        })
    }

    /// Composes the full object key the same way the storage layer does, so
    /// the signed URL and a later gateway read target the same object.
    fn object_key(&self, key: &str) -> String {
        self.base.child(key).to_string()
    }
}

#[async_trait]
impl UrlSigner for S3UrlSigner {
    async fn signed_upload_url(
        &self,
        key: &str,
        content_type: &str,
        size: u64,
    ) -> BlobResult<SignedUrl> {
        let presigning_config =
            PresigningConfig::expires_in(UPLOAD_URL_EXPIRY).map_err(|err| BlobError::Presign {
                reason: format!("failed to create presigning config: {}", err),
            })?;
        let expires_at = Timestamp::now() + UPLOAD_URL_EXPIRY;
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .content_type(content_type)
            .content_length(size as i64)
            .presigned(presigning_config)
            .await
            .map_err(|err| BlobError::Presign {
                reason: format!("failed to generate presigned PUT URL: {}", err),
            })?;
        Ok(SignedUrl {
            url: presigned.uri().to_string(),
            expires_at,
        })
    }
}

/// Hands out plain file URLs for filesystem-backed stores. Only meaningful
/// when the client shares the gateway's filesystem, which is the local
/// deployment this store backing is for.
pub struct LocalUrlSigner {
    base_url: String,
}

impl LocalUrlSigner {
    pub fn new(store_url: &str) -> Self {
        Self {
            base_url: store_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl UrlSigner for LocalUrlSigner {
    async fn signed_upload_url(
        &self,
        key: &str,
        _content_type: &str,
        _size: u64,
    ) -> BlobResult<SignedUrl> {
        let encoded = Path::from("").child(key);
        Ok(SignedUrl {
            url: format!("{}/{}", self.base_url, encoded),
            expires_at: Timestamp::now() + UPLOAD_URL_EXPIRY,
        })
    }
}

fn parse_s3_url(url: &str) -> BlobResult<(String, String)> {
    let without_scheme = url.strip_prefix("s3://").ok_or_else(|| BlobError::InvalidUri {
        uri: url.to_string(),
        reason: "must start with s3://".to_string(),
    })?;
    let mut parts = without_scheme.splitn(2, '/');
    let bucket = parts.next().unwrap_or_default().to_string();
    if bucket.is_empty() {
        return Err(BlobError::InvalidUri {
            uri: url.to_string(),
            reason: "missing bucket".to_string(),
        });
    }
    let prefix = parts
        .next()
        .map(|p| p.trim_end_matches('/').to_string())
        .unwrap_or_default();
    Ok((bucket, prefix))
}
