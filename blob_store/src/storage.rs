use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::{stream::BoxStream, Stream, StreamExt};
use object_store::{
    aws::AmazonS3Builder,
    parse_url,
    path::Path,
    Attribute,
    Attributes,
    ObjectStore,
    ObjectStoreScheme,
    PutMultipartOpts,
    WriteMultipart,
};
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use url::Url;

use crate::{BlobError, BlobResult, BlobStoreConfig};

#[derive(Debug, Clone)]
pub struct PutResult {
    pub size_bytes: u64,
    pub sha256_hash: String,
}

/// Builds the object store client for a configured location.
pub(crate) fn build_object_store(
    config: &BlobStoreConfig,
) -> BlobResult<(Arc<dyn ObjectStore>, Path, ObjectStoreScheme)> {
    let url = Url::parse(&config.path).map_err(|err| BlobError::InvalidUri {
        uri: config.path.clone(),
        reason: err.to_string(),
    })?;
    let (scheme, path) = ObjectStoreScheme::parse(&url).map_err(object_store::Error::from)?;
    let object_store: Arc<dyn ObjectStore> = match scheme {
        ObjectStoreScheme::AmazonS3 => {
            let mut builder = AmazonS3Builder::from_env().with_url(url.as_str());
            if let Some(region) = &config.region {
                builder = builder.with_region(region);
            }
            Arc::new(builder.build()?)
        }
        _ => {
            let (store, _) = parse_url(&url)?;
            Arc::from(store)
        }
    };
    Ok((object_store, path, scheme))
}

/// Streaming reads and writes against one physical object store.
#[derive(Clone)]
pub struct BlobStorage {
    object_store: Arc<dyn ObjectStore>,
    base: Path,
}

impl BlobStorage {
    pub fn new(config: &BlobStoreConfig) -> BlobResult<Self> {
        let (object_store, base, _) = build_object_store(config)?;
        Ok(Self { object_store, base })
    }

    pub(crate) fn from_parts(object_store: Arc<dyn ObjectStore>, base: Path) -> Self {
        Self { object_store, base }
    }

    /// The key is treated as a single opaque path segment, so separators or
    /// percent signs inside it never change the object's location.
    fn object_path(&self, key: &str) -> Path {
        self.base.child(key)
    }

    /// Streams a payload into the store under `key`, hashing as it goes.
    /// The multipart upload is only opened once the first non-empty chunk
    /// arrives; an empty payload never creates an object.
    pub async fn put(
        &self,
        key: &str,
        content_type: &str,
        mut data: impl Stream<Item = BlobResult<Bytes>> + Send + Unpin,
    ) -> BlobResult<PutResult> {
        let mut first = None;
        while let Some(chunk) = data.next().await {
            let chunk = chunk?;
            if !chunk.is_empty() {
                first = Some(chunk);
                break;
            }
        }
        let Some(first) = first else {
            return Err(BlobError::EmptyPayload);
        };

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());

        let path = self.object_path(key);
        let upload = self
            .object_store
            .put_multipart_opts(&path, PutMultipartOpts::from(attributes))
            .await?;
        let mut writer = WriteMultipart::new(upload);
        let mut hasher = Sha256::new();
        let mut size_bytes = 0u64;

        hasher.update(&first);
        size_bytes += first.len() as u64;
        writer.write(&first);

        while let Some(chunk) = data.next().await {
            writer.wait_for_capacity(1).await?;
            let chunk = chunk?;
            hasher.update(&chunk);
            size_bytes += chunk.len() as u64;
            writer.write(&chunk);
        }
        writer.finish().await?;

        Ok(PutResult {
            size_bytes,
            sha256_hash: format!("{:x}", hasher.finalize()),
        })
    }

    /// Opens the object under `key` and bridges its chunks through a channel
    /// so the read outlives this call.
    pub async fn get(&self, key: &str) -> BlobResult<BoxStream<'static, BlobResult<Bytes>>> {
        let path = self.object_path(key);
        let get_result = self.object_store.get(&path).await?;
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut stream = get_result.into_stream();
            while let Some(chunk) = stream.next().await {
                if tx.send(chunk.map_err(BlobError::from)).is_err() {
                    break;
                }
            }
        });
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    pub async fn exists(&self, key: &str) -> BlobResult<bool> {
        match self.object_store.head(&self.object_path(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn read_bytes(&self, key: &str) -> BlobResult<Bytes> {
        let mut reader = self.get(key).await?;
        let mut bytes = BytesMut::new();
        while let Some(chunk) = reader.next().await {
            bytes.extend_from_slice(&chunk?);
        }
        Ok(bytes.into())
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;

    fn test_storage(dir: &tempfile::TempDir) -> BlobStorage {
        let config = BlobStoreConfig::new(format!("file://{}", dir.path().display()));
        BlobStorage::new(&config).unwrap()
    }

    fn byte_stream(
        chunks: Vec<&'static [u8]>,
    ) -> impl Stream<Item = BlobResult<Bytes>> + Send + Unpin {
        stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok(Bytes::from_static(c)))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&dir);

        let result = storage
            .put("docs:readme.txt", "text/plain", byte_stream(vec![b"hello", b" world"]))
            .await
            .unwrap();
        assert_eq!(result.size_bytes, 11);
        assert_eq!(result.sha256_hash.len(), 64);

        let bytes = storage.read_bytes("docs:readme.txt").await.unwrap();
        assert_eq!(&bytes[..], b"hello world");
    }

    #[tokio::test]
    async fn test_empty_payload_rejected_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&dir);

        let err = storage
            .put("docs:empty", "text/plain", byte_stream(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::EmptyPayload));

        // A stream of empty chunks carries no payload either.
        let err = storage
            .put("docs:empty", "text/plain", byte_stream(vec![b"", b""]))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::EmptyPayload));

        assert!(!storage.exists("docs:empty").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&dir);

        let err = storage.get("docs:missing").await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_keys_with_separators_stay_opaque() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&dir);

        storage
            .put("ns:a/b:c", "application/octet-stream", byte_stream(vec![b"x"]))
            .await
            .unwrap();
        let bytes = storage.read_bytes("ns:a/b:c").await.unwrap();
        assert_eq!(&bytes[..], b"x");

        // The slash was encoded into the stored key, not treated as a
        // directory boundary.
        assert!(!storage.exists("ns:a").await.unwrap());
    }

    #[tokio::test]
    async fn test_stream_error_aborts_before_completion() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&dir);

        let failing = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(BlobError::Stream {
                reason: "client disconnected".to_string(),
            }),
        ]);
        let err = storage
            .put("docs:broken", "text/plain", failing)
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::Stream { .. }));
    }

    #[test]
    fn test_invalid_store_uri() {
        let config = BlobStoreConfig::new("not a url");
        let err = BlobStorage::new(&config).unwrap_err();
        assert!(matches!(err, BlobError::InvalidUri { .. }));
    }
}
