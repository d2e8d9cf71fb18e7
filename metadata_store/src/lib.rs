use std::sync::Arc;

use anyhow::{Context, Result};
use data_model::BlobMetadata;
use object_store::parse_url;
use slatedb::DbBuilder;
use tracing::info;
use url::Url;

/// Key-value store holding one JSON-encoded [`BlobMetadata`] record per
/// metadata key. Existence of a record here is the authoritative signal
/// that a blob exists; no other component writes to this store.
///
/// Writes are last-write-wins. There are no conditional writes and no
/// transactions spanning this store and the object stores.
#[derive(Clone)]
pub struct MetadataStore {
    db: Arc<slatedb::Db>,
}

impl MetadataStore {
    /// Opens (or creates) the store at a URL-addressed location, e.g.
    /// `file:///var/depot/metadata` or `s3://bucket/depot/metadata`.
    pub async fn open(path: &str) -> Result<Self> {
        let url = Url::parse(path).with_context(|| format!("invalid metadata store url {}", path))?;
        let (object_store, store_path) =
            parse_url(&url).context("error building metadata object store")?;
        let db = DbBuilder::new(store_path, Arc::from(object_store))
            .build()
            .await
            .context("error opening metadata store")?;
        info!(path, "opened metadata store");
        Ok(Self { db: Arc::new(db) })
    }

    pub async fn put(&self, key: &str, metadata: &BlobMetadata) -> Result<()> {
        let value = serde_json::to_vec(metadata).context("error encoding blob metadata")?;
        self.db
            .put(key.as_bytes(), &value)
            .await
            .context("error writing blob metadata")?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<BlobMetadata>> {
        let value = self
            .db
            .get(key.as_bytes())
            .await
            .context("error reading blob metadata")?;
        match value {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).context("error decoding blob metadata")?,
            )),
            None => Ok(None),
        }
    }

    /// Flushes and closes the store. Called once on graceful shutdown.
    pub async fn close(&self) -> Result<()> {
        self.db.flush().await?;
        self.db.close().await?;
        Ok(())
    }
}
