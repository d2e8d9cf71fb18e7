mod config;
mod error;
mod signer;
mod storage;

use std::sync::Arc;

use data_model::Visibility;
use object_store::ObjectStoreScheme;
use tracing::info;

pub use crate::{
    config::BlobStoreConfig,
    error::{BlobError, BlobResult},
    signer::{LocalUrlSigner, S3UrlSigner, SignedUrl, UrlSigner, UPLOAD_URL_EXPIRY},
    storage::{BlobStorage, PutResult},
};

/// One physical object store plus its optional URL signer.
pub struct BlobStore {
    storage: BlobStorage,
    signer: Option<Arc<dyn UrlSigner>>,
}

impl BlobStore {
    /// Builds the store for a configured location. S3 locations get a
    /// presigning client; filesystem locations get plain file URLs (shared
    /// filesystem assumption); anything else has no signer and cannot serve
    /// presigned uploads.
    pub async fn new(config: &BlobStoreConfig) -> BlobResult<Self> {
        let (object_store, base, scheme) = storage::build_object_store(config)?;
        let signer: Option<Arc<dyn UrlSigner>> = match scheme {
            ObjectStoreScheme::AmazonS3 => Some(Arc::new(
                S3UrlSigner::from_store_url(&config.path, config.region.clone()).await?,
            )),
            ObjectStoreScheme::Local => Some(Arc::new(LocalUrlSigner::new(&config.path))),
            _ => None,
        };
        info!(
            path = %config.path,
            signing = signer.is_some(),
            "opened blob store",
        );
        Ok(Self {
            storage: BlobStorage::from_parts(object_store, base),
            signer,
        })
    }

    pub fn with_signer(storage: BlobStorage, signer: Option<Arc<dyn UrlSigner>>) -> Self {
        Self { storage, signer }
    }

    pub fn storage(&self) -> &BlobStorage {
        &self.storage
    }

    pub fn signer(&self) -> BlobResult<&dyn UrlSigner> {
        self.signer.as_deref().ok_or(BlobError::SigningUnavailable)
    }
}

/// The two visibility-scoped stores. Every decision of which physical store
/// handles a blob goes through `store()`.
pub struct BlobStoreSet {
    public: BlobStore,
    private: BlobStore,
}

impl BlobStoreSet {
    pub async fn new(
        public_config: &BlobStoreConfig,
        private_config: &BlobStoreConfig,
    ) -> BlobResult<Self> {
        Ok(Self {
            public: BlobStore::new(public_config).await?,
            private: BlobStore::new(private_config).await?,
        })
    }

    pub fn from_stores(public: BlobStore, private: BlobStore) -> Self {
        Self { public, private }
    }

    pub fn store(&self, visibility: Visibility) -> &BlobStore {
        match visibility {
            Visibility::Public => &self.public,
            Visibility::Private => &self.private,
        }
    }
}
