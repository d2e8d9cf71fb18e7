use serde::{Deserialize, Serialize};

/// Location of one physical object store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobStoreConfig {
    /// Store URL: `file:///var/depot/blobs`, `memory:///`, or
    /// `s3://bucket/prefix`.
    pub path: String,

    /// AWS region, used for S3 stores and their presigning client.
    #[serde(default)]
    pub region: Option<String>,
}

impl BlobStoreConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            region: None,
        }
    }
}
