use std::{env, fmt::Debug, net::SocketAddr, path::PathBuf};

use anyhow::Result;
use blob_store::BlobStoreConfig;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepotConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_metadata_path")]
    pub metadata_path: String,
    #[serde(default = "default_public_store")]
    pub public_store: BlobStoreConfig,
    #[serde(default = "default_private_store")]
    pub private_store: BlobStoreConfig,
    #[serde(default)]
    pub structured_logging: bool,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8910".to_string()
}

fn storage_root() -> PathBuf {
    env::current_dir().unwrap().join("depot_storage")
}

fn default_metadata_path() -> String {
    format!("file://{}/metadata", storage_root().display())
}

fn default_public_store() -> BlobStoreConfig {
    BlobStoreConfig::new(format!("file://{}/public", storage_root().display()))
}

fn default_private_store() -> BlobStoreConfig {
    BlobStoreConfig::new(format!("file://{}/private", storage_root().display()))
}

impl Default for DepotConfig {
    fn default() -> Self {
        DepotConfig {
            listen_addr: default_listen_addr(),
            metadata_path: default_metadata_path(),
            public_store: default_public_store(),
            private_store: default_private_store(),
            structured_logging: false,
        }
    }
}

impl DepotConfig {
    pub fn from_path(path: &str) -> Result<DepotConfig> {
        let config_str = std::fs::read_to_string(path)?;
        let config: DepotConfig = Figment::new().merge(Yaml::string(&config_str)).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(anyhow::anyhow!(
                "invalid listen address: {}",
                self.listen_addr
            ));
        }
        if self.public_store.path == self.private_store.path {
            return Err(anyhow::anyhow!(
                "public and private stores must not share a location"
            ));
        }
        Ok(())
    }
}
