use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use blob_store::BlobStoreConfig;
use tracing::subscriber;
use tracing_subscriber::{layer::SubscriberExt, Layer};

use crate::{
    config::DepotConfig,
    metrics::ApiMetrics,
    routes::{create_routes, RouteState},
    service::Service,
};

pub struct TestService {
    pub service: Service,
    // Held so the scratch stores outlive the test.
    pub temp_dir: tempfile::TempDir,
}

impl TestService {
    pub async fn new() -> Result<Self> {
        Self::build(false).await
    }

    /// Harness whose private store cannot issue presigned URLs.
    pub async fn new_without_signing() -> Result<Self> {
        Self::build(true).await
    }

    async fn build(unsigned_private_store: bool) -> Result<Self> {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trace"));
        let _ = subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_filter(env_filter)),
        );

        let temp_dir = tempfile::tempdir()?;

        let mut cfg = DepotConfig {
            metadata_path: format!("file://{}/metadata", temp_dir.path().display()),
            public_store: BlobStoreConfig::new(format!(
                "file://{}/public",
                temp_dir.path().display()
            )),
            private_store: BlobStoreConfig::new(format!(
                "file://{}/private",
                temp_dir.path().display()
            )),
            ..Default::default()
        };
        if unsigned_private_store {
            cfg.private_store = BlobStoreConfig::new("memory:///");
        }

        let srv = Service::new(cfg).await?;

        Ok(Self {
            service: srv,
            temp_dir,
        })
    }

    pub fn router(&self) -> Router {
        create_routes(RouteState {
            gateway: self.service.gateway.clone(),
            metrics: Arc::new(ApiMetrics::new()),
        })
    }
}
