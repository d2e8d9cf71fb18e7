use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum_server::Handle;
use blob_store::BlobStoreSet;
use metadata_store::MetadataStore;
use tokio::signal;
use tracing::info;

use crate::{
    config::DepotConfig,
    gateway::BlobGateway,
    metrics::ApiMetrics,
    routes::{create_routes, RouteState},
};

pub struct Service {
    pub config: DepotConfig,
    pub gateway: BlobGateway,
    pub metadata: MetadataStore,
}

impl Service {
    pub async fn new(config: DepotConfig) -> Result<Self> {
        config.validate()?;
        let stores = BlobStoreSet::new(&config.public_store, &config.private_store)
            .await
            .context("error initializing blob stores")?;
        let metadata = MetadataStore::open(&config.metadata_path)
            .await
            .context("error initializing metadata store")?;
        let gateway = BlobGateway::new(stores, metadata.clone());

        Ok(Self {
            config,
            gateway,
            metadata,
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        let route_state = RouteState {
            gateway: self.gateway.clone(),
            metrics: Arc::new(ApiMetrics::new()),
        };

        let handle = Handle::new();
        let handle_sh = handle.clone();
        tokio::spawn(async move {
            shutdown_signal(handle_sh).await;
            info!("graceful shutdown signal received, shutting down server gracefully");
        });

        let addr: SocketAddr = self.config.listen_addr.parse()?;
        info!("server api listening on {}", self.config.listen_addr);
        axum_server::bind(addr)
            .handle(handle)
            .serve(create_routes(route_state).into_make_service())
            .await?;

        // In-flight requests have drained by now; flush metadata last so no
        // accepted write is lost.
        self.metadata
            .close()
            .await
            .context("error closing metadata store")?;
        info!("metadata store flushed and closed");

        Ok(())
    }
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
        },
        _ = terminate => {
        },
    }
    handle.shutdown();
    info!("signal received, shutting down server gracefully");
}
