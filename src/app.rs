use crate::annotate::Annotator;
use crate::config::Config;
use crate::prediction::RemoteDetectionService;
use crate::server::HttpServer;
use crate::store::SupabaseStore;

use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let annotator = match Annotator::new(&config.annotation) {
        Ok(annotator) => Arc::new(annotator),
        Err(e) => {
            tracing::error!("Failed to load annotation font: {:?}", e);
            return Err(Box::new(e));
        }
    };

    let detection_service = Arc::new(RemoteDetectionService::new(&config.inference));
    let record_store = Arc::new(SupabaseStore::new(&config.database));

    let server = HttpServer::new(detection_service, record_store, annotator, &config).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_shutdown_rx = shutdown_tx.subscribe();

    let server_handle = server.run(server_shutdown_rx).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    let _ = server_handle.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
