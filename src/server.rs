use crate::{
    annotate::Annotator, config::Config, prediction::DetectionService, routes::api_routes,
    store::RecordStore, telemetry::Metrics,
};
use axum::{extract::DefaultBodyLimit, Router};
use axum_otel_metrics::HttpMetricsLayerBuilder;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::broadcast::Receiver, task::JoinHandle};

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct SharedState {
    pub detection_service: Arc<dyn DetectionService>,
    pub record_store: Arc<dyn RecordStore>,
    pub annotator: Arc<Annotator>,
    pub metrics: Arc<Metrics>,
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new(
        detection_service: Arc<dyn DetectionService>,
        record_store: Arc<dyn RecordStore>,
        annotator: Arc<Annotator>,
        config: &Config,
    ) -> anyhow::Result<Self> {
        let addr = config.server.get_address();

        let metrics = Arc::new(Metrics::new());
        let metrics_layer = HttpMetricsLayerBuilder::new().build();

        let app_state = SharedState {
            detection_service,
            record_store,
            annotator,
            metrics,
        };

        let router = Router::new()
            .merge(api_routes())
            .with_state(app_state)
            .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
            .layer(metrics_layer);

        let listener = TcpListener::bind(addr).await?;

        Ok(Self { router, listener })
    }

    pub async fn run(
        self,
        mut shutdown_rx: Receiver<()>,
    ) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
        let addr = self.listener.local_addr()?;
        tracing::info!("Starting app on {}", addr);

        let listener = self.listener;
        let router = self.router;
        let server_handle = tokio::spawn(async move {
            let server = axum::serve(listener, router);
            server
                .with_graceful_shutdown(async move {
                    shutdown_rx.recv().await.ok();
                })
                .await?;
            Ok::<(), anyhow::Error>(())
        });

        Ok(server_handle)
    }
}
