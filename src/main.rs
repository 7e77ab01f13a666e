// ABOUTME: Asset gateway entry point - config, GCS client, HTTP server
// ABOUTME: Serves both HTTP/1 and HTTP/2 via hyper's auto builder

use std::sync::Arc;

use anyhow::Result;
use google_cloud_storage::client::{Client as GcsClient, ClientConfig};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use tower::Service;
use tracing::{error, info};

use asset_gateway::config::Config;
use asset_gateway::storage::GcsStore;
use asset_gateway::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("asset_gateway=info".parse()?),
        )
        .init();

    let config = Config::from_env();
    let port = config.port;

    let gcs_config = ClientConfig::default().with_auth().await?;
    let gcs_client = GcsClient::new(gcs_config);
    let store = Arc::new(GcsStore::new(gcs_client, config.bucket.clone()));

    let state = Arc::new(AppState { config, store });
    let app = router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!("Starting HTTP/2 server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let app = app.clone();

        tokio::spawn(async move {
            let builder = Builder::new(TokioExecutor::new());
            if let Err(e) = builder
                .serve_connection(
                    io,
                    hyper::service::service_fn(move |req| {
                        let mut app = app.clone();
                        async move { app.call(req).await }
                    }),
                )
                .await
            {
                error!("Connection error: {}", e);
            }
        });
    }
}
