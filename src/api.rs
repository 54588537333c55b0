use std::future::Future;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::ToSocketAddrs;

use crate::exporter::Exporter;
use crate::metrics;

#[derive(Debug, serde::Serialize)]
struct Health<'a> {
    status: &'static str,
    collectors: Vec<&'a str>,
}

async fn export_metrics(State(exporter): State<Arc<Exporter>>) -> Response {
    let samples = exporter.scrape().await;
    match metrics::encode(&samples) {
        Ok(body) => ([(header::CONTENT_TYPE, metrics::CONTENT_TYPE)], body).into_response(),
        Err(err) => {
            log::error!("Failed to encode metrics: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to encode metrics",
            )
                .into_response()
        }
    }
}

async fn health(State(exporter): State<Arc<Exporter>>) -> Response {
    Json(Health {
        status: "ok",
        collectors: exporter.collector_names().collect(),
    })
    .into_response()
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to bind listener: {0}")]
    Bind(#[source] std::io::Error),
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub struct APIServer {
    router: axum::Router,
}

impl APIServer {
    pub fn new(exporter: Arc<Exporter>) -> Self {
        let router = axum::Router::new()
            .route("/metrics", get(export_metrics))
            .route("/health", get(health))
            .with_state(exporter);
        Self { router }
    }

    pub fn into_router(self) -> axum::Router {
        self.router
    }

    /// Serves the API on `addr` until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if the listener cannot be bound and
    /// [`Error::Serve`] if serving fails.
    pub async fn listen(
        self,
        addr: impl ToSocketAddrs,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(Error::Bind)?;
        if let Ok(local) = listener.local_addr() {
            log::info!("Serving metrics on http://{local}/metrics");
        }
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(Error::Serve)
    }
}
