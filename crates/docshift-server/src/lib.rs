//! Conversion server for docshift
//!
//! Hosts `POST /convert` (office-suite conversion of an uploaded document)
//! and `GET /convert/health` (liveness of that conversion path).

pub mod config;
pub mod handlers;
pub mod office;
pub mod types;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use office::{ConvertOptions, OfficeError, OfficeSuite, Soffice};
pub use types::*;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Office suite running the conversions
    pub office: Arc<dyn OfficeSuite>,
    /// Polling and binary candidates for each conversion
    pub options: Arc<ConvertOptions>,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(office: impl OfficeSuite + 'static, options: ConvertOptions) -> Self {
        Self {
            office: Arc::new(office),
            options: Arc::new(options),
            max_upload_bytes: config::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// LibreOffice state from configuration
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(Soffice::from_config(config), ConvertOptions::from_config(config))
            .with_max_upload_bytes(config.max_upload_bytes)
    }

    #[must_use]
    pub const fn with_max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = limit;
        self
    }
}

/// Build the router with all endpoints
pub fn build_router(state: AppState) -> Router {
    let limit = state.max_upload_bytes;
    Router::new()
        .route("/convert", post(handlers::convert))
        .route("/convert/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on an already bound listener
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, build_router(state)).await
}

/// Start the server on `addr`
pub async fn start_server(addr: &str, state: AppState) -> Result<(), std::io::Error> {
    tracing::info!("Starting conversion server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve(listener, state).await
}
