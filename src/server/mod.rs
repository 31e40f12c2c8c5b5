//! HTTP surface: the turn endpoint peers and clients call.

pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::ParleyConfig;
use crate::engine::Router;
use crate::error::ParleyError;

/// Shared application state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub router: Arc<Router>,
}

impl AppState {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
        }
    }
}

/// A turn failure rendered as `{ "error": "..." }`.
#[derive(Debug)]
pub struct ApiError(pub ParleyError);

impl From<ParleyError> for ApiError {
    fn from(err: ParleyError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            warn!(error = %self.0, "rejected request");
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %self.0, category = ?self.0.category(), "turn failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Build the router from configuration and serve until Ctrl-C.
pub async fn serve(config: ParleyConfig) -> Result<(), ParleyError> {
    let router = Router::from_config(&config)?;
    let app = routes::configure(AppState::new(router));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| {
            ParleyError::Configuration(format!(
                "invalid listen address {}:{}: {e}",
                config.server.host, config.server.port
            ))
        })?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
