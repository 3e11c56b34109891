//! HTTP server for `kiln serve`.
//!
//! Files come straight from the output directory through tower-http's
//! `ServeDir`, so whatever the last completed build wrote is what gets
//! served.

use std::future::Future;
use std::net::SocketAddr;

use axum::{Json, Router, extract::State, routing::get};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::dev::{SharedState, StatusResponse};
use crate::error::{CliError, Result};

/// Build status endpoint.
pub const STATUS_PATH: &str = "/__kiln/status";

pub struct DevServer {
    listener: TcpListener,
    state: SharedState,
}

impl DevServer {
    /// Bind `host:port`. Port 0 picks a free port.
    pub async fn bind(host: &str, port: u16, state: SharedState) -> Result<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind to {host}:{port}: {e}")))?;
        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` resolves, then finish in-flight requests.
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state);
        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| CliError::Server(format!("Server error: {e}")))
    }
}

pub fn router(state: SharedState) -> Router {
    let files = ServeDir::new(state.out_dir());
    Router::new()
        .route(STATUS_PATH, get(handle_status))
        .fallback_service(files)
        .with_state(state)
}

async fn handle_status(State(state): State<SharedState>) -> Json<StatusResponse> {
    Json(state.snapshot())
}
