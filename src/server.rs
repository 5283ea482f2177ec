//! Application container and HTTP listener.
//!
//! [`Server::bind`] builds the router, injects the shared state, and binds
//! the socket; [`Server::serve`] runs the accept loop until the shutdown
//! token fires. The split keeps the bound address observable so the
//! startup confirmation can be emitted after bind and before accept.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::FromRef;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::error::AppError;
use crate::sanitize::Policy;

/// Router state injected into handlers and extractors. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Configuration snapshot, shared read-only.
    pub config: Arc<Config>,
    /// Globally registered sanitisation flags.
    pub sanitizer: Policy,
}

impl FromRef<AppState> for Policy {
    fn from_ref(state: &AppState) -> Policy {
        state.sanitizer
    }
}

/// Build a JSON error body.
pub(crate) fn json_error(code: &str, msg: impl std::fmt::Display) -> Json<serde_json::Value> {
    Json(json!({ "error": code, "message": format!("{msg}") }))
}

/// No routes are defined beyond framework defaults; everything lands here.
async fn fallback(method: Method, uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        json_error("not_found", format!("no handler for {method} {uri}")),
    )
        .into_response()
}

/// Assemble the application router around `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new().fallback(fallback).with_state(state)
}

/// A bound, not-yet-serving HTTP listener.
pub struct Server {
    listener: TcpListener,
    router: Router,
    addr: SocketAddr,
}

impl Server {
    /// Build the container and bind `0.0.0.0:<port>`, resolving the port
    /// from `config` (default 3000). Bind failure is a startup error.
    pub async fn bind(config: Arc<Config>) -> Result<Self, AppError> {
        let port = config.port();
        let state = AppState {
            config,
            sanitizer: Policy::default(),
        };
        let router = build_router(state);

        let listener = TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(|e| AppError::Server(format!("bind failed on port {port}: {e}")))?;
        let addr = listener.local_addr()?;

        info!(%addr, "http listener bound");

        Ok(Self {
            listener,
            router,
            addr,
        })
    }

    /// The address actually bound. Differs from the configured port only
    /// when `PORT=0` requested an ephemeral one.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until `shutdown` is cancelled; in-flight connections drain.
    pub async fn serve(self, shutdown: CancellationToken) -> Result<(), AppError> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| AppError::Server(format!("serve failed: {e}")))?;

        info!("http listener shut down");
        Ok(())
    }
}
