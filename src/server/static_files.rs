use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Path as UrlPath, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::config::MIRROR_STATE_FILE;

struct ServeState {
    root: PathBuf,
}

/// Static file server over the mirror directory. The handle owns the
/// listening task; dropping it without calling [`shutdown`] leaves the
/// task running until the runtime stops.
///
/// [`shutdown`]: StaticServer::shutdown
pub struct StaticServer {
    port: u16,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl StaticServer {
    /// Bind `127.0.0.1:port` (0 = ephemeral) and serve `root`.
    pub async fn start(root: PathBuf, port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("bind local server port {port}"))?;
        let port = listener.local_addr().context("local server address")?.port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let state = Arc::new(ServeState { root });

        let app = Router::new()
            .route("/", get(serve_index))
            .route("/{*path}", get(serve_asset))
            .with_state(state);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        info!("serving mirror on http://127.0.0.1:{port}");
        Ok(Self {
            port,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Navigation target for the embedded view.
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Stop the server gracefully.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// GET / — serve the mirrored index page.
async fn serve_index(State(state): State<Arc<ServeState>>) -> Response {
    serve_file(&state.root, "index.html").await
}

/// GET /{path} — serve a mirrored file.
async fn serve_asset(State(state): State<Arc<ServeState>>, UrlPath(path): UrlPath<String>) -> Response {
    serve_file(&state.root, &path).await
}

async fn serve_file(root: &Path, relative: &str) -> Response {
    if !is_safe_path(relative) {
        debug!("rejecting unsafe path {relative:?}");
        return (StatusCode::NOT_FOUND, "not found").into_response();
    }
    // Internal bookkeeping lives next to the mirrored files but is not
    // part of the site.
    if relative == MIRROR_STATE_FILE {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    }

    let full = root.join(relative);
    match tokio::fs::read(&full).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type_for(relative)),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            bytes,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

/// Only plain relative components; anything that could climb out of the
/// mirror root is rejected.
fn is_safe_path(relative: &str) -> bool {
    Path::new(relative)
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

fn content_type_for(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");
    match extension {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" | "mjs" => "text/javascript",
        "css" => "text/css",
        "json" => "application/json",
        "wasm" => "application/wasm",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
