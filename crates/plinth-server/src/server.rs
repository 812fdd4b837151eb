//! Development server: static preview of the output tree plus live reload.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Request, State,
    },
    http::{header, StatusCode, Uri},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::services::ServeDir;

use plinth_pipeline::{Paths, Runner};

use crate::watcher::{spawn_reactors, FileWatcher};
use crate::websocket::{reload_client_script, ReloadHub, ReloadMessage};

/// WebSocket endpoint the reload client connects to.
pub const RELOAD_WS_PATH: &str = "/__reload";
/// Route serving the reload client script.
pub const RELOAD_SCRIPT_PATH: &str = "/__reload.js";

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Path sets for the pipeline; the preview serves `paths.root.dest`.
    pub paths: Paths,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Serve generated indexes for directories without an index file.
    pub directory_listing: bool,

    /// Reconnecting clients reload immediately, picking up whatever was
    /// built while they were disconnected.
    pub reload_on_restart: bool,

    /// Open a browser on start
    pub open: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            paths: Paths::default(),
            port: 8000,
            host: "127.0.0.1".to_string(),
            directory_listing: false,
            reload_on_restart: true,
            open: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {0}: {1}")]
    Bind(SocketAddr, String),

    #[error("file watch error: {0}")]
    Watch(String),
}

/// Shared server state.
struct ServerState {
    config: DevServerConfig,
    hub: ReloadHub,
}

/// The long-running development session: one full build, then serve and
/// watch until the process is terminated.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Runs until externally terminated. Bind and watch-subscription
    /// failures surface immediately; per-file build failures never do.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .expect("invalid address");

        // Initial full build. The preview must not come up over a stale or
        // half-empty output tree.
        let report = Runner::new(self.config.paths.clone()).run_all().await;
        tracing::info!(
            "initial build: {} files written, {} failed",
            report.written(),
            report.failed()
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(addr, e.to_string()))?;

        let hub = ReloadHub::new();
        let (watcher, events) = FileWatcher::new(&self.config.paths)
            .map_err(|e| ServerError::Watch(e.to_string()))?;
        spawn_reactors(&self.config.paths, &hub, events);

        let state = Arc::new(ServerState {
            config: self.config.clone(),
            hub,
        });
        let app = self.router(state);

        tracing::info!("preview server at http://{addr}");

        if self.config.open {
            let _ = open::that(format!("http://{addr}"));
        }

        let served = axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Bind(addr, e.to_string()));

        // Keep watching until the server itself winds down.
        drop(watcher);
        served
    }

    fn router(&self, state: Arc<ServerState>) -> Router {
        let root = self.config.paths.root.dest.clone();
        let static_files = ServeDir::new(&root);

        let router = Router::new()
            .route(RELOAD_WS_PATH, get(ws_handler))
            .route(RELOAD_SCRIPT_PATH, get(reload_script_handler));

        let router = if self.config.directory_listing {
            router.fallback_service(static_files.fallback(get(directory_index).with_state(root)))
        } else {
            router.fallback_service(static_files)
        };

        router
            .layer(middleware::from_fn(inject_reload_script))
            .with_state(state)
    }
}

/// Handler for the reload WebSocket endpoint.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Forward reload broadcasts to one connected client.
async fn handle_ws(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut rx = state.hub.subscribe();

    let msg = serde_json::to_string(&ReloadMessage::Connected).unwrap();
    if socket.send(Message::Text(msg.into())).await.is_err() {
        return;
    }

    while let Ok(reload) = rx.recv().await {
        let json = serde_json::to_string(&reload).unwrap();
        if socket.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
}

/// Handler for the reload client script.
async fn reload_script_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let script = reload_client_script(RELOAD_WS_PATH, state.config.reload_on_restart);
    ([(header::CONTENT_TYPE, "application/javascript")], script)
}

/// Upper bound on HTML documents the middleware will buffer for injection.
const MAX_INJECTABLE: usize = 16 * 1024 * 1024;

/// Rewrites served HTML to pull in the reload client.
async fn inject_reload_script(req: Request, next: Next) -> Response {
    let res = next.run(req).await;

    let is_html = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"));
    if !is_html {
        return res;
    }

    let (mut parts, body) = res.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_INJECTABLE).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let injected = inject_script_tag(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(injected))
}

fn inject_script_tag(html: &str) -> String {
    let tag = format!(r#"<script src="{RELOAD_SCRIPT_PATH}"></script>"#);
    match html.rfind("</body>") {
        Some(idx) => format!("{}{}\n{}", &html[..idx], tag, &html[idx..]),
        None => format!("{html}\n{tag}"),
    }
}

/// Fallback when the static service found nothing: if the request names a
/// directory, render its entries.
async fn directory_index(State(root): State<PathBuf>, uri: Uri) -> Response {
    let rel = uri.path().trim_start_matches('/');
    if rel.split('/').any(|segment| segment == "..") {
        return StatusCode::NOT_FOUND.into_response();
    }

    let dir = root.join(rel);
    if !dir.is_dir() {
        return StatusCode::NOT_FOUND.into_response();
    }

    let mut names = Vec::new();
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(_) => return StatusCode::NOT_FOUND.into_response(),
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    let items: String = names
        .iter()
        .map(|name| format!("<li><a href=\"{name}\">{name}</a></li>\n"))
        .collect();

    Html(format!(
        "<!DOCTYPE html>\n<html>\n<body>\n<h1>Index of /{rel}</h1>\n<ul>\n{items}</ul>\n</body>\n</html>\n"
    ))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_the_session_defaults() {
        let config = DevServerConfig::default();

        assert_eq!(config.port, 8000);
        assert!(!config.directory_listing);
        assert!(config.reload_on_restart);
    }

    #[test]
    fn injects_before_the_closing_body_tag() {
        let html = "<html><body><p>hi</p></body></html>";

        let injected = inject_script_tag(html);

        let script_at = injected.find(RELOAD_SCRIPT_PATH).unwrap();
        let body_close_at = injected.find("</body>").unwrap();
        assert!(script_at < body_close_at);
    }

    #[test]
    fn appends_when_no_body_tag_exists() {
        let injected = inject_script_tag("<p>bare fragment</p>");

        assert!(injected.contains(RELOAD_SCRIPT_PATH));
        assert!(injected.starts_with("<p>bare fragment</p>"));
    }
}
