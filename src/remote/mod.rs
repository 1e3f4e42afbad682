//! Remote control over HTTP
//!
//! A tiny HTTP surface for phones on the same network:
//! - `GET /api/<command>` queues the matching action and answers an empty 200
//! - anything else, other methods on `/api/` included, serves the embedded
//!   control page
//!
//! Every response carries `Connection: close`. Default port: 8080

pub mod net;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use parking_lot::Mutex;
use rust_embed::RustEmbed;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::action::{Action, ActionEvent, ActionSender};
use crate::error::RemoteError;

/// Default remote port
pub const DEFAULT_REMOTE_PORT: u16 = 8080;

/// Lowest port accepted from configuration
pub const MIN_REMOTE_PORT: u16 = 1024;

#[derive(RustEmbed)]
#[folder = "web/"]
struct WebAssets;

const FALLBACK_PAGE: &str = "<!DOCTYPE html><html><body><h1>Pad Remote</h1></body></html>";

/// Embedded control page
pub fn control_page() -> String {
    WebAssets::get("index.html")
        .map(|file| String::from_utf8_lossy(&file.data).into_owned())
        .unwrap_or_else(|| FALLBACK_PAGE.to_string())
}

/// Build the remote router
pub fn build_router(actions: ActionSender) -> Router {
    Router::new()
        .route("/api/:command", get(api_command).fallback(page))
        .fallback(page)
        .layer(middleware::map_response(close_connection))
        .with_state(actions)
}

async fn close_connection(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

/// GET /api/:command - queue one action
async fn api_command(
    Path(command): Path<String>,
    State(actions): State<ActionSender>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    let Some(action) = Action::from_remote_command(&command) else {
        debug!("Unknown remote command '{}', serving page", command);
        return page().await.into_response();
    };

    if actions.send(ActionEvent::from_remote(action, Some(peer))).is_err() {
        warn!("Action channel closed, dropping remote {}", action);
    }
    StatusCode::OK.into_response()
}

async fn page() -> Html<String> {
    Html(control_page())
}

struct Running {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Remote listener lifecycle: start, stop, restart on another port
pub struct RemoteListener {
    actions: ActionSender,
    running: Mutex<Option<Running>>,
}

impl RemoteListener {
    pub fn new(actions: ActionSender) -> Self {
        Self {
            actions,
            running: Mutex::new(None),
        }
    }

    /// Bind all interfaces on `port` and start serving
    ///
    /// Starting an already running listener returns its current address.
    pub async fn start(&self, port: u16) -> Result<SocketAddr, RemoteError> {
        if let Some(addr) = self.local_addr() {
            return Ok(addr);
        }

        let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        let listener = tokio::net::TcpListener::bind(bind_addr)
            .await
            .map_err(|source| RemoteError::Bind { port, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| RemoteError::Bind { port, source })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = build_router(self.actions.clone());
        let task = tokio::spawn(async move {
            let result = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
            if let Err(e) = result {
                warn!("Remote listener error: {}", e);
            }
        });

        info!("📡 Remote control listening on http://{}:{}", net::local_ipv4(), local_addr.port());
        *self.running.lock() = Some(Running {
            local_addr,
            shutdown: shutdown_tx,
            task,
        });
        Ok(local_addr)
    }

    /// Stop serving; no-op when not running
    pub async fn stop(&self) {
        let running = self.running.lock().take();
        let Some(running) = running else {
            return;
        };
        let _ = running.shutdown.send(());
        if let Err(e) = running.task.await {
            warn!("Remote listener task failed: {}", e);
        }
        info!("Remote control stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().as_ref().map(|r| r.local_addr)
    }

    /// Status line shown by the host
    pub fn status_line(&self) -> String {
        match self.local_addr() {
            Some(addr) => format!("Remote: ON ({}:{})", net::local_ipv4(), addr.port()),
            None => "Remote: Disabled".to_string(),
        }
    }
}
