//! Mock network interceptor.
//!
//! An explicitly constructed HTTP server the component under test is pointed
//! at instead of a real backend. Callers own the instance and pass it into
//! their suite's setup and teardown; there is no process-wide singleton.
//!
//! Lifecycle: `Stopped → Listening` on [`MockServer::start`], back to
//! `Stopped` on [`MockServer::stop`]. [`MockServer::reset_handlers`] only
//! touches handler state, never the lifecycle.

mod handler;

pub use handler::{MockHandler, MockResponse};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use parking_lot::{Mutex, RwLock};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ServerError;
use handler::HandlerSet;

/// One intercepted request, as seen by the dispatch loop.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub method: Method,
    pub path: String,
    pub body: Bytes,
}

#[derive(Clone)]
struct ServerState {
    handlers: Arc<RwLock<HandlerSet>>,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

struct Listening {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// The mock server. Construct with suite-level default handlers, `start` in
/// before-all, `reset_handlers` in after-each, `stop` in after-all.
pub struct MockServer {
    handlers: Arc<RwLock<HandlerSet>>,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
    listening: Option<Listening>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::with_defaults(Vec::new())
    }

    pub fn with_defaults(defaults: Vec<MockHandler>) -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HandlerSet::new(defaults))),
            received: Arc::new(Mutex::new(Vec::new())),
            listening: None,
        }
    }

    /// Bind a loopback port and start serving. Idempotent: calling `start` on
    /// a listening server returns the existing address without rebinding.
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        if let Some(listening) = &self.listening {
            return Ok(listening.addr);
        }

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = ServerState {
            handlers: Arc::clone(&self.handlers),
            received: Arc::clone(&self.received),
        };
        let app = Router::new().fallback(dispatch).with_state(state);

        let (shutdown, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = rx.await;
            });
            if let Err(err) = serve.await {
                warn!(%err, "mock server terminated with error");
            }
        });

        info!(%addr, "mock server listening");
        self.listening = Some(Listening {
            addr,
            shutdown,
            task,
        });
        Ok(addr)
    }

    /// Graceful shutdown; joins the serve task. No-op when already stopped.
    pub async fn stop(&mut self) {
        if let Some(Listening {
            addr,
            shutdown,
            task,
        }) = self.listening.take()
        {
            let _ = shutdown.send(());
            let _ = task.await;
            info!(%addr, "mock server stopped");
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening.is_some()
    }

    pub fn base_url(&self) -> Result<String, ServerError> {
        self.listening
            .as_ref()
            .map(|l| format!("http://{}", l.addr))
            .ok_or(ServerError::NotListening)
    }

    pub fn url(&self, path: &str) -> Result<String, ServerError> {
        Ok(format!("{}{path}", self.base_url()?))
    }

    /// Register a per-test handler override; shadows a default for the same
    /// method and path until the next `reset_handlers`.
    pub fn stub(&self, handler: MockHandler) {
        debug!(route = %handler.signature(), "stubbing handler");
        self.handlers.write().stub(handler);
    }

    /// Restore the active handler set to the suite-level defaults and clear
    /// the request log. Lifecycle state is untouched.
    pub fn reset_handlers(&self) {
        self.handlers.write().reset();
        self.received.lock().clear();
    }

    /// `"METHOD path"` signatures of the active handlers, in match order.
    /// Lets isolation tests compare handler-set structure across tests.
    pub fn route_signatures(&self) -> Vec<String> {
        self.handlers.read().route_signatures()
    }

    /// Every request intercepted since the last reset.
    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.received.lock().clone()
    }

    pub fn hits(&self, method: &Method, path: &str) -> usize {
        self.received
            .lock()
            .iter()
            .filter(|r| r.method == *method && r.path == path)
            .count()
    }
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MockServer {
    // Backstop only; suites are expected to stop explicitly in after-all.
    fn drop(&mut self) {
        if let Some(listening) = self.listening.take() {
            let _ = listening.shutdown.send(());
            listening.task.abort();
        }
    }
}

/// Fallback route: record the request, answer from the active handler set,
/// or 501 with a descriptive body when nothing matches.
async fn dispatch(State(state): State<ServerState>, method: Method, uri: Uri, body: Bytes) -> Response {
    let path = uri.path().to_string();
    state.received.lock().push(ReceivedRequest {
        method: method.clone(),
        path: path.clone(),
        body,
    });

    let matched = state.handlers.read().find(&method, &path).cloned();
    match matched {
        Some(handler) => {
            debug!(%method, %path, status = %handler.response.status, "mock handler matched");
            mock_response(&handler.response)
        }
        None => {
            warn!(%method, %path, "no mock handler registered");
            (
                StatusCode::NOT_IMPLEMENTED,
                format!("no mock handler for {method} {path}"),
            )
                .into_response()
        }
    }
}

fn mock_response(mock: &MockResponse) -> Response {
    let mut builder = Response::builder().status(mock.status);
    for (name, value) in &mock.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    match builder.body(Body::from(mock.body.clone())) {
        Ok(response) => response,
        Err(err) => {
            warn!(%err, "mock response could not be materialized");
            (StatusCode::INTERNAL_SERVER_ERROR, "invalid mock response").into_response()
        }
    }
}
