//! HTTP layer exposing the race task to browser clients

use crate::api::{RaceSnapshot, StartResponse, UpdateRequest};
use crate::game::{RaceHandle, RaceKind, RaceSession, SessionError};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Builds the route table.
///
/// The bare `/start`, `/update` and `/state` paths drive the drag race, the
/// routes the browser client talks to. The circuit race lives under
/// `/circuit`, and `/drag` mirrors the bare paths.
pub fn router(handle: RaceHandle, static_dir: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/start", post(start_drag))
        .route("/update", post(update_drag))
        .route("/state", get(state_drag))
        .route("/drag/start", post(start_drag))
        .route("/drag/update", post(update_drag))
        .route("/drag/state", get(state_drag))
        .route("/circuit/start", post(start_circuit))
        .route("/circuit/update", post(update_circuit))
        .route("/circuit/state", get(state_circuit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(handle);

    if let Some(dir) = static_dir {
        info!("Serving static files from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn start_race(handle: &RaceHandle, kind: RaceKind) -> Result<Json<StartResponse>, SessionError> {
    let start_time = handle.start(kind).await?;
    Ok(Json(StartResponse {
        message: "Game started".to_string(),
        start_time,
    }))
}

async fn update_race(
    handle: &RaceHandle,
    kind: RaceKind,
    request: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<RaceSnapshot>, SessionError> {
    let Json(request) = request.map_err(|e| SessionError::BadRequest(e.body_text()))?;
    let keys = request.key_set()?;
    let snapshot = handle.update(kind, request.delta, keys).await?;
    Ok(Json(snapshot))
}

async fn start_drag(State(handle): State<RaceHandle>) -> Result<Json<StartResponse>, SessionError> {
    start_race(&handle, RaceKind::Drag).await
}

async fn update_drag(
    State(handle): State<RaceHandle>,
    request: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<RaceSnapshot>, SessionError> {
    update_race(&handle, RaceKind::Drag, request).await
}

async fn state_drag(State(handle): State<RaceHandle>) -> Result<Json<RaceSnapshot>, SessionError> {
    Ok(Json(handle.snapshot(RaceKind::Drag).await?))
}

async fn start_circuit(
    State(handle): State<RaceHandle>,
) -> Result<Json<StartResponse>, SessionError> {
    start_race(&handle, RaceKind::Circuit).await
}

async fn update_circuit(
    State(handle): State<RaceHandle>,
    request: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<RaceSnapshot>, SessionError> {
    update_race(&handle, RaceKind::Circuit, request).await
}

async fn state_circuit(
    State(handle): State<RaceHandle>,
) -> Result<Json<RaceSnapshot>, SessionError> {
    Ok(Json(handle.snapshot(RaceKind::Circuit).await?))
}

/// Bound HTTP listener plus the race task it forwards to
pub struct Server {
    listener: TcpListener,
    handle: RaceHandle,
    race_task: JoinHandle<()>,
    static_dir: Option<PathBuf>,
}

impl Server {
    /// Binds `addr` and spawns the race task that owns `session`.
    pub async fn new(
        addr: &str,
        session: RaceSession,
        static_dir: Option<PathBuf>,
    ) -> Result<Self, BoxError> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on http://{}", listener.local_addr()?);

        let (handle, race_task) = RaceHandle::spawn(session);

        Ok(Server {
            listener,
            handle,
            race_task,
            static_dir,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn handle(&self) -> RaceHandle {
        self.handle.clone()
    }

    /// Serves requests until Ctrl+C, then drains the race task.
    pub async fn run(self) -> Result<(), BoxError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("Received Ctrl+C, shutting down gracefully...");
        })
        .await
    }

    /// Serves requests until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), BoxError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = router(self.handle.clone(), self.static_dir);

        info!("Server started successfully");
        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Err(e) = self.handle.shutdown().await {
            error!("Failed to stop race task: {}", e);
        }
        if let Err(e) = self.race_task.await {
            error!("Race task panicked: {}", e);
        }

        info!("Server shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DragStatus, ErrorBody};
    use shared::{CircuitConfig, DragConfig};
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    fn session() -> RaceSession {
        RaceSession::new(CircuitConfig::with_laps(3), DragConfig::default()).unwrap()
    }

    async fn request(addr: SocketAddr, method: &str, path: &str, body: &str) -> (u16, String) {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let raw = format!(
            "{} {} HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            method,
            path,
            addr,
            body.len(),
            body
        );
        stream.write_all(raw.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        let status = response
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
            .unwrap_or(0);
        let body = response
            .split_once("\r\n\r\n")
            .map(|(_, body)| body.to_string())
            .unwrap_or_default();
        (status, body)
    }

    #[tokio::test]
    async fn test_server_binds_ephemeral_port() {
        let server = Server::new("127.0.0.1:0", session(), None).await.unwrap();
        let addr = server.local_addr().unwrap();
        assert_eq!(addr.ip(), IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
        assert_ne!(addr.port(), 0);

        // The race task is live before the server starts serving.
        let handle = server.handle();
        handle.start(RaceKind::Drag).await.unwrap();
        match handle.snapshot(RaceKind::Drag).await.unwrap() {
            RaceSnapshot::Drag(status) => assert!(status.game_started),
            other => panic!("expected drag status, got {:?}", other),
        }
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_routes_over_tcp() {
        let server = Server::new("127.0.0.1:0", session(), None).await.unwrap();
        let addr = server.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let running = tokio::spawn(server.run_until(async {
            let _ = stopped.await;
        }));

        let (status, body) = request(addr, "GET", "/health", "").await;
        assert_eq!(status, 200);
        assert!(body.contains("ok"));

        let (status, _) = request(addr, "POST", "/start", "").await;
        assert_eq!(status, 200);

        let (status, body) = request(
            addr,
            "POST",
            "/update",
            r#"{"keys": ["KeyW"], "delta": 0.1}"#,
        )
        .await;
        assert_eq!(status, 200);
        let drag: DragStatus = serde_json::from_str(&body).unwrap();
        assert!(drag.game_started);
        assert!(drag.creature1_x > -10.0);
        assert_eq!(drag.creature2_x, -10.0);

        let (status, body) = request(
            addr,
            "POST",
            "/update",
            r#"{"keys": [], "delta": -0.1}"#,
        )
        .await;
        assert_eq!(status, 400);
        let error: ErrorBody = serde_json::from_str(&body).unwrap();
        assert!(error.error.contains("negative"));

        let (status, _) = request(addr, "POST", "/update", r#"{"delta": 0.1}"#).await;
        assert_eq!(status, 400);

        let (status, _) = request(addr, "POST", "/update", "not json").await;
        assert_eq!(status, 400);

        let (status, _) = request(addr, "GET", "/missing", "").await;
        assert_eq!(status, 404);

        let _ = stop.send(());
        running.await.unwrap().unwrap();
    }
}
