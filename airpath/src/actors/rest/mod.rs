mod error;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle, time::timeout};
use tower_http::timeout::TimeoutLayer;
use tracing::{debug, error, info, warn};

pub use crate::actors::rest::error::Error;
use crate::{
    command::Status,
    finder::{Flight, PathFinder},
    models::{FindPathRequest, FindPathResponse},
};

/// Serves the path finder over HTTP until [`Actor::shutdown`] is called.
pub struct Actor {
    local_addr: SocketAddr,
    server_join_handle: JoinHandle<()>,
    shutdown_sender: oneshot::Sender<()>,
    shutdown_grace_period: Duration,
}

#[derive(Clone)]
struct ServerState {
    finder: Arc<dyn PathFinder>,
    local_addr: SocketAddr,
}

impl Actor {
    pub async fn new(config: &Config, finder: Arc<dyn PathFinder>) -> Result<Self, Error> {
        let listener = TcpListener::bind(config.addr)
            .await
            .map_err(|cause| Error::Bind {
                addr: config.addr,
                cause,
            })?;
        let local_addr = listener.local_addr().map_err(|cause| Error::IO {
            message: "Failed to get the local address".to_string(),
            cause,
        })?;

        let router = router(
            ServerState { finder, local_addr },
            config.request_timeout,
        );
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();
        let server_join_handle = tokio::spawn(async move {
            info!("starting REST server: {local_addr}");
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal(shutdown_receiver))
                .await
            {
                error!("REST server terminated with error: {e}");
            }
        });

        Ok(Self {
            local_addr,
            server_join_handle,
            shutdown_sender,
            shutdown_grace_period: config.shutdown_grace_period,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections and waits for in-flight requests
    /// up to the grace period. Requests still running after that are dropped.
    pub async fn shutdown(self) {
        if self.shutdown_sender.send(()).is_err() {
            warn!("REST server has already stopped.");
        }

        let mut server_join_handle = self.server_join_handle;
        match timeout(self.shutdown_grace_period, &mut server_join_handle).await {
            Ok(Ok(())) => info!("REST server has been shut down."),
            Ok(Err(e)) => error!("REST server task failed: {e}"),
            Err(_) => {
                warn!(
                    "REST server didn't shut down within {:?}. Aborting...",
                    self.shutdown_grace_period
                );
                server_join_handle.abort();
            }
        }
    }
}

fn router(state: ServerState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/calculate", post(calculate))
        .route("/status", get(status))
        .layer(
            // Necessary for graceful shutdown
            TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout),
        )
        .with_state(state)
}

/// A future to be passed to the [`axum::serve::Serve::with_graceful_shutdown`].
/// When this future resolves, the axum server will start graceful shutdown.
async fn shutdown_signal(shutdown_receiver: oneshot::Receiver<()>) {
    if shutdown_receiver.await.is_err() {
        warn!("REST actor was dropped without shutdown");
    }
    info!("starting graceful shutdown for REST server...");
}

async fn calculate(
    State(state): State<ServerState>,
    body: Bytes,
) -> Result<Json<FindPathResponse>, (StatusCode, String)> {
    let request: FindPathRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!("failed to decode request body: {e}");
        (StatusCode::BAD_REQUEST, "Invalid request body".to_string())
    })?;
    let flights = Vec::<Flight>::try_from(request)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let path = state.finder.find_path(&flights).map_err(|e| {
        info!("no itinerary for {} flights: {e}", flights.len());
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    debug!("resolved {} flights: {path:?}", flights.len());
    Ok(Json(path.into()))
}

async fn status(State(state): State<ServerState>) -> Json<Status> {
    Json(Status {
        rest_addr: state.local_addr,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub addr: SocketAddr,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub shutdown_grace_period: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            request_timeout: Duration::from_secs(10),
            shutdown_grace_period: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::{
        body::Body,
        http::{Method, Request, Response, header},
    };
    use http_body_util::BodyExt as _;
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tower::ServiceExt as _;

    use super::*;
    use crate::finder::{self, DegreeFinder, Path};

    #[test_log::test(tokio::test)]
    async fn calculate_path() {
        let response = send(
            test_router(DegreeFinder),
            Method::POST,
            "/calculate",
            r#"[["IND", "EWR"], ["SFO", "ATL"], ["GSO", "IND"], ["ATL", "GSO"]]"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(read_body(response).await, r#"["SFO","EWR"]"#);
    }

    #[test_log::test(tokio::test)]
    async fn calculate_with_get() {
        let response = send(
            test_router(DegreeFinder),
            Method::GET,
            "/calculate",
            r#"[["SFO", "EWR"]]"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test_log::test(tokio::test)]
    async fn calculate_malformed_json() {
        let response = send(
            test_router(DegreeFinder),
            Method::POST,
            "/calculate",
            r#"{"key": "value",}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_body(response).await, "Invalid request body");
    }

    #[test_log::test(tokio::test)]
    async fn calculate_invalid_record() {
        let finder = RecordingFinder::default();
        let response = send(
            test_router(finder.clone()),
            Method::POST,
            "/calculate",
            r#"[["SFO", "ATL"], ["SFO"]]"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            read_body(response)
                .await
                .starts_with("each flight record should have two airports")
        );
        // The finder must not be consulted for a malformed request.
        assert!(finder.calls.lock().unwrap().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn calculate_no_path() {
        let response = send(
            test_router(DegreeFinder),
            Method::POST,
            "/calculate",
            r#"[["SFO", "EWR"], ["EWR", "SFO"]]"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read_body(response).await, "no path found");
    }

    #[test_log::test(tokio::test)]
    async fn calculate_multiple_paths() {
        let response = send(
            test_router(DegreeFinder),
            Method::POST,
            "/calculate",
            r#"[["SFO", "EWR"], ["ATL", "BNM"]]"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read_body(response).await, "multiple paths found");
    }

    #[test_log::test(tokio::test)]
    async fn calculate_passes_flights_to_finder() {
        let finder = RecordingFinder::default();
        let response = send(
            test_router(finder.clone()),
            Method::POST,
            "/calculate",
            r#"[["SFO", "EWR"]]"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_body(response).await, r#"["JFK","LAX"]"#);
        assert_eq!(
            *finder.calls.lock().unwrap(),
            vec![vec![Flight::new("SFO", "EWR")]]
        );
    }

    #[test_log::test(tokio::test)]
    async fn status_reports_local_addr() {
        let response = send(test_router(DegreeFinder), Method::GET, "/status", "").await;
        assert_eq!(response.status(), StatusCode::OK);
        let status: Status = serde_json::from_str(&read_body(response).await).unwrap();
        assert_eq!(status.rest_addr, test_addr());
    }

    #[test_log::test(tokio::test)]
    async fn serve_and_shutdown() {
        let actor = Actor::new(&Config::default(), Arc::new(DegreeFinder))
            .await
            .unwrap();
        let addr = actor.local_addr();
        assert_ne!(addr.port(), 0);

        let body = r#"[["ATL","EWR"],["SFO","ATL"]]"#;
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(
                format!(
                    "POST /calculate HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .as_bytes(),
            )
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with(r#"["SFO","EWR"]"#));

        actor.shutdown().await;
        assert!(tokio::net::TcpStream::connect(addr).await.is_err());
    }

    #[test_log::test(tokio::test)]
    async fn bind_address_in_use() {
        let actor = Actor::new(&Config::default(), Arc::new(DegreeFinder))
            .await
            .unwrap();
        let config = Config {
            addr: actor.local_addr(),
            ..Default::default()
        };

        let Err(Error::Bind { addr, cause }) =
            Actor::new(&config, Arc::new(DegreeFinder)).await
        else {
            panic!("expected Bind error");
        };
        assert_eq!(addr, actor.local_addr());
        assert_eq!(cause.kind(), std::io::ErrorKind::AddrInUse);

        actor.shutdown().await;
    }

    fn test_router(finder: impl PathFinder + 'static) -> Router {
        router(
            ServerState {
                finder: Arc::new(finder),
                local_addr: test_addr(),
            },
            Duration::from_secs(1),
        )
    }

    fn test_addr() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 8080))
    }

    async fn send(router: Router, method: Method, uri: &str, body: &str) -> Response<Body> {
        router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn read_body(response: Response<Body>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// Records every call and always answers JFK to LAX.
    #[derive(Clone, Default)]
    struct RecordingFinder {
        calls: Arc<Mutex<Vec<Vec<Flight>>>>,
    }

    impl PathFinder for RecordingFinder {
        fn find_path(&self, flights: &[Flight]) -> Result<Path, finder::Error> {
            self.calls.lock().unwrap().push(flights.to_vec());
            Ok(Path {
                start: "JFK".into(),
                finish: "LAX".into(),
            })
        }
    }
}
