//! `RelayServer`: Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::{Router, middleware};
use metrics_exporter_prometheus::PrometheusHandle;
use scoreline_auth::{Accounts, DEFAULT_PASSWORD_COST, InMemoryUserStore, TokenIssuer, UserStore};
use scoreline_relay::{ChannelDirectory, ConnectionId, ConnectionRegistry, RelayDispatcher};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::accounts::{login_handler, register_handler};
use crate::auth::require_auth;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::games::members_handler;
use crate::health::{self, HealthResponse};
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::session::run_ws_session;
use crate::websocket::table::ConnectionTable;

/// Dispatcher delivering through the live connection table.
pub type Dispatcher = RelayDispatcher<Arc<ConnectionTable>>;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live connections and their channel memberships.
    pub registry: ConnectionRegistry,
    /// Outbound queues, by connection ID.
    pub connections: Arc<ConnectionTable>,
    /// Fan-out of published events.
    pub dispatcher: Arc<Dispatcher>,
    /// Verifies bearer tokens for the HTTP API.
    pub issuer: Arc<TokenIssuer>,
    /// Registration and login.
    pub accounts: Accounts,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus handle for `/metrics`, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// The relay server.
pub struct RelayServer {
    state: AppState,
    cors_origin: HeaderValue,
}

impl RelayServer {
    /// Create a new server with an empty directory and an in-memory user
    /// store hashing at the default cost.
    pub fn new(config: ServerConfig, issuer: TokenIssuer) -> Result<Self, ServerError> {
        config.validate()?;
        let origin = config.frontend_url.trim_end_matches('/');
        let cors_origin = HeaderValue::from_str(origin)
            .map_err(|_| ServerError::InvalidOrigin(config.frontend_url.clone()))?;

        let directory = Arc::new(ChannelDirectory::new());
        let connections = Arc::new(ConnectionTable::new());
        let issuer = Arc::new(issuer);
        let accounts = Accounts::new(
            Arc::new(InMemoryUserStore::new()),
            issuer.clone(),
            DEFAULT_PASSWORD_COST,
        );
        let state = AppState {
            registry: ConnectionRegistry::new(directory.clone()),
            dispatcher: Arc::new(RelayDispatcher::new(directory, connections.clone())),
            connections,
            issuer,
            accounts,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            config: Arc::new(config),
            start_time: Instant::now(),
            metrics: None,
        };
        Ok(Self { state, cors_origin })
    }

    /// Keep accounts in `store`, hashing passwords at `password_cost`.
    #[must_use]
    pub fn with_user_store(mut self, store: Arc<dyn UserStore>, password_cost: u32) -> Self {
        self.state.accounts = Accounts::new(store, self.state.issuer.clone(), password_cost);
        self
    }

    /// Serve `/metrics` from `handle`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.state.metrics = Some(handle);
        self
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(self.cors_origin.clone())
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

        let api = Router::new()
            .route("/api/games/{game_id}/members", get(members_handler))
            .route_layer(middleware::from_fn_with_state(
                self.state.issuer.clone(),
                require_auth,
            ));

        Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/ws", get(ws_handler))
            .route("/api/auth/register", post(register_handler))
            .route("/api/auth/login", post(login_handler))
            .merge(api)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind the configured address and serve until shutdown.
    ///
    /// Returns the bound address (useful with port 0) and the server task.
    pub async fn listen(&self) -> Result<(SocketAddr, JoinHandle<()>), ServerError> {
        let listener = TcpListener::bind(self.state.config.bind_addr()).await?;
        let addr = listener.local_addr()?;
        let router = self.router();
        let token = self.state.shutdown.token();

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                error!(error = %e, "server error");
            }
            info!("server stopped");
        });

        info!(%addr, "relay server listening");
        Ok((addr, handle))
    }

    /// Shared handler state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The connection registry.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.state.registry
    }

    /// The channel directory.
    pub fn directory(&self) -> &Arc<ChannelDirectory> {
        self.state.registry.directory()
    }

    /// The shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.state.shutdown
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let directory = state.registry.directory();
    Json(health::health_check(
        state.start_time,
        state.registry.connection_count(),
        directory.channel_count(),
    ))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// GET /ws
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let max_message_size = state.config.max_message_size;
    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| run_ws_session(socket, ConnectionId::generate(), state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use scoreline_relay::ChannelId;
    use tower::ServiceExt;

    const SECRET: &str = "router-test-secret";

    fn make_server() -> RelayServer {
        RelayServer::new(ServerConfig::default(), TokenIssuer::new(SECRET, 3600))
            .unwrap()
            .with_user_store(Arc::new(InMemoryUserStore::new()), 4)
    }

    async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let parsed = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, parsed)
    }

    const ADA: &str = r#"{"email":"ada@example.com","password":"pw-1","name":"Ada"}"#;

    async fn get_json(app: Router, uri: &str, token: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut req = Request::builder().uri(uri);
        if let Some(token) = token {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let resp = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let parsed = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, parsed)
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let config = ServerConfig {
            frontend_url: "http://bad\norigin".into(),
            ..ServerConfig::default()
        };
        let err = RelayServer::new(config, TokenIssuer::new(SECRET, 60)).err().unwrap();
        assert!(matches!(err, ServerError::InvalidOrigin(_)));
    }

    #[test]
    fn zero_queue_capacity_is_rejected() {
        let config = ServerConfig {
            send_queue_capacity: 0,
            ..ServerConfig::default()
        };
        let err = RelayServer::new(config, TokenIssuer::new(SECRET, 60)).err().unwrap();
        assert!(matches!(err, ServerError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn register_returns_201_with_token_and_user() {
        let server = make_server();
        let (status, body) = post_json(server.router(), "/api/auth/register", ADA).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "ada@example.com");
        assert_eq!(body["user"]["name"], "Ada");
        assert!(body["user"].get("password").is_none());

        let token = body["token"].as_str().unwrap();
        let claims = server.state().issuer.verify(token).unwrap();
        assert_eq!(claims.user_id, body["user"]["id"].as_str().unwrap());
    }

    #[tokio::test]
    async fn register_duplicate_email_is_400() {
        let server = make_server();
        let _ = post_json(server.router(), "/api/auth/register", ADA).await;
        let (status, body) = post_json(server.router(), "/api/auth/register", ADA).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User already exists");
    }

    #[tokio::test]
    async fn register_with_bad_body_is_400() {
        let server = make_server();
        let (status, body) =
            post_json(server.router(), "/api/auth/register", r#"{"email":"a@b.c"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid request body");

        let (status, body) = post_json(
            server.router(),
            "/api/auth/register",
            r#"{"email":"","password":"pw"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email and password are required");
    }

    #[tokio::test]
    async fn login_round_trip_and_failures() {
        let server = make_server();
        let _ = post_json(server.router(), "/api/auth/register", ADA).await;

        let (status, body) = post_json(
            server.router(),
            "/api/auth/login",
            r#"{"email":"ada@example.com","password":"pw-1"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "ada@example.com");
        let token = body["token"].as_str().unwrap().to_owned();

        let (status, _) =
            get_json(server.router(), "/api/games/g/members", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);

        for creds in [
            r#"{"email":"ada@example.com","password":"wrong"}"#,
            r#"{"email":"nobody@example.com","password":"pw-1"}"#,
        ] {
            let (status, body) = post_json(server.router(), "/api/auth/login", creds).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["message"], "Invalid credentials");
        }
    }

    struct OfflineStore;

    impl UserStore for OfflineStore {
        fn find_by_email(
            &self,
            _email: &str,
        ) -> Result<Option<scoreline_auth::User>, scoreline_auth::UserStoreError> {
            Err(scoreline_auth::UserStoreError::Unavailable("offline".into()))
        }

        fn create(
            &self,
            _user: scoreline_auth::NewUser,
        ) -> Result<scoreline_auth::User, scoreline_auth::UserStoreError> {
            Err(scoreline_auth::UserStoreError::Unavailable("offline".into()))
        }
    }

    #[tokio::test]
    async fn store_failure_is_500() {
        let server = make_server().with_user_store(Arc::new(OfflineStore), 4);
        for uri in ["/api/auth/register", "/api/auth/login"] {
            let (status, body) = post_json(server.router(), uri, ADA).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["message"], "Server error");
        }
    }

    #[tokio::test]
    async fn health_reports_counts() {
        let server = make_server();
        let conn = ConnectionId::from("c1");
        server.registry().register(&conn);
        let _ = server.directory().join(&ChannelId::from("g"), &conn);

        let (status, body) = get_json(server.router(), "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["connections"], 1);
        assert_eq!(body["channels"], 1);
        assert!(body["uptime_secs"].is_number());
    }

    #[tokio::test]
    async fn metrics_without_recorder_is_404() {
        let server = make_server();
        let resp = server
            .router()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_with_recorder_renders_text() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let server = make_server().with_metrics(recorder.handle());
        let resp = server
            .router()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }

    #[tokio::test]
    async fn members_requires_auth() {
        let server = make_server();
        let (status, body) = get_json(server.router(), "/api/games/g/members", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Please authenticate");
    }

    #[tokio::test]
    async fn members_lists_sorted_ids() {
        let server = make_server();
        for id in ["c2", "c1"] {
            let conn = ConnectionId::from(id);
            server.registry().register(&conn);
            let _ = server.directory().join(&ChannelId::from("game-42"), &conn);
        }
        let token = TokenIssuer::new(SECRET, 3600).issue("user-1").unwrap();

        let (status, body) =
            get_json(server.router(), "/api/games/game-42/members", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["gameId"], "game-42");
        assert_eq!(body["members"], serde_json::json!(["c1", "c2"]));
        assert_eq!(body["count"], 2);
    }

    #[tokio::test]
    async fn members_of_unknown_game_is_empty() {
        let server = make_server();
        let token = TokenIssuer::new(SECRET, 3600).issue("user-1").unwrap();
        let (status, body) =
            get_json(server.router(), "/api/games/nowhere/members", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn cors_allows_frontend_origin() {
        let server = make_server();
        let req = Request::builder()
            .uri("/health")
            .header("origin", "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let resp = server.router().oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers()["access-control-allow-origin"],
            "http://localhost:3000"
        );
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let (status, _) = get_json(make_server().router(), "/nonexistent", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listen_binds_and_stops_on_shutdown() {
        let server = make_server();
        let (addr, handle) = server.listen().await.unwrap();
        assert_ne!(addr.port(), 0);
        server.shutdown().shutdown();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("shutdown timed out")
            .expect("join error");
    }
}
