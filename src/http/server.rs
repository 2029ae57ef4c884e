//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: admin routes behind a host dispatch middleware
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Check registrar credentials once the server is up
//!
//! # Design Decisions
//! - Dispatch is middleware so admin routes keep plain axum handlers
//! - Request ID set outermost so the trace span carries it

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::admin_router;
use crate::config::SubfwdConfig;
use crate::http::forward::forward;
use crate::http::proxy::UpstreamClient;
use crate::http::request::RequestUuid;
use crate::http::response::text;
use crate::lifecycle::startup::{build_state, StartupError};
use crate::observability::Stats;
use crate::resolver::{DnsLookup, TargetResolver};
use crate::routing::{HostParser, Route, Router as DispatchRouter};
use crate::setup::{DomainRegistrar, SetupFlow};
use crate::store::KvStore;
use crate::tracking::Tracker;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<DispatchRouter>,
    pub hosts: Arc<HostParser>,
    pub resolver: TargetResolver,
    pub setup: Arc<SetupFlow>,
    pub stats: Arc<Stats>,
    pub tracker: Tracker,
    pub client: UpstreamClient,
}

impl AppState {
    /// Assemble state from its collaborators. Must run inside a Tokio runtime
    /// when tracking is enabled.
    pub fn new(
        config: &SubfwdConfig,
        dns: Arc<dyn DnsLookup>,
        registrar: Arc<dyn DomainRegistrar>,
        store: Arc<dyn KvStore>,
    ) -> Result<Self, StartupError> {
        let hosts = &config.hosts;
        Ok(Self {
            router: Arc::new(DispatchRouter::new(&hosts.admin_host)),
            hosts: Arc::new(HostParser::new(&hosts.debug_aliases)),
            resolver: TargetResolver::new(dns.clone()),
            setup: Arc::new(SetupFlow::new(
                dns,
                registrar,
                &hosts.canonical_host,
                &hosts.app_domain_suffix,
            )),
            stats: Arc::new(Stats::new()),
            tracker: Tracker::spawn(&config.tracking, store),
            client: UpstreamClient::new()?,
        })
    }
}

/// HTTP server for the forwarding service.
pub struct HttpServer {
    router: Router,
    config: SubfwdConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a server with collaborators built from `config`.
    pub fn new(config: SubfwdConfig) -> Result<Self, StartupError> {
        let state = build_state(&config)?;
        Ok(Self::with_state(config, state))
    }

    /// Create a server around prebuilt state.
    pub fn with_state(config: SubfwdConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &SubfwdConfig, state: AppState) -> Router {
        admin_router(&config.admin, state.clone())
            .layer(middleware::from_fn_with_state(state, dispatch))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(RequestUuid))
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            admin_host = %self.config.hosts.admin_host,
            "HTTP server starting"
        );

        let setup = self.state.setup.clone();
        tokio::spawn(async move {
            setup.registrar_ready().await;
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &SubfwdConfig {
        &self.config
    }
}

/// Send each request to the favicon short-circuit, the admin routes or forwarding.
async fn dispatch(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match state.router.classify(&request) {
        Route::Favicon => text(StatusCode::NOT_FOUND, "Not found\n"),
        Route::Admin => next.run(request).await,
        Route::Forward => forward(&state, request).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistrarConfig;
    use crate::resolver::StaticZone;
    use crate::setup::HerokuRegistrar;
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::header;
    use tower::ServiceExt;

    fn server(zone: StaticZone) -> HttpServer {
        let config = SubfwdConfig::default();
        let registrar = Arc::new(HerokuRegistrar::new(&RegistrarConfig::default()).unwrap());
        let state =
            AppState::new(&config, Arc::new(zone), registrar, Arc::new(MemoryStore::new())).unwrap();
        HttpServer::with_state(config, state)
    }

    fn get(host: &str, path: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri(path)
            .header(header::HOST, host)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn favicon_is_404_for_every_host() {
        let app = server(StaticZone::new()).router();
        for host in ["subfwd.com", "www.example.com"] {
            let res = app.clone().oneshot(get(host, "/favicon.ico")).await.unwrap();
            assert_eq!(res.status(), StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn redirects_with_request_id() {
        let mut zone = StaticZone::new();
        zone.add_txt("subfwd-www.example.com", "http://example.org/landing");
        let server = server(zone);

        let res = server.router().oneshot(get("www.example.com", "/")).await.unwrap();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "http://example.org/landing");
        assert!(res.headers().contains_key("x-request-id"));
        assert_eq!(server.state.stats.forwards(), 1);
    }

    #[tokio::test]
    async fn admin_paths_on_other_hosts_are_forwarded() {
        let server = server(StaticZone::new());

        let res = server.router().oneshot(get("www.example.com", "/stats")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(server.state.stats.failures(), 1);
        assert_eq!(server.state.stats.forwards(), 0);
    }

    #[tokio::test]
    async fn malformed_host_is_500() {
        let res = server(StaticZone::new())
            .router()
            .oneshot(get("127.0.0.1", "/"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn invalid_substituted_target_is_400() {
        let mut zone = StaticZone::new();
        zone.add_txt("subfwd-www.example.com", "http$HEADER[x-missing]");
        let res = server(zone)
            .router()
            .oneshot(get("www.example.com", "/"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
