//! Admin surface, served only on the admin host.
//!
//! | Path | Handler |
//! |------|---------|
//! | `/` | `index.html` from the static directory |
//! | `/static/*` | static assets |
//! | `/stats` | JSON counters |
//! | `/headers` | JSON echo of request headers |
//! | `/setup?domain=` | domain provisioning |

pub mod handlers;

use std::path::Path;

use axum::{routing::get, Router};
use tower_http::services::{ServeDir, ServeFile};

use crate::config::AdminConfig;
use crate::http::server::AppState;
use self::handlers::*;

pub fn admin_router(config: &AdminConfig, state: AppState) -> Router {
    let dir = Path::new(&config.static_dir);

    Router::new()
        .route("/stats", get(get_stats))
        .route("/headers", get(get_headers))
        .route("/setup", get(run_setup))
        .route_service("/", ServeFile::new(dir.join("index.html")))
        .nest_service("/static", ServeDir::new(dir))
        .fallback(not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RegistrarConfig, SubfwdConfig};
    use crate::resolver::StaticZone;
    use crate::setup::HerokuRegistrar;
    use crate::store::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let config = SubfwdConfig::default();
        let registrar = Arc::new(HerokuRegistrar::new(&RegistrarConfig::default()).unwrap());
        let state = AppState::new(
            &config,
            Arc::new(StaticZone::new()),
            registrar,
            Arc::new(MemoryStore::new()),
        )
        .unwrap();
        admin_router(&config.admin, state)
    }

    async fn body(res: axum::response::Response) -> String {
        String::from_utf8(to_bytes(res.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap()
    }

    #[tokio::test]
    async fn stats_reports_counters() {
        let res = app()
            .oneshot(Request::get("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body(res).await).unwrap();
        assert_eq!(json["Forwards"], 0);
        assert_eq!(json["Failures"], 0);
        assert!(json["Uptime"].is_string());
    }

    #[tokio::test]
    async fn headers_are_echoed() {
        let req = Request::get("/headers")
            .header("x-probe", "one")
            .header("x-probe", "two")
            .body(Body::empty())
            .unwrap();
        let res = app().oneshot(req).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&body(res).await).unwrap();
        assert_eq!(json["x-probe"], serde_json::json!(["one", "two"]));
    }

    #[tokio::test]
    async fn setup_without_domain_is_domain_error() {
        let res = app()
            .oneshot(Request::get("/setup").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(res).await, "DOMAIN_ERROR");
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let res = app()
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
