use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::http::response::text;
use crate::http::server::AppState;
use crate::observability::StatsSnapshot;

#[derive(Debug, Default, Deserialize)]
pub struct SetupParams {
    #[serde(default)]
    pub domain: String,
}

/// Uptime plus forward and failure counts.
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.stats.snapshot())
}

/// Echo the request headers, every value per name.
pub async fn get_headers(headers: HeaderMap) -> Json<BTreeMap<String, Vec<String>>> {
    let mut echoed: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers.iter() {
        echoed
            .entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    Json(echoed)
}

pub async fn run_setup(
    State(state): State<AppState>,
    Query(params): Query<SetupParams>,
) -> Response {
    match state.setup.setup(&params.domain).await {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(e) => {
            tracing::info!(domain = %params.domain, code = e.code(), "Setup refused");
            text(StatusCode::INTERNAL_SERVER_ERROR, e.code())
        }
    }
}

pub async fn not_found() -> Response {
    text(StatusCode::NOT_FOUND, "Not found\n")
}
