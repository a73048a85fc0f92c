use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;

use crate::state::AppState;

/// Resident-memory ceiling before the process reports itself degraded.
const MAX_RSS_BYTES: u64 = 1024 * 1024 * 1024;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
    database: DatabaseHealth,
    memory: MemoryHealth,
}

#[derive(Serialize)]
struct DatabaseHealth {
    connected: bool,
    latency_ms: Option<u128>,
}

#[derive(Serialize)]
struct MemoryHealth {
    rss_bytes: Option<u64>,
    flagged: bool,
}

/// `GET /health`
///
/// 200 when the database answers `SELECT 1` and resident memory is under the
/// ceiling; 503 with `"degraded"` otherwise.
async fn health_check(State(state): State<AppState>) -> Response {
    let probe_start = Instant::now();
    let db_ok = state
        .db
        .execute(Statement::from_string(
            state.db.get_database_backend(),
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();
    let latency_ms = db_ok.then(|| probe_start.elapsed().as_millis());

    let rss_bytes = resident_memory_bytes();
    let memory_flagged = rss_bytes.is_some_and(|b| b > MAX_RSS_BYTES);

    let healthy = db_ok && !memory_flagged;
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        database: DatabaseHealth {
            connected: db_ok,
            latency_ms,
        },
        memory: MemoryHealth {
            rss_bytes,
            flagged: memory_flagged,
        },
    };

    (status_code, Json(body)).into_response()
}

/// Resident set size of this process, best-effort (Linux `/proc` only).
fn resident_memory_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}

/// Health route at the server root (used by deployment probes).
pub fn root_router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Same health handler under `/api/v1` for API clients.
pub fn api_router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
