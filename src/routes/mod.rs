mod admin;
mod auth;
mod content;
mod conversions;
mod health;
mod interests;
mod masters;
mod referrals;
mod users;
mod videos;

use axum::Router;

use crate::state::AppState;

/// Build the complete application router.
///
/// Structure:
/// - `GET /health` — health check with uptime, database probe, and memory flag
/// - `GET /r/{code}` — referral click tracking + redirect
/// - `GET /videos/{file}` — local video serving with Range support
/// - `/api/v1/...` — JSON API route groups
pub fn router() -> Router<AppState> {
    let api_v1 = Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/referrals", referrals::router())
        .nest("/conversions", conversions::router())
        .nest("/masters", masters::router())
        .nest("/interests", interests::router())
        .nest("/content", content::router())
        .nest("/admin", admin::router())
        .merge(health::api_router());

    Router::new()
        .merge(health::root_router())
        .merge(referrals::track_router())
        .merge(videos::router())
        .nest("/api/v1", api_v1)
}
