mod common;

use std::time::Instant;

use axum::http::StatusCode;
use axum::Router;
use migration::{Migrator, MigratorTrait};

use tatami_api::state::AppState;

const FILE_BODY: &[u8] = b"0123456789abcdef";

/// Build an app whose video directory is a scratch dir holding one file.
async fn test_app() -> anyhow::Result<(Router, tempfile::TempDir)> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("clip.mp4"), FILE_BODY)?;

    let db = sea_orm::Database::connect("sqlite::memory:")
        .await
        .unwrap_or_default();
    Migrator::up(&db, None).await.unwrap_or_default();

    let mut config = common::test_config();
    config.video_dir = dir.path().to_string_lossy().to_string();

    let state = AppState {
        db,
        config,
        started_at: Instant::now(),
    };

    Ok((tatami_api::routes::router().with_state(state), dir))
}

#[tokio::test]
async fn full_file_without_range() -> anyhow::Result<()> {
    let (app, _dir) = test_app().await?;

    let (status, headers, body) =
        common::send(&app, "GET", "/videos/clip.mp4", None, None, &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get("accept-ranges").and_then(|v| v.to_str().ok()),
        Some("bytes")
    );
    assert_eq!(
        headers.get("content-type").and_then(|v| v.to_str().ok()),
        Some("video/mp4")
    );
    assert_eq!(body.as_bytes(), FILE_BODY);
    Ok(())
}

#[tokio::test]
async fn bounded_range_returns_206_with_exact_content_range() -> anyhow::Result<()> {
    let (app, _dir) = test_app().await?;

    let (status, headers, body) = common::send(
        &app,
        "GET",
        "/videos/clip.mp4",
        None,
        None,
        &[("range", "bytes=0-3")],
    )
    .await;
    assert_eq!(status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        headers.get("content-range").and_then(|v| v.to_str().ok()),
        Some("bytes 0-3/16")
    );
    assert_eq!(
        headers.get("accept-ranges").and_then(|v| v.to_str().ok()),
        Some("bytes")
    );
    assert_eq!(body, "0123");
    Ok(())
}

#[tokio::test]
async fn open_ended_range_serves_to_eof() -> anyhow::Result<()> {
    let (app, _dir) = test_app().await?;

    let (status, headers, body) = common::send(
        &app,
        "GET",
        "/videos/clip.mp4",
        None,
        None,
        &[("range", "bytes=10-")],
    )
    .await;
    assert_eq!(status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        headers.get("content-range").and_then(|v| v.to_str().ok()),
        Some("bytes 10-15/16")
    );
    assert_eq!(body, "abcdef");
    Ok(())
}

#[tokio::test]
async fn suffix_range_serves_last_bytes() -> anyhow::Result<()> {
    let (app, _dir) = test_app().await?;

    let (status, headers, body) = common::send(
        &app,
        "GET",
        "/videos/clip.mp4",
        None,
        None,
        &[("range", "bytes=-4")],
    )
    .await;
    assert_eq!(status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        headers.get("content-range").and_then(|v| v.to_str().ok()),
        Some("bytes 12-15/16")
    );
    assert_eq!(body, "cdef");
    Ok(())
}

#[tokio::test]
async fn range_past_eof_is_416() -> anyhow::Result<()> {
    let (app, _dir) = test_app().await?;

    let (status, headers, _body) = common::send(
        &app,
        "GET",
        "/videos/clip.mp4",
        None,
        None,
        &[("range", "bytes=99-")],
    )
    .await;
    assert_eq!(status, StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(
        headers.get("content-range").and_then(|v| v.to_str().ok()),
        Some("bytes */16")
    );
    Ok(())
}

#[tokio::test]
async fn end_clamps_to_file_size() -> anyhow::Result<()> {
    let (app, _dir) = test_app().await?;

    let (status, headers, body) = common::send(
        &app,
        "GET",
        "/videos/clip.mp4",
        None,
        None,
        &[("range", "bytes=8-999")],
    )
    .await;
    assert_eq!(status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        headers.get("content-range").and_then(|v| v.to_str().ok()),
        Some("bytes 8-15/16")
    );
    assert_eq!(body, "89abcdef");
    Ok(())
}

#[tokio::test]
async fn traversal_names_rejected() -> anyhow::Result<()> {
    let (app, _dir) = test_app().await?;

    let (status, _headers, _body) =
        common::send(&app, "GET", "/videos/..%2Fsecret.mp4", None, None, &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _headers, _body) =
        common::send(&app, "GET", "/videos/~backup.mp4", None, None, &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn missing_file_is_404() -> anyhow::Result<()> {
    let (app, _dir) = test_app().await?;

    let (status, _headers, _body) =
        common::send(&app, "GET", "/videos/nope.mp4", None, None, &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
