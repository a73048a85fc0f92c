use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::AppError;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the video-serving route: `/videos/{file}`
pub fn router() -> Router<AppState> {
    Router::new().route("/videos/{file}", get(serve_video))
}

// ─────────────────────────────────────────────────────────────────────────────
// Range parsing
// ─────────────────────────────────────────────────────────────────────────────

/// A parsed single-range `Range` header.
#[derive(Debug, PartialEq, Eq)]
enum RangeSpec {
    /// `bytes=a-b`
    FromTo(u64, u64),
    /// `bytes=a-`
    From(u64),
    /// `bytes=-n` (last n bytes)
    Suffix(u64),
}

/// Parse a `Range` header. Only single byte ranges are supported; anything
/// else is treated as unsatisfiable by the caller.
fn parse_range(header: &str) -> Option<RangeSpec> {
    let spec = header.strip_prefix("bytes=")?.trim();
    if spec.contains(',') {
        return None;
    }

    let (start_str, end_str) = spec.split_once('-')?;

    match (start_str.is_empty(), end_str.is_empty()) {
        (true, false) => end_str.parse().ok().map(RangeSpec::Suffix),
        (false, true) => start_str.parse().ok().map(RangeSpec::From),
        (false, false) => {
            let start: u64 = start_str.parse().ok()?;
            let end: u64 = end_str.parse().ok()?;
            (start <= end).then_some(RangeSpec::FromTo(start, end))
        }
        (true, true) => None,
    }
}

/// Resolve a parsed range against the file size into inclusive (start, end)
/// byte offsets. `None` means 416.
fn resolve_range(spec: &RangeSpec, total: u64) -> Option<(u64, u64)> {
    if total == 0 {
        return None;
    }
    match *spec {
        RangeSpec::FromTo(start, end) => {
            (start < total).then(|| (start, end.min(total - 1)))
        }
        RangeSpec::From(start) => (start < total).then(|| (start, total - 1)),
        RangeSpec::Suffix(n) => {
            (n > 0).then(|| (total.saturating_sub(n), total - 1))
        }
    }
}

/// Content type by file extension; octet-stream for anything unrecognized.
fn content_type_of(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next().unwrap_or("") {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "m4v" => "video/x-m4v",
        _ => "application/octet-stream",
    }
}

/// Reject names that could escape the video directory.
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains("..")
        && !name.contains('~')
        && !name.contains('/')
        && !name.contains('\\')
}

// ─────────────────────────────────────────────────────────────────────────────
// Handler
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /videos/{file}`
///
/// Serves local video files with single-range HTTP Range support:
/// `Accept-Ranges: bytes`, 206 with `Content-Range: bytes start-end/total`
/// for a satisfiable range, 416 otherwise, 200 for rangeless requests.
async fn serve_video(
    State(state): State<AppState>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if !is_safe_file_name(&file) {
        return Err(AppError::BadRequest("Invalid file name.".to_string()));
    }

    let path = std::path::Path::new(&state.config.video_dir).join(&file);
    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|_| AppError::NotFound("Video not found.".to_string()))?;
    if !metadata.is_file() {
        return Err(AppError::NotFound("Video not found.".to_string()));
    }

    let total = metadata.len();
    let content_type = content_type_of(&file);

    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(|raw| parse_range(raw).and_then(|spec| resolve_range(&spec, total)));

    match range {
        None => {
            // No Range header: whole file
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| AppError::Internal(e.into()))?;

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::ACCEPT_RANGES, "bytes")
                .header(header::CONTENT_LENGTH, total)
                .body(Body::from(bytes))
                .map_err(|e| AppError::Internal(e.into()))
        }
        Some(None) => {
            // Range present but malformed or unsatisfiable
            Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{total}"))
                .body(Body::empty())
                .map_err(|e| AppError::Internal(e.into()))
        }
        Some(Some((start, end))) => {
            let length = end - start + 1;

            let mut fh = tokio::fs::File::open(&path)
                .await
                .map_err(|e| AppError::Internal(e.into()))?;
            fh.seek(std::io::SeekFrom::Start(start))
                .await
                .map_err(|e| AppError::Internal(e.into()))?;

            let mut buf = vec![0_u8; usize::try_from(length).map_err(|e| AppError::Internal(e.into()))?];
            fh.read_exact(&mut buf)
                .await
                .map_err(|e| AppError::Internal(e.into()))?;

            Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::ACCEPT_RANGES, "bytes")
                .header(header::CONTENT_LENGTH, length)
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {start}-{end}/{total}"),
                )
                .body(Body::from(buf))
                .map_err(|e| AppError::Internal(e.into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_forms() {
        assert_eq!(parse_range("bytes=0-499"), Some(RangeSpec::FromTo(0, 499)));
        assert_eq!(parse_range("bytes=500-"), Some(RangeSpec::From(500)));
        assert_eq!(parse_range("bytes=-200"), Some(RangeSpec::Suffix(200)));
        assert_eq!(parse_range("bytes=-"), None);
        assert_eq!(parse_range("bytes=9-5"), None); // inverted
        assert_eq!(parse_range("bytes=0-1,5-9"), None); // multi-range
        assert_eq!(parse_range("items=0-1"), None);
    }

    #[test]
    fn test_resolve_range() {
        assert_eq!(resolve_range(&RangeSpec::FromTo(0, 499), 1000), Some((0, 499)));
        // End clamps to the last byte
        assert_eq!(resolve_range(&RangeSpec::FromTo(900, 2000), 1000), Some((900, 999)));
        assert_eq!(resolve_range(&RangeSpec::From(500), 1000), Some((500, 999)));
        assert_eq!(resolve_range(&RangeSpec::Suffix(200), 1000), Some((800, 999)));
        // Suffix longer than the file serves the whole file
        assert_eq!(resolve_range(&RangeSpec::Suffix(5000), 1000), Some((0, 999)));
        // Start past EOF is unsatisfiable
        assert_eq!(resolve_range(&RangeSpec::From(1000), 1000), None);
        assert_eq!(resolve_range(&RangeSpec::Suffix(0), 1000), None);
        assert_eq!(resolve_range(&RangeSpec::From(0), 0), None);
    }

    #[test]
    fn test_safe_file_names() {
        assert!(is_safe_file_name("intro.mp4"));
        assert!(!is_safe_file_name("../etc/passwd"));
        assert!(!is_safe_file_name("~root.mp4"));
        assert!(!is_safe_file_name("a/b.mp4"));
        assert!(!is_safe_file_name(""));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type_of("a.mp4"), "video/mp4");
        assert_eq!(content_type_of("a.webm"), "video/webm");
        assert_eq!(content_type_of("a.bin"), "application/octet-stream");
    }
}
