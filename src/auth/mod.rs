pub mod jwt;
pub mod magic_link;
pub mod middleware;
pub mod oauth;

use axum::http::HeaderMap;

/// Extract the client IP address from request headers.
///
/// Checks `X-Forwarded-For` first (for reverse proxies), taking the first
/// entry of a comma-separated list, then falls back to `X-Real-IP`.
#[must_use]
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(std::string::ToString::to_string)
        })
}

/// Extract the raw User-Agent header, if present.
#[must_use]
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(std::string::ToString::to_string)
}

/// Validate email format (basic check for `@` and non-empty parts).
///
/// # Errors
///
/// Returns a descriptive error message if the email is invalid.
pub fn validate_email(email: &str) -> Result<(), String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err("Email is required.".to_string());
    }
    let parts: Vec<&str> = trimmed.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() || !parts[1].contains('.') {
        return Err("Invalid email format.".to_string());
    }
    Ok(())
}
