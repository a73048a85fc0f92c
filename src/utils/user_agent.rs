/// Fallback value when the device or browser cannot be classified.
const UNKNOWN: &str = "Unknown";

/// Best-effort classification of a raw User-Agent header into
/// (device, browser). Unknown or absent values become `"Unknown"`.
///
/// Click rows only need coarse buckets for the stats breakdowns, so this
/// matches well-known substrings rather than shipping a full UA database.
pub fn parse_user_agent(user_agent: Option<&str>) -> (String, String) {
    let Some(ua) = user_agent.filter(|s| !s.trim().is_empty()) else {
        return (UNKNOWN.to_string(), UNKNOWN.to_string());
    };

    (device_of(ua).to_string(), browser_of(ua).to_string())
}

fn device_of(ua: &str) -> &'static str {
    let lower = ua.to_lowercase();
    if lower.contains("bot") || lower.contains("crawler") || lower.contains("spider") {
        "Bot"
    } else if lower.contains("ipad") || lower.contains("tablet") {
        "Tablet"
    } else if lower.contains("mobi") || lower.contains("iphone") || lower.contains("android") {
        "Mobile"
    } else if lower.contains("mozilla") || lower.contains("opera") {
        "Desktop"
    } else {
        UNKNOWN
    }
}

fn browser_of(ua: &str) -> &'static str {
    // Order matters: Chrome UAs contain "Safari", Edge UAs contain "Chrome"
    if ua.contains("Edg/") || ua.contains("Edge/") {
        "Edge"
    } else if ua.contains("OPR/") || ua.contains("Opera") {
        "Opera"
    } else if ua.contains("Firefox/") {
        "Firefox"
    } else if ua.contains("Chrome/") || ua.contains("CriOS/") {
        "Chrome"
    } else if ua.contains("Safari/") {
        "Safari"
    } else {
        UNKNOWN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
                                 AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 \
                                 Mobile/15E148 Safari/604.1";
    const FIREFOX_LINUX: &str =
        "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";

    #[test]
    fn test_chrome_desktop() {
        assert_eq!(
            parse_user_agent(Some(CHROME_DESKTOP)),
            ("Desktop".to_string(), "Chrome".to_string())
        );
    }

    #[test]
    fn test_safari_iphone() {
        assert_eq!(
            parse_user_agent(Some(SAFARI_IPHONE)),
            ("Mobile".to_string(), "Safari".to_string())
        );
    }

    #[test]
    fn test_firefox_linux() {
        assert_eq!(
            parse_user_agent(Some(FIREFOX_LINUX)),
            ("Desktop".to_string(), "Firefox".to_string())
        );
    }

    #[test]
    fn test_missing_header_is_unknown() {
        assert_eq!(
            parse_user_agent(None),
            ("Unknown".to_string(), "Unknown".to_string())
        );
        assert_eq!(
            parse_user_agent(Some("   ")),
            ("Unknown".to_string(), "Unknown".to_string())
        );
    }

    #[test]
    fn test_gibberish_is_unknown() {
        assert_eq!(
            parse_user_agent(Some("curl/8.4.0")),
            ("Unknown".to_string(), "Unknown".to_string())
        );
    }

    #[test]
    fn test_bot() {
        let (device, _browser) =
            parse_user_agent(Some("Mozilla/5.0 (compatible; Googlebot/2.1)"));
        assert_eq!(device, "Bot");
    }
}
