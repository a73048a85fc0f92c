use rand::Rng;

/// Characters allowed in referral codes (uppercase alphanumeric)
const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Prefix carried by every referral-link code
const LINK_CODE_PREFIX: &str = "REF";

/// Random suffix length of a normal link code (`REF` + 6 chars)
pub const LINK_CODE_LENGTH: usize = 6;

/// Widened suffix length used after repeated collisions
pub const LINK_CODE_LENGTH_WIDE: usize = 10;

/// Length of a user's personal referral code (no prefix)
const USER_CODE_LENGTH: usize = 8;

fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_CHARS.len());
            CODE_CHARS[idx] as char
        })
        .collect()
}

/// Generate a referral-link code: `REF` followed by `suffix_len` random
/// uppercase alphanumeric characters.
pub fn generate_link_code(suffix_len: usize) -> String {
    format!("{LINK_CODE_PREFIX}{}", random_suffix(suffix_len))
}

/// Generate a user's personal referral code assigned at signup.
pub fn generate_user_code() -> String {
    random_suffix(USER_CODE_LENGTH)
}

/// Validate referral-link code format (normal or widened length).
pub fn is_valid_link_code(code: &str) -> bool {
    let Some(suffix) = code.strip_prefix(LINK_CODE_PREFIX) else {
        return false;
    };
    (suffix.len() == LINK_CODE_LENGTH || suffix.len() == LINK_CODE_LENGTH_WIDE)
        && suffix.bytes().all(|b| CODE_CHARS.contains(&b))
}

/// Normalize an inbound code (uppercase, trimmed).
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_code_format() {
        let code = generate_link_code(LINK_CODE_LENGTH);
        assert_eq!(code.len(), 3 + LINK_CODE_LENGTH);
        assert!(code.starts_with("REF"));
        assert!(is_valid_link_code(&code));
    }

    #[test]
    fn test_wide_link_code_format() {
        let code = generate_link_code(LINK_CODE_LENGTH_WIDE);
        assert_eq!(code.len(), 3 + LINK_CODE_LENGTH_WIDE);
        assert!(is_valid_link_code(&code));
    }

    #[test]
    fn test_user_code_length() {
        let code = generate_user_code();
        assert_eq!(code.len(), USER_CODE_LENGTH);
        assert!(code.bytes().all(|b| CODE_CHARS.contains(&b)));
    }

    #[test]
    fn test_code_uniqueness() {
        let codes: std::collections::HashSet<String> = (0..1000)
            .map(|_| generate_link_code(LINK_CODE_LENGTH))
            .collect();
        // Should have very few collisions (likely none in 1000 codes)
        assert!(codes.len() > 990);
    }

    #[test]
    fn test_is_valid_link_code() {
        assert!(is_valid_link_code("REFAB12CD"));
        assert!(!is_valid_link_code("AB12CD")); // missing prefix
        assert!(!is_valid_link_code("REFab12cd")); // lowercase
        assert!(!is_valid_link_code("REFAB12")); // wrong suffix length
        assert!(!is_valid_link_code("REFAB12C!")); // invalid char
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  refab12cd  "), "REFAB12CD");
    }
}
