pub mod referral_code;
pub mod user_agent;

pub use referral_code::{
    generate_link_code, generate_user_code, is_valid_link_code, normalize_code,
    LINK_CODE_LENGTH, LINK_CODE_LENGTH_WIDE,
};
pub use user_agent::parse_user_agent;
