pub mod admin_log;
pub mod auth_account;
pub mod content;
pub mod content_status;
pub mod contribution;
pub mod contribution_type;
pub mod conversion;
pub mod conversion_status;
pub mod interest;
pub mod interest_status;
pub mod magic_link_token;
pub mod master;
pub mod permission;
pub mod referral_click;
pub mod referral_link;
pub mod role;
pub mod user;

pub use content_status::ContentStatus;
pub use contribution_type::ContributionType;
pub use conversion_status::ConversionStatus;
pub use interest_status::InterestStatus;
pub use permission::Permission;
pub use role::Role;
