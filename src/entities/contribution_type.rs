use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of gamified user action recorded in the contribution ledger.
/// Stored in SCREAMING_SNAKE_CASE to match the ledger's historical rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributionType {
    Login,
    Signup,
    Interest,
    ReferralClick,
    EventJoin,
    ProfileUpdate,
}

impl fmt::Display for ContributionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ContributionType {
    /// Convert from database string representation
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "LOGIN" => Some(Self::Login),
            "SIGNUP" => Some(Self::Signup),
            "INTEREST" => Some(Self::Interest),
            "REFERRAL_CLICK" => Some(Self::ReferralClick),
            "EVENT_JOIN" => Some(Self::EventJoin),
            "PROFILE_UPDATE" => Some(Self::ProfileUpdate),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::Signup => "SIGNUP",
            Self::Interest => "INTEREST",
            Self::ReferralClick => "REFERRAL_CLICK",
            Self::EventJoin => "EVENT_JOIN",
            Self::ProfileUpdate => "PROFILE_UPDATE",
        }
    }

    /// Points awarded for one action of this kind.
    pub const fn points(&self) -> i32 {
        match self {
            Self::Login | Self::ReferralClick => 1,
            Self::ProfileUpdate => 2,
            Self::Interest | Self::EventJoin => 5,
            Self::Signup => 10,
        }
    }
}
