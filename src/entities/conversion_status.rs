use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversion settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl fmt::Display for ConversionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConversionStatus {
    /// Convert from database string representation
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Only confirmed conversions are summed into earnings.
    pub const fn counts_toward_earnings(&self) -> bool {
        matches!(self, Self::Confirmed)
    }

    /// A link with revenue-bearing conversions cannot be deleted.
    pub const fn blocks_link_deletion(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for status in [
            ConversionStatus::Pending,
            ConversionStatus::Confirmed,
            ConversionStatus::Cancelled,
        ] {
            assert_eq!(ConversionStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(ConversionStatus::from_str("paid"), None);
    }

    #[test]
    fn test_earnings_filter() {
        assert!(ConversionStatus::Confirmed.counts_toward_earnings());
        assert!(!ConversionStatus::Pending.counts_toward_earnings());
        assert!(!ConversionStatus::Cancelled.counts_toward_earnings());
    }

    #[test]
    fn test_deletion_guard() {
        assert!(ConversionStatus::Pending.blocks_link_deletion());
        assert!(ConversionStatus::Confirmed.blocks_link_deletion());
        assert!(!ConversionStatus::Cancelled.blocks_link_deletion());
    }
}
