use serde::{Deserialize, Serialize};
use std::fmt;

/// CMS article lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    #[default]
    Draft,
    Review,
    Published,
    Archived,
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ContentStatus {
    /// Convert from database string representation
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "review" => Some(Self::Review),
            "published" => Some(Self::Published),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Review => "review",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }

    /// Whether articles in this status are publicly visible
    pub const fn is_public(&self) -> bool {
        matches!(self, Self::Published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for status in [
            ContentStatus::Draft,
            ContentStatus::Review,
            ContentStatus::Published,
            ContentStatus::Archived,
        ] {
            assert_eq!(ContentStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(ContentStatus::from_str("live"), None);
    }

    #[test]
    fn test_only_published_is_public() {
        assert!(ContentStatus::Published.is_public());
        assert!(!ContentStatus::Draft.is_public());
        assert!(!ContentStatus::Review.is_public());
        assert!(!ContentStatus::Archived.is_public());
    }
}
