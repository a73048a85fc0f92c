use serde::{Deserialize, Serialize};
use std::fmt;

/// Interest lifecycle status. The funnel only moves forward:
/// interested → contacted → booked → completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InterestStatus {
    #[default]
    Interested,
    Contacted,
    Booked,
    Completed,
}

impl fmt::Display for InterestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl InterestStatus {
    /// Convert from database string representation
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "interested" => Some(Self::Interested),
            "contacted" => Some(Self::Contacted),
            "booked" => Some(Self::Booked),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Interested => "interested",
            Self::Contacted => "contacted",
            Self::Booked => "booked",
            Self::Completed => "completed",
        }
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Interested => 0,
            Self::Contacted => 1,
            Self::Booked => 2,
            Self::Completed => 3,
        }
    }

    /// Whether a transition to `next` is legal. Backward and same-state
    /// moves are rejected; skipping forward (e.g. interested → booked) is
    /// allowed.
    pub const fn can_transition_to(self, next: Self) -> bool {
        next.rank() > self.rank()
    }
}
