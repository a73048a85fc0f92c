use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::role::Role;

/// A single CMS capability. Checked by set membership after the effective
/// set is resolved for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageMasters,
    ManageContent,
    ManageUsers,
    ManageInterests,
    ManageConversions,
    ViewAuditLogs,
}

impl Permission {
    /// Convert from the string form used in the `user.permissions` override
    /// column and in API payloads.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "manage_masters" => Some(Self::ManageMasters),
            "manage_content" => Some(Self::ManageContent),
            "manage_users" => Some(Self::ManageUsers),
            "manage_interests" => Some(Self::ManageInterests),
            "manage_conversions" => Some(Self::ManageConversions),
            "view_audit_logs" => Some(Self::ViewAuditLogs),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ManageMasters => "manage_masters",
            Self::ManageContent => "manage_content",
            Self::ManageUsers => "manage_users",
            Self::ManageInterests => "manage_interests",
            Self::ManageConversions => "manage_conversions",
            Self::ViewAuditLogs => "view_audit_logs",
        }
    }

    pub fn all() -> HashSet<Self> {
        HashSet::from([
            Self::ManageMasters,
            Self::ManageContent,
            Self::ManageUsers,
            Self::ManageInterests,
            Self::ManageConversions,
            Self::ViewAuditLogs,
        ])
    }
}

/// Base permission set granted by a role before per-user overrides.
fn base_permissions(role: Role) -> HashSet<Permission> {
    match role {
        Role::User => HashSet::new(),
        Role::Admin | Role::SuperAdmin => Permission::all(),
    }
}

/// Resolve the effective permission set for a session: the role's base set
/// unioned with the user's explicit override set (stored as a JSON array of
/// permission strings). Computed at session resolution, never persisted.
/// Unknown strings in the override column are ignored.
pub fn effective_permissions(role: Role, overrides: Option<&str>) -> HashSet<Permission> {
    let mut set = base_permissions(role);

    if let Some(raw) = overrides
        && let Ok(names) = serde_json::from_str::<Vec<String>>(raw)
    {
        set.extend(names.iter().filter_map(|n| Permission::from_str(n)));
    }

    set
}
