use std::collections::HashSet;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sea_orm::EntityTrait;

use crate::auth::jwt;
use crate::entities::permission::effective_permissions;
use crate::entities::{user, Permission, Role};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Use as an extractor in handler parameters to require authentication:
/// ```ignore
/// async fn handler(AuthUser(user): AuthUser) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing authorization header.".to_string()))?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthorized("Invalid authorization header format.".to_string())
        })?;

        let claims = jwt::validate_session_token(token, &state.config.jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token.".to_string()))?;

        let user_id: uuid::Uuid = claims
            .sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid token subject.".to_string()))?;

        let user_model = user::Entity::find_by_id(user_id)
            .one(&state.db)
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .ok_or_else(|| AppError::Unauthorized("User not found.".to_string()))?;

        // Soft-deleted accounts authenticate as if they never existed
        if !user_model.is_active {
            return Err(AppError::Unauthorized("User not found.".to_string()));
        }

        Ok(Self(user_model))
    }
}

/// Authenticated user plus the effective permission set for this session:
/// the role's base permissions unioned with the per-user override column.
///
/// Permission checks are pure set membership; nothing is persisted.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: user::Model,
    pub role: Role,
    pub permissions: HashSet<Permission>,
}

impl CurrentUser {
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Require a specific permission for a CMS mutation.
    ///
    /// # Errors
    ///
    /// Returns 403 when the permission is absent from the session's set.
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Missing required permission: {}.",
                permission.as_str()
            )))
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user_model) = AuthUser::from_request_parts(parts, state).await?;

        // Unknown role strings demote to the regular-user base set
        let role = Role::from_str(&user_model.role).unwrap_or_default();
        let permissions = effective_permissions(role, user_model.permissions.as_deref());

        Ok(Self {
            user: user_model,
            role,
            permissions,
        })
    }
}

/// Wraps an optional authenticated user for routes that serve both signed-in
/// and anonymous callers (e.g. session introspection).
///
/// Resolution failures are swallowed at this boundary instead of being
/// logged or propagated, so an expired token never produces error noise.
pub struct OptionalAuth(pub Option<user::Model>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(AuthUser(u)) => Ok(Self(Some(u))),
            Err(_) => Ok(Self(None)),
        }
    }
}
