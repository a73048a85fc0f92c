use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use oauth2::{AuthorizationCode, CsrfToken, Scope, TokenResponse};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, SqlErr,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::OptionalAuth;
use crate::auth::{extract_client_ip, jwt, magic_link, oauth, validate_email};
use crate::entities::permission::effective_permissions;
use crate::entities::{auth_account, user, ContributionType, Role};
use crate::error::AppError;
use crate::services::contribution_service::ContributionService;
use crate::state::AppState;
use crate::utils::generate_user_code;

/// Maximum attempts to mint a unique personal referral code at signup.
const MAX_REFERRAL_CODE_ATTEMPTS: u32 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the auth route group: `/auth/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/magic-link/request", post(magic_link_request))
        .route("/magic-link/verify", post(magic_link_verify))
        .route("/oauth/google", get(oauth_google_initiate))
        .route("/oauth/google/callback", get(oauth_google_callback))
        .route("/session", get(session))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct MagicLinkRequestBody {
    pub email: String,
}

#[derive(Deserialize)]
pub struct MagicLinkVerifyBody {
    pub token: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: String,
    pub locale: String,
    pub referral_code: String,
    pub created_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: UserResponse,
    pub permissions: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthInitiateQuery {
    pub redirect_uri: Option<String>,
}

#[derive(Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: String,
    pub state: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn user_response(u: &user::Model) -> UserResponse {
    UserResponse {
        id: u.id,
        email: u.email.clone(),
        display_name: u.display_name.clone(),
        avatar_url: u.avatar_url.clone(),
        role: u.role.clone(),
        locale: u.locale.clone(),
        referral_code: u.referral_code.clone(),
        created_at: u.created_at.to_rfc3339(),
    }
}

/// Create a user row with a freshly minted personal referral code and award
/// the SIGNUP contribution. The unique index on `referral_code` is the real
/// guard; the insert is retried on collision, bounded.
async fn create_user<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    display_name: Option<String>,
    avatar_url: Option<String>,
    client_ip: Option<String>,
) -> Result<user::Model, AppError> {
    for _ in 0..MAX_REFERRAL_CODE_ATTEMPTS {
        let now = Utc::now().fixed_offset();
        let candidate = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            display_name: Set(display_name.clone()),
            avatar_url: Set(avatar_url.clone()),
            role: Set(Role::User.as_str().to_string()),
            permissions: Set(None),
            is_active: Set(true),
            locale: Set("en".to_string()),
            referral_code: Set(generate_user_code()),
            last_login_at: Set(Some(now)),
            last_login_ip: Set(client_ip.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match candidate.insert(conn).await {
            Ok(model) => {
                ContributionService::award(conn, model.id, ContributionType::Signup, None).await?;
                return Ok(model);
            }
            Err(err) => match err.sql_err() {
                // Referral-code collision; mint another
                Some(SqlErr::UniqueConstraintViolation(_)) => {}
                _ => return Err(AppError::Internal(err.into())),
            },
        }
    }

    Err(AppError::Internal(anyhow::anyhow!(
        "Failed to generate a unique referral code after {MAX_REFERRAL_CODE_ATTEMPTS} attempts"
    )))
}

/// Update last-login metadata and award the LOGIN contribution.
async fn record_login(
    state: &AppState,
    user_model: user::Model,
    client_ip: Option<String>,
) -> Result<user::Model, AppError> {
    let now = Utc::now().fixed_offset();
    let mut active: user::ActiveModel = user_model.into();
    active.last_login_at = Set(Some(now));
    active.last_login_ip = Set(client_ip);
    active.updated_at = Set(now);
    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    ContributionService::award(&state.db, updated.id, ContributionType::Login, None).await?;
    Ok(updated)
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/v1/auth/magic-link/request`
///
/// Always answers with the same message so callers cannot probe which emails
/// have accounts.
async fn magic_link_request(
    State(state): State<AppState>,
    Json(body): Json<MagicLinkRequestBody>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = body.email.trim().to_lowercase();
    validate_email(&email).map_err(AppError::BadRequest)?;

    let record = magic_link::issue(&state.db, &email).await?;

    tracing::info!(
        email = %email,
        token = %record.token,
        "Magic sign-in link issued (email sending not yet implemented)"
    );

    Ok(Json(MessageResponse {
        message: "If the address is valid, a sign-in link has been sent.".to_string(),
    }))
}

/// `POST /api/v1/auth/magic-link/verify`
///
/// Consumes the single-use token; creates the account on first sign-in.
async fn magic_link_verify(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<MagicLinkVerifyBody>,
) -> Result<Json<AuthResponse>, AppError> {
    let record = magic_link::consume(&state.db, &body.token).await?;
    let email = record.email.to_lowercase();
    let client_ip = extract_client_ip(&headers);

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let user_model = if let Some(found) = existing {
        if !found.is_active {
            return Err(AppError::Forbidden("Account is deactivated.".to_string()));
        }
        record_login(&state, found, client_ip).await?
    } else {
        let txn = state
            .db
            .begin()
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        let created = create_user(&txn, &email, None, None, client_ip).await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        created
    };

    let token = jwt::generate_session_token(user_model.id, &user_model.role, &state.config)?;

    Ok(Json(AuthResponse {
        user: user_response(&user_model),
        token,
    }))
}

/// `GET /api/v1/auth/oauth/google`
async fn oauth_google_initiate(
    State(state): State<AppState>,
    Query(query): Query<OAuthInitiateQuery>,
) -> Result<Response, AppError> {
    if state.config.google_client_id.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "Google OAuth is not configured.".to_string(),
        ));
    }

    let client = oauth::google_client(&state.config)?;
    let state_token =
        jwt::generate_oauth_state(&state.config.jwt_secret, query.redirect_uri.as_deref())?;

    let (auth_url, _csrf) = client
        .authorize_url(|| CsrfToken::new(state_token))
        .add_scope(Scope::new("openid".to_string()))
        .add_scope(Scope::new("email".to_string()))
        .add_scope(Scope::new("profile".to_string()))
        .url();

    Ok(Redirect::to(auth_url.as_str()).into_response())
}

/// `GET /api/v1/auth/oauth/google/callback`
async fn oauth_google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<Response, AppError> {
    let state_claims = jwt::validate_oauth_state(&query.state, &state.config.jwt_secret)
        .map_err(|_| AppError::BadRequest("Invalid or expired OAuth state.".to_string()))?;

    let client = oauth::google_client(&state.config)?;
    let token_result = client
        .exchange_code(AuthorizationCode::new(query.code))
        .request_async(&reqwest::Client::new())
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to exchange authorization code: {e}")))?;

    let access_token = token_result.access_token().secret().clone();
    let google_user = oauth::fetch_google_userinfo(&access_token).await?;
    let email = google_user.email.trim().to_lowercase();
    let client_ip = extract_client_ip(&headers);

    let linked = auth_account::Entity::find()
        .filter(auth_account::Column::Provider.eq("google"))
        .filter(auth_account::Column::ProviderAccountId.eq(&google_user.sub))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let user_model = if let Some(account) = linked {
        let found = user::Entity::find_by_id(account.user_id)
            .one(&state.db)
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("User not found for account")))?;

        if !found.is_active {
            return Err(AppError::Forbidden("Account is deactivated.".to_string()));
        }
        record_login(&state, found, client_ip).await?
    } else {
        // First Google sign-in: the email must not belong to an existing
        // account created through another sign-in method.
        let email_taken = user::Entity::find()
            .filter(user::Column::Email.eq(&email))
            .one(&state.db)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        if email_taken.is_some() {
            return Err(AppError::Conflict(
                "Email is already registered via a different sign-in method.".to_string(),
            ));
        }

        let txn = state
            .db
            .begin()
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        let created = create_user(
            &txn,
            &email,
            google_user.name.clone(),
            google_user.picture.clone(),
            client_ip,
        )
        .await?;

        let account = auth_account::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(created.id),
            provider: Set("google".to_string()),
            provider_account_id: Set(google_user.sub.clone()),
            provider_email: Set(Some(email.clone())),
            created_at: Set(Utc::now().fixed_offset()),
        };
        account
            .insert(&txn)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        created
    };

    let token = jwt::generate_session_token(user_model.id, &user_model.role, &state.config)?;
    let auth_response = AuthResponse {
        user: user_response(&user_model),
        token,
    };

    // If redirect_uri was carried in the state, hand off to the frontend
    if let Some(redirect_uri) = state_claims.redirect_uri {
        let user_json =
            serde_json::to_string(&auth_response.user).unwrap_or_else(|_| "{}".to_string());
        let redirect_url = format!(
            "{}?provider=google&token={}&user={}",
            redirect_uri,
            urlencoding::encode(&auth_response.token),
            urlencoding::encode(&user_json)
        );
        return Ok(Redirect::to(&redirect_url).into_response());
    }

    // Fallback: return JSON for API clients
    Ok(Json(auth_response).into_response())
}

/// `GET /api/v1/auth/session`
///
/// Always 200: `null` for anonymous or invalid sessions, the session user
/// otherwise. The front end polls this and must never see an error status.
async fn session(OptionalAuth(user_opt): OptionalAuth) -> Json<Option<SessionResponse>> {
    let response = user_opt.map(|u| {
        let role = Role::from_str(&u.role).unwrap_or_default();
        let mut permissions: Vec<String> = effective_permissions(role, u.permissions.as_deref())
            .into_iter()
            .map(|p| p.as_str().to_string())
            .collect();
        permissions.sort_unstable();

        SessionResponse {
            user: user_response(&u),
            permissions,
        }
    });

    Json(response)
}
