use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::AppError,
    rbac::Role,
    repository::RepositoryState,
};

/// Name of the HttpOnly cookie holding the session token.
pub const SESSION_COOKIE: &str = "atmosfera_session";

/// Header accepted as a session in the local environment only.
pub const DEV_USER_HEADER: &str = "x-user-id";

/// Claims
///
/// Payload of the HS256 session token. The role is deliberately absent: it is
/// read from the stored profile on every request, so a role change takes
/// effect without re-issuing tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the profile id.
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of a request: who, and with which stored role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    /// Fails with 403 unless the stored role is one of `allowed`.
    pub fn require(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "role {} may not perform this action",
                self.role
            )))
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// issue_token
///
/// Signs a session token for `user_id` valid for `ttl_secs`.
pub fn issue_token(user_id: Uuid, secret: &str, ttl_secs: u64) -> Result<String, AppError> {
    let now = now_secs();
    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + ttl_secs) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
}

/// Verifies signature and expiry; any failure is an unauthenticated request.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected session token");
        AppError::Unauthorized
    })
}

pub fn build_session_cookie(token: &str, max_age_secs: u64, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly{secure_flag}; SameSite=Lax; Path=/; Max-Age={max_age_secs}"
    )
}

pub fn build_clear_cookie(secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}=; HttpOnly{secure_flag}; SameSite=Lax; Path=/; Max-Age=0")
}

/// Finds the session token in any `Cookie` header.
pub fn extract_session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .map(str::trim)
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// resolve_session
///
/// Turns request headers into an `AuthUser`:
/// 1. Local only: an `x-user-id` header naming an existing profile.
/// 2. A bearer token, else the session cookie.
/// 3. The profile lookup, which supplies the current role. A token for a
///    deleted profile is rejected.
///
/// Every failure to authenticate is `AppError::Unauthorized`; storage failures
/// pass through unchanged.
pub async fn resolve_session(
    headers: &HeaderMap,
    repo: &RepositoryState,
    config: &AppConfig,
) -> Result<AuthUser, AppError> {
    if config.env == Env::Local {
        let dev_user = headers
            .get(DEV_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok());
        if let Some(user_id) = dev_user {
            if let Some(user) = repo.get_user(user_id).await? {
                return Ok(AuthUser {
                    id: user.id,
                    role: user.role,
                });
            }
        }
    }

    let token = bearer_token(headers)
        .or_else(|| extract_session_cookie(headers))
        .ok_or(AppError::Unauthorized)?;
    let claims = verify_token(&token, &config.jwt_secret)?;

    let user = repo
        .get_user(claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(AuthUser {
        id: user.id,
        role: user.role,
    })
}

/// Makes `AuthUser` a handler argument; rejects with 401 when no session resolves.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);
        resolve_session(&parts.headers, &repo, &config).await
    }
}
