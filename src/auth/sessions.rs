use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::RngCore;
use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::repo::User;
use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "sessionid";

/// Server-side session row. The cookie carries only the opaque token.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

/// 32 random bytes, base64url without padding.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}

impl Session {
    pub async fn create(db: &PgPool, user_id: Uuid, ttl: Duration) -> anyhow::Result<Session> {
        // opportunistic pruning keeps the table from accumulating stale rows
        sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(db)
            .await?;

        let token = generate_token();
        let expires_at = OffsetDateTime::now_utc() + ttl;
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING token, user_id, created_at, expires_at
            "#,
        )
        .bind(&token)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(db)
        .await?;
        debug!(user_id = %session.user_id, expires_at = %session.expires_at, "session created");
        Ok(session)
    }

    pub async fn delete(db: &PgPool, token: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Resolve a session token to its user. Only unexpired sessions of
    /// active users resolve.
    pub async fn resolve_user(db: &PgPool, token: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.is_active, u.is_staff, u.is_superuser,
                   u.created_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1 AND s.expires_at > now() AND u.is_active
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}

pub fn session_cookie(token: String, ttl: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(ttl)
        .build()
}

/// Name/path stub matching `session_cookie`, for `CookieJar::remove`.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Extracts the current session's user from the `sessionid` cookie.
pub struct SessionUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Auth("Unauthorized".into()))?;

        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(|| ApiError::Auth("Unauthorized".into()))?;

        match Session::resolve_user(&state.db, &token).await {
            Ok(Some(user)) => Ok(SessionUser(user)),
            Ok(None) => {
                warn!("unknown or expired session");
                Err(ApiError::Auth("Unauthorized".into()))
            }
            Err(e) => Err(ApiError::Internal(e)),
        }
    }
}

/// Session user with staff access, for the admin surface.
pub struct StaffUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for StaffUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SessionUser(user) = SessionUser::from_request_parts(parts, state).await?;
        if !user.is_staff {
            warn!(user_id = %user.id, "non-staff user on admin surface");
            return Err(ApiError::Forbidden("Staff access required".into()));
        }
        Ok(StaffUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_url_safe_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn session_cookie_is_http_only_and_scoped_to_root() {
        let cookie = session_cookie("tok".into(), Duration::days(14), false);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(Duration::days(14)));
    }

    #[test]
    fn secure_flag_follows_config() {
        let cookie = session_cookie("tok".into(), Duration::days(1), true);
        assert_eq!(cookie.secure(), Some(true));
    }
}
