use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use lazy_static::lazy_static;
use regex::Regex;
use time::Duration;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{SignInRequest, UserSchema},
        password::{hash_password, validate_password, verify_password},
        repo::{self, User},
        sessions::{self, Session, SessionUser, SESSION_COOKIE},
    },
    error::ApiError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn session_ttl(state: &AppState) -> Duration {
    Duration::days(state.config.session_ttl_days)
}

/// Rotate the caller's session: drop whatever the incoming cookie
/// references, mint a fresh row, and hand back the updated jar.
async fn establish_session(
    state: &AppState,
    jar: CookieJar,
    user: &User,
) -> Result<CookieJar, ApiError> {
    if let Some(old) = jar.get(SESSION_COOKIE) {
        Session::delete(&state.db, old.value()).await?;
    }
    let ttl = session_ttl(state);
    let session = Session::create(&state.db, user.id, ttl).await?;
    Ok(jar.add(sessions::session_cookie(
        session.token,
        ttl,
        state.config.cookie_secure,
    )))
}

#[instrument(skip(state, jar, payload))]
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<SignInRequest>,
) -> Result<(StatusCode, CookieJar, Json<UserSchema>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }

    if let Err(problems) = validate_password(&payload.password) {
        warn!("weak password rejected");
        return Err(ApiError::Validation(problems));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Validation("Email already exists".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = match User::create(&state.db, &payload.email, &hash).await {
        Ok(u) => u,
        // lost the race against a concurrent registration
        Err(e) if repo::is_unique_violation(&e) => {
            warn!(email = %payload.email, "email already registered");
            return Err(ApiError::Validation("Email already exists".into()));
        }
        Err(e) => return Err(e.into()),
    };

    let jar = establish_session(&state, jar, &user).await?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, jar, Json(user.into())))
}

#[instrument(skip(state, jar, payload))]
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<SignInRequest>,
) -> Result<(CookieJar, Json<UserSchema>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(ApiError::Auth("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Auth("Invalid credentials".into()));
    }

    if !user.is_active {
        warn!(user_id = %user.id, "login attempt on inactive user");
        return Err(ApiError::Auth("Invalid credentials".into()));
    }

    let jar = establish_session(&state, jar, &user).await?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((jar, Json(user.into())))
}

#[instrument(skip(state, user, jar))]
async fn logout(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    jar: CookieJar,
) -> Result<(StatusCode, CookieJar), ApiError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        Session::delete(&state.db, cookie.value()).await?;
    }
    let jar = jar.remove(sessions::removal_cookie());
    info!(user_id = %user.id, "user logged out");
    Ok((StatusCode::NO_CONTENT, jar))
}

#[instrument(skip_all)]
async fn me(SessionUser(user): SessionUser) -> Json<UserSchema> {
    Json(user.into())
}

#[cfg(test)]
mod email_tests {
    use super::*;

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(is_valid_email("someone@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email(""));
    }
}
