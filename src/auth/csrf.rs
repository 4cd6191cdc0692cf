use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use tracing::{instrument, warn};

use crate::auth::sessions;
use crate::error::ApiError;
use crate::state::AppState;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "x-csrftoken";

/// Double-submit check on state-changing requests: the `csrftoken`
/// cookie must be echoed back in the `x-csrftoken` header.
pub async fn csrf_protect(jar: CookieJar, req: Request, next: Next) -> Result<Response, ApiError> {
    if is_safe(req.method()) {
        return Ok(next.run(req).await);
    }

    let cookie = jar.get(CSRF_COOKIE).map(|c| c.value().to_string());
    let header = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    if !tokens_match(cookie.as_deref(), header.as_deref()) {
        warn!(method = %req.method(), uri = %req.uri(), "csrf verification failed");
        return Err(ApiError::Forbidden("CSRF verification failed".into()));
    }

    Ok(next.run(req).await)
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

fn tokens_match(cookie: Option<&str>, header: Option<&str>) -> bool {
    match (cookie, header) {
        (Some(c), Some(h)) => !c.is_empty() && c == h,
        _ => false,
    }
}

#[derive(Debug, Serialize)]
pub struct CsrfResponse {
    pub csrftoken: String,
}

/// Issues the CSRF cookie and returns the token for the client to echo
/// in the header. The cookie is intentionally readable by scripts.
#[instrument(skip(state, jar))]
pub async fn csrf_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<CsrfResponse>) {
    let token = match jar.get(CSRF_COOKIE) {
        Some(c) if !c.value().is_empty() => c.value().to_string(),
        _ => sessions::generate_token(),
    };

    let cookie = Cookie::build((CSRF_COOKIE, token.clone()))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure)
        .build();

    (jar.add(cookie), Json(CsrfResponse { csrftoken: token }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_tokens_pass() {
        assert!(tokens_match(Some("abc"), Some("abc")));
    }

    #[test]
    fn missing_or_mismatched_tokens_fail() {
        assert!(!tokens_match(None, None));
        assert!(!tokens_match(Some("abc"), None));
        assert!(!tokens_match(None, Some("abc")));
        assert!(!tokens_match(Some("abc"), Some("abd")));
        assert!(!tokens_match(Some(""), Some("")));
    }

    #[test]
    fn safe_methods_skip_the_check() {
        assert!(is_safe(&Method::GET));
        assert!(is_safe(&Method::HEAD));
        assert!(!is_safe(&Method::POST));
        assert!(!is_safe(&Method::DELETE));
    }
}
