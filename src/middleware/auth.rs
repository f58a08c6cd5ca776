// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase ID token authentication middleware.

use crate::services::identity::{Identity, IdentityError};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie name Firebase Hosting forwards to backends.
pub const SESSION_COOKIE: &str = "__session";

/// Authenticated user, inserted by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

/// Possibly-authenticated user, inserted by [`optional_auth`].
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Identity>);

/// Cookie first, then `Authorization: Bearer`.
fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

async fn resolve(state: &AppState, token: &str) -> Result<Option<Identity>, StatusCode> {
    match state.identity.verify(token).await {
        Ok(identity) => Ok(Some(identity)),
        Err(IdentityError::Rejected(reason)) => {
            tracing::debug!(reason = %reason, "ID token rejected");
            Ok(None)
        }
        Err(IdentityError::Transient(reason)) => {
            tracing::error!(reason = %reason, "ID token verification unavailable");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Middleware that requires a valid ID token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_token(&jar, request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;
    let identity = resolve(&state, &token)
        .await?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(AuthUser(identity));
    Ok(next.run(request).await)
}

/// Middleware that resolves the user if a valid token is present.
///
/// Missing or rejected tokens continue as anonymous; the handler decides what
/// an anonymous request means.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let identity = match extract_token(&jar, request.headers()) {
        Some(token) => resolve(&state, &token).await?,
        None => None,
    };

    request.extensions_mut().insert(MaybeUser(identity));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn test_extract_token_bearer() {
        let jar = CookieJar::new();
        assert_eq!(
            extract_token(&jar, &headers("Bearer abc.def.ghi")).as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(extract_token(&jar, &headers("Basic abc")), None);
        assert_eq!(extract_token(&jar, &headers("Bearer ")), None);
        assert_eq!(extract_token(&jar, &HeaderMap::new()), None);
    }

    #[test]
    fn test_extract_token_cookie_wins() {
        let jar = CookieJar::new().add(axum_extra::extract::cookie::Cookie::new(
            SESSION_COOKIE,
            "from-cookie",
        ));
        assert_eq!(
            extract_token(&jar, &headers("Bearer from-header")).as_deref(),
            Some("from-cookie")
        );
    }
}
