use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Query, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::DatabaseConnection;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::Paginator;
use service::auth::domain::{LoginInput, SignupInput};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::{decode_token, AuthService};

use crate::errors::JsonApiError;

pub const AUTH_COOKIE: &str = "auth_token";
pub const LOGIN_PATH: &str = "/auth/login/";

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: Arc<AuthService<SeaOrmAuthRepository>>,
    pub paginator: Paginator,
}

impl ServerState {
    pub fn jwt_secret(&self) -> &str {
        &self.auth.config().jwt_secret
    }
}

#[derive(Serialize)]
pub struct SignupOutput { pub user_id: Uuid }

#[derive(Serialize)]
pub struct LoginOutput { pub user_id: Uuid, pub username: String, pub token: String }

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Authenticated user resolved from the `auth_token` cookie or a Bearer header.
///
/// Guests are redirected to the login page with `next` set to the requested path.
/// Use `Option<CurrentUser>` where login is optional.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    if let Some(c) = CookieJar::from_headers(&parts.headers).get(AUTH_COOKIE) {
        return Some(c.value().to_string());
    }
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

#[async_trait]
impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        let claims = token_from_parts(parts).and_then(|t| decode_token(state.jwt_secret(), &t).ok());
        match claims {
            Some(c) => Ok(CurrentUser { id: c.uid, username: c.sub }),
            None => {
                tracing::debug!(path = %parts.uri.path(), "guest redirected to login");
                Err(Redirect::to(&login_url(parts.uri.path())).into_response())
            }
        }
    }
}

/// `/auth/login/?next=<path>`
pub fn login_url(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", encode_next(next))
}

// `/` and unreserved characters stay as they are.
const NEXT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

fn encode_next(path: &str) -> String {
    utf8_percent_encode(path, NEXT_ENCODE_SET).to_string()
}

/// Only same-site absolute paths are followed after login.
/// Browsers read `/\` like `//`, so backslashes and control characters are refused.
fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| {
        n.starts_with('/')
            && !n.starts_with("//")
            && !n.chars().any(|c| c == '\\' || c.is_ascii_control())
    })
}

fn auth_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

#[utoipa::path(post, path = "/auth/signup/", tag = "auth", request_body = crate::openapi::SignupRequest, responses((status = 201, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn signup(
    State(state): State<ServerState>,
    Json(input): Json<SignupInput>,
) -> Result<(StatusCode, Json<SignupOutput>), JsonApiError> {
    let user = state.auth.register(input).await?;
    Ok((StatusCode::CREATED, Json(SignupOutput { user_id: user.id })))
}

#[utoipa::path(post, path = "/auth/login/", tag = "auth", request_body = crate::openapi::LoginRequest, params(("next" = Option<String>, Query, description = "Path to redirect to after login")), responses((status = 200, description = "Logged In"), (status = 303, description = "Redirect to next"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    Query(q): Query<NextQuery>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> Result<Response, JsonApiError> {
    let session = state.auth.login(input).await?;
    let jar = jar.add(auth_cookie(session.token.clone()));
    if let Some(next) = safe_next(q.next.as_deref()) {
        return Ok((jar, Redirect::to(next)).into_response());
    }
    let out = LoginOutput { user_id: session.user.id, username: session.user.username, token: session.token };
    Ok((jar, Json(out)).into_response())
}

#[utoipa::path(post, path = "/auth/logout/", tag = "auth", responses((status = 204, description = "Logged Out")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_url_keeps_slashes() {
        assert_eq!(login_url("/create/"), "/auth/login/?next=/create/");
        assert_eq!(login_url("/posts/1/edit/"), "/auth/login/?next=/posts/1/edit/");
        assert_eq!(login_url("/a b?"), "/auth/login/?next=/a%20b%3F");
        assert_eq!(login_url("/profile/Ünal/"), "/auth/login/?next=/profile/%C3%9Cnal/");
    }

    #[test]
    fn next_must_be_local() {
        assert_eq!(safe_next(Some("/profile/x/")), Some("/profile/x/"));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(Some("/\\evil.example")), None);
        assert_eq!(safe_next(Some("/\tevil.example")), None);
        assert_eq!(safe_next(Some("/ok\r\nSet-Cookie:x")), None);
        assert_eq!(safe_next(None), None);
    }
}
