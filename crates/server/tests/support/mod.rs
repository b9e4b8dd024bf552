#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use server::routes::auth::ServerState;
use service::auth::domain::{LoginInput, SignupInput};

pub struct TestApp {
    pub app: Router,
    pub db: DatabaseConnection,
    pub state: ServerState,
}

/// Router over a fresh in-memory database with default settings (10 posts per page).
pub async fn spawn() -> anyhow::Result<TestApp> {
    let db = models::db::connect_in_memory().await?;
    let cfg = configs::AppConfig::default();
    let state = server::startup::build_state(&cfg, db.clone())?;
    let app = server::startup::build_app(state.clone());
    Ok(TestApp { app, db, state })
}

pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

impl TestApp {
    pub async fn user(&self, username: &str) -> anyhow::Result<TestUser> {
        let password = "Passw0rd!".to_string();
        self.state
            .auth
            .register(SignupInput { username: username.into(), email: format!("{username}@example.com"), password: password.clone() })
            .await?;
        let session = self.state.auth.login(LoginInput { username: username.into(), password }).await?;
        Ok(TestUser { id: session.user.id, username: session.user.username, token: session.token })
    }

    pub async fn group(&self, title: &str, slug: &str) -> anyhow::Result<models::group::Model> {
        Ok(models::group::create(&self.db, title, slug, "Test description").await?)
    }

    pub async fn post(&self, author: &TestUser, text: &str, group_id: Option<i32>) -> anyhow::Result<models::post::Model> {
        Ok(models::post::create(&self.db, author.id, text, group_id).await?)
    }

    pub async fn send(&self, req: Request<Body>) -> anyhow::Result<Response<Body>> {
        use tower::ServiceExt;
        Ok(self.app.clone().oneshot(req).await?)
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        b = b.header(header::COOKIE, format!("auth_token={t}"));
    }
    b.body(Body::empty()).expect("request")
}

pub fn post_form(uri: &str, body: &str, token: Option<&str>) -> Request<Body> {
    let mut b = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(t) = token {
        b = b.header(header::COOKIE, format!("auth_token={t}"));
    }
    b.body(Body::from(body.to_string())).expect("request")
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub async fn body_json(resp: Response<Body>) -> anyhow::Result<serde_json::Value> {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn location(resp: &Response<Body>) -> Option<String> {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
