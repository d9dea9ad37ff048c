#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use formbot_api::config::AppConfig;
use formbot_api::database::MemoryStore;
use formbot_api::{app, AppState};

pub const ALLOWED_ORIGIN: &str = "http://localhost:5173";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Config pointed at the checked-in `public/` tree with a cheap bcrypt cost.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.server.public_dir = PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/public"));
    config.security.bcrypt_cost = 4;
    config
}

pub async fn spawn_server() -> Result<TestServer> {
    spawn_with(test_config()).await
}

/// Serve the application in-process on an unused port. The server lives as
/// long as the calling test's runtime.
pub async fn spawn_with(config: AppConfig) -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;

    let state = AppState::new(config, Arc::new(MemoryStore::new()));
    let router = app(state)?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(TestServer {
        port,
        base_url: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    })
}

/// Register a fresh account and return its bearer token.
pub async fn register_and_login(server: &TestServer, email: &str) -> Result<String> {
    let res = server
        .client
        .post(server.url("/api/auth/register"))
        .json(&json!({ "username": "tester", "email": email, "password": "correct-horse" }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

    let res = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "email": email, "password": "correct-horse" }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());

    let body = res.json::<Value>().await?;
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .context("login response carried no token")
}

/// A three-step form: a greeting bubble, a required email and an optional rating.
pub fn sample_form(name: &str) -> Value {
    json!({
        "name": name,
        "theme": "dark",
        "fields": [
            { "id": "greeting", "kind": "text_bubble", "content": "Hi there!" },
            { "id": "email", "kind": "email_input", "content": "Your email?", "required": true },
            { "id": "score", "kind": "rating_input", "content": "How did we do?" }
        ]
    })
}

pub async fn create_form(server: &TestServer, token: &str, body: &Value) -> Result<Value> {
    let res = server
        .client
        .post(server.url("/api/forms"))
        .bearer_auth(token)
        .json(body)
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "create form failed: {}", res.status());
    Ok(res.json::<Value>().await?["data"].clone())
}
