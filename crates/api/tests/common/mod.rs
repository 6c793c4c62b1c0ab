//! Shared helpers for API integration tests.
//!
//! The router is the production one from `build_app_router`; only the store
//! (in-memory) and the clock (manual) are swapped.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use inspecta_api::auth::jwt::{Claims, JwtConfig};
use inspecta_api::auth::password::{hash_password, Argon2CredentialVerifier};
use inspecta_api::config::ServerConfig;
use inspecta_api::router::build_app_router;
use inspecta_api::state::AppState;
use inspecta_core::clock::ManualClock;
use inspecta_core::memory::MemoryStore;
use inspecta_core::roles::Role;
use inspecta_core::service::EditService;
use inspecta_core::store::Principal;
use inspecta_core::types::{DbId, Timestamp};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;

pub const RECORD: DbId = 100;
pub const WORKER_A: DbId = 1;
pub const WORKER_B: DbId = 2;
pub const SUPERVISOR: DbId = 9;
pub const SUPERVISOR_SECRET: &str = "s3cret-supervisor";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        database_url: String::new(),
        database_max_connections: 1,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            leeway_secs: 60,
        },
    }
}

pub fn start() -> Timestamp {
    "2026-03-01T09:00:00Z".parse().unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub config: ServerConfig,
}

impl TestApp {
    /// A bearer token whose role matches the principal directory.
    pub fn token(&self, user_id: DbId) -> String {
        let role = if user_id == SUPERVISOR {
            Role::Supervisor
        } else {
            Role::Worker
        };
        self.token_with_role(user_id, role)
    }

    pub fn token_with_role(&self, user_id: DbId, role: Role) -> String {
        sign_token(user_id, role.as_str(), &self.config.jwt.secret)
    }

    pub async fn get(&self, user_id: DbId, uri: &str) -> Response<Body> {
        let token = self.token(user_id);
        send(&self.router, Method::GET, uri, Some(&token), None).await
    }

    pub async fn post(&self, user_id: DbId, uri: &str, body: Value) -> Response<Body> {
        let token = self.token(user_id);
        send(&self.router, Method::POST, uri, Some(&token), Some(body)).await
    }
}

/// Build the app with one record, two workers, and one supervisor whose
/// credential is Argon2-hashed.
pub async fn build_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    store.insert_record(RECORD).await;

    let secret_hash = hash_password(SUPERVISOR_SECRET).unwrap();
    for (id, name, role) in [
        (WORKER_A, "Ana Worker", Role::Worker),
        (WORKER_B, "Beto Worker", Role::Worker),
        (SUPERVISOR, "Sara Supervisor", Role::Supervisor),
    ] {
        store
            .insert_principal(Principal {
                id,
                display_name: name.to_string(),
                role,
                secret_hash: secret_hash.clone(),
                is_active: true,
            })
            .await;
    }

    let clock = Arc::new(ManualClock::new(start()));
    let edits = EditService::new(
        store.clone(),
        Arc::new(Argon2CredentialVerifier),
        clock.clone(),
    );

    let config = test_config();
    let state = AppState {
        edits: Arc::new(edits),
        config: Arc::new(config.clone()),
    };
    let router = build_app_router(state, &config);

    TestApp {
        router,
        store,
        clock,
        config,
    }
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

/// Sign a token the way the sign-in service does, valid for 15 minutes.
pub fn sign_token(user_id: DbId, role: &str, secret: &str) -> String {
    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        exp: chrono::Utc::now().timestamp() + 15 * 60,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn photo(description: &str) -> Value {
    serde_json::json!({
        "data": "data:image/jpeg;base64,/9j/4AAQSkZJRg==",
        "description": description,
    })
}
