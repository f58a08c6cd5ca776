// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use textopronto::config::Config;
use textopronto::db::{FirestoreDb, MemoryStore};
use textopronto::models::SalesTag;
use textopronto::routes::create_router;
use textopronto::services::{FirebaseTokenVerifier, GenerationError, MessageGenerator};
use textopronto::AppState;

pub const TEST_KID: &str = "test-key-1";
const PRIVATE_KEY_PEM: &[u8] = include_bytes!("../fixtures/test_rsa_private.pem");
const PUBLIC_KEY_PEM: &[u8] = include_bytes!("../fixtures/test_rsa_public.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Generator that answers from the prompt inputs, or fails when told to.
#[derive(Default)]
pub struct FakeGenerator {
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeGenerator {
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageGenerator for FakeGenerator {
    async fn generate(
        &self,
        sales_tag: SalesTag,
        niche_details: &str,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(GenerationError::RateLimited);
        }
        Ok(format!("Olá! [{}] {}", sales_tag.prompt_name(), niche_details))
    }

    async fn suggest_niche_details(&self, sales_tag: SalesTag) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(GenerationError::EmptyResponse("SAFETY".to_string()));
        }
        Ok(format!("Sugestão para {}", sales_tag.slug()))
    }
}

/// Handles to a test app's injected dependencies.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub generator: Arc<FakeGenerator>,
}

/// Create a test app with in-memory store, fake generator and a static-key
/// ID token verifier.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(FakeGenerator::default());
    let decoding_key = DecodingKey::from_rsa_pem(PUBLIC_KEY_PEM).expect("valid test public key");
    let identity = Arc::new(
        FirebaseTokenVerifier::new_with_static_key(&config.gcp_project_id, TEST_KID, decoding_key)
            .expect("static verifier"),
    );

    let state = Arc::new(AppState::new(
        config,
        store.clone(),
        generator.clone(),
        identity,
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        generator,
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Mint a Firebase-shaped ID token signed with the test key.
#[allow(dead_code)]
pub fn create_test_id_token(config: &Config, uid: &str, email: Option<&str>) -> String {
    let now = now_secs();
    let claims = json!({
        "iss": format!("https://securetoken.google.com/{}", config.gcp_project_id),
        "aud": config.gcp_project_id,
        "sub": uid,
        "iat": now,
        "auth_time": now,
        "exp": now + 3600,
        "email": email,
        "name": "Maria Vendas",
        "firebase": { "sign_in_provider": "phone" },
    });
    sign(&claims, TEST_KID)
}

/// Sign arbitrary claims with the test key.
#[allow(dead_code)]
pub fn sign(claims: &serde_json::Value, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY_PEM).expect("valid test private key");
    encode(&header, claims, &key).expect("sign test token")
}

/// Build a JSON request, optionally with a bearer token.
#[allow(dead_code)]
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Build a bodiless GET request, optionally with a bearer token.
#[allow(dead_code)]
pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
