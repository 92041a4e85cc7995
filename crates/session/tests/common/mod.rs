use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use haven_client::{ApiClient, ClientConfig};
use haven_core::UserProfile;
use haven_events::EventBus;
use haven_session::{
    CredentialStore, FileStorage, RevalidationPolicy, SessionStore, Storage,
};

pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "pw";
pub const TOKEN: &str = "t1";

/// Delay before `/admin/analytics` answers.
pub const SLOW_RESPONSE: Duration = Duration::from_millis(300);

/// Knobs and counters shared with the stub backend's handlers.
#[derive(Clone, Default)]
pub struct Backend {
    /// `/auth/me` answers 503 this many times before succeeding.
    pub me_outages: Arc<AtomicUsize>,
    pub me_calls: Arc<AtomicUsize>,
}

impl Backend {
    pub fn fail_me(&self, times: usize) {
        self.me_outages.store(times, Ordering::SeqCst);
    }

    pub fn me_calls(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }
}

pub fn user_json(name: &str) -> Value {
    json!({
        "id": "u1",
        "email": EMAIL,
        "name": name,
        "phone": "555-0100",
        "role": "patient",
        "status": "approved",
        "created_at": "2025-02-10T08:00:00+00:00",
        "profile_data": { "addiction_type": "alcohol" }
    })
}

pub fn stored_user() -> UserProfile {
    serde_json::from_value(user_json("Cached Name")).unwrap()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Invalid token" })),
    )
        .into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["email"] == EMAIL && body["password"] == PASSWORD {
        Json(json!({ "token": TOKEN, "user": user_json("Asha") })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Invalid email or password" })),
        )
            .into_response()
    }
}

async fn me(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend.me_calls.fetch_add(1, Ordering::SeqCst);
    let outage = backend
        .me_outages
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if outage {
        return (StatusCode::SERVICE_UNAVAILABLE, "upstream unavailable").into_response();
    }
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(user_json("Fresh Name")).into_response()
}

async fn update_profile(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut user = user_json("Asha");
    if let Some(name) = body.get("name") {
        user["name"] = name.clone();
    }
    Json(user).into_response()
}

async fn register(Json(body): Json<Value>) -> Response {
    let mut user = user_json("New");
    user["email"] = body["email"].clone();
    user["role"] = body["role"].clone();
    user["status"] = json!("pending");
    Json(user).into_response()
}

/// Patients never get past the admin gate.
async fn admin_users() -> Response {
    unauthorized()
}

/// Same as [`admin_users`], but the answer takes a while to arrive.
async fn slow_admin_analytics() -> Response {
    tokio::time::sleep(SLOW_RESPONSE).await;
    unauthorized()
}

pub fn router(backend: Backend) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/profile", put(update_profile))
        .route("/api/auth/register", post(register))
        .route("/api/admin/users", get(admin_users))
        .route("/api/admin/analytics", get(slow_admin_analytics))
        .with_state(backend)
}

pub struct TestApp {
    pub store: Arc<SessionStore>,
    pub credentials: Arc<CredentialStore>,
    pub bus: Arc<EventBus>,
    pub backend: Backend,
}

/// Serve the stub backend on an ephemeral port and return its origin.
pub async fn spawn_backend(backend: Backend) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(backend);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Wire a session store to a fresh stub backend over the given storage.
pub async fn build_test_app(storage: Arc<dyn Storage>, policy: RevalidationPolicy) -> TestApp {
    let backend = Backend::default();
    let url = spawn_backend(backend.clone()).await;
    build_test_app_at(&url, backend, storage, policy)
}

pub fn build_test_app_at(
    url: &str,
    backend: Backend,
    storage: Arc<dyn Storage>,
    policy: RevalidationPolicy,
) -> TestApp {
    let bus = Arc::new(EventBus::default());
    let credentials = Arc::new(CredentialStore::new(storage));
    let api = ApiClient::new(&ClientConfig::new(url), credentials.clone(), bus.clone())
        .expect("client builds");
    let store = Arc::new(SessionStore::new(api, credentials.clone(), bus.clone(), policy));
    TestApp {
        store,
        credentials,
        bus,
        backend,
    }
}

pub fn file_storage(dir: &tempfile::TempDir) -> Arc<FileStorage> {
    Arc::new(FileStorage::new(dir.path().join("credentials.json")))
}

/// Poll `condition` until it holds or one second passes.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
