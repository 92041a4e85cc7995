use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use haven_client::{ApiClient, ClientConfig, TokenSource};
use haven_events::EventBus;

pub const GOOD_EMAIL: &str = "asha@example.com";
pub const GOOD_PASSWORD: &str = "s3cret!";
pub const GOOD_TOKEN: &str = "tok-asha";

/// One request as observed by the stub backend.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Seen>>>);

impl Recorder {
    pub fn all(&self) -> Vec<Seen> {
        self.0.lock().unwrap().clone()
    }

    pub fn last(&self) -> Seen {
        self.all().pop().expect("backend saw no requests")
    }
}

/// Token source whose value tests can swap between requests.
#[derive(Default)]
pub struct SwappableToken(pub Mutex<Option<String>>);

impl SwappableToken {
    pub fn set(&self, token: Option<&str>) {
        *self.0.lock().unwrap() = token.map(str::to_string);
    }
}

impl TokenSource for SwappableToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct TestBackend {
    pub url: String,
    pub seen: Recorder,
}

pub fn user_json() -> Value {
    json!({
        "id": "u-1",
        "email": GOOD_EMAIL,
        "name": "Asha",
        "phone": null,
        "role": "patient",
        "status": "approved",
        "created_at": "2025-01-05T10:00:00+00:00",
        "profile_data": null
    })
}

fn unauthorized(detail: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": detail }))).into_response()
}

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {GOOD_TOKEN}"))
}

async fn record(State(seen): State<Recorder>, req: Request, next: Next) -> Response {
    let entry = {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Seen {
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            query: req.uri().query().map(str::to_string),
            authorization: header("authorization"),
            request_id: header("x-request-id"),
        }
    };
    seen.0.lock().unwrap().push(entry);
    next.run(req).await
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["email"] == GOOD_EMAIL && body["password"] == GOOD_PASSWORD {
        Json(json!({ "token": GOOD_TOKEN, "user": user_json() })).into_response()
    } else {
        unauthorized("Invalid email or password")
    }
}

async fn me(headers: HeaderMap) -> Response {
    if bearer_ok(&headers) {
        Json(user_json()).into_response()
    } else {
        unauthorized("Invalid token")
    }
}

async fn register() -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "detail": [
                { "loc": ["body", "phone"], "msg": "phone is not valid" }
            ]
        })),
    )
        .into_response()
}

async fn admin_users(headers: HeaderMap, Query(q): Query<HashMap<String, String>>) -> Response {
    if !bearer_ok(&headers) {
        return unauthorized("Invalid token");
    }
    Json(json!([{ "filters": q }])).into_response()
}

async fn events() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}

async fn receipt(Path(id): Path<String>) -> Response {
    if id == "d-approved" {
        Json(json!({ "receipt_number": "HW-DAPPROVE", "amount": 250.0 })).into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Receipt is only available for approved donations" })),
        )
            .into_response()
    }
}

async fn track(Path(transaction_id): Path<String>) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": format!("No donation with transaction id {transaction_id}") })),
    )
        .into_response()
}

async fn respond(Path(id): Path<String>, Query(q): Query<HashMap<String, String>>) -> Response {
    let response = q.get("response").cloned().unwrap_or_default();
    Json(json!({ "message": format!("Treatment request {response}"), "id": id })).into_response()
}

async fn submit_donation(mut multipart: Multipart) -> Response {
    let mut fields = Vec::new();
    let mut screenshot_bytes = 0;
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let data = field.bytes().await.unwrap();
        if name == "screenshot" {
            screenshot_bytes = data.len();
        }
        fields.push(name);
    }
    Json(json!({ "fields": fields, "screenshot_bytes": screenshot_bytes, "status": "pending" }))
        .into_response()
}

pub fn router(seen: Recorder) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/register", post(register))
        .route("/api/admin/users", get(admin_users))
        .route("/api/events", get(events))
        .route("/api/donations", post(submit_donation))
        .route("/api/donations/{id}/receipt", get(receipt))
        .route("/api/donations/track/{transaction_id}", get(track))
        .route("/api/treatment-requests/{id}/respond", put(respond))
        .layer(middleware::from_fn_with_state(seen.clone(), record))
}

/// Serve the stub backend on an ephemeral port.
pub async fn spawn_backend() -> TestBackend {
    let seen = Recorder::default();
    let app = router(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestBackend {
        url: format!("http://{addr}"),
        seen,
    }
}

/// Client wired to the stub backend, with a fresh bus and token slot.
pub fn build_test_client(
    backend: &TestBackend,
) -> (ApiClient, Arc<SwappableToken>, Arc<EventBus>) {
    let tokens = Arc::new(SwappableToken::default());
    let bus = Arc::new(EventBus::default());
    let client = ApiClient::new(&ClientConfig::new(&backend.url), tokens.clone(), bus.clone())
        .expect("client builds");
    (client, tokens, bus)
}
