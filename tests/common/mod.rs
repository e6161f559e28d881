//! In-process mock of the OKR backend (Axum) for integration tests
//!
//! Records method, URI, Authorization and Content-Type headers and body of
//! every request.
//! Responses: canned JSON per path+query, programmable status failures and
//! artificial delays (to trigger client timeouts).

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;

use okr_client::{ApiClient, ClientConfig, RetryPolicy, SessionContext};

const SECRET_KEY: &[u8] = b"mock_backend_secret";
pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "admin";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
}

#[derive(Default)]
pub struct MockState {
    requests: Mutex<Vec<RecordedRequest>>,
    canned: Mutex<HashMap<String, Value>>,
    failures: Mutex<HashMap<String, u16>>,
    delay: Mutex<Option<Duration>>,
}

pub struct MockBackend {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app.into_make_service()).await;
        });
        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Config with test-sized timeout and backoff
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url())
            .with_timeout(Duration::from_millis(300))
            .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(10)))
    }

    pub fn client(&self, session: SessionContext) -> ApiClient {
        ApiClient::new(&self.config(), session).expect("client")
    }

    /// Respond to `GET`s of `path_and_query` with `body`
    pub fn respond(&self, path_and_query: &str, body: Value) {
        self.state.canned.lock().unwrap().insert(path_and_query.to_string(), body);
    }

    /// Answer every request to `path_and_query` with `status`
    pub fn fail(&self, path_and_query: &str, status: u16) {
        self.state.failures.lock().unwrap().insert(path_and_query.to_string(), status);
    }

    /// Stall every request for `delay` before answering
    pub fn stall(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = Some(delay);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn hits(&self, path_and_query: &str) -> usize {
        self.requests().iter().filter(|r| r.uri == path_and_query).count()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().last().cloned().expect("no request recorded")
    }
}

/// Port with nothing listening on it
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe");
    let addr = listener.local_addr().expect("probe addr");
    drop(listener);
    format!("http://{}", addr)
}

pub fn unreachable_client() -> ApiClient {
    let config = ClientConfig::new(unreachable_base_url())
        .with_timeout(Duration::from_millis(300))
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(10)));
    ApiClient::new(&config, SessionContext::anonymous()).expect("client")
}

pub fn issue_token(username: &str) -> String {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_secs() as usize
        + 3600;
    let claims = Claims { sub: username.to_owned(), exp };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET_KEY)).expect("jwt")
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let parsed_body = if body.is_empty() {
        None
    } else {
        serde_json::from_str::<Value>(&body).ok()
    };

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        uri: path_and_query.clone(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: parsed_body.clone(),
    });

    let delay = *state.delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let failure = state.failures.lock().unwrap().get(&path_and_query).copied();
    if let Some(code) = failure {
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, Json(json!({ "detail": format!("forced {code}") }))).into_response();
    }

    if method == Method::POST && path_and_query == "/api/token/" {
        return login(parsed_body);
    }

    if method == Method::GET {
        let canned = state.canned.lock().unwrap().get(&path_and_query).cloned();
        Json(canned.unwrap_or_else(|| json!([]))).into_response()
    } else if method == Method::POST || method == Method::PUT {
        let mut echoed = parsed_body.unwrap_or_else(|| json!({}));
        if let Value::Object(map) = &mut echoed {
            map.entry("id").or_insert(json!(101));
        }
        let status = if method == Method::POST { StatusCode::CREATED } else { StatusCode::OK };
        (status, Json(echoed)).into_response()
    } else if method == Method::DELETE {
        Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(Body::empty())
            .unwrap()
    } else {
        StatusCode::METHOD_NOT_ALLOWED.into_response()
    }
}

fn login(body: Option<Value>) -> Response {
    let body = body.unwrap_or(Value::Null);
    let username = body.get("username").and_then(Value::as_str).unwrap_or_default();
    let password = body.get("password").and_then(Value::as_str).unwrap_or_default();
    if username != USERNAME || password != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "No active account found with the given credentials" })),
        )
            .into_response();
    }
    Json(json!({ "access": issue_token(username), "refresh": "refresh-token" })).into_response()
}
