//! Request pipeline shared by every backend operation
//!
//! Each call: join path onto the base URL, attach `Authorization: Bearer`
//! when the session holds a token, send JSON, then map the outcome onto
//! `ApiError`. Failures are logged with endpoint and payload before they
//! reach the caller.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use tracing::{debug, error, info_span, Instrument};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::retry::RetryPolicy;
use crate::session::SessionContext;

/// Keys whose values never reach the logs
const REDACTED_KEYS: &[&str] = &["password", "access", "refresh", "token"];

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionContext,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: SessionContext) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::MalformedRequest(format!("http client setup failed: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            retry: config.retry,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Policy applied by the retrying endpoints; reuse it to opt other calls in
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) async fn get(&self, path: &str) -> Result<Value> {
        self.execute(Method::GET, path, None).await
    }

    pub(crate) async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.execute(Method::POST, path, Some(body)).await
    }

    pub(crate) async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.execute(Method::PUT, path, Some(body)).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<Value> {
        self.execute(Method::DELETE, path, None).await
    }

    async fn execute(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let request_id = Uuid::new_v4();
        let span = info_span!("api_request", %method, path, %request_id);

        async {
            let mut request = self.http.request(method.clone(), self.url(path));
            if let Some(token) = self.session.token() {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let outcome = dispatch(request).await;
            match &outcome {
                Ok(_) => debug!("request succeeded"),
                Err(err) => error!(
                    endpoint = %self.url(path),
                    payload = %body.map(redact).unwrap_or_default(),
                    error = %err,
                    "request failed"
                ),
            }
            outcome
        }
        .instrument(span)
        .await
    }
}

async fn dispatch(request: RequestBuilder) -> Result<Value> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(ApiError::HttpStatus {
            code: status.as_u16(),
            body: text,
        });
    }
    Ok(decode_body(&text))
}

/// Response body as JSON; empty bodies become `Null`, non-JSON bodies a string
pub(crate) fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

pub(crate) fn redact(payload: &Value) -> String {
    fn scrub(value: &mut Value) {
        match value {
            Value::Object(map) => {
                for (key, v) in map.iter_mut() {
                    if REDACTED_KEYS.contains(&key.as_str()) {
                        *v = Value::String("***".to_string());
                    } else {
                        scrub(v);
                    }
                }
            }
            Value::Array(items) => items.iter_mut().for_each(scrub),
            _ => {}
        }
    }
    let mut copy = payload.clone();
    scrub(&mut copy);
    copy.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_body_handles_empty_json_and_text() {
        assert_eq!(decode_body(""), Value::Null);
        assert_eq!(decode_body("  \n"), Value::Null);
        assert_eq!(decode_body("[1,2]"), json!([1, 2]));
        assert_eq!(decode_body("OK"), Value::String("OK".into()));
    }

    #[test]
    fn redact_hides_credentials_recursively() {
        let logged = redact(&json!({"username": "ana", "password": "s3cret", "nested": [{"token": "t"}]}));
        assert!(!logged.contains("s3cret"));
        assert!(!logged.contains("\"t\""));
        assert!(logged.contains("ana"));
    }

    #[test]
    fn url_joins_base_and_path() {
        let config = ClientConfig::new("http://localhost:8000/");
        let client = ApiClient::new(&config, SessionContext::anonymous()).unwrap();
        assert_eq!(client.url("/api/okrs/"), "http://localhost:8000/api/okrs/");
    }
}
