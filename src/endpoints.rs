//! Domain operations of the OKR backend
//!
//! Every method maps to one HTTP verb + path and returns the decoded body
//! untouched. Login and the department/user lists retry transient failures;
//! the two lists also fall back to `[]` so list views never hard-fail.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::client::{redact, ApiClient};
use crate::error::{ApiError, Result};
use crate::models::Credentials;
use crate::retry::with_retry;
use crate::transform::objective_to_wire;

impl ApiClient {
    // --- Connectivity & auth ---

    /// GET /api/
    pub async fn ping(&self) -> Result<Value> {
        self.get("/api/").await
    }

    /// POST /api/token/ (retried). Stores the returned token in the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Value> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let body = self.body_for("/api/token/", &credentials)?;
        let response = with_retry(
            || self.post("/api/token/", &body),
            self.retry_policy(),
            ApiError::is_transient,
        )
        .await?;

        match extract_token(&response) {
            Some(token) => {
                self.session().login(token).map_err(|e| {
                    error!(endpoint = %self.url("/api/token/"), error = %e, "could not persist token");
                    ApiError::MalformedRequest(format!("could not persist token: {e}"))
                })?;
                info!(username, "logged in");
            }
            None => warn!(username, "login response carried no token"),
        }
        Ok(response)
    }

    /// Drop the session token. No network call.
    pub fn logout(&self) -> Result<()> {
        self.session().logout().map_err(|e| {
            error!(error = %e, "could not clear token");
            ApiError::MalformedRequest(format!("could not clear token: {e}"))
        })
    }

    // --- Departments & users ---

    /// GET /api/departments/ (retried); `[]` on any failure
    pub async fn get_departments(&self) -> Value {
        self.list_or_empty("/api/departments/").await
    }

    /// GET /api/users/ (retried); `[]` on any failure
    pub async fn get_users(&self) -> Value {
        self.list_or_empty("/api/users/").await
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Value> {
        self.get(&format!("/api/users/{user_id}/")).await
    }

    async fn list_or_empty(&self, path: &str) -> Value {
        let outcome = with_retry(|| self.get(path), self.retry_policy(), ApiError::is_transient).await;
        match outcome {
            Ok(list) => list,
            Err(err) => {
                error!(endpoint = path, error = %err, "list fetch failed, substituting empty list");
                Value::Array(Vec::new())
            }
        }
    }

    // --- Business units ---

    pub async fn get_business_units(&self) -> Result<Value> {
        self.get("/api/business-units/").await
    }

    pub async fn get_business_unit(&self, unit_id: i64) -> Result<Value> {
        self.get(&format!("/api/business-units/{unit_id}/")).await
    }

    pub async fn create_business_unit(&self, unit: &impl Serialize) -> Result<Value> {
        let path = "/api/business-units/";
        self.post(path, &self.body_for(path, unit)?).await
    }

    pub async fn update_business_unit(&self, unit_id: i64, unit: &impl Serialize) -> Result<Value> {
        let path = format!("/api/business-units/{unit_id}/");
        self.put(&path, &self.body_for(&path, unit)?).await
    }

    pub async fn delete_business_unit(&self, unit_id: i64) -> Result<Value> {
        self.delete(&format!("/api/business-units/{unit_id}/")).await
    }

    pub async fn get_okr_business_units(&self, okr_id: i64) -> Result<Value> {
        self.get(&format!("/api/okrs/{okr_id}/business_units/")).await
    }

    pub async fn assign_business_units(&self, okr_id: i64, unit_ids: &[i64]) -> Result<Value> {
        self.post(
            &format!("/api/okrs/{okr_id}/assign_business_units/"),
            &json!({ "business_unit_ids": unit_ids }),
        )
        .await
    }

    // --- Objectives ---

    pub async fn get_okrs(&self) -> Result<Value> {
        self.get("/api/okrs/").await
    }

    pub async fn get_okr(&self, okr_id: i64) -> Result<Value> {
        self.get(&format!("/api/okrs/{okr_id}/")).await
    }

    /// Accepts the edit-form shape (e.g. `ObjectiveDraft`) and sends the wire shape
    pub async fn create_okr(&self, okr: &impl Serialize) -> Result<Value> {
        let path = "/api/okrs/";
        self.post(path, &self.objective_body(path, okr)?).await
    }

    pub async fn update_okr(&self, okr_id: i64, okr: &impl Serialize) -> Result<Value> {
        let path = format!("/api/okrs/{okr_id}/");
        self.put(&path, &self.objective_body(&path, okr)?).await
    }

    pub async fn delete_okr(&self, okr_id: i64) -> Result<Value> {
        self.delete(&format!("/api/okrs/{okr_id}/")).await
    }

    /// Objectives whose parent is `parent_id`
    pub async fn get_child_okrs(&self, parent_id: i64) -> Result<Value> {
        self.get(&format!("/api/okrs/?parent_okr={parent_id}")).await
    }

    pub async fn get_user_okrs(&self, user_id: i64) -> Result<Value> {
        self.get(&format!("/api/okrs/user/{user_id}/")).await
    }

    // --- Objective <-> user assignment ---

    pub async fn get_okr_users(&self, okr_id: i64) -> Result<Value> {
        self.get(&format!("/api/okrs/{okr_id}/assigned_users/")).await
    }

    pub async fn add_user_to_okr(&self, okr_id: i64, user_id: i64, is_primary: bool) -> Result<Value> {
        self.post(
            &format!("/api/okrs/{okr_id}/assign_user/"),
            &json!({ "user_id": user_id, "is_primary": is_primary }),
        )
        .await
    }

    pub async fn remove_user_from_okr(&self, okr_id: i64, user_id: i64) -> Result<Value> {
        self.delete(&format!("/api/okrs/{okr_id}/remove_user/{user_id}/")).await
    }

    pub async fn set_primary_user(&self, okr_id: i64, user_id: i64) -> Result<Value> {
        self.post(
            &format!("/api/okrs/{okr_id}/set_primary_user/"),
            &json!({ "user_id": user_id }),
        )
        .await
    }

    // --- Tasks ---

    pub async fn get_tasks(&self) -> Result<Value> {
        self.get("/api/tasks/").await
    }

    pub async fn get_task(&self, task_id: i64) -> Result<Value> {
        self.get(&format!("/api/tasks/{task_id}/")).await
    }

    pub async fn create_task(&self, task: &impl Serialize) -> Result<Value> {
        let path = "/api/tasks/";
        self.post(path, &self.body_for(path, task)?).await
    }

    pub async fn update_task(&self, task_id: i64, task: &impl Serialize) -> Result<Value> {
        let path = format!("/api/tasks/{task_id}/");
        self.put(&path, &self.body_for(&path, task)?).await
    }

    pub async fn delete_task(&self, task_id: i64) -> Result<Value> {
        self.delete(&format!("/api/tasks/{task_id}/")).await
    }

    /// Tasks linked to objective `okr_id`
    pub async fn get_okr_tasks(&self, okr_id: i64) -> Result<Value> {
        self.get(&format!("/api/tasks/?linked_to_okr={okr_id}")).await
    }

    pub async fn get_user_tasks(&self, user_id: i64) -> Result<Value> {
        self.get(&format!("/api/tasks/?assigned_to={user_id}")).await
    }

    // --- Task challenges ---

    pub async fn get_task_challenges(&self) -> Result<Value> {
        self.get("/api/task-challenges/").await
    }

    pub async fn get_task_challenge(&self, challenge_id: i64) -> Result<Value> {
        self.get(&format!("/api/task-challenges/{challenge_id}/")).await
    }

    pub async fn create_task_challenge(&self, challenge: &impl Serialize) -> Result<Value> {
        let path = "/api/task-challenges/";
        self.post(path, &self.body_for(path, challenge)?).await
    }

    pub async fn update_task_challenge(&self, challenge_id: i64, challenge: &impl Serialize) -> Result<Value> {
        let path = format!("/api/task-challenges/{challenge_id}/");
        self.put(&path, &self.body_for(&path, challenge)?).await
    }

    pub async fn delete_task_challenge(&self, challenge_id: i64) -> Result<Value> {
        self.delete(&format!("/api/task-challenges/{challenge_id}/")).await
    }

    pub async fn get_task_challenges_by_task(&self, task_id: i64) -> Result<Value> {
        self.get(&format!("/api/task-challenges/by_task/?task_id={task_id}"))
            .await
    }

    // --- Request bodies ---

    /// JSON body for `path`; failures are logged like failed sends
    fn body_for(&self, path: &str, payload: &impl Serialize) -> Result<Value> {
        serde_json::to_value(payload).map_err(|e| self.build_failed(path, None, e.into()))
    }

    /// Objective body for `path` in the wire shape
    fn objective_body(&self, path: &str, okr: &impl Serialize) -> Result<Value> {
        let value = self.body_for(path, okr)?;
        objective_to_wire(value.clone()).map_err(|e| self.build_failed(path, Some(&value), e))
    }

    fn build_failed(&self, path: &str, payload: Option<&Value>, err: ApiError) -> ApiError {
        error!(
            endpoint = %self.url(path),
            payload = %payload.map(redact).unwrap_or_default(),
            error = %err,
            "request not sent"
        );
        err
    }
}

/// Token from a login response: `access` (JWT pair) or a plain `token` field
fn extract_token(response: &Value) -> Option<&str> {
    non_empty_str(response, "access").or_else(|| non_empty_str(response, "token"))
}

fn non_empty_str<'a>(response: &'a Value, key: &str) -> Option<&'a str> {
    response.get(key).and_then(Value::as_str).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_prefers_access_field() {
        let pair = json!({"access": "a.b.c", "refresh": "r.r.r"});
        assert_eq!(extract_token(&pair), Some("a.b.c"));
        assert_eq!(extract_token(&json!({"token": "plain"})), Some("plain"));
        assert_eq!(extract_token(&json!({"detail": "ok"})), None);
        assert_eq!(extract_token(&json!({"access": ""})), None);
    }

    #[test]
    fn null_access_falls_back_to_token() {
        assert_eq!(extract_token(&json!({"access": null, "token": "plain"})), Some("plain"));
        assert_eq!(extract_token(&json!({"access": "", "token": "plain"})), Some("plain"));
        assert_eq!(extract_token(&json!({"access": 7})), None);
    }
}
