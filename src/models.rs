use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};

/// Backend status field: legacy rows carry a boolean, newer ones a string
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Status {
    Boolean(bool),
    Named(String),
}

/// Canonical status used for display and comparison
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Active,
    Inactive,
    Named(String),
}

impl Status {
    pub fn normalize(&self) -> StatusKind {
        match self {
            Status::Boolean(true) => StatusKind::Active,
            Status::Boolean(false) => StatusKind::Inactive,
            Status::Named(name) => {
                let trimmed = name.trim();
                if trimmed.eq_ignore_ascii_case("active") {
                    StatusKind::Active
                } else if trimmed.eq_ignore_ascii_case("inactive") {
                    StatusKind::Inactive
                } else {
                    StatusKind::Named(trimmed.to_string())
                }
            }
        }
    }
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusKind::Active => write!(f, "active"),
            StatusKind::Inactive => write!(f, "inactive"),
            StatusKind::Named(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Objective {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// Older payloads name the objective `title`
    #[serde(default, skip_serializing)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default, deserialize_with = "lenient_percent")]
    pub progress: Option<f64>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assumptions: Option<String>,
    #[serde(default)]
    pub is_measurable: Option<bool>,
    #[serde(default)]
    pub parent_okr: Option<i64>,
    #[serde(default)]
    pub previous_iteration: Option<i64>,
    #[serde(default)]
    pub assigned_user_ids: Vec<i64>,
    #[serde(default)]
    pub primary_user_id: Option<i64>,
    #[serde(default)]
    pub business_unit_ids: Vec<i64>,
}

impl Objective {
    pub fn status_kind(&self) -> Option<StatusKind> {
        self.status.as_ref().map(Status::normalize)
    }

    /// `name`, or `title` when the record has no name
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            self.title.as_deref().unwrap_or_default()
        } else {
            &self.name
        }
    }
}

/// Progress arrives as a number or as a decimal string such as `"42.50"`
fn lenient_percent<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Percent {
        Number(f64),
        Text(String),
    }

    match Option::<Percent>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Percent::Number(value)) => Ok(Some(value)),
        Some(Percent::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid progress value `{text}`")))
        }
    }
}

/// One entry of the view-layer assignment list
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignedUser {
    pub user_id: i64,
    #[serde(default)]
    pub is_primary: bool,
}

impl AssignedUser {
    pub fn new(user_id: i64, is_primary: bool) -> Self {
        Self { user_id, is_primary }
    }

    /// Id of the first entry flagged primary
    pub fn primary_of(users: &[AssignedUser]) -> Option<i64> {
        users.iter().find(|u| u.is_primary).map(|u| u.user_id)
    }
}

/// Objective as edited in a form, before the wire transform
/// (`title` instead of `name`, assignment list instead of ids + primary)
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ObjectiveDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_measurable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_okr: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_iteration: Option<i64>,
    /// `None` leaves assignments untouched; `Some(vec![])` clears them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_users: Option<Vec<AssignedUser>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_units: Option<Vec<i64>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default, deserialize_with = "lenient_percent")]
    pub progress: Option<f64>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub linked_to_okr: Option<i64>,
    #[serde(default)]
    pub assigned_to: Option<i64>,
}

/// Task payload for create/update
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_to_okr: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    #[serde(alias = "username", default)]
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Department {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BusinessUnit {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TaskChallenge {
    pub id: i64,
    #[serde(alias = "task_id")]
    pub task: i64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}
