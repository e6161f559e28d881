//! Objective payload reshaping between the edit-form shape and the wire shape
//!
//! - `title` -> `name`
//! - `assigned_users: [{user_id, is_primary}]` -> `assigned_user_ids` + `primary_user_id`
//! - `business_units` -> `business_unit_ids` (only when the latter is missing)

use crate::error::{ApiError, Result};
use serde_json::{Map, Value};

/// Apply all objective transforms to a create/update payload
pub fn objective_to_wire(payload: Value) -> Result<Value> {
    let Value::Object(mut fields) = payload else {
        return Err(ApiError::MalformedRequest(
            "objective payload must be a JSON object".to_string(),
        ));
    };

    rename_title(&mut fields);
    split_assigned_users(&mut fields)?;
    fold_business_units(&mut fields)?;

    Ok(Value::Object(fields))
}

fn rename_title(fields: &mut Map<String, Value>) {
    if let Some(title) = fields.remove("title") {
        // An explicit name wins
        fields.entry("name").or_insert(title);
    }
}

fn split_assigned_users(fields: &mut Map<String, Value>) -> Result<()> {
    let Some(assigned) = fields.remove("assigned_users") else {
        return Ok(());
    };
    let entries = match assigned {
        Value::Array(entries) => entries,
        Value::Null => Vec::new(),
        other => {
            return Err(ApiError::MalformedRequest(format!(
                "assigned_users must be a list, got {other}"
            )))
        }
    };

    let mut ids = Vec::with_capacity(entries.len());
    let mut primary = None;
    for entry in &entries {
        let user_id = entry
            .get("user_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                ApiError::MalformedRequest(format!("assigned user without numeric user_id: {entry}"))
            })?;
        let is_primary = entry.get("is_primary").and_then(Value::as_bool).unwrap_or(false);
        if is_primary && primary.is_none() {
            primary = Some(user_id);
        }
        ids.push(Value::from(user_id));
    }

    fields.insert("assigned_user_ids".to_string(), Value::Array(ids));
    match primary {
        Some(id) => {
            fields.insert("primary_user_id".to_string(), Value::from(id));
        }
        None => {
            fields.remove("primary_user_id");
        }
    }
    Ok(())
}

fn fold_business_units(fields: &mut Map<String, Value>) -> Result<()> {
    let Some(units) = fields.remove("business_units") else {
        return Ok(());
    };
    if fields.contains_key("business_unit_ids") {
        return Ok(());
    }
    let entries = match units {
        Value::Array(entries) => entries,
        Value::Null => return Ok(()),
        other => {
            return Err(ApiError::MalformedRequest(format!(
                "business_units must be a list, got {other}"
            )))
        }
    };

    let ids = entries
        .iter()
        .map(|entry| match entry {
            Value::Number(_) => Ok(entry.clone()),
            Value::Object(unit) => unit.get("id").filter(|id| id.is_number()).cloned().ok_or_else(|| {
                ApiError::MalformedRequest(format!("business unit without numeric id: {entry}"))
            }),
            other => Err(ApiError::MalformedRequest(format!(
                "unexpected business unit entry: {other}"
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    fields.insert("business_unit_ids".to_string(), Value::Array(ids));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn title_becomes_name() {
        let wire = objective_to_wire(json!({"title": "Grow revenue"})).unwrap();
        assert_eq!(wire, json!({"name": "Grow revenue"}));
    }

    #[test]
    fn explicit_name_is_kept_and_title_dropped() {
        let wire = objective_to_wire(json!({"name": "Keep", "title": "Drop"})).unwrap();
        assert_eq!(wire, json!({"name": "Keep"}));
    }

    #[test]
    fn assigned_users_split_into_ids_and_primary() {
        let wire = objective_to_wire(json!({
            "name": "Hire",
            "assigned_users": [
                {"user_id": 1, "is_primary": true},
                {"user_id": 2, "is_primary": false}
            ]
        }))
        .unwrap();
        assert_eq!(wire["assigned_user_ids"], json!([1, 2]));
        assert_eq!(wire["primary_user_id"], json!(1));
        assert!(wire.get("assigned_users").is_none());
    }

    #[test]
    fn no_primary_means_no_primary_field() {
        let wire = objective_to_wire(json!({
            "assigned_users": [{"user_id": 4}],
            "primary_user_id": 99
        }))
        .unwrap();
        assert_eq!(wire, json!({"assigned_user_ids": [4]}));
    }

    #[test]
    fn entry_without_user_id_is_rejected() {
        let err = objective_to_wire(json!({"assigned_users": [{"is_primary": true}]})).unwrap_err();
        assert!(matches!(err, ApiError::MalformedRequest(_)));
    }

    #[test]
    fn business_units_fill_missing_ids() {
        let wire = objective_to_wire(json!({"business_units": [3, {"id": 5, "name": "Ops"}]})).unwrap();
        assert_eq!(wire, json!({"business_unit_ids": [3, 5]}));
    }

    #[test]
    fn business_unit_ids_take_precedence() {
        let wire = objective_to_wire(json!({
            "business_unit_ids": [8],
            "business_units": [{"id": 1}]
        }))
        .unwrap();
        assert_eq!(wire, json!({"business_unit_ids": [8]}));
    }

    #[test]
    fn non_object_payload_is_malformed() {
        assert!(matches!(
            objective_to_wire(json!([1, 2])),
            Err(ApiError::MalformedRequest(_))
        ));
    }
}
