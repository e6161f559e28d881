//! Edit-form data loader: fans out every read the objective editor needs and
//! joins them before returning.

use serde_json::Value;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::{ApiError, Result};

/// Everything the objective edit form renders
#[derive(Debug, Clone, PartialEq)]
pub struct EditFormData {
    pub objective: Value,
    pub users: Value,
    pub departments: Value,
    /// Candidate parents
    pub objectives: Value,
    pub business_units: Value,
    pub assigned_users: Value,
    pub assigned_business_units: Value,
}

/// Load the edit form for `okr_id`. Users and departments degrade to `[]`;
/// any other failed read fails the whole load.
pub async fn load_edit_form(client: &ApiClient, okr_id: i64) -> Result<EditFormData> {
    let (objective, users, departments, objectives, business_units, assigned_users, assigned_business_units) =
        futures::try_join!(
            client.get_okr(okr_id),
            async { Ok::<_, ApiError>(client.get_users().await) },
            async { Ok::<_, ApiError>(client.get_departments().await) },
            client.get_okrs(),
            client.get_business_units(),
            client.get_okr_users(okr_id),
            client.get_okr_business_units(okr_id),
        )?;

    debug!(okr_id, "edit form loaded");
    Ok(EditFormData {
        objective,
        users,
        departments,
        objectives,
        business_units,
        assigned_users,
        assigned_business_units,
    })
}
