//! Load data script for an OKR backend
//!
//! Logs in, then creates a small objective hierarchy with tasks and
//! assignments through the client.
//! Run: OKR_USER=admin OKR_PASSWORD=admin cargo run --bin load_data

use anyhow::Context;
use serde_json::Value;

use okr_client::models::{AssignedUser, ObjectiveDraft, Status, TaskDraft};
use okr_client::{ApiClient, ClientConfig, SessionContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = okr_client::logging::init_tracing("info");

    let config = ClientConfig::from_env();
    let client = ApiClient::new(&config, SessionContext::anonymous())?;

    let username = std::env::var("OKR_USER").unwrap_or_else(|_| "admin".to_string());
    let password = std::env::var("OKR_PASSWORD").unwrap_or_else(|_| "admin".to_string());
    client.login(&username, &password).await.context("login failed")?;

    client.ping().await.context("backend not reachable")?;

    // First user (if any) becomes primary owner of everything created below
    let users = client.get_users().await;
    let owner = users
        .as_array()
        .and_then(|list| list.first())
        .and_then(|u| u.get("id"))
        .and_then(Value::as_i64);
    let assigned: Vec<AssignedUser> = owner.map(|id| AssignedUser::new(id, true)).into_iter().collect();

    let company = client
        .create_okr(&ObjectiveDraft {
            title: "Grow revenue".to_string(),
            description: Some("Company objective for the year".to_string()),
            status: Some(Status::Named("active".to_string())),
            progress: Some(0.0),
            is_measurable: Some(true),
            assigned_users: Some(assigned.clone()),
            ..Default::default()
        })
        .await?;
    let company_id = id_of(&company)?;
    println!("✅ Created root objective #{}", company_id);

    let children = ["Expand to two new markets", "Raise renewal rate to 90%", "Launch self-serve plan"];
    for (i, title) in children.iter().enumerate() {
        let child = client
            .create_okr(&ObjectiveDraft {
                title: title.to_string(),
                parent_okr: Some(company_id),
                status: Some(Status::Boolean(true)),
                progress: Some((i as f64) * 25.0),
                assigned_users: Some(assigned.clone()),
                ..Default::default()
            })
            .await?;
        let child_id = id_of(&child)?;

        for step in 1..=2 {
            client
                .create_task(&TaskDraft {
                    title: format!("{} - step {}", title, step),
                    status: Some(Status::Named("todo".to_string())),
                    progress: Some(0.0),
                    linked_to_okr: Some(child_id),
                    assigned_to: owner,
                    ..Default::default()
                })
                .await?;
        }
        println!("✅ Created objective #{} with 2 tasks", child_id);
    }

    let tree = client.get_child_okrs(company_id).await?;
    let count = tree.as_array().map(Vec::len).unwrap_or(0);
    println!("✅ Backend reports {} child objectives under #{}", count, company_id);

    Ok(())
}

fn id_of(created: &Value) -> anyhow::Result<i64> {
    created
        .get("id")
        .and_then(Value::as_i64)
        .with_context(|| format!("backend response without id: {}", created))
}
