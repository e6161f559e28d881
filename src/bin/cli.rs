use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;

use okr_client::loader::load_edit_form;
use okr_client::models::{AssignedUser, Objective, ObjectiveDraft, Status, TaskDraft};
use okr_client::tree::OkrTree;
use okr_client::{with_retry, ApiClient, ApiError, ClientConfig, SessionContext, SledTokenStore};

#[derive(Parser)]
#[command(name = "okr-cli")]
#[command(about = "CLI for the OKR backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Overrides API_BASE_URL
    #[arg(short, long)]
    url: Option<String>,

    /// Retry read commands on network failures / timeouts
    #[arg(long)]
    retry: bool,
}

#[derive(Subcommand)]
enum Commands {
    Ping,
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    Logout,
    /// Show whether a token is stored
    Status,
    Departments,
    Users,
    User {
        #[arg(short, long)]
        id: i64,
    },
    BusinessUnits,
    Okrs,
    Okr {
        #[arg(short, long)]
        id: i64,
    },
    /// Print the objective hierarchy
    Tree,
    Children {
        #[arg(short, long)]
        parent: i64,
    },
    CreateOkr {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        parent: Option<i64>,
        /// Assigned user ids
        #[arg(long = "user", value_delimiter = ',')]
        users: Vec<i64>,
        /// Which of the assigned users is primary
        #[arg(long)]
        primary: Option<i64>,
        #[arg(long = "business-unit", value_delimiter = ',')]
        business_units: Vec<i64>,
    },
    UpdateOkr {
        #[arg(short, long)]
        id: i64,
        /// JSON body in edit-form shape, e.g. '{"title":"..","assigned_users":[..]}'
        #[arg(short, long)]
        json: String,
    },
    DeleteOkr {
        #[arg(short, long)]
        id: i64,
    },
    AssignUser {
        #[arg(short, long)]
        okr: i64,
        #[arg(short, long)]
        user: i64,
        #[arg(long)]
        primary: bool,
    },
    RemoveUser {
        #[arg(short, long)]
        okr: i64,
        #[arg(short, long)]
        user: i64,
    },
    SetPrimary {
        #[arg(short, long)]
        okr: i64,
        #[arg(short, long)]
        user: i64,
    },
    AssignBusinessUnits {
        #[arg(short, long)]
        okr: i64,
        #[arg(short, long, value_delimiter = ',')]
        units: Vec<i64>,
    },
    Tasks,
    OkrTasks {
        #[arg(short, long)]
        okr: i64,
    },
    UserTasks {
        #[arg(short, long)]
        user: i64,
    },
    CreateTask {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        okr: Option<i64>,
        #[arg(short, long)]
        assignee: Option<i64>,
        #[arg(short, long)]
        status: Option<String>,
    },
    DeleteTask {
        #[arg(short, long)]
        id: i64,
    },
    Challenges {
        /// Only challenges of this task
        #[arg(short, long)]
        task: Option<i64>,
    },
    /// Fetch everything the objective editor needs in one go
    EditForm {
        #[arg(short, long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = okr_client::logging::init_tracing("warn");
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.url {
        config = config.with_base_url(url);
    }
    let store = SledTokenStore::open(&config.session_path)
        .with_context(|| format!("opening session store at {}", config.session_path.display()))?;
    let session = SessionContext::new(store)?;
    let client = ApiClient::new(&config, session)?;
    let retry = cli.retry;

    match cli.command {
        Commands::Ping => print_json(&read(&client, retry, || client.ping()).await?),
        Commands::Login { username, password } => {
            client.login(&username, &password).await?;
            if client.session().is_authenticated() {
                println!("✅ Logged in. Token saved to {}", config.session_path.display());
            } else {
                println!("⚠️ Login answered without a token");
            }
        }
        Commands::Logout => {
            client.logout()?;
            println!("Logged out (token removed).");
        }
        Commands::Status => {
            if client.session().is_authenticated() {
                println!("🔑 Token present ({})", client.base_url());
            } else {
                println!("No token stored");
            }
        }
        Commands::Departments => print_json(&client.get_departments().await),
        Commands::Users => print_json(&client.get_users().await),
        Commands::User { id } => print_json(&read(&client, retry, || client.get_user(id)).await?),
        Commands::BusinessUnits => {
            print_json(&read(&client, retry, || client.get_business_units()).await?)
        }
        Commands::Okrs => print_json(&read(&client, retry, || client.get_okrs()).await?),
        Commands::Okr { id } => print_json(&read(&client, retry, || client.get_okr(id)).await?),
        Commands::Tree => {
            let list = read(&client, retry, || client.get_okrs()).await?;
            let objectives: Vec<Objective> =
                serde_json::from_value(list).context("decoding objective list")?;
            let tree = OkrTree::build(objectives);
            println!("🌳 {} objectives", tree.len());
            print!("{}", tree.render());
        }
        Commands::Children { parent } => {
            print_json(&read(&client, retry, || client.get_child_okrs(parent)).await?)
        }
        Commands::CreateOkr { title, description, parent, users, primary, business_units } => {
            let draft = ObjectiveDraft {
                title,
                description,
                parent_okr: parent,
                assigned_users: (!users.is_empty()).then(|| {
                    users
                        .iter()
                        .map(|&id| AssignedUser::new(id, Some(id) == primary))
                        .collect()
                }),
                business_units: (!business_units.is_empty()).then_some(business_units),
                ..Default::default()
            };
            print_json(&client.create_okr(&draft).await?);
        }
        Commands::UpdateOkr { id, json } => {
            let body: Value = serde_json::from_str(&json).context("parsing --json")?;
            print_json(&client.update_okr(id, &body).await?);
        }
        Commands::DeleteOkr { id } => {
            client.delete_okr(id).await?;
            println!("🗑️ Objective {} deleted", id);
        }
        Commands::AssignUser { okr, user, primary } => {
            print_json(&client.add_user_to_okr(okr, user, primary).await?)
        }
        Commands::RemoveUser { okr, user } => {
            print_json(&client.remove_user_from_okr(okr, user).await?)
        }
        Commands::SetPrimary { okr, user } => print_json(&client.set_primary_user(okr, user).await?),
        Commands::AssignBusinessUnits { okr, units } => {
            print_json(&client.assign_business_units(okr, &units).await?)
        }
        Commands::Tasks => print_json(&read(&client, retry, || client.get_tasks()).await?),
        Commands::OkrTasks { okr } => {
            print_json(&read(&client, retry, || client.get_okr_tasks(okr)).await?)
        }
        Commands::UserTasks { user } => {
            print_json(&read(&client, retry, || client.get_user_tasks(user)).await?)
        }
        Commands::CreateTask { title, okr, assignee, status } => {
            let task = TaskDraft {
                title,
                status: status.map(Status::Named),
                linked_to_okr: okr,
                assigned_to: assignee,
                ..Default::default()
            };
            print_json(&client.create_task(&task).await?);
        }
        Commands::DeleteTask { id } => {
            client.delete_task(id).await?;
            println!("🗑️ Task {} deleted", id);
        }
        Commands::Challenges { task } => {
            let list = match task {
                Some(task_id) => {
                    read(&client, retry, || client.get_task_challenges_by_task(task_id)).await?
                }
                None => read(&client, retry, || client.get_task_challenges()).await?,
            };
            print_json(&list);
        }
        Commands::EditForm { id } => {
            let form = load_edit_form(&client, id).await?;
            print_json(&serde_json::json!({
                "objective": form.objective,
                "users": form.users,
                "departments": form.departments,
                "objectives": form.objectives,
                "business_units": form.business_units,
                "assigned_users": form.assigned_users,
                "assigned_business_units": form.assigned_business_units,
            }));
        }
    }

    Ok(())
}

/// Run a read, wrapped in the client's retry policy when `--retry` is set
async fn read<F, Fut>(client: &ApiClient, retry: bool, op: F) -> Result<Value, ApiError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<Value, ApiError>>,
{
    if retry {
        with_retry(op, client.retry_policy(), ApiError::is_transient).await
    } else {
        let mut op = op;
        op().await
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}
