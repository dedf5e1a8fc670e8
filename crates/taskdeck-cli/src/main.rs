//! Taskdeck CLI
//!
//! Command-line front end for a Taskdeck server.
//!
//! ## Usage
//!
//! ```bash
//! taskdeck register alice@example.com
//! taskdeck login alice@example.com
//! taskdeck tasks add "Buy milk" --description "oat, 2l"
//! taskdeck tasks list --active
//! taskdeck tasks toggle <TASK_ID>
//! taskdeck admin users --limit 20
//! ```
//!
//! Passwords come from `--password` / `TASKDECK_PASSWORD`, or are prompted for
//! without echo (twice on `register`). The session token and refresh cookie
//! are kept under the data directory, so `taskdeck refresh` works across runs.
//! Connection settings come from `--config`, then `TASKDECK_*` variables,
//! then `--api-url`.

mod output;

use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use dialoguer::Password;
use std::io;
use std::path::PathBuf;
use std::process;
use taskdeck_client::models::{Page, TaskCreate, TaskQuery, TaskUpdate};
use taskdeck_client::{
	ApiClient, ClientSettings, DEFAULT_ERROR_MESSAGE, FileTokenStorage, Session,
};
use taskdeck_stores::{AdminStore, AuthStore, TaskStore};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Shortest password the server accepts at registration.
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(about = "Manage your Taskdeck tasks from the terminal", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Path to a TOML settings file
	#[arg(long, global = true, value_name = "PATH")]
	config: Option<PathBuf>,

	/// API base URL (overrides settings and TASKDECK_API_URL)
	#[arg(long, global = true, value_name = "URL")]
	api_url: Option<String>,

	/// Verbosity level (can be repeated)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	verbosity: u8,
}

#[derive(Args)]
struct CredentialArgs {
	/// Account email
	#[arg(value_name = "EMAIL")]
	email: String,

	/// Account password
	#[arg(long, env = "TASKDECK_PASSWORD", hide_env_values = true)]
	password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
	/// Create an account and sign in
	Register(CredentialArgs),

	/// Sign in
	Login(CredentialArgs),

	/// Sign out and forget the stored token
	Logout,

	/// Show the signed-in account
	Whoami,

	/// Renew the access token from the refresh cookie
	Refresh,

	/// Manage tasks
	Tasks {
		#[command(subcommand)]
		subcommand: TaskCommands,
	},

	/// Manage accounts (admin only)
	Admin {
		#[command(subcommand)]
		subcommand: AdminCommands,
	},
}

#[derive(Subcommand)]
enum TaskCommands {
	/// List tasks
	List {
		/// Only tasks not yet completed
		#[arg(long, conflicts_with = "completed")]
		active: bool,

		/// Only completed tasks
		#[arg(long)]
		completed: bool,

		#[arg(long)]
		limit: Option<u32>,

		#[arg(long)]
		offset: Option<u32>,
	},

	/// Create a task
	Add {
		#[arg(value_name = "TITLE")]
		title: String,

		#[arg(short, long)]
		description: Option<String>,
	},

	/// Change a task's title or description
	Edit {
		#[arg(value_name = "TASK_ID")]
		id: Uuid,

		#[arg(long)]
		title: Option<String>,

		#[arg(short, long)]
		description: Option<String>,
	},

	/// Flip a task between active and completed
	Toggle {
		#[arg(value_name = "TASK_ID")]
		id: Uuid,
	},

	/// Delete a task
	Rm {
		#[arg(value_name = "TASK_ID")]
		id: Uuid,
	},
}

#[derive(Subcommand)]
enum AdminCommands {
	/// List accounts
	Users {
		#[arg(long, default_value_t = Page::default().limit)]
		limit: u32,

		#[arg(long, default_value_t = 0)]
		offset: u32,
	},

	/// Show one account
	Show {
		#[arg(value_name = "USER_ID")]
		id: Uuid,
	},

	/// Re-enable an account
	Activate {
		#[arg(value_name = "USER_ID")]
		id: Uuid,
	},

	/// Disable an account
	Deactivate {
		#[arg(value_name = "USER_ID")]
		id: Uuid,
	},
}

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	init_tracing(cli.verbosity);

	if let Err(e) = run(cli).await {
		eprintln!("{} {:#}", "Error:".red().bold(), e);
		process::exit(1);
	}
}

fn init_tracing(verbosity: u8) {
	let default_directive = match verbosity {
		0 => "taskdeck=warn",
		1 => "taskdeck=info",
		2 => "taskdeck=debug",
		_ => "taskdeck=trace",
	};
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
		)
		.with_writer(io::stderr)
		.init();
}

fn build_client(config: Option<PathBuf>, api_url: Option<String>) -> anyhow::Result<ApiClient> {
	let mut settings = ClientSettings::load(config.as_deref()).context("failed to load settings")?;
	if let Some(url) = api_url {
		settings.api_url = url;
		settings.validate()?;
	}

	let token_path = settings.resolved_token_path();
	tracing::debug!(
		api_url = %settings.api_url,
		token_path = %token_path.display(),
		cookie_path = %settings.resolved_cookie_path().display(),
		"client configured"
	);

	let session = Session::new(FileTokenStorage::new(token_path));
	Ok(ApiClient::from_settings(&settings, session)?)
}

/// Turns a store's error slot into an `anyhow::Error`.
fn store_error(error: Option<String>) -> anyhow::Error {
	anyhow!(error.unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()))
}

/// Returns the password given on the command line, or prompts for it.
///
/// With `confirm`, the prompt asks twice and enforces the minimum length.
fn read_password(password: Option<String>, confirm: bool) -> anyhow::Result<String> {
	if let Some(password) = password {
		return Ok(password);
	}

	let mut prompt = Password::new().with_prompt("Password");
	if confirm {
		prompt = prompt
			.with_confirmation("Password (again)", "Error: Passwords do not match")
			.validate_with(|input: &String| -> Result<(), String> {
				if input.chars().count() >= MIN_PASSWORD_LEN {
					Ok(())
				} else {
					Err(format!("Password must be at least {} characters", MIN_PASSWORD_LEN))
				}
			});
	}
	prompt.interact().context("failed to read password")
}

async fn run(cli: Cli) -> anyhow::Result<()> {
	let client = build_client(cli.config, cli.api_url)?;

	match cli.command {
		Commands::Register(args) => run_register(client, args).await,
		Commands::Login(args) => run_login(client, args).await,
		Commands::Logout => run_logout(client).await,
		Commands::Whoami => run_whoami(client).await,
		Commands::Refresh => run_refresh(client).await,
		Commands::Tasks { subcommand } => run_tasks(client, subcommand).await,
		Commands::Admin { subcommand } => run_admin(client, subcommand).await,
	}
}

async fn run_register(client: ApiClient, args: CredentialArgs) -> anyhow::Result<()> {
	let password = read_password(args.password, true)?;
	let auth = AuthStore::new(client);
	if !auth.register(&args.email, &password).await {
		return Err(store_error(auth.error()));
	}
	output::success(&format!("Registered and signed in as {}", args.email.bold()));
	Ok(())
}

async fn run_login(client: ApiClient, args: CredentialArgs) -> anyhow::Result<()> {
	let password = read_password(args.password, false)?;
	let auth = AuthStore::new(client);
	if !auth.login(&args.email, &password).await {
		return Err(store_error(auth.error()));
	}
	output::success(&format!("Signed in as {}", args.email.bold()));
	Ok(())
}

async fn run_logout(client: ApiClient) -> anyhow::Result<()> {
	AuthStore::new(client).logout().await;
	output::success("Signed out");
	Ok(())
}

async fn run_whoami(client: ApiClient) -> anyhow::Result<()> {
	let auth = AuthStore::new(client);
	auth.init().await;
	match auth.user() {
		Some(user) => {
			println!("{}", output::format_user(&user));
			Ok(())
		}
		None => bail!("not signed in"),
	}
}

async fn run_refresh(client: ApiClient) -> anyhow::Result<()> {
	let auth = AuthStore::new(client);
	if !auth.refresh_session().await {
		return Err(store_error(auth.error()));
	}
	output::success("Access token renewed");
	Ok(())
}

async fn run_tasks(client: ApiClient, command: TaskCommands) -> anyhow::Result<()> {
	let store = TaskStore::new(client);

	match command {
		TaskCommands::List {
			active,
			completed,
			limit,
			offset,
		} => {
			let is_completed = match (active, completed) {
				(true, _) => Some(false),
				(_, true) => Some(true),
				_ => None,
			};
			let mut query = TaskQuery::completed(is_completed);
			if let Some(limit) = limit {
				query = query.limit(limit);
			}
			if let Some(offset) = offset {
				query = query.offset(offset);
			}

			store.fetch_tasks_with(&query).await;
			if let Some(error) = store.error() {
				bail!(error);
			}
			let listing = output::format_task_list(&store.tasks(), store.total());
			println!("{}", listing);
		}
		TaskCommands::Add { title, description } => {
			let mut data = TaskCreate::new(title);
			if let Some(description) = description {
				data = data.with_description(description);
			}
			if !store.create_task(data).await {
				return Err(store_error(store.error()));
			}
			if let Some(task) = store.tasks().first() {
				println!("{}", output::format_task(task));
			}
		}
		TaskCommands::Edit {
			id,
			title,
			description,
		} => {
			let mut data = TaskUpdate::default();
			if let Some(title) = title {
				data = data.title(title);
			}
			if let Some(description) = description {
				data = data.description(description);
			}
			if data.is_empty() {
				bail!("nothing to change: pass --title and/or --description");
			}
			if !store.update_task(id, data).await {
				return Err(store_error(store.error()));
			}
			output::success(&format!("Updated task {}", id));
		}
		TaskCommands::Toggle { id } => {
			// Toggling flips the locally known flag, so the task must be loaded first.
			if !store.load_task(id).await {
				return Err(store_error(store.error()));
			}
			if !store.toggle_complete(id).await {
				return Err(store_error(store.error()));
			}
			if let Some(task) = store.task(id) {
				println!("{}", output::format_task(&task));
			}
		}
		TaskCommands::Rm { id } => {
			if !store.delete_task(id).await {
				return Err(store_error(store.error()));
			}
			output::success(&format!("Deleted task {}", id));
		}
	}
	Ok(())
}

async fn run_admin(client: ApiClient, command: AdminCommands) -> anyhow::Result<()> {
	let store = AdminStore::new(client);

	match command {
		AdminCommands::Users { limit, offset } => {
			store.fetch_users(Page { limit, offset }).await;
			if let Some(error) = store.error() {
				bail!(error);
			}
			let listing = output::format_admin_users(&store.users(), store.total());
			println!("{}", listing);
		}
		AdminCommands::Show { id } => match store.fetch_user(id).await {
			Some(user) => println!("{}", output::format_admin_user(&user)),
			None => return Err(store_error(store.error())),
		},
		AdminCommands::Activate { id } => set_active(&store, id, true).await?,
		AdminCommands::Deactivate { id } => set_active(&store, id, false).await?,
	}
	Ok(())
}

async fn set_active(store: &AdminStore, id: Uuid, is_active: bool) -> anyhow::Result<()> {
	if !store.set_user_active(id, is_active).await {
		return Err(store_error(store.error()));
	}
	let verb = if is_active { "Activated" } else { "Deactivated" };
	output::success(&format!("{} account {}", verb, id));
	Ok(())
}
