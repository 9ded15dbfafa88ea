//! org-structure - departments, positions, hierarchy and change requests from the command line.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use org_structure as app;
use serde::Serialize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use app::config::{AppConfig, ConfigLoadResult, LoggingConfig};
use app::loader::{OrgSnapshot, load_org_snapshot, load_with_employees};
use app::models::{
    ChangeRequestStatus, CreateDepartment, CreatePosition, DepartmentChangeRequest, PositionChangeRequest,
    UpdateDepartment, UpdatePosition, apply_review,
};
use app::normalize::Collection;
use app::{AppError, OrgClient, RequestContext, report};

/// Manage departments, positions and change requests of the organization structure.
#[derive(Parser)]
#[command(name = "org-structure", version)]
struct Cli {
    /// Use config.toml from current directory (dev mode)
    #[arg(long, global = true)]
    dev: bool,

    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Bearer token for the backend
    #[arg(long, global = true, env = "ORG_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Override the backend base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Print records as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Department management
    #[command(subcommand)]
    Departments(DepartmentCommand),
    /// Position management
    #[command(subcommand)]
    Positions(PositionCommand),
    /// List employees with their primary position
    Employees,
    /// Show the reporting line and team of the current user
    Hierarchy,
    /// Department and position change requests
    #[command(subcommand)]
    Requests(RequestCommand),
    /// Load departments and positions together and list both
    Overview,
    /// Inspect or create the config file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum DepartmentCommand {
    List,
    Create(DepartmentFields),
    Update {
        id: String,
        #[command(flatten)]
        changes: DepartmentChanges,
    },
    Delete {
        id: String,
    },
}

#[derive(Args)]
struct DepartmentFields {
    #[arg(long)]
    code: String,
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    description: String,
    /// Create the department as inactive
    #[arg(long)]
    inactive: bool,
}

#[derive(Args)]
struct DepartmentChanges {
    #[arg(long)]
    code: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Position heading the department
    #[arg(long, conflicts_with = "clear_head")]
    head_position: Option<String>,
    #[arg(long)]
    clear_head: bool,
    #[arg(long)]
    active: Option<bool>,
}

#[derive(Subcommand)]
enum PositionCommand {
    List,
    Create(PositionFields),
    Update {
        id: String,
        #[command(flatten)]
        changes: PositionChanges,
    },
    Delete {
        id: String,
    },
}

#[derive(Args)]
struct PositionFields {
    #[arg(long)]
    code: String,
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    department: String,
    #[arg(long)]
    reports_to: Option<String>,
    /// Create the position as inactive
    #[arg(long)]
    inactive: bool,
}

#[derive(Args)]
struct PositionChanges {
    #[arg(long)]
    code: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    department: Option<String>,
    #[arg(long, conflicts_with = "clear_reports_to")]
    reports_to: Option<String>,
    #[arg(long)]
    clear_reports_to: bool,
    #[arg(long)]
    active: Option<bool>,
}

#[derive(Subcommand)]
enum RequestCommand {
    List,
    /// Request moving an employee to another department
    Department {
        #[arg(long)]
        employee: String,
        #[arg(long)]
        department: String,
        #[arg(long)]
        details: String,
        #[arg(long)]
        reason: String,
    },
    /// Request moving an employee to another position
    Position {
        #[arg(long)]
        employee: String,
        #[arg(long)]
        position: String,
        #[arg(long)]
        details: String,
        #[arg(long)]
        reason: String,
    },
    /// Set the status of a change request
    Review {
        id: String,
        #[arg(long)]
        status: ChangeRequestStatus,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        #[arg(long)]
        force: bool,
    },
}

struct Session {
    client: OrgClient,
    ctx: RequestContext,
    config: AppConfig,
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Determine config path based on mode
    let config_path = match (&cli.config, cli.dev) {
        (Some(path), _) => path.clone(),
        (None, true) => PathBuf::from("config.toml"),
        (None, false) => AppConfig::default_path(),
    };

    let (config, load_note) = match AppConfig::try_load(&config_path) {
        ConfigLoadResult::Loaded(config) => (config, None),
        ConfigLoadResult::Missing => (AppConfig::default(), Some("Config missing, using defaults".to_string())),
        ConfigLoadResult::Invalid(e) if matches!(cli.command, Command::Config(_)) => {
            (AppConfig::default(), Some(format!("Config invalid, showing defaults: {e}")))
        }
        ConfigLoadResult::Invalid(e) => return Err(anyhow!("Config invalid ({}): {e}", config_path.display())),
    };

    let _log_guard = init_logging(&config.logging);
    tracing::info!("Config path: {:?}", config_path);
    if let Some(note) = load_note {
        tracing::info!("{note}");
    }

    if let Command::Config(cmd) = &cli.command {
        return run_config(cmd, &config, &config_path);
    }

    let base_url = cli.base_url.clone().unwrap_or_else(|| config.api.base_url.clone());
    let token = cli.token.clone().or_else(|| config.api.token.clone());
    let session = Session {
        client: OrgClient::new(Duration::from_secs(config.api.timeout_secs))?,
        ctx: RequestContext::new(&base_url, token),
        config,
        json: cli.json,
    };
    tracing::info!("Backend: {}", session.ctx.base_url());

    run(&session, cli.command).await.map_err(describe)
}

/// Initialize logging: stderr always, plus a daily file when a directory is configured.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let stderr = fmt::layer().with_writer(std::io::stderr);

    match &config.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "org-structure.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            None
        }
    }
}

/// Turn an application error into the message shown to the user.
fn describe(err: AppError) -> anyhow::Error {
    let AppError::Status { status, .. } = err else {
        return anyhow!(err);
    };
    match err.server_message() {
        Some(msg) => anyhow!("Error ({status}): {msg}"),
        None => anyhow!("Error ({status})"),
    }
}

async fn run(session: &Session, command: Command) -> app::Result<()> {
    match command {
        Command::Departments(cmd) => run_departments(session, cmd).await,
        Command::Positions(cmd) => run_positions(session, cmd).await,
        Command::Employees => {
            let mut snapshot = load_with_employees(&session.client, &session.ctx).await;
            snapshot.require(Collection::Employees)?;
            report_failures(&snapshot);
            session.print(&snapshot.employees, || report::employees_table(&snapshot.employees, &snapshot))
        }
        Command::Hierarchy => {
            let view = session.client.hierarchy(&session.ctx).await?;
            if session.json {
                return print_json(&view);
            }
            let (line, team) = report::hierarchy_tables(&view);
            println!("Employee Hierarchy\n\n{}", line.render());
            if !team.is_empty() {
                println!("Team Structure\n\n{}", team.render());
            }
            Ok(())
        }
        Command::Requests(cmd) => run_requests(session, cmd).await,
        Command::Overview => {
            let snapshot = load_org_snapshot(&session.client, &session.ctx).await;
            if session.json {
                return print_json(&serde_json::json!({
                    "departments": snapshot.departments,
                    "positions": snapshot.positions,
                    "failures": snapshot.failures.iter().map(|f| f.message()).collect::<Vec<_>>(),
                }));
            }
            println!("Departments\n\n{}", report::departments_table(&snapshot).render());
            println!("Positions\n\n{}", report::positions_table(&snapshot).render());
            report_failures(&snapshot);
            println!("{}", snapshot.summary());
            Ok(())
        }
        Command::Config(_) => Ok(()),
    }
}

async fn run_departments(session: &Session, cmd: DepartmentCommand) -> app::Result<()> {
    let Session { client, ctx, .. } = session;
    match cmd {
        DepartmentCommand::List => {
            let mut snapshot = load_org_snapshot(client, ctx).await;
            snapshot.require(Collection::Departments)?;
            report_failures(&snapshot);
            session.print(&snapshot.departments, || report::departments_table(&snapshot))
        }
        DepartmentCommand::Create(fields) => {
            let data = CreateDepartment {
                code: fields.code,
                name: fields.name,
                description: fields.description,
                is_active: !fields.inactive,
            };
            client.create_department(ctx, &data).await?;
            println!("Department created successfully!");
            Ok(())
        }
        DepartmentCommand::Update { id, changes } => {
            let mut snapshot = load_org_snapshot(client, ctx).await;
            snapshot.require(Collection::Departments)?;
            let current = snapshot
                .department(&id)
                .ok_or_else(|| AppError::not_found(format!("department {id}")))?;

            let mut data = UpdateDepartment::from(current);
            if let Some(code) = changes.code {
                data.code = code;
            }
            if let Some(name) = changes.name {
                data.name = name;
            }
            if let Some(description) = changes.description {
                data.description = description;
            }
            if let Some(head) = changes.head_position.filter(|h| !h.trim().is_empty()) {
                if !snapshot.failed(Collection::Positions) && snapshot.position(&head).is_none() {
                    return Err(AppError::not_found(format!("position {head}")));
                }
                data.head_position_id = Some(head);
            }
            if changes.clear_head {
                data.head_position_id = None;
            }
            if let Some(active) = changes.active {
                data.is_active = active;
            }

            client.update_department(ctx, &id, &data).await?;
            let mut updated = current.clone();
            updated.apply_update(&data);
            println!("Department updated successfully!");
            println!(
                "{} ({}) head: {}",
                updated.name,
                updated.code,
                snapshot.position_title(updated.head_position_id.as_deref())
            );
            Ok(())
        }
        DepartmentCommand::Delete { id } => {
            client.delete_department(ctx, &id).await?;
            println!("Department deleted successfully!");
            Ok(())
        }
    }
}

async fn run_positions(session: &Session, cmd: PositionCommand) -> app::Result<()> {
    let Session { client, ctx, .. } = session;
    match cmd {
        PositionCommand::List => {
            let mut snapshot = load_org_snapshot(client, ctx).await;
            snapshot.require(Collection::Positions)?;
            report_failures(&snapshot);
            session.print(&snapshot.positions, || report::positions_table(&snapshot))
        }
        PositionCommand::Create(fields) => {
            let data = CreatePosition {
                code: fields.code,
                title: fields.title,
                description: fields.description,
                department_id: fields.department,
                reports_to_position_id: fields.reports_to.filter(|r| !r.trim().is_empty()),
                is_active: !fields.inactive,
            };
            client.create_position(ctx, &data).await?;
            println!("Position created successfully!");
            Ok(())
        }
        PositionCommand::Update { id, changes } => {
            let mut snapshot = load_org_snapshot(client, ctx).await;
            snapshot.require(Collection::Positions)?;
            let current = snapshot
                .position(&id)
                .ok_or_else(|| AppError::not_found(format!("position {id}")))?;

            let mut data = UpdatePosition::from(current);
            if let Some(code) = changes.code {
                data.code = code;
            }
            if let Some(title) = changes.title {
                data.title = title;
            }
            if let Some(description) = changes.description {
                data.description = description;
            }
            if let Some(department) = changes.department {
                if !snapshot.failed(Collection::Departments) && snapshot.department(&department).is_none() {
                    return Err(AppError::not_found(format!("department {department}")));
                }
                data.department_id = department;
            }
            if let Some(reports_to) = changes.reports_to.filter(|r| !r.trim().is_empty()) {
                if reports_to == id {
                    return Err(AppError::validation("a position cannot report to itself"));
                }
                data.reports_to_position_id = Some(reports_to);
            }
            if changes.clear_reports_to {
                data.reports_to_position_id = None;
            }
            if let Some(active) = changes.active {
                data.is_active = active;
            }

            client.update_position(ctx, &id, &data).await?;
            println!("Position updated successfully!");
            Ok(())
        }
        PositionCommand::Delete { id } => {
            client.delete_position(ctx, &id).await?;
            println!("Position deleted successfully!");
            Ok(())
        }
    }
}

async fn run_requests(session: &Session, cmd: RequestCommand) -> app::Result<()> {
    let Session { client, ctx, .. } = session;
    match cmd {
        RequestCommand::List => {
            let requests = client.list_change_requests(ctx).await?;
            if requests.is_empty() && !session.json {
                println!("No change requests found.");
                return Ok(());
            }
            session.print(&requests, || report::change_requests_table(&requests))
        }
        RequestCommand::Department {
            employee,
            department,
            details,
            reason,
        } => {
            let data = DepartmentChangeRequest {
                employee_id: employee,
                new_department_id: department,
                details,
                reason,
            };
            client.submit_department_change(ctx, &data).await?;
            println!("Department change request submitted successfully.");
            Ok(())
        }
        RequestCommand::Position {
            employee,
            position,
            details,
            reason,
        } => {
            let data = PositionChangeRequest {
                employee_id: employee,
                new_position_id: position,
                details,
                reason,
            };
            client.submit_position_change(ctx, &data).await?;
            println!("Position change request submitted successfully.");
            Ok(())
        }
        RequestCommand::Review { id, status } => {
            let mut requests = client.list_change_requests(ctx).await?;
            if !requests.iter().any(|r| r.id == id) {
                return Err(AppError::not_found(format!("change request {id}")));
            }

            client
                .review_change_request(ctx, &id, &status, session.config.api.review_style)
                .await?;
            apply_review(&mut requests, &id, &status);
            println!("Request {id} updated to {status}.");

            let reviewed: Vec<_> = requests.into_iter().filter(|r| r.id == id).collect();
            session.print(&reviewed, || report::change_requests_table(&reviewed))
        }
    }
}

fn run_config(cmd: &ConfigCommand, config: &AppConfig, path: &std::path::Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let mut shown = config.clone();
            if shown.api.token.is_some() {
                shown.api.token = Some("********".to_string());
            }
            println!("# {}", path.display());
            print!("{}", toml::to_string_pretty(&shown)?);
            Ok(())
        }
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(anyhow!("{} already exists (use --force to overwrite)", path.display()));
            }
            AppConfig::default()
                .save(path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

impl Session {
    /// Print records as JSON or as a table.
    fn print<T: Serialize>(&self, records: &[T], table: impl FnOnce() -> report::Table) -> app::Result<()> {
        if self.json {
            return print_json(records);
        }
        print!("{}", table().render());
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> app::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report_failures(snapshot: &OrgSnapshot) {
    for failure in &snapshot.failures {
        eprintln!("{}", failure.message());
    }
}
