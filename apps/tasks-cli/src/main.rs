//! tasks-cli: command-line front end for the tasks repository.
//!
//! Each invocation builds one `TasksRepository` from a local store (SQLite by
//! default, or in-memory) and a simulated remote, runs a single command and
//! exits. The remote lives in-process and is reseeded on every run, so
//! `list --refresh` replaces the local copy with the remote's sample data.
//!
//! Run:
//! ```bash
//! cargo run -p tasks-cli -- list
//! cargo run -p tasks-cli -- add "Buy milk" --description "2 litres"
//! REMOTE_LATENCY_MS=0 LOG_FORMAT=json RUST_LOG=debug cargo run -p tasks-cli -- list --refresh
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod config;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use domain::adapters::memory_source::InMemoryDataSource;
use domain::adapters::simulated_remote::SimulatedRemoteDataSource;
use domain::repository::TasksRepository;
use domain::validate::require_content;
use domain::{Task, TasksDataSource, TasksFilter};
use serde::Serialize;
use sqlite_adapter::SqliteTasksSource;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

type Repository = TasksRepository<Box<dyn TasksDataSource>, SimulatedRemoteDataSource>;

#[derive(Parser, Debug)]
#[command(name = "tasks", version, about = "Manage to-do tasks through a caching repository")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tasks
    List {
        /// all, active or completed
        #[arg(long, default_value = "all", value_parser = parse_filter)]
        filter: TasksFilter,
        /// Ignore cached data and reload from the remote
        #[arg(long)]
        refresh: bool,
    },
    /// Show one task
    Show { id: String },
    /// Create a task
    Add {
        title: String,
        #[arg(long, short, default_value = "")]
        description: String,
    },
    /// Mark a task completed
    Complete { id: String },
    /// Mark a task active again
    Activate { id: String },
    /// Delete one task
    Delete { id: String },
    /// Delete every completed task
    ClearCompleted,
    /// Delete every task
    DeleteAll,
}

fn parse_filter(s: &str) -> Result<TasksFilter, String> {
    TasksFilter::parse(s).ok_or_else(|| format!("unknown filter '{s}' (all, active, completed)"))
}

#[derive(Serialize)]
struct ListOutput<'a> {
    filter: &'static str,
    available: bool,
    tasks: &'a [Task],
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    debug!("{}", domain::about());
    cfg.warn_if_volatile();

    if let Err(e) = run(cli, &cfg).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // Logs go to stderr so stdout stays clean for command output
    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}

// Composition root: pick the local store from config and pair it with the remote.
fn build_repository(cfg: &config::Config) -> anyhow::Result<Repository> {
    let local: Box<dyn TasksDataSource> = match cfg.storage_provider {
        config::StorageProvider::Sqlite => {
            let store = SqliteTasksSource::open_creating_dirs(&cfg.db_path)
                .with_context(|| format!("opening {}", cfg.db_path.display()))?;
            Box::new(store)
        }
        config::StorageProvider::Memory => Box::new(InMemoryDataSource::new()),
    };

    let remote = if cfg.remote_seed {
        SimulatedRemoteDataSource::with_sample_tasks(cfg.remote_latency)?
    } else {
        SimulatedRemoteDataSource::new(cfg.remote_latency)
    };

    debug!(storage = ?cfg.storage_provider, latency_ms = cfg.remote_latency.as_millis() as u64, "repository built");
    Ok(TasksRepository::new(local, remote))
}

async fn run(cli: Cli, cfg: &config::Config) -> anyhow::Result<()> {
    let repo = build_repository(cfg)?;

    match cli.command {
        Command::List { filter, refresh } => {
            if refresh {
                repo.refresh_tasks().await?;
            }
            match repo.get_tasks().await? {
                Some(tasks) => {
                    let shown = filter.apply(tasks);
                    print_list(filter, Some(shown.as_slice()), cli.json)?;
                }
                None => print_list(filter, None, cli.json)?,
            }
        }
        Command::Show { id } => {
            let task = load_task(&repo, &id).await?;
            print_task(&task, cli.json)?;
        }
        Command::Add { title, description } => {
            require_content(&title, &description)?;
            let task = Task::new(title, description);
            repo.save_task(&task).await?;
            info!(task_id = task.id(), "task created");
            print_task(&task, cli.json)?;
        }
        Command::Complete { id } => {
            // Lookup warms the cache so the id-only form can resolve it.
            load_task(&repo, &id).await?;
            repo.complete_task_by_id(&id).await?;
            print_task(&load_task(&repo, &id).await?, cli.json)?;
        }
        Command::Activate { id } => {
            load_task(&repo, &id).await?;
            repo.activate_task_by_id(&id).await?;
            print_task(&load_task(&repo, &id).await?, cli.json)?;
        }
        Command::Delete { id } => {
            repo.delete_task(&id).await?;
            println!("deleted {id}");
        }
        Command::ClearCompleted => {
            repo.clear_completed_tasks().await?;
            println!("cleared completed tasks");
        }
        Command::DeleteAll => {
            repo.delete_all_tasks().await?;
            println!("deleted all tasks");
        }
    }
    Ok(())
}

async fn load_task(repo: &Repository, id: &str) -> anyhow::Result<Task> {
    repo.get_task(id)
        .await?
        .ok_or_else(|| anyhow!("task {id} not found"))
}

fn print_task(task: &Task, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(task)?);
    } else {
        println!("{}", task_line(task));
        if !task.description().is_empty() && !task.title().trim().is_empty() {
            println!("    {}", task.description());
        }
    }
    Ok(())
}

fn print_list(filter: TasksFilter, tasks: Option<&[Task]>, json: bool) -> anyhow::Result<()> {
    if json {
        let out = ListOutput {
            filter: filter.as_str(),
            available: tasks.is_some(),
            tasks: tasks.unwrap_or_default(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    match tasks {
        None => println!("No tasks available."),
        Some([]) => println!("No {} tasks.", filter.as_str()),
        Some(tasks) => {
            for task in tasks {
                println!("{}", task_line(task));
            }
        }
    }
    Ok(())
}

fn task_line(task: &Task) -> String {
    let mark = if task.is_completed() { "x" } else { " " };
    format!("[{}] {}  ({})", mark, task.title_for_list(), task.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn memory_config() -> config::Config {
        config::Config {
            storage_provider: config::StorageProvider::Memory,
            db_path: "./unused.db".into(),
            log_format: config::LogFormat::Pretty,
            remote_latency: Duration::ZERO,
            remote_seed: true,
        }
    }

    #[test]
    fn cli_parses_commands() {
        let cli = Cli::try_parse_from(["tasks", "list", "--filter", "active", "--refresh"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::List { filter: TasksFilter::Active, refresh: true }
        ));

        let cli = Cli::try_parse_from(["tasks", "--json", "add", "Title", "-d", "Desc"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Command::Add { ref title, .. } if title == "Title"));

        assert!(Cli::try_parse_from(["tasks", "list", "--filter", "someday"]).is_err());
    }

    #[test]
    fn task_line_marks_completion() {
        let task = Task::with_id("Title", "", "id-1").unwrap();
        assert_eq!(task_line(&task), "[ ] Title  (id-1)");
        assert_eq!(task_line(&task.completed()), "[x] Title  (id-1)");
    }

    #[tokio::test]
    async fn memory_repository_loads_seeded_remote() {
        let repo = build_repository(&memory_config()).unwrap();
        let tasks = repo.get_tasks().await.unwrap().unwrap();
        assert_eq!(tasks.len(), 2);
        // Remote data was mirrored into the local store
        assert_eq!(repo.local().get_tasks().await.unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn sqlite_repository_persists_between_builds() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = memory_config();
        cfg.storage_provider = config::StorageProvider::Sqlite;
        cfg.db_path = dir.path().join("data").join("tasks.db");
        cfg.remote_seed = false;

        let task = Task::new("Persist me", "");
        {
            let repo = build_repository(&cfg).unwrap();
            repo.save_task(&task).await.unwrap();
        }

        let repo = build_repository(&cfg).unwrap();
        let tasks = repo.get_tasks().await.unwrap().unwrap();
        assert_eq!(tasks, vec![task]);
    }
}
