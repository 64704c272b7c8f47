//! mission-control CLI: search, stats and scheduling over the local store.

use anyhow::Context;
use clap::{Parser, Subcommand};
use mission_control_lib::config::AppConfig;
use mission_control_lib::models::{
    CreateEventPayload, CreateMemoryPayload, CreateTaskPayload, ImportActivitiesPayload, ImportDocumentsPayload,
    ListTasksFilters, LogActivityPayload, NotionTaskPayload, SearchRequest, TaskPriority, TaskStatus, Timestamp,
    UpdateTaskStatusPayload, WeekRange,
};
use mission_control_lib::AppState;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "mission-control", about = "Dashboard core for an agent's activity, tasks and knowledge")]
struct Cli {
    /// Data directory
    #[arg(long, global = true, env = "MISSION_CONTROL_HOME")]
    home: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search memories, documents and tasks
    Search {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
        /// Restrict to these kinds (memory, document, task)
        #[arg(long = "type", value_delimiter = ',')]
        types: Vec<String>,
    },
    /// Suggest tags starting with a prefix
    Suggest {
        prefix: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show recent searches
    History {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Dashboard counters
    Stats {
        #[command(subcommand)]
        target: StatsTarget,
    },
    /// Newest activities with counters
    Recent {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Append an activity to the log
    Log {
        #[arg(long = "type")]
        activity_type: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        failed: bool,
        #[arg(long)]
        tokens: Option<i64>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        cost: Option<f64>,
        #[arg(long)]
        details: Option<String>,
    },
    /// Tasks and events of a week; the current local week by default
    Week {
        /// Epoch milliseconds or RFC 3339
        #[arg(long, value_parser = parse_timestamp, requires = "end")]
        start: Option<Timestamp>,
        #[arg(long, value_parser = parse_timestamp, requires = "start")]
        end: Option<Timestamp>,
    },
    /// Task operations
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Memory operations
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },
    /// Calendar event operations
    Event {
        #[command(subcommand)]
        action: EventAction,
    },
    /// Import records from a JSON file
    Import {
        #[command(subcommand)]
        source: ImportSource,
    },
    /// Print status counters periodically until Ctrl-C
    Watch {
        /// Seconds between refreshes
        #[arg(long, default_value_t = 30)]
        interval: u64,
    },
}

#[derive(Subcommand)]
enum StatsTarget {
    Activities,
    Tasks,
}

#[derive(Subcommand)]
enum TaskAction {
    Create {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<TaskPriority>,
        #[arg(long, value_parser = parse_timestamp)]
        due: Option<Timestamp>,
        #[arg(long, value_parser = parse_timestamp)]
        scheduled: Option<Timestamp>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    List {
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<TaskPriority>,
        #[arg(long)]
        limit: Option<usize>,
    },
    Status {
        task_id: String,
        #[arg(value_parser = parse_status)]
        status: TaskStatus,
    },
}

#[derive(Subcommand)]
enum MemoryAction {
    Add {
        content: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        importance: Option<u8>,
        #[arg(long)]
        source: Option<String>,
    },
}

#[derive(Subcommand)]
enum EventAction {
    Add {
        title: String,
        #[arg(long, value_parser = parse_timestamp)]
        start: Timestamp,
        #[arg(long, value_parser = parse_timestamp)]
        end: Option<Timestamp>,
        #[arg(long = "type", default_value = "reminder")]
        event_type: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ImportSource {
    Documents { file: PathBuf },
    Activities { file: PathBuf },
    Notion { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.home {
        Some(home) => AppConfig::load_in(home)?,
        None => AppConfig::load()?,
    };
    if let Err(error) = mission_control_lib::init_tracing(&config.log_path()) {
        eprintln!("logging disabled: {error}");
    }
    let state = AppState::open(config).map_err(anyhow::Error::msg)?;

    match cli.command {
        Command::Search { query, limit, types } => {
            let request = SearchRequest {
                query,
                limit,
                types: (!types.is_empty()).then_some(types),
            };
            print_json(mission_control_lib::global_search(&state, request))
        }
        Command::Suggest { prefix, limit } => print_json(mission_control_lib::search_suggestions(&state, &prefix, limit)),
        Command::History { limit } => print_json(mission_control_lib::search_history(&state, limit)),
        Command::Stats { target } => match target {
            StatsTarget::Activities => print_json(mission_control_lib::get_activity_stats(&state)),
            StatsTarget::Tasks => print_json(mission_control_lib::get_task_stats(&state)),
        },
        Command::Recent { limit } => print_json(mission_control_lib::get_recent_activities(&state, limit)),
        Command::Log {
            activity_type,
            description,
            failed,
            tokens,
            model,
            cost,
            details,
        } => {
            let payload = LogActivityPayload {
                activity_type,
                description,
                success: Some(!failed),
                tokens,
                model,
                cost,
                details,
                metadata: None,
            };
            print_json(mission_control_lib::log_activity(&state, payload))
        }
        Command::Week { start, end } => match (start, end) {
            (Some(week_start), Some(week_end)) => print_json(mission_control_lib::get_tasks_for_week(
                &state,
                WeekRange { week_start, week_end },
            )),
            _ => print_json(mission_control_lib::get_current_week(&state)),
        },
        Command::Task { action } => match action {
            TaskAction::Create {
                title,
                description,
                status,
                priority,
                due,
                scheduled,
                tags,
            } => {
                let payload = CreateTaskPayload {
                    title,
                    description,
                    status,
                    priority,
                    due_date: due,
                    scheduled_for: scheduled,
                    tags: Some(tags),
                };
                print_json(mission_control_lib::create_task(&state, payload))
            }
            TaskAction::List { status, priority, limit } => print_json(mission_control_lib::list_tasks(
                &state,
                ListTasksFilters { status, priority, limit },
            )),
            TaskAction::Status { task_id, status } => print_json(mission_control_lib::update_task_status(
                &state,
                UpdateTaskStatusPayload { task_id, status },
            )),
        },
        Command::Memory {
            action:
                MemoryAction::Add {
                    content,
                    tags,
                    importance,
                    source,
                },
        } => {
            let payload = CreateMemoryPayload {
                content,
                tags: Some(tags),
                importance,
                source,
            };
            print_json(mission_control_lib::create_memory(&state, payload))
        }
        Command::Event {
            action:
                EventAction::Add {
                    title,
                    start,
                    end,
                    event_type,
                    description,
                    tags,
                },
        } => {
            let payload = CreateEventPayload {
                title,
                description,
                start_time: start,
                end_time: end,
                event_type,
                tags: Some(tags),
            };
            print_json(mission_control_lib::create_event(&state, payload))
        }
        Command::Import { source } => match source {
            ImportSource::Documents { file } => {
                let payload: ImportDocumentsPayload = read_json(&file)?;
                print_json(mission_control_lib::import_documents(&state, payload))
            }
            ImportSource::Activities { file } => {
                let payload: ImportActivitiesPayload = read_json(&file)?;
                print_json(mission_control_lib::import_activities(&state, payload))
            }
            ImportSource::Notion { file } => {
                let payload: NotionTaskPayload = read_json(&file)?;
                print_json(mission_control_lib::import_notion_task(&state, payload))
            }
        },
        Command::Watch { interval } => cmd_watch(&state, interval).await,
    }
}

async fn cmd_watch(state: &AppState, interval_secs: u64) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    tracing::info!(interval_secs, "watch started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match mission_control_lib::get_status(state) {
                    Ok(status) => println!("{}", serde_json::to_string(&status)?),
                    Err(error) => tracing::warn!(error = %error, "status refresh failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("watch stopped");
                return Ok(());
            }
        }
    }
}

fn print_json<T: Serialize>(result: Result<T, String>) -> anyhow::Result<()> {
    let value = result.map_err(anyhow::Error::msg)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn parse_timestamp(raw: &str) -> Result<Timestamp, String> {
    if let Ok(millis) = raw.parse::<Timestamp>() {
        return Ok(millis);
    }
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|at| at.timestamp_millis())
        .map_err(|error| format!("expected epoch milliseconds or RFC 3339: {error}"))
}

fn parse_status(raw: &str) -> Result<TaskStatus, String> {
    raw.parse().map_err(|error: mission_control_lib::errors::AppError| error.to_string())
}

fn parse_priority(raw: &str) -> Result<TaskPriority, String> {
    raw.parse().map_err(|error: mission_control_lib::errors::AppError| error.to_string())
}
