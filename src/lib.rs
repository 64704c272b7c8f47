pub mod activities;
pub mod calendar;
pub mod config;
pub mod control;
pub mod db;
pub mod errors;
pub mod memories;
pub mod models;
pub mod search;
pub mod stats;
pub mod sync;
pub mod tasks;

use crate::config::AppConfig;
use crate::control::MissionControl;
use crate::models::{
    Activity, ActivityImportResponse, ActivityStats, CreateEventPayload, CreateMemoryPayload, CreateTaskPayload,
    DocumentImportResponse, ImportActivitiesPayload, ImportDocumentsPayload, ListTasksFilters, LogActivityPayload,
    Memory, NotionImportResponse, NotionTaskPayload, RecentActivities, ScheduledEvent, SearchRequest, SearchResult,
    StatusSummary, SyncState, Task, TaskStats, UpdateTaskStatusPayload, WeekRange, WeekSchedule, WeekView,
};
use chrono::Local;
use std::path::Path;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

#[derive(Clone)]
pub struct AppState {
    control: Arc<MissionControl>,
}

impl AppState {
    pub fn open(config: AppConfig) -> Result<Self, String> {
        let control = MissionControl::open(config).map_err(to_client_error)?;
        Ok(Self { control })
    }

    pub fn control(&self) -> &MissionControl {
        &self.control
    }
}

pub fn global_search(state: &AppState, request: SearchRequest) -> Result<Vec<SearchResult>, String> {
    state.control.search(request, &Local::now()).map_err(to_client_error)
}

pub fn search_suggestions(state: &AppState, prefix: &str, limit: Option<usize>) -> Result<Vec<String>, String> {
    state.control.suggestions(prefix, limit).map_err(to_client_error)
}

pub fn search_history(state: &AppState, limit: Option<usize>) -> Result<Vec<Activity>, String> {
    state.control.search_history(limit).map_err(to_client_error)
}

pub fn get_activity_stats(state: &AppState) -> Result<ActivityStats, String> {
    state.control.activity_stats(&Local::now()).map_err(to_client_error)
}

pub fn get_task_stats(state: &AppState) -> Result<TaskStats, String> {
    state.control.task_stats(&Local::now()).map_err(to_client_error)
}

pub fn get_status(state: &AppState) -> Result<StatusSummary, String> {
    state.control.status(&Local::now()).map_err(to_client_error)
}

pub fn get_recent_activities(state: &AppState, limit: Option<usize>) -> Result<RecentActivities, String> {
    state
        .control
        .recent_activities(limit, &Local::now())
        .map_err(to_client_error)
}

pub fn log_activity(state: &AppState, payload: LogActivityPayload) -> Result<Activity, String> {
    state.control.log_activity(payload, &Local::now()).map_err(to_client_error)
}

pub fn get_tasks_for_week(state: &AppState, range: WeekRange) -> Result<WeekSchedule, String> {
    state.control.tasks_for_week(range).map_err(to_client_error)
}

pub fn get_current_week(state: &AppState) -> Result<WeekView, String> {
    state.control.week_view(&Local::now()).map_err(to_client_error)
}

pub fn create_task(state: &AppState, payload: CreateTaskPayload) -> Result<Task, String> {
    state.control.create_task(payload, &Local::now()).map_err(to_client_error)
}

pub fn list_tasks(state: &AppState, filters: ListTasksFilters) -> Result<Vec<Task>, String> {
    state.control.list_tasks(&filters).map_err(to_client_error)
}

pub fn update_task_status(state: &AppState, payload: UpdateTaskStatusPayload) -> Result<Task, String> {
    state
        .control
        .update_task_status(payload, &Local::now())
        .map_err(to_client_error)
}

pub fn create_memory(state: &AppState, payload: CreateMemoryPayload) -> Result<Memory, String> {
    state.control.create_memory(payload, &Local::now()).map_err(to_client_error)
}

pub fn create_event(state: &AppState, payload: CreateEventPayload) -> Result<ScheduledEvent, String> {
    state.control.create_event(payload).map_err(to_client_error)
}

pub fn import_documents(state: &AppState, payload: ImportDocumentsPayload) -> Result<DocumentImportResponse, String> {
    state
        .control
        .import_documents(&payload, &Local::now())
        .map_err(to_client_error)
}

pub fn import_activities(state: &AppState, payload: ImportActivitiesPayload) -> Result<ActivityImportResponse, String> {
    state.control.import_activities(&payload).map_err(to_client_error)
}

pub fn import_notion_task(state: &AppState, payload: NotionTaskPayload) -> Result<NotionImportResponse, String> {
    state
        .control
        .import_notion_task(&payload, &Local::now())
        .map_err(to_client_error)
}

pub fn get_sync_state(state: &AppState) -> Result<Option<SyncState>, String> {
    state.control.latest_sync_state().map_err(to_client_error)
}

pub fn init_tracing(log_dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "mission-control.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}

fn to_client_error(error: impl std::fmt::Display) -> String {
    error.to_string()
}
