use crate::activities::{self, ActivityKind};
use crate::calendar;
use crate::config::AppConfig;
use crate::db::Database;
use crate::errors::AppResult;
use crate::memories;
use crate::models::{
    Activity, ActivityImportResponse, ActivityStats, CreateEventPayload, CreateMemoryPayload, CreateTaskPayload,
    DocumentImportResponse, ImportActivitiesPayload, ImportDocumentsPayload, ListTasksFilters, LogActivityPayload,
    Memory, NotionImportResponse, NotionTaskPayload, RecentActivities, ScheduledEvent, SearchRequest, SearchResult,
    StatusSummary, SyncState, Task, TaskStats, UpdateTaskStatusPayload, WeekRange, WeekSchedule, WeekView,
};
use crate::search;
use crate::stats;
use crate::sync;
use crate::tasks;
use chrono::{DateTime, TimeZone};
use std::sync::Arc;

/// The dashboard backend: one store, one configuration, every operation.
///
/// Nothing here reads the clock; callers pass `now`.
pub struct MissionControl {
    db: Arc<Database>,
    config: AppConfig,
}

impl MissionControl {
    pub fn open(config: AppConfig) -> AppResult<Arc<Self>> {
        config.validate()?;
        let db = Arc::new(Database::new(&config.database_path())?);
        tracing::info!(db_path = %db.path().display(), "mission control ready");
        Ok(Arc::new(Self { db, config }))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Runs a global search; short queries return nothing without a store read.
    pub fn search<Tz: TimeZone>(&self, request: SearchRequest, now: &DateTime<Tz>) -> AppResult<Vec<SearchResult>> {
        let term = request.query.trim().to_string();
        if term.chars().count() < self.config.search.min_query_length {
            tracing::debug!(term_len = term.chars().count(), "search query below minimum length");
            return Ok(Vec::new());
        }

        let request = SearchRequest {
            limit: Some(request.limit.unwrap_or(self.config.search.default_limit)),
            ..request
        };
        let results = search::global(self.db.as_ref(), &request)?;
        tracing::info!(term_len = term.chars().count(), results = results.len(), "search completed");

        if self.config.search.record_history {
            let entry = ActivityKind::Search {
                query: term,
                results: results.len(),
            };
            if let Err(error) = activities::log(&self.db, entry.into_payload(), now.timestamp_millis()) {
                tracing::warn!(error = %error, "failed to record search history");
            }
        }
        Ok(results)
    }

    pub fn suggestions(&self, prefix: &str, limit: Option<usize>) -> AppResult<Vec<String>> {
        search::suggestions(
            self.db.as_ref(),
            prefix,
            limit.unwrap_or(self.config.search.suggestion_limit),
            self.config.search.suggestion_scan,
        )
    }

    pub fn search_history(&self, limit: Option<usize>) -> AppResult<Vec<Activity>> {
        search::history(self.db.as_ref(), limit.unwrap_or(self.config.search.history_limit))
    }

    pub fn activity_stats<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> AppResult<ActivityStats> {
        stats::collect_activity_stats(self.db.as_ref(), now, self.config.activity.cost_per_token)
    }

    pub fn task_stats<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> AppResult<TaskStats> {
        stats::collect_task_stats(self.db.as_ref(), now.timestamp_millis())
    }

    pub fn status<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> AppResult<StatusSummary> {
        Ok(StatusSummary {
            activities: self.activity_stats(now)?,
            tasks: self.task_stats(now)?,
        })
    }

    pub fn recent_activities<Tz: TimeZone>(&self, limit: Option<usize>, now: &DateTime<Tz>) -> AppResult<RecentActivities> {
        activities::recent(
            self.db.as_ref(),
            limit.unwrap_or(self.config.activity.recent_limit),
            now,
            self.config.activity.cost_per_token,
        )
    }

    pub fn log_activity<Tz: TimeZone>(&self, payload: LogActivityPayload, now: &DateTime<Tz>) -> AppResult<Activity> {
        activities::log(&self.db, payload, now.timestamp_millis())
    }

    pub fn tasks_for_week(&self, range: WeekRange) -> AppResult<WeekSchedule> {
        calendar::tasks_for_week(self.db.as_ref(), range)
    }

    /// The local week containing `now`, split into days.
    pub fn week_view<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> AppResult<WeekView> {
        let range = calendar::week_bounds(now);
        let schedule = self.tasks_for_week(range)?;
        Ok(calendar::group_by_day(&now.timezone(), range, &schedule))
    }

    pub fn create_task<Tz: TimeZone>(&self, payload: CreateTaskPayload, now: &DateTime<Tz>) -> AppResult<Task> {
        tasks::create(&self.db, payload, now.timestamp_millis())
    }

    pub fn list_tasks(&self, filters: &ListTasksFilters) -> AppResult<Vec<Task>> {
        tasks::list(self.db.as_ref(), filters, self.config.tasks.list_limit)
    }

    pub fn update_task_status<Tz: TimeZone>(&self, payload: UpdateTaskStatusPayload, now: &DateTime<Tz>) -> AppResult<Task> {
        tasks::update_status(&self.db, payload, now.timestamp_millis())
    }

    pub fn create_memory<Tz: TimeZone>(&self, payload: CreateMemoryPayload, now: &DateTime<Tz>) -> AppResult<Memory> {
        memories::create(&self.db, payload, now.timestamp_millis())
    }

    pub fn create_event(&self, payload: CreateEventPayload) -> AppResult<ScheduledEvent> {
        calendar::create_event(&self.db, payload)
    }

    pub fn import_documents<Tz: TimeZone>(
        &self,
        payload: &ImportDocumentsPayload,
        now: &DateTime<Tz>,
    ) -> AppResult<DocumentImportResponse> {
        sync::import_documents(&self.db, payload, now.timestamp_millis())
    }

    pub fn import_activities(&self, payload: &ImportActivitiesPayload) -> AppResult<ActivityImportResponse> {
        sync::import_activities(&self.db, payload)
    }

    pub fn import_notion_task<Tz: TimeZone>(
        &self,
        payload: &NotionTaskPayload,
        now: &DateTime<Tz>,
    ) -> AppResult<NotionImportResponse> {
        sync::import_notion_task(&self.db, payload, now.timestamp_millis())
    }

    pub fn latest_sync_state(&self) -> AppResult<Option<SyncState>> {
        self.db.latest_sync_state()
    }
}
