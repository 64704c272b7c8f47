use crate::db::{Collections, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{
    CreateTaskPayload, ListTasksFilters, Task, TaskPriority, TaskStatus, Timestamp, UpdateTaskStatusPayload,
};
use uuid::Uuid;

pub const DEFAULT_LIST_LIMIT: usize = 50;

pub fn create(db: &Database, payload: CreateTaskPayload, now: Timestamp) -> AppResult<Task> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("task title must not be empty".to_string()));
    }

    let status = payload.status.unwrap_or(TaskStatus::Todo);
    let task = Task {
        id: Uuid::new_v4().to_string(),
        title: title.to_string(),
        description: payload.description.filter(|value| !value.trim().is_empty()),
        status,
        priority: payload.priority.unwrap_or(TaskPriority::Medium),
        due_date: payload.due_date,
        scheduled_for: payload.scheduled_for,
        tags: payload.tags.unwrap_or_default(),
        notion_id: None,
        completed_at: (status == TaskStatus::Done).then_some(now),
        created_at: now,
        updated_at: now,
    };
    db.insert_task(&task)?;
    tracing::info!(task_id = %task.id, status = task.status.as_str(), "task created");
    Ok(task)
}

/// Filtered tasks ordered by due date, or creation time when undated, oldest first.
pub fn list<C: Collections + ?Sized>(store: &C, filters: &ListTasksFilters, default_limit: usize) -> AppResult<Vec<Task>> {
    let mut tasks: Vec<Task> = store
        .load_tasks()?
        .into_iter()
        .filter(|task| filters.status.map_or(true, |status| task.status == status))
        .filter(|task| filters.priority.map_or(true, |priority| task.priority == priority))
        .collect();
    tasks.sort_by_key(|task| task.due_date.unwrap_or(task.created_at));
    tasks.truncate(filters.limit.unwrap_or(default_limit));
    Ok(tasks)
}

pub fn update_status(db: &Database, payload: UpdateTaskStatusPayload, now: Timestamp) -> AppResult<Task> {
    let task = db.update_task_status(&payload.task_id, payload.status, now)?;
    tracing::info!(task_id = %task.id, status = task.status.as_str(), "task status updated");
    Ok(task)
}
