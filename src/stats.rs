use crate::calendar;
use crate::db::Collections;
use crate::errors::AppResult;
use crate::models::{Activity, ActivityStats, Task, TaskStats, TaskStatus, Timestamp};
use chrono::{DateTime, TimeZone};

pub const DEFAULT_COST_PER_TOKEN: f64 = 0.000_002;
pub const ROLLING_WEEK_MS: i64 = 7 * calendar::DAY_MS;

/// Folds the activity log into dashboard counters relative to `now`.
///
/// `today` counts from local midnight. Everything else except `total` covers
/// the rolling seven days ending at `now`; `total` is the size of the log.
pub fn activity_stats<Tz: TimeZone>(activities: &[Activity], now: &DateTime<Tz>, cost_per_token: f64) -> ActivityStats {
    let today_start = calendar::start_of_day(now);
    let week_start = now.timestamp_millis() - ROLLING_WEEK_MS;

    let mut stats = ActivityStats {
        total: activities.len(),
        ..ActivityStats::default()
    };
    for activity in activities {
        if activity.timestamp >= today_start {
            stats.today += 1;
        }
        if activity.timestamp < week_start {
            continue;
        }
        stats.this_week += 1;
        *stats.by_type.entry(activity.activity_type.clone()).or_insert(0) += 1;
        let tokens = activity.tokens.unwrap_or(0);
        stats.total_tokens = stats.total_tokens.saturating_add(tokens);
        stats.total_cost += activity.cost.unwrap_or(tokens as f64 * cost_per_token);
    }
    stats
}

pub fn task_stats(tasks: &[Task], now: Timestamp) -> TaskStats {
    let mut stats = TaskStats {
        total: tasks.len(),
        ..TaskStats::default()
    };
    for task in tasks {
        match task.status {
            TaskStatus::Todo => stats.todo += 1,
            TaskStatus::InProgress => stats.in_progress += 1,
            TaskStatus::Done => stats.done += 1,
            TaskStatus::Cancelled => stats.cancelled += 1,
        }
        if task.status != TaskStatus::Done && task.due_date.is_some_and(|due| due < now) {
            stats.overdue += 1;
        }
    }
    stats
}

pub fn collect_activity_stats<C, Tz>(store: &C, now: &DateTime<Tz>, cost_per_token: f64) -> AppResult<ActivityStats>
where
    C: Collections + ?Sized,
    Tz: TimeZone,
{
    let activities = store.load_activities()?;
    Ok(activity_stats(&activities, now, cost_per_token))
}

pub fn collect_task_stats<C: Collections + ?Sized>(store: &C, now: Timestamp) -> AppResult<TaskStats> {
    let tasks = store.load_tasks()?;
    Ok(task_stats(&tasks, now))
}
