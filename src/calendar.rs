//! Week scheduling: local-day arithmetic, the week query, per-day buckets.

use crate::db::{Collections, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{CalendarDay, CreateEventPayload, ScheduledEvent, Timestamp, WeekRange, WeekSchedule, WeekView};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Offset, TimeZone};
use uuid::Uuid;

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Local midnight of the calendar day containing `at`.
pub fn start_of_day<Tz: TimeZone>(at: &DateTime<Tz>) -> Timestamp {
    local_midnight(&at.timezone(), at.date_naive())
}

/// Sunday 00:00:00.000 through Saturday 23:59:59.999 of the local week containing `at`.
pub fn week_bounds<Tz: TimeZone>(at: &DateTime<Tz>) -> WeekRange {
    let date = at.date_naive();
    let first_day = date - Duration::days(i64::from(date.weekday().num_days_from_sunday()));
    let tz = at.timezone();
    WeekRange {
        week_start: local_midnight(&tz, first_day),
        week_end: local_midnight(&tz, first_day + Duration::days(7)) - 1,
    }
}

/// Tasks scheduled or due inside `range` (each once) and events starting inside it.
pub fn tasks_for_week<C: Collections + ?Sized>(store: &C, range: WeekRange) -> AppResult<WeekSchedule> {
    let tasks = store.load_tasks_in_range(range)?;
    let mut events = store.load_events_in_range(range)?;
    events.sort_by_key(|event| event.start_time);
    tracing::debug!(
        week_start = range.week_start,
        week_end = range.week_end,
        tasks = tasks.len(),
        events = events.len(),
        "week schedule loaded"
    );
    Ok(WeekSchedule { tasks, events })
}

/// Splits a week schedule into seven local days starting at `range.week_start`.
///
/// A task lands on the day of its scheduled time, or of its due date when it is
/// unscheduled; events land on the day they start. Day windows are
/// `[day_start, day_start + 24h)`.
pub fn group_by_day<Tz: TimeZone>(tz: &Tz, range: WeekRange, schedule: &WeekSchedule) -> WeekView {
    let first_date = tz
        .timestamp_millis_opt(range.week_start)
        .single()
        .map(|at| at.date_naive());

    let days = (0..7)
        .map(|offset| {
            let day_start = match first_date {
                Some(date) => local_midnight(tz, date + Duration::days(offset)),
                None => range.week_start + offset * DAY_MS,
            };
            let day_end = day_start + DAY_MS;
            let in_day = |at: Timestamp| at >= day_start && at < day_end;
            CalendarDay {
                day_start,
                tasks: schedule
                    .tasks
                    .iter()
                    .filter(|task| task.calendar_anchor().is_some_and(in_day))
                    .cloned()
                    .collect(),
                events: schedule
                    .events
                    .iter()
                    .filter(|event| in_day(event.start_time))
                    .cloned()
                    .collect(),
            }
        })
        .collect();

    WeekView { range, days }
}

pub fn create_event(db: &Database, payload: CreateEventPayload) -> AppResult<ScheduledEvent> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("event title must not be empty".to_string()));
    }
    if payload.end_time.is_some_and(|end| end < payload.start_time) {
        return Err(AppError::Validation("event must not end before it starts".to_string()));
    }

    let event = ScheduledEvent {
        id: Uuid::new_v4().to_string(),
        title: title.to_string(),
        description: payload.description,
        start_time: payload.start_time,
        end_time: payload.end_time,
        event_type: payload.event_type,
        tags: payload.tags.unwrap_or_default(),
    };
    db.insert_event(&event)?;
    tracing::debug!(event_id = %event.id, start_time = event.start_time, "event scheduled");
    Ok(event)
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Timestamp {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight).earliest() {
        Some(start) => start.timestamp_millis(),
        // midnight skipped by a DST jump
        None => {
            let offset = tz.offset_from_utc_datetime(&midnight).fix();
            (midnight - Duration::seconds(i64::from(offset.local_minus_utc())))
                .and_utc()
                .timestamp_millis()
        }
    }
}
