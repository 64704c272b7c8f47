//! Append-only activity log: ingress normalisation, the recent feed and the
//! typed constructors used by callers that report what an agent did.

use crate::db::{Collections, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{Activity, LogActivityPayload, Metadata, RecentActivities, Timestamp};
use crate::stats;
use chrono::{DateTime, TimeZone};
use serde_json::json;
use uuid::Uuid;

pub const DEFAULT_RECENT_LIMIT: usize = 50;
pub const UNKNOWN_ACTIVITY_TYPE: &str = "unknown";

const PREVIEW_CHARS: usize = 50;
const ERROR_CHARS: usize = 100;

/// Fills the ingress defaults and stamps the record with `now`.
pub fn from_payload(payload: LogActivityPayload, now: Timestamp) -> Activity {
    Activity {
        id: Uuid::new_v4().to_string(),
        activity_type: payload
            .activity_type
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_ACTIVITY_TYPE.to_string()),
        description: payload.description.unwrap_or_default(),
        success: payload.success.unwrap_or(true),
        timestamp: now,
        tokens: payload.tokens,
        model: payload.model,
        cost: payload.cost,
        details: payload.details,
        session_key: None,
        metadata: payload.metadata.unwrap_or_default(),
    }
}

/// Token counts and costs must be non-negative; costs must also be finite.
pub fn validate_usage(tokens: Option<i64>, cost: Option<f64>) -> AppResult<()> {
    if let Some(tokens) = tokens.filter(|tokens| *tokens < 0) {
        return Err(AppError::Validation(format!("tokens must not be negative, got {tokens}")));
    }
    if let Some(cost) = cost.filter(|cost| !cost.is_finite() || *cost < 0.0) {
        return Err(AppError::Validation(format!("cost must be a non-negative number, got {cost}")));
    }
    Ok(())
}

pub fn log(db: &Database, payload: LogActivityPayload, now: Timestamp) -> AppResult<Activity> {
    validate_usage(payload.tokens, payload.cost)?;
    let activity = from_payload(payload, now);
    db.insert_activity(&activity)?;
    tracing::debug!(
        activity_id = %activity.id,
        activity_type = %activity.activity_type,
        success = activity.success,
        "activity logged"
    );
    Ok(activity)
}

/// The newest `limit` activities plus the current counters.
///
/// `has_more` reports a full page; a zero limit never has more.
pub fn recent<C, Tz>(store: &C, limit: usize, now: &DateTime<Tz>, cost_per_token: f64) -> AppResult<RecentActivities>
where
    C: Collections + ?Sized,
    Tz: TimeZone,
{
    let activities = store.load_recent_activities(limit)?;
    let stats = stats::collect_activity_stats(store, now, cost_per_token)?;
    Ok(RecentActivities {
        has_more: limit > 0 && activities.len() == limit,
        activities,
        stats,
    })
}

/// Well-known activities and the descriptions they are logged with.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityKind {
    WebSearch { query: String },
    WebFetch { url: String },
    FileRead { path: String },
    FileWrite { path: String },
    FileEdit { path: String },
    ShellExec { command: String },
    ModelCall { model: String, tokens: i64, description: String },
    MemorySaved { key: String },
    MessageReceived { preview: String },
    MessageSent { preview: String },
    Error { message: String, context: String },
    Search { query: String, results: usize },
}

impl ActivityKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::WebSearch { .. } => "web_search",
            Self::WebFetch { .. } => "web_fetch",
            Self::FileRead { .. } => "file_read",
            Self::FileWrite { .. } => "file_write",
            Self::FileEdit { .. } => "file_edit",
            Self::ShellExec { .. } => "shell_exec",
            Self::ModelCall { .. } => "model_call",
            Self::MemorySaved { .. } => "memory_saved",
            Self::MessageReceived { .. } => "message_received",
            Self::MessageSent { .. } => "message_sent",
            Self::Error { .. } => "error",
            Self::Search { .. } => crate::search::HISTORY_ACTIVITY_TYPE,
        }
    }

    pub fn into_payload(self) -> LogActivityPayload {
        let activity_type = Some(self.type_name().to_string());
        let mut payload = LogActivityPayload {
            activity_type,
            success: Some(true),
            ..LogActivityPayload::default()
        };
        let description = match self {
            Self::WebSearch { query } => format!("Searched: {query}"),
            Self::WebFetch { url } => format!("Fetched: {url}"),
            Self::FileRead { path } => format!("Read: {path}"),
            Self::FileWrite { path } => format!("Wrote: {path}"),
            Self::FileEdit { path } => format!("Edited: {path}"),
            Self::ShellExec { command } => format!("Executed: {}", truncate_chars(&command, PREVIEW_CHARS)),
            Self::ModelCall {
                model,
                tokens,
                description,
            } => {
                payload.model = Some(model);
                payload.tokens = Some(tokens);
                description
            }
            Self::MemorySaved { key } => format!("Saved: {key}"),
            Self::MessageReceived { preview } => format!("Received: {}...", truncate_chars(&preview, PREVIEW_CHARS)),
            Self::MessageSent { preview } => format!("Sent: {}...", truncate_chars(&preview, PREVIEW_CHARS)),
            Self::Error { message, context } => {
                let description = format!("Error in {context}: {}", truncate_chars(&message, ERROR_CHARS));
                payload.success = Some(false);
                payload.details = Some(message);
                description
            }
            Self::Search { query, results } => {
                let mut metadata = Metadata::new();
                metadata.insert("results".to_string(), json!(results));
                payload.metadata = Some(metadata);
                query
            }
        };
        payload.description = Some(description);
        payload
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((index, _)) => &value[..index],
        None => value,
    }
}
