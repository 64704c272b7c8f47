use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{CreateMemoryPayload, Memory, Timestamp};
use uuid::Uuid;

pub const DEFAULT_IMPORTANCE: u8 = 5;

pub fn create(db: &Database, payload: CreateMemoryPayload, now: Timestamp) -> AppResult<Memory> {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("memory content must not be empty".to_string()));
    }
    let importance = payload.importance.unwrap_or(DEFAULT_IMPORTANCE);
    if !(1..=10).contains(&importance) {
        return Err(AppError::Validation(format!(
            "memory importance must be between 1 and 10, got {importance}"
        )));
    }

    let memory = Memory {
        id: Uuid::new_v4().to_string(),
        content: content.to_string(),
        tags: payload.tags.unwrap_or_default(),
        importance,
        source: payload.source,
        created_at: now,
        updated_at: now,
    };
    db.insert_memory(&memory)?;
    tracing::debug!(memory_id = %memory.id, tags = memory.tags.len(), "memory saved");
    Ok(memory)
}
