//! Bulk imports from external sources. Each import runs in one transaction, so
//! a rejected record leaves the store untouched.

use crate::activities::validate_usage;
use crate::db::{
    activity_exists_on, find_document_by_path_on, find_task_by_notion_id_on, insert_activity_on, insert_document_on,
    insert_sync_state_on, insert_task_on, update_document_on, update_task_on, Database,
};
use crate::errors::{AppError, AppResult};
use crate::models::{
    Activity, ActivityImportResponse, Document, DocumentImportResponse, ImportActivitiesPayload, ImportDocument,
    ImportDocumentsPayload, NotionImportResponse, NotionTaskPayload, SyncState, Task, TaskStatus, Timestamp,
};
use uuid::Uuid;

/// Upserts workspace documents by path and records the sync point.
pub fn import_documents(db: &Database, payload: &ImportDocumentsPayload, now: Timestamp) -> AppResult<DocumentImportResponse> {
    let response = db.with_transaction(|conn| {
        let mut response = DocumentImportResponse {
            success: true,
            received: payload.documents.len(),
            ..DocumentImportResponse::default()
        };

        for incoming in &payload.documents {
            if incoming.path.trim().is_empty() {
                return Err(AppError::Validation("document path must not be empty".to_string()));
            }
            match find_document_by_path_on(conn, &incoming.path)? {
                Some(existing) if checksum_matches(&existing, incoming) => response.unchanged += 1,
                Some(existing) => {
                    let patched = Document {
                        title: incoming.title.clone(),
                        content: incoming.content.clone(),
                        doc_type: Some(incoming.doc_type.clone()),
                        tags: incoming.tags.clone(),
                        checksum: incoming.checksum.clone(),
                        updated_at: now,
                        ..existing
                    };
                    update_document_on(conn, &patched)?;
                    response.updated += 1;
                }
                None => {
                    let document = Document {
                        id: Uuid::new_v4().to_string(),
                        title: incoming.title.clone(),
                        content: incoming.content.clone(),
                        path: incoming.path.clone(),
                        doc_type: Some(incoming.doc_type.clone()),
                        tags: incoming.tags.clone(),
                        checksum: incoming.checksum.clone(),
                        created_at: now,
                        updated_at: now,
                    };
                    insert_document_on(conn, &document)?;
                    response.inserted += 1;
                }
            }
        }

        insert_sync_state_on(
            conn,
            &SyncState {
                id: Uuid::new_v4().to_string(),
                last_synced_at: now,
                git_commit: payload.commit.clone(),
                version: payload.version.clone(),
            },
        )?;
        Ok(response)
    })?;

    tracing::info!(
        received = response.received,
        inserted = response.inserted,
        updated = response.updated,
        unchanged = response.unchanged,
        commit = %payload.commit,
        "documents imported"
    );
    Ok(response)
}

/// Appends log entries, skipping any whose `(timestamp, type)` is already stored.
pub fn import_activities(db: &Database, payload: &ImportActivitiesPayload) -> AppResult<ActivityImportResponse> {
    let response = db.with_transaction(|conn| {
        let mut response = ActivityImportResponse {
            success: true,
            received: payload.activities.len(),
            ..ActivityImportResponse::default()
        };

        for incoming in &payload.activities {
            validate_usage(incoming.tokens, incoming.cost)?;
            if activity_exists_on(conn, incoming.timestamp, &incoming.activity_type)? {
                response.skipped += 1;
                continue;
            }
            let activity = Activity {
                id: Uuid::new_v4().to_string(),
                activity_type: incoming.activity_type.clone(),
                description: incoming.description.clone(),
                success: incoming.success,
                timestamp: incoming.timestamp,
                tokens: incoming.tokens,
                model: incoming.model.clone(),
                cost: incoming.cost,
                details: incoming.details.clone(),
                session_key: incoming.session_key.clone(),
                metadata: incoming.metadata.clone().unwrap_or_default(),
            };
            insert_activity_on(conn, &activity)?;
            response.inserted += 1;
        }
        Ok(response)
    })?;

    tracing::info!(
        received = response.received,
        inserted = response.inserted,
        skipped = response.skipped,
        "activities imported"
    );
    Ok(response)
}

/// Creates a task from a Notion page, or patches the task already linked to it.
pub fn import_notion_task(db: &Database, payload: &NotionTaskPayload, now: Timestamp) -> AppResult<NotionImportResponse> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("task title must not be empty".to_string()));
    }
    let notion_id = payload.notion_id.as_deref().filter(|value| !value.trim().is_empty());

    let response = db.with_transaction(|conn| {
        let existing = match notion_id {
            Some(notion_id) => find_task_by_notion_id_on(conn, notion_id)?,
            None => None,
        };

        match existing {
            Some(existing) => {
                let completed_at = match (payload.status, existing.completed_at) {
                    (TaskStatus::Done, None) => Some(now),
                    (_, completed_at) => completed_at,
                };
                let patched = Task {
                    title: title.to_string(),
                    description: payload.description.clone(),
                    status: payload.status,
                    priority: payload.priority,
                    due_date: payload.due_date,
                    completed_at,
                    updated_at: now,
                    ..existing
                };
                update_task_on(conn, &patched)?;
                Ok(NotionImportResponse {
                    id: patched.id,
                    created: false,
                })
            }
            None => {
                let task = Task {
                    id: Uuid::new_v4().to_string(),
                    title: title.to_string(),
                    description: payload.description.clone(),
                    status: payload.status,
                    priority: payload.priority,
                    due_date: payload.due_date,
                    scheduled_for: None,
                    tags: Vec::new(),
                    notion_id: notion_id.map(str::to_string),
                    completed_at: (payload.status == TaskStatus::Done).then_some(now),
                    created_at: now,
                    updated_at: now,
                };
                insert_task_on(conn, &task)?;
                Ok(NotionImportResponse {
                    id: task.id,
                    created: true,
                })
            }
        }
    })?;

    tracing::info!(task_id = %response.id, created = response.created, "notion task imported");
    Ok(response)
}

fn checksum_matches(existing: &Document, incoming: &ImportDocument) -> bool {
    matches!(
        (&existing.checksum, &incoming.checksum),
        (Some(stored), Some(received)) if stored == received
    )
}

#[cfg(test)]
mod tests {
    use super::{import_activities, import_documents, import_notion_task};
    use crate::db::{Collections, Database};
    use crate::errors::AppError;
    use crate::models::{
        ImportActivitiesPayload, ImportActivity, ImportDocument, ImportDocumentsPayload, NotionTaskPayload,
        TaskPriority, TaskStatus,
    };

    fn open(dir: &tempfile::TempDir) -> Database {
        Database::new(&dir.path().join("state.sqlite")).expect("db")
    }

    fn document(path: &str, content: &str, checksum: Option<&str>) -> ImportDocument {
        ImportDocument {
            path: path.to_string(),
            title: path.trim_start_matches('/').to_string(),
            content: content.to_string(),
            doc_type: "markdown".to_string(),
            tags: vec!["workspace".to_string()],
            checksum: checksum.map(str::to_string),
        }
    }

    fn logged(activity_type: &str, timestamp: i64) -> ImportActivity {
        ImportActivity {
            activity_type: activity_type.to_string(),
            description: format!("{activity_type} from log"),
            details: None,
            metadata: None,
            timestamp,
            session_key: Some("session-1".to_string()),
            model: None,
            tokens: Some(5),
            cost: None,
            success: true,
        }
    }

    #[test]
    fn documents_upsert_by_path_and_skip_matching_checksums() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = open(&dir);

        let first = ImportDocumentsPayload {
            documents: vec![document("/a.md", "alpha", Some("c1")), document("/b.md", "beta", None)],
            commit: "abc123".to_string(),
            version: "1".to_string(),
        };
        let response = import_documents(&db, &first, 10).expect("first import");
        assert_eq!((response.received, response.inserted, response.updated, response.unchanged), (2, 2, 0, 0));

        let second = ImportDocumentsPayload {
            documents: vec![
                document("/a.md", "alpha", Some("c1")),
                document("/b.md", "beta v2", None),
                document("/c.md", "gamma", Some("c3")),
            ],
            commit: "def456".to_string(),
            version: "2".to_string(),
        };
        let response = import_documents(&db, &second, 20).expect("second import");
        assert_eq!((response.inserted, response.updated, response.unchanged), (1, 1, 1));

        let b = db.find_document_by_path("/b.md").expect("find").expect("exists");
        assert_eq!(b.content, "beta v2");
        assert_eq!((b.created_at, b.updated_at), (10, 20));
        let a = db.find_document_by_path("/a.md").expect("find").expect("exists");
        assert_eq!(a.updated_at, 10);

        let state = db.latest_sync_state().expect("sync state").expect("recorded");
        assert_eq!(state.git_commit, "def456");
        assert_eq!(state.last_synced_at, 20);
    }

    #[test]
    fn rejected_document_rolls_back_the_batch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = open(&dir);
        let payload = ImportDocumentsPayload {
            documents: vec![document("/ok.md", "fine", None), document("  ", "no path", None)],
            commit: "abc".to_string(),
            version: "1".to_string(),
        };

        let result = import_documents(&db, &payload, 5);
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(db.load_documents().expect("documents").is_empty());
        assert!(db.latest_sync_state().expect("sync state").is_none());
    }

    #[test]
    fn activities_dedupe_on_timestamp_and_type() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = open(&dir);
        let payload = ImportActivitiesPayload {
            activities: vec![logged("model_call", 100), logged("model_call", 100), logged("file_read", 100)],
        };

        let response = import_activities(&db, &payload).expect("import");
        assert_eq!((response.received, response.inserted, response.skipped), (3, 2, 1));

        let again = import_activities(&db, &payload).expect("reimport");
        assert_eq!((again.inserted, again.skipped), (0, 3));
        let stored = db.load_activities().expect("activities");
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].session_key.as_deref(), Some("session-1"));
    }

    #[test]
    fn negative_token_counts_reject_the_whole_import() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = open(&dir);
        let mut bad = logged("model_call", 200);
        bad.tokens = Some(-5);
        let payload = ImportActivitiesPayload {
            activities: vec![logged("file_read", 100), bad],
        };

        let result = import_activities(&db, &payload);
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(db.load_activities().expect("activities").is_empty());
    }

    #[test]
    fn notion_tasks_upsert_by_notion_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = open(&dir);
        let payload = NotionTaskPayload {
            title: "Quarterly review".to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::High,
            due_date: Some(500),
            notion_id: Some("notion-1".to_string()),
        };

        let created = import_notion_task(&db, &payload, 10).expect("create");
        assert!(created.created);

        let finished = NotionTaskPayload {
            status: TaskStatus::Done,
            ..payload.clone()
        };
        let updated = import_notion_task(&db, &finished, 20).expect("update");
        assert!(!updated.created);
        assert_eq!(updated.id, created.id);

        let task = db.get_task(&created.id).expect("get").expect("exists");
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.completed_at, Some(20));
        assert_eq!(task.created_at, 10);

        let unlinked = NotionTaskPayload {
            notion_id: None,
            ..payload
        };
        assert!(import_notion_task(&db, &unlinked, 30).expect("create").created);
        assert!(import_notion_task(&db, &unlinked, 31).expect("create").created);
        assert_eq!(db.load_tasks().expect("tasks").len(), 3);
    }
}
