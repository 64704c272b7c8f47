mod snapshot;

pub use snapshot::Snapshot;

use crate::errors::{AppError, AppResult};
use crate::models::{
    Activity, Document, Memory, Metadata, ScheduledEvent, SyncState, Task, TaskStatus, Timestamp, WeekRange,
};
use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

const SCHEMA_SQL: &str = include_str!("schema.sql");

const ACTIVITY_COLUMNS: &str =
    "id, activity_type, description, success, timestamp, tokens, model, cost, details, session_key, metadata_json";
const TASK_COLUMNS: &str = "id, title, description, status, priority, due_date, scheduled_for, tags_json, notion_id, completed_at, created_at, updated_at";
const MEMORY_COLUMNS: &str = "id, content, tags_json, importance, source, created_at, updated_at";
const DOCUMENT_COLUMNS: &str = "id, title, content, path, doc_type, tags_json, checksum, created_at, updated_at";
const EVENT_COLUMNS: &str = "id, title, description, start_time, end_time, event_type, tags_json";

/// Read access to the record collections.
///
/// Every read returns records in insertion order unless stated otherwise. The
/// filtered reads have in-core default implementations; a store with indexes
/// may override them but must return exactly what the default would.
pub trait Collections {
    fn load_activities(&self) -> AppResult<Vec<Activity>>;
    fn load_tasks(&self) -> AppResult<Vec<Task>>;
    fn load_memories(&self) -> AppResult<Vec<Memory>>;
    fn load_documents(&self) -> AppResult<Vec<Document>>;
    fn load_events(&self) -> AppResult<Vec<ScheduledEvent>>;

    fn load_tasks_in_range(&self, range: WeekRange) -> AppResult<Vec<Task>> {
        Ok(self
            .load_tasks()?
            .into_iter()
            .filter(|task| task.falls_within(&range))
            .collect())
    }

    fn load_events_in_range(&self, range: WeekRange) -> AppResult<Vec<ScheduledEvent>> {
        Ok(self
            .load_events()?
            .into_iter()
            .filter(|event| range.contains(event.start_time))
            .collect())
    }

    /// Newest first; equal timestamps keep the later insertion first.
    fn load_recent_activities(&self, limit: usize) -> AppResult<Vec<Activity>> {
        let mut activities = self.load_activities()?;
        activities.reverse();
        activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        activities.truncate(limit);
        Ok(activities)
    }

    fn load_activities_of_type(&self, activity_type: &str, limit: usize) -> AppResult<Vec<Activity>> {
        let mut activities: Vec<Activity> = self
            .load_activities()?
            .into_iter()
            .filter(|activity| activity.activity_type == activity_type)
            .collect();
        activities.reverse();
        activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        activities.truncate(limit);
        Ok(activities)
    }
}

#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;
        tracing::debug!(path = %path.display(), "database opened");

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("database mutex poisoned".to_string()))
    }

    /// Runs `f` inside one SQLite transaction; commits on `Ok`, rolls back on `Err`.
    pub fn with_transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    fn read_collection<T, P: Params>(
        &self,
        collection: &str,
        sql: &str,
        params: P,
        parse: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> AppResult<Vec<T>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| unavailable(collection, "database mutex poisoned"))?;
        let mut statement = conn.prepare(sql).map_err(|error| unavailable(collection, error))?;
        let rows = statement
            .query_map(params, parse)
            .map_err(|error| unavailable(collection, error))?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|error| unavailable(collection, error))?);
        }
        Ok(result)
    }

    pub fn insert_activity(&self, activity: &Activity) -> AppResult<()> {
        let conn = self.conn()?;
        insert_activity_on(&conn, activity)
    }

    pub fn activity_exists(&self, timestamp: Timestamp, activity_type: &str) -> AppResult<bool> {
        let conn = self.conn()?;
        activity_exists_on(&conn, timestamp, activity_type)
    }

    pub fn insert_task(&self, task: &Task) -> AppResult<()> {
        let conn = self.conn()?;
        insert_task_on(&conn, task)
    }

    pub fn get_task(&self, task_id: &str) -> AppResult<Option<Task>> {
        let conn = self.conn()?;
        get_task_on(&conn, task_id)
    }

    pub fn update_task_status(&self, task_id: &str, status: TaskStatus, now: Timestamp) -> AppResult<Task> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE tasks
             SET status = ?1,
                 updated_at = ?2,
                 completed_at = CASE WHEN ?3 AND status <> 'done' THEN ?2 ELSE completed_at END
             WHERE id = ?4",
            params![status.as_str(), now, status == TaskStatus::Done, task_id],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("task {task_id}")));
        }
        get_task_on(&conn, task_id)?.ok_or_else(|| AppError::NotFound(format!("task {task_id}")))
    }

    pub fn insert_memory(&self, memory: &Memory) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO memories (id, content, tags_json, importance, source, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                memory.id,
                memory.content,
                serde_json::to_string(&memory.tags)?,
                memory.importance,
                memory.source,
                memory.created_at,
                memory.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_document_by_path(&self, path: &str) -> AppResult<Option<Document>> {
        let conn = self.conn()?;
        find_document_by_path_on(&conn, path)
    }

    pub fn insert_event(&self, event: &ScheduledEvent) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO scheduled_events (id, title, description, start_time, end_time, event_type, tags_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.id,
                event.title,
                event.description,
                event.start_time,
                event.end_time,
                event.event_type,
                serde_json::to_string(&event.tags)?,
            ],
        )?;
        Ok(())
    }

    pub fn latest_sync_state(&self) -> AppResult<Option<SyncState>> {
        let conn = self.conn()?;
        let state = conn
            .query_row(
                "SELECT id, last_synced_at, git_commit, version FROM sync_state
                 ORDER BY last_synced_at DESC, rowid DESC LIMIT 1",
                [],
                |row| {
                    Ok(SyncState {
                        id: row.get(0)?,
                        last_synced_at: row.get(1)?,
                        git_commit: row.get(2)?,
                        version: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(state)
    }
}

impl Collections for Database {
    fn load_activities(&self) -> AppResult<Vec<Activity>> {
        self.read_collection(
            "activities",
            &format!("SELECT {ACTIVITY_COLUMNS} FROM activities ORDER BY rowid"),
            [],
            parse_activity_row,
        )
    }

    fn load_tasks(&self) -> AppResult<Vec<Task>> {
        self.read_collection(
            "tasks",
            &format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY rowid"),
            [],
            parse_task_row,
        )
    }

    fn load_memories(&self) -> AppResult<Vec<Memory>> {
        self.read_collection(
            "memories",
            &format!("SELECT {MEMORY_COLUMNS} FROM memories ORDER BY rowid"),
            [],
            parse_memory_row,
        )
    }

    fn load_documents(&self) -> AppResult<Vec<Document>> {
        self.read_collection(
            "documents",
            &format!("SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY rowid"),
            [],
            parse_document_row,
        )
    }

    fn load_events(&self) -> AppResult<Vec<ScheduledEvent>> {
        self.read_collection(
            "scheduledEvents",
            &format!("SELECT {EVENT_COLUMNS} FROM scheduled_events ORDER BY rowid"),
            [],
            parse_event_row,
        )
    }

    fn load_tasks_in_range(&self, range: WeekRange) -> AppResult<Vec<Task>> {
        self.read_collection(
            "tasks",
            &format!(
                "SELECT {TASK_COLUMNS} FROM tasks
                 WHERE (scheduled_for BETWEEN ?1 AND ?2) OR (due_date BETWEEN ?1 AND ?2)
                 ORDER BY rowid"
            ),
            params![range.week_start, range.week_end],
            parse_task_row,
        )
    }

    fn load_events_in_range(&self, range: WeekRange) -> AppResult<Vec<ScheduledEvent>> {
        self.read_collection(
            "scheduledEvents",
            &format!(
                "SELECT {EVENT_COLUMNS} FROM scheduled_events
                 WHERE start_time BETWEEN ?1 AND ?2
                 ORDER BY rowid"
            ),
            params![range.week_start, range.week_end],
            parse_event_row,
        )
    }

    fn load_recent_activities(&self, limit: usize) -> AppResult<Vec<Activity>> {
        self.read_collection(
            "activities",
            &format!("SELECT {ACTIVITY_COLUMNS} FROM activities ORDER BY timestamp DESC, rowid DESC LIMIT ?1"),
            params![sql_limit(limit)],
            parse_activity_row,
        )
    }

    fn load_activities_of_type(&self, activity_type: &str, limit: usize) -> AppResult<Vec<Activity>> {
        self.read_collection(
            "activities",
            &format!(
                "SELECT {ACTIVITY_COLUMNS} FROM activities
                 WHERE activity_type = ?1
                 ORDER BY timestamp DESC, rowid DESC LIMIT ?2"
            ),
            params![activity_type, sql_limit(limit)],
            parse_activity_row,
        )
    }
}

pub(crate) fn insert_activity_on(conn: &Connection, activity: &Activity) -> AppResult<()> {
    conn.execute(
        "INSERT INTO activities (
           id, activity_type, description, success, timestamp, tokens, model, cost, details, session_key, metadata_json
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            activity.id,
            activity.activity_type,
            activity.description,
            activity.success,
            activity.timestamp,
            activity.tokens,
            activity.model,
            activity.cost,
            activity.details,
            activity.session_key,
            serde_json::to_string(&activity.metadata)?,
        ],
    )?;
    Ok(())
}

pub(crate) fn activity_exists_on(conn: &Connection, timestamp: Timestamp, activity_type: &str) -> AppResult<bool> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM activities WHERE timestamp = ?1 AND activity_type = ?2",
        params![timestamp, activity_type],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub(crate) fn insert_task_on(conn: &Connection, task: &Task) -> AppResult<()> {
    conn.execute(
        "INSERT INTO tasks (
           id, title, description, status, priority, due_date, scheduled_for, tags_json, notion_id,
           completed_at, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            task.id,
            task.title,
            task.description,
            task.status.as_str(),
            task.priority.as_str(),
            task.due_date,
            task.scheduled_for,
            serde_json::to_string(&task.tags)?,
            task.notion_id,
            task.completed_at,
            task.created_at,
            task.updated_at,
        ],
    )?;
    Ok(())
}

pub(crate) fn update_task_on(conn: &Connection, task: &Task) -> AppResult<()> {
    let changed = conn.execute(
        "UPDATE tasks SET
           title = ?1, description = ?2, status = ?3, priority = ?4, due_date = ?5, scheduled_for = ?6,
           tags_json = ?7, notion_id = ?8, completed_at = ?9, updated_at = ?10
         WHERE id = ?11",
        params![
            task.title,
            task.description,
            task.status.as_str(),
            task.priority.as_str(),
            task.due_date,
            task.scheduled_for,
            serde_json::to_string(&task.tags)?,
            task.notion_id,
            task.completed_at,
            task.updated_at,
            task.id,
        ],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound(format!("task {}", task.id)));
    }
    Ok(())
}

pub(crate) fn get_task_on(conn: &Connection, task_id: &str) -> AppResult<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            [task_id],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

pub(crate) fn find_task_by_notion_id_on(conn: &Connection, notion_id: &str) -> AppResult<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE notion_id = ?1 ORDER BY rowid LIMIT 1"),
            [notion_id],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

pub(crate) fn find_document_by_path_on(conn: &Connection, path: &str) -> AppResult<Option<Document>> {
    let document = conn
        .query_row(
            &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE path = ?1"),
            [path],
            parse_document_row,
        )
        .optional()?;
    Ok(document)
}

pub(crate) fn insert_document_on(conn: &Connection, document: &Document) -> AppResult<()> {
    conn.execute(
        "INSERT INTO documents (id, title, content, path, doc_type, tags_json, checksum, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            document.id,
            document.title,
            document.content,
            document.path,
            document.doc_type,
            serde_json::to_string(&document.tags)?,
            document.checksum,
            document.created_at,
            document.updated_at,
        ],
    )?;
    Ok(())
}

pub(crate) fn update_document_on(conn: &Connection, document: &Document) -> AppResult<()> {
    conn.execute(
        "UPDATE documents SET
           title = ?1, content = ?2, doc_type = ?3, tags_json = ?4, checksum = ?5, updated_at = ?6
         WHERE id = ?7",
        params![
            document.title,
            document.content,
            document.doc_type,
            serde_json::to_string(&document.tags)?,
            document.checksum,
            document.updated_at,
            document.id,
        ],
    )?;
    Ok(())
}

pub(crate) fn insert_sync_state_on(conn: &Connection, state: &SyncState) -> AppResult<()> {
    conn.execute(
        "INSERT INTO sync_state (id, last_synced_at, git_commit, version) VALUES (?1, ?2, ?3, ?4)",
        params![state.id, state.last_synced_at, state.git_commit, state.version],
    )?;
    Ok(())
}

fn parse_activity_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    let metadata_json: String = row.get(10)?;
    Ok(Activity {
        id: row.get(0)?,
        activity_type: row.get(1)?,
        description: row.get(2)?,
        success: row.get(3)?,
        timestamp: row.get(4)?,
        tokens: row.get(5)?,
        model: row.get(6)?,
        cost: row.get(7)?,
        details: row.get(8)?,
        session_key: row.get(9)?,
        metadata: serde_json::from_str::<Metadata>(&metadata_json).unwrap_or_default(),
    })
}

fn parse_task_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status: String = row.get(3)?;
    let priority: String = row.get(4)?;
    let tags_json: String = row.get(7)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: parse_enum(3, &status)?,
        priority: parse_enum(4, &priority)?,
        due_date: row.get(5)?,
        scheduled_for: row.get(6)?,
        tags: parse_tags(&tags_json),
        notion_id: row.get(8)?,
        completed_at: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn parse_memory_row(row: &Row<'_>) -> rusqlite::Result<Memory> {
    let tags_json: String = row.get(2)?;
    Ok(Memory {
        id: row.get(0)?,
        content: row.get(1)?,
        tags: parse_tags(&tags_json),
        importance: row.get(3)?,
        source: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn parse_document_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    let tags_json: String = row.get(5)?;
    Ok(Document {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        path: row.get(3)?,
        doc_type: row.get(4)?,
        tags: parse_tags(&tags_json),
        checksum: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn parse_event_row(row: &Row<'_>) -> rusqlite::Result<ScheduledEvent> {
    let tags_json: String = row.get(6)?;
    Ok(ScheduledEvent {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        event_type: row.get(5)?,
        tags: parse_tags(&tags_json),
    })
}

fn parse_tags(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn parse_enum<T: FromStr>(index: usize, raw: &str) -> rusqlite::Result<T>
where
    T::Err: Display,
{
    T::from_str(raw).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, error.to_string())),
        )
    })
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn unavailable(collection: &str, error: impl Display) -> AppError {
    AppError::Unavailable(format!("{collection}: {error}"))
}

#[cfg(test)]
mod tests {
    use super::{Collections, Database};
    use crate::errors::AppError;
    use crate::models::{Activity, Document, ScheduledEvent, Task, TaskPriority, TaskStatus, WeekRange};

    fn open(dir: &tempfile::TempDir) -> Database {
        Database::new(&dir.path().join("test.sqlite")).expect("db")
    }

    fn activity(id: &str, activity_type: &str, timestamp: i64) -> Activity {
        Activity {
            id: id.to_string(),
            activity_type: activity_type.to_string(),
            description: format!("{activity_type} at {timestamp}"),
            success: true,
            timestamp,
            tokens: Some(10),
            model: None,
            cost: None,
            details: None,
            session_key: None,
            metadata: serde_json::Map::new(),
        }
    }

    fn task(id: &str, scheduled_for: Option<i64>, due_date: Option<i64>) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {id}"),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date,
            scheduled_for,
            tags: vec!["ops".to_string()],
            notion_id: None,
            completed_at: None,
            created_at: 1,
            updated_at: 1,
        }
    }

    #[test]
    fn activities_round_trip_with_metadata() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = open(&dir);

        let mut logged = activity("a-1", "model_call", 1_000);
        logged.cost = Some(0.25);
        logged.metadata.insert("channel".to_string(), serde_json::json!("cli"));
        db.insert_activity(&logged).expect("insert activity");

        let loaded = db.load_activities().expect("load activities");
        assert_eq!(loaded, vec![logged]);
        assert!(db.activity_exists(1_000, "model_call").expect("exists"));
        assert!(!db.activity_exists(1_000, "web_search").expect("exists"));
    }

    #[test]
    fn indexed_reads_match_in_core_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = open(&dir);

        for (id, activity_type, timestamp) in [("a", "search", 5), ("b", "web_fetch", 9), ("c", "search", 9), ("d", "search", 1)] {
            db.insert_activity(&activity(id, activity_type, timestamp)).expect("insert activity");
        }
        db.insert_task(&task("t-1", Some(150), None)).expect("insert task");
        db.insert_task(&task("t-2", None, Some(50))).expect("insert task");
        db.insert_task(&task("t-3", Some(120), Some(180))).expect("insert task");
        db.insert_task(&task("t-4", None, None)).expect("insert task");
        db.insert_event(&ScheduledEvent {
            id: "e-1".to_string(),
            title: "standup".to_string(),
            description: None,
            start_time: 110,
            end_time: None,
            event_type: "meeting".to_string(),
            tags: Vec::new(),
        })
        .expect("insert event");

        let snapshot = super::Snapshot {
            activities: db.load_activities().expect("activities"),
            tasks: db.load_tasks().expect("tasks"),
            events: db.load_events().expect("events"),
            ..super::Snapshot::default()
        };
        let range = WeekRange { week_start: 100, week_end: 200 };

        assert_eq!(
            db.load_recent_activities(3).expect("recent"),
            snapshot.load_recent_activities(3).expect("recent")
        );
        assert_eq!(
            db.load_activities_of_type("search", 10).expect("typed"),
            snapshot.load_activities_of_type("search", 10).expect("typed")
        );
        let in_range = db.load_tasks_in_range(range).expect("tasks in range");
        assert_eq!(in_range, snapshot.load_tasks_in_range(range).expect("tasks in range"));
        assert_eq!(in_range.iter().map(|task| task.id.as_str()).collect::<Vec<_>>(), vec!["t-1", "t-3"]);
        assert_eq!(
            db.load_events_in_range(range).expect("events"),
            snapshot.load_events_in_range(range).expect("events")
        );

        let recent_ids: Vec<String> = db
            .load_recent_activities(3)
            .expect("recent")
            .into_iter()
            .map(|activity| activity.id)
            .collect();
        assert_eq!(recent_ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn status_update_stamps_completion_and_reports_missing_tasks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = open(&dir);
        db.insert_task(&task("t-1", None, None)).expect("insert task");

        let started = db
            .update_task_status("t-1", TaskStatus::InProgress, 10)
            .expect("start task");
        assert_eq!(started.status, TaskStatus::InProgress);
        assert_eq!(started.updated_at, 10);
        assert!(started.completed_at.is_none());

        let done = db.update_task_status("t-1", TaskStatus::Done, 20).expect("finish task");
        assert_eq!(done.completed_at, Some(20));

        let again = db.update_task_status("t-1", TaskStatus::Done, 99).expect("finish again");
        assert_eq!(again.completed_at, Some(20));
        assert_eq!(again.updated_at, 99);

        let missing = db.update_task_status("nope", TaskStatus::Done, 30);
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[test]
    fn document_paths_are_unique() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = open(&dir);
        let document = Document {
            id: "d-1".to_string(),
            title: "Alpha".to_string(),
            content: "body".to_string(),
            path: "/notes/alpha.md".to_string(),
            doc_type: Some("markdown".to_string()),
            tags: Vec::new(),
            checksum: None,
            created_at: 1,
            updated_at: 1,
        };
        db.with_transaction(|conn| super::insert_document_on(conn, &document))
            .expect("insert document");

        let duplicate = Document {
            id: "d-2".to_string(),
            ..document.clone()
        };
        let result = db.with_transaction(|conn| super::insert_document_on(conn, &duplicate));
        assert!(result.is_err());

        let found = db
            .find_document_by_path("/notes/alpha.md")
            .expect("find document")
            .expect("document exists");
        assert_eq!(found.id, "d-1");
        assert_eq!(db.load_documents().expect("documents").len(), 1);
    }
}
