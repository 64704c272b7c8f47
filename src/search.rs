//! Cross-collection relevance search over memories, documents and tasks.
//!
//! Matching is a case-insensitive literal substring test. Each requested kind
//! is filtered and capped at `limit` on its own, the merged candidates are
//! scored, and the combined list is cut back to `limit`.

use crate::db::Collections;
use crate::errors::AppResult;
use crate::models::{Activity, Document, Memory, SearchKind, SearchRequest, SearchResult, Task};
use std::collections::HashSet;

pub const DEFAULT_LIMIT: usize = 20;
pub const HISTORY_ACTIVITY_TYPE: &str = "search";

const EXACT_TITLE_SCORE: i64 = 100;
const TITLE_CONTAINS_SCORE: i64 = 50;
const CONTENT_OCCURRENCE_SCORE: i64 = 10;
const TAG_SCORE: i64 = 30;

pub fn global<C: Collections + ?Sized>(store: &C, request: &SearchRequest) -> AppResult<Vec<SearchResult>> {
    let term = normalize(&request.query);
    let limit = request.limit.unwrap_or(DEFAULT_LIMIT);
    let kinds = requested_kinds(request.types.as_deref());
    if term.is_empty() || limit == 0 || kinds.is_empty() {
        return Ok(Vec::new());
    }

    let mut candidates: Vec<SearchResult> = Vec::new();
    for kind in kinds {
        match kind {
            SearchKind::Memory => candidates.extend(
                store
                    .load_memories()?
                    .into_iter()
                    .filter(|memory| memory_matches(memory, &term))
                    .take(limit)
                    .map(SearchResult::Memory),
            ),
            SearchKind::Document => candidates.extend(
                store
                    .load_documents()?
                    .into_iter()
                    .filter(|document| document_matches(document, &term))
                    .take(limit)
                    .map(SearchResult::Document),
            ),
            SearchKind::Task => candidates.extend(
                store
                    .load_tasks()?
                    .into_iter()
                    .filter(|task| task_matches(task, &term))
                    .take(limit)
                    .map(SearchResult::Task),
            ),
        }
    }

    let mut scored: Vec<(i64, SearchResult)> = candidates
        .into_iter()
        .map(|result| (score(&result, &term), result))
        .collect();
    scored.sort_by(|(a_score, a), (b_score, b)| {
        b_score
            .cmp(a_score)
            .then_with(|| b.updated_at().cmp(&a.updated_at()))
    });

    tracing::debug!(candidates = scored.len(), limit, "search candidates scored");
    Ok(scored.into_iter().take(limit).map(|(_, result)| result).collect())
}

/// Relevance of `result` for a raw query, normalised the same way `global` does.
pub fn relevance_score(result: &SearchResult, query: &str) -> i64 {
    score(result, &normalize(query))
}

/// Tags from the first `scan` memories and tasks that start with `prefix`.
pub fn suggestions<C: Collections + ?Sized>(
    store: &C,
    prefix: &str,
    limit: usize,
    scan: usize,
) -> AppResult<Vec<String>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let prefix = prefix.to_lowercase();
    let memories = store.load_memories()?;
    let tasks = store.load_tasks()?;

    let tags = memories
        .iter()
        .take(scan)
        .flat_map(|memory| memory.tags.iter())
        .chain(tasks.iter().take(scan).flat_map(|task| task.tags.iter()));

    let mut seen: HashSet<&str> = HashSet::new();
    let mut matching = Vec::new();
    for tag in tags {
        if !seen.insert(tag.as_str()) {
            continue;
        }
        if tag.to_lowercase().starts_with(&prefix) {
            matching.push(tag.clone());
            if matching.len() == limit {
                break;
            }
        }
    }
    Ok(matching)
}

/// Most recent searches, newest first.
pub fn history<C: Collections + ?Sized>(store: &C, limit: usize) -> AppResult<Vec<Activity>> {
    store.load_activities_of_type(HISTORY_ACTIVITY_TYPE, limit)
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

fn requested_kinds(types: Option<&[String]>) -> Vec<SearchKind> {
    match types {
        None => SearchKind::ALL.to_vec(),
        Some(names) => {
            let wanted: HashSet<SearchKind> = names
                .iter()
                .filter_map(|name| SearchKind::from_name(name))
                .collect();
            SearchKind::ALL
                .into_iter()
                .filter(|kind| wanted.contains(kind))
                .collect()
        }
    }
}

fn memory_matches(memory: &Memory, term: &str) -> bool {
    contains(&memory.content, term) || any_tag_contains(&memory.tags, term)
}

fn document_matches(document: &Document, term: &str) -> bool {
    contains(&document.title, term)
        || contains(&document.content, term)
        || contains(&document.path, term)
        || any_tag_contains(&document.tags, term)
}

fn task_matches(task: &Task, term: &str) -> bool {
    contains(&task.title, term)
        || task
            .description
            .as_deref()
            .is_some_and(|description| contains(description, term))
        || any_tag_contains(&task.tags, term)
}

fn contains(text: &str, term: &str) -> bool {
    text.to_lowercase().contains(term)
}

fn any_tag_contains(tags: &[String], term: &str) -> bool {
    tags.iter().any(|tag| contains(tag, term))
}

// Memories have no title, so their content stands in for it. The counted body
// falls back to the title when a record carries no content of its own.
fn scoring_fields(result: &SearchResult) -> (&str, &str, &[String]) {
    match result {
        SearchResult::Memory(memory) => (memory.content.as_str(), memory.content.as_str(), memory.tags.as_slice()),
        SearchResult::Document(document) => {
            let body = if document.content.is_empty() {
                document.title.as_str()
            } else {
                document.content.as_str()
            };
            (document.title.as_str(), body, document.tags.as_slice())
        }
        SearchResult::Task(task) => (task.title.as_str(), task.title.as_str(), task.tags.as_slice()),
    }
}

fn score(result: &SearchResult, term: &str) -> i64 {
    if term.is_empty() {
        return 0;
    }
    let (title, body, tags) = scoring_fields(result);
    let mut total = 0;

    let title = title.to_lowercase();
    if title == term {
        total += EXACT_TITLE_SCORE;
    } else if title.contains(term) {
        total += TITLE_CONTAINS_SCORE;
    }

    let occurrences = body.to_lowercase().matches(term).count();
    total += CONTENT_OCCURRENCE_SCORE * i64::try_from(occurrences).unwrap_or(i64::MAX / CONTENT_OCCURRENCE_SCORE);

    if any_tag_contains(tags, term) {
        total += TAG_SCORE;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::{global, history, relevance_score, suggestions};
    use crate::db::{Collections, Snapshot};
    use crate::errors::{AppError, AppResult};
    use crate::models::{
        Activity, Document, Memory, ScheduledEvent, SearchKind, SearchRequest, SearchResult, Task, TaskPriority,
        TaskStatus,
    };

    fn memory(id: &str, content: &str, tags: &[&str], updated_at: i64) -> Memory {
        Memory {
            id: id.to_string(),
            content: content.to_string(),
            tags: tags.iter().map(ToString::to_string).collect(),
            importance: 5,
            source: None,
            created_at: updated_at,
            updated_at,
        }
    }

    fn document(id: &str, title: &str, content: &str, path: &str, updated_at: i64) -> Document {
        Document {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            path: path.to_string(),
            doc_type: None,
            tags: Vec::new(),
            checksum: None,
            created_at: updated_at,
            updated_at,
        }
    }

    fn task(id: &str, title: &str, description: Option<&str>, updated_at: i64) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            description: description.map(ToString::to_string),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            scheduled_for: None,
            tags: Vec::new(),
            notion_id: None,
            completed_at: None,
            created_at: updated_at,
            updated_at,
        }
    }

    fn request(query: &str) -> SearchRequest {
        SearchRequest {
            query: query.to_string(),
            ..SearchRequest::default()
        }
    }

    fn ids(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(SearchResult::id).collect()
    }

    struct OfflineStore;

    impl Collections for OfflineStore {
        fn load_activities(&self) -> AppResult<Vec<Activity>> {
            Err(AppError::Unavailable("activities: offline".to_string()))
        }
        fn load_tasks(&self) -> AppResult<Vec<Task>> {
            Err(AppError::Unavailable("tasks: offline".to_string()))
        }
        fn load_memories(&self) -> AppResult<Vec<Memory>> {
            Err(AppError::Unavailable("memories: offline".to_string()))
        }
        fn load_documents(&self) -> AppResult<Vec<Document>> {
            Err(AppError::Unavailable("documents: offline".to_string()))
        }
        fn load_events(&self) -> AppResult<Vec<ScheduledEvent>> {
            Err(AppError::Unavailable("scheduledEvents: offline".to_string()))
        }
    }

    #[test]
    fn unmatched_query_returns_nothing() {
        let snapshot = Snapshot {
            memories: vec![memory("m-1", "groceries list", &["home"], 1)],
            documents: vec![document("d-1", "Runbook", "restart the api", "/ops/runbook.md", 1)],
            tasks: vec![task("t-1", "Pay invoices", Some("before friday"), 1)],
            ..Snapshot::default()
        };
        let results = global(&snapshot, &request("kubernetes")).expect("search");
        assert!(results.is_empty());
    }

    #[test]
    fn document_title_match_is_tagged_as_document() {
        let mut alpha = document("d-1", "Alpha Notes", "...", "/a", 1);
        alpha.tags = vec!["x".to_string()];
        let snapshot = Snapshot {
            documents: vec![alpha],
            ..Snapshot::default()
        };

        let results = global(&snapshot, &request("alpha")).expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind(), SearchKind::Document);
        let json = serde_json::to_value(&results[0]).expect("serialize");
        assert_eq!(json["resultType"], "document");
        assert_eq!(json["path"], "/a");
    }

    #[test]
    fn exact_title_outranks_partial_title() {
        let snapshot = Snapshot {
            documents: vec![
                document("partial", "alpha-beta", "notes", "/p", 10),
                document("exact", "Alpha", "notes", "/e", 1),
            ],
            ..Snapshot::default()
        };
        let results = global(&snapshot, &request("alpha")).expect("search");
        assert_eq!(ids(&results), vec!["exact", "partial"]);
    }

    #[test]
    fn results_never_exceed_limit_and_per_kind_cap_applies_first() {
        let mut tasks: Vec<Task> = (0..5)
            .map(|index| task(&format!("weak-{index}"), "deploy notes", None, index))
            .collect();
        tasks.push(task("exact", "deploy", None, 0));
        let snapshot = Snapshot {
            memories: (0..5)
                .map(|index| memory(&format!("m-{index}"), "how we deploy", &[], index))
                .collect(),
            tasks,
            ..Snapshot::default()
        };

        let results = global(
            &snapshot,
            &SearchRequest {
                query: "deploy".to_string(),
                limit: Some(3),
                types: None,
            },
        )
        .expect("search");
        assert_eq!(results.len(), 3);
        assert!(!ids(&results).contains(&"exact"));
    }

    #[test]
    fn ties_fall_back_to_most_recent_update() {
        let snapshot = Snapshot {
            memories: vec![
                memory("old", "meeting with sam", &[], 100),
                memory("new", "meeting with max", &[], 300),
            ],
            tasks: vec![task("mid", "prep meeting with kim", None, 200)],
            ..Snapshot::default()
        };
        let results = global(&snapshot, &request("meeting")).expect("search");
        assert_eq!(ids(&results), vec!["new", "mid", "old"]);
    }

    #[test]
    fn repeated_searches_are_identical() {
        let snapshot = Snapshot {
            memories: vec![memory("m-1", "rust ownership", &["rust"], 5)],
            documents: vec![document("d-1", "Rust book", "rust rust", "/rust.md", 5)],
            tasks: vec![task("t-1", "learn rust", None, 5)],
            ..Snapshot::default()
        };
        let first = global(&snapshot, &request("rust")).expect("first");
        let second = global(&snapshot, &request("rust")).expect("second");
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn scoring_counts_literal_occurrences_and_tags() {
        let notes = SearchResult::Memory(memory("m-1", "C++ and c++ again", &["Lang-C++"], 1));
        // title contains (50) + two occurrences (20) + tag (30)
        assert_eq!(relevance_score(&notes, "c++"), 100);

        let tagged_only = SearchResult::Memory(memory("m-2", "nothing here", &["Rust-lang"], 1));
        assert_eq!(relevance_score(&tagged_only, "RUST"), 30);

        let exact_doc = SearchResult::Document(document("d-1", "Budget", "", "/b", 1));
        // empty content falls back to the title for occurrences
        assert_eq!(relevance_score(&exact_doc, "budget"), 110);

        let dotted = SearchResult::Document(document("d-2", "notes", "a.b axb a.b", "/n", 1));
        assert_eq!(relevance_score(&dotted, "a.b"), 20);
    }

    #[test]
    fn unknown_types_are_ignored() {
        let snapshot = Snapshot {
            memories: vec![memory("m-1", "travel plans", &[], 1)],
            tasks: vec![task("t-1", "book travel", None, 1)],
            ..Snapshot::default()
        };
        let results = global(
            &snapshot,
            &SearchRequest {
                query: "travel".to_string(),
                limit: None,
                types: Some(vec!["task".to_string(), "bogus".to_string()]),
            },
        )
        .expect("search");
        assert_eq!(ids(&results), vec!["t-1"]);
    }

    #[test]
    fn degenerate_requests_never_touch_the_store() {
        let blank = global(&OfflineStore, &request("   ")).expect("blank query");
        assert!(blank.is_empty());

        let no_kinds = global(
            &OfflineStore,
            &SearchRequest {
                query: "anything".to_string(),
                limit: None,
                types: Some(vec!["bogus".to_string()]),
            },
        )
        .expect("no kinds");
        assert!(no_kinds.is_empty());

        let zero = global(
            &OfflineStore,
            &SearchRequest {
                query: "anything".to_string(),
                limit: Some(0),
                types: None,
            },
        )
        .expect("zero limit");
        assert!(zero.is_empty());
    }

    #[test]
    fn unavailable_collections_fail_the_whole_search() {
        let result = global(&OfflineStore, &request("anything"));
        assert!(matches!(result, Err(AppError::Unavailable(_))));
    }

    #[test]
    fn task_descriptions_match_but_do_not_score() {
        let snapshot = Snapshot {
            tasks: vec![task("t-1", "Quarterly review", Some("collect invoices"), 1)],
            ..Snapshot::default()
        };
        let results = global(&snapshot, &request("invoices")).expect("search");
        assert_eq!(ids(&results), vec!["t-1"]);
        assert_eq!(relevance_score(&results[0], "invoices"), 0);
    }

    #[test]
    fn suggestions_are_unique_prefix_matches() {
        let mut tagged = task("t-1", "plan", None, 1);
        tagged.tags = vec!["Project-X".to_string(), "personal".to_string()];
        let snapshot = Snapshot {
            memories: vec![
                memory("m-1", "a", &["project-y", "work"], 1),
                memory("m-2", "b", &["project-y", "PROJECT-Z"], 1),
            ],
            tasks: vec![tagged],
            ..Snapshot::default()
        };

        let found = suggestions(&snapshot, "proj", 5, 100).expect("suggestions");
        assert_eq!(found, vec!["project-y", "PROJECT-Z", "Project-X"]);

        let capped = suggestions(&snapshot, "P", 2, 100).expect("suggestions");
        assert_eq!(capped, vec!["project-y", "PROJECT-Z"]);

        let scanned = suggestions(&snapshot, "proj", 5, 1).expect("suggestions");
        assert_eq!(scanned, vec!["project-y", "Project-X"]);
    }

    #[test]
    fn history_lists_recent_searches_first() {
        let search = |id: &str, timestamp: i64, activity_type: &str| Activity {
            id: id.to_string(),
            activity_type: activity_type.to_string(),
            description: format!("Searched: {id}"),
            success: true,
            timestamp,
            tokens: None,
            model: None,
            cost: None,
            details: None,
            session_key: None,
            metadata: serde_json::Map::new(),
        };
        let snapshot = Snapshot {
            activities: vec![
                search("first", 1, "search"),
                search("fetch", 2, "web_fetch"),
                search("second", 3, "search"),
            ],
            ..Snapshot::default()
        };
        let recent = history(&snapshot, 10).expect("history");
        let recent_ids: Vec<&str> = recent.iter().map(|activity| activity.id.as_str()).collect();
        assert_eq!(recent_ids, vec!["second", "first"]);
    }
}
