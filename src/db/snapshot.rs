use super::Collections;
use crate::errors::AppResult;
use crate::models::{Activity, Document, Memory, ScheduledEvent, Task};

/// Collections already materialised in memory.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub activities: Vec<Activity>,
    pub tasks: Vec<Task>,
    pub memories: Vec<Memory>,
    pub documents: Vec<Document>,
    pub events: Vec<ScheduledEvent>,
}

impl Collections for Snapshot {
    fn load_activities(&self) -> AppResult<Vec<Activity>> {
        Ok(self.activities.clone())
    }

    fn load_tasks(&self) -> AppResult<Vec<Task>> {
        Ok(self.tasks.clone())
    }

    fn load_memories(&self) -> AppResult<Vec<Memory>> {
        Ok(self.memories.clone())
    }

    fn load_documents(&self) -> AppResult<Vec<Document>> {
        Ok(self.documents.clone())
    }

    fn load_events(&self) -> AppResult<Vec<ScheduledEvent>> {
        Ok(self.events.clone())
    }
}
