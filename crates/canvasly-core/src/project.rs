//! Projects: named canvases saved outside the live store.

use crate::state::CanvasState;
use crate::storage::{KeyValueStore, StorageResult};
use crate::store::CanvasStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Key the project list is stored under.
pub const PROJECTS_KEY: &str = "projects";

/// Milliseconds since the UNIX epoch.
fn timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Publication status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// A saved design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    /// Canvas snapshot embedded in the project.
    #[serde(default)]
    pub canvas_data: CanvasState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Artboard width.
    pub width: f64,
    /// Artboard height.
    pub height: f64,
    #[serde(default)]
    pub status: ProjectStatus,
    /// Creation time, milliseconds since the UNIX epoch.
    pub created_at: u64,
    /// Last modification time, milliseconds since the UNIX epoch.
    pub updated_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Project {
    /// Create an empty draft.
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        let now = timestamp_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            template_id: None,
            canvas_data: CanvasState::new(),
            thumbnail_url: None,
            width,
            height,
            status: ProjectStatus::Draft,
            created_at: now,
            updated_at: now,
            user_id: None,
        }
    }

    /// Embed the store's current snapshot.
    pub fn capture<S: KeyValueStore>(&mut self, store: &CanvasStore<S>) {
        self.canvas_data = store.canvas_state().clone();
        self.touch();
    }

    /// Push the embedded snapshot into the store.
    pub fn open_in<S: KeyValueStore>(&self, store: &mut CanvasStore<S>) {
        log::debug!("Opening project '{}' ({})", self.name, self.id);
        store.set_canvas_state(self.canvas_data.clone());
    }

    pub fn set_status(&mut self, status: ProjectStatus) {
        self.status = status;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = timestamp_millis().max(self.updated_at);
    }
}

/// The saved project list, stored as one JSON array.
pub struct ProjectLibrary<S: KeyValueStore> {
    storage: Arc<S>,
}

impl<S: KeyValueStore> ProjectLibrary<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// All saved projects, in insertion order.
    pub fn list(&self) -> StorageResult<Vec<Project>> {
        match self.storage.get(PROJECTS_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Get a project by id.
    pub fn get(&self, id: &str) -> StorageResult<Option<Project>> {
        Ok(self.list()?.into_iter().find(|project| project.id == id))
    }

    /// Insert a project, or replace the saved one with the same id.
    pub fn save(&self, project: &Project) -> StorageResult<()> {
        let mut projects = self.list()?;
        match projects.iter_mut().find(|saved| saved.id == project.id) {
            Some(saved) => *saved = project.clone(),
            None => projects.push(project.clone()),
        }
        self.write(&projects)?;
        log::info!("Saved project '{}' ({})", project.name, project.id);
        Ok(())
    }

    /// Delete a project. Returns false if no project had that id.
    pub fn delete(&self, id: &str) -> StorageResult<bool> {
        let mut projects = self.list()?;
        let before = projects.len();
        projects.retain(|project| project.id != id);
        if projects.len() == before {
            return Ok(false);
        }
        self.write(&projects)?;
        Ok(true)
    }

    fn write(&self, projects: &[Project]) -> StorageResult<()> {
        let json = serde_json::to_string(projects)?;
        self.storage.set(PROJECTS_KEY, &json)
    }
}
