//! Persistent-storage collaborator seam. The core only writes to it after a
//! report is computed; nothing here is consulted during validation or rule
//! evaluation.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::domain::{DocumentCategory, DocumentId, DocumentRequirement, ProjectId, ProjectRecord};

/// One uploaded blob retained for persistence alongside the project.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub document_id: DocumentId,
    pub category: DocumentCategory,
    pub media_type: String,
    pub bytes: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("project not found")]
    NotFound,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Write sink for filed projects, their document records, and file blobs.
pub trait ProjectStore: Send + Sync {
    fn save(
        &self,
        project: &ProjectRecord,
        documents: &[DocumentRequirement],
        files: &[StoredFile],
    ) -> Result<(), StoreError>;

    fn list_projects(&self) -> Result<Vec<ProjectRecord>, StoreError>;

    fn files_for_project(&self, id: &ProjectId) -> Result<Vec<StoredFile>, StoreError>;
}

#[derive(Default)]
struct MemoryStoreState {
    projects: Vec<(ProjectRecord, Vec<DocumentRequirement>)>,
    files: HashMap<ProjectId, Vec<StoredFile>>,
}

/// In-memory store backing tests and single-session operation.
#[derive(Default)]
pub struct InMemoryProjectStore {
    state: Mutex<MemoryStoreState>,
}

impl ProjectStore for InMemoryProjectStore {
    fn save(
        &self,
        project: &ProjectRecord,
        documents: &[DocumentRequirement],
        files: &[StoredFile],
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        state
            .projects
            .push((project.clone(), documents.to_vec()));
        state.files.insert(project.id.clone(), files.to_vec());
        Ok(())
    }

    fn list_projects(&self) -> Result<Vec<ProjectRecord>, StoreError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state
            .projects
            .iter()
            .map(|(project, _)| project.clone())
            .collect())
    }

    fn files_for_project(&self, id: &ProjectId) -> Result<Vec<StoredFile>, StoreError> {
        let state = self.state.lock().expect("store mutex poisoned");
        state.files.get(id).cloned().ok_or(StoreError::NotFound)
    }
}
