//! Document validation state machine. Owns the per-document lifecycle
//! (`Pending -> Validating -> Validated | Rejected`), the synchronous upload
//! constraints, and the per-id generation counters that discard stale results
//! when uploads for the same document race.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use super::domain::{DocumentId, DocumentRequirement, ValidationState};
use super::extraction::Extraction;

/// Hard local limit applied before any state change.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Errors raised synchronously by `begin_upload`, before any state change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("unknown document '{0}'")]
    UnknownDocument(String),
    #[error("file of {actual} bytes exceeds the {limit} byte limit")]
    SizeExceeded { limit: usize, actual: usize },
}

/// Proof that an upload was admitted, carrying the generation that must still
/// be current for the eventual result to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub document_id: DocumentId,
    generation: u64,
}

struct TrackerState {
    documents: BTreeMap<DocumentId, DocumentRequirement>,
    generations: HashMap<DocumentId, u64>,
}

/// Shared collection of document records. Writes happen under one mutex held
/// only for the record swap; the analysis await never runs while locked.
#[derive(Clone)]
pub struct DocumentValidationTracker {
    state: Arc<Mutex<TrackerState>>,
}

impl DocumentValidationTracker {
    pub fn new(catalog: Vec<DocumentRequirement>) -> Self {
        let documents = catalog.into_iter().map(|doc| (doc.id.clone(), doc)).collect();
        Self {
            state: Arc::new(Mutex::new(TrackerState {
                documents,
                generations: HashMap::new(),
            })),
        }
    }

    /// Admit an upload: size check, transition into `Validating`, clear stale
    /// extracted fields, bump the generation. A constraint violation leaves
    /// the record untouched.
    pub fn begin_upload(
        &self,
        id: &DocumentId,
        byte_len: usize,
    ) -> Result<UploadTicket, UploadError> {
        if byte_len > MAX_UPLOAD_BYTES {
            return Err(UploadError::SizeExceeded {
                limit: MAX_UPLOAD_BYTES,
                actual: byte_len,
            });
        }

        let mut state = self.state.lock().expect("tracker mutex poisoned");

        let document = state
            .documents
            .get_mut(id)
            .ok_or_else(|| UploadError::UnknownDocument(id.as_str().to_string()))?;

        document.state = ValidationState::Validating;
        document.extracted = BTreeMap::new();
        document.confidence = None;

        let generation = state
            .generations
            .entry(id.clone())
            .and_modify(|generation| *generation += 1)
            .or_insert(1);

        Ok(UploadTicket {
            document_id: id.clone(),
            generation: *generation,
        })
    }

    /// Apply a settled extraction. Returns the updated record, or `None` when
    /// a newer upload superseded this attempt and the result is discarded.
    pub fn complete(
        &self,
        ticket: &UploadTicket,
        extraction: Extraction,
    ) -> Option<DocumentRequirement> {
        let mut state = self.state.lock().expect("tracker mutex poisoned");

        let current = state.generations.get(&ticket.document_id).copied();
        if current != Some(ticket.generation) {
            return None;
        }

        let document = state.documents.get_mut(&ticket.document_id)?;
        document.state = if extraction.is_consistent {
            ValidationState::Validated
        } else {
            ValidationState::Rejected
        };
        document.extracted = extraction.fields;
        document.confidence = extraction.confidence;

        Some(document.clone())
    }

    pub fn get(&self, id: &DocumentId) -> Option<DocumentRequirement> {
        let state = self.state.lock().expect("tracker mutex poisoned");
        state.documents.get(id).cloned()
    }

    /// Point-in-time copy of every record, ordered by document id. The rule
    /// engine reads exactly one snapshot per invocation.
    pub fn snapshot(&self) -> Vec<DocumentRequirement> {
        let state = self.state.lock().expect("tracker mutex poisoned");
        state.documents.values().cloned().collect()
    }

    /// Drop all validation progress and start over from a fresh catalog.
    pub fn reset(&self, catalog: Vec<DocumentRequirement>) {
        let mut state = self.state.lock().expect("tracker mutex poisoned");
        state.documents = catalog.into_iter().map(|doc| (doc.id.clone(), doc)).collect();
        state.generations.clear();
    }
}
