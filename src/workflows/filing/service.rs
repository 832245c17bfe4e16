use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Datelike, Utc};
use mime::Mime;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::autofill::{self, NoticePublisher};
use super::catalog;
use super::domain::{
    DocumentId, DocumentRequirement, FilingForm, LicenseType, Modality, ProjectId, ProjectRecord,
    ProjectStatus, ValidationState,
};
use super::engine::{ComplianceEngine, CrossValidator};
use super::extraction::{AnalysisRequest, DocumentAnalyzer, ExtractionAdapter};
use super::storage::{ProjectStore, StoreError, StoredFile};
use super::validation::{DocumentValidationTracker, UploadError};

/// Error raised by the filing service. Individual document failures never
/// surface here; they settle as `Rejected` records instead.
#[derive(Debug, thiserror::Error)]
pub enum FilingError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

static FILING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_tracking_number() -> String {
    let sequence = FILING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("CUR1-BOG-{}-{:04}", Utc::now().year(), 1000 + sequence)
}

/// Draft state shared with in-flight validation tasks.
struct DraftInner<A, N> {
    adapter: ExtractionAdapter<A>,
    tracker: DocumentValidationTracker,
    notices: Arc<N>,
    form: Mutex<FilingForm>,
    files: Mutex<HashMap<DocumentId, StoredFile>>,
}

/// Service composing the validation state machine, the extraction adapter,
/// the autofill propagator, the compliance engine, and the storage sink.
pub struct FilingService<A, C, S, N> {
    inner: Arc<DraftInner<A, N>>,
    engine: ComplianceEngine<C>,
    store: Arc<S>,
}

impl<A, C, S, N> FilingService<A, C, S, N>
where
    A: DocumentAnalyzer + 'static,
    C: CrossValidator + 'static,
    S: ProjectStore + 'static,
    N: NoticePublisher + 'static,
{
    pub fn new(
        adapter: ExtractionAdapter<A>,
        engine: ComplianceEngine<C>,
        store: Arc<S>,
        notices: Arc<N>,
    ) -> Self {
        Self {
            inner: Arc::new(DraftInner {
                adapter,
                tracker: DocumentValidationTracker::new(catalog::requirement_catalog()),
                notices,
                form: Mutex::new(FilingForm::default()),
                files: Mutex::new(HashMap::new()),
            }),
            engine,
            store,
        }
    }

    /// Admit an upload and start its validation task. The synchronous part
    /// performs the local constraint check and the `Validating` transition;
    /// the returned handle settles when the analysis result has been applied
    /// (or discarded as stale).
    pub fn upload_document(
        &self,
        id: &DocumentId,
        bytes: Vec<u8>,
        media_type: Mime,
    ) -> Result<JoinHandle<()>, FilingError> {
        let ticket = self.inner.tracker.begin_upload(id, bytes.len())?;

        let category = self
            .inner
            .tracker
            .get(id)
            .map(|doc| doc.category)
            .unwrap_or(super::domain::DocumentCategory::Other);

        {
            let mut files = self.inner.files.lock().expect("file map mutex poisoned");
            files.insert(
                id.clone(),
                StoredFile {
                    document_id: id.clone(),
                    category,
                    media_type: media_type.to_string(),
                    bytes: bytes.clone(),
                    uploaded_at: Utc::now(),
                },
            );
        }

        let request = AnalysisRequest {
            document_id: id.clone(),
            bytes,
            media_type,
            profile: catalog::analysis_profile(id),
        };

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let extraction = inner.adapter.extract(request).await;

            let Some(document) = inner.tracker.complete(&ticket, extraction) else {
                debug!(
                    document_id = ticket.document_id.as_str(),
                    "stale validation result discarded"
                );
                return;
            };

            info!(
                document_id = document.id.as_str(),
                state = document.state.label(),
                "document validation settled"
            );

            if document.state == ValidationState::Validated
                && catalog::is_autofill_source(&document.id)
            {
                let applied = {
                    let mut form = inner.form.lock().expect("form mutex poisoned");
                    autofill::propagate(&document.id, &document.extracted, &mut form)
                };

                if !applied.is_empty() {
                    let notice = autofill::notice_for(&document.id, applied);
                    if let Err(error) = inner.notices.publish(notice) {
                        warn!(%error, "autofill notice dropped");
                    }
                }
            }
        });

        Ok(handle)
    }

    pub fn document(&self, id: &DocumentId) -> Option<DocumentRequirement> {
        self.inner.tracker.get(id)
    }

    pub fn documents(&self) -> Vec<DocumentRequirement> {
        self.inner.tracker.snapshot()
    }

    pub fn form(&self) -> FilingForm {
        self.inner.form.lock().expect("form mutex poisoned").clone()
    }

    /// Apply a partial, user-driven form update.
    pub fn update_form(&self, update: FormUpdate) -> FilingForm {
        let mut form = self.inner.form.lock().expect("form mutex poisoned");
        update.apply(&mut form);
        form.clone()
    }

    /// The filing action: build the project record from the form, evaluate
    /// compliance over a snapshot of the document records, attach the report,
    /// and persist everything. Documents that settle after the snapshot was
    /// taken are not observed by this evaluation.
    pub async fn radicate(&self) -> Result<ProjectRecord, FilingError> {
        let form = self.form();
        let documents = self.inner.tracker.snapshot();
        let tracking_number = next_tracking_number();

        let mut project = ProjectRecord {
            id: ProjectId(tracking_number.clone()),
            tracking_number,
            name: form.project_name,
            owner: form.owner,
            owner_id_number: form.owner_id_number,
            address: form.address,
            registration_number: form.registration_number,
            locality: form.locality,
            license_type: form.license_type,
            modality: form.modality,
            status: ProjectStatus::Filed,
            filed_at: Utc::now(),
            description: form.description,
            report: None,
        };

        let report = self.engine.evaluate(&project, &documents).await;
        info!(
            tracking_number = %project.tracking_number,
            approved = report.approved,
            score = report.score,
            "compliance report computed"
        );
        project.report = Some(report);

        let files: Vec<StoredFile> = {
            let files = self.inner.files.lock().expect("file map mutex poisoned");
            files.values().cloned().collect()
        };
        self.store.save(&project, &documents, &files)?;

        Ok(project)
    }

    /// Throw away the draft: fresh catalog, empty form, no retained blobs.
    pub fn discard_draft(&self) {
        self.inner.tracker.reset(catalog::requirement_catalog());
        *self.inner.form.lock().expect("form mutex poisoned") = FilingForm::default();
        self.inner
            .files
            .lock()
            .expect("file map mutex poisoned")
            .clear();
    }

    pub fn list_projects(&self) -> Result<Vec<ProjectRecord>, FilingError> {
        Ok(self.store.list_projects()?)
    }
}

/// Partial form update from the wizard; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormUpdate {
    pub project_name: Option<String>,
    pub owner: Option<String>,
    pub owner_id_number: Option<String>,
    pub address: Option<String>,
    pub registration_number: Option<String>,
    pub locality: Option<String>,
    pub license_type: Option<LicenseType>,
    pub modality: Option<Modality>,
    pub description: Option<String>,
}

impl FormUpdate {
    fn apply(self, form: &mut FilingForm) {
        if let Some(value) = self.project_name {
            form.project_name = value;
        }
        if let Some(value) = self.owner {
            form.owner = value;
        }
        if let Some(value) = self.owner_id_number {
            form.owner_id_number = value;
        }
        if let Some(value) = self.address {
            form.address = value;
        }
        if let Some(value) = self.registration_number {
            form.registration_number = value;
        }
        if let Some(value) = self.locality {
            form.locality = value;
        }
        if let Some(value) = self.license_type {
            form.license_type = Some(value);
        }
        if let Some(value) = self.modality {
            form.modality = Some(value);
        }
        if let Some(value) = self.description {
            form.description = value;
        }
    }
}

/// Sanitized per-document view for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentStatusView {
    pub id: DocumentId,
    pub name: String,
    pub category: &'static str,
    pub required: bool,
    pub state: &'static str,
    pub autofill_source: bool,
    pub extracted: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl DocumentStatusView {
    pub fn from_record(document: &DocumentRequirement) -> Self {
        Self {
            id: document.id.clone(),
            name: document.name.clone(),
            category: document.category.label(),
            required: document.required,
            state: document.state.label(),
            autofill_source: catalog::is_autofill_source(&document.id),
            extracted: document.extracted.clone(),
            confidence: document.confidence,
        }
    }
}
