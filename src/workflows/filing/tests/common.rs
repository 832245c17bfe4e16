use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::config::{AnalysisConfig, AnalysisCredentials};
use crate::workflows::filing::autofill::{AutofillNotice, NoticeError, NoticePublisher};
use crate::workflows::filing::catalog::{
    self, FLOOR_PLANS_DOCUMENT, SIGNAGE_DOCUMENT, SOIL_STUDY_DOCUMENT, STRUCTURAL_MEMO_DOCUMENT,
    TITLE_DOCUMENT,
};
use crate::workflows::filing::domain::{
    DocumentRequirement, ProjectId, ProjectRecord, ProjectStatus, ValidationState,
};
use crate::workflows::filing::engine::{
    ComplianceEngine, CrossValidationError, CrossValidationOutcome, CrossValidator,
    DocumentExtract, OfflineCrossValidator, ProjectMetadata,
};
use crate::workflows::filing::extraction::{
    AnalysisError, AnalysisOutcome, AnalysisRequest, DocumentAnalyzer, ExtractionAdapter,
};
use crate::workflows::filing::service::FilingService;
use crate::workflows::filing::storage::InMemoryProjectStore;

pub(super) fn analysis_config() -> AnalysisConfig {
    AnalysisConfig {
        credentials: AnalysisCredentials::Configured {
            api_key: "test-key".to_string(),
        },
        call_timeout: Duration::from_secs(5),
    }
}

pub(super) fn unconfigured_analysis() -> AnalysisConfig {
    AnalysisConfig {
        credentials: AnalysisCredentials::Unconfigured,
        call_timeout: Duration::from_secs(5),
    }
}

pub(super) fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub(super) fn consistent(pairs: &[(&str, &str)]) -> AnalysisOutcome {
    AnalysisOutcome {
        extracted_data: fields(pairs),
        is_consistent: true,
        confidence_score: Some(0.93),
    }
}

pub(super) fn inconsistent(pairs: &[(&str, &str)]) -> AnalysisOutcome {
    AnalysisOutcome {
        extracted_data: fields(pairs),
        is_consistent: false,
        confidence_score: Some(0.41),
    }
}

/// Analyzer answering from a per-document script.
#[derive(Default)]
pub(super) struct StubAnalyzer {
    responses: Mutex<HashMap<String, Result<AnalysisOutcome, AnalysisError>>>,
}

impl StubAnalyzer {
    pub(super) fn respond(self, document_id: &str, result: Result<AnalysisOutcome, AnalysisError>) -> Self {
        self.responses
            .lock()
            .expect("stub mutex poisoned")
            .insert(document_id.to_string(), result);
        self
    }
}

#[async_trait]
impl DocumentAnalyzer for StubAnalyzer {
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
        self.responses
            .lock()
            .expect("stub mutex poisoned")
            .get(request.document_id.as_str())
            .cloned()
            .unwrap_or_else(|| Err(AnalysisError::Transport("no scripted response".to_string())))
    }
}

/// Analyzer answering by uploaded payload, each response after a fixed delay.
/// Keying on content rather than call order keeps concurrent uploads of the
/// same document distinguishable under any task scheduling.
#[derive(Default)]
pub(super) struct PacedAnalyzer {
    schedule: HashMap<Vec<u8>, (Duration, AnalysisOutcome)>,
}

impl PacedAnalyzer {
    pub(super) fn when(
        mut self,
        payload: &[u8],
        delay: Duration,
        outcome: AnalysisOutcome,
    ) -> Self {
        self.schedule.insert(payload.to_vec(), (delay, outcome));
        self
    }
}

#[async_trait]
impl DocumentAnalyzer for PacedAnalyzer {
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
        let (delay, outcome) = self
            .schedule
            .get(&request.bytes)
            .cloned()
            .ok_or_else(|| AnalysisError::Transport("unexpected payload".to_string()))?;
        tokio::time::sleep(delay).await;
        Ok(outcome)
    }
}

/// Notice sink capturing autofill notifications for assertions.
#[derive(Default)]
pub(super) struct MemoryNotices {
    notices: Mutex<Vec<AutofillNotice>>,
}

impl MemoryNotices {
    pub(super) fn published(&self) -> Vec<AutofillNotice> {
        self.notices.lock().expect("notice mutex poisoned").clone()
    }
}

impl NoticePublisher for MemoryNotices {
    fn publish(&self, notice: AutofillNotice) -> Result<(), NoticeError> {
        self.notices
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
        Ok(())
    }
}

/// Cross-validator stub: either a fixed verdict or a hard failure.
pub(super) enum CrossBehavior {
    Verdict(CrossValidationOutcome),
    Unavailable,
}

pub(super) struct StubCrossValidator {
    behavior: CrossBehavior,
}

impl StubCrossValidator {
    pub(super) fn new(behavior: CrossBehavior) -> Self {
        Self { behavior }
    }
}

#[async_trait]
impl CrossValidator for StubCrossValidator {
    async fn cross_validate(
        &self,
        _project: &ProjectMetadata,
        _documents: &[DocumentExtract],
    ) -> Result<CrossValidationOutcome, CrossValidationError> {
        match &self.behavior {
            CrossBehavior::Verdict(outcome) => Ok(outcome.clone()),
            CrossBehavior::Unavailable => Err(CrossValidationError::Unavailable(
                "stub collaborator offline".to_string(),
            )),
        }
    }
}

pub(super) type TestService<A> =
    FilingService<A, OfflineCrossValidator, InMemoryProjectStore, MemoryNotices>;

pub(super) struct Harness<A> {
    pub(super) service: Arc<TestService<A>>,
    pub(super) store: Arc<InMemoryProjectStore>,
    pub(super) notices: Arc<MemoryNotices>,
}

pub(super) fn harness<A>(analyzer: A) -> Harness<A>
where
    A: DocumentAnalyzer + 'static,
{
    harness_with_config(analyzer, analysis_config())
}

pub(super) fn harness_with_config<A>(analyzer: A, config: AnalysisConfig) -> Harness<A>
where
    A: DocumentAnalyzer + 'static,
{
    let store = Arc::new(InMemoryProjectStore::default());
    let notices = Arc::new(MemoryNotices::default());
    let adapter = ExtractionAdapter::new(Arc::new(analyzer), config);
    let engine =
        ComplianceEngine::new(Arc::new(OfflineCrossValidator)).with_fallback_latency(Duration::ZERO);

    Harness {
        service: Arc::new(FilingService::new(
            adapter,
            engine,
            Arc::clone(&store),
            Arc::clone(&notices),
        )),
        store,
        notices,
    }
}

pub(super) fn zero_latency_engine<C>(validator: C) -> ComplianceEngine<C>
where
    C: CrossValidator,
{
    ComplianceEngine::new(Arc::new(validator)).with_fallback_latency(Duration::ZERO)
}

pub(super) fn project(owner: &str, locality: &str) -> ProjectRecord {
    ProjectRecord {
        id: ProjectId("CUR1-BOG-2026-1001".to_string()),
        tracking_number: "CUR1-BOG-2026-1001".to_string(),
        name: "Edificio Mirador".to_string(),
        owner: owner.to_string(),
        owner_id_number: "123".to_string(),
        address: "Calle 45 # 13-25".to_string(),
        registration_number: "050C-1234567".to_string(),
        locality: locality.to_string(),
        license_type: None,
        modality: None,
        status: ProjectStatus::Filed,
        filed_at: Utc::now(),
        description: "Obra nueva de vivienda multifamiliar".to_string(),
        report: None,
    }
}

pub(super) fn mark_validated(
    documents: &mut [DocumentRequirement],
    id: &str,
    pairs: &[(&str, &str)],
) {
    let document = documents
        .iter_mut()
        .find(|doc| doc.id.as_str() == id)
        .expect("document in catalog");
    document.state = ValidationState::Validated;
    document.extracted = fields(pairs);
}

/// Catalog snapshot where every fallback rule passes for owner "Juan Pérez"
/// in the default zone (max 6 floors).
pub(super) fn full_pass_documents() -> Vec<DocumentRequirement> {
    let mut documents = catalog::requirement_catalog();
    mark_validated(
        &mut documents,
        TITLE_DOCUMENT,
        &[("propietario_titular", "Juan Pérez Gómez")],
    );
    mark_validated(
        &mut documents,
        FLOOR_PLANS_DOCUMENT,
        &[("numero_pisos_detectado", "5")],
    );
    mark_validated(
        &mut documents,
        STRUCTURAL_MEMO_DOCUMENT,
        &[
            ("norma_referencia", "NSR-10"),
            ("grupo_uso_edificacion", "Residencial Grupo I"),
        ],
    );
    mark_validated(
        &mut documents,
        SOIL_STUDY_DOCUMENT,
        &[("tipo_cimentacion_sugerida", "Zapatas aisladas")],
    );
    mark_validated(
        &mut documents,
        SIGNAGE_DOCUMENT,
        &[("contiene_texto_curaduria", "true")],
    );
    documents
}
