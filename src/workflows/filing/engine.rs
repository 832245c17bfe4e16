//! Compliance rule engine and report aggregator. The engine prefers the
//! external cross-validation collaborator and degrades to the deterministic
//! fallback ruleset; whatever happens, every invocation yields exactly one
//! [`ComplianceReport`].

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{
    ComplianceReport, ComplianceRuleResult, DocumentRequirement, ProjectRecord,
};
use super::rules;

/// Fallback score when every rule passed.
pub const APPROVED_SCORE: u8 = 100;
/// Fallback score when at least one rule failed. Not comparable with the
/// collaborator-supplied score; both are preserved as-is.
pub const OBSERVED_SCORE: u8 = 45;

/// Project metadata forwarded to the cross-validation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,
    pub address: String,
    pub owner: String,
    pub license_type: Option<String>,
    pub modality: Option<String>,
}

impl ProjectMetadata {
    pub fn from_record(project: &ProjectRecord) -> Self {
        Self {
            name: project.name.clone(),
            address: project.address.clone(),
            owner: project.owner.clone(),
            license_type: project.license_type.map(|lt| lt.label().to_string()),
            modality: project.modality.map(|m| m.label().to_string()),
        }
    }
}

/// One document's extraction as shipped to the collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentExtract {
    pub document_name: String,
    pub extracted_fields: BTreeMap<String, String>,
}

/// Collaborator verdict. Used verbatim when well formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationOutcome {
    pub approved: bool,
    pub compliance_score: u8,
    pub narrative: String,
    pub details: Vec<ComplianceRuleResult>,
}

impl CrossValidationOutcome {
    /// A usable verdict has at least one rule detail and a score in range.
    /// Anything else sends the engine to the fallback path.
    pub fn is_well_formed(&self) -> bool {
        !self.details.is_empty() && self.compliance_score <= 100
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrossValidationError {
    #[error("cross-validation collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("cross-validation collaborator returned malformed data: {0}")]
    Malformed(String),
}

/// Seam for the external cross-validation collaborator.
#[async_trait]
pub trait CrossValidator: Send + Sync {
    async fn cross_validate(
        &self,
        project: &ProjectMetadata,
        documents: &[DocumentExtract],
    ) -> Result<CrossValidationOutcome, CrossValidationError>;
}

/// Validator used when no collaborator is wired; forces the fallback path.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineCrossValidator;

#[async_trait]
impl CrossValidator for OfflineCrossValidator {
    async fn cross_validate(
        &self,
        _project: &ProjectMetadata,
        _documents: &[DocumentExtract],
    ) -> Result<CrossValidationOutcome, CrossValidationError> {
        Err(CrossValidationError::Unavailable(
            "no collaborator configured".to_string(),
        ))
    }
}

/// Default simulated latency of the fallback path, modeling the processing
/// time the collaborator would have taken.
pub const FALLBACK_LATENCY: Duration = Duration::from_millis(1500);

pub struct ComplianceEngine<C> {
    validator: Arc<C>,
    fallback_latency: Duration,
}

impl<C> ComplianceEngine<C>
where
    C: CrossValidator,
{
    pub fn new(validator: Arc<C>) -> Self {
        Self {
            validator,
            fallback_latency: FALLBACK_LATENCY,
        }
    }

    /// Tests shrink the simulated latency to keep the suite fast.
    pub fn with_fallback_latency(mut self, latency: Duration) -> Self {
        self.fallback_latency = latency;
        self
    }

    /// Run one evaluation over a snapshot of the document records. Infallible
    /// by contract: the report is always defined, even when both the
    /// collaborator and the fallback computation give out.
    pub async fn evaluate(
        &self,
        project: &ProjectRecord,
        documents: &[DocumentRequirement],
    ) -> ComplianceReport {
        let metadata = ProjectMetadata::from_record(project);
        let extracts: Vec<DocumentExtract> = documents
            .iter()
            .map(|doc| DocumentExtract {
                document_name: doc.name.clone(),
                extracted_fields: doc.extracted.clone(),
            })
            .collect();

        match self.validator.cross_validate(&metadata, &extracts).await {
            Ok(outcome) if outcome.is_well_formed() => {
                return aggregate(outcome.details, outcome.approved, outcome.compliance_score);
            }
            Ok(_) => {
                warn!("cross-validation verdict malformed; using deterministic fallback");
            }
            Err(error) => {
                warn!(%error, "cross-validation unavailable; using deterministic fallback");
            }
        }

        tokio::time::sleep(self.fallback_latency).await;

        let evaluated =
            std::panic::catch_unwind(AssertUnwindSafe(|| rules::evaluate(project, documents)));

        match evaluated {
            Ok(results) => {
                let approved = results.iter().all(|result| result.satisfied);
                let score = if approved { APPROVED_SCORE } else { OBSERVED_SCORE };
                aggregate(results, approved, score)
            }
            Err(_) => engine_failure_report(),
        }
    }
}

/// Package rule outcomes into the immutable report attached to the project.
fn aggregate(results: Vec<ComplianceRuleResult>, approved: bool, score: u8) -> ComplianceReport {
    ComplianceReport {
        approved,
        score,
        results,
        evaluated_at: Utc::now(),
    }
}

/// Total-failure path: a synthetic single-result report instead of a crash.
pub(crate) fn engine_failure_report() -> ComplianceReport {
    aggregate(
        vec![ComplianceRuleResult {
            rule: "Error de Validación".to_string(),
            detected: "N/A".to_string(),
            reference: "N/A".to_string(),
            satisfied: false,
            explanation: "El motor de validación no pudo completar la evaluación. Reintente \
                          la radicación; los documentos cargados no se ven afectados."
                .to_string(),
        }],
        false,
        0,
    )
}
