//! Extraction adapter: invokes the external document-analysis collaborator
//! with a per-document rule profile and normalizes success and failure into a
//! single result shape the validation state machine can always apply.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mime::Mime;

use crate::config::AnalysisConfig;

use super::catalog::AnalysisProfile;
use super::domain::DocumentId;

/// Key under which narrative/diagnostic text travels in an extracted mapping.
pub const DIAGNOSTIC_KEY: &str = "observacion_tecnica";

/// Raw analysis request handed to the collaborator.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub document_id: DocumentId,
    pub bytes: Vec<u8>,
    pub media_type: Mime,
    pub profile: Option<AnalysisProfile>,
}

/// Collaborator output contract.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub extracted_data: BTreeMap<String, String>,
    pub is_consistent: bool,
    pub confidence_score: Option<f32>,
}

/// Failure kinds the adapter can observe. `Unconfigured` is kept distinct from
/// transport errors so operators are told to fix configuration instead of
/// retrying the same document.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("analysis service credentials are not configured")]
    Unconfigured,
    #[error("analysis service unreachable: {0}")]
    Transport(String),
    #[error("malformed analysis response: {0}")]
    Malformed(String),
    #[error("analysis call exceeded {0:?}")]
    Timeout(Duration),
}

/// Seam for the external document-analysis service.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError>;
}

/// Analyzer used when no collaborator is wired (e.g., missing credentials).
/// Every call degrades to a configuration diagnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineAnalyzer;

#[async_trait]
impl DocumentAnalyzer for OfflineAnalyzer {
    async fn analyze(&self, _request: AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
        Err(AnalysisError::Unconfigured)
    }
}

/// Uniform result the state machine applies, whether analysis succeeded or
/// failed. A failed extraction carries a single diagnostic field, never a
/// partial mapping that could be mistaken for a successful one.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub fields: BTreeMap<String, String>,
    pub is_consistent: bool,
    pub confidence: Option<f32>,
    pub failure: Option<AnalysisError>,
}

impl Extraction {
    fn from_outcome(outcome: AnalysisOutcome, profile: Option<&AnalysisProfile>) -> Self {
        let fields = sanitize_fields(outcome.extracted_data, profile);
        Self {
            fields,
            is_consistent: outcome.is_consistent,
            confidence: outcome.confidence_score,
            failure: None,
        }
    }

    fn from_failure(error: AnalysisError) -> Self {
        let diagnostic = match &error {
            AnalysisError::Unconfigured => {
                "Servicio de análisis sin configurar. Solicite al operador registrar las \
                 credenciales del servicio antes de reintentar."
                    .to_string()
            }
            AnalysisError::Transport(detail) => format!(
                "Error de lectura IA: {detail}. Verifique que el archivo sea legible y no \
                 tenga protección por contraseña."
            ),
            AnalysisError::Malformed(detail) => {
                format!("Respuesta de análisis ilegible: {detail}.")
            }
            AnalysisError::Timeout(limit) => format!(
                "El servicio de análisis no respondió dentro de {} segundos.",
                limit.as_secs()
            ),
        };

        let mut fields = BTreeMap::new();
        fields.insert(DIAGNOSTIC_KEY.to_string(), diagnostic);

        Self {
            fields,
            is_consistent: false,
            confidence: None,
            failure: Some(error),
        }
    }
}

/// Keep keys the document's schema knows about; fold anything else into
/// opaque diagnostic text so rule logic never interprets unrecognized keys.
fn sanitize_fields(
    raw: BTreeMap<String, String>,
    profile: Option<&AnalysisProfile>,
) -> BTreeMap<String, String> {
    let Some(profile) = profile else {
        return raw;
    };

    let mut fields = BTreeMap::new();
    let mut unrecognized = Vec::new();

    for (key, value) in raw {
        if key == DIAGNOSTIC_KEY || profile.expected_keys.contains(&key.as_str()) {
            fields.insert(key, value);
        } else if !value.trim().is_empty() {
            unrecognized.push(format!("{key}: {value}"));
        }
    }

    if !unrecognized.is_empty() {
        let note = format!("Datos fuera de esquema: {}", unrecognized.join("; "));
        fields
            .entry(DIAGNOSTIC_KEY.to_string())
            .and_modify(|existing| {
                existing.push_str(". ");
                existing.push_str(&note);
            })
            .or_insert(note);
    }

    fields
}

/// Adapter owning the collaborator handle, the injected credentials state, and
/// the defensive per-call timeout.
pub struct ExtractionAdapter<A> {
    analyzer: Arc<A>,
    config: AnalysisConfig,
}

impl<A> ExtractionAdapter<A>
where
    A: DocumentAnalyzer,
{
    pub fn new(analyzer: Arc<A>, config: AnalysisConfig) -> Self {
        Self { analyzer, config }
    }

    /// Run one analysis call and normalize the result. Never returns an error:
    /// failures become diagnostic-only extractions (state machine contract).
    pub async fn extract(&self, request: AnalysisRequest) -> Extraction {
        if !self.config.credentials.is_configured() {
            return Extraction::from_failure(AnalysisError::Unconfigured);
        }

        let profile = request.profile.clone();
        let timeout = self.config.call_timeout;

        match tokio::time::timeout(timeout, self.analyzer.analyze(request)).await {
            Ok(Ok(outcome)) => Extraction::from_outcome(outcome, profile.as_ref()),
            Ok(Err(error)) => Extraction::from_failure(error),
            Err(_) => Extraction::from_failure(AnalysisError::Timeout(timeout)),
        }
    }
}
