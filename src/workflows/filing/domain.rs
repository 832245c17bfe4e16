use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for required documents, stable for the life of a draft.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier wrapper for filed projects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub String);

/// Broad grouping used to organize the requirement catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentCategory {
    Identification,
    Legal,
    Architectural,
    Structural,
    Other,
}

impl DocumentCategory {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentCategory::Identification => "Identificación",
            DocumentCategory::Legal => "Jurídico",
            DocumentCategory::Architectural => "Arquitectónico",
            DocumentCategory::Structural => "Estructural",
            DocumentCategory::Other => "Otros",
        }
    }
}

/// Per-document validation lifecycle state.
///
/// Legal transitions: `Pending | Validated | Rejected -> Validating` (a new
/// upload) and `Validating -> Validated | Rejected` (a settled analysis).
/// Terminal states never flip into each other directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationState {
    Pending,
    Validating,
    Validated,
    Rejected,
}

impl ValidationState {
    pub const fn label(self) -> &'static str {
        match self {
            ValidationState::Pending => "Pendiente",
            ValidationState::Validating => "En Validación",
            ValidationState::Validated => "Validado",
            ValidationState::Rejected => "Rechazado",
        }
    }

    pub const fn is_settled(self) -> bool {
        matches!(self, ValidationState::Validated | ValidationState::Rejected)
    }
}

/// One document a project must (or may) supply, plus its validation state and
/// whatever the analysis service extracted from the latest upload.
///
/// The extracted mapping is replaced wholesale on every attempt, never merged
/// across attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRequirement {
    pub id: DocumentId,
    pub category: DocumentCategory,
    pub name: String,
    pub description: String,
    pub required: bool,
    pub state: ValidationState,
    pub extracted: BTreeMap<String, String>,
    pub confidence: Option<f32>,
}

impl DocumentRequirement {
    pub fn template(
        id: &str,
        category: DocumentCategory,
        name: &str,
        description: &str,
        required: bool,
    ) -> Self {
        Self {
            id: DocumentId::from(id),
            category,
            name: name.to_string(),
            description: description.to_string(),
            required,
            state: ValidationState::Pending,
            extracted: BTreeMap::new(),
            confidence: None,
        }
    }

    /// Free-text narrative produced by the analysis service, when present.
    pub fn narrative(&self) -> Option<&str> {
        self.extracted
            .get(super::extraction::DIAGNOSTIC_KEY)
            .map(String::as_str)
    }
}

/// License classes handled by the curator's office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicenseType {
    Urbanizacion,
    Parcelacion,
    Subdivision,
    Construccion,
    IntervencionEspacioPublico,
}

impl LicenseType {
    pub const fn label(self) -> &'static str {
        match self {
            LicenseType::Urbanizacion => "Urbanización",
            LicenseType::Parcelacion => "Parcelación",
            LicenseType::Subdivision => "Subdivisión",
            LicenseType::Construccion => "Construcción",
            LicenseType::IntervencionEspacioPublico => {
                "Intervención y Ocupación de Espacio Público"
            }
        }
    }
}

/// Modality of the requested urban action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modality {
    ObraNueva,
    Ampliacion,
    Adecuacion,
    Modificacion,
    Restauracion,
    Reforzamiento,
    Demolicion,
    Cerramiento,
}

impl Modality {
    pub const fn label(self) -> &'static str {
        match self {
            Modality::ObraNueva => "Obra Nueva",
            Modality::Ampliacion => "Ampliación",
            Modality::Adecuacion => "Adecuación",
            Modality::Modificacion => "Modificación",
            Modality::Restauracion => "Restauración",
            Modality::Reforzamiento => "Reforzamiento Estructural",
            Modality::Demolicion => "Demolición",
            Modality::Cerramiento => "Cerramiento",
        }
    }
}

/// Review stages a filed project moves through at the curator's office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    Filed,
    LegalReview,
    ArchitecturalReview,
    StructuralReview,
    ObservationsAct,
    Viability,
    Issuance,
}

impl ProjectStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ProjectStatus::Filed => "Radicado",
            ProjectStatus::LegalReview => "Revisión Jurídica",
            ProjectStatus::ArchitecturalReview => "Revisión Arquitectónica",
            ProjectStatus::StructuralReview => "Revisión Estructural",
            ProjectStatus::ObservationsAct => "Acta de Observaciones",
            ProjectStatus::Viability => "Viabilidad",
            ProjectStatus::Issuance => "Expedición",
        }
    }
}

/// The filing under construction, persisted once the filing action runs.
///
/// An attached [`ComplianceReport`] is immutable; recomputation on a fresh
/// filing action produces a new report rather than amending the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub tracking_number: String,
    pub name: String,
    pub owner: String,
    pub owner_id_number: String,
    pub address: String,
    pub registration_number: String,
    pub locality: String,
    pub license_type: Option<LicenseType>,
    pub modality: Option<Modality>,
    pub status: ProjectStatus,
    pub filed_at: DateTime<Utc>,
    pub description: String,
    pub report: Option<ComplianceReport>,
}

/// One rule's outcome inside a compliance report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRuleResult {
    pub rule: String,
    pub detected: String,
    pub reference: String,
    pub satisfied: bool,
    pub explanation: String,
}

/// The filing verdict: present-or-absent as a whole, exactly one per engine
/// invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub approved: bool,
    pub score: u8,
    pub results: Vec<ComplianceRuleResult>,
    pub evaluated_at: DateTime<Utc>,
}

/// Form fields the wizard collects, some of which autofill from source
/// documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilingForm {
    pub project_name: String,
    pub owner: String,
    pub owner_id_number: String,
    pub address: String,
    pub registration_number: String,
    pub locality: String,
    pub license_type: Option<LicenseType>,
    pub modality: Option<Modality>,
    pub description: String,
}

/// Project form fields an autofill source document may overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutofillTarget {
    Owner,
    OwnerIdNumber,
    Address,
    RegistrationNumber,
}

impl FilingForm {
    /// Unconditional overwrite of one autofill target, even over values the
    /// user has hand-edited since the last upload.
    pub fn apply(&mut self, target: AutofillTarget, value: &str) {
        match target {
            AutofillTarget::Owner => self.owner = value.to_string(),
            AutofillTarget::OwnerIdNumber => self.owner_id_number = value.to_string(),
            AutofillTarget::Address => self.address = value.to_string(),
            AutofillTarget::RegistrationNumber => self.registration_number = value.to_string(),
        }
    }
}
