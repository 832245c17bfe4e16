//! Building-permit filing workflow: per-document validation lifecycle,
//! extraction via the external analysis collaborator, autofill propagation,
//! and the compliance rule engine behind the filing ("radicación") action.

pub mod autofill;
pub mod catalog;
pub mod domain;
pub mod engine;
pub mod extraction;
pub(crate) mod rules;
pub mod router;
pub mod service;
pub mod storage;
pub mod validation;

#[cfg(test)]
mod tests;

pub use autofill::{AutofillNotice, NoticeError, NoticePublisher, TracingNoticePublisher};
pub use catalog::{analysis_profile, requirement_catalog, zone_profile_for, AnalysisProfile};
pub use domain::{
    AutofillTarget, ComplianceReport, ComplianceRuleResult, DocumentCategory, DocumentId,
    DocumentRequirement, FilingForm, LicenseType, Modality, ProjectId, ProjectRecord,
    ProjectStatus, ValidationState,
};
pub use engine::{
    ComplianceEngine, CrossValidationError, CrossValidationOutcome, CrossValidator,
    DocumentExtract, OfflineCrossValidator, ProjectMetadata,
};
pub use extraction::{
    AnalysisError, AnalysisOutcome, AnalysisRequest, DocumentAnalyzer, Extraction,
    ExtractionAdapter, OfflineAnalyzer, DIAGNOSTIC_KEY,
};
pub use router::filing_router;
pub use service::{DocumentStatusView, FilingError, FilingService, FormUpdate};
pub use storage::{InMemoryProjectStore, ProjectStore, StoreError, StoredFile};
pub use validation::{DocumentValidationTracker, UploadError, UploadTicket, MAX_UPLOAD_BYTES};
