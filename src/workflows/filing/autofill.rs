//! Autofill propagation from validated source documents (identity, property
//! title) into the project form, plus the transient notice seam consumed by
//! the presentation layer.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use super::catalog;
use super::domain::{AutofillTarget, DocumentId, FilingForm};

/// How long the presentation layer should keep an autofill notice visible.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

/// Transient, auto-expiring notification emitted after a successful autofill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutofillNotice {
    pub document_id: DocumentId,
    pub applied: Vec<AutofillTarget>,
    pub message: String,
    pub ttl_secs: u64,
}

/// Outbound hook for transient notices (toast banners and the like).
pub trait NoticePublisher: Send + Sync {
    fn publish(&self, notice: AutofillNotice) -> Result<(), NoticeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NoticeError {
    #[error("notice transport unavailable: {0}")]
    Transport(String),
}

/// Publisher that just logs; enough for the CLI and headless operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNoticePublisher;

impl NoticePublisher for TracingNoticePublisher {
    fn publish(&self, notice: AutofillNotice) -> Result<(), NoticeError> {
        tracing::info!(
            document_id = notice.document_id.as_str(),
            applied = notice.applied.len(),
            "{}",
            notice.message
        );
        Ok(())
    }
}

/// Copy extracted source fields onto their canonical form targets. Each target
/// is overwritten iff its source key is present and non-empty; everything else
/// is left untouched. Returns the targets that were written.
pub fn propagate(
    document_id: &DocumentId,
    fields: &BTreeMap<String, String>,
    form: &mut FilingForm,
) -> Vec<AutofillTarget> {
    let mut applied = Vec::new();

    for (source_key, target) in catalog::autofill_targets(document_id) {
        let Some(value) = fields.get(*source_key) else {
            continue;
        };
        if value.trim().is_empty() || value.trim().eq_ignore_ascii_case("null") {
            continue;
        }

        form.apply(*target, value);
        applied.push(*target);
    }

    applied
}

/// Build the notice for a propagation that applied at least one target.
pub fn notice_for(document_id: &DocumentId, applied: Vec<AutofillTarget>) -> AutofillNotice {
    AutofillNotice {
        document_id: document_id.clone(),
        applied,
        message: "Datos extraídos correctamente".to_string(),
        ttl_secs: NOTICE_TTL.as_secs(),
    }
}
