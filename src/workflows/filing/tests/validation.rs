use std::time::Duration;

use super::common::*;
use crate::workflows::filing::catalog::{self, IDENTITY_DOCUMENT, TITLE_DOCUMENT};
use crate::workflows::filing::domain::{DocumentId, ValidationState};
use crate::workflows::filing::extraction::{AnalysisError, DIAGNOSTIC_KEY};
use crate::workflows::filing::validation::{
    DocumentValidationTracker, UploadError, MAX_UPLOAD_BYTES,
};

fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.7 stub".to_vec()
}

#[test]
fn oversized_upload_is_refused_before_any_state_change() {
    let tracker = DocumentValidationTracker::new(catalog::requirement_catalog());
    let id = DocumentId::from(IDENTITY_DOCUMENT);

    let result = tracker.begin_upload(&id, MAX_UPLOAD_BYTES + 1);

    assert!(matches!(
        result,
        Err(UploadError::SizeExceeded { .. })
    ));
    let document = tracker.get(&id).expect("catalog document");
    assert_eq!(document.state, ValidationState::Pending);
}

#[test]
fn unknown_document_is_refused() {
    let tracker = DocumentValidationTracker::new(catalog::requirement_catalog());
    let result = tracker.begin_upload(&DocumentId::from("doc_inexistente"), 10);
    assert!(matches!(result, Err(UploadError::UnknownDocument(_))));
}

#[test]
fn admitted_upload_enters_validating_and_clears_stale_fields() {
    let tracker = DocumentValidationTracker::new(catalog::requirement_catalog());
    let id = DocumentId::from(TITLE_DOCUMENT);

    let ticket = tracker.begin_upload(&id, 10).expect("admitted");
    let extraction_fields = fields(&[("propietario_titular", "Juan Pérez")]);
    tracker
        .complete(
            &ticket,
            crate::workflows::filing::extraction::Extraction {
                fields: extraction_fields,
                is_consistent: true,
                confidence: Some(0.9),
                failure: None,
            },
        )
        .expect("applied");

    let ticket = tracker.begin_upload(&id, 10).expect("re-admitted");
    let document = tracker.get(&id).expect("catalog document");
    assert_eq!(document.state, ValidationState::Validating);
    assert!(document.extracted.is_empty());
    assert_eq!(document.confidence, None);
    drop(ticket);
}

#[test]
fn stale_completion_is_discarded_when_a_newer_upload_raced() {
    let tracker = DocumentValidationTracker::new(catalog::requirement_catalog());
    let id = DocumentId::from(IDENTITY_DOCUMENT);

    let first = tracker.begin_upload(&id, 10).expect("first admitted");
    let second = tracker.begin_upload(&id, 10).expect("second admitted");

    let stale = tracker.complete(
        &first,
        crate::workflows::filing::extraction::Extraction {
            fields: fields(&[("nombre_titular", "Equivocado")]),
            is_consistent: true,
            confidence: None,
            failure: None,
        },
    );
    assert!(stale.is_none());
    assert_eq!(
        tracker.get(&id).expect("document").state,
        ValidationState::Validating
    );

    let fresh = tracker.complete(
        &second,
        crate::workflows::filing::extraction::Extraction {
            fields: fields(&[("nombre_titular", "Juan Pérez")]),
            is_consistent: true,
            confidence: None,
            failure: None,
        },
    );
    let document = fresh.expect("latest generation applies");
    assert_eq!(document.state, ValidationState::Validated);
    assert_eq!(
        document.extracted.get("nombre_titular").map(String::as_str),
        Some("Juan Pérez")
    );
}

#[tokio::test]
async fn consistent_analysis_validates_the_document() {
    let harness = harness(StubAnalyzer::default().respond(
        IDENTITY_DOCUMENT,
        Ok(consistent(&[
            ("nombre_titular", "Juan Pérez"),
            ("numero_documento", "123"),
        ])),
    ));

    let id = DocumentId::from(IDENTITY_DOCUMENT);
    let handle = harness
        .service
        .upload_document(&id, pdf_bytes(), mime::APPLICATION_PDF)
        .expect("upload admitted");
    handle.await.expect("validation task");

    let document = harness.service.document(&id).expect("document");
    assert_eq!(document.state, ValidationState::Validated);
    assert_eq!(
        document.extracted.get("nombre_titular").map(String::as_str),
        Some("Juan Pérez")
    );
    assert_eq!(document.confidence, Some(0.93));
}

#[tokio::test]
async fn inconsistent_analysis_rejects_but_keeps_diagnostic_fields() {
    let harness = harness(StubAnalyzer::default().respond(
        TITLE_DOCUMENT,
        Ok(inconsistent(&[
            ("propietario_titular", "Otra Persona"),
            (DIAGNOSTIC_KEY, "El titular no coincide con el solicitante."),
        ])),
    ));

    let id = DocumentId::from(TITLE_DOCUMENT);
    let handle = harness
        .service
        .upload_document(&id, pdf_bytes(), mime::APPLICATION_PDF)
        .expect("upload admitted");
    handle.await.expect("validation task");

    let document = harness.service.document(&id).expect("document");
    assert_eq!(document.state, ValidationState::Rejected);
    assert_eq!(
        document
            .extracted
            .get("propietario_titular")
            .map(String::as_str),
        Some("Otra Persona")
    );
}

#[tokio::test]
async fn analyzer_failure_rejects_with_a_single_diagnostic_entry() {
    let harness = harness(StubAnalyzer::default().respond(
        IDENTITY_DOCUMENT,
        Err(AnalysisError::Transport("connection refused".to_string())),
    ));

    let id = DocumentId::from(IDENTITY_DOCUMENT);
    let handle = harness
        .service
        .upload_document(&id, pdf_bytes(), mime::APPLICATION_PDF)
        .expect("upload admitted");
    handle.await.expect("validation task");

    let document = harness.service.document(&id).expect("document");
    assert_eq!(document.state, ValidationState::Rejected);
    assert_eq!(document.extracted.len(), 1);
    let diagnostic = document.extracted.get(DIAGNOSTIC_KEY).expect("diagnostic");
    assert!(diagnostic.contains("connection refused"));
}

#[tokio::test]
async fn missing_credentials_reject_with_configuration_diagnostic() {
    let harness = harness_with_config(StubAnalyzer::default(), unconfigured_analysis());

    let id = DocumentId::from(IDENTITY_DOCUMENT);
    let handle = harness
        .service
        .upload_document(&id, pdf_bytes(), mime::APPLICATION_PDF)
        .expect("upload admitted");
    handle.await.expect("validation task");

    let document = harness.service.document(&id).expect("document");
    assert_eq!(document.state, ValidationState::Rejected);
    let diagnostic = document.extracted.get(DIAGNOSTIC_KEY).expect("diagnostic");
    assert!(diagnostic.contains("sin configurar"));
}

#[test]
fn reupload_replaces_the_prior_extraction_wholesale() {
    let tracker = DocumentValidationTracker::new(catalog::requirement_catalog());
    let id = DocumentId::from(TITLE_DOCUMENT);

    let ticket = tracker.begin_upload(&id, 10).expect("admitted");
    tracker
        .complete(
            &ticket,
            crate::workflows::filing::extraction::Extraction {
                fields: fields(&[
                    ("propietario_titular", "Juan Pérez"),
                    ("matricula_inmobiliaria", "050C-1234567"),
                ]),
                is_consistent: true,
                confidence: Some(0.88),
                failure: None,
            },
        )
        .expect("applied");

    let ticket = tracker.begin_upload(&id, 10).expect("re-admitted");
    let document = tracker
        .complete(
            &ticket,
            crate::workflows::filing::extraction::Extraction {
                fields: fields(&[("propietario_titular", "María Gómez")]),
                is_consistent: true,
                confidence: Some(0.91),
                failure: None,
            },
        )
        .expect("applied");

    // No merge: keys from the first attempt do not survive the second.
    assert_eq!(document.extracted.len(), 1);
    assert!(!document.extracted.contains_key("matricula_inmobiliaria"));
    assert_eq!(document.confidence, Some(0.91));
}

#[tokio::test]
async fn later_upload_wins_when_two_race_for_the_same_document() {
    let analyzer = PacedAnalyzer::default()
        .when(
            b"primer archivo",
            Duration::from_millis(120),
            consistent(&[("nombre_titular", "Resultado Viejo")]),
        )
        .when(
            b"segundo archivo",
            Duration::from_millis(10),
            consistent(&[("nombre_titular", "Resultado Nuevo")]),
        );
    let harness = harness(analyzer);
    let id = DocumentId::from(IDENTITY_DOCUMENT);

    let first = harness
        .service
        .upload_document(&id, b"primer archivo".to_vec(), mime::APPLICATION_PDF)
        .expect("first admitted");
    let second = harness
        .service
        .upload_document(&id, b"segundo archivo".to_vec(), mime::APPLICATION_PDF)
        .expect("second admitted");

    first.await.expect("first task");
    second.await.expect("second task");

    let document = harness.service.document(&id).expect("document");
    assert_eq!(document.state, ValidationState::Validated);
    assert_eq!(
        document.extracted.get("nombre_titular").map(String::as_str),
        Some("Resultado Nuevo")
    );
}

#[tokio::test]
async fn settled_documents_reenter_through_validating() {
    let harness = harness(StubAnalyzer::default().respond(
        IDENTITY_DOCUMENT,
        Ok(consistent(&[("nombre_titular", "Juan Pérez")])),
    ));
    let id = DocumentId::from(IDENTITY_DOCUMENT);

    let handle = harness
        .service
        .upload_document(&id, pdf_bytes(), mime::APPLICATION_PDF)
        .expect("upload admitted");
    handle.await.expect("validation task");
    assert_eq!(
        harness.service.document(&id).expect("document").state,
        ValidationState::Validated
    );

    // Re-upload: observable state immediately after admission is Validating,
    // never a direct hop between terminal states.
    let _handle = harness
        .service
        .upload_document(&id, pdf_bytes(), mime::APPLICATION_PDF)
        .expect("re-upload admitted");
    assert_eq!(
        harness.service.document(&id).expect("document").state,
        ValidationState::Validating
    );
}
