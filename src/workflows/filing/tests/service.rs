use super::common::*;
use crate::workflows::filing::catalog::{IDENTITY_DOCUMENT, TITLE_DOCUMENT};
use crate::workflows::filing::domain::{
    DocumentId, LicenseType, Modality, ProjectStatus, ValidationState,
};
use crate::workflows::filing::engine::OBSERVED_SCORE;
use crate::workflows::filing::service::FormUpdate;
use crate::workflows::filing::storage::ProjectStore;

fn filled_form() -> FormUpdate {
    FormUpdate {
        project_name: Some("Edificio Mirador".to_string()),
        owner: Some("Juan Pérez".to_string()),
        owner_id_number: Some("79.543.210".to_string()),
        address: Some("Calle 45 # 13-25".to_string()),
        registration_number: Some("050C-1234567".to_string()),
        locality: Some("Bosa".to_string()),
        license_type: Some(LicenseType::Construccion),
        modality: Some(Modality::ObraNueva),
        description: Some("Obra nueva de vivienda multifamiliar".to_string()),
    }
}

#[tokio::test]
async fn radicate_attaches_a_report_and_persists_the_project() {
    let harness = harness(StubAnalyzer::default());
    harness.service.update_form(filled_form());

    let project = harness.service.radicate().await.expect("radicated");

    assert_eq!(project.status, ProjectStatus::Filed);
    assert!(project.tracking_number.starts_with("CUR1-BOG-"));
    let report = project.report.as_ref().expect("report attached");
    // Nothing validated yet, so the fallback ruleset observes the filing.
    assert!(!report.approved);
    assert_eq!(report.score, OBSERVED_SCORE);

    let stored = harness.store.list_projects().expect("store reachable");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].tracking_number, project.tracking_number);
    assert!(stored[0].report.is_some());
}

#[tokio::test]
async fn each_filing_gets_its_own_tracking_number_and_report() {
    let harness = harness(StubAnalyzer::default());
    harness.service.update_form(filled_form());

    let first = harness.service.radicate().await.expect("first filing");
    let second = harness.service.radicate().await.expect("second filing");

    assert_ne!(first.tracking_number, second.tracking_number);

    let first_report = first.report.expect("first report");
    let second_report = second.report.expect("second report");
    assert!(second_report.evaluated_at >= first_report.evaluated_at);
}

#[tokio::test]
async fn radicate_snapshot_ignores_documents_that_settle_later() {
    use std::time::Duration;

    let analyzer = PacedAnalyzer::default().when(
        b"%PDF-1.7 stub",
        Duration::from_millis(200),
        consistent(&[("nombre_titular", "Juan Pérez")]),
    );
    let harness = harness(analyzer);
    harness.service.update_form(filled_form());

    let id = DocumentId::from(IDENTITY_DOCUMENT);
    let handle = harness
        .service
        .upload_document(&id, b"%PDF-1.7 stub".to_vec(), mime::APPLICATION_PDF)
        .expect("upload admitted");

    // Filed while the analysis is still in flight: the evaluation sees the
    // document as Validating, and the report is attached regardless.
    assert_eq!(
        harness.service.document(&id).expect("document").state,
        ValidationState::Validating
    );
    let project = harness.service.radicate().await.expect("radicated");
    assert!(project.report.is_some());

    handle.await.expect("validation task");
    assert_eq!(
        harness.service.document(&id).expect("document").state,
        ValidationState::Validated
    );
}

#[tokio::test]
async fn discard_draft_resets_documents_form_and_files() {
    let harness = harness(StubAnalyzer::default().respond(
        TITLE_DOCUMENT,
        Ok(consistent(&[
            ("propietario_titular", "Juan Pérez"),
            ("direccion_predio", "Calle 45 # 13-25"),
            ("matricula_inmobiliaria", "050C-1234567"),
        ])),
    ));
    harness.service.update_form(filled_form());

    let id = DocumentId::from(TITLE_DOCUMENT);
    let handle = harness
        .service
        .upload_document(&id, b"%PDF-1.7 stub".to_vec(), mime::APPLICATION_PDF)
        .expect("upload admitted");
    handle.await.expect("validation task");

    harness.service.discard_draft();

    let document = harness.service.document(&id).expect("catalog document");
    assert_eq!(document.state, ValidationState::Pending);
    assert!(document.extracted.is_empty());

    let form = harness.service.form();
    assert_eq!(form.owner, "");
    assert_eq!(form.project_name, "");
}

#[tokio::test]
async fn form_update_is_partial() {
    let harness = harness(StubAnalyzer::default());
    harness.service.update_form(filled_form());

    let updated = harness.service.update_form(FormUpdate {
        locality: Some("Chapinero".to_string()),
        ..FormUpdate::default()
    });

    assert_eq!(updated.locality, "Chapinero");
    assert_eq!(updated.owner, "Juan Pérez");
    assert_eq!(updated.license_type, Some(LicenseType::Construccion));
}
