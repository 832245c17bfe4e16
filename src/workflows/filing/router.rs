use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;

use super::autofill::NoticePublisher;
use super::domain::DocumentId;
use super::engine::CrossValidator;
use super::extraction::DocumentAnalyzer;
use super::service::{DocumentStatusView, FilingError, FilingService, FormUpdate};
use super::storage::ProjectStore;
use super::validation::{UploadError, MAX_UPLOAD_BYTES};

/// Router builder exposing the filing endpoints consumed by the wizard.
pub fn filing_router<A, C, S, N>(service: Arc<FilingService<A, C, S, N>>) -> Router
where
    A: DocumentAnalyzer + 'static,
    C: CrossValidator + 'static,
    S: ProjectStore + 'static,
    N: NoticePublisher + 'static,
{
    Router::new()
        .route("/api/v1/filing/documents", get(documents_handler::<A, C, S, N>))
        .route(
            "/api/v1/filing/documents/:document_id",
            post(upload_handler::<A, C, S, N>).get(document_handler::<A, C, S, N>),
        )
        .route(
            "/api/v1/filing/form",
            get(form_handler::<A, C, S, N>).put(update_form_handler::<A, C, S, N>),
        )
        .route("/api/v1/filing/radicate", post(radicate_handler::<A, C, S, N>))
        .route("/api/v1/filing/projects", get(projects_handler::<A, C, S, N>))
        .route("/api/v1/filing/draft", delete(discard_handler::<A, C, S, N>))
        // Raised past the document size cap so oversize uploads reach the
        // admission check and settle as the service's own 413, not the
        // framework default of 2 MB.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 1024))
        .with_state(service)
}

fn declared_media_type(headers: &HeaderMap) -> mime::Mime {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

pub(crate) async fn upload_handler<A, C, S, N>(
    State(service): State<Arc<FilingService<A, C, S, N>>>,
    Path(document_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    A: DocumentAnalyzer + 'static,
    C: CrossValidator + 'static,
    S: ProjectStore + 'static,
    N: NoticePublisher + 'static,
{
    let id = DocumentId(document_id);
    let media_type = declared_media_type(&headers);

    match service.upload_document(&id, body.to_vec(), media_type) {
        Ok(_handle) => match service.document(&id) {
            Some(document) => (
                StatusCode::ACCEPTED,
                Json(DocumentStatusView::from_record(&document)),
            )
                .into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        Err(FilingError::Upload(UploadError::SizeExceeded { limit, actual })) => {
            let payload = json!({
                "error": format!("file of {actual} bytes exceeds the {limit} byte limit"),
            });
            (StatusCode::PAYLOAD_TOO_LARGE, Json(payload)).into_response()
        }
        Err(FilingError::Upload(UploadError::UnknownDocument(id))) => {
            let payload = json!({ "error": format!("unknown document '{id}'") });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn document_handler<A, C, S, N>(
    State(service): State<Arc<FilingService<A, C, S, N>>>,
    Path(document_id): Path<String>,
) -> Response
where
    A: DocumentAnalyzer + 'static,
    C: CrossValidator + 'static,
    S: ProjectStore + 'static,
    N: NoticePublisher + 'static,
{
    let id = DocumentId(document_id);
    match service.document(&id) {
        Some(document) => (
            StatusCode::OK,
            Json(DocumentStatusView::from_record(&document)),
        )
            .into_response(),
        None => {
            let payload = json!({ "error": format!("unknown document '{}'", id.as_str()) });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn documents_handler<A, C, S, N>(
    State(service): State<Arc<FilingService<A, C, S, N>>>,
) -> Response
where
    A: DocumentAnalyzer + 'static,
    C: CrossValidator + 'static,
    S: ProjectStore + 'static,
    N: NoticePublisher + 'static,
{
    let views: Vec<DocumentStatusView> = service
        .documents()
        .iter()
        .map(DocumentStatusView::from_record)
        .collect();
    (StatusCode::OK, Json(views)).into_response()
}

pub(crate) async fn form_handler<A, C, S, N>(
    State(service): State<Arc<FilingService<A, C, S, N>>>,
) -> Response
where
    A: DocumentAnalyzer + 'static,
    C: CrossValidator + 'static,
    S: ProjectStore + 'static,
    N: NoticePublisher + 'static,
{
    (StatusCode::OK, Json(service.form())).into_response()
}

pub(crate) async fn update_form_handler<A, C, S, N>(
    State(service): State<Arc<FilingService<A, C, S, N>>>,
    Json(update): Json<FormUpdate>,
) -> Response
where
    A: DocumentAnalyzer + 'static,
    C: CrossValidator + 'static,
    S: ProjectStore + 'static,
    N: NoticePublisher + 'static,
{
    (StatusCode::OK, Json(service.update_form(update))).into_response()
}

pub(crate) async fn radicate_handler<A, C, S, N>(
    State(service): State<Arc<FilingService<A, C, S, N>>>,
) -> Response
where
    A: DocumentAnalyzer + 'static,
    C: CrossValidator + 'static,
    S: ProjectStore + 'static,
    N: NoticePublisher + 'static,
{
    match service.radicate().await {
        Ok(project) => (StatusCode::OK, Json(project)).into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn projects_handler<A, C, S, N>(
    State(service): State<Arc<FilingService<A, C, S, N>>>,
) -> Response
where
    A: DocumentAnalyzer + 'static,
    C: CrossValidator + 'static,
    S: ProjectStore + 'static,
    N: NoticePublisher + 'static,
{
    match service.list_projects() {
        Ok(projects) => (StatusCode::OK, Json(projects)).into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn discard_handler<A, C, S, N>(
    State(service): State<Arc<FilingService<A, C, S, N>>>,
) -> Response
where
    A: DocumentAnalyzer + 'static,
    C: CrossValidator + 'static,
    S: ProjectStore + 'static,
    N: NoticePublisher + 'static,
{
    service.discard_draft();
    StatusCode::NO_CONTENT.into_response()
}
