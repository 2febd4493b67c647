use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{DocumentSide, DocumentType, ImagePayload, SessionId};
use super::repository::{RepositoryError, SessionRepository};
use super::scoring::SignalScorer;
use super::service::{KycOnboardingService, KycServiceError};
use super::session::SessionError;
use super::verdict::FinalDecisionPayload;

type SharedService<R, S> = Arc<KycOnboardingService<R, S>>;

/// Router builder exposing the onboarding wizard and the stateless final decision.
pub fn kyc_router<R, S>(service: SharedService<R, S>) -> Router
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    Router::new()
        .route("/api/v1/kyc/sessions", post(start_handler::<R, S>))
        .route("/api/v1/kyc/sessions/:session_id", get(status_handler::<R, S>))
        .route(
            "/api/v1/kyc/sessions/:session_id/documents",
            post(select_documents_handler::<R, S>),
        )
        .route(
            "/api/v1/kyc/sessions/:session_id/scans/:side",
            post(scan_handler::<R, S>),
        )
        .route(
            "/api/v1/kyc/sessions/:session_id/upload",
            post(upload_handler::<R, S>),
        )
        .route(
            "/api/v1/kyc/sessions/:session_id/face/live",
            post(live_capture_handler::<R, S>).delete(retake_handler::<R, S>),
        )
        .route(
            "/api/v1/kyc/sessions/:session_id/face/photo",
            post(reference_photo_handler::<R, S>),
        )
        .route(
            "/api/v1/kyc/sessions/:session_id/face/match",
            post(face_match_handler::<R, S>),
        )
        .route(
            "/api/v1/kyc/sessions/:session_id/duplicate-check",
            post(duplicate_check_handler::<R, S>),
        )
        .route(
            "/api/v1/kyc/sessions/:session_id/gate",
            get(gate_handler::<R, S>),
        )
        .route(
            "/api/v1/kyc/sessions/:session_id/advance",
            post(advance_handler::<R, S>),
        )
        .route(
            "/api/v1/kyc/sessions/:session_id/retreat",
            post(retreat_handler::<R, S>),
        )
        .route(
            "/api/v1/kyc/sessions/:session_id/review",
            get(review_handler::<R, S>),
        )
        .route(
            "/api/v1/kyc/sessions/:session_id/finalize",
            post(finalize_handler::<R, S>),
        )
        .route(
            "/api/v1/kyc/final-decision",
            post(final_decision_handler::<R, S>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocumentSelection {
    #[serde(default)]
    pub(crate) identity_proof: Option<DocumentType>,
    #[serde(default)]
    pub(crate) address_proof: Option<DocumentType>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageUpload {
    pub(crate) image: ImagePayload,
}

fn respond<T: serde::Serialize>(status: StatusCode, result: Result<T, KycServiceError>) -> Response {
    match result {
        Ok(body) => (status, axum::Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_response(error: KycServiceError) -> Response {
    let (status, payload) = match &error {
        KycServiceError::Session(SessionError::Blocked(block)) => (
            StatusCode::CONFLICT,
            json!({
                "allowed": false,
                "reason": block,
                "error": block.to_string(),
            }),
        ),
        KycServiceError::Session(SessionError::Case(_)) | KycServiceError::Payload(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": error.to_string() }),
        ),
        KycServiceError::Session(SessionError::SignalMismatch { .. }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": error.to_string() }),
        ),
        KycServiceError::Session(_) | KycServiceError::DocumentNotSelected { .. } => (
            StatusCode::CONFLICT,
            json!({ "error": error.to_string() }),
        ),
        KycServiceError::Repository(RepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            json!({ "error": "session not found" }),
        ),
        KycServiceError::Repository(RepositoryError::Conflict) => (
            StatusCode::CONFLICT,
            json!({ "error": "session already exists" }),
        ),
        KycServiceError::Scorer(_) => (
            StatusCode::BAD_GATEWAY,
            json!({ "error": error.to_string() }),
        ),
        KycServiceError::Repository(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": error.to_string() }),
        ),
    };
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn start_handler<R, S>(State(service): State<SharedService<R, S>>) -> Response
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    respond(StatusCode::CREATED, service.start())
}

pub(crate) async fn status_handler<R, S>(
    State(service): State<SharedService<R, S>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    respond(StatusCode::OK, service.status(&SessionId(session_id)))
}

pub(crate) async fn select_documents_handler<R, S>(
    State(service): State<SharedService<R, S>>,
    Path(session_id): Path<String>,
    axum::Json(selection): axum::Json<DocumentSelection>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    let id = SessionId(session_id);
    respond(
        StatusCode::OK,
        service.select_documents(&id, selection.identity_proof, selection.address_proof),
    )
}

pub(crate) async fn scan_handler<R, S>(
    State(service): State<SharedService<R, S>>,
    Path((session_id, side)): Path<(String, DocumentSide)>,
    axum::Json(upload): axum::Json<ImageUpload>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    let id = SessionId(session_id);
    respond(StatusCode::OK, service.scan_document(&id, side, upload.image))
}

pub(crate) async fn upload_handler<R, S>(
    State(service): State<SharedService<R, S>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    respond(
        StatusCode::OK,
        service.upload_documents(&SessionId(session_id)),
    )
}

pub(crate) async fn live_capture_handler<R, S>(
    State(service): State<SharedService<R, S>>,
    Path(session_id): Path<String>,
    axum::Json(upload): axum::Json<ImageUpload>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    let id = SessionId(session_id);
    respond(StatusCode::OK, service.capture_live(&id, upload.image))
}

pub(crate) async fn retake_handler<R, S>(
    State(service): State<SharedService<R, S>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    respond(
        StatusCode::OK,
        service.retake_live_capture(&SessionId(session_id)),
    )
}

pub(crate) async fn reference_photo_handler<R, S>(
    State(service): State<SharedService<R, S>>,
    Path(session_id): Path<String>,
    axum::Json(upload): axum::Json<ImageUpload>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    let id = SessionId(session_id);
    respond(StatusCode::OK, service.upload_reference_photo(&id, upload.image))
}

pub(crate) async fn face_match_handler<R, S>(
    State(service): State<SharedService<R, S>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    respond(
        StatusCode::OK,
        service.request_face_match(&SessionId(session_id)),
    )
}

pub(crate) async fn duplicate_check_handler<R, S>(
    State(service): State<SharedService<R, S>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    respond(
        StatusCode::OK,
        service.check_duplicate(&SessionId(session_id)),
    )
}

pub(crate) async fn gate_handler<R, S>(
    State(service): State<SharedService<R, S>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    respond(StatusCode::OK, service.can_advance(&SessionId(session_id)))
}

pub(crate) async fn advance_handler<R, S>(
    State(service): State<SharedService<R, S>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    respond(StatusCode::OK, service.advance(&SessionId(session_id)))
}

pub(crate) async fn retreat_handler<R, S>(
    State(service): State<SharedService<R, S>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    respond(StatusCode::OK, service.retreat(&SessionId(session_id)))
}

pub(crate) async fn review_handler<R, S>(
    State(service): State<SharedService<R, S>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    respond(StatusCode::OK, service.review(&SessionId(session_id)))
}

pub(crate) async fn finalize_handler<R, S>(
    State(service): State<SharedService<R, S>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    respond(StatusCode::OK, service.finalize(&SessionId(session_id)))
}

pub(crate) async fn final_decision_handler<R, S>(
    State(service): State<SharedService<R, S>>,
    axum::Json(payload): axum::Json<FinalDecisionPayload>,
) -> Response
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    match service.final_decision(payload) {
        Ok(verdict) => {
            let body = json!({
                "final_status": verdict.final_status,
                "status_label": verdict.final_status.label(),
                "risk_score": verdict.risk_score,
                "reasons": verdict.reasons,
                "duplicate_flagged": verdict.duplicate_flagged,
            });
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(error) => error_response(error),
    }
}
