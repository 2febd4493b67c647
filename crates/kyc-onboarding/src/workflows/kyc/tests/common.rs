use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::kyc::case::KycCase;
use crate::workflows::kyc::domain::{
    DocumentSide, DocumentType, DuplicateCheckResult, ImagePayload, Score, SessionId,
    UploadOutcome,
};
use crate::workflows::kyc::repository::{RepositoryError, SessionRepository};
use crate::workflows::kyc::scoring::{ScorerError, SignalScorer};
use crate::workflows::kyc::session::KycSession;
use crate::workflows::kyc::verdict::VerdictConfig;
use crate::workflows::kyc::{kyc_router, KycOnboardingService};

pub(super) fn score(value: u8) -> Score {
    Score::new(value).expect("valid score")
}

pub(super) fn image(tag: &str) -> ImagePayload {
    ImagePayload::new(format!("data:image/jpeg;base64,{tag}")).expect("non-empty payload")
}

/// Case that already satisfies every gate with the given scores.
pub(super) fn scored_case(identity: u8, address: u8, face: Option<u8>) -> KycCase {
    let mut case = KycCase::new();
    case.select_document(DocumentSide::Identity, DocumentType::Pan)
        .expect("PAN is an identity option");
    case.select_document(DocumentSide::Address, DocumentType::Aadhaar)
        .expect("Aadhaar is an address option");
    case.record_scan(DocumentSide::Identity, score(identity));
    case.record_scan(DocumentSide::Address, score(address));
    case.record_upload(UploadOutcome::Success)
        .expect("finished upload");
    case.set_live_capture(image("live"));
    case.set_reference_photo(image("reference"));
    if let Some(face) = face {
        case.record_face_match(score(face))
            .expect("photos present");
    }
    case
}

/// Deterministic scorer. Queued results are consumed first, then the defaults apply.
#[derive(Default)]
pub(super) struct StubScorer {
    identity_scores: Mutex<VecDeque<Result<Score, ScorerError>>>,
    address_scores: Mutex<VecDeque<Result<Score, ScorerError>>>,
    uploads: Mutex<VecDeque<Result<UploadOutcome, ScorerError>>>,
    face_scores: Mutex<VecDeque<Result<Score, ScorerError>>>,
    duplicate: Mutex<Option<DuplicateCheckResult>>,
    calls: Mutex<Vec<&'static str>>,
}

impl StubScorer {
    pub(super) fn queue_scan(&self, side: DocumentSide, result: Result<Score, ScorerError>) {
        let queue = match side {
            DocumentSide::Identity => &self.identity_scores,
            DocumentSide::Address => &self.address_scores,
        };
        queue.lock().expect("scorer mutex poisoned").push_back(result);
    }

    pub(super) fn queue_upload(&self, result: Result<UploadOutcome, ScorerError>) {
        self.uploads
            .lock()
            .expect("scorer mutex poisoned")
            .push_back(result);
    }

    pub(super) fn queue_face(&self, result: Result<Score, ScorerError>) {
        self.face_scores
            .lock()
            .expect("scorer mutex poisoned")
            .push_back(result);
    }

    pub(super) fn set_duplicate(&self, result: DuplicateCheckResult) {
        *self.duplicate.lock().expect("scorer mutex poisoned") = Some(result);
    }

    pub(super) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("scorer mutex poisoned").clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().expect("scorer mutex poisoned").push(call);
    }
}

impl SignalScorer for StubScorer {
    fn document_quality(
        &self,
        document: DocumentType,
        _image: &ImagePayload,
    ) -> Result<Score, ScorerError> {
        self.record("document_quality");
        let queue = match document {
            DocumentType::Pan | DocumentType::Passport => &self.identity_scores,
            DocumentType::Aadhaar | DocumentType::VoterId => &self.address_scores,
        };
        queue
            .lock()
            .expect("scorer mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(score(85)))
    }

    fn face_match(
        &self,
        _live_capture: &ImagePayload,
        _reference_photo: &ImagePayload,
    ) -> Result<Score, ScorerError> {
        self.record("face_match");
        self.face_scores
            .lock()
            .expect("scorer mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(score(90)))
    }

    fn duplicate_check(&self) -> Result<DuplicateCheckResult, ScorerError> {
        self.record("duplicate_check");
        Ok(self
            .duplicate
            .lock()
            .expect("scorer mutex poisoned")
            .clone()
            .unwrap_or_default())
    }

    fn upload(&self, _documents: &[DocumentType]) -> Result<UploadOutcome, ScorerError> {
        self.record("upload");
        self.uploads
            .lock()
            .expect("scorer mutex poisoned")
            .pop_front()
            .unwrap_or(Ok(UploadOutcome::Success))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) sessions: Arc<Mutex<HashMap<SessionId, KycSession>>>,
}

impl SessionRepository for MemoryRepository {
    fn insert(&self, session: KycSession) -> Result<KycSession, RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        if guard.contains_key(session.id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id().clone(), session.clone());
        Ok(session)
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<KycSession>, RepositoryError> {
        let guard = self.sessions.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn modify<T, F>(&self, id: &SessionId, apply: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut KycSession) -> T,
    {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        let session = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        Ok(apply(session))
    }
}

pub(super) struct UnavailableRepository;

impl SessionRepository for UnavailableRepository {
    fn insert(&self, _session: KycSession) -> Result<KycSession, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<KycSession>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn modify<T, F>(&self, _id: &SessionId, _apply: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut KycSession) -> T,
    {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) type TestService = KycOnboardingService<MemoryRepository, StubScorer>;

pub(super) fn build_service() -> (TestService, Arc<MemoryRepository>, Arc<StubScorer>) {
    build_service_with(VerdictConfig::default())
}

pub(super) fn build_service_with(
    config: VerdictConfig,
) -> (TestService, Arc<MemoryRepository>, Arc<StubScorer>) {
    let repository = Arc::new(MemoryRepository::default());
    let scorer = Arc::new(StubScorer::default());
    let service = KycOnboardingService::new(repository.clone(), scorer.clone(), config);
    (service, repository, scorer)
}

/// Walk a fresh session through selection, scans and upload to the face-match stage.
pub(super) fn session_at_face_match(service: &TestService) -> SessionId {
    let id = service.start().expect("session starts").session_id;
    service
        .select_document(&id, DocumentSide::Identity, DocumentType::Pan)
        .expect("select PAN");
    service
        .select_document(&id, DocumentSide::Address, DocumentType::Aadhaar)
        .expect("select Aadhaar");
    service.advance(&id).expect("selection gate passes");
    service
        .scan_document(&id, DocumentSide::Identity, image("pan"))
        .expect("identity scan");
    service
        .scan_document(&id, DocumentSide::Address, image("aadhaar"))
        .expect("address scan");
    service.advance(&id).expect("scan gate passes");
    service.upload_documents(&id).expect("upload completes");
    service.advance(&id).expect("upload gate passes");
    id
}

pub(super) fn session_at_review(service: &TestService) -> SessionId {
    let id = session_at_face_match(service);
    service
        .capture_live(&id, image("selfie"))
        .expect("live capture stored");
    service
        .upload_reference_photo(&id, image("photo"))
        .expect("reference photo stored");
    service.advance(&id).expect("face gate passes");
    id
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    kyc_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
