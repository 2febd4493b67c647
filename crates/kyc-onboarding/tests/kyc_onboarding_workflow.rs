//! End-to-end scenarios for the onboarding wizard driven through the public service facade
//! and the HTTP router, using a scripted scorer in place of the external capabilities.

mod common {
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    use kyc_onboarding::workflows::kyc::{
        DocumentType, DuplicateCheckResult, ImagePayload, KycOnboardingService, KycSession,
        RepositoryError, Score, ScorerError, SessionId, SessionRepository, SignalScorer,
        UploadOutcome, VerdictConfig,
    };

    #[derive(Default)]
    pub struct MemorySessions {
        sessions: Mutex<HashMap<SessionId, KycSession>>,
    }

    impl SessionRepository for MemorySessions {
        fn insert(&self, session: KycSession) -> Result<KycSession, RepositoryError> {
            let mut guard = self.sessions.lock().expect("repository mutex poisoned");
            if guard.contains_key(session.id()) {
                return Err(RepositoryError::Conflict);
            }
            guard.insert(session.id().clone(), session.clone());
            Ok(session)
        }

        fn fetch(&self, id: &SessionId) -> Result<Option<KycSession>, RepositoryError> {
            Ok(self
                .sessions
                .lock()
                .expect("repository mutex poisoned")
                .get(id)
                .cloned())
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

    /// Replays scripted document scores in call order, then falls back to 90.
    #[derive(Default)]
    pub struct ScriptedScorer {
        scans: Mutex<VecDeque<u8>>,
        uploads: Mutex<VecDeque<UploadOutcome>>,
        face: Mutex<Option<u8>>,
        duplicate: Mutex<Option<DuplicateCheckResult>>,
    }

    impl ScriptedScorer {
        pub fn with_scans(scores: &[u8]) -> Self {
            let scorer = Self::default();
            scorer
                .scans
                .lock()
                .expect("scorer mutex poisoned")
                .extend(scores.iter().copied());
            scorer
        }

        pub fn then_uploads(self, outcomes: &[UploadOutcome]) -> Self {
            self.uploads
                .lock()
                .expect("scorer mutex poisoned")
                .extend(outcomes.iter().copied());
            self
        }

        pub fn with_face(self, value: u8) -> Self {
            *self.face.lock().expect("scorer mutex poisoned") = Some(value);
            self
        }

        pub fn with_duplicate(self, result: DuplicateCheckResult) -> Self {
            *self.duplicate.lock().expect("scorer mutex poisoned") = Some(result);
            self
        }
    }

    fn score(value: u8) -> Result<Score, ScorerError> {
        Score::new(value).map_err(|err| ScorerError::InvalidResult(err.to_string()))
    }

    impl SignalScorer for ScriptedScorer {
        fn document_quality(
            &self,
            _document: DocumentType,
            _image: &ImagePayload,
        ) -> Result<Score, ScorerError> {
            let next = self
                .scans
                .lock()
                .expect("scorer mutex poisoned")
                .pop_front();
            score(next.unwrap_or(90))
        }

        fn face_match(
            &self,
            _live_capture: &ImagePayload,
            _reference_photo: &ImagePayload,
        ) -> Result<Score, ScorerError> {
            score(self.face.lock().expect("scorer mutex poisoned").unwrap_or(90))
        }

        fn duplicate_check(&self) -> Result<DuplicateCheckResult, ScorerError> {
            Ok(self
                .duplicate
                .lock()
                .expect("scorer mutex poisoned")
                .clone()
                .unwrap_or_default())
        }

        fn upload(&self, _documents: &[DocumentType]) -> Result<UploadOutcome, ScorerError> {
            Ok(self
                .uploads
                .lock()
                .expect("scorer mutex poisoned")
                .pop_front()
                .unwrap_or(UploadOutcome::Success))
        }
    }

    pub type Service = KycOnboardingService<MemorySessions, ScriptedScorer>;

    pub fn service(scorer: ScriptedScorer) -> Arc<Service> {
        service_with(scorer, VerdictConfig::default())
    }

    pub fn service_with(scorer: ScriptedScorer, config: VerdictConfig) -> Arc<Service> {
        Arc::new(KycOnboardingService::new(
            Arc::new(MemorySessions::default()),
            Arc::new(scorer),
            config,
        ))
    }

    pub fn image(tag: &str) -> ImagePayload {
        ImagePayload::new(format!("data:image/jpeg;base64,{tag}")).expect("non-empty payload")
    }
}

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use kyc_onboarding::workflows::kyc::{
    kyc_router, DocumentSide, DocumentType, DuplicateCheckResult, FinalStatus, SessionId, Stage,
    UploadOutcome, VerdictConfig, VerdictReason,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{image, service, service_with, ScriptedScorer, Service};

fn walk_to_review(service: &Service) -> SessionId {
    let id = service.start().expect("session starts").session_id;
    service
        .select_document(&id, DocumentSide::Identity, DocumentType::Pan)
        .expect("select PAN");
    service
        .select_document(&id, DocumentSide::Address, DocumentType::Aadhaar)
        .expect("select Aadhaar");
    service.advance(&id).expect("selection passes");
    for side in DocumentSide::ordered() {
        service
            .scan_document(&id, side, image("doc"))
            .expect("scan scored");
    }
    service.advance(&id).expect("scans pass");
    loop {
        let outcome = service.upload_documents(&id).expect("upload attempted");
        if outcome.session.upload_status == UploadOutcome::Success {
            break;
        }
    }
    service.advance(&id).expect("upload passes");
    service
        .capture_live(&id, image("selfie"))
        .expect("capture stored");
    service
        .upload_reference_photo(&id, image("photo"))
        .expect("photo stored");
    service.advance(&id).expect("face gate passes");
    id
}

async fn send(router: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(payload) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(payload.to_string())
        }
        None => Body::empty(),
    };
    let response = router
        .clone()
        .oneshot(request.body(body).expect("request builds"))
        .await
        .expect("route executes");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let payload = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, payload)
}

#[tokio::test]
async fn wizard_runs_end_to_end_over_http() {
    let router = kyc_router(service(ScriptedScorer::with_scans(&[88, 35, 81])));

    let (status, session) = send(&router, "POST", "/api/v1/kyc/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let base = format!(
        "/api/v1/kyc/sessions/{}",
        session["session_id"].as_str().expect("session id")
    );

    let (status, _) = send(
        &router,
        "POST",
        &format!("{base}/documents"),
        Some(json!({ "identity_proof": "PAN", "address_proof": "AADHAAR" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, view) = send(&router, "POST", &format!("{base}/advance"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["stage_number"], 2);

    let scan = json!({ "image": "data:image/jpeg;base64,AAAA" });
    send(&router, "POST", &format!("{base}/scans/identity"), Some(scan.clone())).await;
    let (_, outcome) = send(&router, "POST", &format!("{base}/scans/address"), Some(scan.clone())).await;
    assert_eq!(outcome["session"]["address_score"], 35);

    let (status, blocked) = send(&router, "POST", &format!("{base}/advance"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(blocked["reason"]["code"], "scan_below_quality_bar");
    assert_eq!(blocked["reason"]["attempts_remaining"], 2);

    let (_, rescan) = send(&router, "POST", &format!("{base}/scans/address"), Some(scan)).await;
    assert_eq!(rescan["session"]["attempts"]["scan_address"], 2);
    let (status, _) = send(&router, "POST", &format!("{base}/advance"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, upload) = send(&router, "POST", &format!("{base}/upload"), None).await;
    assert_eq!(upload["session"]["upload_status"], "success");
    send(&router, "POST", &format!("{base}/advance"), None).await;

    let photo = json!({ "image": "data:image/jpeg;base64,BBBB" });
    send(&router, "POST", &format!("{base}/face/live"), Some(photo.clone())).await;
    let (_, view) = send(&router, "POST", &format!("{base}/face/photo"), Some(photo)).await;
    assert_eq!(view["face_match_score"], 90);
    let (_, view) = send(&router, "POST", &format!("{base}/advance"), None).await;
    assert_eq!(view["stage"], "review");

    let (status, _) = send(&router, "POST", &format!("{base}/duplicate-check"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, summary) = send(&router, "POST", &format!("{base}/finalize"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["verdict"]["final_status"], "approved");
    assert_eq!(summary["verdict"]["action"], "Finish");
    assert_eq!(summary["documents"][1]["attempts"], 2);
}

#[test]
fn low_face_match_is_rejected_with_reason() {
    let service = service(ScriptedScorer::default().with_face(42));
    let id = walk_to_review(&service);

    let summary = service.finalize(&id).expect("finalized");

    assert_eq!(summary.verdict.final_status, FinalStatus::Rejected);
    assert_eq!(summary.verdict.reasons, vec![VerdictReason::FaceMismatch]);
    assert_eq!(summary.face_match.label, "Low Match - Failed Match");
}

#[test]
fn flaky_upload_still_completes_and_is_labelled() {
    let scorer = ScriptedScorer::default()
        .then_uploads(&[UploadOutcome::Failed, UploadOutcome::Failed, UploadOutcome::Success]);
    let service = service(scorer);
    let id = walk_to_review(&service);

    let summary = service.review(&id).expect("review");

    assert_eq!(summary.upload_attempts, 3);
    assert_eq!(summary.upload_reliability, "Retried and Completed");
    assert_eq!(summary.verdict.final_status, FinalStatus::Approved);
}

#[test]
fn duplicate_escalation_follows_configuration() {
    let reported = service(
        ScriptedScorer::default().with_duplicate(DuplicateCheckResult::matched("CUST-7781")),
    );
    let id = walk_to_review(&reported);
    reported.check_duplicate(&id).expect("duplicate check");
    let summary = reported.finalize(&id).expect("finalized");
    assert_eq!(summary.verdict.final_status, FinalStatus::Approved);
    assert_eq!(summary.duplicate_check, "Possible duplicate of CUST-7781");

    let escalating = service_with(
        ScriptedScorer::default().with_duplicate(DuplicateCheckResult::matched("CUST-7781")),
        VerdictConfig {
            escalate_duplicates: true,
            ..VerdictConfig::default()
        },
    );
    let id = walk_to_review(&escalating);
    escalating.check_duplicate(&id).expect("duplicate check");
    let summary = escalating.finalize(&id).expect("finalized");
    assert_eq!(summary.verdict.final_status, FinalStatus::ManualReview);
    assert_eq!(summary.verdict.reasons, vec![VerdictReason::PossibleDuplicate]);
}

#[test]
fn live_review_and_final_decision_endpoint_agree() {
    let service = service(ScriptedScorer::with_scans(&[70, 92]).with_face(71));
    let id = walk_to_review(&service);
    let session = service.get(&id).expect("stored");
    assert_eq!(session.stage(), Stage::Review);

    let live = service.review(&id).expect("review");
    let posted = service
        .final_decision(
            serde_json::from_value(json!({
                "identity": { "qualityScore": 70, "status": "manual_review" },
                "address": { "qualityScore": 92, "status": "accepted" },
                "faceMatchScore": 71,
                "uploadStatus": "success",
                "attempts": { "identity": 1, "address": 1 }
            }))
            .expect("payload parses"),
        )
        .expect("consistent payload");

    assert_eq!(live.verdict.final_status, FinalStatus::ManualReview);
    assert_eq!(live.verdict.final_status, posted.final_status);
    assert_eq!(live.verdict.risk_score, posted.risk_score);
    assert_eq!(live.verdict.reasons, posted.reasons);
}
