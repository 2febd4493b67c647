use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::attempts::AttemptBudget;
use super::case::CaseError;
use super::domain::{DocumentSide, DocumentType, ImagePayload, SessionId, UploadOutcome};
use super::gate::{GateDecision, StageGate};
use super::repository::{RepositoryError, SessionRepository};
use super::review::ReviewSummary;
use super::scoring::{ScorerError, SignalScorer};
use super::session::{
    DiscardReason, EventDisposition, KycSession, ScoringEvent, SessionError, SessionStatusView,
    Signal, SignalKind, SignalTicket,
};
use super::verdict::{FinalDecisionPayload, PayloadError, Verdict, VerdictAggregator, VerdictConfig};

/// Service composing the session store, the external scorer, the stage gate and the
/// verdict aggregator.
pub struct KycOnboardingService<R, S> {
    repository: Arc<R>,
    scorer: Arc<S>,
    gate: StageGate,
    aggregator: VerdictAggregator,
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("kyc-{id:06}"))
}

/// Result of a scorer round trip together with the refreshed session view.
#[derive(Debug, Clone, Serialize)]
pub struct SignalOutcome {
    #[serde(flatten)]
    pub disposition: EventDisposition,
    pub session: SessionStatusView,
}

impl<R, S> KycOnboardingService<R, S>
where
    R: SessionRepository + 'static,
    S: SignalScorer + 'static,
{
    pub fn new(repository: Arc<R>, scorer: Arc<S>, config: VerdictConfig) -> Self {
        let budget = AttemptBudget::with_max_attempts(config.max_attempts);
        Self {
            repository,
            scorer,
            gate: StageGate::new(budget),
            aggregator: VerdictAggregator::new(config),
        }
    }

    pub fn gate(&self) -> &StageGate {
        &self.gate
    }

    pub fn aggregator(&self) -> &VerdictAggregator {
        &self.aggregator
    }

    /// Open a fresh session at the document selection stage.
    pub fn start(&self) -> Result<SessionStatusView, KycServiceError> {
        let session = self.repository.insert(KycSession::new(next_session_id()))?;
        info!(session = %session.id(), "kyc session started");
        Ok(session.status_view(&self.gate))
    }

    pub fn get(&self, id: &SessionId) -> Result<KycSession, KycServiceError> {
        let session = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(session)
    }

    pub fn status(&self, id: &SessionId) -> Result<SessionStatusView, KycServiceError> {
        Ok(self.get(id)?.status_view(&self.gate))
    }

    pub fn can_advance(&self, id: &SessionId) -> Result<GateDecision, KycServiceError> {
        Ok(self.get(id)?.can_advance(&self.gate))
    }

    pub fn select_document(
        &self,
        id: &SessionId,
        side: DocumentSide,
        document: DocumentType,
    ) -> Result<SessionStatusView, KycServiceError> {
        self.mutate(id, |session| session.select_document(side, document))?;
        debug!(session = %id, %side, document = document.code(), "document selected");
        self.status(id)
    }

    /// Record both slot choices in one step; an invalid choice leaves the session as it was.
    pub fn select_documents(
        &self,
        id: &SessionId,
        identity: Option<DocumentType>,
        address: Option<DocumentType>,
    ) -> Result<SessionStatusView, KycServiceError> {
        self.mutate(id, |session| session.select_documents(identity, address))?;
        debug!(
            session = %id,
            identity = ?identity,
            address = ?address,
            "documents selected"
        );
        self.status(id)
    }

    /// Score one scanned document and count the attempt.
    pub fn scan_document(
        &self,
        id: &SessionId,
        side: DocumentSide,
        image: ImagePayload,
    ) -> Result<SignalOutcome, KycServiceError> {
        let gate = self.gate;
        let (ticket, document) = self.mutate(id, |session| -> Result<_, KycServiceError> {
            let ticket = session.begin(SignalKind::scan(side), &gate.budget())?;
            match session.case().document(side) {
                Some(document) => Ok((ticket, document)),
                None => {
                    session.release(ticket);
                    Err(KycServiceError::DocumentNotSelected { side })
                }
            }
        })?;

        let score = match self.scorer.document_quality(document, &image) {
            Ok(score) => score,
            Err(err) => return Err(self.abandon(id, ticket, err)),
        };

        info!(session = %id, %side, score = score.value(), "document scan scored");
        self.complete(id, ticket, Signal::Scan { side, score })
    }

    /// Transfer the selected documents. Scorer failures count as a failed attempt.
    pub fn upload_documents(&self, id: &SessionId) -> Result<SignalOutcome, KycServiceError> {
        let gate = self.gate;
        let (ticket, documents) = self.mutate(id, |session| {
            let ticket = session.begin(SignalKind::Upload, &gate.budget())?;
            let documents: Vec<DocumentType> =
                session.case().selected_documents().into_iter().collect();
            Ok::<_, SessionError>((ticket, documents))
        })?;

        let outcome = match self.scorer.upload(&documents) {
            Ok(UploadOutcome::Success) => UploadOutcome::Success,
            Ok(outcome) => {
                warn!(session = %id, ?outcome, "upload finished without success");
                UploadOutcome::Failed
            }
            Err(err) => {
                warn!(session = %id, error = %err, "upload transport failed");
                UploadOutcome::Failed
            }
        };

        self.complete(id, ticket, Signal::Upload { outcome })
    }

    /// Store the live selfie and, once both photos exist, request a face match.
    pub fn capture_live(
        &self,
        id: &SessionId,
        image: ImagePayload,
    ) -> Result<SessionStatusView, KycServiceError> {
        self.mutate(id, |session| session.set_live_capture(image))?;
        self.match_if_ready(id)
    }

    pub fn upload_reference_photo(
        &self,
        id: &SessionId,
        image: ImagePayload,
    ) -> Result<SessionStatusView, KycServiceError> {
        self.mutate(id, |session| session.set_reference_photo(image))?;
        self.match_if_ready(id)
    }

    pub fn retake_live_capture(&self, id: &SessionId) -> Result<SessionStatusView, KycServiceError> {
        self.mutate(id, |session| session.retake_live_capture())?;
        debug!(session = %id, "live capture cleared for retake");
        self.status(id)
    }

    pub fn request_face_match(&self, id: &SessionId) -> Result<SignalOutcome, KycServiceError> {
        let gate = self.gate;
        let (ticket, live, reference) = self.mutate(id, |session| -> Result<_, SessionError> {
            let ticket = session.begin(SignalKind::FaceMatch, &gate.budget())?;
            let live = session.case().live_capture().cloned();
            let reference = session.case().reference_photo().cloned();
            match (live, reference) {
                (Some(live), Some(reference)) => Ok((ticket, live, reference)),
                _ => {
                    session.release(ticket);
                    Err(SessionError::Case(CaseError::FacePhotosMissing))
                }
            }
        })?;

        let score = match self.scorer.face_match(&live, &reference) {
            Ok(score) => score,
            Err(err) => return Err(self.abandon(id, ticket, err)),
        };

        info!(session = %id, score = score.value(), "face match scored");
        self.complete(id, ticket, Signal::FaceMatch { score })
    }

    pub fn check_duplicate(&self, id: &SessionId) -> Result<SignalOutcome, KycServiceError> {
        let gate = self.gate;
        let ticket = self.mutate(id, |session| {
            session.begin(SignalKind::DuplicateCheck, &gate.budget())
        })?;

        let result = match self.scorer.duplicate_check() {
            Ok(result) => result,
            Err(err) => return Err(self.abandon(id, ticket, err)),
        };

        if result.duplicate {
            warn!(session = %id, matched = ?result.matched_customer_id, "possible duplicate customer");
        }
        self.complete(id, ticket, Signal::DuplicateCheck { result })
    }

    /// Deliver a completion produced outside the request cycle.
    pub fn deliver(&self, event: ScoringEvent) -> Result<EventDisposition, KycServiceError> {
        let kind = event.ticket.kind;
        let id = event.session_id.clone();
        match self.repository.modify(&id, |session| session.apply(event)) {
            Ok(result) => {
                let disposition = result?;
                log_disposition(&id, &disposition);
                Ok(disposition)
            }
            Err(RepositoryError::NotFound) => {
                warn!(session = %id, ?kind, "event for unknown session discarded");
                Ok(EventDisposition::Discarded {
                    kind,
                    reason: DiscardReason::ForeignSession,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn advance(&self, id: &SessionId) -> Result<SessionStatusView, KycServiceError> {
        let gate = self.gate;
        let stage = self.mutate(id, |session| session.advance(&gate))?;
        info!(session = %id, stage = stage.label(), "stage advanced");
        self.status(id)
    }

    pub fn retreat(&self, id: &SessionId) -> Result<SessionStatusView, KycServiceError> {
        let gate = self.gate;
        let stage = self.mutate(id, |session| session.retreat(&gate))?;
        debug!(session = %id, stage = stage.label(), "stage retreated");
        self.status(id)
    }

    /// Current verdict and review summary without freezing the case.
    pub fn review(&self, id: &SessionId) -> Result<ReviewSummary, KycServiceError> {
        let session = self.get(id)?;
        let verdict = session.review(&self.aggregator);
        Ok(ReviewSummary::build(session.case(), &verdict))
    }

    /// Freeze the session and return the verdict it was closed with.
    pub fn finalize(&self, id: &SessionId) -> Result<ReviewSummary, KycServiceError> {
        let aggregator = self.aggregator;
        let verdict = self.mutate(id, |session| session.finalize(&aggregator))?;
        info!(
            session = %id,
            status = verdict.final_status.label(),
            risk = verdict.risk_score,
            "kyc session finalized"
        );
        let session = self.get(id)?;
        Ok(ReviewSummary::build(session.case(), &verdict))
    }

    /// Stateless adjudication of a case summarized by an external caller.
    pub fn final_decision(&self, payload: FinalDecisionPayload) -> Result<Verdict, KycServiceError> {
        let verdict = self.aggregator.decide_payload(payload)?;
        info!(
            status = verdict.final_status.label(),
            risk = verdict.risk_score,
            "final decision computed"
        );
        Ok(verdict)
    }

    fn mutate<T, E, F>(&self, id: &SessionId, apply: F) -> Result<T, KycServiceError>
    where
        F: FnOnce(&mut KycSession) -> Result<T, E>,
        KycServiceError: From<E>,
    {
        let result = self.repository.modify(id, apply)?;
        Ok(result?)
    }

    fn complete(
        &self,
        id: &SessionId,
        ticket: SignalTicket,
        signal: Signal,
    ) -> Result<SignalOutcome, KycServiceError> {
        let event = ScoringEvent {
            session_id: id.clone(),
            ticket,
            signal,
        };
        let gate = self.gate;
        let (disposition, session) = self.mutate(id, |session| {
            let disposition = session.apply(event)?;
            Ok::<_, SessionError>((disposition, session.status_view(&gate)))
        })?;
        log_disposition(id, &disposition);
        Ok(SignalOutcome {
            disposition,
            session,
        })
    }

    fn match_if_ready(&self, id: &SessionId) -> Result<SessionStatusView, KycServiceError> {
        let session = self.get(id)?;
        if !session.case().has_face_photos() || session.case().face_match().is_some() {
            return Ok(session.status_view(&self.gate));
        }

        match self.request_face_match(id) {
            Ok(outcome) => Ok(outcome.session),
            Err(KycServiceError::Scorer(err)) => {
                warn!(session = %id, error = %err, "face match deferred");
                self.status(id)
            }
            Err(err) => Err(err),
        }
    }

    fn abandon(&self, id: &SessionId, ticket: SignalTicket, err: ScorerError) -> KycServiceError {
        warn!(session = %id, kind = ?ticket.kind, error = %err, "scorer request failed");
        if let Err(release_err) = self.repository.modify(id, |session| session.release(ticket)) {
            return release_err.into();
        }
        err.into()
    }
}

fn log_disposition(id: &SessionId, disposition: &EventDisposition) {
    match disposition {
        EventDisposition::Applied { kind, attempts } => {
            debug!(session = %id, ?kind, ?attempts, "scoring event applied");
        }
        EventDisposition::Discarded { kind, reason } => {
            warn!(session = %id, ?kind, ?reason, "scoring event discarded");
        }
    }
}

/// Error raised by the onboarding service.
#[derive(Debug, thiserror::Error)]
pub enum KycServiceError {
    #[error("select a {side} document before scanning it")]
    DocumentNotSelected { side: DocumentSide },
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Scorer(#[from] ScorerError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
}
