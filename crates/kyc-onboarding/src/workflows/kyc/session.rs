//! One customer's walk through the wizard: the owned case, the current stage, and the
//! bookkeeping that keeps asynchronous scorer completions honest.
//!
//! Every scorer call is bracketed by a [`SignalTicket`]. A completion is applied only
//! while its ticket is still the outstanding one for that signal kind, so late,
//! duplicated, or navigated-away results are discarded and an attempt counter moves at
//! most once per ticket.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attempts::AttemptBudget;
use super::case::{CaseError, KycCase};
use super::domain::{
    DocumentSide, DocumentType, DuplicateCheckResult, ImagePayload, Score, SessionId, SubTask,
    UploadOutcome,
};
use super::gate::{GateBlock, GateDecision, Stage, StageGate};
use super::verdict::{Verdict, VerdictAggregator};

/// Asynchronous signal a session may be waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    IdentityScan,
    AddressScan,
    Upload,
    FaceMatch,
    DuplicateCheck,
}

impl SignalKind {
    pub const fn scan(side: DocumentSide) -> Self {
        match side {
            DocumentSide::Identity => Self::IdentityScan,
            DocumentSide::Address => Self::AddressScan,
        }
    }

    /// Stage on which the signal is normally requested.
    pub const fn home_stage(self) -> Stage {
        match self {
            Self::IdentityScan | Self::AddressScan => Stage::DocumentScan,
            Self::Upload => Stage::DocumentUpload,
            Self::FaceMatch => Stage::FaceMatch,
            Self::DuplicateCheck => Stage::Review,
        }
    }

    /// Face-match scores may still land once the customer reaches review.
    pub fn accepted_at(self, stage: Stage) -> bool {
        match self {
            Self::FaceMatch => matches!(stage, Stage::FaceMatch | Stage::Review),
            other => other.home_stage() == stage,
        }
    }
}

/// Proof that a scorer request was started for the current state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalTicket {
    pub kind: SignalKind,
    pub sequence: u64,
}

/// Result delivered by an external scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    Scan { side: DocumentSide, score: Score },
    Upload { outcome: UploadOutcome },
    FaceMatch { score: Score },
    DuplicateCheck { result: DuplicateCheckResult },
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Self::Scan { side, .. } => SignalKind::scan(*side),
            Self::Upload { .. } => SignalKind::Upload,
            Self::FaceMatch { .. } => SignalKind::FaceMatch,
            Self::DuplicateCheck { .. } => SignalKind::DuplicateCheck,
        }
    }
}

/// Completion event addressed to a specific session and ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringEvent {
    pub session_id: SessionId,
    pub ticket: SignalTicket,
    pub signal: Signal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    ForeignSession,
    StaleTicket,
    Finalized,
}

/// What happened to a delivered event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "disposition", rename_all = "snake_case")]
pub enum EventDisposition {
    Applied {
        kind: SignalKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        attempts: Option<u32>,
    },
    Discarded {
        kind: SignalKind,
        reason: DiscardReason,
    },
}

impl EventDisposition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session has been finalized and can no longer change")]
    Finalized,
    #[error("this action belongs to the {expected} stage, session is at {actual}")]
    StageMismatch { expected: Stage, actual: Stage },
    #[error("a {kind:?} request is already in flight")]
    AttemptInFlight { kind: SignalKind },
    #[error("{side} scan budget exhausted after {attempts} attempt(s)")]
    AttemptBudgetExhausted { side: DocumentSide, attempts: u32 },
    #[error("documents have already been uploaded successfully")]
    UploadAlreadySucceeded,
    #[error("signal {signal:?} does not match ticket for {ticket:?}")]
    SignalMismatch {
        ticket: SignalKind,
        signal: SignalKind,
    },
    #[error(transparent)]
    Blocked(#[from] GateBlock),
    #[error(transparent)]
    Case(#[from] CaseError),
}

/// Owned wizard state for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycSession {
    id: SessionId,
    stage: Stage,
    case: KycCase,
    pending: BTreeMap<SignalKind, u64>,
    next_sequence: u64,
    verdict_recorded: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl KycSession {
    pub fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            stage: Stage::DocumentSelection,
            case: KycCase::new(),
            pending: BTreeMap::new(),
            next_sequence: 1,
            verdict_recorded: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn case(&self) -> &KycCase {
        &self.case
    }

    pub fn is_finalized(&self) -> bool {
        self.verdict_recorded
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn pending(&self) -> Vec<SignalKind> {
        self.pending.keys().copied().collect()
    }

    pub fn select_document(
        &mut self,
        side: DocumentSide,
        document: DocumentType,
    ) -> Result<(), SessionError> {
        self.ensure_stage(Stage::DocumentSelection)?;
        self.case.select_document(side, document)?;
        self.touch();
        Ok(())
    }

    /// Apply both slot choices, or neither if any choice is not offered for its slot.
    pub fn select_documents(
        &mut self,
        identity: Option<DocumentType>,
        address: Option<DocumentType>,
    ) -> Result<(), SessionError> {
        self.ensure_stage(Stage::DocumentSelection)?;
        let choices: Vec<(DocumentSide, DocumentType)> = [
            (DocumentSide::Identity, identity),
            (DocumentSide::Address, address),
        ]
        .into_iter()
        .filter_map(|(side, document)| document.map(|document| (side, document)))
        .collect();

        if let Some(&(side, document)) = choices
            .iter()
            .find(|(side, document)| !side.offers(*document))
        {
            return Err(CaseError::DocumentNotOffered { side, document }.into());
        }

        for (side, document) in choices {
            self.case.select_document(side, document)?;
        }
        self.touch();
        Ok(())
    }

    pub fn set_live_capture(&mut self, image: ImagePayload) -> Result<(), SessionError> {
        self.ensure_stage(Stage::FaceMatch)?;
        self.case.set_live_capture(image);
        self.pending.remove(&SignalKind::FaceMatch);
        self.touch();
        Ok(())
    }

    pub fn set_reference_photo(&mut self, image: ImagePayload) -> Result<(), SessionError> {
        self.ensure_stage(Stage::FaceMatch)?;
        self.case.set_reference_photo(image);
        self.pending.remove(&SignalKind::FaceMatch);
        self.touch();
        Ok(())
    }

    /// Drop the live capture and any face-match request computed from it.
    pub fn retake_live_capture(&mut self) -> Result<(), SessionError> {
        self.ensure_stage(Stage::FaceMatch)?;
        self.case.retake_live_capture();
        self.pending.remove(&SignalKind::FaceMatch);
        self.touch();
        Ok(())
    }

    /// Reserve the right to apply one result of `kind`.
    pub fn begin(
        &mut self,
        kind: SignalKind,
        budget: &AttemptBudget,
    ) -> Result<SignalTicket, SessionError> {
        self.ensure_open()?;
        if !kind.accepted_at(self.stage) {
            return Err(SessionError::StageMismatch {
                expected: kind.home_stage(),
                actual: self.stage,
            });
        }
        if self.pending.contains_key(&kind) {
            return Err(SessionError::AttemptInFlight { kind });
        }

        match kind {
            SignalKind::IdentityScan | SignalKind::AddressScan => {
                let side = if kind == SignalKind::IdentityScan {
                    DocumentSide::Identity
                } else {
                    DocumentSide::Address
                };
                let attempts = self.case.scan_attempts(side);
                if budget.is_exhausted(attempts) {
                    return Err(SessionError::AttemptBudgetExhausted { side, attempts });
                }
            }
            SignalKind::Upload => {
                if self.case.upload_outcome() == UploadOutcome::Success {
                    return Err(SessionError::UploadAlreadySucceeded);
                }
            }
            SignalKind::FaceMatch => {
                if !self.case.has_face_photos() {
                    return Err(CaseError::FacePhotosMissing.into());
                }
            }
            SignalKind::DuplicateCheck => {}
        }

        let ticket = SignalTicket {
            kind,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.pending.insert(kind, ticket.sequence);
        Ok(ticket)
    }

    /// Give up on an outstanding request without touching the case.
    pub fn release(&mut self, ticket: SignalTicket) -> bool {
        if self.pending.get(&ticket.kind) == Some(&ticket.sequence) {
            self.pending.remove(&ticket.kind);
            true
        } else {
            false
        }
    }

    pub fn apply(&mut self, event: ScoringEvent) -> Result<EventDisposition, SessionError> {
        let ScoringEvent {
            session_id,
            ticket,
            signal,
        } = event;
        let kind = ticket.kind;

        if signal.kind() != kind {
            return Err(SessionError::SignalMismatch {
                ticket: kind,
                signal: signal.kind(),
            });
        }
        if session_id != self.id {
            return Ok(discarded(kind, DiscardReason::ForeignSession));
        }
        if self.verdict_recorded {
            return Ok(discarded(kind, DiscardReason::Finalized));
        }
        if self.pending.get(&kind) != Some(&ticket.sequence) {
            return Ok(discarded(kind, DiscardReason::StaleTicket));
        }

        let attempts = match signal {
            Signal::Scan { side, score } => Some(self.case.record_scan(side, score)),
            Signal::Upload { outcome } => Some(self.case.record_upload(outcome)?),
            Signal::FaceMatch { score } => {
                self.case.record_face_match(score)?;
                None
            }
            Signal::DuplicateCheck { result } => {
                self.case.record_duplicate_check(result);
                None
            }
        };

        self.pending.remove(&kind);
        self.touch();
        Ok(EventDisposition::Applied { kind, attempts })
    }

    pub fn advance(&mut self, gate: &StageGate) -> Result<Stage, SessionError> {
        self.ensure_open()?;
        let next = gate.advance(self.stage, &self.case)?;
        self.move_to(next);
        Ok(next)
    }

    pub fn retreat(&mut self, gate: &StageGate) -> Result<Stage, SessionError> {
        self.ensure_open()?;
        let previous = gate.retreat(self.stage);
        self.move_to(previous);
        Ok(previous)
    }

    pub fn can_advance(&self, gate: &StageGate) -> GateDecision {
        gate.can_advance(self.stage, &self.case)
    }

    /// Verdict for the current snapshot; never mutates the session.
    pub fn review(&self, aggregator: &VerdictAggregator) -> Verdict {
        aggregator.decide_case(&self.case)
    }

    /// Freeze the case at the review stage and return its verdict.
    pub fn finalize(&mut self, aggregator: &VerdictAggregator) -> Result<Verdict, SessionError> {
        if !self.verdict_recorded {
            self.ensure_stage(Stage::Review)?;
            self.verdict_recorded = true;
            self.pending.clear();
            self.touch();
        }
        Ok(aggregator.decide_case(&self.case))
    }

    pub fn status_view(&self, gate: &StageGate) -> SessionStatusView {
        let case = &self.case;
        SessionStatusView {
            session_id: self.id.clone(),
            stage: self.stage,
            stage_number: self.stage.number(),
            stage_label: self.stage.label(),
            finalized: self.verdict_recorded,
            identity_proof: case.document(DocumentSide::Identity),
            address_proof: case.document(DocumentSide::Address),
            identity_score: case.score(DocumentSide::Identity),
            address_score: case.score(DocumentSide::Address),
            attempts: SubTask::ordered()
                .into_iter()
                .map(|task| (task, case.attempts(task)))
                .collect(),
            max_scan_attempts: gate.budget().max_attempts,
            upload_status: case.upload_outcome(),
            live_capture: case.live_capture().is_some(),
            reference_photo: case.reference_photo().is_some(),
            face_match_score: case.face_match(),
            duplicate_check: case.duplicate_check().cloned(),
            pending: self.pending(),
            gate: self.can_advance(gate),
            updated_at: self.updated_at,
        }
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.verdict_recorded {
            Err(SessionError::Finalized)
        } else {
            Ok(())
        }
    }

    fn ensure_stage(&self, expected: Stage) -> Result<(), SessionError> {
        self.ensure_open()?;
        if self.stage == expected {
            Ok(())
        } else {
            Err(SessionError::StageMismatch {
                expected,
                actual: self.stage,
            })
        }
    }

    fn move_to(&mut self, stage: Stage) {
        self.stage = stage;
        self.pending.retain(|kind, _| kind.accepted_at(stage));
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn discarded(kind: SignalKind, reason: DiscardReason) -> EventDisposition {
    EventDisposition::Discarded { kind, reason }
}

/// API-facing snapshot of a session; image payloads are reduced to presence flags.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusView {
    pub session_id: SessionId,
    pub stage: Stage,
    pub stage_number: u8,
    pub stage_label: &'static str,
    pub finalized: bool,
    pub identity_proof: Option<DocumentType>,
    pub address_proof: Option<DocumentType>,
    pub identity_score: Option<Score>,
    pub address_score: Option<Score>,
    pub attempts: BTreeMap<SubTask, u32>,
    pub max_scan_attempts: u32,
    pub upload_status: UploadOutcome,
    pub live_capture: bool,
    pub reference_photo: bool,
    pub face_match_score: Option<Score>,
    pub duplicate_check: Option<DuplicateCheckResult>,
    pub pending: Vec<SignalKind>,
    pub gate: GateDecision,
    pub updated_at: DateTime<Utc>,
}
