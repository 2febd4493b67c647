//! KYC onboarding: quality tiers, attempt tracking, stage gating and the final verdict.
//!
//! A [`KycSession`] owns one customer's [`KycCase`] and walks it through the five wizard
//! stages. The [`StageGate`] decides navigation, the [`VerdictAggregator`] decides the
//! outcome, and scorer results enter only through ticketed [`ScoringEvent`]s.

pub mod attempts;
pub mod case;
pub mod domain;
pub mod gate;
pub mod quality;
pub mod repository;
pub mod review;
pub mod router;
pub mod scoring;
pub mod service;
pub mod session;
pub mod verdict;

#[cfg(test)]
mod tests;

pub use attempts::{
    passes_with_retry_budget, AttemptBudget, AttemptCounter, AttemptTracker, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_PASS_SCORE,
};
pub use case::{CaseError, KycCase};
pub use domain::{
    DocumentOption, DocumentSide, DocumentType, DuplicateCheckResult, ImagePayload,
    ImagePayloadError, Score, ScoreError, SessionId, SubTask, UploadOutcome,
};
pub use gate::{GateBlock, GateDecision, Stage, StageGate};
pub use quality::{AcceptanceTier, FaceMatchTier, QualityTier};
pub use repository::{RepositoryError, SessionRepository};
pub use review::{upload_reliability, ReviewSummary};
pub use router::kyc_router;
pub use scoring::{ScorerError, SignalScorer};
pub use service::{KycOnboardingService, KycServiceError, SignalOutcome};
pub use session::{
    DiscardReason, EventDisposition, KycSession, ScoringEvent, SessionError, SessionStatusView,
    Signal, SignalKind, SignalTicket,
};
pub use verdict::{
    DocumentSignal, FinalDecisionPayload, FinalStatus, PayloadError, Verdict, VerdictAggregator,
    VerdictConfig, VerdictInput, VerdictReason,
};
