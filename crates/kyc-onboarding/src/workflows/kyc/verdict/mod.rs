//! Final adjudication of a KYC case.
//!
//! Both call sites, the live review of an in-progress session and the stateless
//! final-decision endpoint, normalize their input into a [`VerdictInput`] and run the
//! same rule set through [`VerdictAggregator::decide`].

mod config;
mod policy;
mod rules;

pub use config::{VerdictConfig, DEFAULT_ATTEMPT_PENALTY};
pub use policy::{FinalStatus, VerdictReason};

use serde::{Deserialize, Serialize};

use super::case::KycCase;
use super::domain::{DocumentSide, DuplicateCheckResult, Score, UploadOutcome};
use super::quality::AcceptanceTier;
use policy::{decide_status, manual_review_reasons, rejection_reasons};
use rules::{extract_signals, risk_score};

/// Quality evidence for one of the two documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentSignal {
    pub score: Option<Score>,
    /// Only consulted when no score is available.
    pub reported_tier: Option<AcceptanceTier>,
    pub attempts: u32,
}

impl DocumentSignal {
    pub fn scored(score: Score, attempts: u32) -> Self {
        Self {
            score: Some(score),
            reported_tier: None,
            attempts,
        }
    }

    pub fn tier(&self) -> Option<AcceptanceTier> {
        AcceptanceTier::classify(self.score).or(self.reported_tier)
    }
}

/// Normalized input to the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VerdictInput {
    pub identity: DocumentSignal,
    pub address: DocumentSignal,
    pub face_match: Option<Score>,
    pub upload: UploadOutcome,
    pub duplicate: Option<DuplicateCheckResult>,
}

impl VerdictInput {
    pub fn from_case(case: &KycCase) -> Self {
        let signal = |side: DocumentSide| DocumentSignal {
            score: case.score(side),
            reported_tier: None,
            attempts: case.scan_attempts(side),
        };

        Self {
            identity: signal(DocumentSide::Identity),
            address: signal(DocumentSide::Address),
            face_match: case.face_match(),
            upload: case.upload_outcome(),
            duplicate: case.duplicate_check().cloned(),
        }
    }
}

impl From<&KycCase> for VerdictInput {
    fn from(case: &KycCase) -> Self {
        Self::from_case(case)
    }
}

/// Finished case summary posted by an external caller. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FinalDecisionPayload {
    #[serde(default)]
    pub identity: DocumentReport,
    #[serde(default)]
    pub address: DocumentReport,
    #[serde(default)]
    pub face_match_score: Option<Score>,
    #[serde(default)]
    pub upload_status: UploadOutcome,
    #[serde(default)]
    pub attempts: AttemptReport,
    #[serde(default)]
    pub duplicate: Option<DuplicateCheckResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DocumentReport {
    #[serde(default)]
    pub quality_score: Option<Score>,
    #[serde(default)]
    pub status: Option<AcceptanceTier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AttemptReport {
    #[serde(default)]
    pub identity: u32,
    #[serde(default)]
    pub address: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("{side} status {reported:?} contradicts quality score {score} ({derived:?})")]
    TierMismatch {
        side: DocumentSide,
        reported: AcceptanceTier,
        derived: AcceptanceTier,
        score: Score,
    },
}

fn reconcile(
    side: DocumentSide,
    report: DocumentReport,
    attempts: u32,
) -> Result<DocumentSignal, PayloadError> {
    if let (Some(score), Some(reported)) = (report.quality_score, report.status) {
        let derived = AcceptanceTier::classify(Some(score)).unwrap_or(AcceptanceTier::Rejected);
        if derived != reported {
            return Err(PayloadError::TierMismatch {
                side,
                reported,
                derived,
                score,
            });
        }
    }

    Ok(DocumentSignal {
        score: report.quality_score,
        reported_tier: report.status,
        attempts,
    })
}

impl TryFrom<FinalDecisionPayload> for VerdictInput {
    type Error = PayloadError;

    fn try_from(payload: FinalDecisionPayload) -> Result<Self, Self::Error> {
        Ok(Self {
            identity: reconcile(
                DocumentSide::Identity,
                payload.identity,
                payload.attempts.identity,
            )?,
            address: reconcile(
                DocumentSide::Address,
                payload.address,
                payload.attempts.address,
            )?,
            face_match: payload.face_match_score,
            upload: payload.upload_status,
            duplicate: payload.duplicate,
        })
    }
}

/// Outcome of the aggregator: status, advisory risk and the reasons behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub final_status: FinalStatus,
    pub risk_score: u8,
    /// Reasons matching `final_status`; empty when approved.
    pub reasons: Vec<VerdictReason>,
    pub rejection_reasons: Vec<VerdictReason>,
    pub manual_review_reasons: Vec<VerdictReason>,
    pub duplicate_flagged: bool,
}

impl Verdict {
    pub fn summary(&self) -> String {
        if self.reasons.is_empty() {
            return self.final_status.label().to_string();
        }
        let joined: Vec<&str> = self.reasons.iter().map(|reason| reason.message()).collect();
        format!("{}: {}", self.final_status.label(), joined.join(" "))
    }
}

/// Stateless aggregator applying the verdict policy to a case snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerdictAggregator {
    config: VerdictConfig,
}

impl VerdictAggregator {
    pub fn new(config: VerdictConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerdictConfig {
        &self.config
    }

    pub fn decide(&self, input: &VerdictInput) -> Verdict {
        let signals = extract_signals(input, &self.config);
        let escalate = self.config.escalate_duplicates;

        let final_status = decide_status(&signals, escalate);
        let rejection_reasons = rejection_reasons(&signals);
        let manual_review_reasons = manual_review_reasons(&signals, escalate);

        let reasons = match final_status {
            FinalStatus::Rejected => rejection_reasons.clone(),
            FinalStatus::ManualReview => manual_review_reasons.clone(),
            FinalStatus::Approved => Vec::new(),
        };

        Verdict {
            final_status,
            risk_score: risk_score(input, &self.config),
            reasons,
            rejection_reasons,
            manual_review_reasons,
            duplicate_flagged: signals.duplicate,
        }
    }

    pub fn decide_case(&self, case: &KycCase) -> Verdict {
        self.decide(&VerdictInput::from_case(case))
    }

    pub fn decide_payload(&self, payload: FinalDecisionPayload) -> Result<Verdict, PayloadError> {
        let input = VerdictInput::try_from(payload)?;
        Ok(self.decide(&input))
    }
}
