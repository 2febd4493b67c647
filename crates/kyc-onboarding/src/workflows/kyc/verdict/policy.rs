use serde::{Deserialize, Serialize, Serializer};

use crate::workflows::kyc::domain::UploadOutcome;
use crate::workflows::kyc::quality::{AcceptanceTier, FaceMatchTier};

use super::rules::VerdictSignals;

/// Final adjudication for a completed case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalStatus {
    #[serde(rename = "approved")]
    Approved,
    #[serde(rename = "manual")]
    ManualReview,
    #[serde(rename = "rejected")]
    Rejected,
}

impl FinalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::ManualReview => "Under Manual Review",
            Self::Rejected => "Rejected",
        }
    }

    /// Primary call to action offered alongside the status.
    pub const fn action(self) -> &'static str {
        match self {
            Self::Approved => "Finish",
            Self::ManualReview => "Okay",
            Self::Rejected => "Retry KYC",
        }
    }
}

/// Explainable reason attached to a rejection or a manual-review referral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerdictReason {
    IdentityQualityTooLow,
    AddressQualityTooLow,
    FaceMismatch,
    FaceMatchMissing,
    UploadFailed,
    UploadNotCompleted,
    IdentityNeedsReview,
    AddressNeedsReview,
    IdentityNotScanned,
    AddressNotScanned,
    FaceMatchModerate,
    AttemptsExhausted,
    PossibleDuplicate,
}

impl VerdictReason {
    pub const fn message(self) -> &'static str {
        match self {
            Self::IdentityQualityTooLow => "Identity document quality was too low.",
            Self::AddressQualityTooLow => "Address document quality was too low.",
            Self::FaceMismatch => "Live selfie did not match the uploaded photograph.",
            Self::FaceMatchMissing => "Face match could not be completed.",
            Self::UploadFailed => "Document upload failed due to network issues.",
            Self::UploadNotCompleted => "Document upload was not completed.",
            Self::IdentityNeedsReview => "Identity document requires manual verification.",
            Self::AddressNeedsReview => "Address document requires manual verification.",
            Self::IdentityNotScanned => "Identity document was never scanned.",
            Self::AddressNotScanned => "Address document was never scanned.",
            Self::FaceMatchModerate => "Face match score is moderate and needs review.",
            Self::AttemptsExhausted => "Multiple failed attempts triggered manual review.",
            Self::PossibleDuplicate => "A possible duplicate customer record was found.",
        }
    }
}

impl std::fmt::Display for VerdictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl Serialize for VerdictReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.message())
    }
}

/// First matching rule wins: rejection, then manual review, then approval.
pub(crate) fn decide_status(signals: &VerdictSignals, escalate_duplicates: bool) -> FinalStatus {
    let tiers = [signals.identity, signals.address];

    let rejected = tiers.contains(&Some(AcceptanceTier::Rejected))
        || signals.face_tier_or_low() == FaceMatchTier::Low
        || signals.upload != UploadOutcome::Success;
    if rejected {
        return FinalStatus::Rejected;
    }

    let manual = tiers
        .iter()
        .any(|tier| *tier != Some(AcceptanceTier::Accepted))
        || signals.face_tier_or_low() != FaceMatchTier::High
        || signals.attempts_exhausted
        || (escalate_duplicates && signals.duplicate);
    if manual {
        return FinalStatus::ManualReview;
    }

    FinalStatus::Approved
}

pub(crate) fn rejection_reasons(signals: &VerdictSignals) -> Vec<VerdictReason> {
    let mut reasons = Vec::new();

    if signals.identity == Some(AcceptanceTier::Rejected) {
        reasons.push(VerdictReason::IdentityQualityTooLow);
    }
    if signals.address == Some(AcceptanceTier::Rejected) {
        reasons.push(VerdictReason::AddressQualityTooLow);
    }
    match signals.face_match {
        None => reasons.push(VerdictReason::FaceMatchMissing),
        Some(FaceMatchTier::Low) => reasons.push(VerdictReason::FaceMismatch),
        Some(_) => {}
    }
    match signals.upload {
        UploadOutcome::Failed => reasons.push(VerdictReason::UploadFailed),
        UploadOutcome::NotStarted => reasons.push(VerdictReason::UploadNotCompleted),
        UploadOutcome::Success => {}
    }

    reasons
}

pub(crate) fn manual_review_reasons(
    signals: &VerdictSignals,
    escalate_duplicates: bool,
) -> Vec<VerdictReason> {
    let mut reasons = Vec::new();

    match signals.identity {
        Some(AcceptanceTier::ManualReview) => reasons.push(VerdictReason::IdentityNeedsReview),
        None => reasons.push(VerdictReason::IdentityNotScanned),
        _ => {}
    }
    match signals.address {
        Some(AcceptanceTier::ManualReview) => reasons.push(VerdictReason::AddressNeedsReview),
        None => reasons.push(VerdictReason::AddressNotScanned),
        _ => {}
    }
    if signals.face_match == Some(FaceMatchTier::Medium) {
        reasons.push(VerdictReason::FaceMatchModerate);
    }
    if signals.attempts_exhausted {
        reasons.push(VerdictReason::AttemptsExhausted);
    }
    if escalate_duplicates && signals.duplicate {
        reasons.push(VerdictReason::PossibleDuplicate);
    }

    reasons
}
