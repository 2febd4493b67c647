use crate::workflows::kyc::domain::{Score, UploadOutcome};
use crate::workflows::kyc::quality::{AcceptanceTier, FaceMatchTier};

use super::config::VerdictConfig;
use super::{DocumentSignal, VerdictInput};

/// Predicates the precedence rules and reason lists are derived from.
pub(crate) struct VerdictSignals {
    pub identity: Option<AcceptanceTier>,
    pub address: Option<AcceptanceTier>,
    /// `None` when no face-match score exists yet; the status rules read it as zero.
    pub face_match: Option<FaceMatchTier>,
    pub upload: UploadOutcome,
    pub attempts_exhausted: bool,
    pub duplicate: bool,
}

impl VerdictSignals {
    pub fn face_tier_or_low(&self) -> FaceMatchTier {
        self.face_match.unwrap_or(FaceMatchTier::Low)
    }
}

pub(crate) fn extract_signals(input: &VerdictInput, config: &VerdictConfig) -> VerdictSignals {
    VerdictSignals {
        identity: input.identity.tier(),
        address: input.address.tier(),
        face_match: input.face_match.map(FaceMatchTier::classify),
        upload: input.upload,
        attempts_exhausted: input.identity.attempts >= config.max_attempts
            || input.address.attempts >= config.max_attempts,
        duplicate: input
            .duplicate
            .as_ref()
            .map(|result| result.duplicate)
            .unwrap_or(false),
    }
}

/// Advisory 0-100 risk score; higher is riskier. Absent scores add nothing.
pub(crate) fn risk_score(input: &VerdictInput, config: &VerdictConfig) -> u8 {
    let mut total = 0.0_f64;

    total += document_risk(&input.identity, config);
    total += document_risk(&input.address, config);

    if let Some(face) = input.face_match {
        total += f64::from(face.shortfall()) / 2.0;
    }

    total.round().clamp(0.0, f64::from(Score::MAX)) as u8
}

fn document_risk(signal: &DocumentSignal, config: &VerdictConfig) -> f64 {
    let quality = signal
        .score
        .map(|score| f64::from(score.shortfall()))
        .unwrap_or(0.0);

    let retries = if signal.attempts > 1 {
        f64::from(config.attempt_penalty) * f64::from(signal.attempts)
    } else {
        0.0
    };

    quality + retries
}
