use serde::Serialize;

use super::case::KycCase;
use super::domain::{DocumentSide, DocumentType, Score, SubTask, UploadOutcome};
use super::quality::{AcceptanceTier, FaceMatchTier, QualityTier};
use super::verdict::{FinalStatus, Verdict, VerdictReason};

/// Presentation-ready snapshot of a case and its verdict for the review stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub documents: Vec<DocumentReviewView>,
    pub face_match: FaceMatchView,
    pub upload_reliability: &'static str,
    pub upload_attempts: u32,
    pub duplicate_check: String,
    pub verdict: VerdictView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReviewView {
    pub side: DocumentSide,
    pub document: Option<DocumentType>,
    pub document_label: &'static str,
    pub score: Option<Score>,
    pub quality_label: &'static str,
    pub status_label: &'static str,
    pub authenticity: &'static str,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaceMatchView {
    pub score: Option<Score>,
    pub tier: Option<FaceMatchTier>,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerdictView {
    pub final_status: FinalStatus,
    pub status_label: &'static str,
    pub action: &'static str,
    pub risk_score: u8,
    pub reasons: Vec<VerdictReason>,
}

impl ReviewSummary {
    pub fn build(case: &KycCase, verdict: &Verdict) -> Self {
        let documents = DocumentSide::ordered()
            .into_iter()
            .map(|side| document_view(case, side))
            .collect();

        let face_tier = case.face_match().map(FaceMatchTier::classify);
        let face_match = FaceMatchView {
            score: case.face_match(),
            tier: face_tier,
            label: face_tier.map_or("Face match pending", FaceMatchTier::label),
        };

        Self {
            documents,
            face_match,
            upload_reliability: upload_reliability(
                case.upload_outcome(),
                case.attempts(SubTask::Upload),
            ),
            upload_attempts: case.attempts(SubTask::Upload),
            duplicate_check: duplicate_label(case),
            verdict: VerdictView {
                final_status: verdict.final_status,
                status_label: verdict.final_status.label(),
                action: verdict.final_status.action(),
                risk_score: verdict.risk_score,
                reasons: verdict.reasons.clone(),
            },
        }
    }
}

fn document_view(case: &KycCase, side: DocumentSide) -> DocumentReviewView {
    let document = case.document(side);
    let score = case.score(side);
    DocumentReviewView {
        side,
        document,
        document_label: document.map_or("Not selected", DocumentType::label),
        score,
        quality_label: QualityTier::label_for(score),
        status_label: AcceptanceTier::label_for(score),
        authenticity: AcceptanceTier::authenticity_for(case.acceptance(side)),
        attempts: case.scan_attempts(side),
    }
}

pub fn upload_reliability(outcome: UploadOutcome, attempts: u32) -> &'static str {
    match (outcome, attempts) {
        (UploadOutcome::Success, 0 | 1) => "Upload Successful",
        (UploadOutcome::Success, _) => "Retried and Completed",
        (UploadOutcome::NotStarted, _) => "Upload Not Started",
        (UploadOutcome::Failed, _) => "Upload Failed",
    }
}

fn duplicate_label(case: &KycCase) -> String {
    match case.duplicate_check() {
        None => "Not checked".to_string(),
        Some(result) if !result.duplicate => "No duplicate found".to_string(),
        Some(result) => match &result.matched_customer_id {
            Some(id) => format!("Possible duplicate of {id}"),
            None => "Possible duplicate found".to_string(),
        },
    }
}
