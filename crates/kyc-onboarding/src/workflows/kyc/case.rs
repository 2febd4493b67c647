use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::attempts::AttemptTracker;
use super::domain::{
    DocumentSide, DocumentType, DuplicateCheckResult, ImagePayload, Score, SubTask, UploadOutcome,
};
use super::quality::AcceptanceTier;

/// Everything collected for one customer during an onboarding session.
///
/// Fields only change through the operations below so each sub-task touches a
/// disjoint slice of state; completions for different sub-tasks commute.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KycCase {
    identity_proof: Option<DocumentType>,
    address_proof: Option<DocumentType>,
    identity_score: Option<Score>,
    address_score: Option<Score>,
    attempts: AttemptTracker,
    upload: UploadOutcome,
    live_capture: Option<ImagePayload>,
    reference_photo: Option<ImagePayload>,
    face_match: Option<Score>,
    duplicate_check: Option<DuplicateCheckResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaseError {
    #[error("{document} is not offered as {side} proof")]
    DocumentNotOffered {
        side: DocumentSide,
        document: DocumentType,
    },
    #[error("an upload attempt must finish as success or failed")]
    UnfinishedUpload,
    #[error("face match requires both a live capture and a reference photo")]
    FacePhotosMissing,
}

impl KycCase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_document(
        &mut self,
        side: DocumentSide,
        document: DocumentType,
    ) -> Result<(), CaseError> {
        if !side.offers(document) {
            return Err(CaseError::DocumentNotOffered { side, document });
        }
        match side {
            DocumentSide::Identity => self.identity_proof = Some(document),
            DocumentSide::Address => self.address_proof = Some(document),
        }
        Ok(())
    }

    /// Overwrite the side's score with a fresh attempt and count it.
    pub fn record_scan(&mut self, side: DocumentSide, score: Score) -> u32 {
        match side {
            DocumentSide::Identity => self.identity_score = Some(score),
            DocumentSide::Address => self.address_score = Some(score),
        }
        self.attempts.record(side.scan_subtask())
    }

    pub fn record_upload(&mut self, outcome: UploadOutcome) -> Result<u32, CaseError> {
        if outcome == UploadOutcome::NotStarted {
            return Err(CaseError::UnfinishedUpload);
        }
        self.upload = outcome;
        Ok(self.attempts.record(SubTask::Upload))
    }

    pub fn set_live_capture(&mut self, image: ImagePayload) {
        self.live_capture = Some(image);
        self.face_match = None;
    }

    pub fn set_reference_photo(&mut self, image: ImagePayload) {
        self.reference_photo = Some(image);
        self.face_match = None;
    }

    /// Clears the capture and the score derived from it. Attempt counters stay.
    pub fn retake_live_capture(&mut self) {
        self.live_capture = None;
        self.face_match = None;
    }

    pub fn record_face_match(&mut self, score: Score) -> Result<(), CaseError> {
        if !self.has_face_photos() {
            return Err(CaseError::FacePhotosMissing);
        }
        self.face_match = Some(score);
        Ok(())
    }

    pub fn record_duplicate_check(&mut self, result: DuplicateCheckResult) {
        self.duplicate_check = Some(result);
    }

    pub fn document(&self, side: DocumentSide) -> Option<DocumentType> {
        match side {
            DocumentSide::Identity => self.identity_proof,
            DocumentSide::Address => self.address_proof,
        }
    }

    pub fn selected_documents(&self) -> BTreeSet<DocumentType> {
        DocumentSide::ordered()
            .into_iter()
            .filter_map(|side| self.document(side))
            .collect()
    }

    pub fn score(&self, side: DocumentSide) -> Option<Score> {
        match side {
            DocumentSide::Identity => self.identity_score,
            DocumentSide::Address => self.address_score,
        }
    }

    pub fn acceptance(&self, side: DocumentSide) -> Option<AcceptanceTier> {
        AcceptanceTier::classify(self.score(side))
    }

    pub fn attempts(&self, task: SubTask) -> u32 {
        self.attempts.get(task)
    }

    pub fn scan_attempts(&self, side: DocumentSide) -> u32 {
        self.attempts(side.scan_subtask())
    }

    pub fn upload_outcome(&self) -> UploadOutcome {
        self.upload
    }

    pub fn live_capture(&self) -> Option<&ImagePayload> {
        self.live_capture.as_ref()
    }

    pub fn reference_photo(&self) -> Option<&ImagePayload> {
        self.reference_photo.as_ref()
    }

    pub fn has_face_photos(&self) -> bool {
        self.live_capture.is_some() && self.reference_photo.is_some()
    }

    pub fn face_match(&self) -> Option<Score> {
        self.face_match
    }

    pub fn duplicate_check(&self) -> Option<&DuplicateCheckResult> {
        self.duplicate_check.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(value: u8) -> Score {
        Score::new(value).expect("valid score")
    }

    fn image(tag: &str) -> ImagePayload {
        ImagePayload::new(format!("data:image/png;base64,{tag}")).expect("non-empty")
    }

    #[test]
    fn rejects_documents_outside_the_slot_catalogue() {
        let mut case = KycCase::new();
        let err = case
            .select_document(DocumentSide::Identity, DocumentType::VoterId)
            .expect_err("voter id is not an identity option");
        assert!(err.to_string().contains("Voter ID"));
        assert_eq!(case.document(DocumentSide::Identity), None);
    }

    #[test]
    fn rescans_overwrite_score_and_keep_counting() {
        let mut case = KycCase::new();
        assert_eq!(case.record_scan(DocumentSide::Identity, score(35)), 1);
        assert_eq!(case.record_scan(DocumentSide::Identity, score(82)), 2);
        assert_eq!(case.score(DocumentSide::Identity), Some(score(82)));
        assert_eq!(case.scan_attempts(DocumentSide::Address), 0);
    }

    #[test]
    fn scan_sides_commute() {
        let mut left = KycCase::new();
        left.record_scan(DocumentSide::Identity, score(75));
        left.record_scan(DocumentSide::Address, score(52));

        let mut right = KycCase::new();
        right.record_scan(DocumentSide::Address, score(52));
        right.record_scan(DocumentSide::Identity, score(75));

        assert_eq!(left, right);
    }

    #[test]
    fn upload_requires_a_finished_outcome() {
        let mut case = KycCase::new();
        assert_eq!(
            case.record_upload(UploadOutcome::NotStarted),
            Err(CaseError::UnfinishedUpload)
        );
        assert_eq!(case.attempts(SubTask::Upload), 0);
        assert_eq!(case.record_upload(UploadOutcome::Failed), Ok(1));
        assert_eq!(case.record_upload(UploadOutcome::Success), Ok(2));
        assert_eq!(case.upload_outcome(), UploadOutcome::Success);
    }

    #[test]
    fn retake_clears_capture_and_match_but_not_counters() {
        let mut case = KycCase::new();
        case.record_upload(UploadOutcome::Success).expect("upload");
        case.set_live_capture(image("live"));
        case.set_reference_photo(image("reference"));
        case.record_face_match(score(88)).expect("both photos present");

        case.retake_live_capture();

        assert!(case.live_capture().is_none());
        assert!(case.reference_photo().is_some());
        assert_eq!(case.face_match(), None);
        assert_eq!(case.attempts(SubTask::Upload), 1);
        assert_eq!(
            case.record_face_match(score(90)),
            Err(CaseError::FacePhotosMissing)
        );
    }
}
