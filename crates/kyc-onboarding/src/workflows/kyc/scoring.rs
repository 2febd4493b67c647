use super::domain::{DocumentType, DuplicateCheckResult, ImagePayload, Score, UploadOutcome};

/// External capability producing the raw signals the engine interprets.
///
/// Implementations may be simulated, remote, or deterministic test stubs; the engine
/// only relies on the shapes returned here.
pub trait SignalScorer: Send + Sync {
    fn document_quality(
        &self,
        document: DocumentType,
        image: &ImagePayload,
    ) -> Result<Score, ScorerError>;

    fn face_match(
        &self,
        live_capture: &ImagePayload,
        reference_photo: &ImagePayload,
    ) -> Result<Score, ScorerError>;

    fn duplicate_check(&self) -> Result<DuplicateCheckResult, ScorerError>;

    /// Transfer the scanned documents. Must finish as `Success` or `Failed`.
    fn upload(&self, documents: &[DocumentType]) -> Result<UploadOutcome, ScorerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScorerError {
    #[error("scoring service unavailable: {0}")]
    Unavailable(String),
    #[error("scoring service returned an invalid result: {0}")]
    InvalidResult(String),
}
