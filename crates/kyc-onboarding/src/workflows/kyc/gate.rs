use serde::{Deserialize, Serialize};

use super::attempts::AttemptBudget;
use super::case::KycCase;
use super::domain::{DocumentSide, DocumentType, UploadOutcome};

/// Wizard stages in the order the customer walks through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    DocumentSelection,
    DocumentScan,
    DocumentUpload,
    FaceMatch,
    Review,
}

impl Stage {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::DocumentSelection,
            Self::DocumentScan,
            Self::DocumentUpload,
            Self::FaceMatch,
            Self::Review,
        ]
    }

    pub const fn number(self) -> u8 {
        match self {
            Self::DocumentSelection => 1,
            Self::DocumentScan => 2,
            Self::DocumentUpload => 3,
            Self::FaceMatch => 4,
            Self::Review => 5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::DocumentSelection => "Select Documents",
            Self::DocumentScan => "Scan Documents",
            Self::DocumentUpload => "Upload Documents",
            Self::FaceMatch => "Photo & Face Match",
            Self::Review => "Review & Status",
        }
    }

    pub const fn next(self) -> Option<Self> {
        match self {
            Self::DocumentSelection => Some(Self::DocumentScan),
            Self::DocumentScan => Some(Self::DocumentUpload),
            Self::DocumentUpload => Some(Self::FaceMatch),
            Self::FaceMatch => Some(Self::Review),
            Self::Review => None,
        }
    }

    /// Backward step, clamped at the first stage.
    pub const fn previous(self) -> Self {
        match self {
            Self::DocumentSelection | Self::DocumentScan => Self::DocumentSelection,
            Self::DocumentUpload => Self::DocumentScan,
            Self::FaceMatch => Self::DocumentUpload,
            Self::Review => Self::FaceMatch,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Review)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Stage-specific condition that stopped forward navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum GateBlock {
    #[error("PAN and Aadhaar are mandatory for digital account opening")]
    MandatoryDocumentsMissing { missing: Vec<DocumentType> },
    #[error("scan your {side} document before continuing")]
    ScanMissing { side: DocumentSide },
    #[error("{side} document quality is too low; please rescan ({attempts_remaining} attempt(s) left)")]
    ScanBelowQualityBar {
        side: DocumentSide,
        attempts_remaining: u32,
    },
    #[error("document upload has not completed successfully")]
    UploadIncomplete { outcome: UploadOutcome },
    #[error("capture a live selfie and upload a reference photo before continuing")]
    FacePhotosMissing {
        live_capture: bool,
        reference_photo: bool,
    },
    #[error("the review stage is the final stage")]
    AlreadyAtReview,
}

/// Answer for the presentation layer: may the customer move forward, and if not, why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateDecision {
    pub stage: Stage,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<GateBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GateDecision {
    fn from_check(stage: Stage, check: Result<(), GateBlock>) -> Self {
        match check {
            Ok(()) => Self {
                stage,
                allowed: true,
                reason: None,
                message: None,
            },
            Err(block) => Self {
                stage,
                allowed: false,
                message: Some(block.to_string()),
                reason: Some(block),
            },
        }
    }
}

/// Forward/backward navigation rules for the five-stage wizard. Never mutates the case.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageGate {
    budget: AttemptBudget,
}

impl StageGate {
    pub fn new(budget: AttemptBudget) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> AttemptBudget {
        self.budget
    }

    pub fn can_advance(&self, stage: Stage, case: &KycCase) -> GateDecision {
        GateDecision::from_check(stage, self.check(stage, case))
    }

    pub fn advance(&self, stage: Stage, case: &KycCase) -> Result<Stage, GateBlock> {
        self.check(stage, case)?;
        stage.next().ok_or(GateBlock::AlreadyAtReview)
    }

    pub fn retreat(&self, stage: Stage) -> Stage {
        stage.previous()
    }

    fn check(&self, stage: Stage, case: &KycCase) -> Result<(), GateBlock> {
        match stage {
            Stage::DocumentSelection => check_document_selection(case),
            Stage::DocumentScan => self.check_scans(case),
            Stage::DocumentUpload => check_upload(case),
            Stage::FaceMatch => check_face_photos(case),
            Stage::Review => Err(GateBlock::AlreadyAtReview),
        }
    }

    fn check_scans(&self, case: &KycCase) -> Result<(), GateBlock> {
        for side in DocumentSide::ordered() {
            if case.score(side).is_none() {
                return Err(GateBlock::ScanMissing { side });
            }
        }

        for side in DocumentSide::ordered() {
            let attempts = case.scan_attempts(side);
            if !self.budget.passes(case.score(side), attempts) {
                return Err(GateBlock::ScanBelowQualityBar {
                    side,
                    attempts_remaining: self.budget.remaining(attempts),
                });
            }
        }

        Ok(())
    }
}

const MANDATORY_DOCUMENTS: [DocumentType; 2] = [DocumentType::Pan, DocumentType::Aadhaar];

fn check_document_selection(case: &KycCase) -> Result<(), GateBlock> {
    let selected = case.selected_documents();
    let both_chosen = DocumentSide::ordered()
        .iter()
        .all(|side| case.document(*side).is_some());

    let missing: Vec<DocumentType> = MANDATORY_DOCUMENTS
        .into_iter()
        .filter(|document| !selected.contains(document))
        .collect();

    if both_chosen && missing.is_empty() {
        Ok(())
    } else {
        Err(GateBlock::MandatoryDocumentsMissing { missing })
    }
}

fn check_upload(case: &KycCase) -> Result<(), GateBlock> {
    match case.upload_outcome() {
        UploadOutcome::Success => Ok(()),
        outcome => Err(GateBlock::UploadIncomplete { outcome }),
    }
}

fn check_face_photos(case: &KycCase) -> Result<(), GateBlock> {
    let live_capture = case.live_capture().is_some();
    let reference_photo = case.reference_photo().is_some();
    if live_capture && reference_photo {
        Ok(())
    } else {
        Err(GateBlock::FacePhotosMissing {
            live_capture,
            reference_photo,
        })
    }
}
