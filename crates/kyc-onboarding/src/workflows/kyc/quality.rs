//! Maps raw scores onto the categorical tiers the rest of the workflow reasons about.
//!
//! Document scores use two parallel readings over the same cut points: an informational
//! [`QualityTier`] shown to the customer and a decision-relevant [`AcceptanceTier`]
//! consumed by the verdict. Face-match scores use their own [`FaceMatchTier`] bands.

use serde::{Deserialize, Serialize};

use super::domain::Score;

/// Highest score still read as poor quality / rejected.
pub const POOR_CEILING: u8 = 40;
/// Highest score still read as average quality / manual review.
pub const AVERAGE_CEILING: u8 = 70;
/// Lowest face-match score in the medium band.
pub const FACE_MEDIUM_FLOOR: u8 = 50;
/// Lowest face-match score in the high band.
pub const FACE_HIGH_FLOOR: u8 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Poor,
    Average,
    Good,
}

impl QualityTier {
    pub fn classify(score: Option<Score>) -> Option<Self> {
        score.map(|score| match score.value() {
            value if value <= POOR_CEILING => Self::Poor,
            value if value <= AVERAGE_CEILING => Self::Average,
            _ => Self::Good,
        })
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Poor => "Poor",
            Self::Average => "Average",
            Self::Good => "Good",
        }
    }

    pub fn label_for(score: Option<Score>) -> &'static str {
        Self::classify(score).map_or("Not scanned", Self::label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceTier {
    Rejected,
    ManualReview,
    Accepted,
}

impl AcceptanceTier {
    pub fn classify(score: Option<Score>) -> Option<Self> {
        QualityTier::classify(score).map(Self::from)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Rejected => "Rejected",
            Self::ManualReview => "Low Quality - Manual Review",
            Self::Accepted => "Accepted",
        }
    }

    pub fn label_for(score: Option<Score>) -> &'static str {
        Self::classify(score).map_or("Not Scanned", Self::label)
    }

    /// Authenticity is simulated from acceptance alone.
    pub fn authenticity_for(tier: Option<Self>) -> &'static str {
        match tier {
            Some(Self::Accepted) => "Authentic",
            _ => "Verification Needed",
        }
    }
}

impl From<QualityTier> for AcceptanceTier {
    fn from(tier: QualityTier) -> Self {
        match tier {
            QualityTier::Poor => Self::Rejected,
            QualityTier::Average => Self::ManualReview,
            QualityTier::Good => Self::Accepted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceMatchTier {
    Low,
    Medium,
    High,
}

impl FaceMatchTier {
    pub fn classify(score: Score) -> Self {
        match score.value() {
            value if value >= FACE_HIGH_FLOOR => Self::High,
            value if value >= FACE_MEDIUM_FLOOR => Self::Medium,
            _ => Self::Low,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Match - Failed Match",
            Self::Medium => "Medium Match - Manual Review Needed",
            Self::High => "High Match - Accepted",
        }
    }
}
