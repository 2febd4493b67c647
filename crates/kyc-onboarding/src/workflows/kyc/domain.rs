use serde::{Deserialize, Serialize};

/// Identifier wrapper for onboarding sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quality or match score reported by an external scorer, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 100;

    pub fn new(value: u8) -> Result<Self, ScoreError> {
        if value > Self::MAX {
            return Err(ScoreError::OutOfRange {
                value: i64::from(value),
            });
        }
        Ok(Self(value))
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Distance from a perfect score, used by the risk rubric.
    pub const fn shortfall(self) -> u8 {
        Self::MAX - self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = ScoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u8::try_from(value) {
            Ok(raw) if raw <= Self::MAX => Ok(Self(raw)),
            _ => Err(ScoreError::OutOfRange { value }),
        }
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error("score {value} is outside the 0-100 range")]
    OutOfRange { value: i64 },
}

/// Government-issued documents accepted by the onboarding flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Pan,
    Aadhaar,
    Passport,
    VoterId,
}

impl DocumentType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pan => "PAN Card",
            Self::Aadhaar => "Aadhaar Card",
            Self::Passport => "Passport",
            Self::VoterId => "Voter ID",
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Pan => "PAN",
            Self::Aadhaar => "AADHAAR",
            Self::Passport => "PASSPORT",
            Self::VoterId => "VOTER_ID",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Entry in the document picker for one proof slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentOption {
    pub document: DocumentType,
    pub recommended: bool,
}

const IDENTITY_OPTIONS: [DocumentOption; 3] = [
    DocumentOption {
        document: DocumentType::Pan,
        recommended: true,
    },
    DocumentOption {
        document: DocumentType::Aadhaar,
        recommended: false,
    },
    DocumentOption {
        document: DocumentType::Passport,
        recommended: false,
    },
];

const ADDRESS_OPTIONS: [DocumentOption; 3] = [
    DocumentOption {
        document: DocumentType::Aadhaar,
        recommended: true,
    },
    DocumentOption {
        document: DocumentType::Passport,
        recommended: false,
    },
    DocumentOption {
        document: DocumentType::VoterId,
        recommended: false,
    },
];

/// The two proofs collected by the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSide {
    Identity,
    Address,
}

impl DocumentSide {
    pub const fn ordered() -> [Self; 2] {
        [Self::Identity, Self::Address]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Identity => "Identity",
            Self::Address => "Address",
        }
    }

    pub const fn options(self) -> &'static [DocumentOption] {
        match self {
            Self::Identity => &IDENTITY_OPTIONS,
            Self::Address => &ADDRESS_OPTIONS,
        }
    }

    pub fn offers(self, document: DocumentType) -> bool {
        self.options()
            .iter()
            .any(|option| option.document == document)
    }

    pub const fn scan_subtask(self) -> SubTask {
        match self {
            Self::Identity => SubTask::ScanIdentity,
            Self::Address => SubTask::ScanAddress,
        }
    }
}

impl std::fmt::Display for DocumentSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity => f.write_str("identity"),
            Self::Address => f.write_str("address"),
        }
    }
}

/// Sub-tasks that carry their own attempt counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubTask {
    ScanIdentity,
    ScanAddress,
    Upload,
}

impl SubTask {
    pub const fn ordered() -> [Self; 3] {
        [Self::ScanIdentity, Self::ScanAddress, Self::Upload]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ScanIdentity => "Identity scan",
            Self::ScanAddress => "Address scan",
            Self::Upload => "Document upload",
        }
    }
}

/// Result of the most recent document transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadOutcome {
    #[default]
    NotStarted,
    Success,
    Failed,
}

impl UploadOutcome {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::Success => "Success",
            Self::Failed => "Failed",
        }
    }
}

/// Outcome of the (simulated) duplicate-customer lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DuplicateCheckResult {
    pub duplicate: bool,
    #[serde(default)]
    pub matched_customer_id: Option<String>,
}

impl DuplicateCheckResult {
    pub fn clear() -> Self {
        Self::default()
    }

    pub fn matched(customer_id: impl Into<String>) -> Self {
        Self {
            duplicate: true,
            matched_customer_id: Some(customer_id.into()),
        }
    }
}

/// Opaque image handed to scorers (base64 or data URL); never inspected here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImagePayload(String);

impl ImagePayload {
    pub fn new(raw: impl Into<String>) -> Result<Self, ImagePayloadError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ImagePayloadError::Empty);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ImagePayload {
    type Error = ImagePayloadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ImagePayload> for String {
    fn from(payload: ImagePayload) -> Self {
        payload.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImagePayloadError {
    #[error("image payload must not be empty")]
    Empty,
}
