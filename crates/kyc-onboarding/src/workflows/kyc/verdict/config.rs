use serde::{Deserialize, Serialize};

use crate::workflows::kyc::attempts::DEFAULT_MAX_ATTEMPTS;

pub const DEFAULT_ATTEMPT_PENALTY: u8 = 5;

/// Policy dials for the final adjudication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictConfig {
    /// Scan attempts at or beyond this count route the case to manual review.
    pub max_attempts: u32,
    /// Risk points per scan attempt once a side needed more than one.
    pub attempt_penalty: u8,
    /// Route possible duplicates to manual review instead of only reporting them.
    pub escalate_duplicates: bool,
}

impl Default for VerdictConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            attempt_penalty: DEFAULT_ATTEMPT_PENALTY,
            escalate_duplicates: false,
        }
    }
}
