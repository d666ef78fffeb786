// Processing state models
// Observable lifecycle of the single in-flight generation request

use serde::{Deserialize, Serialize};

/// Stage text shown when a request starts
pub const STAGE_INITIALIZING: &str = "Initializing request...";

/// Stage text shown after a successful request
pub const STAGE_COMPLETE: &str = "Content generation complete!";

/// Stage text shown after the user cancels
pub const STAGE_CANCELLED: &str = "Cancelled by user";

/// One step of the cosmetic progress script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStage {
    pub stage: String,
    pub progress: u8,
}

impl ProgressStage {
    pub fn new(stage: impl Into<String>, progress: u8) -> Self {
        Self {
            stage: stage.into(),
            progress: progress.min(100),
        }
    }
}

/// Snapshot of the orchestrator's current request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingState {
    pub is_processing: bool,
    pub stage: String,
    /// 0-100
    pub progress: u8,
}

impl ProcessingState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn started() -> Self {
        Self {
            is_processing: true,
            stage: STAGE_INITIALIZING.to_string(),
            progress: 0,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            is_processing: false,
            stage: STAGE_CANCELLED.to_string(),
            progress: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::idle()
    }
}
