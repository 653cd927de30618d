//! Scanner state machine and related view state.

use crate::capture::CaptureSource;
use crate::history::Prediction;

/// Top-level view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Scanner,
    History,
}

/// Active image source of the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScannerMode {
    #[default]
    Upload,
    Camera,
}

/// Generation number of an asynchronous request.
///
/// Responses carrying an older token than the current one are stale and
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub(crate) u64);

impl RequestToken {
    pub fn generation(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome shown after a prediction attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictOutcome {
    Success(Prediction),
    Failure(String),
}

/// Scanner surface state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScannerState {
    #[default]
    Idle,
    FileSelected {
        source: CaptureSource,
    },
    CameraActive,
    Predicting {
        token: RequestToken,
        filename: String,
    },
    ResultShown {
        outcome: PredictOutcome,
    },
}

impl ScannerState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FileSelected { .. } => "file_selected",
            Self::CameraActive => "camera_active",
            Self::Predicting { .. } => "predicting",
            Self::ResultShown { .. } => "result_shown",
        }
    }

    pub fn is_predicting(&self) -> bool {
        matches!(self, Self::Predicting { .. })
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            Self::ResultShown {
                outcome: PredictOutcome::Success(prediction),
            } => Some(prediction),
            _ => None,
        }
    }
}
