//! Actions fed to the session reducer and effects it asks the controller to
//! perform.

use chrono::{DateTime, Utc};

use super::state::{RequestToken, ScannerMode, Tab};
use crate::capture::CaptureSource;
use crate::error::FreshxError;
use crate::history::{Prediction, PredictionRecord, RecordId, StatusFilter};

#[derive(Debug)]
pub enum Action {
    SwitchTab(Tab),
    SetMode(ScannerMode),
    /// A file was chosen or dropped
    FileAcquired(CaptureSource),
    StartCamera,
    CameraStarted {
        token: RequestToken,
    },
    CameraFailed {
        token: RequestToken,
        error: FreshxError,
    },
    Submit,
    PredictResolved {
        token: RequestToken,
        outcome: Result<Prediction, FreshxError>,
        at: DateTime<Utc>,
    },
    Reset,
    RefreshHistory,
    HistoryResolved {
        token: RequestToken,
        outcome: Result<Vec<PredictionRecord>, FreshxError>,
    },
    Select(RecordId),
    ClearSelection,
    Search(String),
    FilterStatus(StatusFilter),
    Delete(RecordId),
    DeleteResolved {
        id: RecordId,
        outcome: Result<(), FreshxError>,
    },
    /// Clear-all request; ignored unless the user confirmed
    ClearAll {
        confirmed: bool,
    },
    ClearResolved {
        outcome: Result<(), FreshxError>,
    },
    DismissNotice,
    /// The surface is going away
    Teardown,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SwitchTab(_) => "switch_tab",
            Self::SetMode(_) => "set_mode",
            Self::FileAcquired(_) => "file_acquired",
            Self::StartCamera => "start_camera",
            Self::CameraStarted { .. } => "camera_started",
            Self::CameraFailed { .. } => "camera_failed",
            Self::Submit => "submit",
            Self::PredictResolved { .. } => "predict_resolved",
            Self::Reset => "reset",
            Self::RefreshHistory => "refresh_history",
            Self::HistoryResolved { .. } => "history_resolved",
            Self::Select(_) => "select",
            Self::ClearSelection => "clear_selection",
            Self::Search(_) => "search",
            Self::FilterStatus(_) => "filter_status",
            Self::Delete(_) => "delete",
            Self::DeleteResolved { .. } => "delete_resolved",
            Self::ClearAll { .. } => "clear_all",
            Self::ClearResolved { .. } => "clear_resolved",
            Self::DismissNotice => "dismiss_notice",
            Self::Teardown => "teardown",
        }
    }
}

/// What to upload for a prediction.
#[derive(Debug)]
pub enum PredictInput {
    File(CaptureSource),
    /// Take a still from the running camera session
    CameraShutter,
}

/// Side effects requested by the reducer.
#[derive(Debug)]
pub enum Effect {
    StartCamera {
        token: RequestToken,
    },
    StopCamera,
    Predict {
        token: RequestToken,
        input: PredictInput,
    },
    FetchHistory {
        token: RequestToken,
    },
    Delete {
        id: RecordId,
    },
    Clear,
}
