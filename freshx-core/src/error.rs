use thiserror::Error;

/// Message shown when no file is selected and the camera is inactive.
pub const NO_INPUT_MESSAGE: &str = "Please upload an image or activate the camera first.";

/// Message shown when the prediction endpoint cannot be reached.
pub const PREDICT_CONNECT_MESSAGE: &str = "Could not connect to the AI server.";

/// Message shown when the history endpoint cannot be reached.
pub const HISTORY_CONNECT_MESSAGE: &str = "Failed to connect to history.";

/// Message used when `/predict` fails without an `error` field.
pub const PREDICT_FALLBACK_MESSAGE: &str = "Failed to analyze image";

#[derive(Error, Debug)]
pub enum FreshxError {
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Database unavailable (Status: {status}). Is backend running?")]
    ServiceUnavailable { status: u16 },

    #[error("Remote store rejected the request (Status: {status})")]
    Rejected { status: u16 },

    #[error("{message}")]
    TransportFailure { message: String },

    #[error("{0}")]
    ValidationFailure(String),

    #[error("{}", NO_INPUT_MESSAGE)]
    NoInputSelected,

    #[error("Image encoding error: {0}")]
    ImageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FreshxError {
    /// Build a transport failure carrying the user-facing message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportFailure {
            message: message.into(),
        }
    }

    /// Whether the failure comes from the camera device.
    pub fn is_camera_error(&self) -> bool {
        matches!(self, Self::PermissionDenied(_) | Self::DeviceUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, FreshxError>;
