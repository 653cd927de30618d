//! Exit codes following sysexits.h conventions.
//!
//! These codes give scripts a way to tell a missing file from an
//! unreachable service or a rejected upload.

use freshx_core::FreshxError;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments or configuration).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (prediction rejected, malformed payload).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open input file, or no input selected.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Inference service or camera unavailable.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const UNAVAILABLE: i32 = 69;

/// I/O error (cannot write output file).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Camera permission denied.
/// Maps to EX_NOPERM from sysexits.h.
pub const PERMISSION_DENIED: i32 = 77;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Typed core errors take precedence over message matching
        let code = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<FreshxError>())
            .map(code_for)
            .unwrap_or_else(|| {
                if message.contains("Failed to write") {
                    IO_ERROR
                } else if message.contains("Failed to read") {
                    INPUT_ERROR
                } else {
                    GENERAL_ERROR
                }
            });

        Self {
            code,
            message: Some(message),
        }
    }
}

fn code_for(err: &FreshxError) -> i32 {
    match err {
        FreshxError::PermissionDenied(_) => PERMISSION_DENIED,
        FreshxError::DeviceUnavailable(_)
        | FreshxError::ServiceUnavailable { .. }
        | FreshxError::TransportFailure { .. } => UNAVAILABLE,
        FreshxError::Rejected { .. }
        | FreshxError::ValidationFailure(_)
        | FreshxError::ImageError(_) => DATA_ERROR,
        FreshxError::NoInputSelected => INPUT_ERROR,
        FreshxError::ConfigError(_) => USAGE_ERROR,
        FreshxError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => INPUT_ERROR,
        FreshxError::Io(_) => IO_ERROR,
    }
}
