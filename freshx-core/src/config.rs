//! Client configuration.
//!
//! Loaded from environment variables with defaults matching the hosted
//! classifier's expectations (400px uploads, 2 second minimum analysis time).

use std::time::Duration;

use url::Url;

use crate::capture::{NormalizeOptions, Resolution};
use crate::error::{FreshxError, Result};

/// Default inference service base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Default model identifier when the service omits `model_used`.
pub const DEFAULT_MODEL: &str = "fruit";

/// Client configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Inference service base URL (default: http://localhost:5000)
    pub api_url: Url,
    /// Bounds and quality applied before upload (default: 400x400, quality 90)
    pub normalize: NormalizeOptions,
    /// Resolution requested from camera devices (default: 400x300)
    pub camera_resolution: Resolution,
    /// Minimum perceived duration of a prediction (default: 2s)
    pub min_predict_duration: Duration,
    /// HTTP request timeout (default: 30s)
    pub request_timeout: Duration,
    /// Model identifier used when the service does not report one
    pub default_model: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            normalize: NormalizeOptions::default(),
            camera_resolution: Resolution::CAMERA_DEFAULT,
            min_predict_duration: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Only a malformed `FRESHX_API_URL` is an error; unparsable numeric
    /// values fall back to their defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let api_url = match std::env::var("FRESHX_API_URL") {
            Ok(raw) if !raw.trim().is_empty() => parse_api_url(&raw)?,
            _ => defaults.api_url,
        };

        let max_dimension = std::env::var("FRESHX_MAX_DIMENSION")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0);

        let normalize = match max_dimension {
            Some(max) => NormalizeOptions {
                max_width: max,
                max_height: max,
                ..defaults.normalize
            },
            None => defaults.normalize,
        };

        let min_predict_duration = std::env::var("FRESHX_MIN_PREDICT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.min_predict_duration);

        let request_timeout = std::env::var("FRESHX_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let default_model = std::env::var("FRESHX_DEFAULT_MODEL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.default_model);

        Ok(Self {
            api_url,
            normalize,
            camera_resolution: defaults.camera_resolution,
            min_predict_duration,
            request_timeout,
            default_model,
        })
    }

    /// Replace the base URL, validating it first.
    pub fn with_api_url(mut self, raw: &str) -> Result<Self> {
        self.api_url = parse_api_url(raw)?;
        Ok(self)
    }

    /// Resolve an endpoint path against the base URL.
    ///
    /// The base path is kept, so `http://host/api` + `history` yields
    /// `http://host/api/history`.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let mut base = self.api_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path.trim_start_matches('/'))
            .map_err(|e| FreshxError::ConfigError(format!("Invalid endpoint '{path}': {e}")))
    }
}

fn parse_api_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| FreshxError::ConfigError(format!("Invalid API URL '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FreshxError::ConfigError(format!(
            "Unsupported API URL scheme '{other}'"
        ))),
    }
}
