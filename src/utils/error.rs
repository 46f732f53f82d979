use thiserror::Error;

#[derive(Error, Debug)]
pub enum FxError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("{provider} HTTP {status}")]
    ProviderStatusError { provider: String, status: u16 },

    #[error("{provider} unexpected shape")]
    UnexpectedShapeError { provider: String },

    #[error("{provider} request failed: {reason}")]
    ProviderRequestError { provider: String, reason: String },

    #[error("{provider} returned non-positive rate {rate}")]
    InvalidRateError { provider: String, rate: f64 },

    #[error("{provider} timed out after {millis} ms")]
    TimeoutError { provider: String, millis: u128 },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl FxError {
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            FxError::ConfigError { .. }
            | FxError::ConfigValidationError { .. }
            | FxError::InvalidConfigValueError { .. } => {
                "Check the configuration file and command-line flags"
            }
            FxError::IoError(_) | FxError::StorageError { .. } => {
                "Check that the cache directory exists and is writable, or run with --no-cache"
            }
            FxError::SerializationError(_) => "Delete the cache file; it will be rebuilt",
            _ => "Check the network connection, or pass the rate manually with --fx",
        }
    }
}

pub type Result<T> = std::result::Result<T, FxError>;
