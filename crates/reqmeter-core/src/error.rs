//! Shared error type across reqmeter crates.

use thiserror::Error;

/// Stable error codes (safe to log and to assert on in tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Name already registered with another kind or schema.
    DuplicateName,
    /// Label keys do not match the declared schema.
    InvalidLabel,
    /// Metric or label name is not a valid identifier.
    InvalidName,
    /// Histogram bucket layout rejected.
    InvalidBuckets,
    /// Negative, NaN, or otherwise unusable sample value.
    InvalidValue,
    /// Process introspection failed for one sampler tick.
    SamplerRead,
    /// Configuration could not be parsed or validated.
    Config,
    /// Internal failure.
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::DuplicateName => "DUPLICATE_NAME",
            ErrorCode::InvalidLabel => "INVALID_LABEL",
            ErrorCode::InvalidName => "INVALID_NAME",
            ErrorCode::InvalidBuckets => "INVALID_BUCKETS",
            ErrorCode::InvalidValue => "INVALID_VALUE",
            ErrorCode::SamplerRead => "SAMPLER_READ",
            ErrorCode::Config => "CONFIG",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MeterError>;

/// Unified error type used by the engine and the server.
#[derive(Debug, Error)]
pub enum MeterError {
    #[error("duplicate metric: {0}")]
    DuplicateName(String),
    #[error("invalid labels: {0}")]
    InvalidLabel(String),
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("invalid buckets: {0}")]
    InvalidBuckets(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("sampler read failed: {0}")]
    SamplerRead(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl MeterError {
    pub fn code(&self) -> ErrorCode {
        match self {
            MeterError::DuplicateName(_) => ErrorCode::DuplicateName,
            MeterError::InvalidLabel(_) => ErrorCode::InvalidLabel,
            MeterError::InvalidName(_) => ErrorCode::InvalidName,
            MeterError::InvalidBuckets(_) => ErrorCode::InvalidBuckets,
            MeterError::InvalidValue(_) => ErrorCode::InvalidValue,
            MeterError::SamplerRead(_) => ErrorCode::SamplerRead,
            MeterError::Config(_) => ErrorCode::Config,
            MeterError::Internal(_) => ErrorCode::Internal,
        }
    }
}
