//! Error handling for blockfx
//!
//! The real-time path never returns errors; everything here is raised by
//! creation, parameter dispatch and configuration loading.

use thiserror::Error;

/// Result type alias for blockfx operations
pub type Result<T> = std::result::Result<T, FxError>;

/// Main error type for blockfx operations
#[derive(Error, Debug)]
pub enum FxError {
    // Resource Errors
    #[error("Out of memory: {details}")]
    OutOfMemory { details: String },

    // Lifecycle Errors
    #[error("Unit has not been created yet")]
    NotInitialized,

    #[error("Unit has been released")]
    Released,

    // Parameter Errors
    #[error("Unknown parameter: {name}")]
    UnknownParameter { name: String },

    #[error("Invalid parameter index {index} for {effect}")]
    InvalidParameterIndex { effect: String, index: usize },

    #[error("Parameter {name} is not {expected}-valued")]
    ParameterTypeMismatch { name: String, expected: &'static str },

    #[error("Invalid value for {name}: {reason}")]
    InvalidParameterValue { name: String, reason: String },

    // Host Negotiation Errors
    #[error("Unsupported channel count: {channels} (maximum {max})")]
    UnsupportedChannels { channels: usize, max: usize },

    #[error("Unknown effect: {name}")]
    UnknownEffect { name: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FxError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::OutOfMemory { .. } => "OUT_OF_MEMORY",
            FxError::NotInitialized => "NOT_INITIALIZED",
            FxError::Released => "RELEASED",
            FxError::UnknownParameter { .. } => "UNKNOWN_PARAMETER",
            FxError::InvalidParameterIndex { .. } => "INVALID_PARAMETER_INDEX",
            FxError::ParameterTypeMismatch { .. } => "PARAMETER_TYPE_MISMATCH",
            FxError::InvalidParameterValue { .. } => "INVALID_PARAMETER_VALUE",
            FxError::UnsupportedChannels { .. } => "UNSUPPORTED_CHANNELS",
            FxError::UnknownEffect { .. } => "UNKNOWN_EFFECT",
            FxError::Io(_) => "IO_ERROR",
            FxError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// A released unit, or one whose creation failed for lack of memory,
    /// will not process audio again. Everything else leaves the unit usable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FxError::OutOfMemory { .. } | FxError::Released)
    }
}
