//! # Error Types
//!
//! Custom error types for padmouse using `thiserror`.

use thiserror::Error;

/// Main error type for padmouse
#[derive(Debug, Error)]
pub enum PadMouseError {
    /// Gamepad access errors (open, poll)
    #[error("Controller error: {0}")]
    Controller(String),

    /// No gamepad could be located at startup
    #[error("No compatible gamepad found")]
    ControllerNotFound,

    /// Synthesized keyboard/mouse events could not be set up
    #[error("Input injection error: {0}")]
    Injection(String),

    /// An optional OS capability could not be obtained
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Audio endpoint enumeration or switching failed
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for padmouse
pub type Result<T> = std::result::Result<T, PadMouseError>;
