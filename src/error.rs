//! Error types for the capture, analysis, generation and playback pipeline

use std::fmt;

/// Errors that can occur anywhere in the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum HarmonyError {
    /// Invalid input parameters
    InvalidInput(String),

    /// Audio capture failed (no input device, empty recording)
    Capture(String),

    /// Audio decoding error
    Decoding(String),

    /// Processing error during analysis
    Processing(String),

    /// A sequence could not be rendered to a playable artifact
    Render(String),

    /// The external synthesis process could not be spawned or controlled
    Playback(String),

    /// Filesystem error
    Io(String),
}

impl fmt::Display for HarmonyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarmonyError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            HarmonyError::Capture(msg) => write!(f, "Capture error: {}", msg),
            HarmonyError::Decoding(msg) => write!(f, "Decoding error: {}", msg),
            HarmonyError::Processing(msg) => write!(f, "Processing error: {}", msg),
            HarmonyError::Render(msg) => write!(f, "Render error: {}", msg),
            HarmonyError::Playback(msg) => write!(f, "Playback error: {}", msg),
            HarmonyError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for HarmonyError {}

impl From<std::io::Error> for HarmonyError {
    fn from(err: std::io::Error) -> Self {
        HarmonyError::Io(err.to_string())
    }
}
