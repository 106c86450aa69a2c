//! Analysis metadata structures

use serde::{Deserialize, Serialize};

/// Analysis metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Audio duration in seconds
    pub duration_seconds: f32,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// Algorithm version
    pub algorithm_version: String,

    /// Whether harmonic/percussive separation ran (false for short buffers)
    pub hpss_applied: bool,

    /// Strength of the winning autocorrelation lag (0.0-1.0)
    pub tempo_strength: f32,

    /// Key clarity (0.0-1.0)
    pub key_clarity: f32,

    /// Degradations encountered during analysis
    pub warnings: Vec<String>,
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        Self {
            duration_seconds: 0.0,
            sample_rate: 0,
            processing_time_ms: 0.0,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            hpss_applied: false,
            tempo_strength: 0.0,
            key_clarity: 0.0,
            warnings: Vec::new(),
        }
    }
}
