//! Period estimation modules
//!
//! Convert an onset strength envelope into a global tempo using
//! FFT-accelerated autocorrelation weighted by a tempo prior.

pub mod autocorrelation;

pub use autocorrelation::estimate_tempo;

/// Global tempo estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoEstimate {
    /// Tempo in beats per minute
    pub bpm: f32,

    /// Beat period in envelope frames (fractional after interpolation)
    pub period_frames: f32,

    /// Share of the prior-weighted autocorrelation mass at the chosen lag (0.0-1.0)
    pub strength: f32,
}
