//! Chroma extraction modules
//!
//! Extract pitch-class distribution (12 semitones) from audio:
//! - Soft pitch-class filterbank over STFT bins
//! - Per-frame max normalization

pub mod extractor;
pub mod normalization;

pub use extractor::{extract_chroma, N_CHROMA};
