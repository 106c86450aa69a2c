//! Analysis result types
//!
//! - Pitch classes and feature outcomes
//! - Metadata

pub mod metadata;
pub mod result;

pub use metadata::AnalysisMetadata;
pub use result::{FeatureOutcome, Features, PitchClass, Undetermined};
