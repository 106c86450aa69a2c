//! Looped playback through an external synthesizer
//!
//! - [`SynthEngine`]: starts a process that plays one artifact
//! - [`Orchestrator`]: one looping thread per artifact, shared stop token

pub mod engine;
pub mod orchestrator;

pub use engine::{FluidSynth, SynthEngine};
pub use orchestrator::{LoopExit, Orchestrator, StopStatus};
