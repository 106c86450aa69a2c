//! Procedural music generation
//!
//! - Drum beat whose event spacing follows the tempo
//! - I-IV-V-I chord progression rooted at the detected key
//! - Lenient input coercion for tempo and key
//! - Standard MIDI File rendering

pub mod beat;
pub mod input;
pub mod progression;
pub mod render;
pub mod sequence;

pub use beat::generate_beat;
pub use progression::generate_progression;
pub use render::{render_smf, write_sequence};
pub use sequence::{NoteAction, NoteEvent, Sequence};

use crate::analysis::result::PitchClass;
use crate::error::HarmonyError;
use std::path::{Path, PathBuf};

/// Result of rendering both sequences
///
/// Each artifact is attempted independently, so one can fail while the other
/// is written.
#[derive(Debug)]
pub struct GeneratedArtifacts {
    /// Drum beat file
    pub beat: Result<PathBuf, HarmonyError>,
    /// Chord progression file
    pub progression: Result<PathBuf, HarmonyError>,
}

impl GeneratedArtifacts {
    /// Both paths if both renders succeeded
    pub fn paths(&self) -> Option<(&Path, &Path)> {
        match (&self.beat, &self.progression) {
            (Ok(beat), Ok(progression)) => Some((beat.as_path(), progression.as_path())),
            _ => None,
        }
    }
}

/// Generate and write the beat for `tempo` and the progression for `key`
pub fn generate_artifacts(
    tempo: f32,
    key: PitchClass,
    beat_path: &Path,
    progression_path: &Path,
) -> GeneratedArtifacts {
    log::info!("Generating music: tempo={:.2} BPM, key={}", tempo, key);

    let beat = write_sequence(&generate_beat(tempo), beat_path).map(|_| beat_path.to_path_buf());
    if let Err(e) = &beat {
        log::error!("Beat generation failed: {}", e);
    }

    let progression = write_sequence(&generate_progression(key), progression_path)
        .map(|_| progression_path.to_path_buf());
    if let Err(e) = &progression {
        log::error!("Progression generation failed: {}", e);
    }

    GeneratedArtifacts { beat, progression }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifacts_written() {
        let dir = tempfile::tempdir().unwrap();
        let beat = dir.path().join("beat.mid");
        let piano = dir.path().join("piano.mid");
        let artifacts = generate_artifacts(120.0, PitchClass::E, &beat, &piano);
        let (b, p) = artifacts.paths().unwrap();
        assert_eq!(b, beat.as_path());
        assert_eq!(p, piano.as_path());
        assert!(beat.exists() && piano.exists());
    }

    #[test]
    fn test_failures_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the beat file makes that write fail
        let beat = dir.path().join("blocked");
        std::fs::create_dir(&beat).unwrap();
        let piano = dir.path().join("piano.mid");

        let artifacts = generate_artifacts(120.0, PitchClass::C, &beat, &piano);
        assert!(artifacts.beat.is_err());
        assert!(artifacts.progression.is_ok());
        assert!(artifacts.paths().is_none());
    }
}
