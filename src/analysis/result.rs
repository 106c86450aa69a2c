//! Analysis result types

use super::metadata::AnalysisMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chromatic pitch class (0 = C, 1 = C#, ..., 11 = B)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    /// All pitch classes in index order
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Pitch class for `index`, or `None` outside 0-11
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Index in 0-11
    pub fn index(self) -> usize {
        self as usize
    }

    /// Note name in sharp notation
    ///
    /// # Example
    ///
    /// ```
    /// use harmonybot::analysis::result::PitchClass;
    ///
    /// assert_eq!(PitchClass::C.name(), "C");
    /// assert_eq!(PitchClass::FSharp.name(), "F#");
    /// assert_eq!(PitchClass::from_index(10).map(|p| p.name()), Some("A#"));
    /// ```
    pub fn name(self) -> &'static str {
        const NAMES: [&str; 12] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];
        NAMES[self.index()]
    }

    /// MIDI note number of this pitch class in octave 4 (C4 = 60)
    pub fn midi_note_octave4(self) -> u8 {
        60 + self as u8
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Features detected in a non-silent buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Features {
    /// Tempo in BPM; 0.0 when no rhythmic onsets were found
    pub tempo: f32,

    /// Dominant pitch class, absent when the chromagram is all zero
    pub key: Option<PitchClass>,

    /// Tracked beat times in seconds
    pub beat_times: Vec<f32>,

    /// Analysis metadata
    pub metadata: AnalysisMetadata,
}

/// Why no features could be determined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Undetermined {
    /// Total energy was below the silence threshold
    Silence {
        /// Sum of squared samples
        energy: f32,
    },
    /// Analysis failed; the message describes the failing stage
    Failed(String),
}

impl fmt::Display for Undetermined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Undetermined::Silence { energy } => write!(f, "silence (energy {:.2e})", energy),
            Undetermined::Failed(msg) => write!(f, "analysis failed: {}", msg),
        }
    }
}

/// Outcome of feature extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FeatureOutcome {
    /// Features were extracted
    Detected(Features),
    /// Nothing could be determined
    Undetermined(Undetermined),
}

impl FeatureOutcome {
    /// Tempo in BPM, 0.0 when undetermined
    pub fn tempo(&self) -> f32 {
        match self {
            FeatureOutcome::Detected(features) => features.tempo,
            FeatureOutcome::Undetermined(_) => 0.0,
        }
    }

    /// Dominant pitch class, `None` when undetermined or keyless
    pub fn key(&self) -> Option<PitchClass> {
        match self {
            FeatureOutcome::Detected(features) => features.key,
            FeatureOutcome::Undetermined(_) => None,
        }
    }

    /// Key as an index in 0-11
    pub fn key_index(&self) -> Option<usize> {
        self.key().map(PitchClass::index)
    }

    /// Detected features, if any
    pub fn features(&self) -> Option<&Features> {
        match self {
            FeatureOutcome::Detected(features) => Some(features),
            FeatureOutcome::Undetermined(_) => None,
        }
    }

    /// True when nothing could be determined
    pub fn is_undetermined(&self) -> bool {
        matches!(self, FeatureOutcome::Undetermined(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_class_index_roundtrip() {
        for i in 0..12 {
            let pc = PitchClass::from_index(i).unwrap();
            assert_eq!(pc.index(), i);
        }
        assert_eq!(PitchClass::from_index(12), None);
    }

    #[test]
    fn test_pitch_class_names() {
        assert_eq!(PitchClass::C.name(), "C");
        assert_eq!(PitchClass::CSharp.name(), "C#");
        assert_eq!(PitchClass::GSharp.to_string(), "G#");
        assert_eq!(PitchClass::B.name(), "B");
    }

    #[test]
    fn test_midi_note_octave4() {
        assert_eq!(PitchClass::C.midi_note_octave4(), 60);
        assert_eq!(PitchClass::A.midi_note_octave4(), 69);
        assert_eq!(PitchClass::B.midi_note_octave4(), 71);
    }

    #[test]
    fn test_undetermined_accessors() {
        let outcome = FeatureOutcome::Undetermined(Undetermined::Silence { energy: 0.0 });
        assert_eq!(outcome.tempo(), 0.0);
        assert_eq!(outcome.key_index(), None);
        assert!(outcome.is_undetermined());
        assert!(outcome.features().is_none());
    }

    #[test]
    fn test_detected_accessors() {
        let outcome = FeatureOutcome::Detected(Features {
            tempo: 118.5,
            key: Some(PitchClass::D),
            beat_times: vec![0.5, 1.0],
            metadata: AnalysisMetadata::default(),
        });
        assert_eq!(outcome.tempo(), 118.5);
        assert_eq!(outcome.key_index(), Some(2));
        assert!(!outcome.is_undetermined());
    }
}
