//! Chord progression generation
//!
//! I - IV - V - I in close position from the root in octave 4, each chord
//! held for two quarter notes.

use super::sequence::{NoteEvent, Sequence, PIANO_CHANNEL, TICKS_PER_QUARTER};
use crate::analysis::result::PitchClass;

/// Chord tones as semitone offsets from the root
pub const CHORDS: [[u8; 3]; 4] = [[0, 4, 7], [5, 9, 12], [7, 11, 14], [0, 4, 7]];

/// Quarter notes each chord is held
pub const QUARTERS_PER_CHORD: u32 = 2;

/// Velocity for all chord tones
pub const CHORD_VELOCITY: u8 = 90;

/// Generate the progression rooted at `key`
///
/// All tones of a chord start together and stop together; the next chord
/// starts as the previous one is released.
pub fn generate_progression(key: PitchClass) -> Sequence {
    let root = key.midi_note_octave4();
    let length = QUARTERS_PER_CHORD * TICKS_PER_QUARTER as u32;
    log::debug!("Generating progression in {} (root MIDI {})", key, root);

    let mut sequence = Sequence::new("Piano", PIANO_CHANNEL);
    for chord in CHORDS.iter() {
        for &offset in chord {
            sequence.push(NoteEvent::on(root + offset, CHORD_VELOCITY, 0));
        }
        for (i, &offset) in chord.iter().enumerate() {
            let delta = if i == 0 { length } else { 0 };
            sequence.push(NoteEvent::off(root + offset, CHORD_VELOCITY, delta));
        }
    }
    sequence
}
