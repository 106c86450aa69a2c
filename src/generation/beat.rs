//! Drum beat generation
//!
//! One measure of four beats. Each beat plays bass drum, snare and closed
//! hi-hat in that order; the first beat adds a crash cymbal. Every event is
//! spaced by the same tempo-dependent tick delta.

use super::sequence::{NoteEvent, Sequence, DRUM_CHANNEL};

/// Beats per generated measure
pub const BEATS_PER_MEASURE: usize = 4;

/// Smallest allowed spacing between events in ticks
pub const MIN_TICK_DELTA: u32 = 10;

/// Spacing baseline the tempo is subtracted from
const TICK_BASE: i64 = 120;

/// Largest delta a MIDI variable-length quantity can hold
const MAX_TICK_DELTA: i64 = 0x0FFF_FFFF;

/// General MIDI drum voices used by the pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrumVoice {
    /// Bass drum 1 (36)
    BassDrum,
    /// Acoustic snare (38)
    Snare,
    /// Closed hi-hat (42)
    ClosedHiHat,
    /// Crash cymbal 1 (49)
    Crash,
}

impl DrumVoice {
    /// General MIDI note number
    pub fn note(self) -> u8 {
        match self {
            DrumVoice::BassDrum => 36,
            DrumVoice::Snare => 38,
            DrumVoice::ClosedHiHat => 42,
            DrumVoice::Crash => 49,
        }
    }

    /// Velocity the pattern plays this voice at
    pub fn velocity(self) -> u8 {
        match self {
            DrumVoice::BassDrum => 110,
            DrumVoice::Snare => 100,
            DrumVoice::ClosedHiHat => 80,
            DrumVoice::Crash => 120,
        }
    }
}

/// Event spacing for `tempo`: `max(120 - trunc(tempo), 10)` ticks
///
/// NaN counts as 0.
///
/// # Example
///
/// ```
/// use harmonybot::generation::beat::tick_delta;
///
/// assert_eq!(tick_delta(100.0), 20);
/// assert_eq!(tick_delta(99.9), 21);
/// assert_eq!(tick_delta(200.0), 10);
/// ```
pub fn tick_delta(tempo: f32) -> u32 {
    // `as` saturates and maps NaN to 0
    let whole = tempo.trunc() as i64;
    TICK_BASE
        .saturating_sub(whole)
        .clamp(MIN_TICK_DELTA as i64, MAX_TICK_DELTA) as u32
}

/// Generate the drum pattern for `tempo`
///
/// Pure and deterministic: 26 events, all with delta [`tick_delta`]`(tempo)`.
pub fn generate_beat(tempo: f32) -> Sequence {
    let delta = tick_delta(tempo);
    log::debug!("Generating beat: tempo={:.2}, delta={} ticks", tempo, delta);

    let mut sequence = Sequence::new("Beat", DRUM_CHANNEL);
    for beat in 0..BEATS_PER_MEASURE {
        let mut voices = vec![DrumVoice::BassDrum, DrumVoice::Snare, DrumVoice::ClosedHiHat];
        if beat == 0 {
            voices.push(DrumVoice::Crash);
        }
        for voice in voices {
            sequence.push(NoteEvent::on(voice.note(), voice.velocity(), delta));
            sequence.push(NoteEvent::off(voice.note(), voice.velocity(), delta));
        }
    }
    sequence
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::sequence::NoteAction;

    #[test]
    fn test_event_count_and_order() {
        let beat = generate_beat(200.0);
        assert_eq!(beat.len(), 26);
        assert_eq!(beat.channel, DRUM_CHANNEL);

        let notes: Vec<u8> = beat.events.iter().step_by(2).map(|e| e.note).collect();
        assert_eq!(notes, vec![36, 38, 42, 49, 36, 38, 42, 36, 38, 42, 36, 38, 42]);

        for pair in beat.events.chunks(2) {
            assert_eq!(pair[0].action, NoteAction::On);
            assert_eq!(pair[1].action, NoteAction::Off);
            assert_eq!(pair[0].note, pair[1].note);
            assert_eq!(pair[0].velocity, pair[1].velocity);
        }
    }

    #[test]
    fn test_velocities() {
        let beat = generate_beat(90.0);
        let velocity_of = |note: u8| beat.events.iter().find(|e| e.note == note).map(|e| e.velocity);
        assert_eq!(velocity_of(36), Some(110));
        assert_eq!(velocity_of(38), Some(100));
        assert_eq!(velocity_of(42), Some(80));
        assert_eq!(velocity_of(49), Some(120));
    }

    #[test]
    fn test_fast_tempo_clamps_delta() {
        for tempo in [110.0, 111.5, 150.0, 200.0, 1e9] {
            assert_eq!(tick_delta(tempo), 10);
        }
        assert!(generate_beat(200.0).events.iter().all(|e| e.delta == 10));
    }

    #[test]
    fn test_slow_tempo_delta() {
        assert_eq!(tick_delta(0.0), 120);
        assert_eq!(tick_delta(60.7), 60);
        assert_eq!(tick_delta(f32::NAN), 120);
        assert_eq!(tick_delta(-5.0), 125);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(generate_beat(97.3), generate_beat(97.3));
    }
}
