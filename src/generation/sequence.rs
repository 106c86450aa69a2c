//! Note event sequences
//!
//! A [`Sequence`] is an ordered list of note events on one MIDI channel with
//! delta times in ticks, ready to be rendered as a single-track MIDI file.

use serde::{Deserialize, Serialize};

/// Ticks per quarter note used by every generated sequence
pub const TICKS_PER_QUARTER: u16 = 480;

/// General MIDI percussion channel (channel 10, zero-based 9)
pub const DRUM_CHANNEL: u8 = 9;

/// Channel used for melodic parts
pub const PIANO_CHANNEL: u8 = 0;

/// Note on or off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteAction {
    /// Key pressed
    On,
    /// Key released
    Off,
}

/// A single note event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Note on or off
    pub action: NoteAction,
    /// MIDI note number (drum voice id on the percussion channel)
    pub note: u8,
    /// Velocity (carried on note-off as well)
    pub velocity: u8,
    /// Ticks since the previous event
    pub delta: u32,
}

impl NoteEvent {
    /// Note-on event
    pub fn on(note: u8, velocity: u8, delta: u32) -> Self {
        Self {
            action: NoteAction::On,
            note,
            velocity,
            delta,
        }
    }

    /// Note-off event
    pub fn off(note: u8, velocity: u8, delta: u32) -> Self {
        Self {
            action: NoteAction::Off,
            note,
            velocity,
            delta,
        }
    }
}

/// Ordered note events on one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    /// Track name written into the rendered file
    pub name: String,
    /// MIDI channel (0-15)
    pub channel: u8,
    /// Ticks per quarter note
    pub ticks_per_quarter: u16,
    /// Events in playback order
    pub events: Vec<NoteEvent>,
}

impl Sequence {
    /// Empty sequence
    pub fn new(name: impl Into<String>, channel: u8) -> Self {
        Self {
            name: name.into(),
            channel,
            ticks_per_quarter: TICKS_PER_QUARTER,
            events: Vec::new(),
        }
    }

    /// Append an event
    pub fn push(&mut self, event: NoteEvent) {
        self.events.push(event);
    }

    /// Total length in ticks
    pub fn total_ticks(&self) -> u64 {
        self.events.iter().map(|e| e.delta as u64).sum()
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if there are no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
