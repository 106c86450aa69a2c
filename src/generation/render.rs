//! Standard MIDI File rendering
//!
//! Each [`Sequence`] becomes a single-track (format 0) file with a track
//! name, its note events and an end-of-track marker.

use super::sequence::{NoteAction, Sequence};
use crate::error::HarmonyError;
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::fs;
use std::path::Path;

/// Render `sequence` to Standard MIDI File bytes
///
/// # Errors
///
/// Returns `HarmonyError::Render` if the channel, a note or a velocity is out
/// of MIDI range, or if serialization fails
pub fn render_smf(sequence: &Sequence) -> Result<Vec<u8>, HarmonyError> {
    if sequence.channel > 15 {
        return Err(HarmonyError::Render(format!(
            "Channel {} out of range",
            sequence.channel
        )));
    }
    if sequence.ticks_per_quarter == 0 || sequence.ticks_per_quarter > 0x7FFF {
        return Err(HarmonyError::Render(format!(
            "Invalid ticks per quarter: {}",
            sequence.ticks_per_quarter
        )));
    }

    let channel = sequence.channel.into();
    let mut track: Vec<TrackEvent> = Vec::with_capacity(sequence.events.len() + 2);
    track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(sequence.name.as_bytes())),
    });

    for event in &sequence.events {
        if event.note > 127 || event.velocity > 127 {
            return Err(HarmonyError::Render(format!(
                "Note event out of MIDI range: note={}, velocity={}",
                event.note, event.velocity
            )));
        }
        if event.delta > 0x0FFF_FFFF {
            return Err(HarmonyError::Render(format!(
                "Delta time {} too large",
                event.delta
            )));
        }
        let message = match event.action {
            NoteAction::On => MidiMessage::NoteOn {
                key: event.note.into(),
                vel: event.velocity.into(),
            },
            NoteAction::Off => MidiMessage::NoteOff {
                key: event.note.into(),
                vel: event.velocity.into(),
            },
        };
        track.push(TrackEvent {
            delta: event.delta.into(),
            kind: TrackEventKind::Midi { channel, message },
        });
    }

    track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let smf = Smf {
        header: Header::new(
            Format::SingleTrack,
            Timing::Metrical(sequence.ticks_per_quarter.into()),
        ),
        tracks: vec![track],
    };

    let mut buffer = Vec::new();
    smf.write(&mut buffer)
        .map_err(|e| HarmonyError::Render(format!("Failed to write MIDI: {}", e)))?;
    Ok(buffer)
}

/// Render `sequence` and write it to `path`, replacing any existing file
pub fn write_sequence(sequence: &Sequence, path: &Path) -> Result<(), HarmonyError> {
    let bytes = render_smf(sequence)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            HarmonyError::Render(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }
    fs::write(path, &bytes)
        .map_err(|e| HarmonyError::Render(format!("Failed to write {}: {}", path.display(), e)))?;
    log::info!(
        "Wrote {} ({} events, {} bytes)",
        path.display(),
        sequence.len(),
        bytes.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::PitchClass;
    use crate::generation::beat::generate_beat;
    use crate::generation::progression::generate_progression;
    use crate::generation::sequence::NoteEvent;

    #[test]
    fn test_beat_parses_back() {
        let bytes = render_smf(&generate_beat(100.0)).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 1);
        assert_eq!(smf.header.timing, Timing::Metrical(midly::num::u15::new(480)));

        let notes: Vec<(u8, u8, u32)> = smf.tracks[0]
            .iter()
            .filter_map(|event| match event.kind {
                TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOn { key, .. },
                } => Some((channel.as_int(), key.as_int(), event.delta.as_int())),
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOff { vel, .. },
                    ..
                } => {
                    assert!(vel.as_int() > 0);
                    None
                }
                _ => None,
            })
            .collect();
        assert_eq!(notes.len(), 13);
        assert!(notes.iter().all(|&(ch, _, delta)| ch == 9 && delta == 20));
        assert_eq!(notes[3].1, 49);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let a = render_smf(&generate_beat(123.0)).unwrap();
        let b = render_smf(&generate_beat(123.0)).unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[..4], b"MThd");
    }

    #[test]
    fn test_progression_lengths() {
        let bytes = render_smf(&generate_progression(PitchClass::D)).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        let total: u32 = smf.tracks[0].iter().map(|e| e.delta.as_int()).sum();
        assert_eq!(total, 4 * 960);
    }

    #[test]
    fn test_out_of_range_note_fails() {
        let mut seq = Sequence::new("bad", 0);
        seq.push(NoteEvent::on(200, 90, 0));
        assert!(matches!(render_smf(&seq), Err(HarmonyError::Render(_))));
    }

    #[test]
    fn test_write_to_missing_directory_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("beat.mid");
        write_sequence(&generate_beat(120.0), &path).unwrap();
        assert!(path.exists());
    }
}
