//! Audio I/O modules
//!
//! Live capture (cpal), file decoding (Symphonia), the normalized-capture
//! artifact writer (hound) and the buffer types passed between stages.

pub mod capture;
pub mod decoder;
pub mod sample_buffer;
pub mod wav;

pub use capture::{AudioSource, DeviceSource};
pub use decoder::decode_audio;
pub use sample_buffer::{AudioBuffer, PreparedAudio, Samples};
pub use wav::write_wav;
