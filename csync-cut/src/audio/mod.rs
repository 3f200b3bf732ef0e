//! Audio buffers, decoding, WAV interchange and signal processing

pub mod buffer;
pub mod decoder;
pub mod energy;
pub mod time_stretch;
pub mod wav;

pub use buffer::AudioBuffer;
pub use decoder::{decode_audio_bytes, decode_audio_file};
pub use energy::EnergyProfile;
pub use time_stretch::{time_stretch, PhaseVocoder};
