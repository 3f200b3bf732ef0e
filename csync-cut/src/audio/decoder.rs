//! Audio decoding
//!
//! Uses symphonia for format-agnostic decoding (MP3, FLAC, AAC, WAV, OGG, ...)
//! into an interleaved [`AudioBuffer`] at the source sample rate and channel
//! layout. Any probe or decode failure is reported as
//! [`CutError::UnexpectedAudioFormat`].

use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::AudioBuffer;
use crate::error::{CutError, CutResult};

/// Decode an audio file on disk
pub fn decode_audio_file(file_path: &Path) -> CutResult<AudioBuffer> {
    tracing::debug!(path = %file_path.display(), "Decoding audio file");

    let file = std::fs::File::open(file_path).map_err(|e| {
        CutError::UnexpectedAudioFormat(format!("Open {} failed: {}", file_path.display(), e))
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    decode_stream(mss, hint, &file_path.display().to_string())
}

/// Decode an in-memory encoded file (as downloaded from the object store)
///
/// `extension_hint` is the original file extension if known.
pub fn decode_audio_bytes(bytes: Vec<u8>, extension_hint: Option<&str>) -> CutResult<AudioBuffer> {
    let mss = MediaSourceStream::new(Box::new(std::io::Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = extension_hint {
        hint.with_extension(extension);
    }

    decode_stream(mss, hint, "<memory>")
}

fn decode_stream(mss: MediaSourceStream, hint: Hint, source: &str) -> CutResult<AudioBuffer> {
    let format_err = |what: &str, e: &dyn std::fmt::Display| {
        CutError::UnexpectedAudioFormat(format!("{} {}: {}", what, source, e))
    };

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| format_err("Failed to probe", &e))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| CutError::UnexpectedAudioFormat(format!("No audio track in {}", source)))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| format_err("Failed to create decoder for", &e))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(format_err("Error reading packet from", &e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // Corrupt frame: skip it and keep going
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!(source = source, error = e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(format_err("Failed to decode packet in", &e)),
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        channels.get_or_insert(spec.channels.count());

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    let (sample_rate, channels) = match (sample_rate, channels) {
        (Some(rate), Some(ch)) if rate > 0 && ch > 0 => (rate, ch),
        _ => {
            return Err(CutError::UnexpectedAudioFormat(format!(
                "Unknown sample rate or channel layout in {}",
                source
            )))
        }
    };

    if samples.len() % channels != 0 {
        return Err(CutError::UnexpectedAudioFormat(format!(
            "{} samples is not a whole number of {}-channel frames",
            samples.len(),
            channels
        )));
    }

    let buffer = AudioBuffer::new(samples, sample_rate, channels);

    tracing::debug!(
        source = source,
        sample_rate = sample_rate,
        channels = channels,
        duration_ms = buffer.duration_ms(),
        "Audio decoding complete"
    );

    Ok(buffer)
}
