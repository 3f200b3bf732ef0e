//! WAV interchange via hound
//!
//! 32-bit float WAV is the lossless hand-off format between the pipeline and
//! external tools (loudness normalizer, MP3 encoder).

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use super::AudioBuffer;
use crate::error::{CutError, CutResult};

fn spec_for(buffer: &AudioBuffer) -> CutResult<WavSpec> {
    let channels = u16::try_from(buffer.channels)
        .ok()
        .filter(|c| *c > 0)
        .ok_or_else(|| {
            CutError::UnexpectedAudioFormat(format!("Cannot write {} channels", buffer.channels))
        })?;
    Ok(WavSpec {
        channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    })
}

fn wav_err(e: hound::Error) -> CutError {
    CutError::UnexpectedAudioFormat(format!("WAV error: {}", e))
}

/// Write `buffer` to `path` as a float WAV file
pub fn write_wav(path: &Path, buffer: &AudioBuffer) -> CutResult<()> {
    let mut writer = WavWriter::create(path, spec_for(buffer)?).map_err(wav_err)?;
    for sample in &buffer.samples {
        writer.write_sample(*sample).map_err(wav_err)?;
    }
    writer.finalize().map_err(wav_err)
}

/// Encode `buffer` into an in-memory float WAV file
pub fn encode_wav(buffer: &AudioBuffer) -> CutResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec_for(buffer)?).map_err(wav_err)?;
        for sample in &buffer.samples {
            writer.write_sample(*sample).map_err(wav_err)?;
        }
        writer.finalize().map_err(wav_err)?;
    }
    Ok(cursor.into_inner())
}

/// Read a WAV file (integer or float samples) into an [`AudioBuffer`]
pub fn read_wav(path: &Path) -> CutResult<AudioBuffer> {
    let reader = WavReader::open(path).map_err(wav_err)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(wav_err)?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(wav_err)?
        }
    };

    Ok(AudioBuffer::new(
        samples,
        spec.sample_rate,
        spec.channels as usize,
    ))
}
