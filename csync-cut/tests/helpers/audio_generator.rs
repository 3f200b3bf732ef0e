//! Audio Test Fixture Generator

use csync_common::models::{AnalysisResult, Section};
use std::io::Cursor;

/// Sample rate of the fixtures; low to keep the pipeline fast
pub const FIXTURE_SAMPLE_RATE: u32 = 1000;

/// Mono float WAV of constant `level`
pub fn constant_wav_bytes(duration_seconds: f64, level: f32) -> Vec<u8> {
    let frames = (duration_seconds * FIXTURE_SAMPLE_RATE as f64) as usize;
    write_float_wav(&vec![level; frames], FIXTURE_SAMPLE_RATE, 1)
}

/// 16-bit stereo WAV with a 110 Hz tone at 30% amplitude
pub fn tone_wav_bytes(duration_seconds: f64, sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let total_samples = (duration_seconds * sample_rate as f64) as usize;
        for i in 0..total_samples {
            let t = i as f32 / sample_rate as f32;
            let sample =
                (0.3 * (2.0 * std::f32::consts::PI * 110.0 * t).sin() * i16::MAX as f32) as i16;
            writer.write_sample(sample).unwrap();
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn write_float_wav(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Analysis of the 80 s fixture: intro, verse, chorus, outro at 120 bpm
pub fn fixture_analysis() -> AnalysisResult {
    AnalysisResult {
        sections: vec![
            Section::new("intro", 0.0, 10.0),
            Section::new("verse", 10.0, 40.0),
            Section::new("chorus", 40.0, 70.0),
            Section::new("outro", 70.0, 80.0),
        ],
        beats: (0..160).map(|i| i as f64 * 0.5).collect(),
        downbeats: (0..=40).map(|i| i as f64 * 2.0).collect(),
        bpm: 120.0,
    }
}
