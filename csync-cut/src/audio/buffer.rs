//! Interleaved PCM buffer
//!
//! All pipeline stages after decoding operate on [`AudioBuffer`]. Positions
//! are addressed in milliseconds and converted to frames with
//! [`csync_common::timing`].

use csync_common::timing::{frames_to_ms, ms_to_frames};

/// Interleaved `f32` samples in [-1.0, 1.0]
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: usize,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: usize) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Empty buffer with the same format as `self`
    pub fn empty_like(&self) -> Self {
        Self::new(Vec::new(), self.sample_rate, self.channels)
    }

    /// Number of frames (one sample per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Duration in milliseconds, rounded
    pub fn duration_ms(&self) -> u64 {
        frames_to_ms(self.frames(), self.sample_rate)
    }

    /// Copy of the `[start_ms, end_ms)` range, clamped to the buffer
    pub fn slice_ms(&self, start_ms: u64, end_ms: u64) -> AudioBuffer {
        let total = self.frames();
        let start = ms_to_frames(start_ms, self.sample_rate).min(total);
        let end = ms_to_frames(end_ms, self.sample_rate).clamp(start, total);
        AudioBuffer::new(
            self.samples[start * self.channels..end * self.channels].to_vec(),
            self.sample_rate,
            self.channels,
        )
    }

    /// Drop everything after `duration_ms`
    pub fn truncate_ms(&mut self, duration_ms: u64) {
        let frames = ms_to_frames(duration_ms, self.sample_rate).min(self.frames());
        self.samples.truncate(frames * self.channels);
    }

    /// Average all channels into one
    pub fn mono(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples.clone();
        }
        self.samples
            .chunks_exact(self.channels)
            .map(|frame| frame.iter().sum::<f32>() / self.channels as f32)
            .collect()
    }

    /// Split into one sample vector per channel
    pub fn deinterleave(&self) -> Vec<Vec<f32>> {
        let mut channels = vec![Vec::with_capacity(self.frames()); self.channels];
        for frame in self.samples.chunks_exact(self.channels.max(1)) {
            for (ch, sample) in frame.iter().enumerate() {
                channels[ch].push(*sample);
            }
        }
        channels
    }

    /// Rebuild an interleaved buffer from per-channel vectors
    ///
    /// All channels must have the same length.
    pub fn interleave(channels: &[Vec<f32>], sample_rate: u32) -> AudioBuffer {
        let channel_count = channels.len();
        let frames = channels.first().map(|c| c.len()).unwrap_or(0);
        let mut samples = Vec::with_capacity(frames * channel_count);
        for i in 0..frames {
            for channel in channels {
                samples.push(channel[i]);
            }
        }
        AudioBuffer::new(samples, sample_rate, channel_count)
    }
}
