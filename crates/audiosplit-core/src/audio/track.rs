//! Decoded audio held in memory for the duration of one splitting run.

use std::sync::Arc;

/// Immutable interleaved f32 PCM with cheap, non-copying slicing.
///
/// Slices share the underlying buffer, so a track and all of its windows
/// can be handed to encoders on other threads without copying samples.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    samples: Arc<[f32]>,
    sample_rate: u32,
    channels: u16,
    /// Frame range of this view into `samples`
    start_frame: usize,
    end_frame: usize,
}

impl AudioTrack {
    /// Wrap interleaved samples. A trailing partial frame is ignored.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1);
        let frames = samples.len() / channels as usize;
        Self {
            samples: samples.into(),
            sample_rate,
            channels,
            start_frame: 0,
            end_frame: frames,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.end_frame - self.start_frame
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Whole milliseconds covered by this view (rounded down).
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames() as u64 * 1000 / u64::from(self.sample_rate)
    }

    /// Interleaved samples of this view.
    pub fn samples(&self) -> &[f32] {
        let ch = self.channels as usize;
        &self.samples[self.start_frame * ch..self.end_frame * ch]
    }

    /// View of `[start_ms, end_ms)` relative to this track.
    ///
    /// Bounds are clamped to the track. An `end_ms` at or past
    /// `duration_ms()` extends to the last frame, so the sub-millisecond
    /// tail is never dropped from the final window.
    pub fn slice(&self, start_ms: u64, end_ms: u64) -> AudioTrack {
        let start = self.frame_at(start_ms);
        let end = if end_ms >= self.duration_ms() {
            self.end_frame
        } else {
            self.frame_at(end_ms)
        };

        AudioTrack {
            samples: Arc::clone(&self.samples),
            sample_rate: self.sample_rate,
            channels: self.channels,
            start_frame: start,
            end_frame: end.max(start),
        }
    }

    fn frame_at(&self, ms: u64) -> usize {
        let offset = ms.saturating_mul(u64::from(self.sample_rate)) / 1000;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        self.start_frame.saturating_add(offset).min(self.end_frame)
    }
}
