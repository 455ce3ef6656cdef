//! Audio encoding seam. Chunks are always written as AAC in an m4a container.

mod ffmpeg;

use std::path::Path;

use crate::audio::AudioTrack;
use crate::error::Result;

pub use ffmpeg::{DEFAULT_BITRATE, FfmpegEncoder, ffmpeg_available};

/// Trait for encoding an in-memory slice to a file on disk.
pub trait AudioEncoder: Send + Sync {
    /// File extension of the produced files, without the dot.
    fn extension(&self) -> &str;

    /// Encode `track` and write the result to `dest`, replacing any
    /// existing file.
    ///
    /// # Errors
    /// Returns [`crate::ChunkerError::Encode`] if the slice is empty or the
    /// backend rejects it.
    fn encode(&self, track: &AudioTrack, dest: &Path) -> Result<()>;
}

/// Create the default encoder (ffmpeg, AAC at `bitrate`).
pub fn create_encoder(bitrate: &str) -> Box<dyn AudioEncoder> {
    Box::new(FfmpegEncoder::new().with_bitrate(bitrate))
}
