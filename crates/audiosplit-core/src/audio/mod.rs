//! Audio decoding, in-memory tracks and chunk encoding.

pub mod encoder;
mod loader;
mod track;

pub use encoder::{
    AudioEncoder, DEFAULT_BITRATE, FfmpegEncoder, create_encoder, ffmpeg_available,
};
pub use loader::load_audio_file;
pub use track::AudioTrack;
