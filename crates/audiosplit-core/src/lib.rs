pub mod audio;
pub mod chunker;
pub mod config;
pub mod error;
pub mod settings;

pub use audio::{AudioEncoder, AudioTrack, FfmpegEncoder, ffmpeg_available, load_audio_file};
pub use chunker::{CancelToken, ChunkWindow, Chunker, OutputFile, plan_windows, split};
pub use config::{MIN_WINDOW_MS, ShrinkPolicy, SplitConfig};
pub use error::ChunkerError;
pub use settings::Settings;
