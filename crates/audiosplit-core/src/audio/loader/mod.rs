//! Audio loading from files.

mod file;

pub use file::load_audio_file;
