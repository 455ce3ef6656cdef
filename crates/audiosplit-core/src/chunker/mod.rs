//! Duration-bounded splitting with a size-driven shrink retry.
//!
//! Windows are cut at fixed offsets of `max_duration_ms`. After encoding, a
//! window whose file exceeds `max_size_bytes` is shortened by 10% and encoded
//! again, unless it is already at the one-minute floor. Under
//! [`ShrinkPolicy::Once`] this happens at most once per window and an
//! oversized result is kept.
//!
//! Every encode goes to a staging file inside the output directory that is
//! renamed onto `{base}_partNNN.m4a` only once the window is settled. An
//! error or cancellation drops the staging file, so a final path never holds
//! a half-shrunk chunk.

mod window;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tempfile::TempPath;

use crate::audio::{AudioEncoder, AudioTrack, DEFAULT_BITRATE, create_encoder, load_audio_file};
use crate::config::{BYTES_PER_MB, ShrinkPolicy, SplitConfig};
use crate::error::{ChunkerError, Result};

pub use window::{ChunkWindow, next_window, plan_windows, shrink_duration};

/// One encoded chunk on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    /// 1-based sequence number
    pub index: usize,
    /// Final time range covered by the file (after any shrink)
    pub window: ChunkWindow,
    pub size_bytes: u64,
    /// Number of shrink retries applied to this window
    pub shrink_count: usize,
}

impl OutputFile {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / BYTES_PER_MB
    }
}

/// Cooperative cancellation flag, checked before each window.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

type ProgressCallback = Box<dyn Fn(&OutputFile, usize) + Send + Sync>;

/// Splits tracks into chunk files using an [`AudioEncoder`].
pub struct Chunker {
    encoder: Box<dyn AudioEncoder>,
    cancel: CancelToken,
    progress: Option<ProgressCallback>,
}

impl Chunker {
    pub fn new(encoder: Box<dyn AudioEncoder>) -> Self {
        Self {
            encoder,
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Called once per chunk, in sequence order, after it is on disk, with
    /// the number of chunks finished so far.
    pub fn with_progress(
        mut self,
        callback: impl Fn(&OutputFile, usize) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Decode `input` and split it according to `config`.
    ///
    /// Configuration and input existence are checked before any decoding.
    pub fn split(&self, input: &Path, config: &SplitConfig) -> Result<Vec<OutputFile>> {
        config.validate()?;
        if !input.is_file() {
            return Err(ChunkerError::InvalidConfig(format!(
                "input file '{}' does not exist",
                input.display()
            )));
        }

        tracing::info!("Loading audio file: {}", input.display());
        let track = load_audio_file(input)?;
        self.split_track(&track, config)
    }

    /// Split an already-decoded track.
    pub fn split_track(&self, track: &AudioTrack, config: &SplitConfig) -> Result<Vec<OutputFile>> {
        config.validate()?;

        std::fs::create_dir_all(&config.output_dir)
            .map_err(|e| ChunkerError::io(&config.output_dir, e))?;

        let total_ms = track.duration_ms();
        tracing::info!(
            "Total audio duration: {:.2} minutes",
            total_ms as f64 / 60_000.0
        );
        if total_ms == 0 {
            tracing::warn!("Track is empty, nothing to split");
        } else {
            tracing::info!(
                "Planned {} chunks before any size-driven shrink",
                plan_windows(total_ms, config.max_duration_ms).len()
            );
        }

        let mut outputs = Vec::new();
        let mut start_ms = 0;
        let mut index = 1;

        while start_ms < total_ms {
            if self.cancel.is_cancelled() {
                tracing::info!("Splitting cancelled before chunk {index}");
                return Err(ChunkerError::Cancelled);
            }

            let window = next_window(start_ms, total_ms, config.max_duration_ms, index);
            let output = match self.produce_chunk(track, window, config) {
                Ok(output) => output,
                // An interrupt can take the encoder down with it mid-chunk
                Err(e) if self.cancel.is_cancelled() => {
                    tracing::info!("Splitting cancelled during chunk {index}: {e}");
                    return Err(ChunkerError::Cancelled);
                }
                Err(e) => return Err(e),
            };

            if let Some(callback) = &self.progress {
                callback(&output, outputs.len() + 1);
            }

            start_ms = output.window.end_ms;
            index += 1;
            outputs.push(output);
        }

        tracing::info!(
            "Audio splitting complete. {} chunks created in {}",
            outputs.len(),
            config.output_dir.display()
        );

        Ok(outputs)
    }

    /// Encode one window, shrinking it if the file overshoots the size limit.
    fn produce_chunk(
        &self,
        track: &AudioTrack,
        mut window: ChunkWindow,
        config: &SplitConfig,
    ) -> Result<OutputFile> {
        tracing::info!(
            "Exporting chunk {}: {:.2} min to {:.2} min",
            window.index,
            window.start_ms as f64 / 60_000.0,
            window.end_ms as f64 / 60_000.0
        );

        let (mut staged, mut size_bytes) = self.encode_staged(track, window, config)?;
        tracing::info!("Chunk size: {:.2} MB", size_bytes as f64 / BYTES_PER_MB);

        let max_retries = match config.shrink_policy {
            ShrinkPolicy::Once => 1,
            ShrinkPolicy::Converge => usize::MAX,
        };
        let mut shrink_count = 0;

        while size_bytes > config.max_size_bytes && window.above_floor() && shrink_count < max_retries
        {
            window = match config.shrink_policy {
                ShrinkPolicy::Once => window.shrunk(),
                ShrinkPolicy::Converge => window.shrunk_to_floor(),
            };
            tracing::info!(
                "Chunk too large, reducing to {:.2} minutes",
                window.duration_ms() as f64 / 60_000.0
            );

            // Replacing the guard deletes the oversized staging file
            (staged, size_bytes) = self.encode_staged(track, window, config)?;
            shrink_count += 1;
            tracing::info!("New chunk size: {:.2} MB", size_bytes as f64 / BYTES_PER_MB);
        }

        if size_bytes > config.max_size_bytes {
            tracing::warn!(
                "Chunk {} is {:.2} MB, over the {:.2} MB limit; keeping it",
                window.index,
                size_bytes as f64 / BYTES_PER_MB,
                config.max_size_bytes as f64 / BYTES_PER_MB
            );
        }

        let path = config.chunk_path(window.index, self.encoder.extension());
        staged
            .persist(&path)
            .map_err(|e| ChunkerError::io(&path, e.error))?;

        Ok(OutputFile {
            path,
            index: window.index,
            window,
            size_bytes,
            shrink_count,
        })
    }

    /// Encode `window` to a fresh staging file and measure it.
    fn encode_staged(
        &self,
        track: &AudioTrack,
        window: ChunkWindow,
        config: &SplitConfig,
    ) -> Result<(TempPath, u64)> {
        let staged = tempfile::Builder::new()
            .prefix(&format!(".{}_part{:03}.", config.base_name, window.index))
            .suffix(".partial")
            .tempfile_in(&config.output_dir)
            .map_err(|e| ChunkerError::io(&config.output_dir, e))?
            .into_temp_path();

        let slice = track.slice(window.start_ms, window.end_ms);
        self.encoder.encode(&slice, &staged)?;

        let size_bytes = std::fs::metadata(&staged)
            .map_err(|e| ChunkerError::io(staged.to_path_buf(), e))?
            .len();

        Ok((staged, size_bytes))
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(create_encoder(DEFAULT_BITRATE))
    }
}

/// Split `input` with the default ffmpeg encoder.
pub fn split(input: &Path, config: &SplitConfig) -> Result<Vec<OutputFile>> {
    Chunker::default().split(input, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const MINUTE: u64 = 60_000;

    /// Writes `bytes_per_second * seconds` bytes and records every window
    /// duration it was asked to encode.
    struct SizedEncoder {
        bytes_per_second: u64,
        calls: Arc<Mutex<Vec<u64>>>,
    }

    impl AudioEncoder for SizedEncoder {
        fn extension(&self) -> &str {
            "m4a"
        }

        fn encode(&self, track: &AudioTrack, dest: &Path) -> Result<()> {
            if track.is_empty() {
                return Err(ChunkerError::Encode("empty".into()));
            }
            self.calls.lock().unwrap().push(track.duration_ms());
            let len = track.duration_ms() * self.bytes_per_second / 1000;
            std::fs::write(dest, vec![0u8; len as usize]).map_err(|e| ChunkerError::io(dest, e))
        }
    }

    fn chunker(bytes_per_second: u64) -> (Chunker, Arc<Mutex<Vec<u64>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let encoder = SizedEncoder {
            bytes_per_second,
            calls: Arc::clone(&calls),
        };
        (Chunker::new(Box::new(encoder)), calls)
    }

    /// Silent mono track at 10 Hz so long durations stay cheap.
    fn silent_track(duration_ms: u64) -> AudioTrack {
        AudioTrack::new(vec![0.0; (duration_ms / 100) as usize], 10, 1)
    }

    fn config(dir: &Path, max_minutes: u32, max_size_bytes: u64) -> SplitConfig {
        SplitConfig {
            max_size_bytes,
            ..SplitConfig::from_limits(dir, "talk", max_minutes, 1.0)
        }
    }

    #[test]
    fn test_windows_without_shrink() {
        let dir = tempfile::tempdir().unwrap();
        let (chunker, calls) = chunker(1);
        let outputs = chunker
            .split_track(&silent_track(45 * MINUTE), &config(dir.path(), 20, u64::MAX))
            .unwrap();

        assert_eq!(outputs.len(), 3);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![20 * MINUTE, 20 * MINUTE, 5 * MINUTE]
        );
        assert!(outputs.iter().all(|o| o.shrink_count == 0));
        assert_eq!(outputs[2].path, dir.path().join("talk_part003.m4a"));
    }

    #[test]
    fn test_single_shrink_then_keep_oversized() {
        let dir = tempfile::tempdir().unwrap();
        // 20 minutes at 1 KB/s is 1.2 MB; 18 minutes is still over 1 MB
        let (chunker, calls) = chunker(1000);
        let cfg = config(dir.path(), 20, 1_000_000);
        let outputs = chunker.split_track(&silent_track(20 * MINUTE), &cfg).unwrap();

        assert_eq!(calls.lock().unwrap()[..2], [20 * MINUTE, 18 * MINUTE]);
        assert_eq!(outputs[0].shrink_count, 1);
        assert_eq!(outputs[0].window.duration_ms(), 18 * MINUTE);
        assert!(outputs[0].size_bytes > cfg.max_size_bytes);
        // The remaining two minutes become a second chunk
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[1].window.start_ms, 18 * MINUTE);
    }

    #[test]
    fn test_converge_policy_stops_at_floor() {
        let dir = tempfile::tempdir().unwrap();
        let (chunker, _) = chunker(1000);
        let cfg = config(dir.path(), 5, 10).with_shrink_policy(ShrinkPolicy::Converge);
        let outputs = chunker.split_track(&silent_track(5 * MINUTE), &cfg).unwrap();

        assert_eq!(outputs[0].window.duration_ms(), MINUTE);
        assert!(outputs[0].shrink_count > 1);
        let covered: u64 = outputs.iter().map(|o| o.window.duration_ms()).sum();
        assert_eq!(covered, 5 * MINUTE);
    }

    #[test]
    fn test_cancelled_before_first_window() {
        let dir = tempfile::tempdir().unwrap();
        let (chunker, calls) = chunker(1);
        chunker.cancel_token().cancel();

        let err = chunker
            .split_track(&silent_track(MINUTE), &config(dir.path(), 20, u64::MAX))
            .unwrap_err();
        assert!(matches!(err, ChunkerError::Cancelled));
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_progress_reports_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let (chunker, _) = chunker(1);
        let chunker =
            chunker.with_progress(move |o, done| sink.lock().unwrap().push((o.index, done)));

        chunker
            .split_track(&silent_track(50 * MINUTE), &config(dir.path(), 20, u64::MAX))
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![(1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_no_staging_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let (chunker, _) = chunker(1000);
        chunker
            .split_track(&silent_track(25 * MINUTE), &config(dir.path(), 20, 1_000_000))
            .unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().all(|n| !n.ends_with(".partial")), "{names:?}");
    }

    /// Fails the way an encoder child does when the interrupt that set the
    /// token also reached it.
    struct InterruptedEncoder {
        cancel: CancelToken,
    }

    impl AudioEncoder for InterruptedEncoder {
        fn extension(&self) -> &str {
            "m4a"
        }

        fn encode(&self, _track: &AudioTrack, _dest: &Path) -> Result<()> {
            self.cancel.cancel();
            Err(ChunkerError::Encode(
                "ffmpeg exited with signal: 2 (SIGINT)".into(),
            ))
        }
    }

    #[test]
    fn test_encode_failure_after_interrupt_is_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancelToken::new();
        let chunker = Chunker::new(Box::new(InterruptedEncoder {
            cancel: cancel.clone(),
        }))
        .with_cancel_token(cancel);

        let err = chunker
            .split_track(&silent_track(5 * MINUTE), &config(dir.path(), 1, u64::MAX))
            .unwrap_err();
        assert!(matches!(err, ChunkerError::Cancelled), "{err:?}");

        let names: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(names.is_empty(), "{names:?}");
    }

    #[test]
    fn test_encode_failure_without_interrupt_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let chunker = Chunker::new(Box::new(InterruptedEncoder {
            cancel: CancelToken::new(),
        }));

        let err = chunker
            .split_track(&silent_track(MINUTE), &config(dir.path(), 1, u64::MAX))
            .unwrap_err();
        assert!(matches!(err, ChunkerError::Encode(_)), "{err:?}");
    }
}
