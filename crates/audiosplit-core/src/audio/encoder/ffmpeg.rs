//! FFmpeg-backed AAC/m4a encoder.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::AudioEncoder;
use crate::audio::AudioTrack;
use crate::error::{ChunkerError, Result};

/// Default AAC bitrate
pub const DEFAULT_BITRATE: &str = "128k";

/// Samples written to ffmpeg's stdin per write call
const PIPE_CHUNK_SAMPLES: usize = 64 * 1024;

/// Encodes raw PCM to AAC in an m4a (`ipod` muxer) container by piping
/// little-endian f32 samples into an `ffmpeg` child process.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
    bitrate: String,
}

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            bitrate: DEFAULT_BITRATE.to_string(),
        }
    }

    /// Use a specific ffmpeg binary instead of the one on `PATH`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.bitrate = bitrate.into();
        self
    }

    pub fn bitrate(&self) -> &str {
        &self.bitrate
    }

    fn command(&self, track: &AudioTrack, dest: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-hide_banner", "-loglevel", "error", "-f", "f32le", "-ar"])
            .arg(track.sample_rate().to_string())
            .arg("-ac")
            .arg(track.channels().to_string())
            .args(["-i", "pipe:0", "-codec:a", "aac", "-b:a"])
            .arg(&self.bitrate)
            // Output names may carry a staging suffix, so the muxer is explicit
            .args(["-f", "ipod", "-y"])
            .arg(dest)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // Own process group: a terminal Ctrl-C must not kill the chunk in flight
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        cmd
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEncoder for FfmpegEncoder {
    fn extension(&self) -> &str {
        "m4a"
    }

    fn encode(&self, track: &AudioTrack, dest: &Path) -> Result<()> {
        if track.is_empty() {
            return Err(ChunkerError::Encode(
                "refusing to encode a zero-length slice".to_string(),
            ));
        }

        tracing::debug!(
            "ffmpeg: encoding {} ms ({} Hz, {} ch) at {} to {}",
            track.duration_ms(),
            track.sample_rate(),
            track.channels(),
            self.bitrate,
            dest.display()
        );

        let mut child = self.command(track, dest).spawn().map_err(|e| {
            ChunkerError::Encode(format!(
                "failed to execute {} ({e}). Make sure ffmpeg is installed.",
                self.program.display()
            ))
        })?;

        // Write PCM to ffmpeg's stdin; dropping the handle closes the pipe
        let write_result = match child.stdin.take() {
            Some(mut stdin) => write_pcm(&mut stdin, track.samples()),
            None => Ok(()),
        };

        let output = child
            .wait_with_output()
            .map_err(|e| ChunkerError::Encode(format!("failed to wait for ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ChunkerError::Encode(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        write_result
            .map_err(|e| ChunkerError::Encode(format!("failed to stream audio to ffmpeg: {e}")))
    }
}

fn write_pcm(out: &mut impl Write, samples: &[f32]) -> std::io::Result<()> {
    let mut bytes = Vec::with_capacity(PIPE_CHUNK_SAMPLES.min(samples.len()) * 4);
    for chunk in samples.chunks(PIPE_CHUNK_SAMPLES) {
        bytes.clear();
        for sample in chunk {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        out.write_all(&bytes)?;
    }
    out.flush()
}

/// Whether an `ffmpeg` binary can be executed from `PATH`.
pub fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_pcm_little_endian() {
        let mut out = Vec::new();
        write_pcm(&mut out, &[1.0, -0.5]).unwrap();
        assert_eq!(out.len(), 8);
        assert_eq!(&out[..4], &1.0f32.to_le_bytes());
        assert_eq!(&out[4..], &(-0.5f32).to_le_bytes());
    }

    #[test]
    fn test_write_pcm_spans_chunks() {
        let samples = vec![0.25; PIPE_CHUNK_SAMPLES + 3];
        let mut out = Vec::new();
        write_pcm(&mut out, &samples).unwrap();
        assert_eq!(out.len(), samples.len() * 4);
    }

    #[test]
    fn test_empty_slice_rejected_before_spawn() {
        let encoder = FfmpegEncoder::new().with_program("/nonexistent/ffmpeg");
        let track = AudioTrack::new(Vec::new(), 44_100, 2);
        let err = encoder
            .encode(&track, Path::new("/tmp/never.m4a"))
            .unwrap_err();
        assert!(matches!(err, ChunkerError::Encode(msg) if msg.contains("zero-length")));
    }

    #[test]
    fn test_missing_binary_is_encode_error() {
        let encoder = FfmpegEncoder::new().with_program("/nonexistent/ffmpeg");
        let track = AudioTrack::new(vec![0.0; 441], 44_100, 1);
        let err = encoder
            .encode(&track, Path::new("/tmp/never.m4a"))
            .unwrap_err();
        assert!(matches!(err, ChunkerError::Encode(msg) if msg.contains("ffmpeg")));
    }

    #[test]
    fn test_command_arguments() {
        let encoder = FfmpegEncoder::new().with_bitrate("96k");
        let track = AudioTrack::new(vec![0.0; 4], 48_000, 2);
        let cmd = encoder.command(&track, Path::new("out.m4a.tmp"));
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        let joined = args.join(" ");
        assert!(joined.contains("-f f32le -ar 48000 -ac 2 -i pipe:0"));
        assert!(joined.contains("-codec:a aac -b:a 96k"));
        assert!(joined.ends_with("-f ipod -y out.m4a.tmp"));
    }
}
