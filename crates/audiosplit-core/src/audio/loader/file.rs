//! Full-file decoding into an in-memory track.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::AudioTrack;
use crate::error::{ChunkerError, Result};

/// Decode an audio file into interleaved f32 samples.
///
/// Any container/codec compiled into symphonia is accepted (wav, flac, mp3,
/// m4a/aac, alac, ogg/vorbis, mkv). The file extension is only a format hint.
///
/// # Errors
/// Returns [`ChunkerError::Decode`] if:
/// - The file cannot be opened or probed
/// - No decodable audio track exists
/// - The stream is corrupt past the point of recovery
pub fn load_audio_file(path: &Path) -> Result<AudioTrack> {
    let file = File::open(path).map_err(|e| ChunkerError::decode(path, e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| ChunkerError::decode(path, e))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ChunkerError::decode(path, "no audio tracks found"))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count() as u16);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| ChunkerError::decode(path, e))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(ChunkerError::decode(path, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // Recoverable per symphonia: drop the packet and keep going
                skipped_packets += 1;
                tracing::debug!("Skipping undecodable packet: {e}");
                continue;
            }
            Err(e) => return Err(ChunkerError::decode(path, e)),
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        channels.get_or_insert(spec.channels.count() as u16);

        let needed = decoded.capacity() * spec.channels.count();
        if sample_buf.as_ref().is_none_or(|buf| buf.capacity() < needed) {
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }
        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    let (Some(sample_rate), Some(channels)) = (sample_rate, channels) else {
        return Err(ChunkerError::decode(
            path,
            "stream does not declare a sample rate or channel layout",
        ));
    };
    if sample_rate == 0 || channels == 0 {
        return Err(ChunkerError::decode(path, "invalid sample rate or channel count"));
    }

    if skipped_packets > 0 {
        tracing::warn!(
            "Skipped {skipped_packets} corrupt packet(s) while decoding {}",
            path.display()
        );
    }

    let track = AudioTrack::new(samples, sample_rate, channels);
    tracing::debug!(
        "Decoded {} frames ({} Hz, {} ch) from {}",
        track.frames(),
        sample_rate,
        channels,
        path.display()
    );

    Ok(track)
}
