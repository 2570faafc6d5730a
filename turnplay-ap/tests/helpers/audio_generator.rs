//! Audio test file generation
//!
//! Deterministic mono WAV clips with a known duration, laid out the way the
//! transcription service stores turn clips.

use hound::{WavSpec, WavWriter};
use std::f32::consts::PI;
use std::path::Path;

/// Low rate keeps the fixtures small; only the duration matters
const TEST_SAMPLE_RATE: u32 = 8000;

/// Generate a mono sine wave WAV file
///
/// # Arguments
/// * `path` - Output file path
/// * `duration_ms` - Duration in milliseconds
/// * `frequency_hz` - Sine wave frequency in Hz
pub fn generate_sine_wav<P: AsRef<Path>>(
    path: P,
    duration_ms: u64,
    frequency_hz: f32,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: TEST_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = WavWriter::create(path, spec)?;

    let total_frames = (TEST_SAMPLE_RATE as u64 * duration_ms) / 1000;
    for i in 0..total_frames {
        let t = i as f32 / TEST_SAMPLE_RATE as f32;
        let sample = (2.0 * PI * frequency_hz * t).sin() * 0.5;
        writer.write_sample((sample * i16::MAX as f32) as i16)?;
    }

    writer.finalize()?;
    Ok(())
}

/// Write `sessions/<session>/turn_<i>.wav` under `root` for each duration
///
/// Returns the URL-style audio paths (`/sessions/<session>/turn_<i>.wav`).
/// A `None` duration leaves that clip missing on disk.
pub fn write_transcript_clips(
    root: &Path,
    session: &str,
    durations_ms: &[Option<u64>],
) -> Result<Vec<String>, hound::Error> {
    let mut paths = Vec::new();
    for (i, duration) in durations_ms.iter().enumerate() {
        let audio_path = format!("/sessions/{}/turn_{}.wav", session, i);
        if let Some(ms) = duration {
            let file = root.join(audio_path.trim_start_matches('/'));
            generate_sine_wav(&file, *ms, 220.0 + 110.0 * i as f32)?;
        }
        paths.push(audio_path);
    }
    Ok(paths)
}
