//! Clip duration probing using symphonia
//!
//! Reads container metadata only; samples are never decoded. When the
//! container does not record a frame count (some MP3/AAC streams), packet
//! durations are summed instead.

use crate::error::{Error, Result};
use std::path::Path;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Duration of an audio file in seconds
///
/// # Errors
/// - Failed to open file
/// - Unsupported audio format
/// - No audio track, or no usable timing information
pub fn probe_duration(path: &Path) -> Result<f64> {
    debug!("Probing duration: {}", path.display());

    let file = std::fs::File::open(path)
        .map_err(|e| Error::Decode(format!("Failed to open file {}: {}", path.display(), e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext_str) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext_str);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate;
    let time_base = track.codec_params.time_base;

    if let (Some(frames), Some(rate)) = (track.codec_params.n_frames, sample_rate) {
        if rate > 0 {
            let secs = frames as f64 / rate as f64;
            debug!("Duration from header: {} frames @ {} Hz = {:.3}s", frames, rate, secs);
            return positive(secs, path);
        }
    }

    // No frame count in the header: walk the packets
    let mut total_ts: u64 = 0;
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                warn!("Error reading packet: {}", e);
                break;
            }
        };

        if packet.track_id() == track_id {
            total_ts += packet.dur;
        }
    }

    let secs = match (time_base, sample_rate) {
        (Some(tb), _) => {
            let time = tb.calc_time(total_ts);
            time.seconds as f64 + time.frac
        }
        (None, Some(rate)) if rate > 0 => total_ts as f64 / rate as f64,
        _ => {
            return Err(Error::Decode(format!(
                "No timing information in {}",
                path.display()
            )))
        }
    };

    debug!("Duration from packets: {:.3}s", secs);
    positive(secs, path)
}

fn positive(secs: f64, path: &Path) -> Result<f64> {
    if secs.is_finite() && secs > 0.0 {
        Ok(secs)
    } else {
        Err(Error::Decode(format!("Empty audio stream in {}", path.display())))
    }
}
