//! Transcription response types

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a turn's clip was obtained by the transcription service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TurnMethod {
    /// Cut from the mixed recording using diarization timestamps
    #[default]
    Diarization,
    /// Produced by source separation
    Separated,
}

impl std::fmt::Display for TurnMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnMethod::Diarization => write!(f, "Diarization"),
            TurnMethod::Separated => write!(f, "Separated"),
        }
    }
}

/// One speaker turn as returned by the transcription service
///
/// # Examples
///
/// ```
/// use turnplay_common::api::TurnDescriptor;
///
/// let turn: TurnDescriptor = serde_json::from_str(
///     r#"{"speaker": "SPEAKER_00", "text": "hello", "audio_path": "/sessions/a/turn_0.wav"}"#,
/// ).unwrap();
/// assert_eq!(turn.audio_path, "/sessions/a/turn_0.wav");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnDescriptor {
    /// Speaker label (e.g. "SPEAKER_00")
    pub speaker: String,

    /// Transcribed text for the turn
    #[serde(default)]
    pub text: String,

    /// Locator of the turn's audio clip (URL path or file path)
    #[serde(alias = "audioRef")]
    pub audio_path: String,

    /// Extraction method; missing values default to diarization
    #[serde(default, deserialize_with = "lenient_method")]
    pub method: TurnMethod,
}

/// Unknown or null method strings fall back to diarization instead of failing the whole response
fn lenient_method<'de, D>(deserializer: D) -> std::result::Result<TurnMethod, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref() {
        Some("Separated") => TurnMethod::Separated,
        _ => TurnMethod::Diarization,
    })
}

/// Body returned by `POST /transcribe`
///
/// Success carries `transcription`; failures carry `error`, a FastAPI-style
/// `detail`, or `status: "error"` with a `message`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    #[serde(default)]
    pub transcription: Vec<TurnDescriptor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TranscriptionResponse {
    /// Failure message carried by the response, if any
    pub fn failure(&self) -> Option<String> {
        if let Some(error) = &self.error {
            return Some(error.clone());
        }
        if let Some(detail) = &self.detail {
            return Some(match detail {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        }
        if self.status.as_deref() == Some("error") {
            return Some(
                self.message
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            );
        }
        None
    }

    /// Turns in playback order, or the collaborator's failure
    ///
    /// An empty list is returned as-is; deciding whether playback is possible
    /// belongs to the segment registry.
    pub fn into_turns(self) -> Result<Vec<TurnDescriptor>> {
        match self.failure() {
            Some(msg) => Err(Error::Transcription(msg)),
            None => Ok(self.transcription),
        }
    }
}

/// Parse a raw transcription response body into ordered turns
pub fn parse_transcription(body: &str) -> Result<Vec<TurnDescriptor>> {
    let response: TranscriptionResponse = serde_json::from_str(body)?;
    response.into_turns()
}
