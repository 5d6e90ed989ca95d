use serde::{Deserialize, Serialize};

/// Audio encoding accepted by the streaming service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaEncoding {
    Pcm,
}

/// Immutable description of one streaming transcription request.
///
/// One descriptor backs one logical session; each retry attempt derives a
/// new descriptor that differs only in the session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub language_code: String,
    pub media_encoding: MediaEncoding,
    pub sample_rate: u32,
    pub channel_count: u16,
    pub enable_channel_identification: bool,
    pub show_speaker_labels: bool,
    pub session_token: Option<String>,
}

impl RequestDescriptor {
    /// Descriptor for an interleaved two-channel PCM stream with channel
    /// identification and speaker labels enabled.
    pub fn two_channel_pcm(sample_rate: u32, language_code: impl Into<String>) -> Self {
        Self {
            language_code: language_code.into(),
            media_encoding: MediaEncoding::Pcm,
            sample_rate,
            channel_count: 2,
            enable_channel_identification: true,
            show_speaker_labels: true,
            session_token: None,
        }
    }

    /// Derive the per-attempt descriptor carrying a fresh session token.
    pub fn with_session_token(&self, token: impl Into<String>) -> Self {
        Self {
            session_token: Some(token.into()),
            ..self.clone()
        }
    }
}
