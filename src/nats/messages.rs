use serde::{Deserialize, Serialize};

use crate::transcribe::SegmentResult;

/// Audio frame published to the STT service.
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioFrameMessage {
    pub session_id: String,
    pub sequence: u32,
    pub pcm: String, // Base64-encoded PCM bytes
    pub sample_rate: u32,
    pub channels: u16,
    pub timestamp: String, // RFC3339 timestamp
    #[serde(rename = "final")]
    pub final_frame: bool,
}

/// Transcript result batch received from the STT service.
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub results: Vec<SegmentResult>,
    pub timestamp: String,
}

/// Published by the STT service once a session's results are flushed.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionDoneMessage {
    pub session_id: String,
    pub timestamp: String,
}
