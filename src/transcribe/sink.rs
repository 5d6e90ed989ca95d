// Result sink contract and transcript aggregation.
//
// Per streamed batch, results are split into in-progress ("partial") and
// finalized segments keyed by logical channel. Finalized words are grouped
// by speaker tag, and finalized text accumulates in arrival order into the
// session transcript.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::error::TranscribeError;

/// Metadata from the service's initial response to a streaming request.
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    pub request_id: String,
    pub session_token: Option<String>,
}

/// One word (or word fragment) with its attached speaker tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordItem {
    pub content: String,
    pub speaker: Option<String>,
}

/// A candidate transcription of one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub transcript: String,
    pub items: Vec<WordItem>,
}

/// One result segment for one channel and time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentResult {
    pub channel_id: String,
    pub is_partial: bool,
    pub alternatives: Vec<Alternative>,
}

/// A batch of result segments as streamed by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptBatch {
    pub results: Vec<SegmentResult>,
}

/// Receiver of per-segment results and the single terminal notification of
/// one logical transcription. The retry client guarantees exactly one
/// terminal call (`on_error` xor `on_complete`) regardless of attempts.
pub trait TranscriptionSink: Send {
    fn on_response(&mut self, metadata: ResponseMetadata);
    fn on_stream(&mut self, batch: TranscriptBatch);
    fn on_error(&mut self, err: &TranscribeError);
    fn on_complete(&mut self);
}

/// Sink handle shared between the retry loop and the in-flight attempt.
pub type SharedSink = Arc<Mutex<dyn TranscriptionSink>>;

/// Group word contents by speaker tag.
///
/// Groups appear in first-appearance order; word order is preserved within
/// each group. Untagged words fall into a shared `speaker_unknown` group.
pub fn group_by_speaker(items: &[WordItem]) -> Vec<(String, String)> {
    let mut groups: Vec<(String, String)> = Vec::new();

    for item in items {
        let key = format!("speaker_{}", item.speaker.as_deref().unwrap_or("unknown"));
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, text)) => {
                text.push(' ');
                text.push_str(&item.content);
            }
            None => groups.push((key, item.content.clone())),
        }
    }

    groups
}

/// Split a batch into partial and finalized segments keyed by channel id.
pub fn partition_by_channel(
    batch: &TranscriptBatch,
) -> (
    HashMap<String, Vec<Alternative>>,
    HashMap<String, Vec<Alternative>>,
) {
    let mut partial: HashMap<String, Vec<Alternative>> = HashMap::new();
    let mut finalized: HashMap<String, Vec<Alternative>> = HashMap::new();

    for result in &batch.results {
        let bucket = if result.is_partial {
            &mut partial
        } else {
            &mut finalized
        };
        bucket
            .entry(result.channel_id.clone())
            .or_default()
            .extend(result.alternatives.iter().cloned());
    }

    (partial, finalized)
}

/// Accumulates finalized transcript text for one logical transcription and
/// logs results per channel with speaker grouping.
pub struct TranscriptCollector {
    label: String,
    final_transcript: String,
    finalized_segments: Vec<(String, Vec<(String, String)>)>,
    completed: bool,
    failed: bool,
}

impl TranscriptCollector {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            final_transcript: String::new(),
            finalized_segments: Vec::new(),
            completed: false,
            failed: false,
        }
    }

    /// Finalized text accumulated so far, in arrival order.
    pub fn transcript(&self) -> &str {
        self.final_transcript.trim_start()
    }

    /// Finalized segments with speaker grouping, keyed by channel.
    pub fn finalized_segments(&self) -> &[(String, Vec<(String, String)>)] {
        &self.finalized_segments
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }
}

impl TranscriptionSink for TranscriptCollector {
    fn on_response(&mut self, metadata: ResponseMetadata) {
        info!(
            "<<{}>> : received initial response, request id {}",
            self.label, metadata.request_id
        );
    }

    fn on_stream(&mut self, batch: TranscriptBatch) {
        let (partial, _) = partition_by_channel(&batch);

        for (channel, alternatives) in &partial {
            debug!(
                "<<{}>> : channel {} has {} in-progress alternatives",
                self.label,
                channel,
                alternatives.len()
            );
        }

        for result in batch.results.iter().filter(|r| !r.is_partial) {
            for alternative in &result.alternatives {
                if alternative.transcript.is_empty() {
                    continue;
                }
                let speakers = group_by_speaker(&alternative.items);
                info!(
                    "<<{}>> : <<{}>> : {:?}",
                    self.label, result.channel_id, speakers
                );
                self.finalized_segments
                    .push((result.channel_id.clone(), speakers));
                self.final_transcript.push(' ');
                self.final_transcript.push_str(&alternative.transcript);
            }
        }
    }

    fn on_error(&mut self, err: &TranscribeError) {
        info!("<<{}>> : === Failure encountered === {}", self.label, err);
        self.failed = true;
    }

    fn on_complete(&mut self) {
        info!("<<{}>> : {}", self.label, self.final_transcript);
        info!("<<{}>> : === All records streamed successfully ===", self.label);
        self.completed = true;
    }
}
