// NATS transport for the streaming transcription call.
//
// Audio frames go out as base64 PCM on `audio.frame.<session>` with a
// final-marker frame at end of stream; transcript batches come back on
// `stt.text.>` and completion on `stt.done.>`, both filtered by session id
// in the payload. Demand against the publisher is driven in fixed batches.

use anyhow::{Context, Result};
use async_nats::Client;
use async_trait::async_trait;
use base64::Engine;
use futures::stream::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::transcribe::{
    AudioChunk, AudioStreamPublisher, EventBridge, EventConsumer, RequestDescriptor,
    ResponseMetadata, StreamingCall, TranscribeError,
};

use super::messages::{AudioFrameMessage, SessionDoneMessage, TranscriptMessage};

/// Transport knobs for the NATS streaming call.
#[derive(Debug, Clone)]
pub struct NatsCallConfig {
    pub url: String,
    /// Chunks requested from the publisher per demand signal.
    pub demand_batch: usize,
    /// How long to wait without any service activity before giving up.
    pub idle_timeout: Duration,
}

impl Default for NatsCallConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            demand_batch: 4,
            idle_timeout: Duration::from_secs(30),
        }
    }
}

/// Streaming transcription over NATS pub/sub.
pub struct NatsStreamingCall {
    client: Client,
    config: NatsCallConfig,
}

impl NatsStreamingCall {
    pub async fn connect(config: NatsCallConfig) -> Result<Self> {
        info!("Connecting to NATS at {}", config.url);

        let client = async_nats::connect(&config.url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client, config })
    }

    async fn publish_frame(
        &self,
        session_id: &str,
        sequence: u32,
        pcm_bytes: &[u8],
        request: &RequestDescriptor,
        final_frame: bool,
    ) -> Result<(), TranscribeError> {
        let subject = format!("audio.frame.{}", session_id);

        let message = AudioFrameMessage {
            session_id: session_id.to_string(),
            sequence,
            pcm: base64::engine::general_purpose::STANDARD.encode(pcm_bytes),
            sample_rate: request.sample_rate,
            channels: request.channel_count,
            timestamp: chrono::Utc::now().to_rfc3339(),
            final_frame,
        };

        let payload = serde_json::to_vec(&message)
            .map_err(|e| TranscribeError::Internal(format!("frame encoding failed: {}", e)))?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| TranscribeError::Transport(format!("publish to {} failed: {}", subject, e)))?;

        debug!(
            "Published audio frame to {} (seq={}, bytes={}, final={})",
            subject,
            sequence,
            pcm_bytes.len(),
            final_frame
        );

        Ok(())
    }
}

enum AudioSignal {
    Chunk(AudioChunk),
    Complete,
    Failed(TranscribeError),
}

/// Forwards subscription events into the call's async pump loop. The
/// unbounded send keeps consumer callbacks non-blocking.
struct ForwardingConsumer {
    tx: mpsc::UnboundedSender<AudioSignal>,
}

impl EventConsumer for ForwardingConsumer {
    fn on_next(&mut self, chunk: AudioChunk) {
        let _ = self.tx.send(AudioSignal::Chunk(chunk));
    }

    fn on_complete(&mut self) {
        let _ = self.tx.send(AudioSignal::Complete);
    }

    fn on_error(&mut self, err: TranscribeError) {
        let _ = self.tx.send(AudioSignal::Failed(err));
    }
}

fn validate(request: &RequestDescriptor) -> Result<String, TranscribeError> {
    if request.sample_rate == 0 {
        return Err(TranscribeError::BadRequest(
            "sample rate must be positive".to_string(),
        ));
    }
    if request.channel_count == 0 {
        return Err(TranscribeError::BadRequest(
            "channel count must be positive".to_string(),
        ));
    }
    request
        .session_token
        .clone()
        .ok_or_else(|| TranscribeError::BadRequest("missing session token".to_string()))
}

#[async_trait]
impl StreamingCall for NatsStreamingCall {
    async fn start_stream(
        &self,
        request: RequestDescriptor,
        audio: AudioStreamPublisher,
        events: EventBridge,
    ) -> Result<(), TranscribeError> {
        let session_id = validate(&request)?;

        let mut transcripts = self
            .client
            .subscribe("stt.text.>")
            .await
            .map_err(|e| TranscribeError::Transport(format!("transcript subscribe failed: {}", e)))?;
        let mut done = self
            .client
            .subscribe("stt.done.>")
            .await
            .map_err(|e| TranscribeError::Transport(format!("done subscribe failed: {}", e)))?;

        events
            .on_response(ResponseMetadata {
                request_id: format!("nats-{}", session_id),
                session_token: Some(session_id.clone()),
            })
            .await;

        let (tx, mut audio_rx) = mpsc::unbounded_channel();
        let subscription = audio.subscribe(Box::new(ForwardingConsumer { tx }));

        let batch = self.config.demand_batch.max(1);
        subscription.request(batch as i64);
        let mut outstanding = batch;
        let mut sequence: u32 = 0;
        let mut audio_done = false;

        loop {
            tokio::select! {
                signal = audio_rx.recv(), if !audio_done => match signal {
                    Some(AudioSignal::Chunk(chunk)) => {
                        self.publish_frame(&session_id, sequence, &chunk.bytes, &request, false)
                            .await?;
                        sequence += 1;
                        outstanding -= 1;
                        if outstanding == 0 {
                            subscription.request(batch as i64);
                            outstanding = batch;
                        }
                    }
                    Some(AudioSignal::Complete) => {
                        self.publish_frame(&session_id, sequence, &[], &request, true)
                            .await?;
                        info!("Audio stream complete for session {}", session_id);
                        audio_done = true;
                    }
                    Some(AudioSignal::Failed(err)) => {
                        subscription.cancel();
                        return Err(err);
                    }
                    None => {
                        // Worker gone without a terminal signal.
                        return Err(TranscribeError::Internal(
                            "audio subscription ended unexpectedly".to_string(),
                        ));
                    }
                },

                message = transcripts.next() => match message {
                    Some(message) => {
                        match serde_json::from_slice::<TranscriptMessage>(&message.payload) {
                            Ok(transcript) if transcript.session_id == session_id => {
                                events
                                    .on_stream(crate::transcribe::TranscriptBatch {
                                        results: transcript.results,
                                    })
                                    .await;
                            }
                            Ok(_) => {} // another session's results
                            Err(e) => warn!("Failed to parse transcript message: {}", e),
                        }
                    }
                    None => {
                        subscription.cancel();
                        return Err(TranscribeError::Transport(
                            "transcript subscription closed".to_string(),
                        ));
                    }
                },

                message = done.next() => match message {
                    Some(message) => {
                        match serde_json::from_slice::<SessionDoneMessage>(&message.payload) {
                            Ok(notice) if notice.session_id == session_id => {
                                info!("Session {} flushed by service", session_id);
                                subscription.cancel();
                                return Ok(());
                            }
                            Ok(_) => {}
                            Err(e) => warn!("Failed to parse done message: {}", e),
                        }
                    }
                    None => {
                        subscription.cancel();
                        return Err(TranscribeError::Transport(
                            "done subscription closed".to_string(),
                        ));
                    }
                },

                _ = tokio::time::sleep(self.config.idle_timeout) => {
                    subscription.cancel();
                    return Err(TranscribeError::Transport(format!(
                        "no service activity for {:?}",
                        self.config.idle_timeout
                    )));
                }
            }
        }
    }
}
