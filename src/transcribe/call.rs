// Seam between the retry client and the remote streaming service.

use async_trait::async_trait;

use super::error::TranscribeError;
use super::publisher::AudioStreamPublisher;
use super::request::RequestDescriptor;
use super::sink::{ResponseMetadata, SharedSink, TranscriptBatch};

/// Forwards interim events from the in-flight attempt to the caller's sink.
///
/// Only `on_response` and `on_stream` exist here: the remote call's own
/// terminal notifications never reach the sink, because retry evaluation
/// owns the sink's single `on_error`/`on_complete`.
pub struct EventBridge {
    sink: SharedSink,
}

impl EventBridge {
    pub fn new(sink: SharedSink) -> Self {
        Self { sink }
    }

    pub async fn on_response(&self, metadata: ResponseMetadata) {
        self.sink.lock().await.on_response(metadata);
    }

    pub async fn on_stream(&self, batch: TranscriptBatch) {
        self.sink.lock().await.on_stream(batch);
    }
}

/// One streaming transcription call against a remote service.
///
/// The implementation subscribes to the publisher, drives demand, and
/// resolves once the service has consumed the stream and flushed its
/// results. Errors carry a class the retry policy uses to decide whether
/// another attempt is worthwhile.
#[async_trait]
pub trait StreamingCall: Send + Sync {
    async fn start_stream(
        &self,
        request: RequestDescriptor,
        audio: AudioStreamPublisher,
        events: EventBridge,
    ) -> Result<(), TranscribeError>;
}

#[async_trait]
impl<T: StreamingCall + ?Sized> StreamingCall for std::sync::Arc<T> {
    async fn start_stream(
        &self,
        request: RequestDescriptor,
        audio: AudioStreamPublisher,
        events: EventBridge,
    ) -> Result<(), TranscribeError> {
        self.as_ref().start_stream(request, audio, events).await
    }
}
