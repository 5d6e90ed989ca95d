//! Streaming transcription core
//!
//! This module holds the three coupled pieces of the streaming pipeline:
//! the demand-driven publisher that feeds audio to the service under its
//! pull-based flow control, the retry client that keeps a logical session
//! alive across transient failures, and the sink contract results flow
//! into.

pub mod call;
pub mod error;
pub mod publisher;
pub mod reader;
pub mod request;
pub mod retry;
pub mod sink;

pub use call::{EventBridge, StreamingCall};
pub use error::{ErrorClass, TranscribeError};
pub use publisher::{
    AudioChunk, AudioStreamPublisher, EventConsumer, Subscription, SubscriptionState,
    DEFAULT_CHUNK_SIZE,
};
pub use reader::{shared, SharedReader, StreamReader, TwoChannelReader};
pub use request::{MediaEncoding, RequestDescriptor};
pub use retry::{Outcome, RetryClient, RetryPolicy};
pub use sink::{
    group_by_speaker, partition_by_channel, Alternative, ResponseMetadata, SegmentResult,
    SharedSink, TranscriptBatch, TranscriptCollector, TranscriptionSink, WordItem,
};
