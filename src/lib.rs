pub mod audio;
pub mod config;
pub mod nats;
pub mod session;
pub mod transcribe;

pub use audio::{AudioFile, ChannelSource, InterleavedStream, BLOCK_SIZE, PAIR_SIZE};
pub use config::Config;
pub use nats::{AudioFrameMessage, NatsCallConfig, NatsStreamingCall, TranscriptMessage};
pub use session::{Arrival, PendingSessions};
pub use transcribe::{
    AudioChunk, AudioStreamPublisher, ErrorClass, EventBridge, EventConsumer, MediaEncoding,
    Outcome, RequestDescriptor, RetryClient, RetryPolicy, SharedReader, SharedSink, StreamReader,
    StreamingCall, Subscription, SubscriptionState, TranscribeError, TranscriptBatch,
    TranscriptCollector, TranscriptionSink, TwoChannelReader,
};
