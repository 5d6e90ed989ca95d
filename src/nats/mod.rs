pub mod client;
pub mod messages;

pub use client::{NatsCallConfig, NatsStreamingCall};
pub use messages::{AudioFrameMessage, SessionDoneMessage, TranscriptMessage};
