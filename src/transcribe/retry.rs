// Retry/session client
//
// Runs one logical transcription to completion, transparently restarting
// the remote streaming call on retriable failures. Each attempt mints a
// fresh session token and a fresh publisher over the same shared reader,
// so already-consumed audio is not replayed (best-effort resume, not exact
// replay). The loop is iterative, bounded by the attempt counter.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::call::{EventBridge, StreamingCall};
use super::error::{ErrorClass, TranscribeError};
use super::publisher::{AudioStreamPublisher, DEFAULT_CHUNK_SIZE};
use super::reader::SharedReader;
use super::request::RequestDescriptor;
use super::sink::SharedSink;

/// Knobs governing retry behavior for one logical transcription.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt; total attempts = max_retries + 1.
    pub max_retries: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
    /// Failure classes that short-circuit retry entirely.
    pub non_retriable: HashSet<ErrorClass>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        let mut non_retriable = HashSet::new();
        non_retriable.insert(ErrorClass::BadRequest);

        Self {
            max_retries: 10,
            delay: Duration::from_millis(100),
            non_retriable,
        }
    }
}

impl RetryPolicy {
    pub fn is_retriable(&self, err: &TranscribeError) -> bool {
        !self.non_retriable.contains(&err.class())
    }
}

/// Terminal value of one logical transcription. Produced exactly once.
#[derive(Debug)]
pub enum Outcome {
    Success,
    Failure(TranscribeError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Drives attempts of a streaming call until success, retry exhaustion, or
/// a non-retriable failure.
pub struct RetryClient<C: StreamingCall> {
    call: C,
    policy: RetryPolicy,
    chunk_size: usize,
}

impl<C: StreamingCall> RetryClient<C> {
    pub fn new(call: C) -> Self {
        Self::with_policy(call, RetryPolicy::default(), DEFAULT_CHUNK_SIZE)
    }

    pub fn with_policy(call: C, policy: RetryPolicy, chunk_size: usize) -> Self {
        Self {
            call,
            policy,
            chunk_size,
        }
    }

    /// Run one logical transcription.
    ///
    /// The sink receives exactly one terminal call: `on_complete` on
    /// success, `on_error` otherwise, no matter how many attempts ran.
    pub async fn run(
        &self,
        descriptor: RequestDescriptor,
        reader: SharedReader,
        sink: SharedSink,
    ) -> Outcome {
        let mut attempt: u32 = 0;

        loop {
            let session_token = Uuid::new_v4().to_string();
            let attempt_request = descriptor.with_session_token(session_token.as_str());

            info!(
                attempt,
                session = %session_token,
                "Starting stream transcription attempt"
            );

            let publisher = AudioStreamPublisher::new(Arc::clone(&reader), self.chunk_size);
            let bridge = EventBridge::new(Arc::clone(&sink));

            match self.call.start_stream(attempt_request, publisher, bridge).await {
                Ok(()) => {
                    info!(attempt, "Stream transcription completed");
                    sink.lock().await.on_complete();
                    return Outcome::Success;
                }
                Err(err) => {
                    if attempt < self.policy.max_retries && self.policy.is_retriable(&err) {
                        warn!(
                            attempt,
                            error = %err,
                            "Attempt failed, retrying after {:?}",
                            self.policy.delay
                        );
                        tokio::time::sleep(self.policy.delay).await;
                        attempt += 1;
                        continue;
                    }

                    error!(attempt, error = %err, "Stream transcription failed");
                    sink.lock().await.on_error(&err);
                    return Outcome::Failure(err);
                }
            }
        }
    }
}
