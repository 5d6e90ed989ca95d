// Demand-driven audio stream publisher
//
// Bridges the streaming service's pull-based demand protocol (request N
// items at a time) to a byte-producing StreamReader. Demand arrives over a
// command channel and is drained by one dedicated worker task per
// subscription, so a consumer calling `request` from inside its own
// `on_next` callback queues more work instead of recursing on the calling
// stack, and deliveries are strictly serialized by construction.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::error::TranscribeError;
use super::reader::SharedReader;

/// Default audio chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// One audio payload delivered downstream. Never empty; end of stream is
/// signaled through `on_complete` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    pub bytes: Vec<u8>,
}

/// Consumer side of one subscription.
///
/// All calls for a given subscription arrive from its single worker task:
/// never concurrently, never out of order, and exactly one terminal call
/// (`on_complete` or `on_error`).
pub trait EventConsumer: Send {
    fn on_next(&mut self, chunk: AudioChunk);
    fn on_complete(&mut self);
    fn on_error(&mut self, err: TranscribeError);
}

/// Lifecycle of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Created,
    Active,
    Completed,
    Failed,
    Cancelled,
}

enum Command {
    Request(i64),
    Cancel,
}

/// Publishes audio chunks read from a shared reader, one subscription at a
/// time per attempt.
pub struct AudioStreamPublisher {
    reader: SharedReader,
    chunk_size: usize,
}

impl AudioStreamPublisher {
    pub fn new(reader: SharedReader, chunk_size: usize) -> Self {
        Self { reader, chunk_size }
    }

    /// Bind a consumer, spawning the subscription's dedicated worker task.
    ///
    /// The worker is torn down when the stream completes, fails, or is
    /// cancelled; nothing outlives the subscription.
    pub fn subscribe(&self, consumer: Box<dyn EventConsumer>) -> Subscription {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SubscriptionState::Created);

        info!("Creating audio stream subscription");
        tokio::spawn(run_worker(
            command_rx,
            Arc::clone(&self.reader),
            self.chunk_size,
            consumer,
            state_tx,
        ));

        Subscription {
            command_tx,
            state_rx,
        }
    }
}

/// Handle through which the consumer signals demand and cancellation.
#[derive(Clone)]
pub struct Subscription {
    command_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<SubscriptionState>,
}

impl Subscription {
    /// Request `n` more items. Non-positive demand fails the subscription:
    /// the consumer receives an invalid-demand error and nothing else.
    pub fn request(&self, n: i64) {
        if self.command_tx.send(Command::Request(n)).is_err() {
            debug!("Demand signaled after subscription worker exit, ignoring");
        }
    }

    /// Stop the subscription. The worker observes cancellation at the next
    /// iteration boundary; no deliveries happen after that point.
    pub fn cancel(&self) {
        if self.command_tx.send(Command::Cancel).is_err() {
            debug!("Cancel signaled after subscription worker exit, ignoring");
        }
    }

    pub fn state(&self) -> SubscriptionState {
        *self.state_rx.borrow()
    }
}

async fn run_worker(
    mut commands: mpsc::UnboundedReceiver<Command>,
    reader: SharedReader,
    chunk_size: usize,
    mut consumer: Box<dyn EventConsumer>,
    state: watch::Sender<SubscriptionState>,
) {
    let _ = state.send(SubscriptionState::Active);
    // Outstanding unfulfilled demand; only ever decremented on delivery,
    // so it cannot go below zero.
    let mut demand: u64 = 0;

    while let Some(command) = commands.recv().await {
        match command {
            Command::Cancel => {
                debug!("Subscription cancelled");
                let _ = state.send(SubscriptionState::Cancelled);
                return;
            }
            Command::Request(n) if n <= 0 => {
                warn!("Rejecting non-positive demand: {}", n);
                consumer.on_error(TranscribeError::InvalidDemand(n));
                let _ = state.send(SubscriptionState::Failed);
                return;
            }
            Command::Request(n) => demand += n as u64,
        }

        while demand > 0 {
            // Fold in commands that arrived mid-drain so cancellation is
            // observed at the iteration boundary and reentrant requests
            // extend the current drain instead of queuing a new one.
            loop {
                match commands.try_recv() {
                    Ok(Command::Cancel) => {
                        debug!("Subscription cancelled mid-drain");
                        let _ = state.send(SubscriptionState::Cancelled);
                        return;
                    }
                    Ok(Command::Request(n)) if n <= 0 => {
                        warn!("Rejecting non-positive demand: {}", n);
                        consumer.on_error(TranscribeError::InvalidDemand(n));
                        let _ = state.send(SubscriptionState::Failed);
                        return;
                    }
                    Ok(Command::Request(n)) => demand += n as u64,
                    Err(_) => break,
                }
            }

            let mut buf = vec![0u8; chunk_size];
            let read = {
                let mut reader = reader.lock().await;
                reader.read(&mut buf)
            };

            match read {
                Ok(0) => {
                    debug!("Audio stream exhausted, completing subscription");
                    consumer.on_complete();
                    let _ = state.send(SubscriptionState::Completed);
                    return;
                }
                Ok(len) => {
                    buf.truncate(len);
                    consumer.on_next(AudioChunk { bytes: buf });
                    demand -= 1;
                }
                Err(e) => {
                    // Not retried here: retry is the session client's call.
                    error!("Audio read failed, failing subscription: {}", e);
                    consumer.on_error(TranscribeError::Io(e));
                    let _ = state.send(SubscriptionState::Failed);
                    return;
                }
            }
        }
    }

    // Every handle dropped without a terminal event.
    debug!("Subscription abandoned by consumer");
    let _ = state.send(SubscriptionState::Cancelled);
}
