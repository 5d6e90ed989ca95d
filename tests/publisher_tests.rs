// Integration tests for the demand-driven audio stream publisher
//
// These tests verify the pull-based flow control semantics: items are only
// delivered against outstanding demand, end of stream produces exactly one
// completion, invalid demand fails the subscription immediately, and
// cancellation stops delivery at an iteration boundary.

use duoscribe::transcribe::{
    reader, AudioChunk, AudioStreamPublisher, EventConsumer, RequestDescriptor, StreamReader,
    Subscription, SubscriptionState, TranscribeError,
};
use std::io::{self, Cursor, Read};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Chunk(Vec<u8>),
    Complete,
    Error(String),
}

struct RecordingConsumer {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventConsumer for RecordingConsumer {
    fn on_next(&mut self, chunk: AudioChunk) {
        let _ = self.tx.send(Event::Chunk(chunk.bytes));
    }

    fn on_complete(&mut self) {
        let _ = self.tx.send(Event::Complete);
    }

    fn on_error(&mut self, err: TranscribeError) {
        let _ = self.tx.send(Event::Error(err.to_string()));
    }
}

/// Reader over a fixed byte buffer.
struct BytesReader {
    data: Cursor<Vec<u8>>,
}

impl BytesReader {
    fn new(data: Vec<u8>) -> Self {
        Self {
            data: Cursor::new(data),
        }
    }
}

impl StreamReader for BytesReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }

    fn label(&self) -> &str {
        "bytes"
    }

    fn describe_request(&self) -> RequestDescriptor {
        RequestDescriptor::two_channel_pcm(16000, "en-US")
    }

    fn close(&mut self) {
        self.data = Cursor::new(Vec::new());
    }
}

/// Reader whose first read fails.
struct FailingReader;

impl StreamReader for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "source went away"))
    }

    fn label(&self) -> &str {
        "failing"
    }

    fn describe_request(&self) -> RequestDescriptor {
        RequestDescriptor::two_channel_pcm(16000, "en-US")
    }

    fn close(&mut self) {}
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

async fn assert_no_more_events(rx: &mut mpsc::UnboundedReceiver<Event>) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err(), "unexpected extra event");
}

async fn wait_for_state(subscription: &Subscription, expected: SubscriptionState) {
    for _ in 0..100 {
        if subscription.state() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(subscription.state(), expected);
}

fn subscribe_bytes(
    data: Vec<u8>,
    chunk_size: usize,
) -> (Subscription, mpsc::UnboundedReceiver<Event>) {
    let publisher = AudioStreamPublisher::new(reader::shared(BytesReader::new(data)), chunk_size);
    let (tx, rx) = mpsc::unbounded_channel();
    let subscription = publisher.subscribe(Box::new(RecordingConsumer { tx }));
    (subscription, rx)
}

#[tokio::test]
async fn test_fewer_chunks_than_demand_completes_exactly_once() {
    // 3 chunks of 4 bytes, then EOF; demand is 10.
    let (subscription, mut rx) = subscribe_bytes((0u8..12).collect(), 4);
    subscription.request(10);

    assert_eq!(next_event(&mut rx).await, Event::Chunk(vec![0, 1, 2, 3]));
    assert_eq!(next_event(&mut rx).await, Event::Chunk(vec![4, 5, 6, 7]));
    assert_eq!(next_event(&mut rx).await, Event::Chunk(vec![8, 9, 10, 11]));
    assert_eq!(next_event(&mut rx).await, Event::Complete);

    assert_no_more_events(&mut rx).await;
    wait_for_state(&subscription, SubscriptionState::Completed).await;
}

#[tokio::test]
async fn test_short_final_chunk_is_delivered() {
    let (subscription, mut rx) = subscribe_bytes((0u8..6).collect(), 4);
    subscription.request(5);

    assert_eq!(next_event(&mut rx).await, Event::Chunk(vec![0, 1, 2, 3]));
    assert_eq!(next_event(&mut rx).await, Event::Chunk(vec![4, 5]));
    assert_eq!(next_event(&mut rx).await, Event::Complete);
}

#[tokio::test]
async fn test_delivery_is_gated_on_demand() {
    let (subscription, mut rx) = subscribe_bytes((0u8..16).collect(), 4);

    subscription.request(1);
    assert_eq!(next_event(&mut rx).await, Event::Chunk(vec![0, 1, 2, 3]));
    assert_no_more_events(&mut rx).await;

    subscription.request(2);
    assert_eq!(next_event(&mut rx).await, Event::Chunk(vec![4, 5, 6, 7]));
    assert_eq!(next_event(&mut rx).await, Event::Chunk(vec![8, 9, 10, 11]));
    assert_no_more_events(&mut rx).await;
}

#[tokio::test]
async fn test_zero_demand_fails_with_no_deliveries() {
    let (subscription, mut rx) = subscribe_bytes((0u8..16).collect(), 4);
    subscription.request(0);

    match next_event(&mut rx).await {
        Event::Error(message) => assert!(message.contains("demand"), "got: {}", message),
        other => panic!("expected error event, got {:?}", other),
    }

    assert_no_more_events(&mut rx).await;
    wait_for_state(&subscription, SubscriptionState::Failed).await;
}

#[tokio::test]
async fn test_negative_demand_fails_with_no_deliveries() {
    let (subscription, mut rx) = subscribe_bytes((0u8..16).collect(), 4);
    subscription.request(-3);

    match next_event(&mut rx).await {
        Event::Error(message) => assert!(message.contains("-3"), "got: {}", message),
        other => panic!("expected error event, got {:?}", other),
    }

    assert_no_more_events(&mut rx).await;
    wait_for_state(&subscription, SubscriptionState::Failed).await;
}

#[tokio::test]
async fn test_read_failure_is_reported_as_stream_error() {
    let publisher = AudioStreamPublisher::new(reader::shared(FailingReader), 4);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = publisher.subscribe(Box::new(RecordingConsumer { tx }));

    subscription.request(1);

    match next_event(&mut rx).await {
        Event::Error(message) => assert!(message.contains("source went away"), "got: {}", message),
        other => panic!("expected error event, got {:?}", other),
    }

    assert_no_more_events(&mut rx).await;
    wait_for_state(&subscription, SubscriptionState::Failed).await;
}

#[tokio::test]
async fn test_cancel_stops_delivery() {
    let (subscription, mut rx) = subscribe_bytes((0u8..64).collect(), 4);

    subscription.request(1);
    assert_eq!(next_event(&mut rx).await, Event::Chunk(vec![0, 1, 2, 3]));

    subscription.cancel();
    wait_for_state(&subscription, SubscriptionState::Cancelled).await;

    subscription.request(5);
    assert_no_more_events(&mut rx).await;
}

/// Consumer that requests one more chunk from inside its own delivery
/// callback, the reentrant pattern the command queue exists to flatten.
struct ReentrantConsumer {
    tx: mpsc::UnboundedSender<Event>,
    subscription: Arc<Mutex<Option<Subscription>>>,
}

impl EventConsumer for ReentrantConsumer {
    fn on_next(&mut self, chunk: AudioChunk) {
        let _ = self.tx.send(Event::Chunk(chunk.bytes));
        if let Some(subscription) = self.subscription.lock().unwrap().as_ref() {
            subscription.request(1);
        }
    }

    fn on_complete(&mut self) {
        let _ = self.tx.send(Event::Complete);
    }

    fn on_error(&mut self, err: TranscribeError) {
        let _ = self.tx.send(Event::Error(err.to_string()));
    }
}

#[tokio::test]
async fn test_reentrant_demand_drains_the_whole_stream() {
    let data: Vec<u8> = (0u8..40).collect();
    let publisher = AudioStreamPublisher::new(reader::shared(BytesReader::new(data.clone())), 4);

    let slot = Arc::new(Mutex::new(None));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = publisher.subscribe(Box::new(ReentrantConsumer {
        tx,
        subscription: Arc::clone(&slot),
    }));
    *slot.lock().unwrap() = Some(subscription.clone());

    // A single initial request is enough; each delivery requests the next.
    subscription.request(1);

    let mut received = Vec::new();
    loop {
        match next_event(&mut rx).await {
            Event::Chunk(bytes) => received.extend(bytes),
            Event::Complete => break,
            Event::Error(message) => panic!("unexpected error: {}", message),
        }
    }

    assert_eq!(received, data);
    assert_no_more_events(&mut rx).await;
}
