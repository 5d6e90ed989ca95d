// StreamReader contract and the two-channel production implementation.
//
// A reader is shared across sequential retry attempts so already-consumed
// bytes are not replayed; attempts never run concurrently, but the worker
// task reading from it is not the task that constructed it, hence the
// `Send` bound and the shared handle type.

use std::io;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::audio::InterleavedStream;

use super::request::RequestDescriptor;

/// Byte source for one logical transcription.
///
/// `read` returning `Ok(0)` signals end of stream. After `close`, reads
/// must keep returning `Ok(0)` and never error.
pub trait StreamReader: Send {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Diagnostic/session key used in logs.
    fn label(&self) -> &str;

    /// The base request this reader's audio should be transcribed with.
    fn describe_request(&self) -> RequestDescriptor;

    fn close(&mut self);
}

/// Reader handle shared between the retry loop and subscription workers.
pub type SharedReader = Arc<Mutex<dyn StreamReader>>;

pub fn shared<R: StreamReader + 'static>(reader: R) -> SharedReader {
    Arc::new(Mutex::new(reader))
}

enum ReaderState {
    Open(InterleavedStream),
    Closed,
}

/// Interleaves two audio sources into one two-channel stream reader.
///
/// The open/closed distinction is an explicit state, not a boolean flag,
/// so a read racing a close can only ever observe one of the two valid
/// states.
pub struct TwoChannelReader {
    state: ReaderState,
    label: String,
    request: RequestDescriptor,
}

impl TwoChannelReader {
    pub fn new(
        stream: InterleavedStream,
        label: impl Into<String>,
        request: RequestDescriptor,
    ) -> Self {
        Self {
            state: ReaderState::Open(stream),
            label: label.into(),
            request,
        }
    }
}

impl StreamReader for TwoChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.state {
            ReaderState::Open(stream) => io::Read::read(stream, buf),
            ReaderState::Closed => Ok(0),
        }
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn describe_request(&self) -> RequestDescriptor {
        self.request.clone()
    }

    fn close(&mut self) {
        if let ReaderState::Open(mut stream) =
            std::mem::replace(&mut self.state, ReaderState::Closed)
        {
            debug!("Closing stream reader: {}", self.label);
            stream.close();
        }
    }
}
