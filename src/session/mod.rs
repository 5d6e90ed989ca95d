//! Pairing of independently-arriving audio files into sessions.

mod pending;

pub use pending::{Arrival, PendingSessions};
