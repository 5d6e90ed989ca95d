pub mod file;
pub mod interleave;

pub use file::AudioFile;
pub use interleave::{ChannelSource, InterleavedStream, BLOCK_SIZE, PAIR_SIZE};
