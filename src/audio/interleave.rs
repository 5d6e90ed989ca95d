// Byte-level channel interleaver
//
// Merges two independent PCM byte sources into a single two-channel byte
// stream by alternating fixed-size blocks from each source. Block size is
// 2 bytes, matching one 16-bit PCM sample, so the output is a standard
// interleaved stereo stream when both inputs are mono PCM at the same
// cadence.

use std::io::{self, Read};

/// Bytes per interleave block (one 16-bit PCM sample).
pub const BLOCK_SIZE: usize = 2;

/// One left block plus one right block.
pub const PAIR_SIZE: usize = 2 * BLOCK_SIZE;

/// Byte source feeding one channel of the interleaved stream.
pub type ChannelSource = Box<dyn Read + Send>;

/// Interleaves two byte sources in lock-step block pairs.
///
/// Either source may be absent; a missing source reads as immediate EOF.
/// When only one source has reached EOF, the survivor's bytes are paired
/// with silence (zero bytes) on the exhausted channel. When both sources
/// yield data but different byte counts for one pair, the pair is clamped
/// to the shorter count and the extra bytes are dropped for that pass.
/// Both imprecisions are harmless when the inputs advance at the same
/// cadence (plain WAV PCM).
pub struct InterleavedStream {
    left: Option<ChannelSource>,
    right: Option<ChannelSource>,
}

impl InterleavedStream {
    pub fn new(left: Option<ChannelSource>, right: Option<ChannelSource>) -> Self {
        Self { left, right }
    }

    /// Release both underlying sources. Safe when either is already gone.
    pub fn close(&mut self) {
        self.left = None;
        self.right = None;
    }

    /// Read one block from each source.
    ///
    /// Returns `None` when both sources are exhausted, otherwise the pair
    /// length in bytes. Blocks are zeroed first, so a short or exhausted
    /// channel contributes silence for the unread tail.
    fn read_pair(
        &mut self,
        left_block: &mut [u8; BLOCK_SIZE],
        right_block: &mut [u8; BLOCK_SIZE],
    ) -> io::Result<Option<usize>> {
        *left_block = [0; BLOCK_SIZE];
        *right_block = [0; BLOCK_SIZE];

        let left_read = read_channel(self.left.as_mut(), left_block)?;
        let right_read = read_channel(self.right.as_mut(), right_block)?;

        Ok(match (left_read, right_read) {
            (0, 0) => None,
            (0, survivor) | (survivor, 0) => Some(survivor),
            (a, b) => Some(a.min(b)),
        })
    }
}

impl Read for InterleavedStream {
    /// Fill `buf` with alternating left/right block pairs.
    ///
    /// Stops once less than one full pair of destination capacity remains
    /// or the sources are exhausted. Returns the number of bytes written,
    /// which may be less than `buf.len()`. Destinations smaller than one
    /// pair are rejected outright: this type is block-buffer oriented and
    /// single-byte reads are unsupported.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.len() < PAIR_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "destination must hold at least one block pair",
            ));
        }

        let mut left_block = [0u8; BLOCK_SIZE];
        let mut right_block = [0u8; BLOCK_SIZE];
        let mut filled = 0;

        while buf.len() - filled >= PAIR_SIZE {
            let pair_len = match self.read_pair(&mut left_block, &mut right_block)? {
                Some(len) => len,
                None => break,
            };
            filled = write_block(buf, filled, &left_block[..pair_len]);
            filled = write_block(buf, filled, &right_block[..pair_len]);
        }

        Ok(filled)
    }
}

fn read_channel(source: Option<&mut ChannelSource>, block: &mut [u8]) -> io::Result<usize> {
    match source {
        Some(source) => source.read(block),
        None => Ok(0),
    }
}

/// Copy `block` into `dest` at `at`, returning the new fill position.
///
/// Overrunning the destination is a sizing bug in the caller, not a
/// recoverable condition.
fn write_block(dest: &mut [u8], at: usize, block: &[u8]) -> usize {
    assert!(
        at + block.len() <= dest.len(),
        "interleave write past destination capacity"
    );
    dest[at..at + block.len()].copy_from_slice(block);
    at + block.len()
}
