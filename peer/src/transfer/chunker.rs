//! Chunk arithmetic and payload encoding.
//!
//! A file of `size` bytes is split into `ceil(size / chunk_size)` chunks; all
//! are `chunk_size` long except possibly the last. An empty file has none.

use std::ops::Range;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub const DEFAULT_CHUNK_SIZE: u32 = 16 * 1024;

pub fn total_chunks(size: u64, chunk_size: u32) -> u32 {
    if chunk_size == 0 {
        return 0;
    }
    u32::try_from(size.div_ceil(u64::from(chunk_size))).unwrap_or(u32::MAX)
}

/// Byte range of chunk `index`; empty when past the end.
pub fn chunk_range(size: u64, chunk_size: u32, index: u32) -> Range<u64> {
    let start = (u64::from(index) * u64::from(chunk_size)).min(size);
    let end = (start + u64::from(chunk_size)).min(size);
    start..end
}

pub fn chunk_len(size: u64, chunk_size: u32, index: u32) -> usize {
    let range = chunk_range(size, chunk_size, index);
    (range.end - range.start) as usize
}

/// Bytes covered by the first `count` chunks.
pub fn bytes_through(size: u64, chunk_size: u32, count: u32) -> u64 {
    (u64::from(count) * u64::from(chunk_size)).min(size)
}

pub fn chunk_of(bytes: &[u8], chunk_size: u32, index: u32) -> &[u8] {
    let range = chunk_range(bytes.len() as u64, chunk_size, index);
    &bytes[range.start as usize..range.end as usize]
}

pub fn encode(payload: &[u8]) -> String {
    STANDARD.encode(payload)
}

pub fn decode(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(data)
}
