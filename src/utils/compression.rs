//! LZ4 payload compression for the compressed-packet flag.
//!
//! Compressed payloads use the size-prepended LZ4 block format (4-byte
//! little-endian uncompressed size, then the compressed block). The claimed
//! size is validated against the protocol's payload limit before any
//! allocation, so a hostile peer cannot trigger a decompression bomb.

use crate::config::MAX_PAYLOAD_SIZE;
use crate::error::{ProtocolError, Result};

/// Maximum output size for decompression, aligned with the payload limit.
const MAX_DECOMPRESSION_SIZE: usize = MAX_PAYLOAD_SIZE;

/// Compress a payload into the size-prepended LZ4 block format.
pub fn compress(data: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(data)
}

/// Decompress a size-prepended LZ4 payload.
///
/// # Errors
/// Returns `ProtocolError::DecompressionFailure` if:
/// - the input is too short to carry the size header
/// - the claimed or actual output size exceeds the payload limit
/// - the compressed block is malformed
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    // Validate the claimed size before lz4_flex attempts allocation.
    if data.len() < 4 {
        return Err(ProtocolError::DecompressionFailure);
    }

    let claimed_size = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if claimed_size > MAX_DECOMPRESSION_SIZE {
        return Err(ProtocolError::DecompressionFailure);
    }

    let decompressed = lz4_flex::decompress_size_prepended(data)
        .map_err(|_| ProtocolError::DecompressionFailure)?;

    if decompressed.len() > MAX_DECOMPRESSION_SIZE {
        return Err(ProtocolError::DecompressionFailure);
    }
    Ok(decompressed)
}

/// Compress a payload if it meets the threshold and actually shrinks.
///
/// Returns the output bytes and a flag indicating whether compression was
/// applied; the flag becomes the packet's compressed bit.
pub fn maybe_compress(data: &[u8], threshold_bytes: usize) -> (Vec<u8>, bool) {
    if data.len() < threshold_bytes {
        return (data.to_vec(), false);
    }
    let compressed = compress(data);
    if compressed.len() < data.len() {
        (compressed, true)
    } else {
        (data.to_vec(), false)
    }
}

/// Decompress a payload only if its packet carried the compressed flag.
pub fn maybe_decompress(data: &[u8], was_compressed: bool) -> Result<Vec<u8>> {
    if was_compressed {
        decompress(data)
    } else {
        Ok(data.to_vec())
    }
}
