//! # Error Types
//!
//! Comprehensive error handling for the mesh chat protocol.
//!
//! This module defines all error variants that can occur during protocol
//! operations, from codec failures on untrusted input to transport and
//! storage failures.
//!
//! ## Error Categories
//! - **Encode Errors**: Output capacity and field-range violations
//! - **Decode Errors**: Short, truncated, or version-mismatched frames
//! - **Compression Errors**: Decompression failures, size limit violations
//! - **I/O Errors**: File system and transport failures
//!
//! Every decode failure is a clean rejection: the caller never receives a
//! partially-populated packet or message alongside an error, and a malformed
//! frame from an untrusted peer can never cause an out-of-bounds access.
//! None of these errors are retried internally; retry is transport policy.
//!
//! All errors implement `std::error::Error` for interoperability.

use std::io;
use thiserror::Error;

// ProtocolError is the primary error type for all protocol operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Encode: the caller-supplied output buffer cannot hold the frame.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// Decode: input is below the absolute minimum for the structure.
    #[error("input too short: {len} bytes, minimum is {min}")]
    TooShort { len: usize, min: usize },

    /// Decode: the version byte does not match the supported protocol version.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// Decode: a declared length would read past the end of the buffer.
    #[error("truncated frame: {section} needs {needed} bytes, {available} remain")]
    Truncated {
        section: &'static str,
        needed: usize,
        available: usize,
    },

    /// Encode: a length-prefixed string exceeds its prefix's representable range.
    #[error("{field} is {len} bytes, exceeds the {max}-byte field limit")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// Encode: the packet payload exceeds the 16-bit payload length field.
    #[error("payload too large: {0} bytes")]
    OversizedPayload(usize),

    /// Inbound packet type has no registered handler.
    #[error("unexpected packet type")]
    UnexpectedPacket,

    #[error("compression failed")]
    CompressionFailure,

    #[error("decompression failed")]
    DecompressionFailure,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("identity error: {0}")]
    IdentityError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("transport error: {0}")]
    TransportError(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
