//! # Utility Modules
//!
//! Supporting utilities for identifiers, timestamps, compression, and logging.
//!
//! ## Components
//! - **Ident**: message id generation (UUID v4 text) and peer id hex form
//! - **Time**: calendar-to-epoch timestamps shared by all peers
//! - **Compression**: LZ4 with size limits and thresholds
//! - **Logging**: structured logging configuration
//!
//! ## Security
//! - Decompression bomb protection (payload size limit)
//! - Random draws come from the platform RNG

pub mod compression;
pub mod ident;
pub mod logging;
pub mod time;
