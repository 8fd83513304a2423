// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CDR / XCDR serialization primitives.

pub mod align;
pub mod encoding;
pub mod reader;
pub mod sink;
pub mod sizer;
pub mod writer;

pub use align::{align, checked_align_u32, padding_for};
pub use encoding::{CodecOptions, EncapsulationKind, Encoding, Extensibility, StringTerminator};
pub use reader::CdrReader;
pub use sink::{BufferSink, FixedSink, GrowableSink};
pub use sizer::CdrSizer;
pub use writer::{CdrWriter, DHeaderMark};

use std::fmt;

/// Serialization error used within core::ser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerError {
    /// Write would exceed the capacity of a fixed destination buffer.
    BufferOverflow {
        offset: usize,
        needed: usize,
        capacity: usize,
    },
    /// Read needs more bytes than the source holds.
    OutOfRange {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// Patch target lies in bytes already flushed out of the active window.
    UnsupportedPatch { position: usize, window_start: usize },
    /// Bytes are present but do not form a valid value.
    InvalidData { offset: usize, reason: String },
}

impl fmt::Display for SerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerError::BufferOverflow {
                offset,
                needed,
                capacity,
            } => write!(
                f,
                "buffer overflow at offset {}: need {} bytes, capacity {}",
                offset, needed, capacity
            ),
            SerError::OutOfRange {
                offset,
                needed,
                available,
            } => write!(
                f,
                "read out of range at offset {}: need {} bytes, {} available",
                offset, needed, available
            ),
            SerError::UnsupportedPatch {
                position,
                window_start,
            } => write!(
                f,
                "cannot patch position {}: bytes before {} already flushed",
                position, window_start
            ),
            SerError::InvalidData { offset, reason } => {
                write!(f, "invalid data at offset {}: {}", offset, reason)
            }
        }
    }
}

impl std::error::Error for SerError {}

pub type SerResult<T> = core::result::Result<T, SerError>;
