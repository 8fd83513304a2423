// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Crate-level error type.

use crate::core::ser::SerError;

/// Errors returned by the public ddsx API.
///
/// # Example
///
/// ```rust
/// use ddsx::core::ser::{CdrReader, Encoding};
/// use ddsx::Error;
///
/// fn first_u32(bytes: &[u8]) -> ddsx::Result<u32> {
///     Ok(CdrReader::new(bytes, Encoding::Legacy).read_u32()?)
/// }
///
/// match first_u32(&[1, 2]) {
///     Err(Error::Serialization(e)) => println!("short buffer: {}", e),
///     other => println!("{:?}", other),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Codec Errors
    // ========================================================================
    /// Writer, reader or patch failure.
    Serialization(SerError),

    // ========================================================================
    // Descriptor Errors
    // ========================================================================
    /// Metadata cannot be turned into a native block (layout does not fit, NUL in name...).
    InvalidDescriptor(String),
    /// The system allocator returned NULL.
    AllocationFailed,

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    Config(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Serialization(e) => write!(f, "CDR serialization failed: {}", e),
            Error::InvalidDescriptor(msg) => write!(f, "Invalid descriptor: {}", msg),
            Error::AllocationFailed => write!(f, "Native allocation failed"),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SerError> for Error {
    fn from(err: SerError) -> Self {
        Error::Serialization(err)
    }
}

/// Result alias for ddsx operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_and_source() {
        let err = Error::from(SerError::UnsupportedPatch {
            position: 0,
            window_start: 8,
        });
        assert_eq!(
            err.to_string(),
            "CDR serialization failed: cannot patch position 0: bytes before 8 already flushed"
        );
        assert!(err.source().is_some());

        let err = Error::InvalidDescriptor("type name contains NUL".into());
        assert_eq!(err.to_string(), "Invalid descriptor: type name contains NUL");
        assert!(err.source().is_none());
        assert_eq!(Error::AllocationFailed.to_string(), "Native allocation failed");
    }
}
