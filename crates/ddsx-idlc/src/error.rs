// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Parser error type.

use std::path::PathBuf;

/// Errors returned while turning idlc output into descriptor metadata.
#[derive(Debug)]
pub enum IdlcError {
    /// The source file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// No `<Type>_ops[]` array (or none matching the requested type).
    MissingOps { type_name: Option<String> },
    /// Some ops or key elements reference symbols that could not be resolved.
    IncompleteMetadata {
        type_name: String,
        ops: Vec<usize>,
        keys: Vec<usize>,
    },
    /// A key entry is structurally valid but cannot be used.
    InvalidKey { name: String, reason: String },
    /// The extracted metadata was rejected by the descriptor builder.
    Descriptor(ddsx::Error),
}

impl std::fmt::Display for IdlcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdlcError::Io { path, source } => {
                write!(f, "Cannot read {}: {}", path.display(), source)
            }
            IdlcError::MissingOps { type_name: Some(t) } => {
                write!(f, "No ops array found for type '{}'", t)
            }
            IdlcError::MissingOps { type_name: None } => write!(f, "No ops array found"),
            IdlcError::IncompleteMetadata {
                type_name,
                ops,
                keys,
            } => write!(
                f,
                "Incomplete metadata for '{}': unresolved ops {:?}, unresolved keys {:?}",
                type_name, ops, keys
            ),
            IdlcError::InvalidKey { name, reason } => {
                write!(f, "Invalid key '{}': {}", name, reason)
            }
            IdlcError::Descriptor(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for IdlcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IdlcError::Io { source, .. } => Some(source),
            IdlcError::Descriptor(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ddsx::Error> for IdlcError {
    fn from(e: ddsx::Error) -> Self {
        IdlcError::Descriptor(e)
    }
}

pub type Result<T> = std::result::Result<T, IdlcError>;
