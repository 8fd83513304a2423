// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # ddsx-idlc
//!
//! Reads the C source that Cyclone DDS `idlc` generates for an IDL type and
//! recovers the topic descriptor metadata from it: the serializer ops with
//! member offsets resolved, key descriptors, header fields and the XTypes
//! type-information blobs.
//!
//! ## Quick Start
//!
//! ```rust
//! use ddsx_idlc::{parse_str, ParseOptions};
//!
//! let source = r#"
//! static const uint32_t Demo_Point_ops [] =
//! {
//!   DDS_OP_ADR | DDS_OP_TYPE_1BY, offsetof (Demo_Point, tag),
//!   DDS_OP_ADR | DDS_OP_TYPE_4BY, offsetof (Demo_Point, x),
//!   DDS_OP_RTS
//! };
//! "#;
//!
//! let parsed = parse_str(source, &ParseOptions::default())?;
//! assert_eq!(parsed.resolved_ops().map(|ops| ops[3]), Some(4));
//! let descriptor = parsed.into_topic_descriptor()?;
//! assert_eq!(descriptor.size(), 8);
//! # Ok::<(), ddsx_idlc::IdlcError>(())
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! source text -> source (comments, #defines, initializers)
//!             -> expr   (constant evaluation)
//!             -> layout (offset simulation, key flag fix-up)
//!             -> keys
//!             -> ParsedDescriptor -> ddsx::TopicDescriptor
//! ```

pub mod error;
pub mod expr;
pub mod keys;
pub mod layout;
pub mod parser;
pub mod source;

pub use error::{IdlcError, Result};
pub use expr::{Eval, SymbolTable};
pub use keys::RawKey;
pub use layout::{apply_key_fixup, resolve_offsets, Resolution, StructLayout};
pub use parser::{
    parse_all, parse_file, parse_keys, parse_ops, parse_str, ParseOptions, ParsedDescriptor,
};
