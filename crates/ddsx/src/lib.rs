// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # ddsx - XCDR wire codec and native topic descriptors
//!
//! Byte-exact CDR / XCDR serialization for record types exchanged through a
//! native DDS library, plus the owning memory block that describes those
//! types to the library.
//!
//! ## Quick Start
//!
//! ```rust
//! use ddsx::core::ser::{CdrReader, CdrSizer, CdrWriter, Encoding};
//!
//! # fn main() -> ddsx::Result<()> {
//! let mut sizer = CdrSizer::new(0, Encoding::Extended);
//! sizer.write_i32(42);
//! sizer.write_string("Hello");
//!
//! let mut writer = CdrWriter::growable(Encoding::Extended);
//! writer.write_i32(42)?;
//! writer.write_string("Hello")?;
//! let bytes = writer.finish().into_vec();
//! assert_eq!(bytes.len(), sizer.delta(0));
//!
//! let mut reader = CdrReader::new(&bytes, Encoding::Extended);
//! assert_eq!(reader.read_i32()?, 42);
//! assert_eq!(reader.read_string()?, "Hello");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                         Generated / user types                      |
//! |                    TopicType -> encode/decode_sample                |
//! +---------------------------------------------------------------------+
//! |            Wire codec (core::ser)        |   Descriptors            |
//! |   align | CdrSizer | CdrWriter | CdrReader | TopicDescriptor        |
//! |                 BufferSink               | NativeDescriptor (ABI)   |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`core::ser`] - Sizer, writer, reader and alignment
//! - [`descriptor`] - Opcode words, metadata, native block
//! - [`topic`] - `TopicType` dispatch and sample envelopes
//! - [`config`] - Constants and runtime codec configuration
//! - [`logging`] - `env_logger` initialization helpers

pub mod config;
pub mod core;
pub mod descriptor;
mod error;
pub mod logging;
pub mod topic;

pub use config::CodecConfig;
pub use core::ser::{
    CdrReader, CdrSizer, CdrWriter, CodecOptions, EncapsulationKind, Encoding, Extensibility,
    SerError, StringTerminator,
};
pub use descriptor::{AbiOffsets, KeyDescriptor, NativeDescriptor, TopicDescriptor};
pub use error::{Error, Result};
pub use topic::{decode_sample, encode_sample, TopicType};
