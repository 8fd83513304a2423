// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic descriptors: opcode words, metadata, and the native ABI block.

pub mod abi;
pub mod metadata;
pub mod native;
pub mod ops;

pub use abi::AbiOffsets;
pub use metadata::{KeyDescriptor, TopicDescriptor, TopicDescriptorBuilder};
pub use native::NativeDescriptor;
