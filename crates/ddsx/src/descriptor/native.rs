// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Owning, ABI-shaped `dds_topic_descriptor_t` block.
//!
//! All regions come from `libc::calloc` and are freed in reverse order by
//! [`NativeDescriptor::dispose`].

use std::ffi::{c_void, CString};
use std::ptr;

use super::abi::AbiOffsets;
use super::metadata::TopicDescriptor;
use crate::{Error, Result};

/// Owner of the native descriptor block and everything it points to.
#[derive(Debug)]
pub struct NativeDescriptor {
    block: *mut u8,
    allocations: Vec<*mut c_void>,
    abi: AbiOffsets,
    type_name: String,
}

// SAFETY: the block and its regions are exclusively owned by this value and
// never aliased mutably after construction. Moving the owner to another thread
// moves that ownership with it.
unsafe impl Send for NativeDescriptor {}

impl NativeDescriptor {
    /// Build with the built-in Cyclone DDS 0.11 layout.
    pub fn new(descriptor: &TopicDescriptor) -> Result<Self> {
        Self::with_abi(descriptor, AbiOffsets::CYCLONE_0_11)
    }

    pub fn with_abi(descriptor: &TopicDescriptor, abi: AbiOffsets) -> Result<Self> {
        abi.validate()?;

        // Any early return below drops `native`, which frees what was allocated so far.
        let mut native = NativeDescriptor {
            block: ptr::null_mut(),
            allocations: Vec::new(),
            abi,
            type_name: descriptor.type_name().to_string(),
        };

        native.block = native.alloc(abi.descriptor_size)?.cast::<u8>();

        native.write_u32(abi.size, descriptor.size());
        native.write_u32(abi.align, descriptor.align());
        if let Some(offset) = abi.flagset {
            native.write_u32(offset, descriptor.flagset());
        }
        native.write_u32(abi.n_keys, descriptor.n_keys());
        native.write_u32(abi.n_ops, descriptor.n_ops());

        let name = native.alloc_str(descriptor.type_name())?;
        native.write_ptr(abi.type_name, name);

        let keys = native.alloc_keys(descriptor)?;
        native.write_ptr(abi.keys, keys);

        let ops = native.alloc_ops(descriptor.ops())?;
        native.write_ptr(abi.ops, ops);

        if let (Some(offset), Some(meta)) = (abi.meta, descriptor.meta()) {
            if !meta.is_empty() {
                let meta = native.alloc_str(meta)?;
                native.write_ptr(offset, meta);
            }
        }

        if let (Some(data), Some(size)) = (abi.type_info_data, abi.type_info_size) {
            let blob = native.alloc_bytes(descriptor.type_info())?;
            native.write_ptr(data, blob);
            native.write_u32(size, blob_len(descriptor.type_info())?);
        }
        if let (Some(data), Some(size)) = (abi.type_map_data, abi.type_map_size) {
            let blob = native.alloc_bytes(descriptor.type_map())?;
            native.write_ptr(data, blob);
            native.write_u32(size, blob_len(descriptor.type_map())?);
        }

        if let (Some(offset), Some(mask)) = (
            abi.restrict_data_representation,
            descriptor.restrict_data_representation(),
        ) {
            native.write_u32(offset, mask);
        }

        log::debug!(
            "[NativeDescriptor] built '{}': {} ops, {} keys, {} allocations",
            native.type_name,
            descriptor.n_ops(),
            descriptor.n_keys(),
            native.allocations.len()
        );
        Ok(native)
    }

    /// Borrowed pointer to the block, null after [`dispose`](Self::dispose).
    ///
    /// Valid only while `self` is alive and not disposed.
    pub fn as_ptr(&self) -> *const c_void {
        self.block.cast::<c_void>().cast_const()
    }

    /// Run `f` with the block pointer; the pointer must not escape `f`.
    pub fn with_ptr<R>(&self, f: impl FnOnce(*const c_void) -> R) -> R {
        f(self.as_ptr())
    }

    pub fn is_disposed(&self) -> bool {
        self.block.is_null()
    }

    pub fn abi(&self) -> &AbiOffsets {
        &self.abi
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Number of live native regions (0 after dispose).
    pub fn allocation_count(&self) -> usize {
        self.allocations.len()
    }

    /// Free every region. Idempotent.
    pub fn dispose(&mut self) {
        if self.allocations.is_empty() && self.block.is_null() {
            return;
        }
        let count = self.allocations.len();
        while let Some(region) = self.allocations.pop() {
            // SAFETY: every entry came from `libc::calloc` in `alloc` and is
            // popped exactly once.
            unsafe { libc::free(region) };
        }
        self.block = ptr::null_mut();
        log::trace!(
            "[NativeDescriptor] disposed '{}' ({} regions)",
            self.type_name,
            count
        );
    }

    fn alloc(&mut self, size: usize) -> Result<*mut c_void> {
        // SAFETY: calloc has no preconditions; a null return is handled.
        let region = unsafe { libc::calloc(size.max(1), 1) };
        if region.is_null() {
            return Err(Error::AllocationFailed);
        }
        self.allocations.push(region);
        Ok(region)
    }

    fn alloc_str(&mut self, value: &str) -> Result<*mut c_void> {
        let c = CString::new(value).map_err(|_| {
            Error::InvalidDescriptor(format!("string {:?} contains NUL", value))
        })?;
        self.alloc_bytes_nonempty(c.as_bytes_with_nul())
    }

    /// Null for an empty blob.
    fn alloc_bytes(&mut self, bytes: &[u8]) -> Result<*mut c_void> {
        if bytes.is_empty() {
            return Ok(ptr::null_mut());
        }
        self.alloc_bytes_nonempty(bytes)
    }

    fn alloc_bytes_nonempty(&mut self, bytes: &[u8]) -> Result<*mut c_void> {
        let region = self.alloc(bytes.len())?;
        // SAFETY: region holds at least bytes.len() bytes and does not overlap `bytes`.
        unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), region.cast::<u8>(), bytes.len()) };
        Ok(region)
    }

    fn alloc_ops(&mut self, ops: &[u32]) -> Result<*mut c_void> {
        if ops.is_empty() {
            return Ok(ptr::null_mut());
        }
        let region = self.alloc(std::mem::size_of_val(ops))?;
        // SAFETY: calloc returns memory aligned for any fundamental type and
        // large enough for ops.len() words.
        unsafe { ptr::copy_nonoverlapping(ops.as_ptr(), region.cast::<u32>(), ops.len()) };
        Ok(region)
    }

    fn alloc_keys(&mut self, descriptor: &TopicDescriptor) -> Result<*mut c_void> {
        let keys = descriptor.keys();
        if keys.is_empty() {
            return Ok(ptr::null_mut());
        }
        let record = self.abi.key_record_size;
        let array = self.alloc(record * keys.len())?.cast::<u8>();
        for (i, key) in keys.iter().enumerate() {
            let name = self.alloc_str(&key.name)?;
            let base = i * record;
            // SAFETY: `validate` checked each field fits in `record`, and the
            // array holds keys.len() records.
            unsafe {
                ptr::write_unaligned(
                    array.add(base + self.abi.key_name).cast::<*mut c_void>(),
                    name,
                );
                ptr::write_unaligned(array.add(base + self.abi.key_index).cast::<u32>(), key.index);
                ptr::write_unaligned(array.add(base + self.abi.key_flags).cast::<u32>(), key.flags);
            }
        }
        Ok(array.cast::<c_void>())
    }

    fn write_u32(&mut self, offset: usize, value: u32) {
        // SAFETY: `validate` checked offset + 4 <= descriptor_size.
        unsafe { ptr::write_unaligned(self.block.add(offset).cast::<u32>(), value) };
    }

    fn write_ptr(&mut self, offset: usize, value: *mut c_void) {
        // SAFETY: `validate` checked offset + pointer_size <= descriptor_size.
        unsafe { ptr::write_unaligned(self.block.add(offset).cast::<*mut c_void>(), value) };
    }
}

impl Drop for NativeDescriptor {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn blob_len(blob: &[u8]) -> Result<u32> {
    u32::try_from(blob.len())
        .map_err(|_| Error::InvalidDescriptor(format!("blob of {} bytes too large", blob.len())))
}
