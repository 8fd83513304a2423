// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic descriptor metadata, the source for [`NativeDescriptor`](super::NativeDescriptor).

use super::ops;
use crate::{Error, Result};

/// One key member: `{name, index, flags}`.
///
/// `index` is the position of the member's `ADR` word in the ops stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescriptor {
    pub name: String,
    pub index: u32,
    pub flags: u32,
}

impl KeyDescriptor {
    pub fn new(name: impl Into<String>, index: u32, flags: u32) -> Self {
        Self {
            name: name.into(),
            index,
            flags,
        }
    }
}

/// Immutable description of one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDescriptor {
    type_name: String,
    size: u32,
    align: u32,
    flagset: u32,
    keys: Vec<KeyDescriptor>,
    ops: Vec<u32>,
    type_info: Vec<u8>,
    type_map: Vec<u8>,
    meta: Option<String>,
    restrict_data_representation: Option<u32>,
}

impl TopicDescriptor {
    pub fn builder(type_name: impl Into<String>) -> TopicDescriptorBuilder {
        TopicDescriptorBuilder::new(type_name)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn align(&self) -> u32 {
        self.align
    }

    pub fn flagset(&self) -> u32 {
        self.flagset
    }

    pub fn keys(&self) -> &[KeyDescriptor] {
        &self.keys
    }

    pub fn n_keys(&self) -> u32 {
        self.keys.len() as u32
    }

    pub fn ops(&self) -> &[u32] {
        &self.ops
    }

    /// Number of ops words.
    pub fn n_ops(&self) -> u32 {
        self.ops.len() as u32
    }

    pub fn type_info(&self) -> &[u8] {
        &self.type_info
    }

    pub fn type_map(&self) -> &[u8] {
        &self.type_map
    }

    pub fn meta(&self) -> Option<&str> {
        self.meta.as_deref()
    }

    pub fn restrict_data_representation(&self) -> Option<u32> {
        self.restrict_data_representation
    }
}

/// Builder for [`TopicDescriptor`]; `build()` validates the metadata.
#[derive(Debug, Clone)]
pub struct TopicDescriptorBuilder {
    inner: TopicDescriptor,
}

impl TopicDescriptorBuilder {
    fn new(type_name: impl Into<String>) -> Self {
        Self {
            inner: TopicDescriptor {
                type_name: type_name.into(),
                size: 0,
                align: 1,
                flagset: 0,
                keys: Vec::new(),
                ops: Vec::new(),
                type_info: Vec::new(),
                type_map: Vec::new(),
                meta: None,
                restrict_data_representation: None,
            },
        }
    }

    pub fn size(mut self, size: u32) -> Self {
        self.inner.size = size;
        self
    }

    pub fn align(mut self, align: u32) -> Self {
        self.inner.align = align;
        self
    }

    pub fn flagset(mut self, flagset: u32) -> Self {
        self.inner.flagset = flagset;
        self
    }

    pub fn ops(mut self, ops: Vec<u32>) -> Self {
        self.inner.ops = ops;
        self
    }

    pub fn keys(mut self, keys: Vec<KeyDescriptor>) -> Self {
        self.inner.keys = keys;
        self
    }

    pub fn key(mut self, key: KeyDescriptor) -> Self {
        self.inner.keys.push(key);
        self
    }

    pub fn type_info(mut self, blob: Vec<u8>) -> Self {
        self.inner.type_info = blob;
        self
    }

    pub fn type_map(mut self, blob: Vec<u8>) -> Self {
        self.inner.type_map = blob;
        self
    }

    pub fn meta(mut self, meta: impl Into<String>) -> Self {
        self.inner.meta = Some(meta.into());
        self
    }

    pub fn restrict_data_representation(mut self, mask: u32) -> Self {
        self.inner.restrict_data_representation = Some(mask);
        self
    }

    pub fn build(self) -> Result<TopicDescriptor> {
        let d = &self.inner;
        if d.type_name.is_empty() {
            return Err(Error::InvalidDescriptor("empty type name".into()));
        }
        if d.type_name.contains('\0') {
            return Err(Error::InvalidDescriptor(format!(
                "type name {:?} contains NUL",
                d.type_name
            )));
        }
        if !d.align.is_power_of_two() {
            return Err(Error::InvalidDescriptor(format!(
                "alignment {} is not a power of two",
                d.align
            )));
        }
        if d.ops.is_empty() {
            return Err(Error::InvalidDescriptor(format!(
                "{}: empty ops stream",
                d.type_name
            )));
        }
        for key in &d.keys {
            if key.name.contains('\0') {
                return Err(Error::InvalidDescriptor(format!(
                    "key name {:?} contains NUL",
                    key.name
                )));
            }
            if key.index as usize >= d.ops.len() {
                return Err(Error::InvalidDescriptor(format!(
                    "{}: key '{}' index {} outside ops[{}]",
                    d.type_name,
                    key.name,
                    key.index,
                    d.ops.len()
                )));
            }
        }
        if let Some(meta) = &d.meta {
            if meta.contains('\0') {
                return Err(Error::InvalidDescriptor("meta contains NUL".into()));
            }
        }
        if d.restrict_data_representation.is_some()
            && d.flagset & ops::TOPIC_RESTRICT_DATA_REPRESENTATION == 0
        {
            log::debug!(
                "[TopicDescriptor] {}: restrict_data_representation set without flagset bit",
                d.type_name
            );
        }
        Ok(self.inner)
    }
}
