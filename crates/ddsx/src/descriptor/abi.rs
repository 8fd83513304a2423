// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field offsets of the native `dds_topic_descriptor_t`.

use crate::{Error, Result};

/// Byte offsets of every descriptor field the builder writes.
///
/// Optional fields are skipped when `None` (older native releases lack them).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbiOffsets {
    pub descriptor_size: usize,
    pub pointer_size: usize,
    pub size: usize,
    pub align: usize,
    pub flagset: Option<usize>,
    pub n_keys: usize,
    pub type_name: usize,
    pub keys: usize,
    pub n_ops: usize,
    pub ops: usize,
    pub meta: Option<usize>,
    pub type_info_data: Option<usize>,
    pub type_info_size: Option<usize>,
    pub type_map_data: Option<usize>,
    pub type_map_size: Option<usize>,
    pub restrict_data_representation: Option<usize>,
    /// `dds_key_descriptor_t`: `{ const char *m_name; uint32_t m_offset; uint32_t m_idx; }`
    pub key_record_size: usize,
    pub key_name: usize,
    pub key_index: usize,
    pub key_flags: usize,
}

impl AbiOffsets {
    /// Cyclone DDS 0.11, 64-bit targets.
    pub const CYCLONE_0_11: AbiOffsets = AbiOffsets {
        descriptor_size: 96,
        pointer_size: 8,
        size: 0,
        align: 4,
        flagset: Some(8),
        n_keys: 12,
        type_name: 16,
        keys: 24,
        n_ops: 32,
        ops: 40,
        meta: Some(48),
        type_info_data: Some(56),
        type_info_size: Some(64),
        type_map_data: Some(72),
        type_map_size: Some(80),
        restrict_data_representation: Some(88),
        key_record_size: 16,
        key_name: 0,
        key_index: 8,
        key_flags: 12,
    };

    /// Check every field fits its record and pointers match this target.
    pub fn validate(&self) -> Result<()> {
        if self.pointer_size != std::mem::size_of::<usize>() {
            return Err(Error::InvalidDescriptor(format!(
                "ABI pointer size {} does not match target pointer size {}",
                self.pointer_size,
                std::mem::size_of::<usize>()
            )));
        }
        let ptr = self.pointer_size;
        let fields: [(&str, Option<usize>, usize); 14] = [
            ("m_size", Some(self.size), 4),
            ("m_align", Some(self.align), 4),
            ("m_flagset", self.flagset, 4),
            ("m_nkeys", Some(self.n_keys), 4),
            ("m_typename", Some(self.type_name), ptr),
            ("m_keys", Some(self.keys), ptr),
            ("m_nops", Some(self.n_ops), 4),
            ("m_ops", Some(self.ops), ptr),
            ("m_meta", self.meta, ptr),
            ("type_information.data", self.type_info_data, ptr),
            ("type_information.sz", self.type_info_size, 4),
            ("type_mapping.data", self.type_map_data, ptr),
            ("type_mapping.sz", self.type_map_size, 4),
            (
                "restrict_data_representation",
                self.restrict_data_representation,
                4,
            ),
        ];
        for (name, offset, width) in fields {
            if let Some(offset) = offset {
                check_field(name, offset, width, self.descriptor_size)?;
            }
        }
        check_field("key.m_name", self.key_name, ptr, self.key_record_size)?;
        check_field("key.m_offset", self.key_index, 4, self.key_record_size)?;
        check_field("key.m_idx", self.key_flags, 4, self.key_record_size)?;
        if self.type_info_data.is_some() != self.type_info_size.is_some()
            || self.type_map_data.is_some() != self.type_map_size.is_some()
        {
            return Err(Error::InvalidDescriptor(
                "blob pointer and length offsets must be defined together".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AbiOffsets {
    fn default() -> Self {
        Self::CYCLONE_0_11
    }
}

fn check_field(name: &str, offset: usize, width: usize, record: usize) -> Result<()> {
    if offset % width != 0 {
        return Err(Error::InvalidDescriptor(format!(
            "{} at offset {} is not {}-byte aligned",
            name, offset, width
        )));
    }
    if offset + width > record {
        return Err(Error::InvalidDescriptor(format!(
            "{} at offset {} (+{}) exceeds record size {}",
            name, offset, width, record
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_cyclone_table_is_valid() {
        AbiOffsets::CYCLONE_0_11.validate().expect("built-in table");
        assert_eq!(AbiOffsets::default(), AbiOffsets::CYCLONE_0_11);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_out_of_block_field_rejected() {
        let abi = AbiOffsets {
            restrict_data_representation: Some(96),
            ..AbiOffsets::CYCLONE_0_11
        };
        assert!(abi.validate().is_err());

        let abi = AbiOffsets {
            key_flags: 14,
            ..AbiOffsets::CYCLONE_0_11
        };
        assert!(abi.validate().is_err());

        let abi = AbiOffsets {
            type_map_size: None,
            ..AbiOffsets::CYCLONE_0_11
        };
        assert!(abi.validate().is_err());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_optional_fields_may_be_absent() {
        let abi = AbiOffsets {
            descriptor_size: 48,
            meta: None,
            type_info_data: None,
            type_info_size: None,
            type_map_data: None,
            type_map_size: None,
            restrict_data_representation: None,
            ..AbiOffsets::CYCLONE_0_11
        };
        abi.validate().expect("minimal layout");
    }

    #[test]
    fn test_pointer_size_mismatch() {
        let abi = AbiOffsets {
            pointer_size: std::mem::size_of::<usize>() * 2,
            ..AbiOffsets::CYCLONE_0_11
        };
        assert!(abi.validate().is_err());
    }
}
