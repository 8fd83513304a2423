// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serializer opcode words.
//!
//! Layout of one word:
//!
//! ```text
//! 31      24 23      16 15       8 7        0
//! +---------+----------+----------+---------+
//! |  insn   |   type   | subtype  |  flags  |
//! +---------+----------+----------+---------+
//! ```

/// Instruction byte mask.
pub const OP_MASK: u32 = 0xFF00_0000;
/// Type code mask. Bit 23 is reserved for type flags.
pub const OP_TYPE_MASK: u32 = 0x007F_0000;
pub const OP_SUBTYPE_MASK: u32 = 0x0000_7F00;
pub const OP_FLAGS_MASK: u32 = 0x0000_00FF;

pub const OP_RTS: u32 = 0x00 << 24;
pub const OP_ADR: u32 = 0x01 << 24;
pub const OP_JSR: u32 = 0x02 << 24;
pub const OP_JEQ: u32 = 0x03 << 24;
pub const OP_DLC: u32 = 0x04 << 24;
pub const OP_PLC: u32 = 0x05 << 24;
pub const OP_PLM: u32 = 0x06 << 24;
pub const OP_KOF: u32 = 0x07 << 24;
pub const OP_JEQ4: u32 = 0x08 << 24;

pub const FLAG_KEY: u32 = 0x01;
pub const FLAG_OPT: u32 = 0x02;
pub const FLAG_MU: u32 = 0x04;
pub const FLAG_SGN: u32 = 0x20;
pub const FLAG_FP: u32 = 0x40;

/// Flags that must not appear on a key member.
pub const KEY_CONFLICT_FLAGS: u32 = FLAG_OPT | FLAG_SGN;

/// Member type code (bits 16..23).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeCode {
    Byte1 = 0x01,
    Byte2 = 0x02,
    Byte4 = 0x03,
    Byte8 = 0x04,
    String = 0x05,
    BoundedString = 0x06,
    Sequence = 0x07,
    Array = 0x08,
    Union = 0x09,
    Struct = 0x0A,
    BoundedSequence = 0x0B,
    Enum = 0x0C,
    External = 0x0D,
    Boolean = 0x0E,
    Bitmask = 0x0F,
}

impl TypeCode {
    pub const ALL: [TypeCode; 15] = [
        TypeCode::Byte1,
        TypeCode::Byte2,
        TypeCode::Byte4,
        TypeCode::Byte8,
        TypeCode::String,
        TypeCode::BoundedString,
        TypeCode::Sequence,
        TypeCode::Array,
        TypeCode::Union,
        TypeCode::Struct,
        TypeCode::BoundedSequence,
        TypeCode::Enum,
        TypeCode::External,
        TypeCode::Boolean,
        TypeCode::Bitmask,
    ];

    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(TypeCode::Byte1),
            0x02 => Some(TypeCode::Byte2),
            0x03 => Some(TypeCode::Byte4),
            0x04 => Some(TypeCode::Byte8),
            0x05 => Some(TypeCode::String),
            0x06 => Some(TypeCode::BoundedString),
            0x07 => Some(TypeCode::Sequence),
            0x08 => Some(TypeCode::Array),
            0x09 => Some(TypeCode::Union),
            0x0A => Some(TypeCode::Struct),
            0x0B => Some(TypeCode::BoundedSequence),
            0x0C => Some(TypeCode::Enum),
            0x0D => Some(TypeCode::External),
            0x0E => Some(TypeCode::Boolean),
            0x0F => Some(TypeCode::Bitmask),
            _ => None,
        }
    }

    /// Mnemonic used in `DDS_OP_TYPE_*` / `DDS_OP_VAL_*` names.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            TypeCode::Byte1 => "1BY",
            TypeCode::Byte2 => "2BY",
            TypeCode::Byte4 => "4BY",
            TypeCode::Byte8 => "8BY",
            TypeCode::String => "STR",
            TypeCode::BoundedString => "BST",
            TypeCode::Sequence => "SEQ",
            TypeCode::Array => "ARR",
            TypeCode::Union => "UNI",
            TypeCode::Struct => "STU",
            TypeCode::BoundedSequence => "BSQ",
            TypeCode::Enum => "ENU",
            TypeCode::External => "EXT",
            TypeCode::Boolean => "BLN",
            TypeCode::Bitmask => "BMK",
        }
    }

    /// In-memory `(size, align)` of a member of this type.
    ///
    /// Pointer-backed members (strings, sequences, external structs) take one
    /// pointer slot. `UNI` and `STU` depend on the surrounding ops and fall
    /// back to `(1, 1)` here.
    pub const fn layout(self, pointer_size: u32) -> (u32, u32) {
        match self {
            TypeCode::Byte1 | TypeCode::Boolean => (1, 1),
            TypeCode::Byte2 => (2, 2),
            TypeCode::Byte4 | TypeCode::Enum | TypeCode::Bitmask => (4, 4),
            TypeCode::Byte8 => (8, 8),
            TypeCode::String
            | TypeCode::BoundedString
            | TypeCode::Sequence
            | TypeCode::Array
            | TypeCode::BoundedSequence
            | TypeCode::External => (pointer_size, pointer_size),
            TypeCode::Union | TypeCode::Struct => (1, 1),
        }
    }
}

#[inline]
pub const fn instruction(word: u32) -> u32 {
    word & OP_MASK
}

#[inline]
pub const fn type_code(word: u32) -> u8 {
    ((word & OP_TYPE_MASK) >> 16) as u8
}

#[inline]
pub const fn flags(word: u32) -> u32 {
    word & OP_FLAGS_MASK
}

#[inline]
pub const fn is_adr(word: u32) -> bool {
    instruction(word) == OP_ADR
}

/// `(size, align)` for a raw type code; unknown codes are `(1, 1)`.
pub const fn layout_for_code(code: u8, pointer_size: u32) -> (u32, u32) {
    match TypeCode::from_u8(code) {
        Some(tc) => tc.layout(pointer_size),
        None => (1, 1),
    }
}

/// Words consumed by an `ADR` op of `code`, instruction word included.
pub const fn adr_width(code: u8) -> usize {
    match TypeCode::from_u8(code) {
        Some(TypeCode::External) => 3,
        Some(TypeCode::Struct) => 4,
        _ => 2,
    }
}

// =======================================================================
// Topic descriptor flagset (m_flagset)
// =======================================================================

pub const TOPIC_NO_OPTIMIZE: u32 = 1 << 0;
pub const TOPIC_FIXED_KEY: u32 = 1 << 1;
pub const TOPIC_CONTAINS_UNION: u32 = 1 << 2;
pub const TOPIC_FIXED_SIZE: u32 = 1 << 5;
pub const TOPIC_FIXED_KEY_XCDR2: u32 = 1 << 6;
pub const TOPIC_XTYPES_METADATA: u32 = 1 << 7;
pub const TOPIC_RESTRICT_DATA_REPRESENTATION: u32 = 1 << 8;

/// Data representation bits for `restrict_data_representation`.
pub const DATA_REPRESENTATION_FLAG_XCDR1: u32 = 1 << 0;
pub const DATA_REPRESENTATION_FLAG_XCDR2: u32 = 1 << 2;
pub const DATA_REPRESENTATION_RESTRICT_DEFAULT: u32 =
    DATA_REPRESENTATION_FLAG_XCDR1 | DATA_REPRESENTATION_FLAG_XCDR2;

const INSTRUCTIONS: [(&str, u32); 9] = [
    ("RTS", OP_RTS),
    ("ADR", OP_ADR),
    ("JSR", OP_JSR),
    ("JEQ", OP_JEQ),
    ("DLC", OP_DLC),
    ("PLC", OP_PLC),
    ("PLM", OP_PLM),
    ("KOF", OP_KOF),
    ("JEQ4", OP_JEQ4),
];

const FLAGS: [(&str, u32); 5] = [
    ("KEY", FLAG_KEY),
    ("OPT", FLAG_OPT),
    ("MU", FLAG_MU),
    ("SGN", FLAG_SGN),
    ("FP", FLAG_FP),
];

const TOPIC_FLAGS: [(&str, u32); 10] = [
    ("DDS_TOPIC_NO_OPTIMIZE", TOPIC_NO_OPTIMIZE),
    ("DDS_TOPIC_FIXED_KEY", TOPIC_FIXED_KEY),
    ("DDS_TOPIC_CONTAINS_UNION", TOPIC_CONTAINS_UNION),
    ("DDS_TOPIC_FIXED_SIZE", TOPIC_FIXED_SIZE),
    ("DDS_TOPIC_FIXED_KEY_XCDR2", TOPIC_FIXED_KEY_XCDR2),
    ("DDS_TOPIC_XTYPES_METADATA", TOPIC_XTYPES_METADATA),
    (
        "DDS_TOPIC_RESTRICT_DATA_REPRESENTATION",
        TOPIC_RESTRICT_DATA_REPRESENTATION,
    ),
    (
        "DDS_DATA_REPRESENTATION_FLAG_XCDR1",
        DATA_REPRESENTATION_FLAG_XCDR1,
    ),
    (
        "DDS_DATA_REPRESENTATION_FLAG_XCDR2",
        DATA_REPRESENTATION_FLAG_XCDR2,
    ),
    (
        "DDS_DATA_REPRESENTATION_RESTRICT_DEFAULT",
        DATA_REPRESENTATION_RESTRICT_DEFAULT,
    ),
];

/// Resolve a built-in symbolic name as emitted by idlc.
///
/// Recognised families: `DDS_OP_<insn>`, `DDS_OP_TYPE_<t>` (shifted 16),
/// `DDS_OP_SUBTYPE_<t>` (shifted 8), `DDS_OP_VAL_<t>` (unshifted),
/// `DDS_OP_FLAG_<f>`, `DDS_TOPIC_*` and `DDS_DATA_REPRESENTATION_FLAG_*`.
pub fn lookup_symbol(name: &str) -> Option<u32> {
    if let Some(rest) = name.strip_prefix("DDS_OP_") {
        if let Some(t) = rest.strip_prefix("TYPE_") {
            return type_by_mnemonic(t).map(|code| u32::from(code) << 16);
        }
        if let Some(t) = rest.strip_prefix("SUBTYPE_") {
            return type_by_mnemonic(t).map(|code| u32::from(code) << 8);
        }
        if let Some(t) = rest.strip_prefix("VAL_") {
            return type_by_mnemonic(t).map(u32::from);
        }
        if let Some(f) = rest.strip_prefix("FLAG_") {
            return FLAGS.iter().find(|(n, _)| *n == f).map(|(_, v)| *v);
        }
        return INSTRUCTIONS
            .iter()
            .find(|(n, _)| *n == rest)
            .map(|(_, v)| *v);
    }
    TOPIC_FLAGS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| *v)
}

fn type_by_mnemonic(mnemonic: &str) -> Option<u8> {
    TypeCode::ALL
        .iter()
        .find(|tc| tc.mnemonic() == mnemonic)
        .map(|tc| *tc as u8)
}
