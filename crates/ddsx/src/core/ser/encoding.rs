// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sub-encodings, encapsulation kinds and codec options.

use std::fmt;

use crate::config::{
    KIND_CDR2_LE, KIND_CDR_LE, KIND_D_CDR2_LE, KIND_PL_CDR2_LE, KIND_PL_CDR_LE,
};

/// First encapsulation kind byte that selects the Extended (XCDR2) sub-encoding.
pub const EXTENDED_KIND_THRESHOLD: u8 = 6;

/// CDR sub-encoding, chosen once per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "config-loaders", serde(rename_all = "lowercase"))]
pub enum Encoding {
    /// XCDR1: no DHEADER framing.
    Legacy,
    /// XCDR2: DHEADER before appendable and mutable bodies.
    #[default]
    Extended,
}

impl Encoding {
    /// Classify an encapsulation kind byte (second byte of the envelope header).
    pub const fn from_kind_byte(kind: u8) -> Self {
        if kind >= EXTENDED_KIND_THRESHOLD {
            Encoding::Extended
        } else {
            Encoding::Legacy
        }
    }

    pub const fn is_extended(self) -> bool {
        matches!(self, Encoding::Extended)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Legacy => f.write_str("XCDR1"),
            Encoding::Extended => f.write_str("XCDR2"),
        }
    }
}

/// Type extensibility as declared on the record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Extensibility {
    Final,
    #[default]
    Appendable,
    Mutable,
}

impl Extensibility {
    /// Whether bodies of this kind carry a DHEADER under `encoding`.
    pub const fn uses_dheader(self, encoding: Encoding) -> bool {
        encoding.is_extended() && !matches!(self, Extensibility::Final)
    }
}

/// Encapsulation identifiers (DDS-XTypes v1.3 Sec.7.6.3.1.2), second header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EncapsulationKind {
    CdrBe = 0x00,
    CdrLe = KIND_CDR_LE,
    PlCdrBe = 0x02,
    PlCdrLe = KIND_PL_CDR_LE,
    Cdr2Be = 0x06,
    Cdr2Le = KIND_CDR2_LE,
    DCdr2Be = 0x08,
    DCdr2Le = KIND_D_CDR2_LE,
    PlCdr2Be = 0x0A,
    PlCdr2Le = KIND_PL_CDR2_LE,
}

impl EncapsulationKind {
    /// Little-endian kind used when writing a type of `extensibility` under `encoding`.
    pub const fn for_type(encoding: Encoding, extensibility: Extensibility) -> Self {
        match (encoding, extensibility) {
            (Encoding::Legacy, Extensibility::Mutable) => EncapsulationKind::PlCdrLe,
            (Encoding::Legacy, _) => EncapsulationKind::CdrLe,
            (Encoding::Extended, Extensibility::Final) => EncapsulationKind::Cdr2Le,
            (Encoding::Extended, Extensibility::Appendable) => EncapsulationKind::DCdr2Le,
            (Encoding::Extended, Extensibility::Mutable) => EncapsulationKind::PlCdr2Le,
        }
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(EncapsulationKind::CdrBe),
            0x01 => Some(EncapsulationKind::CdrLe),
            0x02 => Some(EncapsulationKind::PlCdrBe),
            0x03 => Some(EncapsulationKind::PlCdrLe),
            0x06 => Some(EncapsulationKind::Cdr2Be),
            0x07 => Some(EncapsulationKind::Cdr2Le),
            0x08 => Some(EncapsulationKind::DCdr2Be),
            0x09 => Some(EncapsulationKind::DCdr2Le),
            0x0A => Some(EncapsulationKind::PlCdr2Be),
            0x0B => Some(EncapsulationKind::PlCdr2Le),
            _ => None,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn encoding(self) -> Encoding {
        Encoding::from_kind_byte(self as u8)
    }

    /// Odd kinds are little-endian.
    pub const fn is_little_endian(self) -> bool {
        (self as u8) & 0x01 != 0
    }
}

/// String terminator policy.
///
/// The reference native parser expects the NUL-inclusive form for both
/// sub-encodings, which is why `Always` is the default. `LegacyOnly` drops the
/// terminator from Extended strings, the plain XCDR2 form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "config-loaders", serde(rename_all = "kebab-case"))]
pub enum StringTerminator {
    #[default]
    Always,
    LegacyOnly,
}

impl StringTerminator {
    pub const fn includes_nul(self, encoding: Encoding) -> bool {
        match self {
            StringTerminator::Always => true,
            StringTerminator::LegacyOnly => !encoding.is_extended(),
        }
    }
}

/// Options shared by sizer, writer and reader. Both sides of a stream must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Upper bound applied to primitive alignment. The reference encoder caps at 4.
    pub max_align: usize,
    pub string_terminator: StringTerminator,
}

impl CodecOptions {
    pub const fn new() -> Self {
        Self {
            max_align: 4,
            string_terminator: StringTerminator::Always,
        }
    }

    /// Alignment actually used for a primitive of `width` bytes.
    #[inline]
    pub const fn align_for(&self, width: usize) -> usize {
        if width < self.max_align {
            width
        } else {
            self.max_align
        }
    }
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self::new()
    }
}
