// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CDR reader. Alignment is relative to the start of `data`.

use super::align::align;
use super::encoding::{CodecOptions, EncapsulationKind, Encoding, Extensibility};
use super::{SerError, SerResult};
use crate::config::{DHEADER_SIZE, ENCAPSULATION_HEADER_SIZE};

/// Generate aligned little-endian read methods for primitive types.
///
/// Each generated method:
/// 1. Aligns to the (capped) natural width
/// 2. Checks bounds (returns `SerError::OutOfRange` if short)
/// 3. Converts via `from_le_bytes()` and advances
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> SerResult<$type> {
            self.align(self.options.align_for($size));
            let raw = self.take($size)?;
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(raw);
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Read-only cursor over CDR bytes.
#[derive(Debug, Clone)]
pub struct CdrReader<'a> {
    data: &'a [u8],
    position: usize,
    encoding: Encoding,
    options: CodecOptions,
}

impl<'a> CdrReader<'a> {
    /// Reader with an explicit sub-encoding, cursor at 0.
    pub fn new(data: &'a [u8], encoding: Encoding) -> Self {
        Self {
            data,
            position: 0,
            encoding,
            options: CodecOptions::default(),
        }
    }

    /// Auto-detect from the envelope: kind byte ≥ 6 means Extended with the
    /// cursor past the 4-byte header, otherwise Legacy from position 0.
    pub fn detect(data: &'a [u8]) -> Self {
        match data.get(1) {
            Some(&kind) if Encoding::from_kind_byte(kind).is_extended() => Self {
                position: ENCAPSULATION_HEADER_SIZE,
                ..Self::new(data, Encoding::Extended)
            },
            _ => Self::new(data, Encoding::Legacy),
        }
    }

    pub fn with_options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    pub fn is_eof(&self) -> bool {
        self.remaining() == 0
    }

    /// Move the cursor to an absolute position. May point past the end; the
    /// next read then fails with `OutOfRange`.
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    /// Skip padding up to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) {
        self.position = align(self.position, alignment);
    }

    fn take(&mut self, len: usize) -> SerResult<&'a [u8]> {
        let data = self.data;
        match self.position.checked_add(len) {
            Some(end) if end <= data.len() => {
                let slice = &data[self.position..end];
                self.position = end;
                Ok(slice)
            }
            _ => Err(SerError::OutOfRange {
                offset: self.position,
                needed: len,
                available: self.remaining(),
            }),
        }
    }

    pub fn read_u8(&mut self) -> SerResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> SerResult<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    /// Any non-zero byte reads as `true`.
    pub fn read_bool(&mut self) -> SerResult<bool> {
        Ok(self.take(1)?[0] != 0)
    }

    impl_read_le!(read_u16, u16, 2);
    impl_read_le!(read_i16, i16, 2);
    impl_read_le!(read_u32, u32, 4);
    impl_read_le!(read_i32, i32, 4);
    impl_read_le!(read_u64, u64, 8);
    impl_read_le!(read_i64, i64, 8);

    pub fn read_f32(&mut self) -> SerResult<f32> {
        self.read_u32().map(f32::from_bits)
    }

    pub fn read_f64(&mut self) -> SerResult<f64> {
        self.read_u64().map(f64::from_bits)
    }

    /// Raw bytes, no alignment.
    pub fn read_bytes(&mut self, len: usize) -> SerResult<&'a [u8]> {
        self.take(len)
    }

    /// `fixed_size` bytes as written by `write_fixed_bytes`.
    pub fn read_fixed_bytes(&mut self, fixed_size: usize) -> SerResult<&'a [u8]> {
        self.take(fixed_size)
    }

    /// Embedded `char[N]` string; content stops at the first NUL.
    pub fn read_fixed_string(&mut self, fixed_size: usize) -> SerResult<&'a str> {
        let offset = self.position;
        let raw = self.take(fixed_size)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        utf8(&raw[..end], offset)
    }

    /// String payload without the length prefix and without the terminator.
    pub fn read_string_bytes(&mut self) -> SerResult<&'a [u8]> {
        self.align(4);
        let len = self.read_u32()? as usize;
        let raw = self.take(len)?;
        let nul = self.options.string_terminator.includes_nul(self.encoding);
        if nul && !raw.is_empty() {
            Ok(&raw[..raw.len() - 1])
        } else {
            Ok(raw)
        }
    }

    /// UTF-8 validated string.
    pub fn read_string(&mut self) -> SerResult<&'a str> {
        let offset = self.position;
        let raw = self.read_string_bytes()?;
        utf8(raw, offset)
    }

    /// Sequence element count prefix.
    pub fn read_seq_len(&mut self) -> SerResult<usize> {
        let len = self.read_u32()? as usize;
        // Every element takes at least one byte.
        if len > self.remaining() {
            return Err(SerError::OutOfRange {
                offset: self.position,
                needed: len,
                available: self.remaining(),
            });
        }
        Ok(len)
    }

    /// Read a DHEADER when `extensibility` carries one under the current
    /// encoding. Returns the end position of the body.
    pub fn read_dheader(&mut self, extensibility: Extensibility) -> SerResult<Option<usize>> {
        if !extensibility.uses_dheader(self.encoding) {
            return Ok(None);
        }
        self.align(4);
        let header_at = self.position;
        let len = self.read_u32()? as usize;
        let end = self.position + len;
        if end > self.data.len() {
            return Err(SerError::OutOfRange {
                offset: header_at + DHEADER_SIZE,
                needed: len,
                available: self.remaining(),
            });
        }
        Ok(Some(end))
    }

    /// Whether members remain before `end` (always true without a DHEADER).
    pub fn has_more(&self, end: Option<usize>) -> bool {
        match end {
            Some(end) => self.position < end,
            None => true,
        }
    }

    /// Skip unknown trailing members of a DHEADER-framed body.
    pub fn skip_to_end(&mut self, end: Option<usize>) {
        if let Some(end) = end {
            if end > self.position {
                log::trace!(
                    "[CdrReader] skipping {} trailing bytes at {}",
                    end - self.position,
                    self.position
                );
                self.position = end;
            }
        }
    }

    /// Parse a 4-byte envelope at the cursor and switch to its sub-encoding.
    pub fn read_envelope(&mut self) -> SerResult<EncapsulationKind> {
        let offset = self.position;
        let header = self.take(ENCAPSULATION_HEADER_SIZE)?;
        let kind = EncapsulationKind::from_u8(header[1]).ok_or_else(|| SerError::InvalidData {
            offset: offset + 1,
            reason: format!("unknown encapsulation kind 0x{:02x}", header[1]),
        })?;
        if !kind.is_little_endian() {
            return Err(SerError::InvalidData {
                offset: offset + 1,
                reason: format!("big-endian encapsulation {:?} not supported", kind),
            });
        }
        self.encoding = kind.encoding();
        Ok(kind)
    }
}

fn utf8(raw: &[u8], offset: usize) -> SerResult<&str> {
    std::str::from_utf8(raw).map_err(|e| SerError::InvalidData {
        offset,
        reason: format!("string is not valid UTF-8: {}", e),
    })
}
