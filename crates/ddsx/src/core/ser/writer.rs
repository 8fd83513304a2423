// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CDR writer over a [`BufferSink`].

use super::align::padding_for;
use super::encoding::{CodecOptions, EncapsulationKind, Encoding, Extensibility};
use super::sink::{BufferSink, FixedSink, GrowableSink};
use super::{SerError, SerResult};
use crate::config::{DHEADER_SIZE, ENCAPSULATION_HEADER_SIZE};

/// Generate aligned little-endian write methods for primitive types.
///
/// Each generated method:
/// 1. Aligns to the (capped) natural width, zero-filling padding
/// 2. Converts the value via `to_le_bytes()`
/// 3. Copies the bytes into the active window
macro_rules! impl_write_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self, value: $type) -> SerResult<()> {
            self.align(self.options.align_for($size))?;
            self.put(&value.to_le_bytes())
        }
    };
}

/// Position of a DHEADER placeholder returned by [`CdrWriter::begin_dheader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DHeaderMark {
    header_pos: Option<usize>,
    body_start: usize,
}

impl DHeaderMark {
    pub(crate) fn inactive(body_start: usize) -> Self {
        Self {
            header_pos: None,
            body_start,
        }
    }

    pub(crate) fn active(header_pos: usize, body_start: usize) -> Self {
        Self {
            header_pos: Some(header_pos),
            body_start,
        }
    }

    /// `false` when no header was emitted (Legacy encoding or final type).
    pub fn is_active(&self) -> bool {
        self.header_pos.is_some()
    }

    pub fn header_position(&self) -> Option<usize> {
        self.header_pos
    }

    pub fn body_start(&self) -> usize {
        self.body_start
    }
}

/// CDR writer. Alignment is computed on absolute stream positions.
pub struct CdrWriter<S: BufferSink> {
    sink: S,
    encoding: Encoding,
    options: CodecOptions,
    base: usize,
    committed: usize,
    buffered: usize,
}

impl<'a> CdrWriter<FixedSink<'a>> {
    /// Writer over a caller buffer; overflowing it is a fatal error.
    pub fn fixed(buffer: &'a mut [u8], encoding: Encoding) -> Self {
        Self::new(FixedSink::new(buffer), encoding)
    }
}

impl CdrWriter<GrowableSink> {
    /// Writer over a heap buffer committed window by window.
    pub fn growable(encoding: Encoding) -> Self {
        Self::new(GrowableSink::new(), encoding)
    }
}

impl<S: BufferSink> CdrWriter<S> {
    pub fn new(sink: S, encoding: Encoding) -> Self {
        Self::with_options(sink, encoding, CodecOptions::default())
    }

    pub fn with_options(sink: S, encoding: Encoding, options: CodecOptions) -> Self {
        Self {
            sink,
            encoding,
            options,
            base: 0,
            committed: 0,
            buffered: 0,
        }
    }

    /// Treat the first byte written as stream position `base`.
    ///
    /// Used when an outer envelope was written elsewhere.
    pub fn starting_at(mut self, base: usize) -> Self {
        self.base = base;
        self
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    pub fn position(&self) -> usize {
        self.base + self.committed + self.buffered
    }

    /// First stream position that can still be patched.
    pub fn window_start(&self) -> usize {
        self.base + self.committed
    }

    fn ensure(&mut self, len: usize) -> SerResult<()> {
        if self.buffered + len <= self.sink.window_len() {
            return Ok(());
        }
        let position = self.position();
        self.sink
            .flush(self.buffered, len)
            .map_err(|err| match err {
                SerError::BufferOverflow {
                    needed, capacity, ..
                } => SerError::BufferOverflow {
                    offset: position,
                    needed,
                    capacity,
                },
                other => other,
            })?;
        self.committed += self.buffered;
        self.buffered = 0;
        Ok(())
    }

    fn put(&mut self, bytes: &[u8]) -> SerResult<()> {
        self.ensure(bytes.len())?;
        let start = self.buffered;
        self.sink.window_mut()[start..start + bytes.len()].copy_from_slice(bytes);
        self.buffered += bytes.len();
        Ok(())
    }

    fn put_zeros(&mut self, len: usize) -> SerResult<()> {
        if len == 0 {
            return Ok(());
        }
        self.ensure(len)?;
        let start = self.buffered;
        self.sink.window_mut()[start..start + len].fill(0);
        self.buffered += len;
        Ok(())
    }

    /// Zero-fill up to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) -> SerResult<()> {
        let padding = padding_for(self.position(), alignment);
        self.put_zeros(padding)
    }

    pub fn write_u8(&mut self, value: u8) -> SerResult<()> {
        self.put(&[value])
    }

    pub fn write_i8(&mut self, value: i8) -> SerResult<()> {
        self.put(&value.to_le_bytes())
    }

    pub fn write_bool(&mut self, value: bool) -> SerResult<()> {
        self.put(&[u8::from(value)])
    }

    impl_write_le!(write_u16, u16, 2);
    impl_write_le!(write_i16, i16, 2);
    impl_write_le!(write_u32, u32, 4);
    impl_write_le!(write_i32, i32, 4);
    impl_write_le!(write_u64, u64, 8);
    impl_write_le!(write_i64, i64, 8);

    pub fn write_f32(&mut self, value: f32) -> SerResult<()> {
        self.write_u32(value.to_bits())
    }

    pub fn write_f64(&mut self, value: f64) -> SerResult<()> {
        self.write_u64(value.to_bits())
    }

    /// Raw bytes, no alignment.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> SerResult<()> {
        self.put(bytes)
    }

    /// Exactly `fixed_size` bytes: `bytes` truncated or zero-padded.
    pub fn write_fixed_bytes(&mut self, bytes: &[u8], fixed_size: usize) -> SerResult<()> {
        let copied = bytes.len().min(fixed_size);
        self.put(&bytes[..copied])?;
        self.put_zeros(fixed_size - copied)
    }

    /// Embedded `char[N]` string.
    pub fn write_fixed_string(&mut self, value: &str, fixed_size: usize) -> SerResult<()> {
        self.write_fixed_bytes(value.as_bytes(), fixed_size)
    }

    /// Length-prefixed UTF-8 string, NUL-terminated per [`CodecOptions::string_terminator`].
    pub fn write_string(&mut self, value: &str) -> SerResult<()> {
        let bytes = value.as_bytes();
        let nul = self.options.string_terminator.includes_nul(self.encoding);
        let len = bytes.len() + usize::from(nul);
        let len = u32::try_from(len).map_err(|_| SerError::InvalidData {
            offset: self.position(),
            reason: "string length exceeds u32".into(),
        })?;
        self.align(4)?;
        self.put(&len.to_le_bytes())?;
        self.put(bytes)?;
        if nul {
            self.put(&[0])?;
        }
        Ok(())
    }

    /// Sequence element count prefix.
    pub fn write_seq_len(&mut self, len: usize) -> SerResult<()> {
        let len = u32::try_from(len).map_err(|_| SerError::InvalidData {
            offset: self.position(),
            reason: "sequence length exceeds u32".into(),
        })?;
        self.write_u32(len)
    }

    /// 4-byte envelope `[0x00, kind, 0x00, 0x00]`.
    pub fn write_envelope(&mut self, kind: EncapsulationKind) -> SerResult<()> {
        let mut header = [0u8; ENCAPSULATION_HEADER_SIZE];
        header[1] = kind.as_u8();
        self.put(&header)
    }

    /// Overwrite a `u32` that is still inside the active window.
    pub fn patch_u32(&mut self, position: usize, value: u32) -> SerResult<()> {
        let window_start = self.window_start();
        if position < window_start || position + 4 > self.position() {
            return Err(SerError::UnsupportedPatch {
                position,
                window_start,
            });
        }
        let offset = position - window_start;
        self.sink.window_mut()[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Reserve a DHEADER placeholder when `extensibility` requires one.
    pub fn begin_dheader(&mut self, extensibility: Extensibility) -> SerResult<DHeaderMark> {
        if !extensibility.uses_dheader(self.encoding) {
            return Ok(DHeaderMark::inactive(self.position()));
        }
        self.align(4)?;
        let header_pos = self.position();
        self.put(&[0u8; DHEADER_SIZE])?;
        Ok(DHeaderMark::active(header_pos, self.position()))
    }

    /// Patch the placeholder with the body length. Returns the body length.
    pub fn end_dheader(&mut self, mark: DHeaderMark) -> SerResult<u32> {
        let body_len = self.position() - mark.body_start;
        let body_len = u32::try_from(body_len).map_err(|_| SerError::InvalidData {
            offset: mark.body_start,
            reason: "DHEADER body exceeds u32".into(),
        })?;
        if let Some(header_pos) = mark.header_pos {
            self.patch_u32(header_pos, body_len)?;
        }
        Ok(body_len)
    }

    /// Commit the last window and hand back the sink.
    pub fn finish(mut self) -> S {
        self.sink.complete(self.buffered);
        self.sink
    }
}
