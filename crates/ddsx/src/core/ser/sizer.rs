// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dry-run mirror of [`CdrWriter`](super::CdrWriter).

use super::align::align;
use super::encoding::{CodecOptions, Encoding, Extensibility};
use super::writer::DHeaderMark;
use crate::config::{DHEADER_SIZE, ENCAPSULATION_HEADER_SIZE};

macro_rules! impl_size_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self, _value: $type) {
            self.align(self.options.align_for($size));
            self.position += $size;
        }
    };
}

/// Cursor-only twin of the writer.
#[derive(Debug, Clone)]
pub struct CdrSizer {
    position: usize,
    encoding: Encoding,
    options: CodecOptions,
}

impl CdrSizer {
    /// `initial_offset` counts bytes already consumed, typically the envelope.
    pub fn new(initial_offset: usize, encoding: Encoding) -> Self {
        Self::with_options(initial_offset, encoding, CodecOptions::default())
    }

    pub fn with_options(initial_offset: usize, encoding: Encoding, options: CodecOptions) -> Self {
        Self {
            position: initial_offset,
            encoding,
            options,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes accounted since `start`.
    pub fn delta(&self, start: usize) -> usize {
        self.position.saturating_sub(start)
    }

    pub fn align(&mut self, alignment: usize) {
        self.position = align(self.position, alignment);
    }

    /// Advance without alignment.
    pub fn skip(&mut self, len: usize) {
        self.position += len;
    }

    pub fn write_u8(&mut self, _value: u8) {
        self.position += 1;
    }

    pub fn write_i8(&mut self, _value: i8) {
        self.position += 1;
    }

    pub fn write_bool(&mut self, _value: bool) {
        self.position += 1;
    }

    impl_size_le!(write_u16, u16, 2);
    impl_size_le!(write_i16, i16, 2);
    impl_size_le!(write_u32, u32, 4);
    impl_size_le!(write_i32, i32, 4);
    impl_size_le!(write_u64, u64, 8);
    impl_size_le!(write_i64, i64, 8);
    impl_size_le!(write_f32, f32, 4);
    impl_size_le!(write_f64, f64, 8);

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.position += bytes.len();
    }

    pub fn write_fixed_bytes(&mut self, _bytes: &[u8], fixed_size: usize) {
        self.position += fixed_size;
    }

    pub fn write_fixed_string(&mut self, _value: &str, fixed_size: usize) {
        self.position += fixed_size;
    }

    pub fn write_string(&mut self, value: &str) {
        let nul = self.options.string_terminator.includes_nul(self.encoding);
        self.align(4);
        self.position += 4 + value.len() + usize::from(nul);
    }

    pub fn write_seq_len(&mut self, _len: usize) {
        self.write_u32(0);
    }

    pub fn write_envelope(&mut self) {
        self.position += ENCAPSULATION_HEADER_SIZE;
    }

    pub fn begin_dheader(&mut self, extensibility: Extensibility) -> DHeaderMark {
        if !extensibility.uses_dheader(self.encoding) {
            return DHeaderMark::inactive(self.position);
        }
        self.align(4);
        let header_pos = self.position;
        self.position += DHEADER_SIZE;
        DHeaderMark::active(header_pos, self.position)
    }

    /// Body length the writer would patch into the header.
    pub fn end_dheader(&mut self, mark: DHeaderMark) -> usize {
        self.position - mark.body_start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizer_primitives_follow_writer_alignment() {
        let mut s = CdrSizer::new(0, Encoding::Legacy);
        s.write_u8(1);
        s.write_u16(2);
        s.write_u32(3);
        s.write_bool(true);
        s.write_i32(4);
        assert_eq!(s.position(), 16);
        s.write_f64(1.0);
        assert_eq!(s.position(), 24);
    }

    #[test]
    fn test_sizer_string() {
        let mut s = CdrSizer::new(0, Encoding::Extended);
        s.write_string("Hello");
        assert_eq!(s.delta(0), 10);
        s.write_string("");
        assert_eq!(s.position(), 12 + 5);
    }

    #[test]
    fn test_sizer_initial_offset_affects_padding() {
        let mut s = CdrSizer::new(4, Encoding::Extended);
        s.write_u8(1);
        s.write_u32(1);
        assert_eq!(s.position(), 12);
        assert_eq!(s.delta(4), 8);
    }

    #[test]
    fn test_sizer_dheader() {
        let mut s = CdrSizer::new(0, Encoding::Extended);
        let mark = s.begin_dheader(Extensibility::Appendable);
        s.write_i32(1);
        assert_eq!(s.end_dheader(mark), 4);
        assert_eq!(s.position(), 8);

        let mut s = CdrSizer::new(0, Encoding::Legacy);
        let mark = s.begin_dheader(Extensibility::Appendable);
        s.write_i32(1);
        assert_eq!(s.end_dheader(mark), 4);
        assert_eq!(s.position(), 4);
    }
}
