// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-type dispatch for samples.
//!
//! A record type implements [`TopicType`] once (by hand or from generated
//! code). [`encode_sample`] then sizes the payload with [`CdrSizer`], writes
//! the envelope and body into a single window so DHEADER patches always land,
//! and [`decode_sample`] parses the envelope before handing the reader over.

use crate::config::ENCAPSULATION_HEADER_SIZE;
use crate::core::ser::{
    BufferSink, CdrReader, CdrSizer, CdrWriter, CodecOptions, EncapsulationKind, Encoding,
    Extensibility, GrowableSink, SerResult,
};
use crate::descriptor::TopicDescriptor;
use crate::Result;

/// A record type exchanged on a topic.
pub trait TopicType: Sized {
    /// Descriptor handed to the native library when registering the topic.
    fn descriptor() -> Result<TopicDescriptor>;

    fn extensibility() -> Extensibility {
        Extensibility::Appendable
    }

    /// Mirror of [`serialize`](Self::serialize) on a sizer.
    fn compute_size(&self, sizer: &mut CdrSizer);

    fn serialize<S: BufferSink>(&self, writer: &mut CdrWriter<S>) -> SerResult<()>;

    fn deserialize(reader: &mut CdrReader<'_>) -> SerResult<Self>;

    /// Body length when serialization starts at `offset`.
    fn serialized_size(&self, offset: usize, encoding: Encoding) -> usize {
        let mut sizer = CdrSizer::new(offset, encoding);
        self.compute_size(&mut sizer);
        sizer.delta(offset)
    }
}

/// Envelope plus body, default codec options.
pub fn encode_sample<T: TopicType>(sample: &T, encoding: Encoding) -> Result<Vec<u8>> {
    encode_sample_with(sample, encoding, CodecOptions::default())
}

pub fn encode_sample_with<T: TopicType>(
    sample: &T,
    encoding: Encoding,
    options: CodecOptions,
) -> Result<Vec<u8>> {
    let mut sizer = CdrSizer::with_options(ENCAPSULATION_HEADER_SIZE, encoding, options);
    sample.compute_size(&mut sizer);
    let total = sizer.position();

    let sink = GrowableSink::with_window_size(total);
    let mut writer = CdrWriter::with_options(sink, encoding, options);
    writer.write_envelope(EncapsulationKind::for_type(encoding, T::extensibility()))?;
    sample.serialize(&mut writer)?;
    let written = writer.position();
    let bytes = writer.finish().into_vec();

    if written != total {
        log::warn!(
            "[encode_sample] size mismatch: sized {} bytes, wrote {}",
            total,
            written
        );
    }
    Ok(bytes)
}

/// Parse the envelope, then the body with the sub-encoding it announces.
pub fn decode_sample<T: TopicType>(bytes: &[u8]) -> Result<T> {
    decode_sample_with(bytes, CodecOptions::default())
}

pub fn decode_sample_with<T: TopicType>(bytes: &[u8], options: CodecOptions) -> Result<T> {
    let mut reader = CdrReader::new(bytes, Encoding::Legacy).with_options(options);
    reader.read_envelope()?;
    Ok(T::deserialize(&mut reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ops::{OP_ADR, OP_RTS};

    #[derive(Debug, PartialEq)]
    struct Reading {
        sensor: u8,
        value: f64,
        label: String,
    }

    impl TopicType for Reading {
        fn descriptor() -> Result<TopicDescriptor> {
            TopicDescriptor::builder("Demo::Reading")
                .size(24)
                .align(8)
                .ops(vec![
                    OP_ADR | (0x01 << 16),
                    0,
                    OP_ADR | (0x04 << 16),
                    8,
                    OP_ADR | (0x05 << 16),
                    16,
                    OP_RTS,
                ])
                .build()
        }

        fn compute_size(&self, sizer: &mut CdrSizer) {
            let mark = sizer.begin_dheader(Self::extensibility());
            sizer.write_u8(self.sensor);
            sizer.write_f64(self.value);
            sizer.write_string(&self.label);
            sizer.end_dheader(mark);
        }

        fn serialize<S: BufferSink>(&self, writer: &mut CdrWriter<S>) -> SerResult<()> {
            let mark = writer.begin_dheader(Self::extensibility())?;
            writer.write_u8(self.sensor)?;
            writer.write_f64(self.value)?;
            writer.write_string(&self.label)?;
            writer.end_dheader(mark)?;
            Ok(())
        }

        fn deserialize(reader: &mut CdrReader<'_>) -> SerResult<Self> {
            let end = reader.read_dheader(Self::extensibility())?;
            let sample = Reading {
                sensor: reader.read_u8()?,
                value: reader.read_f64()?,
                label: reader.read_string()?.to_string(),
            };
            reader.skip_to_end(end);
            Ok(sample)
        }
    }

    fn sample() -> Reading {
        Reading {
            sensor: 7,
            value: -1.5,
            label: "boiler".into(),
        }
    }

    #[test]
    fn test_encode_decode_extended() {
        let bytes = encode_sample(&sample(), Encoding::Extended).expect("encode");
        assert_eq!(&bytes[..4], &[0x00, 0x09, 0x00, 0x00]);
        // DHEADER covers everything after itself.
        let dheader = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        assert_eq!(dheader as usize, bytes.len() - 8);
        let back: Reading = decode_sample(&bytes).expect("decode");
        assert_eq!(back, sample());
    }

    #[test]
    fn test_encode_decode_legacy() {
        let bytes = encode_sample(&sample(), Encoding::Legacy).expect("encode");
        assert_eq!(&bytes[..4], &[0x00, 0x01, 0x00, 0x00]);
        assert_eq!(
            bytes.len(),
            4 + sample().serialized_size(4, Encoding::Legacy)
        );
        let back: Reading = decode_sample(&bytes).expect("decode");
        assert_eq!(back, sample());
    }

    #[test]
    fn test_decode_truncated_fails() {
        let bytes = encode_sample(&sample(), Encoding::Extended).expect("encode");
        let res: Result<Reading> = decode_sample(&bytes[..bytes.len() - 3]);
        assert!(res.is_err());
    }

    #[test]
    fn test_descriptor_from_trait() {
        let d = Reading::descriptor().expect("descriptor");
        assert_eq!(d.type_name(), "Demo::Reading");
        assert_eq!(d.n_ops(), 7);
    }
}
