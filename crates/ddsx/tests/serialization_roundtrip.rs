// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Sizer/writer/reader agreement on randomized member sequences, plus the
// growable-window and DHEADER framing behaviour.

#![allow(clippy::float_cmp)]

use ddsx::core::ser::{
    align, CdrReader, CdrSizer, CdrWriter, CodecOptions, Encoding, Extensibility, FixedSink,
    GrowableSink, SerError, StringTerminator,
};

#[derive(Debug, Clone, PartialEq)]
enum Member {
    U8(u8),
    Bool(bool),
    I16(i16),
    U32(u32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Fixed(Vec<u8>, usize),
}

fn random_member(rng: &mut fastrand::Rng) -> Member {
    match rng.u8(0..9) {
        0 => Member::U8(rng.u8(..)),
        1 => Member::Bool(rng.bool()),
        2 => Member::I16(rng.i16(..)),
        3 => Member::U32(rng.u32(..)),
        4 => Member::I64(rng.i64(..)),
        5 => Member::F32(rng.f32()),
        6 => Member::F64(rng.f64()),
        7 => {
            let len = rng.usize(0..40);
            Member::Str((0..len).map(|_| rng.alphanumeric()).collect())
        }
        _ => {
            let len = rng.usize(0..12);
            let fixed = rng.usize(1..16);
            Member::Fixed((0..len).map(|_| rng.u8(1..)).collect(), fixed)
        }
    }
}

fn size_member(s: &mut CdrSizer, m: &Member) {
    match m {
        Member::U8(v) => s.write_u8(*v),
        Member::Bool(v) => s.write_bool(*v),
        Member::I16(v) => s.write_i16(*v),
        Member::U32(v) => s.write_u32(*v),
        Member::I64(v) => s.write_i64(*v),
        Member::F32(v) => s.write_f32(*v),
        Member::F64(v) => s.write_f64(*v),
        Member::Str(v) => s.write_string(v),
        Member::Fixed(v, n) => s.write_fixed_bytes(v, *n),
    }
}

fn write_member<S: ddsx::core::ser::BufferSink>(w: &mut CdrWriter<S>, m: &Member) {
    match m {
        Member::U8(v) => w.write_u8(*v),
        Member::Bool(v) => w.write_bool(*v),
        Member::I16(v) => w.write_i16(*v),
        Member::U32(v) => w.write_u32(*v),
        Member::I64(v) => w.write_i64(*v),
        Member::F32(v) => w.write_f32(*v),
        Member::F64(v) => w.write_f64(*v),
        Member::Str(v) => w.write_string(v),
        Member::Fixed(v, n) => w.write_fixed_bytes(v, *n),
    }
    .expect("write member");
}

fn read_member(r: &mut CdrReader<'_>, like: &Member) -> Member {
    match like {
        Member::U8(_) => Member::U8(r.read_u8().expect("u8")),
        Member::Bool(_) => Member::Bool(r.read_bool().expect("bool")),
        Member::I16(_) => Member::I16(r.read_i16().expect("i16")),
        Member::U32(_) => Member::U32(r.read_u32().expect("u32")),
        Member::I64(_) => Member::I64(r.read_i64().expect("i64")),
        Member::F32(_) => Member::F32(r.read_f32().expect("f32")),
        Member::F64(_) => Member::F64(r.read_f64().expect("f64")),
        Member::Str(_) => Member::Str(r.read_string().expect("string").to_string()),
        Member::Fixed(v, n) => {
            let raw = r.read_fixed_bytes(*n).expect("fixed");
            let kept = v.len().min(*n);
            assert!(raw[kept..].iter().all(|&b| b == 0));
            Member::Fixed(raw[..kept].to_vec(), *n)
        }
    }
}

fn expected_after_read(m: &Member) -> Member {
    match m {
        Member::Fixed(v, n) => Member::Fixed(v[..v.len().min(*n)].to_vec(), *n),
        other => other.clone(),
    }
}

#[test]
fn sizer_matches_writer_and_reader_roundtrips() {
    let mut rng = fastrand::Rng::with_seed(0x5eed_cd2);
    for case in 0..300 {
        let encoding = if case % 2 == 0 {
            Encoding::Extended
        } else {
            Encoding::Legacy
        };
        let options = CodecOptions {
            max_align: if case % 3 == 0 { 8 } else { 4 },
            string_terminator: if case % 5 == 0 {
                StringTerminator::LegacyOnly
            } else {
                StringTerminator::Always
            },
        };
        let start = rng.usize(0..8);
        let members: Vec<Member> = (0..rng.usize(1..24))
            .map(|_| random_member(&mut rng))
            .collect();

        let mut sizer = CdrSizer::with_options(start, encoding, options);
        let mark = sizer.begin_dheader(Extensibility::Appendable);
        for m in &members {
            size_member(&mut sizer, m);
        }
        let sized_body = sizer.end_dheader(mark);

        let window = rng.usize(1..64);
        let mut writer =
            CdrWriter::with_options(GrowableSink::with_window_size(window), encoding, options)
                .starting_at(start);
        let mark = writer
            .begin_dheader(Extensibility::Appendable)
            .expect("begin");
        for m in &members {
            write_member(&mut writer, m);
        }
        // A small window may already have flushed the header.
        let patched = writer.end_dheader(mark);
        let end = writer.position();
        let bytes = writer.finish().into_vec();

        assert_eq!(sizer.delta(start), bytes.len(), "case {}", case);
        assert_eq!(end, start + bytes.len());
        if let Ok(body) = patched {
            assert_eq!(body as usize, sized_body);
        }

        // Reader positions are relative to `data`, so prepend `start` bytes.
        if patched.is_ok() {
            let mut framed = vec![0u8; start];
            framed.extend_from_slice(&bytes);
            let mut reader = CdrReader::new(&framed, encoding).with_options(options);
            reader.seek(start);
            let end = reader
                .read_dheader(Extensibility::Appendable)
                .expect("dheader");
            for m in &members {
                assert_eq!(read_member(&mut reader, m), expected_after_read(m));
            }
            if end.is_some() {
                assert!(!reader.has_more(end));
            }
            assert!(reader.is_eof());
        }
    }
}

#[test]
fn hello_roundtrip() {
    let mut sizer = CdrSizer::new(0, Encoding::Extended);
    sizer.write_string("Hello");
    assert_eq!(sizer.delta(0), 10);

    let mut buf = [0u8; 16];
    let mut w = CdrWriter::fixed(&mut buf, Encoding::Extended);
    w.write_string("Hello").expect("string");
    let sink = w.finish();
    let bytes = sink.written();
    assert_eq!(bytes.len(), 10);
    assert_eq!(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 6);

    let mut r = CdrReader::new(bytes, Encoding::Extended);
    assert_eq!(r.read_string_bytes().expect("span"), b"Hello");
}

#[test]
fn appendable_framing_with_envelope() {
    let mut w = CdrWriter::growable(Encoding::Extended);
    w.write_envelope(ddsx::EncapsulationKind::DCdr2Le)
        .expect("envelope");
    let mark = w.begin_dheader(Extensibility::Appendable).expect("begin");
    w.write_i32(7).expect("i32");
    w.write_string("x").expect("string");
    let body = w.end_dheader(mark).expect("end");
    let bytes = w.finish().into_vec();
    assert_eq!(body, 10);
    assert_eq!(bytes.len(), 4 + 4 + 10);

    // Auto-detection lands after the envelope; a newer writer appended a
    // member the reader does not know about.
    let mut extended = bytes.clone();
    extended.extend_from_slice(&[0xEE; 4]);
    let new_len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) + 4;
    extended[4..8].copy_from_slice(&new_len.to_le_bytes());

    let mut r = CdrReader::detect(&extended);
    assert_eq!(r.encoding(), Encoding::Extended);
    let end = r.read_dheader(Extensibility::Appendable).expect("dheader");
    assert_eq!(r.read_i32().expect("i32"), 7);
    assert_eq!(r.read_string().expect("string"), "x");
    assert!(r.has_more(end));
    r.skip_to_end(end);
    assert!(r.is_eof());
}

#[test]
fn growable_patch_after_flush_fails() {
    let mut w = CdrWriter::new(GrowableSink::with_window_size(8), Encoding::Extended);
    let mark = w.begin_dheader(Extensibility::Mutable).expect("begin");
    for i in 0..4u32 {
        w.write_u32(i).expect("u32");
    }
    match w.end_dheader(mark) {
        Err(SerError::UnsupportedPatch {
            position,
            window_start,
        }) => {
            assert_eq!(position, 0);
            assert!(window_start > 0);
        }
        other => panic!("expected UnsupportedPatch, got {:?}", other),
    }
}

#[test]
fn growable_window_sized_by_sizer_never_flushes() {
    let mut sizer = CdrSizer::new(0, Encoding::Extended);
    let mark = sizer.begin_dheader(Extensibility::Appendable);
    for i in 0..50 {
        sizer.write_string(&format!("item-{}", i));
    }
    sizer.end_dheader(mark);

    let mut w = CdrWriter::new(
        GrowableSink::with_window_size(sizer.position()),
        Encoding::Extended,
    );
    let mark = w.begin_dheader(Extensibility::Appendable).expect("begin");
    for i in 0..50 {
        w.write_string(&format!("item-{}", i)).expect("string");
    }
    w.end_dheader(mark).expect("patch lands in the only window");
    let sink = w.finish();
    assert_eq!(sink.flushes(), 0);
    assert_eq!(sink.into_vec().len(), sizer.position());
}

#[test]
fn fixed_buffer_overflow() {
    let mut buf = [0u8; 10];
    let mut w = CdrWriter::new(FixedSink::new(&mut buf), Encoding::Extended);
    match w.write_string("Hello, world") {
        Err(SerError::BufferOverflow { capacity, .. }) => assert_eq!(capacity, 10),
        other => panic!("expected BufferOverflow, got {:?}", other),
    }
}

#[test]
fn alignment_is_absolute() {
    for base in 0..16usize {
        let mut w = CdrWriter::growable(Encoding::Legacy).starting_at(base);
        w.write_u8(1).expect("u8");
        w.write_u32(2).expect("u32");
        assert_eq!(w.position(), align(base + 1, 4) + 4);
    }
}
