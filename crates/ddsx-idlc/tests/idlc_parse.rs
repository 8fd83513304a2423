// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// idlc output parsing: offsets, key fix-up, keys, header fields, blobs and
// type selection, read from a file the way a build script would.

use std::io::Write;

use ddsx::descriptor::ops::{
    DATA_REPRESENTATION_RESTRICT_DEFAULT, FLAG_FP, FLAG_KEY, FLAG_MU, OP_ADR, OP_KOF, OP_RTS,
    TOPIC_RESTRICT_DATA_REPRESENTATION, TOPIC_XTYPES_METADATA,
};
use ddsx::TopicDescriptor;
use ddsx_idlc::{
    parse_all, parse_file, parse_keys, parse_ops, parse_str, IdlcError, ParseOptions,
    StructLayout,
};

const T_1BY: u32 = 0x01 << 16;
const T_2BY: u32 = 0x02 << 16;
const T_4BY: u32 = 0x03 << 16;
const T_8BY: u32 = 0x04 << 16;
const T_STR: u32 = 0x05 << 16;
const T_EXT: u32 = 0x0D << 16;
const T_BLN: u32 = 0x0E << 16;

const GENERATED: &str = r#"/****************************************************************

  Generated by Eclipse Cyclone DDS IDL to C Translator
  File name: sensor.c
  Source: sensor.idl

*****************************************************************/
#include "dds/ddsi/ddsi_serdata.h"
#include "sensor.h"

static const uint32_t Demo_Sensor_ops [] =
{
  /* Sensor */
  DDS_OP_ADR | DDS_OP_TYPE_4BY | DDS_OP_FLAG_SGN | DDS_OP_FLAG_KEY | DDS_OP_FLAG_MU, offsetof (Demo_Sensor, id),
  DDS_OP_ADR | DDS_OP_TYPE_STR | DDS_OP_FLAG_KEY | DDS_OP_FLAG_MU, offsetof (Demo_Sensor, region),
  DDS_OP_ADR | DDS_OP_TYPE_8BY | DDS_OP_FLAG_FP, offsetof (Demo_Sensor, value),
  DDS_OP_ADR | DDS_OP_TYPE_1BY, offsetof (Demo_Sensor, flags),
  DDS_OP_RTS,

  /* key: id */
  DDS_OP_KOF | 1, 0u /* order: 0 */,

  /* key: region */
  DDS_OP_KOF | 1, 2u /* order: 1 */
};

static const dds_key_descriptor_t Demo_Sensor_keys[2] =
{
  { "id", 9, 0 },
  { "region", 11, 1 }
};

/* Type Information:
  [MINIMAL 4b8e...] (#deps: 0)
*/
#define TYPE_INFO_CDR_Demo_Sensor (const unsigned char []){ \
  0x60, 0x00, 0x00, 0x00, 0x01, 0x10, 0x00, 0x40, 0x28, 0x00, 0x00, 0x00, 0x24, 0x00, 0x00, 0x00, \
  0x14, 0x00, 0x00, 0x00, 0xf1, 0x2a, 0x9c, 0x11\
}
#define TYPE_INFO_CDR_SZ_Demo_Sensor 24u
#define TYPE_MAP_CDR_Demo_Sensor (const unsigned char []){ \
  0x4b, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00\
}
#define TYPE_MAP_CDR_SZ_Demo_Sensor 8u
const dds_topic_descriptor_t Demo_Sensor_desc =
{
  .m_size = sizeof (Demo_Sensor),
  .m_align = dds_alignof (Demo_Sensor),
  .m_flagset = DDS_TOPIC_XTYPES_METADATA | DDS_TOPIC_RESTRICT_DATA_REPRESENTATION,
  .m_nkeys = 2u,
  .m_typename = "Demo::Sensor",
  .m_keys = Demo_Sensor_keys,
  .m_nops = 6,
  .m_ops = Demo_Sensor_ops,
  .m_meta = "",
  .type_information = { .data = TYPE_INFO_CDR_Demo_Sensor, .sz = TYPE_INFO_CDR_SZ_Demo_Sensor },
  .type_mapping = { .data = TYPE_MAP_CDR_Demo_Sensor, .sz = TYPE_MAP_CDR_SZ_Demo_Sensor },
  .restrict_data_representation = DDS_DATA_REPRESENTATION_RESTRICT_DEFAULT
};

static const uint32_t Demo_Envelope_ops [] =
{
  /* Envelope */
  DDS_OP_ADR | DDS_OP_TYPE_2BY, offsetof (Demo_Envelope, seq),
  DDS_OP_ADR | DDS_OP_TYPE_EXT, offsetof (Demo_Envelope, origin), (3u << 16) + 6u /* Point */,
  DDS_OP_ADR | DDS_OP_TYPE_BLN, offsetof (Demo_Envelope, valid),
  DDS_OP_RTS,

  /* Point */
  DDS_OP_ADR | DDS_OP_TYPE_8BY | DDS_OP_FLAG_FP, offsetof (Demo_Point, x),
  DDS_OP_ADR | DDS_OP_TYPE_4BY | DDS_OP_FLAG_FP, offsetof (Demo_Point, y),
  DDS_OP_RTS
};

const dds_topic_descriptor_t Demo_Envelope_desc =
{
  .m_size = sizeof (Demo_Envelope),
  .m_align = dds_alignof (Demo_Envelope),
  .m_flagset = 0u,
  .m_nkeys = 0u,
  .m_typename = "Demo::Envelope",
  .m_keys = NULL,
  .m_nops = 6,
  .m_ops = Demo_Envelope_ops,
  .m_meta = ""
};
"#;

fn options64(type_name: &str) -> ParseOptions {
    ParseOptions {
        pointer_size: 8,
        ..ParseOptions::for_type(type_name)
    }
}

fn write_source(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(text.as_bytes()).expect("write");
    file.flush().expect("flush");
    file
}

#[test]
fn sensor_from_file() {
    let file = write_source(GENERATED);
    let parsed = parse_file(file.path(), &options64("Demo::Sensor")).expect("parse");

    assert_eq!(parsed.type_name, "Demo::Sensor");
    assert_eq!(parsed.c_name, "Demo_Sensor");
    assert_eq!(
        parsed.resolved_ops(),
        Some(vec![
            OP_ADR | T_4BY | FLAG_KEY | FLAG_MU,
            0,
            OP_ADR | T_STR | FLAG_KEY | FLAG_MU,
            8,
            OP_ADR | T_8BY | FLAG_FP,
            16,
            OP_ADR | T_1BY,
            24,
            OP_RTS,
            OP_KOF | 1,
            0,
            OP_KOF | 1,
            2,
        ])
    );
    assert_eq!(parsed.key_fixups, 1);
    assert_eq!(parsed.size, Some(32));
    assert_eq!(parsed.align, Some(8));
    assert_eq!(
        parsed.flagset,
        TOPIC_XTYPES_METADATA | TOPIC_RESTRICT_DATA_REPRESENTATION
    );
    assert_eq!(
        parsed.restrict_data_representation,
        Some(DATA_REPRESENTATION_RESTRICT_DEFAULT)
    );
    assert_eq!(parsed.type_info.len(), 24);
    assert_eq!(&parsed.type_info[..4], &[0x60, 0x00, 0x00, 0x00]);
    assert_eq!(&parsed.type_info[20..], &[0xf1, 0x2a, 0x9c, 0x11]);
    assert_eq!(parsed.type_map, vec![0x4b, 0, 0, 0, 1, 0, 0, 0]);

    let names: Vec<&str> = parsed.keys.iter().map(|k| k.name.as_str()).collect();
    assert_eq!(names, ["id", "region"]);
    assert_eq!(parsed.keys[1].index, Some(11));
    assert_eq!(parsed.keys[1].flags, Some(1));
}

#[test]
fn sensor_converts_to_topic_descriptor() {
    let parsed = parse_str(GENERATED, &options64("Demo::Sensor")).expect("parse");
    let desc = TopicDescriptor::try_from(parsed).expect("descriptor");
    assert_eq!(desc.type_name(), "Demo::Sensor");
    assert_eq!(desc.size(), 32);
    assert_eq!(desc.align(), 8);
    assert_eq!(desc.n_ops(), 13);
    assert_eq!(desc.n_keys(), 2);
    assert_eq!(desc.keys()[0].index, 9);
    assert_eq!(desc.type_map().len(), 8);
}

#[cfg(target_pointer_width = "64")]
#[test]
fn sensor_native_block() {
    use ddsx::{AbiOffsets, NativeDescriptor};

    let parsed = parse_str(GENERATED, &options64("Sensor")).expect("parse");
    let desc = parsed.into_topic_descriptor().expect("descriptor");
    let native = NativeDescriptor::new(&desc).expect("native");
    let abi = AbiOffsets::CYCLONE_0_11;
    native.with_ptr(|p| unsafe {
        let base = p.cast::<u8>();
        let size = std::ptr::read_unaligned(base.add(abi.size).cast::<u32>());
        let n_ops = std::ptr::read_unaligned(base.add(abi.n_ops).cast::<u32>());
        assert_eq!(size, 32);
        assert_eq!(n_ops, 13);
    });
}

#[test]
fn envelope_inline_struct_layout() {
    let parsed = parse_str(GENERATED, &options64("Envelope")).expect("parse");
    assert_eq!(parsed.type_name, "Demo::Envelope");
    let ops = parsed.resolved_ops().expect("resolved");
    assert_eq!(ops.len(), 13);
    assert_eq!(ops[0], OP_ADR | T_2BY);
    assert_eq!(ops[2], OP_ADR | T_EXT);
    assert_eq!(ops[5], OP_ADR | T_BLN);
    // seq, origin (aligned to the inline Point), valid, then Point.x, Point.y
    assert_eq!([ops[1], ops[3], ops[6], ops[9], ops[11]], [0, 8, 24, 0, 8]);
    assert_eq!(parsed.layout, Some(StructLayout { size: 32, align: 8 }));
    assert!(parsed.keys.is_empty());
    assert!(parsed.type_info.is_empty());
    assert_eq!(parsed.flagset, 0);
}

#[test]
fn selection_by_c_name_and_default() {
    let by_c = parse_str(GENERATED, &options64("Demo_Envelope")).expect("parse");
    assert_eq!(by_c.c_name, "Demo_Envelope");

    let first = parse_str(GENERATED, &ParseOptions::default()).expect("parse");
    assert_eq!(first.c_name, "Demo_Sensor");

    let all = parse_all(GENERATED, &ParseOptions::default());
    let names: Vec<&str> = all.iter().map(|d| d.type_name.as_str()).collect();
    assert_eq!(names, ["Demo::Sensor", "Demo::Envelope"]);
}

#[test]
fn unknown_type_is_missing_ops() {
    match parse_str(GENERATED, &options64("Demo::Nope")) {
        Err(IdlcError::MissingOps { type_name }) => {
            assert_eq!(type_name.as_deref(), Some("Demo::Nope"))
        }
        other => panic!("expected MissingOps, got {:?}", other),
    }
}

#[test]
fn unreadable_file_is_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("absent.c");
    match parse_file(&path, &ParseOptions::default()) {
        Err(IdlcError::Io { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected Io, got {:?}", other),
    }
}

#[test]
fn adjacent_ints_resolve_to_0_and_4() {
    let text = "static const uint32_t T_ops[] = { DDS_OP_ADR | DDS_OP_TYPE_4BY, x, \
                DDS_OP_ADR | DDS_OP_TYPE_4BY, y, DDS_OP_RTS };";
    assert_eq!(
        parse_ops(text),
        vec![
            Some(OP_ADR | T_4BY),
            Some(0),
            Some(OP_ADR | T_4BY),
            Some(4),
            Some(OP_RTS)
        ]
    );
}

#[test]
fn byte_then_int_is_padded_to_4() {
    let text = "static const uint32_t T_ops[] = { DDS_OP_ADR | DDS_OP_TYPE_1BY, x, \
                DDS_OP_ADR | DDS_OP_TYPE_4BY, y, DDS_OP_RTS };";
    let ops = parse_ops(text);
    assert_eq!(ops[1], Some(0));
    assert_eq!(ops[3], Some(4));
}

#[test]
fn key_fixup_clears_opt_and_sgn() {
    let text = "static const uint32_t T_ops[] = { 0x01000023, 0, DDS_OP_RTS };";
    assert_eq!(parse_ops(text)[0], Some(0x0100_0001));
}

#[test]
fn offset_past_u32_range_stays_unresolved() {
    let text = "static const uint32_t T_ops[] = { DDS_OP_ADR | DDS_OP_TYPE_8BY, 0xFFFFFFF9u, \
                DDS_OP_ADR | DDS_OP_TYPE_4BY, offsetof (T, b), DDS_OP_RTS };";
    let parsed = parse_str(text, &ParseOptions::default()).expect("parse");
    assert_eq!(parsed.ops[1], Some(0xFFFF_FFF9));
    assert_eq!(parsed.missing_ops(), vec![3]);
    assert_eq!(parsed.layout, None);
    assert!(matches!(
        parsed.into_topic_descriptor(),
        Err(IdlcError::IncompleteMetadata { .. })
    ));
}

#[test]
fn oversized_inline_struct_stays_unresolved() {
    let text = "static const uint32_t T_ops[] = { DDS_OP_ADR | DDS_OP_TYPE_STU, 0u, 0xFFFFFFFFu, 5u, \
                DDS_OP_ADR | DDS_OP_TYPE_4BY, offsetof (T, b), DDS_OP_RTS };";
    let ops = parse_ops(text);
    assert_eq!(ops.len(), 7);
    assert_eq!(ops[1], Some(0));
    assert_eq!(ops[5], None);
}

#[test]
fn source_defines_extend_symbols() {
    let text = "#define MY_KEY (DDS_OP_FLAG_KEY | DDS_OP_FLAG_MU)\n\
                #define MY_INDEX 3u\n\
                static const uint32_t T_ops[] = { DDS_OP_ADR | DDS_OP_TYPE_4BY | MY_KEY, 0, DDS_OP_RTS, DDS_OP_KOF | 1, 0 };\n\
                static const dds_key_descriptor_t T_keys[1] = { { \"k\", MY_INDEX, 0 } };";
    assert_eq!(parse_ops(text)[0], Some(OP_ADR | T_4BY | FLAG_KEY | FLAG_MU));
    let keys = parse_keys(text);
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].index, Some(3));
}

#[test]
fn malformed_sources_give_empty_results() {
    for text in [
        "",
        "static const uint32_t T_ops[] = { DDS_OP_ADR, 0",
        "T_ops = 5;",
        "static const dds_key_descriptor_t T_keys[1] = { garbage };",
        "}{ ][ \"",
    ] {
        assert!(parse_ops(text).is_empty(), "{:?}", text);
        assert!(parse_keys(text).is_empty(), "{:?}", text);
    }
}

#[test]
fn out_of_range_blob_is_dropped() {
    let text = "#define TYPE_INFO_CDR_T (const unsigned char []){ 0x60, 0x100 }\n\
                static const uint32_t T_ops[] = { DDS_OP_ADR | DDS_OP_TYPE_1BY, 0, DDS_OP_RTS };";
    let parsed = parse_str(text, &ParseOptions::default()).expect("parse");
    assert!(parsed.type_info.is_empty());
    assert!(parsed.is_complete());
}
