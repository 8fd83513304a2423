// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Struct Layout Simulation
//!
//! idlc emits member offsets as `offsetof (T, m)`, which only a C compiler
//! can evaluate. The resolver walks the ops stream and recomputes every
//! offset from the member type codes with natural alignment, the way the
//! compiler lays the struct out.

use std::collections::HashMap;

use ddsx::core::ser::checked_align_u32;
use ddsx::descriptor::ops::{
    adr_width, instruction, is_adr, layout_for_code, type_code, TypeCode, KEY_CONFLICT_FLAGS,
    FLAG_KEY, OP_RTS,
};
use log::{debug, warn};

use crate::expr::Eval;

/// Value some generators emit in place of an `offsetof` they could not compute.
pub const OFFSETOF_PLACEHOLDER: u32 = 0x0BAD_F00D;

/// Nesting limit when following `EXT` jumps into inline struct definitions.
const MAX_NESTING: usize = 32;

/// Layouts of `EXT` targets already simulated, keyed by ops index.
type LayoutCache = HashMap<usize, Option<StructLayout>>;

/// In-memory size and alignment of one struct definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructLayout {
    pub size: u32,
    pub align: u32,
}

/// Output of [`resolve_offsets`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// One entry per ops word; `None` where the word could not be evaluated.
    pub words: Vec<Option<u32>>,
    /// Indices of the words that hold member offsets.
    pub offset_slots: Vec<usize>,
    /// Number of offset slots whose value was computed rather than taken
    /// from the source.
    pub computed: usize,
    /// Layout of the struct starting at word 0.
    pub layout: Option<StructLayout>,
}

/// Replaces offset placeholders with simulated offsets.
///
/// Single left-to-right pass with a byte cursor. The word after an `ADR`
/// instruction is an offset slot: the cursor is aligned for the member type,
/// the slot gets the aligned cursor unless the source has a literal offset
/// there, and the cursor advances by the member size. An `RTS` word outside
/// a slot starts the next struct definition at offset 0.
///
/// If the cursor leaves the `u32` range, the remaining computed offsets of
/// that definition stay unresolved and no layout is reported.
pub fn resolve_offsets(raw: &[Eval], pointer_size: u32) -> Resolution {
    let mut out = Resolution {
        words: Vec::with_capacity(raw.len()),
        ..Resolution::default()
    };
    let mut cache = LayoutCache::new();
    let mut cursor = Some(0u32);
    let mut overflowed = false;
    let mut prev_was_slot = false;

    for (i, word) in raw.iter().enumerate() {
        let adr = match i.checked_sub(1).and_then(|p| raw[p].value()) {
            Some(prev) if !prev_was_slot && is_adr(prev) => Some(i - 1),
            _ => None,
        };

        if let Some(adr_index) = adr {
            let (size, alignment) = member_layout(raw, adr_index, pointer_size, 0, &mut cache);
            let offset = match word.value() {
                Some(literal) if literal != OFFSETOF_PLACEHOLDER => Some(literal),
                _ => {
                    let aligned = cursor.and_then(|c| checked_align_u32(c, alignment));
                    if aligned.is_some() {
                        out.computed += 1;
                    }
                    aligned
                }
            };
            cursor = offset.and_then(|o| o.checked_add(size));
            if cursor.is_none() {
                warn!("ops[{}]: member offset exceeds the u32 range", i);
                overflowed = true;
            }
            out.words.push(offset);
            out.offset_slots.push(i);
            prev_was_slot = true;
            continue;
        }

        prev_was_slot = false;
        match *word {
            Eval::Value(v) => {
                if v == OP_RTS {
                    cursor = Some(0);
                }
                out.words.push(Some(v));
            }
            Eval::Placeholder | Eval::Unresolved => {
                warn!("ops[{}]: value not recoverable from source", i);
                out.words.push(None);
            }
        }
    }

    if !overflowed {
        out.layout = layout_at(raw, 0, pointer_size, 0, &mut cache);
    }
    debug!(
        "resolved {} ops words, {} offsets computed, layout {:?}",
        out.words.len(),
        out.computed,
        out.layout
    );
    out
}

/// `(size, align)` of the member whose `ADR` word sits at `adr_index`.
fn member_layout(
    raw: &[Eval],
    adr_index: usize,
    pointer_size: u32,
    depth: usize,
    cache: &mut LayoutCache,
) -> (u32, u32) {
    let Some(word) = raw[adr_index].value() else {
        return (1, 1);
    };
    let code = type_code(word);
    let extra = raw.get(adr_index + 2).and_then(|e| e.value());

    match TypeCode::from_u8(code) {
        Some(TypeCode::External) => extra
            .map(|jump| adr_index + (jump & 0xFFFF) as usize)
            .filter(|&target| target != adr_index)
            .and_then(|target| cached_layout(raw, target, pointer_size, depth + 1, cache))
            .map_or((pointer_size, pointer_size), |l| (l.size, l.align)),
        Some(TypeCode::Struct) => extra.map_or((1, 1), |size| (size, 8)),
        _ => layout_for_code(code, pointer_size),
    }
}

fn cached_layout(
    raw: &[Eval],
    target: usize,
    pointer_size: u32,
    depth: usize,
    cache: &mut LayoutCache,
) -> Option<StructLayout> {
    if let Some(&known) = cache.get(&target) {
        return known;
    }
    let layout = layout_at(raw, target, pointer_size, depth, cache);
    cache.insert(target, layout);
    layout
}

/// Simulates the struct definition starting at ops word `start`.
///
/// Walks `ADR` members until `RTS`; other instructions are stepped over.
/// Returns `None` if the definition runs off the end, contains unresolved
/// words, nests too deeply or does not fit in `u32`.
pub fn struct_layout_at(raw: &[Eval], start: usize, pointer_size: u32) -> Option<StructLayout> {
    layout_at(raw, start, pointer_size, 0, &mut LayoutCache::new())
}

fn layout_at(
    raw: &[Eval],
    start: usize,
    pointer_size: u32,
    depth: usize,
    cache: &mut LayoutCache,
) -> Option<StructLayout> {
    if depth > MAX_NESTING {
        return None;
    }
    let mut i = start;
    let mut cursor = 0u32;
    let mut max_align = 1u32;

    loop {
        let word = raw.get(i)?.value()?;
        if instruction(word) == OP_RTS {
            break;
        }
        if !is_adr(word) {
            i += 1;
            continue;
        }
        let code = type_code(word);
        let (size, alignment) = member_layout(raw, i, pointer_size, depth, cache);
        cursor = checked_align_u32(cursor, alignment)?.checked_add(size)?;
        max_align = max_align.max(alignment);
        i += adr_width(code);
    }

    Some(StructLayout {
        size: checked_align_u32(cursor, max_align)?,
        align: max_align,
    })
}

/// Clears `OPT` and `SGN` on every `ADR` instruction that has `KEY` set.
///
/// Offset slots are skipped so a large offset is never mistaken for an
/// instruction. Returns the number of words changed.
pub fn apply_key_fixup(words: &mut [Option<u32>]) -> usize {
    let mut fixed = 0;
    let mut i = 0;
    while i < words.len() {
        if let Some(word) = words[i] {
            if is_adr(word) {
                if word & FLAG_KEY != 0 && word & KEY_CONFLICT_FLAGS != 0 {
                    let cleared = word & !KEY_CONFLICT_FLAGS;
                    warn!(
                        "ops[{}]: key member 0x{:08X} carries OPT/SGN, using 0x{:08X}",
                        i, word, cleared
                    );
                    words[i] = Some(cleared);
                    fixed += 1;
                }
                i += 2;
                continue;
            }
        }
        i += 1;
    }
    fixed
}
