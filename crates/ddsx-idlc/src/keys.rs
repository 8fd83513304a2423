// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `<Type>_keys[]` extraction.

use log::warn;

use crate::expr::SymbolTable;
use crate::source::{balanced_body, split_top_level, string_literal};

/// One `{ "name", index, flags }` entry. Numeric fields are `None` when
/// they reference unknown symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawKey {
    pub name: String,
    pub index: Option<u32>,
    pub flags: Option<u32>,
}

impl RawKey {
    pub fn is_complete(&self) -> bool {
        self.index.is_some() && self.flags.is_some()
    }
}

/// Parses the body of a keys initializer.
///
/// Entries that are not `{ string, expr, expr }` are skipped with a warning.
pub fn parse_key_entries(body: &str, symbols: &SymbolTable) -> Vec<RawKey> {
    split_top_level(body)
        .into_iter()
        .enumerate()
        .filter_map(|(n, entry)| {
            let key = parse_entry(entry, symbols);
            if key.is_none() {
                warn!("keys[{}]: malformed entry '{}' skipped", n, entry);
            }
            key
        })
        .collect()
}

fn parse_entry(entry: &str, symbols: &SymbolTable) -> Option<RawKey> {
    let open = entry.find('{')?;
    let inner = balanced_body(entry, open)?;
    let fields = split_top_level(inner);
    let [name, index, flags] = fields.as_slice() else {
        return None;
    };
    Some(RawKey {
        name: string_literal(name)?,
        index: symbols.eval(index).value(),
        flags: symbols.eval(flags).value(),
    })
}
