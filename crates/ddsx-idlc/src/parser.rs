// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor Parser
//!
//! Turns one idlc-generated C source into [`ParsedDescriptor`]s: the ops
//! stream with member offsets resolved, the key list, the descriptor header
//! fields and the XTypes blobs.

use std::collections::HashSet;
use std::path::Path;

use ddsx::descriptor::{KeyDescriptor, TopicDescriptor};
use log::{debug, warn};

use crate::error::{IdlcError, Result};
use crate::expr::{Eval, SymbolTable};
use crate::keys::{parse_key_entries, RawKey};
use crate::layout::{apply_key_fixup, resolve_offsets, StructLayout};
use crate::source::{
    balanced_body, compound_elements, designated, find_defines, find_descriptors, find_keys_arrays,
    find_ops_arrays, normalize, split_top_level, string_literal, Initializer,
};

const TYPE_INFO_PREFIX: &str = "TYPE_INFO_CDR_";
const TYPE_MAP_PREFIX: &str = "TYPE_MAP_CDR_";

/// Parser settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Clear `OPT`/`SGN` on key members (on by default).
    pub key_flag_fixup: bool,
    /// Target pointer width in bytes, used for pointer-backed members.
    pub pointer_size: u32,
    /// Type to extract when the source defines several. Matches the C
    /// prefix (`Demo_Msg`), the IDL name (`Demo::Msg`) or a trailing
    /// component (`Msg`).
    pub type_name: Option<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            key_flag_fixup: true,
            pointer_size: std::mem::size_of::<usize>() as u32,
            type_name: None,
        }
    }
}

impl ParseOptions {
    pub fn for_type(name: impl Into<String>) -> Self {
        Self {
            type_name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Everything extracted for one type. Unresolved values stay `None` until
/// conversion into a [`TopicDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDescriptor {
    /// IDL scoped name, e.g. `Demo::Msg`.
    pub type_name: String,
    /// C identifier prefix, e.g. `Demo_Msg`.
    pub c_name: String,
    pub ops: Vec<Option<u32>>,
    pub keys: Vec<RawKey>,
    pub size: Option<u32>,
    pub align: Option<u32>,
    /// Simulated layout of the first struct definition.
    pub layout: Option<StructLayout>,
    pub flagset: u32,
    pub type_info: Vec<u8>,
    pub type_map: Vec<u8>,
    pub meta: Option<String>,
    pub restrict_data_representation: Option<u32>,
    /// Ops words changed by the key flag fix-up.
    pub key_fixups: usize,
}

impl ParsedDescriptor {
    /// Indices of ops words that could not be resolved.
    pub fn missing_ops(&self) -> Vec<usize> {
        self.ops
            .iter()
            .enumerate()
            .filter_map(|(i, w)| w.is_none().then_some(i))
            .collect()
    }

    /// Indices of keys with an unresolved index or flags field.
    pub fn missing_keys(&self) -> Vec<usize> {
        self.keys
            .iter()
            .enumerate()
            .filter_map(|(i, k)| (!k.is_complete()).then_some(i))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.ops.iter().all(Option::is_some) && self.keys.iter().all(RawKey::is_complete)
    }

    /// Fully resolved ops words, or `None` if any is missing.
    pub fn resolved_ops(&self) -> Option<Vec<u32>> {
        self.ops.iter().copied().collect()
    }

    pub fn into_topic_descriptor(self) -> Result<TopicDescriptor> {
        let missing_ops = self.missing_ops();
        let missing_keys = self.missing_keys();
        if !missing_ops.is_empty() || !missing_keys.is_empty() {
            return Err(IdlcError::IncompleteMetadata {
                type_name: self.type_name,
                ops: missing_ops,
                keys: missing_keys,
            });
        }

        let mut seen = HashSet::new();
        let mut keys = Vec::with_capacity(self.keys.len());
        for key in self.keys {
            if key.name.is_empty() {
                return Err(IdlcError::InvalidKey {
                    name: key.name,
                    reason: "empty key name".into(),
                });
            }
            if !seen.insert(key.name.clone()) {
                return Err(IdlcError::InvalidKey {
                    name: key.name,
                    reason: "declared twice".into(),
                });
            }
            let (Some(index), Some(flags)) = (key.index, key.flags) else {
                continue;
            };
            keys.push(KeyDescriptor::new(key.name, index, flags));
        }

        let ops = self.ops.into_iter().flatten().collect();
        let size = self.size.unwrap_or_else(|| {
            warn!("{}: struct size unknown, using 0", self.type_name);
            0
        });
        let align = self.align.unwrap_or(1);

        let mut builder = TopicDescriptor::builder(self.type_name)
            .size(size)
            .align(align)
            .flagset(self.flagset)
            .ops(ops)
            .keys(keys)
            .type_info(self.type_info)
            .type_map(self.type_map);
        if let Some(meta) = self.meta {
            builder = builder.meta(meta);
        }
        if let Some(mask) = self.restrict_data_representation {
            builder = builder.restrict_data_representation(mask);
        }
        Ok(builder.build()?)
    }
}

impl TryFrom<ParsedDescriptor> for TopicDescriptor {
    type Error = IdlcError;

    fn try_from(parsed: ParsedDescriptor) -> Result<Self> {
        parsed.into_topic_descriptor()
    }
}

// ============================================================================
// Source model
// ============================================================================

struct Source {
    symbols: SymbolTable,
    defines: Vec<(String, String)>,
    ops: Vec<Initializer>,
    keys: Vec<Initializer>,
    descriptors: Vec<Initializer>,
}

impl Source {
    fn scan(text: &str) -> Self {
        let text = normalize(text);
        let mut symbols = SymbolTable::new();
        let mut defines = Vec::new();
        for define in find_defines(&text) {
            symbols.define(define.name.clone(), define.body.clone());
            defines.push((define.name, define.body));
        }
        let src = Self {
            symbols,
            defines,
            ops: find_ops_arrays(&text),
            keys: find_keys_arrays(&text),
            descriptors: find_descriptors(&text),
        };
        debug!(
            "scanned source: {} ops arrays, {} key arrays, {} descriptors, {} defines",
            src.ops.len(),
            src.keys.len(),
            src.descriptors.len(),
            src.defines.len()
        );
        src
    }

    fn define(&self, name: &str) -> Option<&str> {
        self.defines
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, body)| body.as_str())
    }

    fn keys_for(&self, prefix: &str) -> Option<&Initializer> {
        self.keys.iter().find(|k| k.prefix == prefix)
    }

    fn descriptor_for(&self, prefix: &str) -> Option<&Initializer> {
        self.descriptors.iter().find(|d| d.prefix == prefix)
    }

    /// `m_typename` of the descriptor for `prefix`, if present.
    fn declared_name(&self, prefix: &str) -> Option<String> {
        let desc = self.descriptor_for(prefix)?;
        split_top_level(&desc.body)
            .into_iter()
            .filter_map(designated)
            .find(|(field, _)| *field == "m_typename")
            .and_then(|(_, value)| string_literal(value))
    }

    fn select(&self, wanted: Option<&str>) -> Option<&Initializer> {
        let Some(wanted) = wanted else {
            return self
                .ops
                .iter()
                .find(|o| self.descriptor_for(&o.prefix).is_some())
                .or_else(|| self.ops.first());
        };
        let c_name = wanted.replace("::", "_");
        let suffix = format!("_{}", c_name);
        self.ops
            .iter()
            .find(|o| {
                o.prefix == wanted
                    || o.prefix == c_name
                    || self.declared_name(&o.prefix).as_deref() == Some(wanted)
            })
            .or_else(|| self.ops.iter().find(|o| o.prefix.ends_with(&suffix)))
    }

    fn extract(&self, ops: &Initializer, options: &ParseOptions) -> ParsedDescriptor {
        let prefix = ops.prefix.as_str();
        let raw: Vec<Eval> = split_top_level(&ops.body)
            .into_iter()
            .map(|e| self.symbols.eval(e))
            .collect();
        let mut resolution = resolve_offsets(&raw, options.pointer_size);
        let key_fixups = if options.key_flag_fixup {
            apply_key_fixup(&mut resolution.words)
        } else {
            0
        };

        let keys = self
            .keys_for(prefix)
            .map(|k| parse_key_entries(&k.body, &self.symbols))
            .unwrap_or_default();

        let mut parsed = ParsedDescriptor {
            type_name: prefix.to_string(),
            c_name: prefix.to_string(),
            ops: resolution.words,
            keys,
            size: resolution.layout.map(|l| l.size),
            align: resolution.layout.map(|l| l.align),
            layout: resolution.layout,
            flagset: 0,
            type_info: Vec::new(),
            type_map: Vec::new(),
            meta: None,
            restrict_data_representation: None,
            key_fixups,
        };

        let mut info_macro = format!("{}{}", TYPE_INFO_PREFIX, prefix);
        let mut map_macro = format!("{}{}", TYPE_MAP_PREFIX, prefix);

        if let Some(desc) = self.descriptor_for(prefix) {
            for (field, value) in split_top_level(&desc.body).into_iter().filter_map(designated) {
                match field {
                    "m_typename" => match string_literal(value) {
                        Some(name) => parsed.type_name = name,
                        None => warn!("{}: m_typename is not a string literal", prefix),
                    },
                    "m_flagset" => match self.symbols.eval(value) {
                        Eval::Value(v) => parsed.flagset = v,
                        _ => warn!("{}: m_flagset '{}' not resolvable, using 0", prefix, value),
                    },
                    "m_size" => {
                        if let Eval::Value(v) = self.symbols.eval(value) {
                            parsed.size = Some(v);
                        }
                    }
                    "m_align" => {
                        if let Eval::Value(v) = self.symbols.eval(value) {
                            parsed.align = Some(v);
                        }
                    }
                    "m_meta" => parsed.meta = string_literal(value),
                    "restrict_data_representation" => {
                        parsed.restrict_data_representation = self.symbols.eval(value).value();
                    }
                    "type_information" => {
                        if let Some(name) = data_macro(value) {
                            info_macro = name;
                        }
                    }
                    "type_mapping" => {
                        if let Some(name) = data_macro(value) {
                            map_macro = name;
                        }
                    }
                    _ => {}
                }
            }
        }

        parsed.type_info = self.blob(&info_macro);
        parsed.type_map = self.blob(&map_macro);

        debug!(
            "{}: {} ops words, {} keys, size {:?}, align {:?}",
            parsed.type_name,
            parsed.ops.len(),
            parsed.keys.len(),
            parsed.size,
            parsed.align
        );
        parsed
    }

    /// Bytes of a `(const unsigned char []){ ... }` macro. Empty if the
    /// macro is missing or any element is not a byte.
    fn blob(&self, macro_name: &str) -> Vec<u8> {
        let Some(body) = self.define(macro_name) else {
            return Vec::new();
        };
        let Some(elements) = compound_elements(body) else {
            warn!("{}: not a byte array literal", macro_name);
            return Vec::new();
        };
        let bytes: Option<Vec<u8>> = elements
            .iter()
            .map(|e| {
                self.symbols
                    .eval(e)
                    .value()
                    .and_then(|v| u8::try_from(v).ok())
            })
            .collect();
        let Some(bytes) = bytes else {
            warn!("{}: element out of byte range, blob dropped", macro_name);
            return Vec::new();
        };

        // TYPE_INFO_CDR_X pairs with TYPE_INFO_CDR_SZ_X.
        if let Some((kind, name)) = macro_name
            .strip_prefix(TYPE_INFO_PREFIX)
            .map(|r| (TYPE_INFO_PREFIX, r))
            .or_else(|| macro_name.strip_prefix(TYPE_MAP_PREFIX).map(|r| (TYPE_MAP_PREFIX, r)))
        {
            let size_macro = format!("{}SZ_{}", kind, name);
            if let Some(declared) = self.symbols.eval(&size_macro).value() {
                if declared as usize != bytes.len() {
                    warn!(
                        "{}: {} bytes but {} declares {}",
                        macro_name,
                        bytes.len(),
                        size_macro,
                        declared
                    );
                }
            }
        }
        bytes
    }
}

/// `NAME` from `{ .data = NAME, .sz = ... }`.
fn data_macro(value: &str) -> Option<String> {
    let open = value.find('{')?;
    let inner = balanced_body(value, open)?;
    split_top_level(inner)
        .into_iter()
        .filter_map(designated)
        .find(|(field, _)| *field == "data")
        .map(|(_, name)| name.to_string())
}

// ============================================================================
// Entry points
// ============================================================================

/// Resolved ops words of the first ops array in `text`, key fix-up applied.
///
/// Missing or malformed arrays give an empty vector.
pub fn parse_ops(text: &str) -> Vec<Option<u32>> {
    let src = Source::scan(text);
    let options = ParseOptions::default();
    src.select(None)
        .map(|ops| src.extract(ops, &options).ops)
        .unwrap_or_default()
}

/// Key entries of the first keys array in `text`.
pub fn parse_keys(text: &str) -> Vec<RawKey> {
    let src = Source::scan(text);
    src.keys
        .first()
        .map(|k| parse_key_entries(&k.body, &src.symbols))
        .unwrap_or_default()
}

/// Extracts one type from `text`, selected by [`ParseOptions::type_name`].
pub fn parse_str(text: &str, options: &ParseOptions) -> Result<ParsedDescriptor> {
    let src = Source::scan(text);
    let ops = src
        .select(options.type_name.as_deref())
        .ok_or_else(|| IdlcError::MissingOps {
            type_name: options.type_name.clone(),
        })?;
    Ok(src.extract(ops, options))
}

/// Extracts every type with an ops array, in source order.
pub fn parse_all(text: &str, options: &ParseOptions) -> Vec<ParsedDescriptor> {
    let src = Source::scan(text);
    src.ops.iter().map(|ops| src.extract(ops, options)).collect()
}

/// Reads `path` and extracts one type from it.
pub fn parse_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<ParsedDescriptor> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| IdlcError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("parsing {}", path.display());
    parse_str(&text, options)
}
