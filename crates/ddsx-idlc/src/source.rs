// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Source scanning: comments, continuations, array initializers, `#define`s
//! and C string literals.
//!
//! Everything here is text-level. Nothing is evaluated; see [`crate::expr`].

use std::sync::OnceLock;

use regex::Regex;

/// An `X = { ... }` initializer found in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initializer {
    /// C identifier prefix, e.g. `Demo_Msg` for `Demo_Msg_ops`.
    pub prefix: String,
    /// Text between the outer braces.
    pub body: String,
}

/// A `#define NAME body` line (object-like macros only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Define {
    pub name: String,
    pub body: String,
}

const OPS_HEADER: &str = r"\b([A-Za-z_]\w*)_ops\s*\[[^\]]*\]\s*=\s*\{";
const KEYS_HEADER: &str = r"\b([A-Za-z_]\w*)_keys\s*\[[^\]]*\]\s*=\s*\{";
const DESC_HEADER: &str = r"dds_topic_descriptor_t\s+([A-Za-z_]\w*)_desc\s*=\s*\{";
const DEFINE_LINE: &str = r"(?m)^[ \t]*#[ \t]*define[ \t]+([A-Za-z_]\w*)(\(?)(.*)$";

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("invalid built-in regex"))
}

fn ops_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, OPS_HEADER)
}

fn keys_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, KEYS_HEADER)
}

fn desc_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, DESC_HEADER)
}

fn define_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, DEFINE_LINE)
}

/// Replaces `/* */` and `//` comments with blanks, keeping newlines and
/// leaving string and character literals untouched.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            out.push(ch);
            if ch == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if ch == q || ch == '\n' {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                out.push(ch);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push(' ');
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    if c == '\n' {
                        out.push('\n');
                    }
                    prev = c;
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Joins backslash-newline continuations into single lines.
pub fn join_continuations(text: &str) -> String {
    text.replace("\\\r\n", " ").replace("\\\n", " ")
}

/// Comment-free, continuation-joined text, ready for scanning.
pub fn normalize(text: &str) -> String {
    join_continuations(&strip_comments(text))
}

/// Returns the text between the brace at `open` and its matching close,
/// or `None` if unbalanced.
pub fn balanced_body(text: &str, open: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
        } else {
            match b {
                b'"' | b'\'' => quote = Some(b),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return text.get(open + 1..i);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// Splits an initializer body on top-level commas. Elements are trimmed;
/// a trailing comma does not produce an empty element.
pub fn split_top_level(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
        } else {
            match b {
                b'"' | b'\'' => quote = Some(b),
                b'(' | b'{' | b'[' => depth += 1,
                b')' | b'}' | b']' => depth -= 1,
                b',' if depth == 0 => {
                    parts.push(body[start..i].trim());
                    start = i + 1;
                }
                _ => {}
            }
        }
        i += 1;
    }
    let tail = body.get(start..).unwrap_or("").trim();
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts
}

fn initializers(text: &str, re: &Regex) -> Vec<Initializer> {
    re.captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let prefix = caps.get(1)?.as_str().to_string();
            // The match ends right after the opening brace.
            let body = balanced_body(text, whole.end() - 1)?;
            Some(Initializer {
                prefix,
                body: body.to_string(),
            })
        })
        .collect()
}

/// All `<prefix>_ops[...] = { ... }` arrays in source order.
pub fn find_ops_arrays(text: &str) -> Vec<Initializer> {
    initializers(text, ops_regex())
}

/// All `<prefix>_keys[...] = { ... }` arrays in source order.
pub fn find_keys_arrays(text: &str) -> Vec<Initializer> {
    initializers(text, keys_regex())
}

/// All `dds_topic_descriptor_t <prefix>_desc = { ... }` initializers.
pub fn find_descriptors(text: &str) -> Vec<Initializer> {
    initializers(text, desc_regex())
}

/// Object-like `#define`s. Function-like macros are skipped.
pub fn find_defines(text: &str) -> Vec<Define> {
    define_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            if caps.get(2).is_some_and(|m| !m.as_str().is_empty()) {
                return None;
            }
            Some(Define {
                name: caps.get(1)?.as_str().to_string(),
                body: caps.get(3)?.as_str().trim().to_string(),
            })
        })
        .collect()
}

/// Splits a designated initializer element `.field = value`.
pub fn designated(element: &str) -> Option<(&str, &str)> {
    let rest = element.trim().strip_prefix('.')?;
    let (field, value) = rest.split_once('=')?;
    Some((field.trim(), value.trim()))
}

/// Elements of a compound byte-array literal such as
/// `(const unsigned char []){ 0x60, 0x00 }`.
pub fn compound_elements(body: &str) -> Option<Vec<&str>> {
    let open = body.find('{')?;
    let inner = balanced_body(body, open)?;
    Some(split_top_level(inner))
}

/// Decodes one or more adjacent C string literals (`"a" "b"`).
///
/// Returns `None` for anything that is not purely string literals.
pub fn string_literal(text: &str) -> Option<String> {
    let mut out = String::new();
    let mut chars = text.trim().chars().peekable();
    let mut seen = false;

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => return seen.then_some(out),
            Some('"') => seen = true,
            Some(_) => return None,
        }
        loop {
            match chars.next()? {
                '"' => break,
                '\\' => out.push(unescape(&mut chars)?),
                c => out.push(c),
            }
        }
    }
}

fn unescape(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<char> {
    let c = chars.next()?;
    Some(match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        '\\' => '\\',
        '"' => '"',
        '\'' => '\'',
        'x' => {
            let mut value = 0u32;
            let mut digits = 0;
            while let Some(d) = chars.peek().and_then(|c| c.to_digit(16)) {
                value = value * 16 + d;
                digits += 1;
                chars.next();
                if digits == 2 {
                    break;
                }
            }
            if digits == 0 {
                return None;
            }
            char::from_u32(value)?
        }
        other => other,
    })
}
