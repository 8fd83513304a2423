// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Constant Expression Evaluator
//!
//! Evaluates the C constant expressions idlc emits inside array initializers:
//! integer literals, `DDS_OP_*` symbols, `#define`d names, bitwise and
//! arithmetic operators, parentheses and casts. `offsetof`, `sizeof` and
//! `dds_alignof` cannot be known from text and evaluate to
//! [`Eval::Placeholder`].

use std::collections::HashMap;

use ddsx::descriptor::ops::lookup_symbol;

/// Nesting limit for `#define` chains; also breaks definition cycles.
const MAX_DEFINE_DEPTH: usize = 16;

/// Result of evaluating one expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eval {
    Value(u32),
    /// Depends on `offsetof`/`sizeof`/`alignof`.
    Placeholder,
    /// Unknown symbol or malformed expression.
    Unresolved,
}

impl Eval {
    pub fn value(self) -> Option<u32> {
        match self {
            Eval::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_placeholder(self) -> bool {
        self == Eval::Placeholder
    }
}

/// Names known to the evaluator beyond the built-in `DDS_OP_*` table.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    defines: HashMap<String, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `#define name body`. Later definitions replace earlier ones.
    pub fn define(&mut self, name: impl Into<String>, body: impl Into<String>) {
        self.defines.insert(name.into(), body.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defines.contains_key(name) || lookup_symbol(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.defines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    /// Value of a single name. Source defines shadow built-in symbols.
    pub fn resolve(&self, name: &str) -> Eval {
        self.resolve_at(name, 0)
    }

    pub fn eval(&self, expr: &str) -> Eval {
        self.eval_at(expr, 0)
    }

    fn resolve_at(&self, name: &str, depth: usize) -> Eval {
        if let Some(body) = self.defines.get(name) {
            if depth >= MAX_DEFINE_DEPTH {
                return Eval::Unresolved;
            }
            return self.eval_at(body, depth + 1);
        }
        match lookup_symbol(name) {
            Some(v) => Eval::Value(v),
            None => Eval::Unresolved,
        }
    }

    fn eval_at(&self, expr: &str, depth: usize) -> Eval {
        let tokens = match Lexer::new(expr).tokenize() {
            Some(tokens) => tokens,
            None => return Eval::Unresolved,
        };
        let mut parser = Parser {
            tokens,
            pos: 0,
            symbols: self,
            depth,
        };
        let term = parser.parse_or();
        if parser.current() != &Token::Eof {
            return Eval::Unresolved;
        }
        term.into_eval()
    }
}

/// Evaluates `expr` against `symbols`.
pub fn evaluate(expr: &str, symbols: &SymbolTable) -> Eval {
    symbols.eval(expr)
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(i64),
    Identifier(String),
    Op(&'static str),
    LParen,
    RParen,
    Other(char),
    Eof,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.next_char();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    /// Integer literal with optional `u`/`l` suffixes. `None` if malformed.
    fn read_number(&mut self) -> Option<Token> {
        let raw = self.read_identifier();
        let digits = raw.trim_end_matches(['u', 'U', 'l', 'L']);
        let value = if let Some(hex) = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
        {
            i64::from_str_radix(hex, 16).ok()?
        } else if digits.len() > 1 && digits.starts_with('0') {
            i64::from_str_radix(&digits[1..], 8).ok()?
        } else {
            digits.parse::<i64>().ok()?
        };
        Some(Token::Number(value))
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();

        let ch = match self.peek_char() {
            Some(c) => c,
            None => return Some(Token::Eof),
        };

        if ch.is_ascii_digit() {
            return self.read_number();
        }
        if ch.is_ascii_alphabetic() || ch == '_' {
            return Some(Token::Identifier(self.read_identifier()));
        }

        self.next_char();
        let token = match ch {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '|' => Token::Op("|"),
            '^' => Token::Op("^"),
            '&' => Token::Op("&"),
            '+' => Token::Op("+"),
            '-' => Token::Op("-"),
            '*' => Token::Op("*"),
            '/' => Token::Op("/"),
            '%' => Token::Op("%"),
            '~' => Token::Op("~"),
            '<' if self.peek_char() == Some('<') => {
                self.next_char();
                Token::Op("<<")
            }
            '>' if self.peek_char() == Some('>') => {
                self.next_char();
                Token::Op(">>")
            }
            other => Token::Other(other),
        };
        Some(token)
    }

    fn tokenize(mut self) -> Option<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Some(tokens);
            }
        }
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Intermediate value; wide enough that `-1` and `0xFFFFFFFF` both fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Term {
    Num(i64),
    Placeholder,
    Unresolved,
}

impl Term {
    fn from_eval(e: Eval) -> Self {
        match e {
            Eval::Value(v) => Term::Num(i64::from(v)),
            Eval::Placeholder => Term::Placeholder,
            Eval::Unresolved => Term::Unresolved,
        }
    }

    fn into_eval(self) -> Eval {
        match self {
            Term::Num(v) if (i64::from(i32::MIN)..=i64::from(u32::MAX)).contains(&v) => {
                Eval::Value(v as u32)
            }
            Term::Num(_) | Term::Unresolved => Eval::Unresolved,
            Term::Placeholder => Eval::Placeholder,
        }
    }

    fn combine(self, rhs: Term, f: impl FnOnce(i64, i64) -> Option<i64>) -> Term {
        match (self, rhs) {
            (Term::Unresolved, _) | (_, Term::Unresolved) => Term::Unresolved,
            (Term::Placeholder, _) | (_, Term::Placeholder) => Term::Placeholder,
            (Term::Num(a), Term::Num(b)) => f(a, b).map_or(Term::Unresolved, Term::Num),
        }
    }

    fn map(self, f: impl FnOnce(i64) -> Option<i64>) -> Term {
        match self {
            Term::Num(v) => f(v).map_or(Term::Unresolved, Term::Num),
            other => other,
        }
    }
}

struct Parser<'s> {
    tokens: Vec<Token>,
    pos: usize,
    symbols: &'s SymbolTable,
    depth: usize,
}

impl Parser<'_> {
    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn peek(&self, ahead: usize) -> &Token {
        self.tokens.get(self.pos + ahead).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat_op(&mut self, op: &str) -> bool {
        match self.current() {
            Token::Op(current) if *current == op => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn parse_or(&mut self) -> Term {
        let mut left = self.parse_xor();
        while self.eat_op("|") {
            let right = self.parse_xor();
            left = left.combine(right, |a, b| Some(a | b));
        }
        left
    }

    fn parse_xor(&mut self) -> Term {
        let mut left = self.parse_and();
        while self.eat_op("^") {
            let right = self.parse_and();
            left = left.combine(right, |a, b| Some(a ^ b));
        }
        left
    }

    fn parse_and(&mut self) -> Term {
        let mut left = self.parse_shift();
        while self.eat_op("&") {
            let right = self.parse_shift();
            left = left.combine(right, |a, b| Some(a & b));
        }
        left
    }

    fn parse_shift(&mut self) -> Term {
        let mut left = self.parse_additive();
        loop {
            if self.eat_op("<<") {
                let right = self.parse_additive();
                left = left.combine(right, |a, b| {
                    if (0..32).contains(&b) {
                        a.checked_shl(b as u32)
                    } else {
                        None
                    }
                });
            } else if self.eat_op(">>") {
                let right = self.parse_additive();
                left = left.combine(right, |a, b| {
                    if (0..32).contains(&b) {
                        Some(a >> b)
                    } else {
                        None
                    }
                });
            } else {
                return left;
            }
        }
    }

    fn parse_additive(&mut self) -> Term {
        let mut left = self.parse_multiplicative();
        loop {
            if self.eat_op("+") {
                let right = self.parse_multiplicative();
                left = left.combine(right, i64::checked_add);
            } else if self.eat_op("-") {
                let right = self.parse_multiplicative();
                left = left.combine(right, i64::checked_sub);
            } else {
                return left;
            }
        }
    }

    fn parse_multiplicative(&mut self) -> Term {
        let mut left = self.parse_unary();
        loop {
            if self.eat_op("*") {
                let right = self.parse_unary();
                left = left.combine(right, i64::checked_mul);
            } else if self.eat_op("/") {
                let right = self.parse_unary();
                left = left.combine(right, i64::checked_div);
            } else if self.eat_op("%") {
                let right = self.parse_unary();
                left = left.combine(right, i64::checked_rem);
            } else {
                return left;
            }
        }
    }

    fn parse_unary(&mut self) -> Term {
        if self.eat_op("-") {
            return self.parse_unary().map(i64::checked_neg);
        }
        if self.eat_op("+") {
            return self.parse_unary();
        }
        if self.eat_op("~") {
            // Complement in 32 bits, the width of an ops word.
            return self
                .parse_unary()
                .map(|v| Some(i64::from(!(v as u32))));
        }
        if let Some(mask) = self.try_cast() {
            return self.parse_unary().map(|v| Some(v & mask));
        }
        self.parse_primary()
    }

    /// Consumes `( type-name )` and returns the value mask for the cast.
    fn try_cast(&mut self) -> Option<i64> {
        if self.current() != &Token::LParen {
            return None;
        }
        let mut words = Vec::new();
        let mut ahead = 1;
        loop {
            match self.peek(ahead) {
                Token::Identifier(name) if is_type_word(name) => words.push(name.clone()),
                Token::Op("*") if !words.is_empty() => {}
                Token::RParen if !words.is_empty() => break,
                _ => return None,
            }
            ahead += 1;
        }
        self.pos += ahead + 1;
        Some(cast_mask(&words))
    }

    fn parse_primary(&mut self) -> Term {
        match self.current().clone() {
            Token::Number(n) => {
                self.advance();
                Term::Num(n)
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_or();
                if self.current() == &Token::RParen {
                    self.advance();
                    inner
                } else {
                    Term::Unresolved
                }
            }
            Token::Identifier(name) if is_layout_operator(&name) => {
                self.advance();
                if self.skip_group() {
                    Term::Placeholder
                } else {
                    Term::Unresolved
                }
            }
            Token::Identifier(name) => {
                self.advance();
                Term::from_eval(self.symbols.resolve_at(&name, self.depth))
            }
            _ => {
                self.advance();
                Term::Unresolved
            }
        }
    }

    /// Skips a balanced `( ... )` group. `false` if none or unbalanced.
    fn skip_group(&mut self) -> bool {
        if self.current() != &Token::LParen {
            return false;
        }
        let mut depth = 0usize;
        loop {
            match self.current() {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return true;
                    }
                }
                Token::Eof => return false,
                _ => {}
            }
            self.advance();
        }
    }
}

fn is_layout_operator(name: &str) -> bool {
    matches!(
        name,
        "offsetof" | "sizeof" | "dds_alignof" | "alignof" | "_Alignof" | "__alignof__"
    )
}

fn is_type_word(name: &str) -> bool {
    name.ends_with("_t")
        || matches!(
            name,
            "unsigned" | "signed" | "int" | "long" | "short" | "char" | "const" | "bool"
        )
}

fn cast_mask(words: &[String]) -> i64 {
    let has = |w: &str| words.iter().any(|x| x == w);
    if has("uint8_t") || has("int8_t") || has("char") {
        0xFF
    } else if has("uint16_t") || has("int16_t") || has("short") {
        0xFFFF
    } else {
        -1
    }
}
