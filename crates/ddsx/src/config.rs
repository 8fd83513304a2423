// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ddsx Global Configuration
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: Compile-time constants (envelope layout, DHEADER, window size)
//! - **Level 2 (Dynamic)**: [`CodecConfig`] chosen at runtime (environment or YAML)
//!
//! # Example
//!
//! ```ignore
//! use ddsx::config::*;
//!
//! let cfg = CodecConfig::from_env()?;
//! let writer = cfg.growable_writer();
//! ```

use crate::core::ser::{
    CdrReader, CdrWriter, CodecOptions, Encoding, GrowableSink, StringTerminator,
};
use crate::{Error, Result};

// =======================================================================
// Wire layout (DDS-XTypes v1.3 Sec.7.4.3 / Sec.7.6.3.1.2)
// =======================================================================

/// Encapsulation header: `[0x00, kind, options_hi, options_lo]`.
pub const ENCAPSULATION_HEADER_SIZE: usize = 4;

/// Length prefix of appendable/mutable bodies under XCDR2.
pub const DHEADER_SIZE: usize = 4;

pub const KIND_CDR_LE: u8 = 0x01;
pub const KIND_PL_CDR_LE: u8 = 0x03;
pub const KIND_CDR2_LE: u8 = 0x07;
pub const KIND_D_CDR2_LE: u8 = 0x09;
pub const KIND_PL_CDR2_LE: u8 = 0x0B;

// =======================================================================
// Codec defaults
// =======================================================================

/// Initial window of a [`GrowableSink`]; later windows grow to fit a single op.
pub const DEFAULT_WINDOW_SIZE: usize = 256;

/// Primitive alignment cap applied by the reference encoder.
pub const DEFAULT_MAX_ALIGN: usize = 4;

pub const ENV_ENCODING: &str = "DDSX_ENCODING";
pub const ENV_MAX_ALIGN: &str = "DDSX_MAX_ALIGN";
pub const ENV_STRING_TERMINATOR: &str = "DDSX_STRING_TERMINATOR";
pub const ENV_WINDOW_SIZE: &str = "DDSX_WINDOW_SIZE";

/// Runtime codec configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "config-loaders", serde(default))]
pub struct CodecConfig {
    pub encoding: Encoding,
    pub max_align: usize,
    pub string_terminator: StringTerminator,
    pub window_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::Extended,
            max_align: DEFAULT_MAX_ALIGN,
            string_terminator: StringTerminator::Always,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl CodecConfig {
    /// Defaults overridden by `DDSX_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a caller-supplied lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(value) = lookup(ENV_ENCODING) {
            cfg.encoding = parse_encoding(&value)?;
        }
        if let Some(value) = lookup(ENV_MAX_ALIGN) {
            cfg.max_align = value
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{}: not a number: {}", ENV_MAX_ALIGN, value)))?;
        }
        if let Some(value) = lookup(ENV_STRING_TERMINATOR) {
            cfg.string_terminator = parse_terminator(&value)?;
        }
        if let Some(value) = lookup(ENV_WINDOW_SIZE) {
            cfg.window_size = value.trim().parse().map_err(|_| {
                Error::Config(format!("{}: not a number: {}", ENV_WINDOW_SIZE, value))
            })?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a YAML document such as `encoding: legacy\nmax_align: 8`.
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(text)
            .map_err(|e| Error::Config(format!("invalid codec YAML: {}", e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !matches!(self.max_align, 1 | 2 | 4 | 8) {
            return Err(Error::Config(format!(
                "max_align must be 1, 2, 4 or 8 (got {})",
                self.max_align
            )));
        }
        if self.window_size == 0 {
            return Err(Error::Config("window_size must be non-zero".into()));
        }
        Ok(())
    }

    pub fn codec_options(&self) -> CodecOptions {
        CodecOptions {
            max_align: self.max_align,
            string_terminator: self.string_terminator,
        }
    }

    pub fn growable_writer(&self) -> CdrWriter<GrowableSink> {
        CdrWriter::with_options(
            GrowableSink::with_window_size(self.window_size),
            self.encoding,
            self.codec_options(),
        )
    }

    pub fn reader<'a>(&self, data: &'a [u8]) -> CdrReader<'a> {
        CdrReader::new(data, self.encoding).with_options(self.codec_options())
    }
}

fn parse_encoding(value: &str) -> Result<Encoding> {
    match value.trim().to_ascii_lowercase().as_str() {
        "legacy" | "xcdr1" => Ok(Encoding::Legacy),
        "extended" | "xcdr2" => Ok(Encoding::Extended),
        other => Err(Error::Config(format!(
            "{}: unknown encoding '{}'",
            ENV_ENCODING, other
        ))),
    }
}

fn parse_terminator(value: &str) -> Result<StringTerminator> {
    match value.trim().to_ascii_lowercase().as_str() {
        "always" => Ok(StringTerminator::Always),
        "legacy-only" | "legacy_only" => Ok(StringTerminator::LegacyOnly),
        other => Err(Error::Config(format!(
            "{}: unknown string terminator '{}'",
            ENV_STRING_TERMINATOR, other
        ))),
    }
}
