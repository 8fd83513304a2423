// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Destination buffers for [`CdrWriter`](super::CdrWriter). Flushed windows
//! are committed and can no longer be patched.

use super::{SerError, SerResult};
use crate::config::DEFAULT_WINDOW_SIZE;

/// Window-based output used by the writer.
pub trait BufferSink {
    /// Active window. The writer owns `window_mut()[..used]` until the next flush.
    fn window_mut(&mut self) -> &mut [u8];

    /// Length of the active window.
    fn window_len(&self) -> usize;

    /// Commit `used` bytes of the active window and open a new window of at
    /// least `min` bytes.
    fn flush(&mut self, used: usize, min: usize) -> SerResult<()>;

    /// Commit `used` bytes of the active window; no more writes follow.
    fn complete(&mut self, used: usize);
}

/// Caller-supplied buffer with fixed capacity. Never grows.
pub struct FixedSink<'a> {
    buffer: &'a mut [u8],
    written: usize,
}

impl<'a> FixedSink<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, written: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes committed by [`BufferSink::complete`].
    pub fn written(&self) -> &[u8] {
        &self.buffer[..self.written]
    }

    pub fn len(&self) -> usize {
        self.written
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }
}

impl BufferSink for FixedSink<'_> {
    fn window_mut(&mut self) -> &mut [u8] {
        self.buffer
    }

    fn window_len(&self) -> usize {
        self.buffer.len()
    }

    fn flush(&mut self, used: usize, min: usize) -> SerResult<()> {
        Err(SerError::BufferOverflow {
            offset: used,
            needed: min,
            capacity: self.buffer.len(),
        })
    }

    fn complete(&mut self, used: usize) {
        self.written = used;
    }
}

/// Heap-backed output that commits full windows into a growing vector.
pub struct GrowableSink {
    committed: Vec<u8>,
    window: Vec<u8>,
    window_size: usize,
    flushes: usize,
}

impl GrowableSink {
    pub fn new() -> Self {
        Self::with_window_size(DEFAULT_WINDOW_SIZE)
    }

    /// Windows are at least `window_size` bytes (minimum 1).
    pub fn with_window_size(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            committed: Vec::new(),
            window: vec![0u8; window_size],
            window_size,
            flushes: 0,
        }
    }

    /// Bytes committed so far (excludes the active window).
    pub fn committed(&self) -> &[u8] {
        &self.committed
    }

    /// Number of window flushes performed.
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.committed
    }
}

impl Default for GrowableSink {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferSink for GrowableSink {
    fn window_mut(&mut self) -> &mut [u8] {
        &mut self.window
    }

    fn window_len(&self) -> usize {
        self.window.len()
    }

    fn flush(&mut self, used: usize, min: usize) -> SerResult<()> {
        self.committed.extend_from_slice(&self.window[..used]);
        let next = self.window_size.max(min);
        self.window.clear();
        self.window.resize(next, 0);
        self.flushes += 1;
        log::trace!(
            "[GrowableSink] flushed {} bytes, committed={}, next window={}",
            used,
            self.committed.len(),
            next
        );
        Ok(())
    }

    fn complete(&mut self, used: usize) {
        self.committed.extend_from_slice(&self.window[..used]);
        self.window.clear();
    }
}
