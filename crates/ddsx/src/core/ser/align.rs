// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Padding arithmetic shared by the codec and the layout simulator.

/// Round `position` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two (1, 2, 4, 8). `0` and `1` are identity.
#[inline]
pub const fn align(position: usize, alignment: usize) -> usize {
    position + padding_for(position, alignment)
}

/// Number of padding bytes [`align`] would insert at `position`.
#[inline]
pub const fn padding_for(position: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        return 0;
    }
    let mask = alignment - 1;
    (alignment - (position & mask)) & mask
}

/// `u32` flavour used by the opcode layout simulator. `None` on overflow.
#[inline]
pub const fn checked_align_u32(position: u32, alignment: u32) -> Option<u32> {
    if alignment <= 1 {
        return Some(position);
    }
    let mask = alignment - 1;
    position.checked_add((alignment - (position & mask)) & mask)
}
