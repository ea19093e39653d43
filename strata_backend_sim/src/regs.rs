// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Register map and word encodings for the simulated engine.
//!
//! Every multi-field register word is built and read through explicit
//! mask-and-shift functions — never through in-memory layout tricks —
//! so the encoding is identical on every host. Offsets are in 32-bit
//! words from the start of the register block.

use strata_core::pipeline::{BlendMethod, PixelSource};
use strata_core::surface::{ColorKey, ColorKeyMode, FilterQuality, Window};

/// Global control: bit 0 is the clock gate.
pub const GLB_CTRL: usize = 0x00;
/// Input-enable mask: bit 0 backdrop, bit 1 source.
pub const GLB_INPUT_EN: usize = 0x01;

/// Result-layer block base.
pub const RESULT_BASE: usize = 0x10;
/// Input-1 (backdrop) block base.
pub const BACKDROP_BASE: usize = 0x20;
/// Input-2 (source) block base.
pub const SOURCE_BASE: usize = 0x40;

/// Total register-file size in words.
pub const REG_COUNT: usize = 0x60;

// Offsets shared by all layer blocks.

/// Base address word.
pub const OFF_ADDR: usize = 0x0;
/// Line length in bytes.
pub const OFF_LINE_LEN: usize = 0x1;
/// Window minimum corner (x low half, y high half).
pub const OFF_WIN_MIN: usize = 0x2;
/// Window maximum corner.
pub const OFF_WIN_MAX: usize = 0x3;
/// Layer control: format, source kind, blend, filter, opacity.
pub const OFF_CTRL: usize = 0x4;
/// Constant fill color.
pub const OFF_COLOR: usize = 0x5;
/// Color-key control word.
pub const OFF_KEY_CTRL: usize = 0x6;
/// Color-key range minimum, packed 0x00RRGGBB.
pub const OFF_KEY_MIN: usize = 0x7;
/// Color-key range maximum, packed 0x00RRGGBB.
pub const OFF_KEY_MAX: usize = 0x8;
/// Color-key replacement color.
pub const OFF_KEY_REPLACE: usize = 0x9;
/// First of the nine Q16.16 matrix words (row-major).
pub const OFF_MATRIX: usize = 0xA;

// Result-only offsets.

/// Output tile size (width low half, height high half).
pub const OFF_TILE: usize = 0x5;

const HALF_MASK: u32 = 0xFFFF;

/// Packs two 16-bit halves: `lo` in bits 0–15, `hi` in bits 16–31.
#[must_use]
pub const fn pack_halves(lo: u32, hi: u32) -> u32 {
    (lo & HALF_MASK) | ((hi & HALF_MASK) << 16)
}

/// Splits a packed word back into its (lo, hi) halves.
#[must_use]
pub const fn unpack_halves(word: u32) -> (u32, u32) {
    (word & HALF_MASK, word >> 16)
}

/// Encodes a window's minimum corner.
#[must_use]
pub const fn pack_win_min(w: Window) -> u32 {
    pack_halves(w.x_min, w.y_min)
}

/// Encodes a window's maximum corner.
#[must_use]
pub const fn pack_win_max(w: Window) -> u32 {
    pack_halves(w.x_max, w.y_max)
}

/// Decodes the min/max corner words back into a window.
#[must_use]
pub const fn unpack_window(min_word: u32, max_word: u32) -> Window {
    let (x_min, y_min) = unpack_halves(min_word);
    let (x_max, y_max) = unpack_halves(max_word);
    Window {
        x_min,
        x_max,
        y_min,
        y_max,
    }
}

const CTRL_FORMAT_MASK: u32 = 0xFF;
const CTRL_CONSTANT_BIT: u32 = 1 << 8;
const CTRL_BLEND_BIT: u32 = 1 << 9;
const CTRL_BILINEAR_BIT: u32 = 1 << 10;
const CTRL_OPACITY_SHIFT: u32 = 16;

/// Encodes the layer control word.
#[must_use]
pub fn pack_layer_ctrl(
    format_code: u8,
    source: PixelSource,
    blend: BlendMethod,
    filter: FilterQuality,
    opacity: u8,
) -> u32 {
    let mut word = u32::from(format_code) & CTRL_FORMAT_MASK;
    if matches!(source, PixelSource::Constant) {
        word |= CTRL_CONSTANT_BIT;
    }
    if matches!(blend, BlendMethod::SourceOver) {
        word |= CTRL_BLEND_BIT;
    }
    if matches!(filter, FilterQuality::Bilinear) {
        word |= CTRL_BILINEAR_BIT;
    }
    word | (u32::from(opacity) << CTRL_OPACITY_SHIFT)
}

/// Decodes (format code, is-constant, is-source-over, opacity) from the
/// layer control word.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "the fields are masked to their widths before narrowing"
)]
pub const fn unpack_layer_ctrl(word: u32) -> (u8, bool, bool, u8) {
    (
        (word & CTRL_FORMAT_MASK) as u8,
        word & CTRL_CONSTANT_BIT != 0,
        word & CTRL_BLEND_BIT != 0,
        ((word >> CTRL_OPACITY_SHIFT) & 0xFF) as u8,
    )
}

const KEY_ENABLE_BIT: u32 = 1 << 0;
const KEY_MODE_OUTSIDE_BIT: u32 = 1 << 1;
const KEY_CH_SHIFT: u32 = 4;

/// Encodes the color-key control word; `None` disables keying.
#[must_use]
pub fn pack_key_ctrl(key: Option<&ColorKey>) -> u32 {
    let Some(key) = key else { return 0 };
    let mut word = KEY_ENABLE_BIT;
    if matches!(key.mode, ColorKeyMode::Outside) {
        word |= KEY_MODE_OUTSIDE_BIT;
    }
    for (ch, enabled) in (0_u32..).zip(key.enable) {
        if enabled {
            word |= 1 << (KEY_CH_SHIFT + ch);
        }
    }
    word
}

/// Is keying enabled in this control word?
#[must_use]
pub const fn key_enabled(word: u32) -> bool {
    word & KEY_ENABLE_BIT != 0
}

/// Packs three channel bytes as 0x00RRGGBB.
#[must_use]
pub const fn pack_channels(rgb: [u8; 3]) -> u32 {
    ((rgb[0] as u32) << 16) | ((rgb[1] as u32) << 8) | rgb[2] as u32
}

/// Encodes a Q16.16 matrix word for the register file.
#[must_use]
pub const fn matrix_word(coefficient: i32) -> u32 {
    coefficient.cast_unsigned()
}

/// Decodes a register word back into a Q16.16 coefficient.
#[must_use]
pub const fn coefficient(word: u32) -> i32 {
    word.cast_signed()
}
