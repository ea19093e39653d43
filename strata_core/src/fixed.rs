// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Q16.16 fixed-point codec for hardware transform registers.
//!
//! The engine's transform registers are 32-bit signed words holding
//! matrix coefficients in Q16.16 format. Conversion is by multiplication
//! with 65536 and *truncation* toward zero — no rounding compensation.
//! Truncation is the defined, hardware-matching behavior, so a software
//! model of the engine reproduces register contents bit-exactly.

use crate::matrix::{MAT_EPSILON, Mat3};

use kurbo::common::FloatFuncs as _;

/// The Q16.16 representation of 1.0.
pub const ONE: i32 = 1 << 16;

/// Converts a coefficient to Q16.16, truncating toward zero.
#[inline]
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "truncation to the 32-bit register width is the defined hardware behavior"
)]
pub fn to_q16(value: f32) -> i32 {
    (value * 65536.0) as i32
}

/// Converts a Q16.16 register word back to a float.
#[inline]
#[must_use]
pub fn from_q16(word: i32) -> f32 {
    word as f32 / 65536.0
}

/// Encodes a matrix as nine Q16.16 register words, row-major.
#[must_use]
pub fn matrix_to_q16(m: &Mat3) -> [i32; 9] {
    let mut out = [0_i32; 9];
    for (i, row) in m.rows.iter().enumerate() {
        for (j, c) in row.iter().enumerate() {
            out[i * 3 + j] = to_q16(*c);
        }
    }
    out
}

/// Decodes nine row-major Q16.16 register words into a matrix.
#[must_use]
pub fn matrix_from_q16(words: &[i32; 9]) -> Mat3 {
    let mut rows = [[0.0_f32; 3]; 3];
    for (i, row) in rows.iter_mut().enumerate() {
        for (j, c) in row.iter_mut().enumerate() {
            *c = from_q16(words[i * 3 + j]);
        }
    }
    Mat3::from_rows(rows)
}

/// Lightweight pre-check that a matrix can be inverted before it is
/// encoded for hardware.
///
/// The pipeline itself rejects a degenerate matrix exactly once, through
/// [`Mat3::invert`] returning `None`; this check is for callers that
/// compose transforms up front and want to fail early.
#[inline]
#[must_use]
pub fn is_invertible(m: &Mat3) -> bool {
    m.determinant().abs() >= MAT_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_encoding() {
        let words = matrix_to_q16(&Mat3::IDENTITY);
        assert_eq!(words, [65536, 0, 0, 0, 65536, 0, 0, 0, 65536]);
    }

    #[test]
    fn truncates_toward_zero() {
        // 1.5 → 98304 exactly; 0.00001 * 65536 = 0.65536 → truncates to 0.
        assert_eq!(to_q16(1.5), 98304);
        assert_eq!(to_q16(0.00001), 0);
        assert_eq!(to_q16(-0.00001), 0);
        assert_eq!(to_q16(-1.5), -98304);
    }

    #[test]
    fn round_trip_within_lsb() {
        for v in [0.0_f32, 1.0, -3.75, 123.456, -0.001] {
            let back = from_q16(to_q16(v));
            assert!((back - v).abs() <= 1.0 / 65536.0 + 1e-6, "{v} -> {back}");
        }
    }

    #[test]
    fn invertibility_check() {
        assert!(is_invertible(&Mat3::IDENTITY));
        assert!(is_invertible(&Mat3::scaling(2.0, 0.5)));
        assert!(!is_invertible(&Mat3::scaling(0.0, 1.0)));
    }
}
