// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 3×3 projective transform algebra.
//!
//! [`Mat3`] covers the transform math the compositing engine actually
//! needs (elementary builders, multiplication, cofactor inversion, and a
//! four-point homography solver) without pulling in a full linear-algebra
//! crate.
//!
//! Transforms are composed by post-concatenation: `m.translated(x, y)`
//! returns `m * T(x, y)`, so effects are issued most-local-first, in the
//! order they should apply to source coordinates.

use core::ops::Mul;

use kurbo::Point;
use kurbo::common::FloatFuncs as _;

/// Determinant magnitude below which a matrix is treated as singular.
pub const MAT_EPSILON: f32 = 1e-6;

/// Pivot magnitude below which Gaussian elimination reports a degenerate
/// point configuration.
pub const PIVOT_EPSILON: f32 = f32::EPSILON;

/// A row-major 3×3 projective 2-D transform stored as `[[f32; 3]; 3]`.
///
/// Row-major order matches the hardware transform register layout: the
/// nine Q16.16 register words are the rows of this matrix, top to bottom
/// (see [`crate::fixed::matrix_to_q16`]).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat3 {
    /// Three rows, each a 3-element array.
    pub rows: [[f32; 3]; 3],
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat3 {
    /// The 3×3 identity matrix.
    pub const IDENTITY: Self = Self {
        rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Creates a matrix from three row arrays.
    #[inline]
    #[must_use]
    pub const fn from_rows(rows: [[f32; 3]; 3]) -> Self {
        Self { rows }
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn translation(x: f32, y: f32) -> Self {
        Self {
            rows: [[1.0, 0.0, x], [0.0, 1.0, y], [0.0, 0.0, 1.0]],
        }
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn scaling(sx: f32, sy: f32) -> Self {
        Self {
            rows: [[sx, 0.0, 0.0], [0.0, sy, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Creates a counter-clockwise rotation transform (degrees).
    #[must_use]
    pub fn rotation_degrees(degrees: f32) -> Self {
        let r = degrees.to_radians();
        let (s, c) = (r.sin(), r.cos());
        Self {
            rows: [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Creates a perspective transform with the given homogeneous row
    /// coefficients.
    #[inline]
    #[must_use]
    pub const fn perspective(px: f32, py: f32) -> Self {
        Self {
            rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [px, py, 1.0]],
        }
    }

    /// Post-concatenates a translation: `self * T(x, y)`.
    #[inline]
    #[must_use]
    pub fn translated(self, x: f32, y: f32) -> Self {
        self * Self::translation(x, y)
    }

    /// Post-concatenates a scale: `self * S(sx, sy)`.
    #[inline]
    #[must_use]
    pub fn scaled(self, sx: f32, sy: f32) -> Self {
        self * Self::scaling(sx, sy)
    }

    /// Post-concatenates a rotation: `self * R(degrees)`.
    #[inline]
    #[must_use]
    pub fn rotated_degrees(self, degrees: f32) -> Self {
        self * Self::rotation_degrees(degrees)
    }

    /// Post-concatenates a perspective row: `self * P(px, py)`.
    #[inline]
    #[must_use]
    pub fn perspected(self, px: f32, py: f32) -> Self {
        self * Self::perspective(px, py)
    }

    /// Returns the determinant by cofactor expansion along the first row.
    #[must_use]
    pub fn determinant(&self) -> f32 {
        let m = &self.rows;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Returns the adjugate/determinant inverse, or `None` when the
    /// determinant magnitude is below [`MAT_EPSILON`].
    #[must_use]
    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < MAT_EPSILON {
            return None;
        }
        let m = &self.rows;
        let inv_det = 1.0 / det;
        // Adjugate: transposed cofactor matrix.
        let rows = [
            [
                (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
                (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
                (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
            ],
            [
                (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
                (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
                (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
            ],
            [
                (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
                (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
                (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
            ],
        ];
        Some(Self { rows })
    }

    /// Applies the transform to a point, including the homogeneous divide.
    ///
    /// A degenerate transform can produce non-finite coordinates here;
    /// downstream geometry treats those as empty results rather than
    /// propagating them into hardware windows.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "matrix coefficients are f32 by definition; point narrowing is intentional"
    )]
    pub fn apply(&self, p: Point) -> Point {
        let (x, y) = (p.x as f32, p.y as f32);
        let m = &self.rows;
        let w = m[2][0] * x + m[2][1] * y + m[2][2];
        let tx = (m[0][0] * x + m[0][1] * y + m[0][2]) / w;
        let ty = (m[1][0] * x + m[1][1] * y + m[1][2]) / w;
        Point::new(f64::from(tx), f64::from(ty))
    }

    /// Are all nine coefficients [finite](f32::is_finite)?
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.rows
            .iter()
            .all(|row| row.iter().all(|c| c.is_finite()))
    }
}

impl Mul for Mat3 {
    type Output = Self;

    /// Textbook 3×3 row/column dot product.
    fn mul(self, rhs: Self) -> Self {
        let mut out = [[0.0_f32; 3]; 3];
        for (i, out_row) in out.iter_mut().enumerate() {
            for (j, out_c) in out_row.iter_mut().enumerate() {
                let mut acc = 0.0;
                for (k, rhs_row) in rhs.rows.iter().enumerate() {
                    acc += self.rows[i][k] * rhs_row[j];
                }
                *out_c = acc;
            }
        }
        Self { rows: out }
    }
}

/// Solves for the projective transform mapping four source points to four
/// destination points.
///
/// Builds the 8×8 linear system (two equations per correspondence, the
/// ninth homogeneous coefficient fixed to 1) and solves it by Gaussian
/// elimination with partial pivoting. Returns `None` when any pivot
/// magnitude falls below [`PIVOT_EPSILON`], which indicates a degenerate
/// or collinear point configuration.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "the solver operates at the matrix's f32 precision"
)]
pub fn solve_homography(src: &[Point; 4], dst: &[Point; 4]) -> Option<Mat3> {
    // Augmented 8×9 system: rows are
    //   [x, y, 1, 0, 0, 0, -x·u, -y·u | u]
    //   [0, 0, 0, x, y, 1, -x·v, -y·v | v]
    let mut sys = [[0.0_f32; 9]; 8];
    for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
        let (x, y) = (s.x as f32, s.y as f32);
        let (u, v) = (d.x as f32, d.y as f32);
        sys[i * 2] = [x, y, 1.0, 0.0, 0.0, 0.0, -x * u, -y * u, u];
        sys[i * 2 + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -x * v, -y * v, v];
    }

    for col in 0..8 {
        // Partial pivoting: bring the row with the largest magnitude in
        // this column to the top to bound numerical error.
        let mut pivot_row = col;
        for row in col + 1..8 {
            if sys[row][col].abs() > sys[pivot_row][col].abs() {
                pivot_row = row;
            }
        }
        if sys[pivot_row][col].abs() < PIVOT_EPSILON {
            return None;
        }
        sys.swap(col, pivot_row);

        let pivot = sys[col][col];
        for row in col + 1..8 {
            let factor = sys[row][col] / pivot;
            for k in col..9 {
                sys[row][k] -= factor * sys[col][k];
            }
        }
    }

    // Back-substitution.
    let mut coef = [0.0_f32; 8];
    for col in (0..8).rev() {
        let mut acc = sys[col][8];
        for k in col + 1..8 {
            acc -= sys[col][k] * coef[k];
        }
        coef[col] = acc / sys[col][col];
    }

    Some(Mat3::from_rows([
        [coef[0], coef[1], coef[2]],
        [coef[3], coef[4], coef[5]],
        [coef[6], coef[7], 1.0],
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &Mat3, b: &Mat3, eps: f32) {
        for i in 0..3 {
            for j in 0..3 {
                assert!(
                    (a.rows[i][j] - b.rows[i][j]).abs() < eps,
                    "mismatch at ({i}, {j}): {} vs {}",
                    a.rows[i][j],
                    b.rows[i][j],
                );
            }
        }
    }

    #[test]
    fn default_is_identity() {
        assert_eq!(Mat3::default(), Mat3::IDENTITY);
    }

    #[test]
    fn identity_is_two_sided_unit() {
        let m = Mat3::translation(3.0, -2.0).rotated_degrees(30.0);
        assert_eq!(Mat3::IDENTITY * m, m);
        assert_eq!(m * Mat3::IDENTITY, m);
    }

    #[test]
    fn translation_composition() {
        let m = Mat3::IDENTITY.translated(1.0, 0.0).translated(0.0, 2.0);
        assert_eq!(m.rows[0][2], 1.0);
        assert_eq!(m.rows[1][2], 2.0);
    }

    #[test]
    fn rotation_ninety_degrees() {
        let r = Mat3::rotation_degrees(90.0);
        let p = r.apply(Point::new(1.0, 0.0));
        assert!((p.x - 0.0).abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn invert_round_trips() {
        let m = Mat3::translation(5.0, 7.0)
            .scaled(2.0, 0.5)
            .rotated_degrees(42.0)
            .perspected(0.001, -0.002);
        let back = m.invert().unwrap().invert().unwrap();
        assert_close(&m, &back, 1e-3);
    }

    #[test]
    fn invert_times_forward_is_identity() {
        let m = Mat3::scaling(3.0, 4.0).translated(10.0, -6.0);
        let prod = m * m.invert().unwrap();
        assert_close(&prod, &Mat3::IDENTITY, 1e-4);
    }

    #[test]
    fn singular_matrix_fails_to_invert() {
        let m = Mat3::scaling(0.0, 1.0);
        assert!(m.invert().is_none());
    }

    #[test]
    fn apply_homogeneous_divide() {
        let m = Mat3::perspective(0.0, 0.01);
        // At y = 100 the homogeneous coordinate is 2, halving both axes.
        let p = m.apply(Point::new(50.0, 100.0));
        assert!((p.x - 25.0).abs() < 1e-3);
        assert!((p.y - 50.0).abs() < 1e-3);
    }

    #[test]
    fn homography_unit_square_identity() {
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        let h = solve_homography(&corners, &corners).unwrap();
        assert_close(&h, &Mat3::IDENTITY, 1e-4);
    }

    #[test]
    fn homography_maps_correspondences() {
        let src = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let dst = [
            Point::new(2.0, 1.0),
            Point::new(14.0, 3.0),
            Point::new(12.0, 15.0),
            Point::new(1.0, 12.0),
        ];
        let h = solve_homography(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(dst.iter()) {
            let p = h.apply(*s);
            assert!((p.x - d.x).abs() < 1e-2, "{p:?} vs {d:?}");
            assert!((p.y - d.y).abs() < 1e-2, "{p:?} vs {d:?}");
        }
    }

    #[test]
    fn homography_collinear_points_rejected() {
        // All four source points on one line.
        let src = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
            Point::new(3.0, 3.0),
        ];
        let dst = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        assert!(solve_homography(&src, &dst).is_none());
    }

    #[test]
    fn non_finite_detected() {
        let mut m = Mat3::IDENTITY;
        m.rows[1][2] = f32::NAN;
        assert!(!m.is_finite());
        m.rows[1][2] = f32::INFINITY;
        assert!(!m.is_finite());
        assert!(Mat3::IDENTITY.is_finite());
    }
}
