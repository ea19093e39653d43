// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle clipping and transform-aware footprint math.
//!
//! Every operation is clipped against destination bounds *before* any
//! register is written, so the hardware only ever sees windows that lie
//! inside the target surface. Corner math runs in float space
//! ([`kurbo::Point`]) and is clamped back to integer windows at the end.
//!
//! A rect with zero width or height denotes "empty"; empty inputs make
//! every operation a no-op that reports success, distinguishing "nothing
//! to do" from "failed".

use kurbo::Point;
use kurbo::common::FloatFuncs as _;

use crate::matrix::Mat3;

/// An axis-aligned integer rectangle: origin plus extent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Extent along x; 0 denotes empty.
    pub width: u32,
    /// Extent along y; 0 denotes empty.
    pub height: u32,
}

impl Rect {
    /// Creates a rect from origin and extent.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Does this rect cover zero pixels?
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge.
    #[inline]
    #[must_use]
    pub const fn right(self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Exclusive bottom edge.
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Intersects two rects: component-wise max of the origins, min of the
    /// far corners. Returns `None` when the rects do not overlap (or when
    /// either is empty).
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "edges are clamped back inside i32/u32 range before narrowing"
    )]
    pub fn intersect(self, other: Self) -> Option<Self> {
        if self.is_empty() || other.is_empty() {
            return None;
        }
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= i64::from(x0) || y1 <= i64::from(y0) {
            return None;
        }
        Some(Self {
            x: x0,
            y: y0,
            width: (x1 - i64::from(x0)) as u32,
            height: (y1 - i64::from(y0)) as u32,
        })
    }

    /// The four corners in float space, clockwise from the origin. The
    /// far corners are exclusive edges.
    #[must_use]
    pub fn corners(self) -> [Point; 4] {
        let (x0, y0) = (f64::from(self.x), f64::from(self.y));
        let (x1, y1) = (self.right() as f64, self.bottom() as f64);
        [
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }
}

/// Forward-transforms `src` and returns its axis-aligned bounding box
/// clamped to a `dst_width` × `dst_height` destination surface.
///
/// All four corners go through `xf` (with the homogeneous divide); the
/// result is the integer bounding box of the transformed points, clipped
/// to the destination. Returns `None` when the box lies entirely outside
/// the destination, when `src` is empty, or when any transformed
/// coordinate is NaN. A non-invertible transform must be caught upstream;
/// the NaN check only defends against residual propagation.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "edges are clamped to the destination extent before narrowing"
)]
pub fn transformed_bounds(src: Rect, xf: &Mat3, dst_width: u32, dst_height: u32) -> Option<Rect> {
    if src.is_empty() || dst_width == 0 || dst_height == 0 {
        return None;
    }

    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for corner in src.corners() {
        let p = xf.apply(corner);
        if p.x.is_nan() || p.y.is_nan() {
            return None;
        }
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let x0 = min_x.floor().max(0.0);
    let y0 = min_y.floor().max(0.0);
    let x1 = max_x.ceil().min(f64::from(dst_width));
    let y1 = max_y.ceil().min(f64::from(dst_height));
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Rect {
        x: x0 as i32,
        y: y0 as i32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    })
}

/// Base tile extents for a pixel depth, or `None` for an unsupported
/// depth.
///
/// The engine's internal cache line holds a fixed 256-byte budget per
/// tile fill, so narrower formats get proportionally larger tiles:
/// 8×8 at 32 bpp up to 64×32 at 1 bpp.
#[must_use]
pub const fn base_tile(bits_per_pixel: u32) -> Option<(u32, u32)> {
    match bits_per_pixel {
        32 | 24 => Some((8, 8)),
        16 => Some((16, 8)),
        8 => Some((16, 16)),
        4 => Some((32, 16)),
        2 => Some((32, 32)),
        1 => Some((64, 32)),
        _ => None,
    }
}

/// Selects the hardware output tile size for a transform and pixel depth.
///
/// Starts from [`base_tile`], forward-transforms the tile's corners, and
/// returns the ceil/floor-bounded integer extent of the footprint in
/// destination space. Returns `None` when the depth is unsupported or
/// the footprint collapses to zero width or height — a collapsed tile
/// indicates an unusable transform/tile combination and is reported, not
/// silently clamped.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "tile extents are small positive integers after the zero check"
)]
pub fn select_tile_size(xf: &Mat3, bits_per_pixel: u32) -> Option<(u32, u32)> {
    let (bw, bh) = base_tile(bits_per_pixel)?;

    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for corner in Rect::new(0, 0, bw, bh).corners() {
        let p = xf.apply(corner);
        if p.x.is_nan() || p.y.is_nan() {
            return None;
        }
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let w = max_x.ceil() - min_x.floor();
    let h = max_y.ceil() - min_y.floor();
    if w < 1.0 || h < 1.0 {
        return None;
    }
    Some((w as u32, h as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_commutative_and_idempotent() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(a.intersect(b), b.intersect(a));
        assert_eq!(a.intersect(b), Some(Rect::new(5, 5, 5, 5)));
        assert_eq!(a.intersect(a), Some(a));
    }

    #[test]
    fn intersect_disjoint_is_none() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 20, 5, 5);
        assert_eq!(a.intersect(b), None);
        // Touching edges share no pixels.
        let c = Rect::new(10, 0, 5, 5);
        assert_eq!(a.intersect(c), None);
    }

    #[test]
    fn intersect_empty_is_none() {
        let a = Rect::new(0, 0, 10, 10);
        assert_eq!(a.intersect(Rect::new(2, 2, 0, 5)), None);
        assert_eq!(Rect::default().intersect(a), None);
    }

    #[test]
    fn intersect_negative_origins() {
        let a = Rect::new(-5, -5, 10, 10);
        let b = Rect::new(-2, -20, 4, 40);
        assert_eq!(a.intersect(b), Some(Rect::new(-2, -5, 4, 10)));
    }

    #[test]
    fn identity_bounds_pass_through() {
        let src = Rect::new(5, 5, 10, 10);
        let out = transformed_bounds(src, &Mat3::IDENTITY, 100, 100);
        assert_eq!(out, Some(src));
    }

    #[test]
    fn bounds_clamped_to_destination() {
        let src = Rect::new(-10, 90, 30, 30);
        let out = transformed_bounds(src, &Mat3::IDENTITY, 100, 100);
        assert_eq!(out, Some(Rect::new(0, 90, 20, 10)));
    }

    #[test]
    fn bounds_outside_destination_is_none() {
        let src = Rect::new(0, 0, 10, 10);
        let xf = Mat3::translation(500.0, 0.0);
        assert_eq!(transformed_bounds(src, &xf, 100, 100), None);
        let behind = Mat3::translation(-50.0, 0.0);
        assert_eq!(transformed_bounds(src, &behind, 100, 100), None);
    }

    #[test]
    fn bounds_under_rotation_cover_the_rotated_box() {
        let src = Rect::new(0, 0, 10, 10);
        // Rotate about the origin by 90° and shift back into view.
        let xf = Mat3::translation(10.0, 0.0).rotated_degrees(90.0);
        let out = transformed_bounds(src, &xf, 100, 100).unwrap();
        assert_eq!(out, Rect::new(0, 0, 10, 10));
    }

    #[test]
    fn nan_transform_is_none() {
        let mut xf = Mat3::IDENTITY;
        xf.rows[0][0] = f32::NAN;
        assert_eq!(transformed_bounds(Rect::new(0, 0, 4, 4), &xf, 64, 64), None);
    }

    #[test]
    fn base_tiles_fit_the_cache_budget() {
        for bpp in [1_u32, 2, 4, 8, 16, 32] {
            let (w, h) = base_tile(bpp).unwrap();
            assert_eq!(w * h * bpp / 8, 256, "bpp {bpp}");
        }
        // 24 bpp shares the 32 bpp tile and underfills the line.
        assert_eq!(base_tile(24), Some((8, 8)));
        assert_eq!(base_tile(12), None);
    }

    #[test]
    fn tile_size_identity() {
        assert_eq!(select_tile_size(&Mat3::IDENTITY, 32), Some((8, 8)));
        assert_eq!(select_tile_size(&Mat3::IDENTITY, 1), Some((64, 32)));
    }

    #[test]
    fn tile_size_scales_with_transform() {
        let xf = Mat3::scaling(2.0, 0.5);
        assert_eq!(select_tile_size(&xf, 32), Some((16, 4)));
    }

    #[test]
    fn tile_size_never_zero_for_invertible_transforms() {
        let transforms = [
            Mat3::IDENTITY,
            Mat3::scaling(0.01, 0.01),
            Mat3::rotation_degrees(33.0),
            Mat3::translation(1000.0, -1000.0),
            Mat3::perspective(0.0005, 0.0005),
        ];
        for xf in transforms {
            assert!(xf.invert().is_some());
            let (w, h) = select_tile_size(&xf, 16).unwrap();
            assert!(w >= 1 && h >= 1);
        }
    }

    #[test]
    fn degenerate_tile_reported() {
        // Collapses every tile onto the x axis.
        let flat = Mat3::scaling(1.0, 0.0);
        assert_eq!(select_tile_size(&flat, 32), None);
    }
}
