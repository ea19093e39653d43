// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface descriptors: the logical representation of a pixel buffer.
//!
//! A [`Surface`] describes one source or destination buffer for a single
//! pipeline call: base address (an opaque bus address — the driver never
//! dereferences it), geometry, pixel format, clip window, optional color
//! key, opacity, and interpolation hint. Descriptors are caller-owned
//! value types: constructed per call, validated at the start of every
//! operation, and discarded when the call returns. The hardware holds no
//! long-lived reference to them.

use crate::error::Error;

/// One of the engine's supported pixel encodings.
///
/// The discriminant doubles as the format code written into the layer
/// format register. [`bits`](Self::bits) is an exhaustive match kept in
/// lock-step with this enumeration — adding a variant without a bit
/// depth fails to compile rather than silently feeding zero into stride
/// arithmetic downstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
#[expect(missing_docs, reason = "variant names are the format spellings")]
pub enum PixelFormat {
    // 32 bpp packed.
    Argb8888 = 0x00,
    Abgr8888 = 0x01,
    Rgba8888 = 0x02,
    Bgra8888 = 0x03,
    Xrgb8888 = 0x04,
    Xbgr8888 = 0x05,
    Rgbx8888 = 0x06,
    Bgrx8888 = 0x07,
    // 24 bpp packed.
    Rgb888 = 0x10,
    Bgr888 = 0x11,
    Argb8565 = 0x12,
    Abgr8565 = 0x13,
    Rgba5658 = 0x14,
    Bgra5658 = 0x15,
    // 16 bpp packed.
    Rgb565 = 0x20,
    Bgr565 = 0x21,
    Argb1555 = 0x22,
    Abgr1555 = 0x23,
    Rgba5551 = 0x24,
    Bgra5551 = 0x25,
    Xrgb1555 = 0x26,
    Xbgr1555 = 0x27,
    Argb4444 = 0x28,
    Abgr4444 = 0x29,
    Rgba4444 = 0x2a,
    Bgra4444 = 0x2b,
    Xrgb4444 = 0x2c,
    Xbgr4444 = 0x2d,
    // 16 bpp legacy byte-swapped variants.
    Rgb565Swapped = 0x30,
    Bgr565Swapped = 0x31,
    Argb1555Swapped = 0x32,
    Abgr1555Swapped = 0x33,
    Argb4444Swapped = 0x34,
    Abgr4444Swapped = 0x35,
    Rgba4444Swapped = 0x36,
    Bgra4444Swapped = 0x37,
    // 8 bpp packed.
    Rgb332 = 0x40,
    Bgr332 = 0x41,
    Argb2222 = 0x42,
    Abgr2222 = 0x43,
    Rgba2222 = 0x44,
    Bgra2222 = 0x45,
    // 4 bpp packed.
    Argb1111 = 0x48,
    Abgr1111 = 0x49,
    Rgba1111 = 0x4a,
    Bgra1111 = 0x4b,
    // Alpha-only.
    A8 = 0x50,
    A4 = 0x51,
    A2 = 0x52,
    A1 = 0x53,
    // Indexed (palette lookup happens in the engine).
    I8 = 0x58,
    I4 = 0x59,
    I2 = 0x5a,
    I1 = 0x5b,
}

impl PixelFormat {
    /// Bits per pixel.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Argb8888
            | Self::Abgr8888
            | Self::Rgba8888
            | Self::Bgra8888
            | Self::Xrgb8888
            | Self::Xbgr8888
            | Self::Rgbx8888
            | Self::Bgrx8888 => 32,
            Self::Rgb888
            | Self::Bgr888
            | Self::Argb8565
            | Self::Abgr8565
            | Self::Rgba5658
            | Self::Bgra5658 => 24,
            Self::Rgb565
            | Self::Bgr565
            | Self::Argb1555
            | Self::Abgr1555
            | Self::Rgba5551
            | Self::Bgra5551
            | Self::Xrgb1555
            | Self::Xbgr1555
            | Self::Argb4444
            | Self::Abgr4444
            | Self::Rgba4444
            | Self::Bgra4444
            | Self::Xrgb4444
            | Self::Xbgr4444
            | Self::Rgb565Swapped
            | Self::Bgr565Swapped
            | Self::Argb1555Swapped
            | Self::Abgr1555Swapped
            | Self::Argb4444Swapped
            | Self::Abgr4444Swapped
            | Self::Rgba4444Swapped
            | Self::Bgra4444Swapped => 16,
            Self::Rgb332
            | Self::Bgr332
            | Self::Argb2222
            | Self::Abgr2222
            | Self::Rgba2222
            | Self::Bgra2222
            | Self::A8
            | Self::I8 => 8,
            Self::Argb1111 | Self::Abgr1111 | Self::Rgba1111 | Self::Bgra1111 => 4,
            Self::A4 | Self::I4 => 4,
            Self::A2 | Self::I2 => 2,
            Self::A1 | Self::I1 => 1,
        }
    }

    /// Natural base-address alignment in bytes: word alignment for
    /// 32-bit formats, byte alignment otherwise.
    #[inline]
    #[must_use]
    pub const fn align_bytes(self) -> u32 {
        if self.bits() >= 32 { 4 } else { 1 }
    }

    /// Is this a palette-indexed format?
    #[inline]
    #[must_use]
    pub const fn is_indexed(self) -> bool {
        matches!(self, Self::I8 | Self::I4 | Self::I2 | Self::I1)
    }

    /// Is this an alpha-only format?
    #[inline]
    #[must_use]
    pub const fn is_alpha_only(self) -> bool {
        matches!(self, Self::A8 | Self::A4 | Self::A2 | Self::A1)
    }

    /// The register format code for this format.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Which side of an operation a surface plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// The surface is read by an input layer.
    Source,
    /// The surface is written by the result layer.
    Destination,
}

/// Inclusive per-surface clip window, in surface coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Window {
    /// Leftmost included column.
    pub x_min: u32,
    /// Rightmost included column.
    pub x_max: u32,
    /// Topmost included row.
    pub y_min: u32,
    /// Bottommost included row.
    pub y_max: u32,
}

impl Window {
    /// A window covering a full `width` × `height` surface.
    #[must_use]
    pub const fn full(width: u32, height: u32) -> Self {
        Self {
            x_min: 0,
            x_max: width.saturating_sub(1),
            y_min: 0,
            y_max: height.saturating_sub(1),
        }
    }

    /// Max ≥ min on both axes?
    #[inline]
    #[must_use]
    pub const fn is_ordered(self) -> bool {
        self.x_max >= self.x_min && self.y_max >= self.y_min
    }
}

/// Whether pixels matching the key range are kept or discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorKeyMode {
    /// Pixels whose channels fall inside the range are replaced.
    Inside,
    /// Pixels whose channels fall outside the range are replaced.
    Outside,
}

/// Per-channel color-key range test applied during compositing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorKey {
    /// Per-channel (R, G, B) test enables.
    pub enable: [bool; 3],
    /// Per-channel range minimum.
    pub min: [u8; 3],
    /// Per-channel range maximum.
    pub max: [u8; 3],
    /// Inside/outside interpretation of the range.
    pub mode: ColorKeyMode,
    /// Replacement color for matched pixels, packed 0xAARRGGBB.
    pub replacement: u32,
}

/// Interpolation quality hint for scaled or transformed sampling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterQuality {
    /// Nearest-neighbor sampling.
    #[default]
    Nearest,
    /// Bilinear interpolation.
    Bilinear,
}

/// A logical pixel surface handed to the pipeline for one call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surface {
    /// Base bus address. Opaque to the driver; only written to layer
    /// address registers. Zero denotes "no backing memory" and is only
    /// legal for constant-color fills.
    pub addr: u32,
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Row pitch in pixels; may exceed `width` for padded buffers.
    pub stride: u32,
    /// Pixel encoding.
    pub format: PixelFormat,
    /// Constant color (0xAARRGGBB) for solid-fill layers.
    pub color: u32,
    /// Clip window within the surface.
    pub window: Window,
    /// Optional color-key configuration.
    pub color_key: Option<ColorKey>,
    /// Layer opacity, 0 (transparent) to 255 (opaque).
    pub opacity: u8,
    /// Interpolation quality hint.
    pub filter: FilterQuality,
}

impl Surface {
    /// Creates a surface covering a full buffer with default compositing
    /// attributes (opaque, no color key, nearest sampling).
    #[must_use]
    pub const fn new(addr: u32, width: u32, height: u32, stride: u32, format: PixelFormat) -> Self {
        Self {
            addr,
            width,
            height,
            stride,
            format,
            color: 0,
            window: Window::full(width, height),
            color_key: None,
            opacity: 255,
            filter: FilterQuality::Nearest,
        }
    }

    /// Line length in bytes: stride × bits-per-pixel / 8.
    #[inline]
    #[must_use]
    pub const fn line_length(&self) -> u32 {
        self.stride * self.format.bits() / 8
    }

    /// Validates the descriptor for the given role.
    ///
    /// Rejects a null address ([`Error::NullSource`] /
    /// [`Error::NullTarget`] by role), an inverted clip window
    /// ([`Error::InvalidParameter`]), a stride narrower than the surface,
    /// and a base address not meeting the format's natural alignment
    /// ([`Error::AddressNotAligned`]).
    pub fn validate(&self, role: Role) -> Result<(), Error> {
        if self.addr == 0 {
            return Err(match role {
                Role::Source => Error::NullSource,
                Role::Destination => Error::NullTarget,
            });
        }
        if !self.window.is_ordered() || self.width == 0 || self.height == 0 {
            return Err(Error::InvalidParameter);
        }
        if self.stride < self.width {
            return Err(Error::InvalidParameter);
        }
        if !self.addr.is_multiple_of(self.format.align_bytes()) {
            return Err(Error::AddressNotAligned);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_depths() {
        assert_eq!(PixelFormat::Argb8888.bits(), 32);
        assert_eq!(PixelFormat::Rgb888.bits(), 24);
        assert_eq!(PixelFormat::Argb8565.bits(), 24);
        assert_eq!(PixelFormat::Rgb565Swapped.bits(), 16);
        assert_eq!(PixelFormat::Rgb332.bits(), 8);
        assert_eq!(PixelFormat::Argb1111.bits(), 4);
        assert_eq!(PixelFormat::A2.bits(), 2);
        assert_eq!(PixelFormat::I1.bits(), 1);
    }

    #[test]
    fn alignment_follows_depth() {
        assert_eq!(PixelFormat::Xrgb8888.align_bytes(), 4);
        assert_eq!(PixelFormat::Rgb565.align_bytes(), 1);
        assert_eq!(PixelFormat::A1.align_bytes(), 1);
    }

    #[test]
    fn format_classes() {
        assert!(PixelFormat::I4.is_indexed());
        assert!(!PixelFormat::A4.is_indexed());
        assert!(PixelFormat::A4.is_alpha_only());
        assert!(!PixelFormat::Bgra8888.is_alpha_only());
    }

    #[test]
    fn line_length_uses_stride_not_width() {
        let s = Surface::new(0x4000, 100, 50, 128, PixelFormat::Rgb565);
        assert_eq!(s.line_length(), 256);
    }

    #[test]
    fn validate_null_address_by_role() {
        let s = Surface::new(0, 10, 10, 10, PixelFormat::Argb8888);
        assert_eq!(s.validate(Role::Source), Err(Error::NullSource));
        assert_eq!(s.validate(Role::Destination), Err(Error::NullTarget));
    }

    #[test]
    fn validate_inverted_window() {
        let mut s = Surface::new(0x1000, 10, 10, 10, PixelFormat::Argb8888);
        s.window.x_min = 8;
        s.window.x_max = 2;
        assert_eq!(s.validate(Role::Source), Err(Error::InvalidParameter));
    }

    #[test]
    fn validate_misaligned_word_format() {
        let s = Surface::new(0x1002, 10, 10, 10, PixelFormat::Argb8888);
        assert_eq!(s.validate(Role::Source), Err(Error::AddressNotAligned));
        // Narrow formats carry no word-alignment requirement.
        let narrow = Surface::new(0x1002, 10, 10, 10, PixelFormat::Rgb565);
        assert_eq!(narrow.validate(Role::Source), Ok(()));
    }

    #[test]
    fn validate_narrow_stride() {
        let s = Surface::new(0x1000, 100, 10, 64, PixelFormat::A8);
        assert_eq!(s.validate(Role::Source), Err(Error::InvalidParameter));
    }

    #[test]
    fn full_window_covers_surface() {
        let w = Window::full(640, 480);
        assert_eq!(w.x_max, 639);
        assert_eq!(w.y_max, 479);
        assert!(w.is_ordered());
    }
}
