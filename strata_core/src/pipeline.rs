// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pipeline configuration: from operation requests to layer registers.
//!
//! The configurator maps a requested operation (clear, scale, blit with
//! transform, multi-layer blend, mask) plus surface descriptors into the
//! engine's layer model: one result layer and up to two input layers
//! (input 1 is the *backdrop* — the destination read back for blending;
//! input 2 is the source pixel stream). Every entry point follows the
//! same protocol:
//!
//! 1. Validate every descriptor; fail fast with a typed [`Error`].
//! 2. Build the forward transform, invert it (the hardware consumes the
//!    inverse — it maps each destination pixel back to a source sample
//!    location), and encode it as Q16.16 register words.
//! 3. Clip the destination window ([`transformed_bounds`] ∩ caller clip);
//!    an empty clip makes the whole operation a documented no-op that
//!    reports success without touching hardware.
//! 4. Select the result-layer tile size; a degenerate footprint is an
//!    error, never a silent clamp.
//! 5. Populate one [`PipelineConfig`] per hardware pass.
//!
//! A multi-layer blend repeats this per input layer independently and
//! yields one pass per contributing layer; the result layer covers the
//! full destination extents (conservative — over-covering the
//! destination wastes cycles but never under-writes).

use alloc::vec::Vec;

use crate::error::Error;
use crate::fixed::matrix_to_q16;
use crate::geometry::{Rect, select_tile_size, transformed_bounds};
use crate::matrix::Mat3;
use crate::surface::{ColorKey, FilterQuality, PixelFormat, Role, Surface, Window};

/// Largest coordinate representable in a hardware window register field.
pub const COORD_MAX: u32 = u16::MAX as u32;

/// How an input layer combines with the backdrop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMethod {
    /// The source fully overwrites the destination window; the
    /// destination is never read back.
    #[default]
    Bypass,
    /// Standard source-over alpha compositing against the destination.
    SourceOver,
}

/// Where an input layer's pixels come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelSource {
    /// DMA-fed from the surface's base address.
    Dma,
    /// A constant color; no memory is read.
    Constant,
}

/// Engine-facing projection of one input layer.
///
/// Owned by the configurator for the duration of one operation; written
/// into hardware registers and then abandoned (the hardware, not
/// software, retains the committed values until the next configuration).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerConfig {
    /// Source base address (0 for constant-color layers).
    pub addr: u32,
    /// Row pitch in bytes.
    pub line_length: u32,
    /// Source window in surface coordinates.
    pub window: Window,
    /// Pixel encoding of the source.
    pub format: PixelFormat,
    /// DMA-fed or constant-color.
    pub source: PixelSource,
    /// Blend method for this layer.
    pub blend: BlendMethod,
    /// Layer opacity, 0–255.
    pub opacity: u8,
    /// Constant color (0xAARRGGBB) for [`PixelSource::Constant`].
    pub color: u32,
    /// Color-key fields, copied verbatim from the descriptor.
    pub color_key: Option<ColorKey>,
    /// Interpolation quality hint.
    pub filter: FilterQuality,
    /// Inverse transform in Q16.16, row-major.
    pub matrix: [i32; 9],
}

/// Engine-facing projection of the result layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResultConfig {
    /// Destination base address.
    pub addr: u32,
    /// Row pitch in bytes.
    pub line_length: u32,
    /// Output window in destination coordinates.
    pub window: Rect,
    /// Pixel encoding of the destination.
    pub format: PixelFormat,
    /// Output tile size for the engine's cache-fill cycle.
    pub tile: (u32, u32),
}

/// One fully validated hardware pass: result layer, source input layer,
/// and the optional backdrop input layer.
///
/// The backdrop is present exactly when the source layer's blend method
/// is not [`BlendMethod::Bypass`]: any real blend needs the destination
/// read back as compositing input 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Result-layer registers.
    pub result: ResultConfig,
    /// Input-2 (source) registers.
    pub source: LayerConfig,
    /// Input-1 (backdrop) registers, when the blend reads the
    /// destination.
    pub backdrop: Option<LayerConfig>,
}

/// One input layer of a multi-layer blend request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendLayer {
    /// The source surface.
    pub surface: Surface,
    /// Destination-space translation applied to the layer.
    pub translation: (i32, i32),
    /// Optional destination-space clip for this layer.
    pub clip: Option<Rect>,
}

/// Maximum number of input layers accepted by [`configure_blend`].
pub const MAX_BLEND_LAYERS: usize = 4;

fn check_coord_range(s: &Surface) -> Result<(), Error> {
    if s.window.x_max > COORD_MAX || s.window.y_max > COORD_MAX {
        return Err(Error::OutOfRange);
    }
    if s.width > COORD_MAX + 1 || s.height > COORD_MAX + 1 {
        return Err(Error::OutOfRange);
    }
    Ok(())
}

fn window_rect(w: Window) -> Result<Rect, Error> {
    let width = w.x_max - w.x_min + 1;
    let height = w.y_max - w.y_min + 1;
    let x = i32::try_from(w.x_min).map_err(|_| Error::OutOfRange)?;
    let y = i32::try_from(w.y_min).map_err(|_| Error::OutOfRange)?;
    Ok(Rect::new(x, y, width, height))
}

#[expect(
    clippy::cast_sign_loss,
    reason = "rect coordinates are non-negative after destination clipping"
)]
fn rect_window(r: Rect) -> Window {
    Window {
        x_min: r.x as u32,
        x_max: r.x as u32 + r.width - 1,
        y_min: r.y as u32,
        y_max: r.y as u32 + r.height - 1,
    }
}

fn dst_bounds(dst: &Surface) -> Rect {
    Rect::new(0, 0, dst.width, dst.height)
}

/// Backdrop input layer: the destination read back over `window`.
fn backdrop_layer(dst: &Surface, window: Rect) -> LayerConfig {
    LayerConfig {
        addr: dst.addr,
        line_length: dst.line_length(),
        window: rect_window(window),
        format: dst.format,
        source: PixelSource::Dma,
        blend: BlendMethod::SourceOver,
        opacity: 255,
        color: 0,
        color_key: None,
        filter: FilterQuality::Nearest,
        matrix: matrix_to_q16(&Mat3::IDENTITY),
    }
}

/// Constant-color input layer covering `window` on the destination.
fn constant_layer(color: u32, window: Rect, blend: BlendMethod, format: PixelFormat) -> LayerConfig {
    LayerConfig {
        addr: 0,
        line_length: 0,
        window: rect_window(window),
        format,
        source: PixelSource::Constant,
        blend,
        opacity: 255,
        color,
        color_key: None,
        filter: FilterQuality::Nearest,
        matrix: matrix_to_q16(&Mat3::IDENTITY),
    }
}

fn result_config(dst: &Surface, window: Rect, xf: &Mat3) -> Result<ResultConfig, Error> {
    let tile = select_tile_size(xf, dst.format.bits()).ok_or(Error::InvalidMatrix)?;
    Ok(ResultConfig {
        addr: dst.addr,
        line_length: dst.line_length(),
        window,
        format: dst.format,
        tile,
    })
}

/// Configures a solid fill of `color` over `rect` (or the whole
/// destination window).
///
/// Returns `Ok(None)` when the clipped output is empty — nothing to do.
pub fn configure_clear(
    dst: &Surface,
    color: u32,
    rect: Option<Rect>,
) -> Result<Option<PipelineConfig>, Error> {
    fill_config(dst, color, rect, BlendMethod::Bypass)
}

/// Configures a mask pass: blends `color` over `rect` against the
/// destination (the alpha channel of `color` controls coverage).
///
/// Returns `Ok(None)` when `rect` is empty or falls outside the
/// destination window.
pub fn configure_mask(
    dst: &Surface,
    color: u32,
    rect: Rect,
) -> Result<Option<PipelineConfig>, Error> {
    fill_config(dst, color, Some(rect), BlendMethod::SourceOver)
}

fn fill_config(
    dst: &Surface,
    color: u32,
    rect: Option<Rect>,
    blend: BlendMethod,
) -> Result<Option<PipelineConfig>, Error> {
    dst.validate(Role::Destination)?;
    check_coord_range(dst)?;

    let writable = window_rect(dst.window)?;
    let window = match rect {
        Some(r) => match r.intersect(writable) {
            Some(w) => w,
            None => return Ok(None),
        },
        None => writable,
    };

    let result = result_config(dst, window, &Mat3::IDENTITY)?;
    let backdrop = (blend != BlendMethod::Bypass).then(|| backdrop_layer(dst, window));
    Ok(Some(PipelineConfig {
        result,
        source: constant_layer(color, window, blend, dst.format),
        backdrop,
    }))
}

/// Configures a scaled copy of `src` into `dst` by the given ratios.
///
/// Ratios must be positive and finite; the scaled image lands at the
/// source window's origin scaled by the same ratios. Returns `Ok(None)`
/// when the scaled window misses the destination entirely.
pub fn configure_scale(
    dst: &Surface,
    src: &Surface,
    x_ratio: f32,
    y_ratio: f32,
    rect: Option<Rect>,
) -> Result<Option<PipelineConfig>, Error> {
    if !(x_ratio.is_finite() && y_ratio.is_finite()) || x_ratio <= 0.0 || y_ratio <= 0.0 {
        return Err(Error::InvalidParameter);
    }
    let xf = Mat3::scaling(x_ratio, y_ratio);
    configure_blit(dst, src, &xf, rect, BlendMethod::Bypass)
}

/// Configures a blit of `src` into `dst` under an arbitrary projective
/// transform.
///
/// `xf` maps source coordinates forward into destination coordinates;
/// the hardware receives its inverse. Returns `Ok(None)` when the
/// transformed source window, intersected with `rect`, misses the
/// destination — a documented no-op.
pub fn configure_blit(
    dst: &Surface,
    src: &Surface,
    xf: &Mat3,
    rect: Option<Rect>,
    blend: BlendMethod,
) -> Result<Option<PipelineConfig>, Error> {
    dst.validate(Role::Destination)?;
    src.validate(Role::Source)?;
    check_coord_range(dst)?;
    check_coord_range(src)?;

    if !xf.is_finite() {
        return Err(Error::InvalidMatrix);
    }
    let inverse = xf.invert().ok_or(Error::InvalidMatrix)?;

    let src_rect = window_rect(src.window)?;
    let bounds = transformed_bounds(src_rect, xf, dst.width, dst.height);
    let window = match bounds {
        Some(b) => b,
        None => return Ok(None),
    };
    let window = match rect {
        Some(r) => match window.intersect(r) {
            Some(w) => w,
            None => return Ok(None),
        },
        None => window,
    };

    let result = result_config(dst, window, xf)?;
    let backdrop = (blend != BlendMethod::Bypass).then(|| backdrop_layer(dst, window));
    Ok(Some(PipelineConfig {
        result,
        source: LayerConfig {
            addr: src.addr,
            line_length: src.line_length(),
            window: src.window,
            format: src.format,
            source: PixelSource::Dma,
            blend,
            opacity: src.opacity,
            color: src.color,
            color_key: src.color_key,
            filter: src.filter,
            matrix: matrix_to_q16(&inverse),
        },
        backdrop,
    }))
}

/// Configures a multi-layer blend: one hardware pass per contributing
/// layer, in slice order (earlier layers composite first).
///
/// Each layer carries its own translation and clip and is clipped
/// against the destination exactly as a single-layer blit; a layer whose
/// translated bounds do not intersect the destination is skipped
/// entirely — not configured, not enabled. All layers skipped yields an
/// empty pass list: success, destination untouched.
pub fn configure_blend(dst: &Surface, layers: &[BlendLayer]) -> Result<Vec<PipelineConfig>, Error> {
    if layers.is_empty() || layers.len() > MAX_BLEND_LAYERS {
        return Err(Error::InvalidParameter);
    }
    dst.validate(Role::Destination)?;
    check_coord_range(dst)?;

    // Validate every layer before configuring any: a bad descriptor must
    // fail the whole call with no partial passes.
    for layer in layers {
        layer.surface.validate(Role::Source)?;
        check_coord_range(&layer.surface)?;
        let (tx, ty) = layer.translation;
        if tx.unsigned_abs() > COORD_MAX || ty.unsigned_abs() > COORD_MAX {
            return Err(Error::OutOfRange);
        }
    }

    let mut passes = Vec::new();
    for layer in layers {
        let (tx, ty) = layer.translation;
        #[expect(
            clippy::cast_precision_loss,
            reason = "translations fit the 16-bit register range checked above"
        )]
        let xf = Mat3::translation(tx as f32, ty as f32);
        let clip = match layer.clip {
            Some(r) => match r.intersect(dst_bounds(dst)) {
                Some(c) => Some(c),
                None => continue,
            },
            None => None,
        };
        if let Some(pass) =
            configure_blit(dst, &layer.surface, &xf, clip, BlendMethod::SourceOver)?
        {
            passes.push(pass);
        }
    }

    // The result layer is configured against the complete destination
    // extents rather than the union of per-layer footprints:
    // over-covering the destination wastes cycles but never under-writes.
    for pass in &mut passes {
        pass.result.window = dst_bounds(dst);
        if let Some(b) = &mut pass.backdrop {
            b.window = rect_window(dst_bounds(dst));
        }
    }

    Ok(passes)
}
