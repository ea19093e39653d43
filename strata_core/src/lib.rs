// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Driver core for a fixed-function 2-D compositing engine.
//!
//! `strata_core` turns high-level blit/scale/rotate/blend requests
//! between pixel surfaces into fully configured, triggered, and
//! polled-to-completion hardware raster operations. It is `no_std`
//! compatible (with `alloc`); the hardware itself sits behind the
//! [`CompositingEngine`](engine::CompositingEngine) trait, with one
//! implementation per engine generation.
//!
//! # Architecture
//!
//! An operation flows through the pipeline like this:
//!
//! ```text
//!   Surface descriptors + transform parameters
//!       │  validate (surface)
//!       ▼
//!   Mat3 build → invert → Q16.16 encode      (matrix, fixed)
//!       │
//!       ▼
//!   clip: transformed_bounds ∩ caller rect    (geometry)
//!       │  empty → documented no-op, Ok(())
//!       ▼
//!   LayerConfig / ResultConfig per pass       (pipeline)
//!       │
//!       ▼
//!   Driver: gate → write → enable → trigger → poll   (engine)
//! ```
//!
//! **[`matrix`]** — 3×3 projective transform algebra: elementary
//! builders, multiplication, cofactor inversion, and a four-point
//! homography solver with partial pivoting.
//!
//! **[`fixed`]** — Q16.16 codec for the hardware transform registers.
//!
//! **[`geometry`]** — rect intersection, transformed bounding boxes,
//! and cache-aware output tile selection.
//!
//! **[`surface`]** — pixel-format enumeration and the caller-facing
//! surface descriptor with its validation rules.
//!
//! **[`pipeline`]** — maps the five operations (clear, scale, blit,
//! blend, mask) onto the engine's layer-register model.
//!
//! **[`engine`]** — the [`CompositingEngine`](engine::CompositingEngine)
//! hardware boundary and the [`Driver`](engine::Driver) state machine
//! that owns it exclusively.
//!
//! **[`error`]** — the typed error taxonomy; caller-input errors are
//! always detected before any register write.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event
//! types for pipeline instrumentation, with the zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one
//!   branch per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod engine;
pub mod error;
pub mod fixed;
pub mod geometry;
pub mod matrix;
pub mod pipeline;
pub mod surface;
pub mod trace;
