// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the operation pipeline.
//!
//! This module provides a [`TraceSink`] trait with per-event methods
//! that the driver calls around each hardware pass. All method bodies
//! default to no-ops, so implementing only the events you care about is
//! fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace`
//! feature is **off**, every `Tracer` method compiles to nothing (zero
//! overhead). When **on**, each method performs a single `Option` branch
//! before dispatching.
//!
//! Timestamps come from an optional monotonic microsecond clock the
//! driver is configured with; they are instrumentation only, never
//! correctness. Events carry 0 when no clock is installed.

use crate::geometry::Rect;

/// Which pipeline operation an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Solid fill.
    Clear,
    /// Ratio scale.
    Scale,
    /// Transform blit.
    Blit,
    /// Multi-layer blend.
    Blend,
    /// Constant-color mask.
    Mask,
}

/// Why an operation (or one of its passes) never reached hardware.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The clipped output window was empty.
    EmptyClip,
    /// No blend layer intersected the destination.
    NoOverlap,
}

/// Emitted when a validated pass is about to be written to hardware.
#[derive(Clone, Copy, Debug)]
pub struct SubmitEvent {
    /// The operation this pass belongs to.
    pub op: OpKind,
    /// Number of enabled input layers (1 or 2).
    pub inputs: u8,
    /// The output window committed to the result layer.
    pub window: Rect,
    /// Microsecond timestamp at submission, or 0 without a clock.
    pub now_us: u64,
}

/// Emitted when an operation completes as a documented no-op.
#[derive(Clone, Copy, Debug)]
pub struct SkipEvent {
    /// The operation that was skipped.
    pub op: OpKind,
    /// Why nothing was submitted.
    pub reason: SkipReason,
}

/// Emitted when the engine's run-state clears after a pass.
#[derive(Clone, Copy, Debug)]
pub struct CompleteEvent {
    /// The operation this pass belonged to.
    pub op: OpKind,
    /// Number of run-state polls before completion.
    pub polls: u32,
    /// Microseconds from trigger to completion, or 0 without a clock.
    pub elapsed_us: u64,
}

/// Emitted when the poll budget is exhausted before run-state clears.
#[derive(Clone, Copy, Debug)]
pub struct TimeoutEvent {
    /// The operation whose pass timed out.
    pub op: OpKind,
    /// The exhausted poll budget.
    pub budget: u32,
}

/// Receives pipeline events. All methods default to no-ops.
pub trait TraceSink {
    /// A validated pass is about to be written and triggered.
    fn on_submit(&mut self, event: &SubmitEvent) {
        let _ = event;
    }

    /// An operation finished without touching hardware.
    fn on_skip(&mut self, event: &SkipEvent) {
        let _ = event;
    }

    /// A pass ran to completion.
    fn on_complete(&mut self, event: &CompleteEvent) {
        let _ = event;
    }

    /// A pass exhausted the poll budget.
    fn on_timeout(&mut self, event: &TimeoutEvent) {
        let _ = event;
    }
}

/// Zero-overhead wrapper over an optional [`TraceSink`].
///
/// Without the `trace` feature the wrapper is a unit struct and every
/// method body compiles away.
#[derive(Default)]
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a ()>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        #[cfg(feature = "trace")]
        let enabled = self.sink.is_some();
        #[cfg(not(feature = "trace"))]
        let enabled = false;
        f.debug_struct("Tracer").field("enabled", &enabled).finish()
    }
}

impl<'a> Tracer<'a> {
    /// A tracer that drops every event.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// A tracer forwarding events to `sink`.
    ///
    /// Without the `trace` feature the sink is ignored.
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            let _ = sink;
            Self::default()
        }
    }

    /// Forwards a submit event.
    #[inline]
    pub fn submit(&mut self, event: &SubmitEvent) {
        #[cfg(feature = "trace")]
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.on_submit(event);
        }
        #[cfg(not(feature = "trace"))]
        let _ = event;
    }

    /// Forwards a skip event.
    #[inline]
    pub fn skip(&mut self, event: &SkipEvent) {
        #[cfg(feature = "trace")]
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.on_skip(event);
        }
        #[cfg(not(feature = "trace"))]
        let _ = event;
    }

    /// Forwards a complete event.
    #[inline]
    pub fn complete(&mut self, event: &CompleteEvent) {
        #[cfg(feature = "trace")]
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.on_complete(event);
        }
        #[cfg(not(feature = "trace"))]
        let _ = event;
    }

    /// Forwards a timeout event.
    #[inline]
    pub fn timeout(&mut self, event: &TimeoutEvent) {
        #[cfg(feature = "trace")]
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.on_timeout(event);
        }
        #[cfg(not(feature = "trace"))]
        let _ = event;
    }
}
