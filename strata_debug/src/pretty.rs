// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per
//! event to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use strata_core::trace::{
    CompleteEvent, OpKind, SkipEvent, SkipReason, SubmitEvent, TimeoutEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }
}

pub(crate) fn op_name(op: OpKind) -> &'static str {
    match op {
        OpKind::Clear => "clear",
        OpKind::Scale => "scale",
        OpKind::Blit => "blit",
        OpKind::Blend => "blend",
        OpKind::Mask => "mask",
    }
}

fn skip_name(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::EmptyClip => "empty-clip",
        SkipReason::NoOverlap => "no-overlap",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_submit(&mut self, e: &SubmitEvent) {
        let _ = writeln!(
            self.writer,
            "[submit] {} inputs={} window={},{} {}x{} now={}µs",
            op_name(e.op),
            e.inputs,
            e.window.x,
            e.window.y,
            e.window.width,
            e.window.height,
            e.now_us,
        );
    }

    fn on_skip(&mut self, e: &SkipEvent) {
        let _ = writeln!(
            self.writer,
            "[skip] {} reason={}",
            op_name(e.op),
            skip_name(e.reason),
        );
    }

    fn on_complete(&mut self, e: &CompleteEvent) {
        let _ = writeln!(
            self.writer,
            "[done] {} polls={} elapsed={}µs",
            op_name(e.op),
            e.polls,
            e.elapsed_us,
        );
    }

    fn on_timeout(&mut self, e: &TimeoutEvent) {
        let _ = writeln!(
            self.writer,
            "[TIMEOUT] {} budget={}",
            op_name(e.op),
            e.budget,
        );
    }
}
