// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Execution controller: the exclusive owner of one compositing engine.
//!
//! [`CompositingEngine`] is the hardware boundary. One implementation
//! exists per hardware generation (register layouts differ between
//! chips; the shared matrix/geometry/configurator code above this trait
//! does not), selected when the [`Driver`] is constructed. The workspace
//! ships a simulated implementation for tests and development.
//!
//! [`Driver`] owns its engine exclusively and runs the state machine
//! `Idle → Configuring → Running → Idle` per pass: assert the clock
//! gate, write all layer registers, enable the participating inputs,
//! trigger, and poll run-state back to zero. Exclusive access is
//! expressed through `&mut self` — callers that share a driver across
//! threads wrap it in their own lock, which also serializes submissions
//! and preserves completion-in-submission-order.
//!
//! Completion is polled synchronously. The reference hardware has no
//! documented recovery path if the engine wedges mid-operation, so the
//! driver bounds the poll loop (default one million polls) and surfaces
//! [`Error::HardwareTimeout`]; [`Driver::unbounded`] restores the
//! legacy wait-forever behavior for ports that need it.

use crate::error::Error;
use crate::geometry::Rect;
use crate::matrix::Mat3;
use crate::pipeline::{
    BlendLayer, BlendMethod, LayerConfig, PipelineConfig, ResultConfig, configure_blend,
    configure_blit, configure_clear, configure_mask, configure_scale,
};
use crate::surface::{PixelFormat, Surface};
use crate::trace::{
    CompleteEvent, OpKind, SkipEvent, SkipReason, SubmitEvent, TimeoutEvent, TraceSink, Tracer,
};

/// The engine's two input layer slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputSlot {
    /// Input 1: the backdrop, read back from the destination when
    /// blending.
    Backdrop,
    /// Input 2: the source pixel stream.
    Source,
}

impl InputSlot {
    /// The slot's bit in the input-enable mask.
    #[inline]
    #[must_use]
    pub const fn enable_bit(self) -> u8 {
        match self {
            Self::Backdrop => 1 << 0,
            Self::Source => 1 << 1,
        }
    }
}

/// Run-state of the engine as tracked by the driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EngineState {
    /// No operation in flight.
    #[default]
    Idle,
    /// Registers are being written for the next pass.
    Configuring,
    /// The engine has been triggered and has not reported completion.
    Running,
}

/// The hardware boundary: register-level access to one compositing
/// engine generation.
///
/// Implementations translate the driver's layer configurations into
/// their chip's register layout. The driver guarantees the call order
/// per pass: `set_clock_gate(true)` → `write_input`/`write_result` →
/// `enable_inputs` → `trigger` → `is_running` polls →
/// `set_clock_gate(false)`.
pub trait CompositingEngine {
    /// Asserts or deasserts the engine's clock gate. Asserted before any
    /// configuration write; may be deasserted when idle.
    fn set_clock_gate(&mut self, enabled: bool);

    /// Can this engine generation sample the given pixel format?
    fn supports_format(&self, format: PixelFormat) -> bool;

    /// Writes one input layer's registers.
    fn write_input(&mut self, slot: InputSlot, config: &LayerConfig);

    /// Writes the result layer's registers.
    fn write_result(&mut self, config: &ResultConfig);

    /// Enables the input layers named by `mask` (see
    /// [`InputSlot::enable_bit`]) and disables the rest.
    fn enable_inputs(&mut self, mask: u8);

    /// Commits the configuration and starts the engine.
    fn trigger(&mut self);

    /// Reads the engine's run-state. `false` once the pass completed.
    fn is_running(&self) -> bool;
}

/// Default poll budget before a pass is declared wedged.
pub const DEFAULT_POLL_BUDGET: u32 = 1_000_000;

/// Exclusive-access driver for one compositing engine.
pub struct Driver<'s, E: CompositingEngine> {
    engine: E,
    state: EngineState,
    poll_budget: Option<u32>,
    clock: Option<fn() -> u64>,
    sink: Option<&'s mut dyn TraceSink>,
}

impl<E: CompositingEngine + core::fmt::Debug> core::fmt::Debug for Driver<'_, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Driver")
            .field("engine", &self.engine)
            .field("state", &self.state)
            .field("poll_budget", &self.poll_budget)
            .finish_non_exhaustive()
    }
}

impl<'s, E: CompositingEngine> Driver<'s, E> {
    /// Creates a driver with the default bounded poll budget.
    #[must_use]
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            state: EngineState::Idle,
            poll_budget: Some(DEFAULT_POLL_BUDGET),
            clock: None,
            sink: None,
        }
    }

    /// Creates a driver that polls forever, faithfully reproducing the
    /// reference behavior. A wedged engine hangs the calling thread.
    #[must_use]
    pub fn unbounded(engine: E) -> Self {
        let mut driver = Self::new(engine);
        driver.poll_budget = None;
        driver
    }

    /// Overrides the completion poll budget. `None` polls forever.
    pub fn set_poll_budget(&mut self, budget: Option<u32>) {
        self.poll_budget = budget;
    }

    /// Installs a monotonic microsecond clock for trace timestamps.
    /// Instrumentation only; never affects correctness.
    pub fn set_clock(&mut self, clock: fn() -> u64) {
        self.clock = Some(clock);
    }

    /// Installs a trace sink receiving pipeline events.
    ///
    /// The sink is borrowed, not owned: the caller keeps the concrete
    /// value and can read a recording back once the driver is dropped
    /// or the sink taken out again.
    pub fn set_trace_sink(&mut self, sink: &'s mut dyn TraceSink) {
        self.sink = Some(sink);
    }

    /// Removes the installed trace sink, returning its borrow.
    pub fn take_trace_sink(&mut self) -> Option<&'s mut dyn TraceSink> {
        self.sink.take()
    }

    /// The driver-side engine state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Borrows the underlying engine.
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Consumes the driver, returning the engine.
    #[must_use]
    pub fn into_engine(self) -> E {
        self.engine
    }

    // -- Operation entry points --------------------------------------

    /// Fills `rect` (or the destination window) with a solid color.
    pub fn clear(&mut self, dst: &Surface, color: u32, rect: Option<Rect>) -> Result<(), Error> {
        self.check_formats(dst, None)?;
        match configure_clear(dst, color, rect)? {
            Some(cfg) => self.run(OpKind::Clear, &cfg),
            None => self.skip(OpKind::Clear, SkipReason::EmptyClip),
        }
    }

    /// Scales `src` into `dst` by independent axis ratios.
    pub fn scale(
        &mut self,
        src: &Surface,
        dst: &Surface,
        x_ratio: f32,
        y_ratio: f32,
        rect: Option<Rect>,
    ) -> Result<(), Error> {
        self.check_formats(dst, Some(src))?;
        match configure_scale(dst, src, x_ratio, y_ratio, rect)? {
            Some(cfg) => self.run(OpKind::Scale, &cfg),
            None => self.skip(OpKind::Scale, SkipReason::EmptyClip),
        }
    }

    /// Blits `src` into `dst` under an arbitrary projective transform.
    pub fn blit(
        &mut self,
        dst: &Surface,
        src: &Surface,
        xf: &Mat3,
        rect: Option<Rect>,
        blend: BlendMethod,
    ) -> Result<(), Error> {
        self.check_formats(dst, Some(src))?;
        match configure_blit(dst, src, xf, rect, blend)? {
            Some(cfg) => self.run(OpKind::Blit, &cfg),
            None => self.skip(OpKind::Blit, SkipReason::EmptyClip),
        }
    }

    /// Blends up to four translated source layers into `dst`, one
    /// hardware pass per contributing layer, in slice order.
    pub fn blend(&mut self, dst: &Surface, layers: &[BlendLayer]) -> Result<(), Error> {
        self.check_formats(dst, None)?;
        for layer in layers {
            self.check_formats(dst, Some(&layer.surface))?;
        }
        let passes = configure_blend(dst, layers)?;
        if passes.is_empty() {
            return self.skip(OpKind::Blend, SkipReason::NoOverlap);
        }
        for cfg in &passes {
            self.run(OpKind::Blend, cfg)?;
        }
        Ok(())
    }

    /// Blends a constant color over `rect` against the destination.
    pub fn mask(&mut self, dst: &Surface, color: u32, rect: Rect) -> Result<(), Error> {
        self.check_formats(dst, None)?;
        match configure_mask(dst, color, rect)? {
            Some(cfg) => self.run(OpKind::Mask, &cfg),
            None => self.skip(OpKind::Mask, SkipReason::EmptyClip),
        }
    }

    /// Blocks until any in-flight pass completes.
    ///
    /// A synchronization point for callers that need the engine idle
    /// without issuing a new operation. Returns immediately when idle.
    pub fn finish(&mut self) -> Result<(), Error> {
        if self.state != EngineState::Running {
            return Ok(());
        }
        let polls = poll_to_idle(&self.engine, self.poll_budget);
        match polls {
            Some(_) => {
                self.state = EngineState::Idle;
                self.engine.set_clock_gate(false);
                Ok(())
            }
            None => Err(Error::HardwareTimeout),
        }
    }

    // -- Internals ----------------------------------------------------

    fn check_formats(&self, dst: &Surface, src: Option<&Surface>) -> Result<(), Error> {
        if !self.engine.supports_format(dst.format) {
            return Err(Error::UnknownFormat);
        }
        if let Some(s) = src
            && !self.engine.supports_format(s.format)
        {
            return Err(Error::UnknownFormat);
        }
        Ok(())
    }

    fn skip(&mut self, op: OpKind, reason: SkipReason) -> Result<(), Error> {
        let mut tracer = tracer_for(&mut self.sink);
        tracer.skip(&SkipEvent { op, reason });
        Ok(())
    }

    fn run(&mut self, op: OpKind, cfg: &PipelineConfig) -> Result<(), Error> {
        // A pass left Running by a previous timeout must drain first.
        self.finish()?;

        let Self {
            engine,
            state,
            poll_budget,
            clock,
            sink,
        } = self;
        let mut tracer = tracer_for(sink);
        let clk: Option<fn() -> u64> = *clock;
        let now = || clk.map_or(0, |c| c());

        *state = EngineState::Configuring;
        engine.set_clock_gate(true);

        let mut mask = InputSlot::Source.enable_bit();
        if let Some(backdrop) = &cfg.backdrop {
            engine.write_input(InputSlot::Backdrop, backdrop);
            mask |= InputSlot::Backdrop.enable_bit();
        }
        engine.write_input(InputSlot::Source, &cfg.source);
        engine.write_result(&cfg.result);
        engine.enable_inputs(mask);

        let start_us = now();
        tracer.submit(&SubmitEvent {
            op,
            inputs: if cfg.backdrop.is_some() { 2 } else { 1 },
            window: cfg.result.window,
            now_us: start_us,
        });

        *state = EngineState::Running;
        engine.trigger();

        match poll_to_idle(engine, *poll_budget) {
            Some(polls) => {
                *state = EngineState::Idle;
                engine.set_clock_gate(false);
                tracer.complete(&CompleteEvent {
                    op,
                    polls,
                    elapsed_us: now().saturating_sub(start_us),
                });
                Ok(())
            }
            None => {
                // Leave state Running: the engine may still complete, and
                // finish() can observe it.
                tracer.timeout(&TimeoutEvent {
                    op,
                    budget: poll_budget.unwrap_or(0),
                });
                Err(Error::HardwareTimeout)
            }
        }
    }
}

fn tracer_for<'a>(sink: &'a mut Option<&mut dyn TraceSink>) -> Tracer<'a> {
    match sink {
        Some(s) => Tracer::new(&mut **s),
        None => Tracer::disabled(),
    }
}

/// Polls run-state until it clears, returning the poll count, or `None`
/// when the budget is exhausted first.
fn poll_to_idle<E: CompositingEngine>(engine: &E, budget: Option<u32>) -> Option<u32> {
    let mut polls = 0_u32;
    while engine.is_running() {
        polls = polls.saturating_add(1);
        if let Some(limit) = budget
            && polls >= limit
        {
            return None;
        }
        core::hint::spin_loop();
    }
    Some(polls)
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::pipeline::configure_clear;
    use crate::surface::PixelFormat;

    /// Scripted engine that records the driver's register-call order.
    #[derive(Debug, Default)]
    struct ScriptedEngine {
        calls: Vec<&'static str>,
        latency: u32,
        remaining: core::cell::Cell<u32>,
        wedged: bool,
        formats_limited: bool,
    }

    impl CompositingEngine for ScriptedEngine {
        fn set_clock_gate(&mut self, enabled: bool) {
            self.calls.push(if enabled { "gate_on" } else { "gate_off" });
        }

        fn supports_format(&self, format: PixelFormat) -> bool {
            !(self.formats_limited && format == PixelFormat::I1)
        }

        fn write_input(&mut self, slot: InputSlot, _config: &LayerConfig) {
            self.calls.push(match slot {
                InputSlot::Backdrop => "write_backdrop",
                InputSlot::Source => "write_source",
            });
        }

        fn write_result(&mut self, _config: &ResultConfig) {
            self.calls.push("write_result");
        }

        fn enable_inputs(&mut self, _mask: u8) {
            self.calls.push("enable");
        }

        fn trigger(&mut self) {
            self.calls.push("trigger");
            self.remaining
                .set(if self.wedged { u32::MAX } else { self.latency });
        }

        fn is_running(&self) -> bool {
            if self.wedged {
                return true;
            }
            let left = self.remaining.get();
            if left == 0 {
                false
            } else {
                self.remaining.set(left - 1);
                true
            }
        }
    }

    fn dst() -> Surface {
        Surface::new(0x0010_0000, 64, 64, 64, PixelFormat::Argb8888)
    }

    #[test]
    fn clear_runs_the_full_protocol() {
        let mut driver = Driver::new(ScriptedEngine {
            latency: 3,
            ..ScriptedEngine::default()
        });
        driver.clear(&dst(), 0xFF00_0000, None).unwrap();
        assert_eq!(driver.state(), EngineState::Idle);
        assert_eq!(
            driver.engine().calls,
            [
                "gate_on",
                "write_source",
                "write_result",
                "enable",
                "trigger",
                "gate_off"
            ]
        );
    }

    #[test]
    fn mask_writes_the_backdrop_slot() {
        let mut driver = Driver::new(ScriptedEngine::default());
        driver
            .mask(&dst(), 0x8000_0000, Rect::new(0, 0, 8, 8))
            .unwrap();
        assert!(driver.engine().calls.contains(&"write_backdrop"));
    }

    #[test]
    fn empty_clip_never_touches_hardware() {
        let mut driver = Driver::new(ScriptedEngine::default());
        driver
            .clear(&dst(), 0, Some(Rect::new(500, 500, 4, 4)))
            .unwrap();
        assert!(driver.engine().calls.is_empty());
    }

    #[test]
    fn validation_error_never_touches_hardware() {
        let mut driver = Driver::new(ScriptedEngine::default());
        let mut bad = dst();
        bad.addr = 0;
        assert_eq!(driver.clear(&bad, 0, None), Err(Error::NullTarget));
        assert!(driver.engine().calls.is_empty());
    }

    #[test]
    fn unsupported_format_rejected() {
        let mut driver = Driver::new(ScriptedEngine {
            formats_limited: true,
            ..ScriptedEngine::default()
        });
        let mut d = dst();
        d.format = PixelFormat::I1;
        assert_eq!(driver.clear(&d, 0, None), Err(Error::UnknownFormat));
        assert!(driver.engine().calls.is_empty());
    }

    #[test]
    fn wedged_engine_times_out() {
        let mut driver = Driver::new(ScriptedEngine {
            wedged: true,
            ..ScriptedEngine::default()
        });
        driver.set_poll_budget(Some(100));
        assert_eq!(driver.clear(&dst(), 0, None), Err(Error::HardwareTimeout));
        assert_eq!(driver.state(), EngineState::Running);
        // finish() keeps waiting and times out again while wedged.
        assert_eq!(driver.finish(), Err(Error::HardwareTimeout));
    }

    #[test]
    fn finish_is_immediate_when_idle() {
        let mut driver = Driver::new(ScriptedEngine::default());
        assert_eq!(driver.finish(), Ok(()));
        assert!(driver.engine().calls.is_empty());
    }

    #[test]
    fn blend_runs_one_pass_per_visible_layer() {
        let mut driver = Driver::new(ScriptedEngine::default());
        let src = Surface::new(0x0020_0000, 16, 16, 16, PixelFormat::Rgb565);
        let layers = [
            BlendLayer {
                surface: src,
                translation: (0, 0),
                clip: None,
            },
            BlendLayer {
                surface: src,
                translation: (4000, 0),
                clip: None,
            },
            BlendLayer {
                surface: src,
                translation: (20, 20),
                clip: None,
            },
        ];
        driver.blend(&dst(), &layers).unwrap();
        let triggers = driver
            .engine()
            .calls
            .iter()
            .filter(|c| **c == "trigger")
            .count();
        assert_eq!(triggers, 2);
    }

    #[test]
    fn blend_with_no_visible_layers_is_a_noop() {
        let mut driver = Driver::new(ScriptedEngine::default());
        let src = Surface::new(0x0020_0000, 16, 16, 16, PixelFormat::Rgb565);
        let outside = BlendLayer {
            surface: src,
            translation: (4000, 4000),
            clip: None,
        };
        driver.blend(&dst(), &[outside; 4]).unwrap();
        assert!(driver.engine().calls.is_empty());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn driver_delivers_events_to_a_caller_owned_sink() {
        use crate::trace::{CompleteEvent, SkipEvent, SubmitEvent};

        #[derive(Default)]
        struct EventLog {
            submits: Vec<OpKind>,
            completes: Vec<u32>,
            skips: Vec<SkipReason>,
        }

        impl TraceSink for EventLog {
            fn on_submit(&mut self, event: &SubmitEvent) {
                self.submits.push(event.op);
            }

            fn on_complete(&mut self, event: &CompleteEvent) {
                self.completes.push(event.polls);
            }

            fn on_skip(&mut self, event: &SkipEvent) {
                self.skips.push(event.reason);
            }
        }

        let mut log = EventLog::default();
        {
            let mut driver = Driver::new(ScriptedEngine {
                latency: 2,
                ..ScriptedEngine::default()
            });
            driver.set_trace_sink(&mut log);
            driver.clear(&dst(), 0xFF00_0000, None).unwrap();
            // Fully clipped out: skips, no submit.
            driver
                .clear(&dst(), 0, Some(Rect::new(500, 500, 4, 4)))
                .unwrap();
        }
        // The caller kept the sink and reads the log back.
        assert_eq!(log.submits, [OpKind::Clear]);
        assert_eq!(log.completes, [2]);
        assert_eq!(log.skips, [SkipReason::EmptyClip]);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn taken_sink_stops_receiving_events() {
        use crate::trace::SubmitEvent;

        #[derive(Default)]
        struct CountingSink(u32);

        impl TraceSink for CountingSink {
            fn on_submit(&mut self, _event: &SubmitEvent) {
                self.0 += 1;
            }
        }

        let mut sink = CountingSink::default();
        let mut driver = Driver::new(ScriptedEngine::default());
        driver.set_trace_sink(&mut sink);
        driver.clear(&dst(), 0, None).unwrap();
        assert!(driver.take_trace_sink().is_some());
        driver.clear(&dst(), 0, None).unwrap();
        drop(driver);
        assert_eq!(sink.0, 1);
    }

    #[test]
    fn configurator_and_driver_agree_on_windows() {
        let cfg = configure_clear(&dst(), 0, Some(Rect::new(8, 8, 16, 16)))
            .unwrap()
            .unwrap();
        assert_eq!(cfg.result.window, Rect::new(8, 8, 16, 16));
    }
}
