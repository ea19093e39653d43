// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated compositing engine backed by an in-memory register file.
//!
//! [`SimEngine`] implements
//! [`CompositingEngine`](strata_core::engine::CompositingEngine) over a
//! plain word array, encoding every configuration through the
//! mask-and-shift functions in [`regs`]. Completion is modeled as a
//! configurable number of run-state polls after each trigger.
//!
//! The register file is fully inspectable, so tests can assert both
//! what a pass committed and that rejected or skipped operations left
//! the hardware untouched. Each instance is independent — tests
//! instantiate as many engines as they need.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod regs;

use core::cell::Cell;

use strata_core::engine::{CompositingEngine, InputSlot};
use strata_core::pipeline::{LayerConfig, ResultConfig};
use strata_core::surface::PixelFormat;

use crate::regs::{
    BACKDROP_BASE, GLB_CTRL, GLB_INPUT_EN, OFF_ADDR, OFF_COLOR, OFF_CTRL, OFF_KEY_CTRL,
    OFF_KEY_MAX, OFF_KEY_MIN, OFF_KEY_REPLACE, OFF_LINE_LEN, OFF_MATRIX, OFF_TILE, OFF_WIN_MAX,
    OFF_WIN_MIN, REG_COUNT, RESULT_BASE, SOURCE_BASE,
};

/// An in-memory engine with scripted completion latency.
#[derive(Debug, Clone)]
pub struct SimEngine {
    regs: [u32; REG_COUNT],
    latency: u32,
    remaining: Cell<u32>,
    gated: bool,
    trigger_count: u32,
    ungated_writes: u32,
}

impl Default for SimEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEngine {
    /// Creates an engine that completes on the first run-state poll.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_latency(0)
    }

    /// Creates an engine that stays busy for `latency` run-state polls
    /// after each trigger.
    #[must_use]
    pub const fn with_latency(latency: u32) -> Self {
        Self {
            regs: [0; REG_COUNT],
            latency,
            remaining: Cell::new(0),
            gated: false,
            trigger_count: 0,
            ungated_writes: 0,
        }
    }

    /// The raw register file.
    #[must_use]
    pub const fn registers(&self) -> &[u32; REG_COUNT] {
        &self.regs
    }

    /// The register file as bytes, for snapshot comparison.
    #[must_use]
    pub fn register_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.regs)
    }

    /// How many passes have been triggered.
    #[must_use]
    pub const fn trigger_count(&self) -> u32 {
        self.trigger_count
    }

    /// Register writes that arrived with the clock gate deasserted.
    /// A correct driver never produces any.
    #[must_use]
    pub const fn ungated_writes(&self) -> u32 {
        self.ungated_writes
    }

    /// Is the clock gate currently asserted?
    #[must_use]
    pub const fn clock_gated_on(&self) -> bool {
        self.gated
    }

    fn write(&mut self, index: usize, word: u32) {
        if !self.gated {
            self.ungated_writes += 1;
        }
        self.regs[index] = word;
    }

    fn write_layer_block(&mut self, base: usize, cfg: &LayerConfig) {
        self.write(base + OFF_ADDR, cfg.addr);
        self.write(base + OFF_LINE_LEN, cfg.line_length);
        self.write(base + OFF_WIN_MIN, regs::pack_win_min(cfg.window));
        self.write(base + OFF_WIN_MAX, regs::pack_win_max(cfg.window));
        self.write(
            base + OFF_CTRL,
            regs::pack_layer_ctrl(
                cfg.format.code(),
                cfg.source,
                cfg.blend,
                cfg.filter,
                cfg.opacity,
            ),
        );
        self.write(base + OFF_COLOR, cfg.color);
        self.write(base + OFF_KEY_CTRL, regs::pack_key_ctrl(cfg.color_key.as_ref()));
        let (key_min, key_max, key_replace) = match &cfg.color_key {
            Some(key) => (
                regs::pack_channels(key.min),
                regs::pack_channels(key.max),
                key.replacement,
            ),
            None => (0, 0, 0),
        };
        self.write(base + OFF_KEY_MIN, key_min);
        self.write(base + OFF_KEY_MAX, key_max);
        self.write(base + OFF_KEY_REPLACE, key_replace);
        for (i, coefficient) in cfg.matrix.iter().enumerate() {
            self.write(base + OFF_MATRIX + i, regs::matrix_word(*coefficient));
        }
    }
}

impl CompositingEngine for SimEngine {
    fn set_clock_gate(&mut self, enabled: bool) {
        self.gated = enabled;
        if enabled {
            self.regs[GLB_CTRL] |= 1;
        } else {
            self.regs[GLB_CTRL] &= !1;
        }
    }

    fn supports_format(&self, _format: PixelFormat) -> bool {
        true
    }

    fn write_input(&mut self, slot: InputSlot, config: &LayerConfig) {
        let base = match slot {
            InputSlot::Backdrop => BACKDROP_BASE,
            InputSlot::Source => SOURCE_BASE,
        };
        self.write_layer_block(base, config);
    }

    fn write_result(&mut self, config: &ResultConfig) {
        self.write(RESULT_BASE + OFF_ADDR, config.addr);
        self.write(RESULT_BASE + OFF_LINE_LEN, config.line_length);
        let window = result_window(config);
        self.write(RESULT_BASE + OFF_WIN_MIN, regs::pack_win_min(window));
        self.write(RESULT_BASE + OFF_WIN_MAX, regs::pack_win_max(window));
        self.write(
            RESULT_BASE + OFF_CTRL,
            u32::from(config.format.code()),
        );
        self.write(
            RESULT_BASE + OFF_TILE,
            regs::pack_halves(config.tile.0, config.tile.1),
        );
    }

    fn enable_inputs(&mut self, mask: u8) {
        self.write(GLB_INPUT_EN, u32::from(mask));
    }

    fn trigger(&mut self) {
        self.trigger_count += 1;
        self.remaining.set(self.latency);
    }

    fn is_running(&self) -> bool {
        let left = self.remaining.get();
        if left == 0 {
            return false;
        }
        self.remaining.set(left - 1);
        true
    }
}

/// The result window as an inclusive register window. The configurator
/// only produces windows clipped inside the destination, so the
/// coordinates are non-negative.
fn result_window(config: &ResultConfig) -> strata_core::surface::Window {
    let r = config.window;
    strata_core::surface::Window {
        x_min: r.x.cast_unsigned(),
        x_max: r.x.cast_unsigned() + r.width - 1,
        y_min: r.y.cast_unsigned(),
        y_max: r.y.cast_unsigned() + r.height - 1,
    }
}
