// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Driver error taxonomy.
//!
//! Caller-input errors are detected before any hardware register is
//! written and are returned synchronously; none is ever retried.
//! Geometric no-ops (empty clips, zero-area rects, fully disjoint
//! layers) are *not* errors — they report success with no hardware
//! effect. [`Error::HardwareTimeout`] is the one completion-risk
//! category: it fires when the engine's run-state never clears within
//! the driver's poll budget.

use core::fmt;

/// Errors surfaced by pipeline configuration and execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A source surface has a null base address.
    NullSource,
    /// The destination surface has a null base address.
    NullTarget,
    /// A surface base address violates the format's natural alignment.
    AddressNotAligned,
    /// A malformed parameter: inverted window, zero-sized surface,
    /// zero scale ratio, or an unsupported layer count.
    InvalidParameter,
    /// The pixel format is outside the engine's supported set.
    UnknownFormat,
    /// The requested transform is not invertible (or degenerates the
    /// output tile).
    InvalidMatrix,
    /// A caller-supplied window, rect, or translation exceeds the
    /// 16-bit coordinate range of the hardware window registers, so the
    /// source cannot land inside any destination.
    OutOfRange,
    /// The engine's run-state did not clear within the poll budget.
    HardwareTimeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullSource => write!(f, "source surface address is null"),
            Self::NullTarget => write!(f, "destination surface address is null"),
            Self::AddressNotAligned => write!(f, "surface address violates format alignment"),
            Self::InvalidParameter => write!(f, "malformed window or parameter"),
            Self::UnknownFormat => write!(f, "pixel format not supported by this engine"),
            Self::InvalidMatrix => write!(f, "transform is not invertible"),
            Self::OutOfRange => write!(f, "coordinate exceeds hardware window register range"),
            Self::HardwareTimeout => write!(f, "engine run-state did not clear in time"),
        }
    }
}

impl core::error::Error for Error {}
