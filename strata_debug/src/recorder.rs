// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them
//! back as an iterator of [`RecordedEvent`].

use strata_core::geometry::Rect;
use strata_core::trace::{
    CompleteEvent, OpKind, SkipEvent, SkipReason, SubmitEvent, TimeoutEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_SUBMIT: u8 = 1;
const TAG_SKIP: u8 = 2;
const TAG_COMPLETE: u8 = 3;
const TAG_TIMEOUT: u8 = 4;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_op(&mut self, op: OpKind) {
        self.write_u8(match op {
            OpKind::Clear => 0,
            OpKind::Scale => 1,
            OpKind::Blit => 2,
            OpKind::Blend => 3,
            OpKind::Mask => 4,
        });
    }

    fn write_reason(&mut self, reason: SkipReason) {
        self.write_u8(match reason {
            SkipReason::EmptyClip => 0,
            SkipReason::NoOverlap => 1,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_submit(&mut self, e: &SubmitEvent) {
        self.write_u8(TAG_SUBMIT);
        self.write_op(e.op);
        self.write_u8(e.inputs);
        self.write_i32(e.window.x);
        self.write_i32(e.window.y);
        self.write_u32(e.window.width);
        self.write_u32(e.window.height);
        self.write_u64(e.now_us);
    }

    fn on_skip(&mut self, e: &SkipEvent) {
        self.write_u8(TAG_SKIP);
        self.write_op(e.op);
        self.write_reason(e.reason);
    }

    fn on_complete(&mut self, e: &CompleteEvent) {
        self.write_u8(TAG_COMPLETE);
        self.write_op(e.op);
        self.write_u32(e.polls);
        self.write_u64(e.elapsed_us);
    }

    fn on_timeout(&mut self, e: &TimeoutEvent) {
        self.write_u8(TAG_TIMEOUT);
        self.write_op(e.op);
        self.write_u32(e.budget);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`SubmitEvent`].
    Submit(SubmitEvent),
    /// A [`SkipEvent`].
    Skip(SkipEvent),
    /// A [`CompleteEvent`].
    Complete(CompleteEvent),
    /// A [`TimeoutEvent`].
    Timeout(TimeoutEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.read_u32().map(u32::cast_signed)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_op(&mut self) -> Option<OpKind> {
        Some(match self.read_u8()? {
            0 => OpKind::Clear,
            1 => OpKind::Scale,
            2 => OpKind::Blit,
            3 => OpKind::Blend,
            _ => OpKind::Mask,
        })
    }

    fn read_reason(&mut self) -> Option<SkipReason> {
        Some(match self.read_u8()? {
            0 => SkipReason::EmptyClip,
            _ => SkipReason::NoOverlap,
        })
    }

    fn decode_submit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Submit(SubmitEvent {
            op: self.read_op()?,
            inputs: self.read_u8()?,
            window: Rect {
                x: self.read_i32()?,
                y: self.read_i32()?,
                width: self.read_u32()?,
                height: self.read_u32()?,
            },
            now_us: self.read_u64()?,
        }))
    }

    fn decode_skip(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Skip(SkipEvent {
            op: self.read_op()?,
            reason: self.read_reason()?,
        }))
    }

    fn decode_complete(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Complete(CompleteEvent {
            op: self.read_op()?,
            polls: self.read_u32()?,
            elapsed_us: self.read_u64()?,
        }))
    }

    fn decode_timeout(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Timeout(TimeoutEvent {
            op: self.read_op()?,
            budget: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_SUBMIT => self.decode_submit(),
            TAG_SKIP => self.decode_skip(),
            TAG_COMPLETE => self.decode_complete(),
            TAG_TIMEOUT => self.decode_timeout(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_submit() -> SubmitEvent {
        SubmitEvent {
            op: OpKind::Blit,
            inputs: 2,
            window: Rect::new(-3, 20, 300, 40),
            now_us: 1_000_000,
        }
    }

    #[test]
    fn round_trip_submit() {
        let mut rec = RecorderSink::new();
        let orig = sample_submit();
        rec.on_submit(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::Submit(e) => {
                assert_eq!(e.op, orig.op);
                assert_eq!(e.inputs, orig.inputs);
                assert_eq!(e.window, orig.window);
                assert_eq!(e.now_us, orig.now_us);
            }
            other => panic!("expected Submit, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_skip_and_timeout() {
        let mut rec = RecorderSink::new();
        rec.on_skip(&SkipEvent {
            op: OpKind::Blend,
            reason: SkipReason::NoOverlap,
        });
        rec.on_timeout(&TimeoutEvent {
            op: OpKind::Clear,
            budget: 1_000_000,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::Skip(e) => {
                assert_eq!(e.op, OpKind::Blend);
                assert_eq!(e.reason, SkipReason::NoOverlap);
            }
            other => panic!("expected Skip, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::Timeout(e) => {
                assert_eq!(e.op, OpKind::Clear);
                assert_eq!(e.budget, 1_000_000);
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_multiple_events() {
        let mut rec = RecorderSink::new();
        rec.on_submit(&sample_submit());
        rec.on_complete(&CompleteEvent {
            op: OpKind::Blit,
            polls: 7,
            elapsed_us: 90,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], RecordedEvent::Submit(_)));
        match &events[1] {
            RecordedEvent::Complete(e) => {
                assert_eq!(e.polls, 7);
                assert_eq!(e.elapsed_us, 90);
            }
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn records_a_live_driver_session() {
        use strata_backend_sim::SimEngine;
        use strata_core::engine::Driver;
        use strata_core::surface::{PixelFormat, Surface};

        let dst = Surface::new(0x0010_0000, 320, 240, 320, PixelFormat::Rgb565);
        let mut rec = RecorderSink::new();
        {
            let mut driver = Driver::new(SimEngine::with_latency(3));
            driver.set_trace_sink(&mut rec);
            driver.clear(&dst, 0xFF00_FF00, None).unwrap();
            // Fully outside the destination: a skip, never a submit.
            driver
                .clear(&dst, 0, Some(Rect::new(1000, 1000, 8, 8)))
                .unwrap();
        }

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 3);
        match &events[0] {
            RecordedEvent::Submit(e) => {
                assert_eq!(e.op, OpKind::Clear);
                assert_eq!(e.inputs, 1);
                assert_eq!(e.window, Rect::new(0, 0, 320, 240));
            }
            other => panic!("expected Submit, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::Complete(e) => {
                assert_eq!(e.op, OpKind::Clear);
                assert_eq!(e.polls, 3);
            }
            other => panic!("expected Complete, got {other:?}"),
        }
        match &events[2] {
            RecordedEvent::Skip(e) => {
                assert_eq!(e.reason, SkipReason::EmptyClip);
            }
            other => panic!("expected Skip, got {other:?}"),
        }

        // The same recording feeds the Chrome exporter.
        let mut out = Vec::new();
        crate::chrome::export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "clear");
    }

    #[test]
    fn truncated_record_stops_cleanly() {
        let mut rec = RecorderSink::new();
        rec.on_submit(&sample_submit());
        let bytes = rec.as_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert!(events.is_empty());
    }
}
