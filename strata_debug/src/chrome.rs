// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a
//! [`RecorderSink`](super::recorder::RecorderSink) and writes
//! [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::pretty::op_name;
use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable
/// for loading into `chrome://tracing` or
/// [Perfetto](https://ui.perfetto.dev/).
///
/// Each submit opens a duration slice at its microsecond timestamp; the
/// matching complete closes it at submit time plus the recorded elapsed
/// time. Skips and timeouts become instant events.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    // Timestamp of the most recent submit, for closing its slice.
    let mut open_ts: u64 = 0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Submit(e) => {
                open_ts = e.now_us;
                events.push(json!({
                    "ph": "B",
                    "name": op_name(e.op),
                    "cat": "Pass",
                    "ts": e.now_us,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "inputs": e.inputs,
                        "window": format!(
                            "{},{} {}x{}",
                            e.window.x, e.window.y, e.window.width, e.window.height,
                        ),
                    }
                }));
            }
            RecordedEvent::Complete(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": op_name(e.op),
                    "cat": "Pass",
                    "ts": open_ts + e.elapsed_us,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "polls": e.polls,
                    }
                }));
            }
            RecordedEvent::Skip(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": op_name(e.op),
                    "cat": "Skip",
                    "ts": open_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "reason": format!("{:?}", e.reason),
                    }
                }));
            }
            RecordedEvent::Timeout(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": op_name(e.op),
                    "cat": "Timeout",
                    "ts": open_ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "budget": e.budget,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}
