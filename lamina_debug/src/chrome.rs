// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Compositor events carry no clock, so each event is placed one
//! microsecond after the previous one. Durations in the viewer therefore
//! show event counts, not time.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use lamina_core::trace::BackingChange;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Each frame is reported as its own process.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for (ts, recorded) in decode(bytes).enumerate() {
        match recorded {
            RecordedEvent::Update(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Update",
                    "cat": "Compositor",
                    "ts": ts,
                    "pid": e.frame.0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "update_index": e.update_index,
                        "update_type": format!("{:?}", e.update_type),
                        "hierarchy_checked": e.hierarchy_checked,
                        "hierarchy_rebuilt": e.hierarchy_rebuilt,
                        "geometry_updated": e.geometry_updated,
                        "layers_changed": e.layers_changed,
                    }
                }));
            }
            RecordedEvent::PhaseBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": format!("{:?}", e.phase),
                    "cat": "Update",
                    "ts": ts,
                    "pid": e.frame.0,
                    "tid": 0,
                    "args": {
                        "update_index": e.update_index,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": format!("{:?}", e.phase),
                    "cat": "Update",
                    "ts": ts,
                    "pid": e.frame.0,
                    "tid": 0,
                    "args": {
                        "update_index": e.update_index,
                    }
                }));
            }
            RecordedEvent::Attachment(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Attachment",
                    "cat": "Compositor",
                    "ts": ts,
                    "pid": e.frame.0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "from": format!("{:?}", e.from),
                        "to": format!("{:?}", e.to),
                    }
                }));
            }
            RecordedEvent::Flush(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Flush",
                    "cat": "Compositor",
                    "ts": ts,
                    "pid": e.frame.0,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "geometry": e.geometry,
                        "appearance": e.appearance,
                        "content": e.content,
                        "added": e.added,
                        "removed": e.removed,
                    }
                }));
            }
            RecordedEvent::Backing(e) => {
                let (name, reasons) = match e.change {
                    BackingChange::Created(reasons) => ("BackingCreated", format!("{reasons:?}")),
                    BackingChange::Destroyed => ("BackingDestroyed", String::new()),
                };
                events.push(json!({
                    "ph": "i",
                    "name": name,
                    "cat": "Rich",
                    "ts": ts,
                    "pid": e.frame.0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "layer_index": e.layer_index,
                        "reasons": reasons,
                    }
                }));
            }
            RecordedEvent::FixedLayer(e) => {
                let name = if e.registered {
                    "FixedRegistered"
                } else {
                    "FixedRemoved"
                };
                events.push(json!({
                    "ph": "i",
                    "name": name,
                    "cat": "Rich",
                    "ts": ts,
                    "pid": e.frame.0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "layer_index": e.layer_index,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use lamina_core::compositor::{CompositingReasons, CompositingUpdateType};
    use lamina_core::id::FrameId;
    use lamina_core::trace::{
        BackingEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink, UpdateEvent,
    };

    #[test]
    fn export_produces_valid_json() {
        let frame = FrameId(1);
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            frame,
            update_index: 3,
            phase: PhaseKind::Requirements,
        });
        rec.on_backing(&BackingEvent {
            frame,
            layer_index: 5,
            change: BackingChange::Created(CompositingReasons::VIDEO),
        });
        rec.on_phase_end(&PhaseEndEvent {
            frame,
            update_index: 3,
            phase: PhaseKind::Requirements,
        });
        rec.on_update(&UpdateEvent {
            frame,
            update_index: 3,
            update_type: CompositingUpdateType::OnPaintingOrHitTest,
            hierarchy_checked: true,
            hierarchy_rebuilt: true,
            geometry_updated: false,
            layers_changed: true,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 4, "one trace object per event");

        assert_eq!(parsed[0]["ph"], "B", "phase begin is a duration start");
        assert_eq!(parsed[0]["name"], "Requirements", "phase name");
        assert_eq!(parsed[1]["name"], "BackingCreated", "backing creation");
        assert_eq!(parsed[1]["args"]["layer_index"], 5, "layer index is kept");
        assert_eq!(parsed[2]["ph"], "E", "phase end closes the duration");
        assert_eq!(parsed[3]["name"], "Update", "update summary");
        assert_eq!(parsed[3]["pid"], 1, "frames are processes");

        let stamps: Vec<_> = parsed.iter().map(|e| e["ts"].as_u64().unwrap()).collect();
        assert_eq!(stamps, [0, 1, 2, 3], "events keep recording order");
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty(), "no events, empty array");
    }
}
