// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable event output.

use std::io::{self, Write};

use lamina_core::trace::{
    AttachmentEvent, BackingChange, BackingEvent, FixedLayerEvent, FlushEvent, PhaseBeginEvent,
    PhaseEndEvent, TraceSink, UpdateEvent,
};

/// A [`TraceSink`] that writes one line per event.
///
/// Phase events are indented so that nested phases read as a tree. The first
/// write error is kept and later events are dropped; see
/// [`take_error`](Self::take_error).
#[derive(Debug)]
pub struct PrettyPrintSink<W> {
    out: W,
    depth: usize,
    error: Option<io::Error>,
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            depth: 0,
            error: None,
        }
    }

    /// Returns the first write error, if any, and resumes output.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        let indent = self.depth * 2;
        if let Err(e) = writeln!(self.out, "{:indent$}{args}", "") {
            self.error = Some(e);
        }
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_update(&mut self, e: &UpdateEvent) {
        self.line(format_args!(
            "[{:?} #{}] update {:?} checked={} rebuilt={} geometry={} changed={}",
            e.frame,
            e.update_index,
            e.update_type,
            e.hierarchy_checked,
            e.hierarchy_rebuilt,
            e.geometry_updated,
            e.layers_changed,
        ));
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.line(format_args!("[{:?} #{}] begin {:?}", e.frame, e.update_index, e.phase));
        self.depth += 1;
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.depth = self.depth.saturating_sub(1);
        self.line(format_args!("[{:?} #{}] end {:?}", e.frame, e.update_index, e.phase));
    }

    fn on_attachment(&mut self, e: &AttachmentEvent) {
        self.line(format_args!("[{:?}] attach {:?} -> {:?}", e.frame, e.from, e.to));
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.line(format_args!(
            "[{:?}] flush geometry={} appearance={} content={} added={} removed={}",
            e.frame, e.geometry, e.appearance, e.content, e.added, e.removed,
        ));
    }

    fn on_backing(&mut self, e: &BackingEvent) {
        match e.change {
            BackingChange::Created(reasons) => {
                self.line(format_args!("[{:?}] backing +{} {reasons:?}", e.frame, e.layer_index));
            }
            BackingChange::Destroyed => {
                self.line(format_args!("[{:?}] backing -{}", e.frame, e.layer_index));
            }
        }
    }

    fn on_fixed_layer(&mut self, e: &FixedLayerEvent) {
        let verb = if e.registered { "register" } else { "unregister" };
        self.line(format_args!("[{:?}] fixed {verb} {}", e.frame, e.layer_index));
    }
}
