// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for compositing updates.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! compositor calls at each stage of an update and a flush. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`BackingEvent`] and
//!   [`FixedLayerEvent`] plus the corresponding `TraceSink` methods.

#[cfg(feature = "trace-rich")]
use crate::compositor::CompositingReasons;
use crate::compositor::{CompositingUpdateType, RootLayerAttachment};
use crate::id::FrameId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a compositing update is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Compositing requirements (overlap walk and backing decisions).
    Requirements,
    /// Graphics-layer hierarchy rebuild.
    Rebuild,
    /// Geometry-only refresh.
    Geometry,
    /// Flushing graphics-layer changes to the platform.
    Flush,
}

/// What happened to a paint layer's backing.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackingChange {
    /// A backing was created for the given reasons.
    Created(CompositingReasons),
    /// The backing was destroyed.
    Destroyed,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted at the end of every compositing update that was not skipped.
#[derive(Clone, Copy, Debug)]
pub struct UpdateEvent {
    /// The frame whose compositor ran.
    pub frame: FrameId,
    /// Monotonic update counter of that compositor.
    pub update_index: u64,
    /// Why the update ran.
    pub update_type: CompositingUpdateType,
    /// Whether compositing requirements were recomputed.
    pub hierarchy_checked: bool,
    /// Whether the graphics-layer hierarchy was rebuilt.
    pub hierarchy_rebuilt: bool,
    /// Whether only geometry was refreshed.
    pub geometry_updated: bool,
    /// Whether any backing was created or destroyed.
    pub layers_changed: bool,
}

/// Marks the beginning of an update phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// The frame whose compositor is running.
    pub frame: FrameId,
    /// Update counter.
    pub update_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
}

/// Marks the end of an update phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// The frame whose compositor is running.
    pub frame: FrameId,
    /// Update counter.
    pub update_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
}

/// Emitted whenever the root layer attachment changes.
#[derive(Clone, Copy, Debug)]
pub struct AttachmentEvent {
    /// The frame whose root layer moved.
    pub frame: FrameId,
    /// Previous attachment.
    pub from: RootLayerAttachment,
    /// New attachment.
    pub to: RootLayerAttachment,
}

/// Emitted after a flush with the size of the commit.
#[derive(Clone, Copy, Debug)]
pub struct FlushEvent {
    /// The flushing frame.
    pub frame: FrameId,
    /// Layers with geometry changes.
    pub geometry: u32,
    /// Layers with appearance changes.
    pub appearance: u32,
    /// Layers repainted.
    pub content: u32,
    /// Layers created.
    pub added: u32,
    /// Layers destroyed.
    pub removed: u32,
}

/// A backing was created or destroyed.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct BackingEvent {
    /// The frame owning the paint layer.
    pub frame: FrameId,
    /// Slot index of the paint layer.
    pub layer_index: u32,
    /// What happened.
    pub change: BackingChange,
}

/// A viewport-fixed layer was registered with or removed from the client.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct FixedLayerEvent {
    /// The frame owning the paint layer.
    pub frame: FrameId,
    /// Slot index of the paint layer.
    pub layer_index: u32,
    /// `true` for add/update, `false` for removal.
    pub registered: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the compositor.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the end of a compositing update.
    fn on_update(&mut self, e: &UpdateEvent) {
        _ = e;
    }

    /// Called at the beginning of an update phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of an update phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when the root layer attachment changes.
    fn on_attachment(&mut self, e: &AttachmentEvent) {
        _ = e;
    }

    /// Called after a flush.
    fn on_flush(&mut self, e: &FlushEvent) {
        _ = e;
    }

    /// Called when a backing is created or destroyed (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_backing(&mut self, e: &BackingEvent) {
        _ = e;
    }

    /// Called on fixed-layer registration changes (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_fixed_layer(&mut self, e: &FixedLayerEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits an [`UpdateEvent`].
    #[inline]
    pub fn update(&mut self, e: &UpdateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_update(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`AttachmentEvent`].
    #[inline]
    pub fn attachment(&mut self, e: &AttachmentEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_attachment(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FlushEvent`].
    #[inline]
    pub fn flush(&mut self, e: &FlushEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_flush(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BackingEvent`].
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn backing(&mut self, e: &BackingEvent) {
        if let Some(s) = &mut self.sink {
            s.on_backing(e);
        }
    }

    /// Emits a [`FixedLayerEvent`].
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn fixed_layer(&mut self, e: &FixedLayerEvent) {
        if let Some(s) = &mut self.sink {
            s.on_fixed_layer(e);
        }
    }
}
