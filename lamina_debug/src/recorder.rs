// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use lamina_core::compositor::{CompositingReasons, CompositingUpdateType, RootLayerAttachment};
use lamina_core::id::FrameId;
use lamina_core::trace::{
    AttachmentEvent, BackingChange, BackingEvent, FixedLayerEvent, FlushEvent, PhaseBeginEvent,
    PhaseEndEvent, PhaseKind, TraceSink, UpdateEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_UPDATE: u8 = 1;
const TAG_PHASE_BEGIN: u8 = 2;
const TAG_PHASE_END: u8 = 3;
const TAG_ATTACHMENT: u8 = 4;
const TAG_FLUSH: u8 = 5;
const TAG_BACKING: u8 = 6;
const TAG_FIXED_LAYER: u8 = 7;

const FLAG_HIERARCHY_CHECKED: u8 = 1 << 0;
const FLAG_HIERARCHY_REBUILT: u8 = 1 << 1;
const FLAG_GEOMETRY_UPDATED: u8 = 1 << 2;
const FLAG_LAYERS_CHANGED: u8 = 1 << 3;

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

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Requirements => 0,
            PhaseKind::Rebuild => 1,
            PhaseKind::Geometry => 2,
            PhaseKind::Flush => 3,
        });
    }

    fn write_attachment(&mut self, a: RootLayerAttachment) {
        self.write_u8(match a {
            RootLayerAttachment::Unattached => 0,
            RootLayerAttachment::ViaChromeClient => 1,
            RootLayerAttachment::ViaEnclosingFrame => 2,
        });
    }

    fn write_update_type(&mut self, t: CompositingUpdateType) {
        self.write_u8(match t {
            CompositingUpdateType::AfterLayoutOrStyleChange => 0,
            CompositingUpdateType::OnPaintingOrHitTest => 1,
            CompositingUpdateType::OnScroll => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_update(&mut self, e: &UpdateEvent) {
        self.write_u8(TAG_UPDATE);
        self.write_u32(e.frame.0);
        self.write_u64(e.update_index);
        self.write_update_type(e.update_type);
        let mut flags = 0;
        if e.hierarchy_checked {
            flags |= FLAG_HIERARCHY_CHECKED;
        }
        if e.hierarchy_rebuilt {
            flags |= FLAG_HIERARCHY_REBUILT;
        }
        if e.geometry_updated {
            flags |= FLAG_GEOMETRY_UPDATED;
        }
        if e.layers_changed {
            flags |= FLAG_LAYERS_CHANGED;
        }
        self.write_u8(flags);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u32(e.frame.0);
        self.write_u64(e.update_index);
        self.write_phase(e.phase);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u32(e.frame.0);
        self.write_u64(e.update_index);
        self.write_phase(e.phase);
    }

    fn on_attachment(&mut self, e: &AttachmentEvent) {
        self.write_u8(TAG_ATTACHMENT);
        self.write_u32(e.frame.0);
        self.write_attachment(e.from);
        self.write_attachment(e.to);
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.write_u8(TAG_FLUSH);
        self.write_u32(e.frame.0);
        self.write_u32(e.geometry);
        self.write_u32(e.appearance);
        self.write_u32(e.content);
        self.write_u32(e.added);
        self.write_u32(e.removed);
    }

    fn on_backing(&mut self, e: &BackingEvent) {
        self.write_u8(TAG_BACKING);
        self.write_u32(e.frame.0);
        self.write_u32(e.layer_index);
        match e.change {
            BackingChange::Created(reasons) => {
                self.write_u8(1);
                self.write_u32(reasons.bits());
            }
            BackingChange::Destroyed => {
                self.write_u8(0);
                self.write_u32(0);
            }
        }
    }

    fn on_fixed_layer(&mut self, e: &FixedLayerEvent) {
        self.write_u8(TAG_FIXED_LAYER);
        self.write_u32(e.frame.0);
        self.write_u32(e.layer_index);
        self.write_u8(u8::from(e.registered));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// An [`UpdateEvent`].
    Update(UpdateEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// An [`AttachmentEvent`].
    Attachment(AttachmentEvent),
    /// A [`FlushEvent`].
    Flush(FlushEvent),
    /// A [`BackingEvent`].
    Backing(BackingEvent),
    /// A [`FixedLayerEvent`].
    FixedLayer(FixedLayerEvent),
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
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_frame(&mut self) -> Option<FrameId> {
        self.read_u32().map(FrameId)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Requirements,
            1 => PhaseKind::Rebuild,
            2 => PhaseKind::Geometry,
            _ => PhaseKind::Flush,
        })
    }

    fn read_attachment(&mut self) -> Option<RootLayerAttachment> {
        Some(match self.read_u8()? {
            0 => RootLayerAttachment::Unattached,
            1 => RootLayerAttachment::ViaChromeClient,
            _ => RootLayerAttachment::ViaEnclosingFrame,
        })
    }

    fn read_update_type(&mut self) -> Option<CompositingUpdateType> {
        Some(match self.read_u8()? {
            0 => CompositingUpdateType::AfterLayoutOrStyleChange,
            1 => CompositingUpdateType::OnPaintingOrHitTest,
            _ => CompositingUpdateType::OnScroll,
        })
    }

    fn decode_update(&mut self) -> Option<RecordedEvent> {
        let frame = self.read_frame()?;
        let update_index = self.read_u64()?;
        let update_type = self.read_update_type()?;
        let flags = self.read_u8()?;
        Some(RecordedEvent::Update(UpdateEvent {
            frame,
            update_index,
            update_type,
            hierarchy_checked: flags & FLAG_HIERARCHY_CHECKED != 0,
            hierarchy_rebuilt: flags & FLAG_HIERARCHY_REBUILT != 0,
            geometry_updated: flags & FLAG_GEOMETRY_UPDATED != 0,
            layers_changed: flags & FLAG_LAYERS_CHANGED != 0,
        }))
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            frame: self.read_frame()?,
            update_index: self.read_u64()?,
            phase: self.read_phase()?,
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            frame: self.read_frame()?,
            update_index: self.read_u64()?,
            phase: self.read_phase()?,
        }))
    }

    fn decode_attachment(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Attachment(AttachmentEvent {
            frame: self.read_frame()?,
            from: self.read_attachment()?,
            to: self.read_attachment()?,
        }))
    }

    fn decode_flush(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Flush(FlushEvent {
            frame: self.read_frame()?,
            geometry: self.read_u32()?,
            appearance: self.read_u32()?,
            content: self.read_u32()?,
            added: self.read_u32()?,
            removed: self.read_u32()?,
        }))
    }

    fn decode_backing(&mut self) -> Option<RecordedEvent> {
        let frame = self.read_frame()?;
        let layer_index = self.read_u32()?;
        let created = self.read_u8()? != 0;
        let bits = self.read_u32()?;
        let change = if created {
            BackingChange::Created(CompositingReasons::from_bits_retain(bits))
        } else {
            BackingChange::Destroyed
        };
        Some(RecordedEvent::Backing(BackingEvent {
            frame,
            layer_index,
            change,
        }))
    }

    fn decode_fixed_layer(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FixedLayer(FixedLayerEvent {
            frame: self.read_frame()?,
            layer_index: self.read_u32()?,
            registered: self.read_u8()? != 0,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_UPDATE => self.decode_update(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_ATTACHMENT => self.decode_attachment(),
            TAG_FLUSH => self.decode_flush(),
            TAG_BACKING => self.decode_backing(),
            TAG_FIXED_LAYER => self.decode_fixed_layer(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
