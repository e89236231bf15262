// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cross-document seams.
//!
//! A compositor never holds references to other documents' compositors.
//! It reads them through [`FrameCompositors`], a lookup the host provides for
//! the duration of one call, and asks the host to act on other documents by
//! queueing [`HostRequest`]s.

use alloc::vec::Vec;

use super::RootLayerAttachment;
use crate::id::{FrameId, GraphicsLayerId, PaintLayerId};

/// What one document's compositor exposes to the compositors of its parent
/// and child documents.
pub trait FrameContents {
    /// The topmost graphics layer of the document, if it has one.
    fn root_graphics_layer(&self) -> Option<GraphicsLayerId>;

    /// How the root graphics layer is currently attached.
    fn root_layer_attachment(&self) -> RootLayerAttachment;

    /// Whether the document is in compositing mode.
    fn in_compositing_mode(&self) -> bool;

    /// Whether compositing should be expressed through the parent document.
    fn should_propagate_compositing_to_enclosing_frame(&self) -> bool;

    /// Whether the document is in the middle of a flush.
    fn is_flushing_layers(&self) -> bool;

    /// The parent document's frame, for sub-frames.
    fn parent_frame(&self) -> Option<FrameId>;
}

/// Lookup of the other documents of a page.
pub trait FrameCompositors {
    /// Returns the compositor of `frame`, if that document is available.
    fn contents(&self, frame: FrameId) -> Option<&dyn FrameContents>;

    /// Returns every descendant frame of `frame`, in tree order.
    fn descendant_frames(&self, frame: FrameId) -> Vec<FrameId>;
}

/// A lookup with no other documents, for single-document hosts.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoFrames;

impl FrameCompositors for NoFrames {
    fn contents(&self, _frame: FrameId) -> Option<&dyn FrameContents> {
        None
    }

    fn descendant_frames(&self, _frame: FrameId) -> Vec<FrameId> {
        Vec::new()
    }
}

/// Work the compositor needs done outside its own document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostRequest {
    /// Schedule a synthetic style recalc of the element that owns `frame`,
    /// so the parent document re-evaluates the frame's compositing needs.
    ScheduleStyleRecalc {
        /// The sub-frame whose owner element must be restyled.
        frame: FrameId,
    },
    /// Ask the compositor of `frame` to re-evaluate its root attachment.
    UpdateRootLayerAttachment {
        /// The sub-frame to update.
        frame: FrameId,
    },
    /// A video layer gained or lost its backing; the media player should
    /// attach or detach its accelerated presentation layer.
    AcceleratedRenderingStateChanged {
        /// The video's paint layer.
        layer: PaintLayerId,
    },
}
