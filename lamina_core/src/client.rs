// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contracts between the compositor and the embedding platform.
//!
//! - **[`ChromeClient`]**: the embedder's window/chrome. It hosts the root
//!   graphics layer, decides which compositing triggers are allowed, and
//!   receives registrations of viewport-fixed and accelerated-scrolling
//!   layers so that it can move them on its own thread during scrolling.
//!
//! - **[`Presenter`]**: mirrors a flushed [`LayerCommit`] into native
//!   layers. It may call back into the compositor through
//!   [`GraphicsLayerClient::paint_contents`] while applying.
//!
//! - **[`GraphicsContext`]**: the drawing surface handed to
//!   `paint_contents`.
//!
//! All platform calls are made synchronously on the thread that owns the
//! compositor.

use bitflags::bitflags;
use kurbo::{Rect, Size, Vec2};

use crate::graphics::{GraphicsLayerStore, LayerCommit};
use crate::id::{FrameId, GraphicsLayerId, PaintLayerId, PlatformLayerId, ScrollingNodeId};

bitflags! {
    /// Reasons the embedder allows as triggers for compositing.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CompositingTriggers: u32 {
        /// 3-D transforms.
        const THREE_D_TRANSFORM = 1 << 0;
        /// Video elements.
        const VIDEO = 1 << 1;
        /// Plug-ins.
        const PLUGIN = 1 << 2;
        /// Canvas elements.
        const CANVAS = 1 << 3;
        /// Opacity and transform animations.
        const ANIMATION = 1 << 4;
    }
}

bitflags! {
    /// Which viewport edges a fixed-position layer is anchored to.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FixedPositionAnchors: u8 {
        /// Anchored to the left edge.
        const LEFT = 1 << 0;
        /// Anchored to the right edge.
        const RIGHT = 1 << 1;
        /// Anchored to the top edge.
        const TOP = 1 << 2;
        /// Anchored to the bottom edge.
        const BOTTOM = 1 << 3;
    }
}

/// The embedder's chrome, as seen by the compositor.
///
/// Only [`attach_root_graphics_layer`](Self::attach_root_graphics_layer) is
/// required; every other method defaults to a no-op (or, for
/// [`allowed_compositing_triggers`](Self::allowed_compositing_triggers), to
/// allowing everything).
pub trait ChromeClient {
    /// Hosts `layer` as the root of `frame`'s composited content, or removes
    /// the hosted root when `layer` is `None`.
    fn attach_root_graphics_layer(&mut self, frame: FrameId, layer: Option<GraphicsLayerId>);

    /// Returns which compositing triggers are allowed.
    fn allowed_compositing_triggers(&self) -> CompositingTriggers {
        CompositingTriggers::all()
    }

    /// Asks the embedder to flush pending layer changes soon.
    fn schedule_compositing_layer_sync(&mut self) {}

    /// Called right before a flush begins.
    fn will_sync_compositing_layers(&mut self) {}

    /// Called right after a flush completes.
    fn did_sync_compositing_layers(&mut self) {}

    /// Registers or updates a viewport-fixed layer.
    ///
    /// `bounds` is the layer rectangle relative to the anchored edges of the
    /// custom fixed-position rect. `during_flush` is true when called while
    /// some enclosing compositor is flushing.
    fn add_or_update_fixed_position_layer(
        &mut self,
        layer: PlatformLayerId,
        anchors: FixedPositionAnchors,
        bounds: Rect,
        alignment_offset: Vec2,
        during_flush: bool,
    ) {
        _ = (layer, anchors, bounds, alignment_offset, during_flush);
    }

    /// Unregisters a viewport-fixed layer.
    fn remove_fixed_position_layer(&mut self, layer: PlatformLayerId, during_flush: bool) {
        _ = (layer, during_flush);
    }

    /// Registers or updates an accelerated-scrolling layer pair.
    fn add_or_update_scrolling_layer(
        &mut self,
        node: ScrollingNodeId,
        scrolling_layer: PlatformLayerId,
        contents_layer: PlatformLayerId,
        scroll_size: Size,
    ) {
        _ = (node, scrolling_layer, contents_layer, scroll_size);
    }

    /// Unregisters an accelerated-scrolling layer pair.
    fn remove_scrolling_layer(
        &mut self,
        node: ScrollingNodeId,
        scrolling_layer: PlatformLayerId,
        contents_layer: PlatformLayerId,
    ) {
        _ = (node, scrolling_layer, contents_layer);
    }
}

/// Which pass of layer painting is requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaintingPhase {
    /// Backgrounds and borders.
    Background,
    /// Foreground content.
    Foreground,
    /// Mask content.
    Mask,
}

/// Who owns a set of overflow controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverflowControlsOwner {
    /// The frame view.
    FrameView,
    /// A scrollable paint layer.
    Layer(PaintLayerId),
}

/// One part of a set of overflow controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverflowControlPart {
    /// The horizontal scrollbar.
    HorizontalScrollbar,
    /// The vertical scrollbar.
    VerticalScrollbar,
    /// The scroll corner.
    ScrollCorner,
}

/// A drawing surface with a transform stack.
pub trait GraphicsContext {
    /// Pushes the current state.
    fn save(&mut self);
    /// Pops the most recently saved state.
    fn restore(&mut self);
    /// Translates subsequent drawing.
    fn translate(&mut self, offset: Vec2);
    /// Paints one overflow control of `owner` into `clip`.
    fn paint_overflow_control(
        &mut self,
        owner: OverflowControlsOwner,
        part: OverflowControlPart,
        clip: Rect,
    );
}

/// Paints the content of graphics layers the compositor itself owns.
pub trait GraphicsLayerClient {
    /// Paints `layer` into `context`, limited to `clip` (in layer
    /// coordinates).
    fn paint_contents(
        &self,
        layer: GraphicsLayerId,
        context: &mut dyn GraphicsContext,
        phase: PaintingPhase,
        clip: Rect,
    );
}

/// Applies flushed graphics-layer changes to a platform-native tree.
///
/// # Flush pseudocode
///
/// ```rust,ignore
/// compositor.update_compositing_layers(&mut ctx, CompositingUpdateType::AfterLayoutOrStyleChange, None);
/// compositor.flush_pending_layer_changes(&mut ctx, Some(&mut presenter), true);
/// // inside the flush:
/// //   let commit = store.sync_compositing_state();
/// //   presenter.apply(store, &commit, compositor);
/// ```
pub trait Presenter {
    /// Applies `commit`, reading current values from `store`. Layers owned
    /// by the compositor are painted through `painter`.
    fn apply(&mut self, store: &GraphicsLayerStore, commit: &LayerCommit, painter: &dyn GraphicsLayerClient);
}
