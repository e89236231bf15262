// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registration of viewport-fixed and accelerated-scrolling layers with the
//! chrome client.
//!
//! The client moves registered layers itself while the user scrolls, so the
//! compositor keeps it informed of:
//!
//! - the rootmost viewport-fixed layers, with the viewport edges they are
//!   anchored to and their offset from those edges;
//! - backings with an accelerated scrolling layer pair.
//!
//! Registrations are dropped while the root layer is detached and replayed
//! when it is attached again. Fixed layers are reported after each update
//! and flush, and only when their anchoring differs from what the client
//! last saw.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size, Vec2};

use super::{CompositingContext, Compositor, RootLayerAttachment};
use crate::client::FixedPositionAnchors;
use crate::id::{PaintLayerId, PlatformLayerId, ScrollingNodeId};
use crate::paint::{Insets, PaintLayerTree, Position};
#[cfg(feature = "trace-rich")]
use crate::trace::FixedLayerEvent;

/// How a fixed-position layer is pinned to the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedPositionSizing {
    /// The edges the layer is anchored to. Always holds one horizontal and
    /// one vertical edge.
    pub anchors: FixedPositionAnchors,
    /// Layer rectangle, with its origin measured from the anchored edges.
    pub bounds: Rect,
    /// Sub-pixel offset dropped when the layer was pixel-aligned.
    pub alignment_offset: Vec2,
}

/// Computes the anchoring of a fixed-position layer.
///
/// `layer_rect` is the primary graphics layer's position and size and
/// `positioned_rect` the frame view's custom fixed-position rect. A
/// non-`auto` `left`/`top` anchors to that edge; `right`/`bottom` anchor to
/// the far edge and only set the offset when the near edge is `auto`. With
/// both insets of an axis `auto`, the near edge is used.
#[must_use]
pub fn compute_fixed_position_sizing(
    insets: Insets,
    layer_rect: Rect,
    alignment_offset: Vec2,
    positioned_rect: Rect,
) -> FixedPositionSizing {
    let mut anchors = FixedPositionAnchors::empty();
    let mut origin = Point::ZERO;

    if !insets.left.is_auto() {
        anchors |= FixedPositionAnchors::LEFT;
        origin.x = layer_rect.x0 - positioned_rect.x0;
    }
    if !insets.right.is_auto() {
        anchors |= FixedPositionAnchors::RIGHT;
        if !anchors.contains(FixedPositionAnchors::LEFT) {
            origin.x = positioned_rect.x1 - layer_rect.x1;
        }
    }
    if !insets.top.is_auto() {
        anchors |= FixedPositionAnchors::TOP;
        origin.y = layer_rect.y0 - positioned_rect.y0;
    }
    if !insets.bottom.is_auto() {
        anchors |= FixedPositionAnchors::BOTTOM;
        if !anchors.contains(FixedPositionAnchors::TOP) {
            origin.y = positioned_rect.y1 - layer_rect.y1;
        }
    }

    if !anchors.intersects(FixedPositionAnchors::LEFT | FixedPositionAnchors::RIGHT) {
        anchors |= FixedPositionAnchors::LEFT;
        origin.x = layer_rect.x0 - positioned_rect.x0;
    }
    if !anchors.intersects(FixedPositionAnchors::TOP | FixedPositionAnchors::BOTTOM) {
        anchors |= FixedPositionAnchors::TOP;
        origin.y = layer_rect.y0 - positioned_rect.y0;
    }

    FixedPositionSizing {
        anchors,
        bounds: Rect::from_origin_size(origin, layer_rect.size()),
        alignment_offset,
    }
}

/// What was last reported to the client for one scrolling layer pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ScrollingRegistration {
    pub(crate) node: ScrollingNodeId,
    pub(crate) scrolling: PlatformLayerId,
    pub(crate) contents: PlatformLayerId,
    pub(crate) size: Size,
}

impl Compositor {
    /// Returns whether `layer` is viewport-fixed with no composited fixed
    /// stacking context above it.
    #[must_use]
    pub fn is_rootmost_fixed_layer(&self, tree: &PaintLayerTree, layer: PaintLayerId) -> bool {
        if !tree.style(layer).has_custom_fixed_position() {
            return false;
        }
        let mut cur = tree.stacking_context_of(layer);
        while let Some(sc) = cur {
            if tree.is_composited(sc) && tree.style(sc).position == Position::Fixed {
                return false;
            }
            cur = tree.stacking_context_of(sc);
        }
        true
    }

    /// Adds or removes `layer` from the fixed-position set.
    pub fn update_fixed_position_status(&mut self, ctx: &mut CompositingContext<'_>, layer: PaintLayerId) {
        if self.is_rootmost_fixed_layer(ctx.tree, layer) {
            self.add_fixed_position_layer(layer);
        } else {
            self.remove_fixed_position_layer(ctx, layer);
        }
    }

    fn add_fixed_position_layer(&mut self, layer: PaintLayerId) {
        // Reported by the next sync, once geometry is laid out.
        self.fixed_position_layers.insert(layer);
    }

    /// Drops `layer` from the fixed-position set, unregistering it.
    pub fn remove_fixed_position_layer(&mut self, ctx: &mut CompositingContext<'_>, layer: PaintLayerId) {
        if !self.fixed_position_layers.contains(&layer) {
            return;
        }
        self.unregister_fixed_position_layer(ctx, layer);
        self.fixed_position_layers.remove(&layer);
    }

    /// Returns whether `layer` is in the fixed-position set.
    #[must_use]
    pub fn is_fixed_position_layer(&self, layer: PaintLayerId) -> bool {
        self.fixed_position_layers.contains(&layer)
    }

    /// Returns the anchoring `layer` would be registered with.
    #[must_use]
    pub fn fixed_position_layer_sizing(
        &self,
        ctx: &CompositingContext<'_>,
        layer: PaintLayerId,
    ) -> Option<FixedPositionSizing> {
        let primary = ctx.tree.backing(layer)?.graphics_layer();
        let layer_rect = Rect::from_origin_size(ctx.graphics.position(primary), ctx.graphics.size(primary));
        let positioned = self
            .view
            .map_or(Rect::ZERO, |v| v.custom_fixed_position_layout_rect);
        Some(compute_fixed_position_sizing(
            ctx.tree.style(layer).insets,
            layer_rect,
            ctx.graphics.pixel_alignment_offset(primary),
            positioned,
        ))
    }

    fn register_or_update_fixed_position_layer(
        &mut self,
        ctx: &mut CompositingContext<'_>,
        layer: PaintLayerId,
    ) {
        debug_assert!(
            self.fixed_position_layers.contains(&layer),
            "registering a layer outside the fixed-position set"
        );
        if self.root_layer_attachment == RootLayerAttachment::Unattached {
            return;
        }
        let Some(sizing) = self.fixed_position_layer_sizing(ctx, layer) else {
            return;
        };
        if self.fixed_position_sizings.get(&layer) == Some(&sizing) {
            return;
        }
        let Some(primary) = ctx.tree.backing(layer).map(|b| b.graphics_layer()) else {
            return;
        };
        let platform = ctx.graphics.platform_layer(primary);
        let during_flush = self.enclosing_compositor_flushing_layers(ctx);
        let Some(client) = ctx.client.as_deref_mut() else {
            return;
        };
        client.add_or_update_fixed_position_layer(
            platform,
            sizing.anchors,
            sizing.bounds,
            sizing.alignment_offset,
            during_flush,
        );
        self.fixed_position_sizings.insert(layer, sizing);

        #[cfg(feature = "trace-rich")]
        ctx.tracer.fixed_layer(&FixedLayerEvent {
            frame: self.env.frame,
            layer_index: layer.index(),
            registered: true,
        });
    }

    fn unregister_fixed_position_layer(&mut self, ctx: &mut CompositingContext<'_>, layer: PaintLayerId) {
        // Only layers the client has seen get a matching removal.
        if self.fixed_position_sizings.remove(&layer).is_none() {
            return;
        }
        let Some(primary) = ctx.tree.backing(layer).map(|b| b.graphics_layer()) else {
            return;
        };
        let platform = ctx.graphics.platform_layer(primary);
        let during_flush = self.enclosing_compositor_flushing_layers(ctx);
        let Some(client) = ctx.client.as_deref_mut() else {
            return;
        };
        client.remove_fixed_position_layer(platform, during_flush);

        #[cfg(feature = "trace-rich")]
        ctx.tracer.fixed_layer(&FixedLayerEvent {
            frame: self.env.frame,
            layer_index: layer.index(),
            registered: false,
        });
    }

    /// Unregisters every fixed-position layer, keeping the set.
    pub(crate) fn unregister_all_fixed_position_layers(&mut self, ctx: &mut CompositingContext<'_>) {
        for layer in sorted(self.fixed_position_layers.iter().copied()) {
            self.unregister_fixed_position_layer(ctx, layer);
        }
    }

    /// Reports every fixed-position layer whose anchoring differs from
    /// what the client last saw.
    pub(crate) fn sync_fixed_position_layers(&mut self, ctx: &mut CompositingContext<'_>) {
        for layer in sorted(self.fixed_position_layers.iter().copied()) {
            self.register_or_update_fixed_position_layer(ctx, layer);
        }
    }

    /// Returns whether this compositor or one in an ancestor document is
    /// flushing.
    pub(crate) fn enclosing_compositor_flushing_layers(&self, ctx: &CompositingContext<'_>) -> bool {
        if self.flushing_layers {
            return true;
        }
        let mut parent = self.env.owner.map(|o| o.parent_frame);
        // Bounded by the frame count; frame trees are acyclic.
        while let Some(frame) = parent {
            let Some(contents) = ctx.frames.contents(frame) else {
                break;
            };
            if contents.is_flushing_layers() {
                return true;
            }
            parent = contents.parent_frame();
        }
        false
    }

    /// Records and reports the scrolling layer pair of `layer`'s backing.
    pub(crate) fn scrolling_layer_added_or_updated(
        &mut self,
        ctx: &mut CompositingContext<'_>,
        layer: PaintLayerId,
    ) {
        let Some(backing) = ctx.tree.backing(layer) else {
            return;
        };
        let (Some(scrolling), Some(contents)) = (backing.scrolling_layer(), backing.scrolling_contents_layer())
        else {
            return;
        };
        let Some(config) = ctx.tree.style(layer).accelerated_scrolling else {
            return;
        };
        let registration = ScrollingRegistration {
            node: config.node,
            scrolling: ctx.graphics.platform_layer(scrolling),
            contents: ctx.graphics.platform_layer(contents),
            size: config.content_size,
        };
        self.scrolling_layers.insert(layer, registration);
        if self.view.is_some_and(|v| v.in_page_cache) {
            return;
        }
        if let Some(client) = ctx.client.as_deref_mut() {
            client.add_or_update_scrolling_layer(
                registration.node,
                registration.scrolling,
                registration.contents,
                registration.size,
            );
        }
    }

    /// Forgets the scrolling layer pair of `layer`, unregistering it.
    pub(crate) fn scrolling_layer_removed(&mut self, ctx: &mut CompositingContext<'_>, layer: PaintLayerId) {
        let Some(registration) = self.scrolling_layers.remove(&layer) else {
            return;
        };
        if self.view.is_some_and(|v| v.in_page_cache) {
            return;
        }
        if let Some(client) = ctx.client.as_deref_mut() {
            client.remove_scrolling_layer(registration.node, registration.scrolling, registration.contents);
        }
    }

    pub(crate) fn register_all_scrolling_layers(&mut self, ctx: &mut CompositingContext<'_>) {
        let Some(client) = ctx.client.as_deref_mut() else {
            return;
        };
        for layer in sorted(self.scrolling_layers.keys().copied()) {
            let r = self.scrolling_layers[&layer];
            client.add_or_update_scrolling_layer(r.node, r.scrolling, r.contents, r.size);
        }
    }

    pub(crate) fn unregister_all_scrolling_layers(&mut self, ctx: &mut CompositingContext<'_>) {
        let Some(client) = ctx.client.as_deref_mut() else {
            return;
        };
        for layer in sorted(self.scrolling_layers.keys().copied()) {
            let r = self.scrolling_layers[&layer];
            client.remove_scrolling_layer(r.node, r.scrolling, r.contents);
        }
    }

    /// Returns whether `layer`'s scrolling layer pair is registered.
    #[must_use]
    pub fn is_scrolling_layer(&self, layer: PaintLayerId) -> bool {
        self.scrolling_layers.contains_key(&layer)
    }
}

/// Hash-set order is unspecified; clients see layers in slot order.
fn sorted(layers: impl Iterator<Item = PaintLayerId>) -> Vec<PaintLayerId> {
    let mut v: Vec<_> = layers.collect();
    v.sort_unstable();
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Length;

    const VIEWPORT: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

    #[test]
    fn right_bottom_anchor_measures_from_far_edges() {
        let insets = Insets {
            right: Length::Px(10.0),
            bottom: Length::Px(10.0),
            ..Insets::default()
        };
        let s = compute_fixed_position_sizing(
            insets,
            Rect::new(690.0, 490.0, 790.0, 590.0),
            Vec2::ZERO,
            VIEWPORT,
        );
        assert_eq!(s.anchors, FixedPositionAnchors::RIGHT | FixedPositionAnchors::BOTTOM);
        assert_eq!(s.bounds, Rect::new(10.0, 10.0, 110.0, 110.0));
    }

    #[test]
    fn all_auto_defaults_to_left_top() {
        let s = compute_fixed_position_sizing(
            Insets::default(),
            Rect::new(20.0, 30.0, 70.0, 80.0),
            Vec2::new(0.25, 0.0),
            Rect::new(5.0, 5.0, 805.0, 605.0),
        );
        assert_eq!(s.anchors, FixedPositionAnchors::LEFT | FixedPositionAnchors::TOP);
        assert_eq!(s.bounds, Rect::new(15.0, 25.0, 65.0, 75.0));
        assert_eq!(s.alignment_offset, Vec2::new(0.25, 0.0));
    }

    #[test]
    fn left_wins_the_offset_when_both_edges_are_set() {
        let insets = Insets {
            left: Length::Px(0.0),
            right: Length::Px(0.0),
            top: Length::Px(0.0),
            ..Insets::default()
        };
        let s = compute_fixed_position_sizing(insets, Rect::new(40.0, 0.0, 760.0, 50.0), Vec2::ZERO, VIEWPORT);
        assert_eq!(
            s.anchors,
            FixedPositionAnchors::LEFT | FixedPositionAnchors::RIGHT | FixedPositionAnchors::TOP
        );
        assert_eq!(s.bounds.origin(), Point::new(40.0, 0.0));
    }
}
