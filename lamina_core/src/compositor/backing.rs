// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backings: the graphics layers owned by one composited paint layer.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Vec2};

use super::{CompositingChangeRepaint, CompositingContext, Compositor, HostRequest, RootLayerAttachment};
use crate::graphics::GraphicsLayerStore;
use crate::id::{GraphicsLayerId, PaintLayerId};
use crate::paint::{PaintOrderList, RendererKind};
use crate::transform::Transform3d;
#[cfg(feature = "trace-rich")]
use crate::trace::{BackingChange, BackingEvent};

/// The graphics layers of one composited paint layer.
///
/// Every backing has a primary layer. Clipping, foreground, scrolling, and
/// overflow-control layers come and go with the paint layer's configuration.
///
/// ```text
/// primary
///  +- clipping            (clips composited descendants)
///  |   +- scrolling       (accelerated overflow scrolling)
///  |       +- scrolling contents
///  +- horizontal scrollbar / vertical scrollbar / scroll corner
/// ```
///
/// Composited descendants are parented under
/// [`parent_for_sublayers`](Self::parent_for_sublayers).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Backing {
    graphics_layer: GraphicsLayerId,
    clipping_layer: Option<GraphicsLayerId>,
    foreground_layer: Option<GraphicsLayerId>,
    scrolling_layer: Option<GraphicsLayerId>,
    scrolling_contents_layer: Option<GraphicsLayerId>,
    layer_for_horizontal_scrollbar: Option<GraphicsLayerId>,
    layer_for_vertical_scrollbar: Option<GraphicsLayerId>,
    layer_for_scroll_corner: Option<GraphicsLayerId>,
    composited_bounds: Rect,
    sublayer_offset: Vec2,
}

/// Which optional layers a backing should have.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct BackingConfig {
    pub(crate) clipping: bool,
    pub(crate) foreground: bool,
    pub(crate) scrolling: bool,
    pub(crate) horizontal_scrollbar: bool,
    pub(crate) vertical_scrollbar: bool,
    pub(crate) scroll_corner: bool,
}

impl Backing {
    pub(crate) fn new(graphics: &mut GraphicsLayerStore, name: &'static str) -> Self {
        Self {
            graphics_layer: graphics.create_layer(name),
            clipping_layer: None,
            foreground_layer: None,
            scrolling_layer: None,
            scrolling_contents_layer: None,
            layer_for_horizontal_scrollbar: None,
            layer_for_vertical_scrollbar: None,
            layer_for_scroll_corner: None,
            composited_bounds: Rect::ZERO,
            sublayer_offset: Vec2::ZERO,
        }
    }

    /// The primary graphics layer.
    #[must_use]
    pub const fn graphics_layer(&self) -> GraphicsLayerId {
        self.graphics_layer
    }

    /// The layer clipping composited descendants, if any.
    #[must_use]
    pub const fn clipping_layer(&self) -> Option<GraphicsLayerId> {
        self.clipping_layer
    }

    /// Returns whether descendants are clipped.
    #[must_use]
    pub const fn has_clipping_layer(&self) -> bool {
        self.clipping_layer.is_some()
    }

    /// The layer painting foreground content above negative z-index
    /// children, if any.
    #[must_use]
    pub const fn foreground_layer(&self) -> Option<GraphicsLayerId> {
        self.foreground_layer
    }

    /// The accelerated scrolling layer, if any.
    #[must_use]
    pub const fn scrolling_layer(&self) -> Option<GraphicsLayerId> {
        self.scrolling_layer
    }

    /// The scrolled contents under [`scrolling_layer`](Self::scrolling_layer).
    #[must_use]
    pub const fn scrolling_contents_layer(&self) -> Option<GraphicsLayerId> {
        self.scrolling_contents_layer
    }

    /// The horizontal scrollbar layer, if any.
    #[must_use]
    pub const fn layer_for_horizontal_scrollbar(&self) -> Option<GraphicsLayerId> {
        self.layer_for_horizontal_scrollbar
    }

    /// The vertical scrollbar layer, if any.
    #[must_use]
    pub const fn layer_for_vertical_scrollbar(&self) -> Option<GraphicsLayerId> {
        self.layer_for_vertical_scrollbar
    }

    /// The scroll corner layer, if any.
    #[must_use]
    pub const fn layer_for_scroll_corner(&self) -> Option<GraphicsLayerId> {
        self.layer_for_scroll_corner
    }

    /// Bounds of everything painted into the primary layer, in the paint
    /// layer's local coordinates.
    #[must_use]
    pub const fn composited_bounds(&self) -> Rect {
        self.composited_bounds
    }

    /// Origin of [`parent_for_sublayers`](Self::parent_for_sublayers) in the
    /// paint layer's local coordinates.
    #[must_use]
    pub const fn sublayer_offset(&self) -> Vec2 {
        self.sublayer_offset
    }

    /// The layer composited descendants are parented under.
    #[must_use]
    pub fn parent_for_sublayers(&self) -> GraphicsLayerId {
        self.scrolling_contents_layer
            .or(self.clipping_layer)
            .unwrap_or(self.graphics_layer)
    }

    /// The layer this backing is parented by.
    #[must_use]
    pub const fn child_for_superlayers(&self) -> GraphicsLayerId {
        self.graphics_layer
    }

    /// Overflow-control layers, in stacking order.
    pub fn overflow_control_layers(&self) -> impl Iterator<Item = GraphicsLayerId> {
        [
            self.layer_for_horizontal_scrollbar,
            self.layer_for_vertical_scrollbar,
            self.layer_for_scroll_corner,
        ]
        .into_iter()
        .flatten()
    }

    /// Every graphics layer owned by this backing.
    pub fn layers(&self) -> impl Iterator<Item = GraphicsLayerId> {
        [
            Some(self.graphics_layer),
            self.clipping_layer,
            self.foreground_layer,
            self.scrolling_layer,
            self.scrolling_contents_layer,
        ]
        .into_iter()
        .flatten()
        .chain(self.overflow_control_layers())
    }

    pub(crate) fn set_composited_bounds(&mut self, bounds: Rect) {
        self.composited_bounds = bounds;
    }

    pub(crate) fn set_sublayer_offset(&mut self, offset: Vec2) {
        self.sublayer_offset = offset;
    }

    /// Creates and destroys optional layers to match `config`. Returns
    /// whether anything changed.
    pub(crate) fn configure(&mut self, graphics: &mut GraphicsLayerStore, config: &BackingConfig) -> bool {
        let mut changed = false;
        changed |= toggle(graphics, &mut self.clipping_layer, config.clipping, "clipping");
        changed |= toggle(graphics, &mut self.foreground_layer, config.foreground, "foreground");
        changed |= toggle(graphics, &mut self.scrolling_layer, config.scrolling, "scrolling");
        changed |= toggle(
            graphics,
            &mut self.scrolling_contents_layer,
            config.scrolling,
            "scrolling contents",
        );
        changed |= toggle(
            graphics,
            &mut self.layer_for_horizontal_scrollbar,
            config.horizontal_scrollbar,
            "horizontal scrollbar",
        );
        changed |= toggle(
            graphics,
            &mut self.layer_for_vertical_scrollbar,
            config.vertical_scrollbar,
            "vertical scrollbar",
        );
        changed |= toggle(
            graphics,
            &mut self.layer_for_scroll_corner,
            config.scroll_corner,
            "scroll corner",
        );
        if changed {
            self.update_internal_hierarchy(graphics);
        }
        changed
    }

    fn update_internal_hierarchy(&self, graphics: &mut GraphicsLayerStore) {
        // Without a clip or scroller the primary layer is itself the parent
        // for sublayers; its children are managed by the tree builder.
        if let Some(top) = self.clipping_layer.or(self.scrolling_layer) {
            let mut children = Vec::with_capacity(4);
            children.push(top);
            children.extend(self.overflow_control_layers());
            graphics.set_children(self.graphics_layer, &children);
        }
        if let (Some(clip), Some(scroll)) = (self.clipping_layer, self.scrolling_layer) {
            graphics.set_children(clip, &[scroll]);
        }
        if let (Some(scroll), Some(contents)) = (self.scrolling_layer, self.scrolling_contents_layer) {
            graphics.set_children(scroll, &[contents]);
        }
    }

    /// Destroys every graphics layer of the backing. Composited descendants
    /// parented under it are orphaned.
    pub(crate) fn destroy(self, graphics: &mut GraphicsLayerStore) {
        for layer in self.layers() {
            graphics.destroy_layer_and_orphan_children(layer);
        }
    }
}

fn toggle(
    graphics: &mut GraphicsLayerStore,
    slot: &mut Option<GraphicsLayerId>,
    wanted: bool,
    name: &'static str,
) -> bool {
    match (*slot, wanted) {
        (None, true) => {
            *slot = Some(graphics.create_layer(name));
            true
        }
        (Some(layer), false) => {
            graphics.destroy_layer_and_orphan_children(layer);
            *slot = None;
            true
        }
        _ => false,
    }
}

impl Compositor {
    /// Creates or destroys the backing of `layer` to match
    /// [`needs_to_be_composited`](Self::needs_to_be_composited). Returns
    /// whether the backing changed.
    pub fn update_backing(
        &mut self,
        ctx: &mut CompositingContext<'_>,
        layer: PaintLayerId,
        repaint: CompositingChangeRepaint,
    ) -> bool {
        let mut layer_changed = false;

        if self.needs_to_be_composited(ctx, layer) {
            self.enable_compositing_mode(ctx, true);

            // 3-D transforms make absolute bounds meaningless for overlap.
            if self.can_render_3d_transforms() && ctx.tree.style(layer).has_3d_transform() {
                self.compositing_consults_overlap = false;
            }

            if !ctx.tree.is_composited(layer) {
                if repaint == CompositingChangeRepaint::Now {
                    self.repaint_on_compositing_change(ctx, layer);
                }
                let name = if ctx.tree.is_root(layer) {
                    "root"
                } else if ctx.tree.is_reflection(layer) {
                    "reflection"
                } else {
                    "layer"
                };
                let backing = Backing::new(ctx.graphics, name);
                ctx.tree.set_backing(layer, backing);
                layer_changed = true;

                #[cfg(feature = "trace-rich")]
                {
                    let reasons = self.compositing_reasons(ctx, layer);
                    ctx.tracer.backing(&BackingEvent {
                        frame: self.env.frame,
                        layer_index: layer.index(),
                        change: BackingChange::Created(reasons),
                    });
                }
            }
            self.update_fixed_position_status(ctx, layer);
        } else if self.clear_backing(ctx, layer) {
            layer_changed = true;

            // Painting moves back into an ancestor.
            ctx.tree.compute_repaint_rects(layer);
            if repaint == CompositingChangeRepaint::Now {
                self.repaint_on_compositing_change(ctx, layer);
            }
        }

        if layer_changed {
            let kind = ctx.tree.style(layer).kind;
            match kind {
                RendererKind::Video { .. } => {
                    self.host_requests
                        .push(HostRequest::AcceleratedRenderingStateChanged { layer });
                }
                RendererKind::Frame { frame, .. } => {
                    if ctx
                        .frames
                        .contents(frame)
                        .is_some_and(|inner| inner.in_compositing_mode())
                    {
                        self.host_requests
                            .push(HostRequest::UpdateRootLayerAttachment { frame });
                    }
                }
                _ => {}
            }
        }

        layer_changed
    }

    /// Destroys the backing of `layer`, dropping its fixed-position and
    /// scrolling registrations. Returns whether there was one.
    pub(crate) fn clear_backing(&mut self, ctx: &mut CompositingContext<'_>, layer: PaintLayerId) -> bool {
        if !ctx.tree.is_composited(layer) {
            return false;
        }
        // The reflected layer's primary still points at our replica.
        if let Some(source) = ctx.tree.reflected_layer(layer) {
            if let Some(src) = ctx.tree.backing(source) {
                ctx.graphics.set_replicated_by(src.graphics_layer(), None);
            }
        }
        self.remove_fixed_position_layer(ctx, layer);
        self.scrolling_layer_removed(ctx, layer);

        if let Some(backing) = ctx.tree.take_backing(layer) {
            backing.destroy(ctx.graphics);
        }

        #[cfg(feature = "trace-rich")]
        ctx.tracer.backing(&BackingEvent {
            frame: self.env.frame,
            layer_index: layer.index(),
            change: BackingChange::Destroyed,
        });
        true
    }

    /// Updates the backing of `layer` and its layer configuration. Returns
    /// whether the backing was created or destroyed or its hierarchy
    /// changed.
    pub fn update_layer_compositing_state(
        &mut self,
        ctx: &mut CompositingContext<'_>,
        layer: PaintLayerId,
        repaint: CompositingChangeRepaint,
    ) -> bool {
        let mut changed = self.update_backing(ctx, layer, repaint);
        // Descendants' compositing state may still be stale here.
        if ctx.tree.is_composited(layer) && self.update_graphics_layer_configuration(ctx, layer) {
            changed = true;
        }
        changed
    }

    /// Brings the optional layers of `layer`'s backing in line with its
    /// style. Returns whether the layer hierarchy changed.
    pub(crate) fn update_graphics_layer_configuration(
        &mut self,
        ctx: &mut CompositingContext<'_>,
        layer: PaintLayerId,
    ) -> bool {
        let Some(mut backing) = ctx.tree.backing(layer).copied() else {
            return false;
        };
        let style = *ctx.tree.style(layer);
        let config = BackingConfig {
            clipping: self.clips_compositing_descendants(ctx.tree, layer),
            foreground: ctx.tree.is_stacking_context(layer)
                && ctx.tree.child_count(layer, PaintOrderList::NegativeZ) > 0,
            scrolling: style.accelerated_scrolling.is_some(),
            horizontal_scrollbar: style.overflow_controls.horizontal_scrollbar.is_some(),
            vertical_scrollbar: style.overflow_controls.vertical_scrollbar.is_some(),
            scroll_corner: style.overflow_controls.scroll_corner.is_some(),
        };
        let had_scrolling = backing.scrolling_layer().is_some();
        let mut changed = backing.configure(ctx.graphics, &config);

        let primary = backing.graphics_layer();
        let replica = ctx
            .tree
            .reflection_layer(layer)
            .and_then(|r| ctx.tree.backing(r))
            .map(Backing::graphics_layer);
        ctx.graphics.set_replicated_by(primary, replica);

        // An unattached root would paint into a layer nobody shows.
        let draws = style.paints_content
            && !(ctx.tree.is_root(layer) && self.root_layer_attachment == RootLayerAttachment::Unattached);
        ctx.graphics.set_draws_content(primary, draws);
        if let Some(fg) = backing.foreground_layer() {
            ctx.graphics.set_draws_content(fg, draws);
        }
        for control in backing.overflow_control_layers() {
            ctx.graphics.set_draws_content(control, true);
        }
        ctx.graphics.set_masks_to_bounds(primary, false);
        if let Some(clip) = backing.clipping_layer() {
            ctx.graphics.set_masks_to_bounds(clip, true);
        }
        if let Some(scroll) = backing.scrolling_layer() {
            ctx.graphics.set_masks_to_bounds(scroll, true);
        }

        if let Some(slot) = ctx.tree.backing_mut(layer) {
            *slot = backing;
        }

        if matches!(style.kind, RendererKind::Frame { .. }) {
            changed |= self.parent_frame_content_layers(ctx, layer);
        }

        let has_scrolling = backing.scrolling_layer().is_some();
        if has_scrolling != had_scrolling || (has_scrolling && changed) {
            if has_scrolling {
                self.scrolling_layer_added_or_updated(ctx, layer);
            } else {
                self.scrolling_layer_removed(ctx, layer);
            }
        }

        changed
    }

    /// Positions and sizes every graphics layer of `layer`'s backing from
    /// its paint layer.
    pub(crate) fn update_graphics_layer_geometry(
        &mut self,
        ctx: &mut CompositingContext<'_>,
        layer: PaintLayerId,
    ) {
        let Some(mut backing) = ctx.tree.backing(layer).copied() else {
            return;
        };
        let tree = &*ctx.tree;
        let style = *tree.style(layer);
        let primary = backing.graphics_layer();

        // Running accelerated animations own these properties.
        if !style.animating.opacity {
            ctx.graphics.set_opacity(primary, style.opacity);
        }
        if !style.animating.transform {
            ctx.graphics
                .set_transform(primary, style.transform.unwrap_or(Transform3d::IDENTITY));
        }

        let ancestor = self.enclosing_compositing_layer(tree, layer, false);
        let parent_origin = ancestor
            .and_then(|a| tree.backing(a))
            .map_or(Vec2::ZERO, Backing::sublayer_offset);
        let bounds = backing.composited_bounds();
        let delta = tree.convert_to_layer_coords(layer, ancestor);
        let position = bounds.origin() + delta - parent_origin;
        let aligned = if self.settings.keep_layers_pixel_aligned {
            position.round()
        } else {
            position
        };
        ctx.graphics.set_position(primary, aligned);
        ctx.graphics.set_pixel_alignment_offset(primary, position - aligned);
        ctx.graphics.set_size(primary, bounds.size());

        let clip_box = tree.bounding_box(layer);
        let mut sublayer_offset = bounds.origin().to_vec2();
        if let Some(clip) = backing.clipping_layer() {
            ctx.graphics.set_position(clip, clip_box.origin() - bounds.origin().to_vec2());
            ctx.graphics.set_size(clip, clip_box.size());
            sublayer_offset = clip_box.origin().to_vec2();
        }
        if let (Some(scroll), Some(contents)) =
            (backing.scrolling_layer(), backing.scrolling_contents_layer())
        {
            let scroll_position = if backing.has_clipping_layer() {
                Point::ZERO
            } else {
                clip_box.origin() - bounds.origin().to_vec2()
            };
            ctx.graphics.set_position(scroll, scroll_position);
            ctx.graphics.set_size(scroll, clip_box.size());
            let scroll_offset = tree.scroll_offset(layer);
            ctx.graphics.set_position(contents, Point::ZERO - scroll_offset);
            let content_size = style
                .accelerated_scrolling
                .map_or(clip_box.size(), |s| s.content_size);
            ctx.graphics.set_size(contents, content_size);
            sublayer_offset = clip_box.origin().to_vec2() - scroll_offset;
        }
        if let Some(fg) = backing.foreground_layer() {
            ctx.graphics.set_position(fg, bounds.origin() - sublayer_offset);
            ctx.graphics.set_size(fg, bounds.size());
        }
        let controls = style.overflow_controls;
        for (control, rect) in [
            (backing.layer_for_horizontal_scrollbar(), controls.horizontal_scrollbar),
            (backing.layer_for_vertical_scrollbar(), controls.vertical_scrollbar),
            (backing.layer_for_scroll_corner(), controls.scroll_corner),
        ] {
            if let (Some(control), Some(rect)) = (control, rect) {
                ctx.graphics.set_position(control, rect.origin() - bounds.origin().to_vec2());
                ctx.graphics.set_size(control, rect.size());
            }
        }

        backing.set_sublayer_offset(sublayer_offset);
        if let Some(slot) = ctx.tree.backing_mut(layer) {
            *slot = backing;
        }
    }

    /// Invalidates `rect` (in `layer`'s local coordinates) in its backing.
    pub fn set_backing_needs_repaint_in_rect(
        &self,
        ctx: &mut CompositingContext<'_>,
        layer: PaintLayerId,
        rect: Rect,
    ) {
        let Some(backing) = ctx.tree.backing(layer).copied() else {
            return;
        };
        let origin = backing.composited_bounds().origin().to_vec2();
        ctx.graphics
            .set_needs_display_in_rect(backing.graphics_layer(), rect - origin);
        if let Some(fg) = backing.foreground_layer() {
            ctx.graphics.set_needs_display_in_rect(fg, rect - origin);
        }
    }

    /// Repaints whatever `layer` painted into (or will paint into) after its
    /// compositing state flips.
    pub(crate) fn repaint_on_compositing_change(
        &mut self,
        ctx: &mut CompositingContext<'_>,
        layer: PaintLayerId,
    ) {
        // Detached layers paint nowhere.
        if !ctx.tree.is_root(layer) && ctx.tree.parent(layer).is_none() {
            return;
        }
        let container = self.enclosing_compositing_layer(ctx.tree, layer, true);
        self.repaint_including_non_compositing_descendants(ctx, layer, container);
        if container.is_none_or(|c| ctx.tree.is_root(c)) {
            // Content moves between the window and a graphics layer.
            self.needs_one_shot_drawing_synchronization = true;
        }
    }

    fn repaint_including_non_compositing_descendants(
        &mut self,
        ctx: &mut CompositingContext<'_>,
        layer: PaintLayerId,
        container: Option<PaintLayerId>,
    ) {
        let rect = ctx.tree.absolute_bounding_box(layer);
        match container {
            Some(c) if ctx.tree.is_composited(c) => {
                let origin = ctx.tree.convert_to_layer_coords(c, None);
                self.set_backing_needs_repaint_in_rect(ctx, c, rect - origin);
            }
            _ => self.window_damage.push(rect),
        }
        for list in PaintOrderList::ALL {
            let children: Vec<_> = ctx.tree.children(layer, list).collect();
            for child in children {
                if !ctx.tree.is_composited(child) {
                    self.repaint_including_non_compositing_descendants(ctx, child, container);
                }
            }
        }
    }
}
