// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rebuilding the graphics-layer hierarchy from composited paint layers.

use alloc::vec::Vec;

use kurbo::Rect;

use super::requirements::paint_order_children;
use super::{CompositingContext, Compositor, GeometryUpdateDepth, RootLayerAttachment};
use crate::id::{GraphicsLayerId, PaintLayerId};
use crate::paint::{PaintLayerTree, PaintOrderList, RendererKind};

impl Compositor {
    /// Returns the nearest composited ancestor of `layer`, or `layer` itself
    /// when `include_self` is set and it is composited.
    #[must_use]
    pub fn enclosing_compositing_layer(
        &self,
        tree: &PaintLayerTree,
        layer: PaintLayerId,
        include_self: bool,
    ) -> Option<PaintLayerId> {
        if include_self && tree.is_composited(layer) {
            return Some(layer);
        }
        let mut cur = tree.parent(layer);
        while let Some(l) = cur {
            if tree.is_composited(l) {
                return Some(l);
            }
            cur = tree.parent(l);
        }
        None
    }

    /// Returns the bounds of everything `layer` paints into its own backing,
    /// in `ancestor`'s coordinates.
    ///
    /// Non-composited descendants (and a non-composited reflection) are
    /// included unless the layer clips or masks them. The root covers at
    /// least the whole document.
    #[must_use]
    pub fn calculate_composited_bounds(
        &self,
        tree: &PaintLayerTree,
        layer: PaintLayerId,
        ancestor: PaintLayerId,
    ) -> Rect {
        if !self.can_be_composited(tree, layer) {
            return Rect::ZERO;
        }
        let style = tree.style(layer);
        let mut bounds = tree.bounding_box(layer);

        if tree.is_root(layer) {
            if let Some(view) = self.view {
                bounds = unite(bounds, view.document_rect);
            }
        }
        if !style.clips_descendants() && !style.has_mask {
            if let Some(reflection) = tree.reflection_layer(layer) {
                if !tree.is_composited(reflection) {
                    bounds = unite(bounds, self.calculate_composited_bounds(tree, reflection, layer));
                }
            }
            let lists: &[PaintOrderList] = if tree.is_stacking_context(layer) {
                &PaintOrderList::ALL
            } else {
                &[PaintOrderList::NormalFlow]
            };
            for &list in lists {
                for child in tree.children(layer, list) {
                    if !tree.is_composited(child) {
                        bounds = unite(bounds, self.calculate_composited_bounds(tree, child, layer));
                    }
                }
            }
        }

        // A composited layer's transform lives on its graphics layer.
        if !tree.is_composited(layer) {
            if let Some(t) = style.transform {
                bounds = t.map_rect(bounds);
            }
        }

        bounds + tree.convert_to_layer_coords(layer, Some(ancestor))
    }

    /// Recomputes the composited bounds of `layer` and its composited
    /// reflection.
    pub(crate) fn update_composited_bounds(&self, ctx: &mut CompositingContext<'_>, layer: PaintLayerId) {
        let bounds = self.calculate_composited_bounds(ctx.tree, layer, layer);
        if let Some(backing) = ctx.tree.backing_mut(layer) {
            backing.set_composited_bounds(bounds);
        }
        if let Some(reflection) = ctx.tree.reflection_layer(layer) {
            if ctx.tree.is_composited(reflection) {
                let bounds = self.calculate_composited_bounds(ctx.tree, reflection, reflection);
                if let Some(backing) = ctx.tree.backing_mut(reflection) {
                    backing.set_composited_bounds(bounds);
                }
            }
        }
    }

    /// Rebuilds the graphics-layer children of every composited layer under
    /// `layer`, appending the layers that `layer`'s subtree contributes to
    /// its composited ancestor onto `child_list`.
    ///
    /// # Panics
    ///
    /// Panics if a paint-order list is still dirty; the requirements pass
    /// must run first.
    pub fn rebuild_compositing_layer_tree(
        &mut self,
        ctx: &mut CompositingContext<'_>,
        layer: PaintLayerId,
        depth: u32,
        child_list: &mut Vec<GraphicsLayerId>,
    ) {
        assert!(
            !ctx.tree.lists_dirty(layer),
            "paint-order lists must be clean before rebuilding"
        );
        let composited = ctx.tree.is_composited(layer);
        if composited {
            self.update_composited_bounds(ctx, layer);
            self.update_graphics_layer_configuration(ctx, layer);
            self.update_graphics_layer_geometry(ctx, layer);
            if ctx.tree.parent(layer).is_none() {
                self.update_root_layer_position(ctx);
            }
        }

        let mut layer_children = Vec::new();
        let stacking = ctx.tree.is_stacking_context(layer);
        if stacking {
            for child in paint_order_children(ctx.tree, layer, PaintOrderList::NegativeZ) {
                self.rebuild_compositing_layer_tree(ctx, child, depth + 1, &mut layer_children);
            }
            // Foreground content paints over negative z-index children.
            if let Some(fg) = ctx.tree.backing(layer).and_then(|b| b.foreground_layer()) {
                layer_children.push(fg);
            }
        }
        for child in paint_order_children(ctx.tree, layer, PaintOrderList::NormalFlow) {
            self.rebuild_compositing_layer_tree(ctx, child, depth + 1, &mut layer_children);
        }
        if stacking {
            for child in paint_order_children(ctx.tree, layer, PaintOrderList::PositiveZ) {
                self.rebuild_compositing_layer_tree(ctx, child, depth + 1, &mut layer_children);
            }
        }

        let Some(backing) = ctx.tree.backing(layer).copied() else {
            child_list.append(&mut layer_children);
            return;
        };

        let kind = ctx.tree.style(layer).kind;
        let parented = matches!(kind, RendererKind::Frame { .. }) && self.parent_frame_content_layers(ctx, layer);
        if !parented {
            // With a clip or scroller the controls are already siblings of it.
            if !backing.has_clipping_layer() && backing.scrolling_layer().is_none() {
                layer_children.extend(backing.overflow_control_layers());
            }
            ctx.graphics.set_children(backing.parent_for_sublayers(), &layer_children);
        }

        let hidden_placeholder = kind == RendererKind::FullScreenPlaceholder
            && self.view.is_some_and(|v| v.is_animating_full_screen);
        if !hidden_placeholder {
            child_list.push(backing.child_for_superlayers());
        }
    }

    /// Grafts the root layer of the document hosted by frame-owner `layer`
    /// under the owner's backing. Returns whether it did.
    pub(crate) fn parent_frame_content_layers(
        &mut self,
        ctx: &mut CompositingContext<'_>,
        layer: PaintLayerId,
    ) -> bool {
        let RendererKind::Frame { frame, .. } = ctx.tree.style(layer).kind else {
            return false;
        };
        let Some(inner) = ctx.frames.contents(frame) else {
            return false;
        };
        if inner.root_layer_attachment() != RootLayerAttachment::ViaEnclosingFrame {
            return false;
        }
        let Some(root) = inner.root_graphics_layer() else {
            return false;
        };
        let Some(backing) = ctx.tree.backing(layer) else {
            return false;
        };
        let hosting = backing.parent_for_sublayers();
        ctx.graphics.set_children(hosting, &[root]);
        true
    }

    /// Refreshes bounds, configuration, and geometry of every composited
    /// layer under `layer` without touching the hierarchy.
    pub fn update_layer_tree_geometry(&mut self, ctx: &mut CompositingContext<'_>, layer: PaintLayerId, depth: u32) {
        if ctx.tree.is_composited(layer) {
            self.update_composited_bounds(ctx, layer);
            self.update_graphics_layer_configuration(ctx, layer);
            self.update_graphics_layer_geometry(ctx, layer);
            if ctx.tree.parent(layer).is_none() {
                self.update_root_layer_position(ctx);
            }
        }
        for list in PaintOrderList::ALL {
            for child in paint_order_children(ctx.tree, layer, list) {
                self.update_layer_tree_geometry(ctx, child, depth + 1);
            }
        }
    }

    /// Refreshes the geometry of composited descendants of
    /// `compositing_ancestor`, starting at `layer`.
    ///
    /// With [`GeometryUpdateDepth::CompositingChildren`] the walk stops at
    /// the first composited layer on each path.
    pub fn update_compositing_descendant_geometry(
        &mut self,
        ctx: &mut CompositingContext<'_>,
        compositing_ancestor: PaintLayerId,
        layer: PaintLayerId,
        depth: GeometryUpdateDepth,
    ) {
        if layer != compositing_ancestor && ctx.tree.is_composited(layer) {
            self.update_composited_bounds(ctx, layer);
            self.update_graphics_layer_geometry(ctx, layer);
            if depth == GeometryUpdateDepth::CompositingChildren {
                return;
            }
        }
        if !ctx.tree.has_compositing_descendant(layer) {
            return;
        }
        for list in PaintOrderList::ALL {
            for child in paint_order_children(ctx.tree, layer, list) {
                self.update_compositing_descendant_geometry(ctx, compositing_ancestor, child, depth);
            }
        }
    }

    /// Geometry refresh of one composited layer after layout, optionally
    /// reaching into its composited descendants.
    pub fn update_backing_after_layout(
        &mut self,
        ctx: &mut CompositingContext<'_>,
        layer: PaintLayerId,
        depth: GeometryUpdateDepth,
    ) {
        if !ctx.tree.is_composited(layer) {
            return;
        }
        self.update_composited_bounds(ctx, layer);
        self.update_graphics_layer_geometry(ctx, layer);
        self.update_compositing_descendant_geometry(ctx, layer, layer, depth);
    }

    /// Invalidates `rect` (in root coordinates) in every backing it
    /// intersects.
    pub fn repaint_composited_layers_absolute_rect(&self, ctx: &mut CompositingContext<'_>, rect: Rect) {
        if let Some(root) = ctx.tree.root() {
            self.recursive_repaint_layer_rect(ctx, root, rect);
        }
    }

    fn recursive_repaint_layer_rect(&self, ctx: &mut CompositingContext<'_>, layer: PaintLayerId, rect: Rect) {
        if ctx.tree.is_composited(layer) {
            let local = rect - ctx.tree.convert_to_layer_coords(layer, None);
            self.set_backing_needs_repaint_in_rect(ctx, layer, local);
        }
        for list in PaintOrderList::ALL {
            for child in paint_order_children(ctx.tree, layer, list) {
                self.recursive_repaint_layer_rect(ctx, child, rect);
            }
        }
    }

    /// Parents `child`'s backing under `parent`'s, or detaches it when
    /// `parent` is `None`.
    ///
    /// A parent that is not composited yet is ignored; the next rebuild
    /// places the child.
    ///
    /// # Panics
    ///
    /// Panics if `child` is not composited.
    pub fn set_compositing_parent(
        &self,
        ctx: &mut CompositingContext<'_>,
        child: PaintLayerId,
        parent: Option<PaintLayerId>,
    ) {
        let Some(hosted) = ctx.tree.backing(child).map(|b| b.child_for_superlayers()) else {
            panic!("compositing parent set on a layer without a backing");
        };
        match parent {
            None => ctx.graphics.remove_from_parent(hosted),
            Some(parent) => {
                if let Some(hosting) = ctx.tree.backing(parent).map(|b| b.parent_for_sublayers()) {
                    ctx.graphics.add_child(hosting, hosted);
                }
            }
        }
    }

    /// Detaches every composited child of `layer`'s backing.
    ///
    /// # Panics
    ///
    /// Panics if `layer` is not composited.
    pub fn remove_composited_children(&self, ctx: &mut CompositingContext<'_>, layer: PaintLayerId) {
        let Some(hosting) = ctx.tree.backing(layer).map(|b| b.parent_for_sublayers()) else {
            panic!("composited children removed from a layer without a backing");
        };
        ctx.graphics.remove_all_children(hosting);
    }

    /// Destroys the backings of `layer`, its reflection, and all of its
    /// descendants.
    pub fn clear_backing_for_layer_including_descendants(
        &mut self,
        ctx: &mut CompositingContext<'_>,
        layer: PaintLayerId,
    ) {
        self.clear_backing(ctx, layer);
        if let Some(reflection) = ctx.tree.reflection_layer(layer) {
            self.clear_backing(ctx, reflection);
        }
        for list in PaintOrderList::ALL {
            for child in paint_order_children(ctx.tree, layer, list) {
                self.clear_backing_for_layer_including_descendants(ctx, child);
            }
        }
    }
}

fn unite(a: Rect, b: Rect) -> Rect {
    if b.is_zero_area() {
        a
    } else if a.is_zero_area() {
        b
    } else {
        a.union(b)
    }
}
