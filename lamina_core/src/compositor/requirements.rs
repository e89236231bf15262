// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deciding which paint layers get a backing.
//!
//! The requirements pass walks the paint-layer tree in painting order
//! (negative z, normal flow, positive z). A layer is composited for one of
//! its own [`CompositingReasons`], because it may paint on top of composited
//! content painted earlier, or because its composited descendants need it as
//! a container (negative z-index children, group opacity/transform, clipping).
//!
//! Backings are created and destroyed during the same walk, so `is_composited`
//! is accurate when the tree builder runs afterwards.

use alloc::vec::Vec;

use bitflags::bitflags;
use kurbo::Rect;

use super::overlap::{OverlapMap, overlap_test_bounds};
use super::{CompositingChangeRepaint, CompositingContext, Compositor};
use crate::client::CompositingTriggers;
use crate::id::{FrameId, PaintLayerId};
use crate::paint::{PaintLayerTree, PaintOrderList, RendererKind};

bitflags! {
    /// Why a paint layer needs a backing of its own.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CompositingReasons: u32 {
        /// 3-D transform, `preserve-3d`, or perspective.
        const THREE_D_TRANSFORM = 1 << 0;
        /// Visible video rendered through an accelerated player.
        const VIDEO = 1 << 1;
        /// Canvas with an accelerated context.
        const CANVAS = 1 << 2;
        /// Plug-in that opted into accelerated compositing.
        const PLUGIN = 1 << 3;
        /// Sub-frame whose document composites through this one.
        const FRAME = 1 << 4;
        /// `backface-visibility: hidden` with 3-D rendering available.
        const BACKFACE_VISIBILITY = 1 << 5;
        /// Clips composited descendants.
        const CLIPS_COMPOSITING_DESCENDANTS = 1 << 6;
        /// Accelerated opacity or transform animation.
        const ANIMATION = 1 << 7;
        /// Placeholder of an element animating into full screen.
        const FULL_SCREEN = 1 << 8;
        /// Fixed to the custom fixed-position rect.
        const POSITION = 1 << 9;
        /// Accelerated overflow scrolling.
        const SCROLLING = 1 << 10;
    }
}

/// Traversal state handed from a layer to its children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompositingState {
    /// Nearest composited ancestor.
    pub compositing_ancestor: Option<PaintLayerId>,
    /// Whether a layer painted earlier under the same parent is composited
    /// (or has composited descendants).
    pub subtree_is_compositing: bool,
    /// Depth below the pass root.
    pub depth: u32,
}

impl CompositingState {
    /// State for the root of a pass.
    #[must_use]
    pub const fn new(compositing_ancestor: Option<PaintLayerId>) -> Self {
        Self {
            compositing_ancestor,
            subtree_is_compositing: false,
            depth: 0,
        }
    }
}

impl Compositor {
    /// Returns the intrinsic reasons `layer` needs a backing.
    ///
    /// Reflection layers answer for the layer they reflect. Plug-ins and
    /// frames whose size is not known yet keep their current state.
    #[must_use]
    pub fn compositing_reasons(&self, ctx: &CompositingContext<'_>, layer: PaintLayerId) -> CompositingReasons {
        let tree = &*ctx.tree;
        let layer = tree.reflected_layer(layer).unwrap_or(layer);
        let style = tree.style(layer);
        let triggers = self.triggers;
        let mut reasons = CompositingReasons::empty();

        if triggers.contains(CompositingTriggers::THREE_D_TRANSFORM) && style.has_3d_transform() {
            reasons |= CompositingReasons::THREE_D_TRANSFORM;
        }

        match style.kind {
            RendererKind::Box => {}
            RendererKind::Video {
                displaying,
                accelerated,
            } => {
                if triggers.contains(CompositingTriggers::VIDEO)
                    && displaying
                    && accelerated
                    && self.has_accelerated_compositing
                {
                    reasons |= CompositingReasons::VIDEO;
                }
            }
            RendererKind::Canvas { accelerated } => {
                if triggers.contains(CompositingTriggers::CANVAS) && accelerated {
                    reasons |= CompositingReasons::CANVAS;
                }
            }
            RendererKind::Plugin {
                allows_accelerated_compositing,
                content_box,
                needs_layout,
            } => {
                if triggers.contains(CompositingTriggers::PLUGIN) && allows_accelerated_compositing {
                    self.compositing_depends_on_geometry.set(true);
                    let composite = if needs_layout {
                        tree.is_composited(layer)
                    } else {
                        // A 1x1 plug-in is a tracking pixel.
                        content_box.area() > 1.0
                    };
                    if composite {
                        reasons |= CompositingReasons::PLUGIN;
                    }
                }
            }
            RendererKind::Frame {
                frame,
                content_box,
                needs_layout,
            } => {
                if self.requires_compositing_for_frame(ctx, layer, frame, content_box, needs_layout) {
                    reasons |= CompositingReasons::FRAME;
                }
            }
            RendererKind::FullScreenPlaceholder => {
                if self.view.is_some_and(|v| v.is_animating_full_screen) {
                    reasons |= CompositingReasons::FULL_SCREEN;
                }
            }
        }

        if self.can_render_3d_transforms() && style.backface_hidden {
            reasons |= CompositingReasons::BACKFACE_VISIBILITY;
        }
        if self.clips_compositing_descendants(tree, layer) {
            reasons |= CompositingReasons::CLIPS_COMPOSITING_DESCENDANTS;
        }
        if triggers.contains(CompositingTriggers::ANIMATION)
            && (style.animating.opacity || style.animating.transform)
        {
            reasons |= CompositingReasons::ANIMATION;
        }
        if style.has_custom_fixed_position() {
            reasons |= CompositingReasons::POSITION;
        }
        if style.accelerated_scrolling.is_some() {
            reasons |= CompositingReasons::SCROLLING;
        }
        reasons
    }

    /// Returns whether `layer` needs a backing for an intrinsic reason.
    #[must_use]
    pub fn requires_compositing_layer(&self, ctx: &CompositingContext<'_>, layer: PaintLayerId) -> bool {
        !self.compositing_reasons(ctx, layer).is_empty()
    }

    /// Returns whether `layer` may have a backing at all.
    #[must_use]
    pub fn can_be_composited(&self, tree: &PaintLayerTree, layer: PaintLayerId) -> bool {
        self.has_accelerated_compositing && tree.style(layer).self_painting
    }

    /// Returns whether `layer` should have a backing given the flags
    /// computed so far in the current pass.
    #[must_use]
    pub fn needs_to_be_composited(&self, ctx: &CompositingContext<'_>, layer: PaintLayerId) -> bool {
        if !self.can_be_composited(ctx.tree, layer) {
            return false;
        }
        self.requires_compositing_layer(ctx, layer)
            || ctx.tree.must_overlap_composited_layers(layer)
            || (self.compositing && ctx.tree.is_root(layer))
    }

    /// Returns whether `layer` has composited descendants it must clip.
    #[must_use]
    pub fn clips_compositing_descendants(&self, tree: &PaintLayerTree, layer: PaintLayerId) -> bool {
        tree.has_compositing_descendant(layer) && tree.style(layer).clips_descendants()
    }

    /// Returns whether `layer` must be composited as soon as one of its
    /// descendants is: transforms, group opacity, masks, and reflections
    /// apply to the whole subtree.
    #[must_use]
    pub fn requires_compositing_when_descendants_are_compositing(
        &self,
        tree: &PaintLayerTree,
        layer: PaintLayerId,
    ) -> bool {
        let style = tree.style(layer);
        style.has_transform()
            || style.is_transparent()
            || style.has_mask
            || tree.reflection_layer(layer).is_some()
    }

    fn requires_compositing_for_frame(
        &self,
        ctx: &CompositingContext<'_>,
        layer: PaintLayerId,
        frame: FrameId,
        content_box: Rect,
        needs_layout: bool,
    ) -> bool {
        let Some(inner) = ctx.frames.contents(frame) else {
            return false;
        };
        if !inner.in_compositing_mode() {
            return false;
        }
        self.compositing_depends_on_geometry.set(true);
        if !inner.should_propagate_compositing_to_enclosing_frame() {
            return false;
        }
        if needs_layout {
            return ctx.tree.is_composited(layer);
        }
        content_box.area() > 0.0
    }

    /// Walks `layer` and its descendants in painting order, deciding which
    /// layers are composited and updating their backings.
    ///
    /// `state` carries the nearest composited ancestor and whether a layer
    /// painted earlier under the same parent is compositing. Returns whether
    /// `layer` or any of its descendants ended up compositing; the caller
    /// folds this into the state it hands to later siblings. `layers_changed`
    /// is set when a backing was created or destroyed.
    ///
    /// With an overlap map, a layer is forced into compositing only when its
    /// absolute bounds intersect a layer composited earlier in the pass.
    /// Without one, everything painted after a composited layer is composited.
    pub fn compute_compositing_requirements(
        &mut self,
        ctx: &mut CompositingContext<'_>,
        layer: PaintLayerId,
        mut overlap_map: Option<&mut OverlapMap>,
        state: CompositingState,
        layers_changed: &mut bool,
    ) -> bool {
        ctx.tree.update_layer_lists(layer);
        ctx.tree.set_has_compositing_descendant(layer, false);

        let mut must_overlap = state.subtree_is_compositing;
        let mut abs_bounds = None;
        if let Some(map) = overlap_map.as_deref() {
            if !map.is_empty() {
                let bounds = overlap_test_bounds(ctx.tree.absolute_bounding_box(layer));
                abs_bounds = Some(bounds);
                must_overlap = map.overlaps(bounds);
            }
        }
        ctx.tree.set_must_overlap_composited_layers(layer, must_overlap);

        let mut child_state = CompositingState {
            compositing_ancestor: state.compositing_ancestor,
            subtree_is_compositing: false,
            depth: state.depth + 1,
        };
        let mut subtree_is_compositing = false;

        let mut will_be_composited = self.needs_to_be_composited(ctx, layer);
        if will_be_composited {
            subtree_is_compositing = true;
            child_state.compositing_ancestor = Some(layer);
            if let Some(map) = overlap_map.as_deref_mut() {
                add_to_overlap_map(ctx.tree, map, layer, &mut abs_bounds);
            }
            // Video controls paint in front of the video layer.
            if ctx.tree.style(layer).is_video() {
                child_state.subtree_is_compositing = true;
            }
        }

        let stacking = ctx.tree.is_stacking_context(layer);
        if stacking {
            for child in paint_order_children(ctx.tree, layer, PaintOrderList::NegativeZ) {
                child_state.subtree_is_compositing |= self.compute_compositing_requirements(
                    ctx,
                    child,
                    overlap_map.as_deref_mut(),
                    child_state,
                    layers_changed,
                );
                // Our own content must paint over the composited negative
                // z-index child.
                if !will_be_composited && child_state.subtree_is_compositing {
                    ctx.tree.set_must_overlap_composited_layers(layer, true);
                    child_state.compositing_ancestor = Some(layer);
                    if let Some(map) = overlap_map.as_deref_mut() {
                        add_to_overlap_map(ctx.tree, map, layer, &mut abs_bounds);
                    }
                    will_be_composited = true;
                }
            }
        }

        for child in paint_order_children(ctx.tree, layer, PaintOrderList::NormalFlow) {
            child_state.subtree_is_compositing |= self.compute_compositing_requirements(
                ctx,
                child,
                overlap_map.as_deref_mut(),
                child_state,
                layers_changed,
            );
        }

        if stacking {
            for child in paint_order_children(ctx.tree, layer, PaintOrderList::PositiveZ) {
                child_state.subtree_is_compositing |= self.compute_compositing_requirements(
                    ctx,
                    child,
                    overlap_map.as_deref_mut(),
                    child_state,
                    layers_changed,
                );
            }
        }

        // The root hosts the document background once anything composites.
        if ctx.tree.is_root(layer) && self.compositing && self.has_accelerated_compositing {
            will_be_composited = true;
        }

        if !will_be_composited
            && self.can_be_composited(ctx.tree, layer)
            && child_state.subtree_is_compositing
            && self.requires_compositing_when_descendants_are_compositing(ctx.tree, layer)
        {
            ctx.tree.set_must_overlap_composited_layers(layer, true);
            if let Some(map) = overlap_map.as_deref_mut() {
                add_to_overlap_map(ctx.tree, map, layer, &mut abs_bounds);
            }
            will_be_composited = true;
        }

        let reflection = ctx.tree.reflection_layer(layer);
        if let Some(reflection) = reflection {
            ctx.tree.set_must_overlap_composited_layers(reflection, will_be_composited);
        }

        if child_state.subtree_is_compositing {
            subtree_is_compositing = true;
        }
        ctx.tree.set_has_compositing_descendant(layer, child_state.subtree_is_compositing);

        // The descendant flag just changed the clipping answer.
        if !will_be_composited
            && self.can_be_composited(ctx.tree, layer)
            && self.clips_compositing_descendants(ctx.tree, layer)
        {
            if let Some(map) = overlap_map.as_deref_mut() {
                add_to_overlap_map(ctx.tree, map, layer, &mut abs_bounds);
            }
            will_be_composited = true;
        }

        if will_be_composited && !ctx.tree.is_composited(layer) {
            self.repaint_on_compositing_change(ctx, layer);
        }

        if self.update_backing(ctx, layer, CompositingChangeRepaint::Now) {
            *layers_changed = true;
        }
        if let Some(reflection) = reflection {
            if self.update_layer_compositing_state(ctx, reflection, CompositingChangeRepaint::Now) {
                *layers_changed = true;
            }
        }

        subtree_is_compositing
    }

    /// Returns whether `layer` or anything in its paint-order subtree uses
    /// 3-D rendering.
    #[must_use]
    pub fn layer_has_3d_content(&self, tree: &PaintLayerTree, layer: PaintLayerId) -> bool {
        let style = tree.style(layer);
        if style.preserve_3d || style.has_perspective || style.has_3d_transform_operation {
            return true;
        }
        let lists: &[PaintOrderList] = if tree.is_stacking_context(layer) {
            &PaintOrderList::ALL
        } else {
            &[PaintOrderList::NormalFlow]
        };
        lists.iter().any(|&list| {
            tree.children(layer, list)
                .any(|child| self.layer_has_3d_content(tree, child))
        })
    }
}

/// Copies one paint-order list so the tree can be mutated while walking it.
pub(super) fn paint_order_children(
    tree: &PaintLayerTree,
    layer: PaintLayerId,
    list: PaintOrderList,
) -> Vec<PaintLayerId> {
    tree.children(layer, list).collect()
}

fn add_to_overlap_map(
    tree: &PaintLayerTree,
    map: &mut OverlapMap,
    layer: PaintLayerId,
    abs_bounds: &mut Option<Rect>,
) {
    // The root covers everything; recording it would promote every layer.
    if tree.is_root(layer) {
        return;
    }
    let bounds =
        *abs_bounds.get_or_insert_with(|| overlap_test_bounds(tree.absolute_bounding_box(layer)));
    map.add(layer, bounds);
}
