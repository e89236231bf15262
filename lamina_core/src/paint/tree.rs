// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays storage for the paint-layer tree.

use alloc::vec::Vec;

use kurbo::{Rect, Vec2};

use super::style::LayerStyle;
use super::traverse::PaintOrderChildren;
use crate::compositor::Backing;
use crate::id::{INVALID, PaintLayerId};

/// Which paint-order list of its parent a layer lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaintOrderList {
    /// Negative z-index children, painted before the parent's content.
    NegativeZ,
    /// Non-positioned children in flow order.
    NormalFlow,
    /// Zero or positive z-index children, painted last.
    PositiveZ,
}

impl PaintOrderList {
    /// The three lists in painting order.
    pub const ALL: [Self; 3] = [Self::NegativeZ, Self::NormalFlow, Self::PositiveZ];
}

/// Struct-of-arrays storage for the layout system's layer tree.
///
/// Layers are addressed by [`PaintLayerId`] handles. The layout system builds
/// the topology and sets geometry and [`LayerStyle`]; the compositor writes
/// the compositing flags and owns the per-layer [`Backing`] slot.
///
/// Geometry is deliberately simple: each layer has an offset from its parent
/// layer (already accounting for the parent's scroll position) and a local
/// bounding box. Transforms apply in the layer's local space before the
/// offset.
#[derive(Debug)]
pub struct PaintLayerTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) list_of: Vec<Option<PaintOrderList>>,
    pub(crate) neg_z: Vec<Vec<u32>>,
    pub(crate) normal_flow: Vec<Vec<u32>>,
    pub(crate) pos_z: Vec<Vec<u32>>,
    pub(crate) lists_dirty: Vec<bool>,
    pub(crate) reflection: Vec<u32>,
    pub(crate) reflected: Vec<u32>,
    pub(crate) root: u32,

    // -- Layout inputs (set by callers) --
    pub(crate) z_index: Vec<i32>,
    pub(crate) stacking_context: Vec<bool>,
    pub(crate) offset: Vec<Vec2>,
    pub(crate) scroll_offset: Vec<Vec2>,
    pub(crate) bounding_box: Vec<Rect>,
    pub(crate) style: Vec<LayerStyle>,

    // -- Compositing state (written by the compositor) --
    pub(crate) has_compositing_descendant: Vec<bool>,
    pub(crate) must_overlap_composited_layers: Vec<bool>,
    pub(crate) backing: Vec<Option<Backing>>,
    pub(crate) repaint_rect: Vec<Rect>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
}

impl Default for PaintLayerTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PaintLayerTree {
    /// Creates an empty tree with no root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            list_of: Vec::new(),
            neg_z: Vec::new(),
            normal_flow: Vec::new(),
            pos_z: Vec::new(),
            lists_dirty: Vec::new(),
            reflection: Vec::new(),
            reflected: Vec::new(),
            root: INVALID,
            z_index: Vec::new(),
            stacking_context: Vec::new(),
            offset: Vec::new(),
            scroll_offset: Vec::new(),
            bounding_box: Vec::new(),
            style: Vec::new(),
            has_compositing_descendant: Vec::new(),
            must_overlap_composited_layers: Vec::new(),
            backing: Vec::new(),
            repaint_rect: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    // -- Allocation API --

    /// Creates a detached layer with default style and an empty bounding box.
    pub fn create_layer(&mut self) -> PaintLayerId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.alive[i] = true;
            self.parent[i] = INVALID;
            self.list_of[i] = None;
            self.neg_z[i].clear();
            self.normal_flow[i].clear();
            self.pos_z[i].clear();
            self.lists_dirty[i] = false;
            self.reflection[i] = INVALID;
            self.reflected[i] = INVALID;
            self.z_index[i] = 0;
            self.stacking_context[i] = false;
            self.offset[i] = Vec2::ZERO;
            self.scroll_offset[i] = Vec2::ZERO;
            self.bounding_box[i] = Rect::ZERO;
            self.style[i] = LayerStyle::default();
            self.has_compositing_descendant[i] = false;
            self.must_overlap_composited_layers[i] = false;
            self.repaint_rect[i] = Rect::ZERO;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.list_of.push(None);
            self.neg_z.push(Vec::new());
            self.normal_flow.push(Vec::new());
            self.pos_z.push(Vec::new());
            self.lists_dirty.push(false);
            self.reflection.push(INVALID);
            self.reflected.push(INVALID);
            self.z_index.push(0);
            self.stacking_context.push(false);
            self.offset.push(Vec2::ZERO);
            self.scroll_offset.push(Vec2::ZERO);
            self.bounding_box.push(Rect::ZERO);
            self.style.push(LayerStyle::default());
            self.has_compositing_descendant.push(false);
            self.must_overlap_composited_layers.push(false);
            self.backing.push(None);
            self.repaint_rect.push(Rect::ZERO);
            self.generation.push(0);
            self.alive.push(true);
            idx
        };
        self.handle(idx)
    }

    /// Creates the root layer (the render view's layer) with the given
    /// bounding box. The root is always a stacking context.
    ///
    /// # Panics
    ///
    /// Panics if the tree already has a root.
    pub fn create_root(&mut self, bounds: Rect) -> PaintLayerId {
        assert!(self.root == INVALID, "tree already has a root layer");
        let id = self.create_layer();
        self.root = id.idx;
        self.stacking_context[id.idx as usize] = true;
        self.bounding_box[id.idx as usize] = bounds;
        id
    }

    /// Destroys a detached, childless layer.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, the layer is still attached or has
    /// children, or the layer still has a backing.
    pub fn destroy_layer(&mut self, id: PaintLayerId) {
        self.validate(id);
        let i = id.idx as usize;
        assert!(
            self.parent[i] == INVALID || self.reflected[i] != INVALID,
            "cannot destroy an attached layer"
        );
        assert!(
            self.neg_z[i].is_empty() && self.normal_flow[i].is_empty() && self.pos_z[i].is_empty(),
            "cannot destroy layer with children"
        );
        assert!(
            self.backing[i].is_none(),
            "composited layer destroyed without notifying the compositor"
        );
        if self.reflected[i] != INVALID {
            self.reflection[self.reflected[i] as usize] = INVALID;
        }
        if self.reflection[i] != INVALID {
            let r = self.reflection[i] as usize;
            self.reflected[r] = INVALID;
            self.parent[r] = INVALID;
        }
        if self.root == id.idx {
            self.root = INVALID;
        }
        self.generation[i] += 1;
        self.alive[i] = false;
        self.free_list.push(id.idx);
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: PaintLayerId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.alive[id.idx as usize]
    }

    // -- Topology API --

    /// Appends `child` to `parent`'s `list`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, `child` already has a parent, or a
    /// z-ordered list is used on a parent that is not a stacking context.
    pub fn append_child(&mut self, parent: PaintLayerId, child: PaintLayerId, list: PaintOrderList) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx as usize;
        let c = child.idx as usize;
        assert!(self.parent[c] == INVALID, "child already has a parent");
        assert!(child.idx != self.root, "the root layer cannot be a child");
        assert!(
            list == PaintOrderList::NormalFlow || self.stacking_context[p],
            "z-ordered children require a stacking context"
        );
        self.parent[c] = parent.idx;
        self.list_of[c] = Some(list);
        self.list_mut(parent.idx, list).push(child.idx);
        self.lists_dirty[p] = true;
    }

    /// Detaches `child` from its parent's paint-order list.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, the layer has no parent, or it still
    /// has a backing (tell the compositor first).
    pub fn remove_from_parent(&mut self, child: PaintLayerId) {
        self.validate(child);
        let c = child.idx as usize;
        let p = self.parent[c];
        assert!(p != INVALID, "layer has no parent");
        assert!(
            self.backing[c].is_none(),
            "composited layer removed without notifying the compositor"
        );
        if let Some(list) = self.list_of[c] {
            self.list_mut(p, list).retain(|&x| x != child.idx);
        }
        self.parent[c] = INVALID;
        self.list_of[c] = None;
        self.lists_dirty[p as usize] = true;
    }

    /// Installs `reflection` as the reflection layer of `layer`.
    ///
    /// The reflection is parented to `layer` but does not appear in any
    /// paint-order list.
    pub fn set_reflection(&mut self, layer: PaintLayerId, reflection: PaintLayerId) {
        self.validate(layer);
        self.validate(reflection);
        let r = reflection.idx as usize;
        assert!(self.parent[r] == INVALID, "reflection already has a parent");
        self.reflection[layer.idx as usize] = reflection.idx;
        self.reflected[r] = layer.idx;
        self.parent[r] = layer.idx;
    }

    /// Returns the root layer, if one was created.
    #[must_use]
    pub fn root(&self) -> Option<PaintLayerId> {
        (self.root != INVALID).then(|| self.handle(self.root))
    }

    /// Returns whether `id` is the root layer.
    #[must_use]
    pub fn is_root(&self, id: PaintLayerId) -> bool {
        self.validate(id);
        id.idx == self.root
    }

    /// Returns the parent of a layer, if any.
    #[must_use]
    pub fn parent(&self, id: PaintLayerId) -> Option<PaintLayerId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.handle(p))
    }

    /// Returns the number of children in one of a layer's paint-order lists.
    #[must_use]
    pub fn child_count(&self, id: PaintLayerId, list: PaintOrderList) -> usize {
        self.validate(id);
        self.list(id.idx, list).len()
    }

    /// Returns the `i`-th child in one of a layer's paint-order lists.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    #[must_use]
    pub fn child_at(&self, id: PaintLayerId, list: PaintOrderList, i: usize) -> PaintLayerId {
        self.validate(id);
        self.handle(self.list(id.idx, list)[i])
    }

    /// Returns an iterator over one of a layer's paint-order lists.
    #[must_use]
    pub fn children(&self, id: PaintLayerId, list: PaintOrderList) -> PaintOrderChildren<'_> {
        self.validate(id);
        PaintOrderChildren::new(self, self.list(id.idx, list))
    }

    /// Returns the reflection layer of `id`, if any.
    #[must_use]
    pub fn reflection_layer(&self, id: PaintLayerId) -> Option<PaintLayerId> {
        self.validate(id);
        let r = self.reflection[id.idx as usize];
        (r != INVALID).then(|| self.handle(r))
    }

    /// Returns the layer `id` reflects, if `id` is a reflection layer.
    #[must_use]
    pub fn reflected_layer(&self, id: PaintLayerId) -> Option<PaintLayerId> {
        self.validate(id);
        let r = self.reflected[id.idx as usize];
        (r != INVALID).then(|| self.handle(r))
    }

    /// Returns whether `id` is a reflection layer.
    #[must_use]
    pub fn is_reflection(&self, id: PaintLayerId) -> bool {
        self.reflected_layer(id).is_some()
    }

    /// Returns the nearest ancestor that is a stacking context.
    #[must_use]
    pub fn stacking_context_of(&self, id: PaintLayerId) -> Option<PaintLayerId> {
        self.validate(id);
        let mut cur = self.parent[id.idx as usize];
        while cur != INVALID {
            if self.stacking_context[cur as usize] {
                return Some(self.handle(cur));
            }
            cur = self.parent[cur as usize];
        }
        None
    }

    /// Returns whether any paint-order list needs re-sorting.
    #[must_use]
    pub fn lists_dirty(&self, id: PaintLayerId) -> bool {
        self.validate(id);
        self.lists_dirty[id.idx as usize]
    }

    /// Refreshes the layer's z-ordered lists, stable-sorting them by z-index.
    ///
    /// Idempotent: a clean layer is left untouched.
    pub fn update_layer_lists(&mut self, id: PaintLayerId) {
        self.validate(id);
        let i = id.idx as usize;
        if !self.lists_dirty[i] {
            return;
        }
        let z_index = &self.z_index;
        self.neg_z[i].sort_by_key(|&c| z_index[c as usize]);
        self.pos_z[i].sort_by_key(|&c| z_index[c as usize]);
        self.lists_dirty[i] = false;
    }

    // -- Property getters --

    /// Returns whether the layer establishes a stacking context.
    #[must_use]
    pub fn is_stacking_context(&self, id: PaintLayerId) -> bool {
        self.validate(id);
        self.stacking_context[id.idx as usize]
    }

    /// Returns the z-index.
    #[must_use]
    pub fn z_index(&self, id: PaintLayerId) -> i32 {
        self.validate(id);
        self.z_index[id.idx as usize]
    }

    /// Returns the offset of the layer from its parent layer.
    #[must_use]
    pub fn offset(&self, id: PaintLayerId) -> Vec2 {
        self.validate(id);
        self.offset[id.idx as usize]
    }

    /// Returns the layer's own scroll offset.
    #[must_use]
    pub fn scroll_offset(&self, id: PaintLayerId) -> Vec2 {
        self.validate(id);
        self.scroll_offset[id.idx as usize]
    }

    /// Returns the local bounding box.
    #[must_use]
    pub fn bounding_box(&self, id: PaintLayerId) -> Rect {
        self.validate(id);
        self.bounding_box[id.idx as usize]
    }

    /// Returns the renderer style.
    #[must_use]
    pub fn style(&self, id: PaintLayerId) -> &LayerStyle {
        self.validate(id);
        &self.style[id.idx as usize]
    }

    /// Returns whether some descendant is composited.
    ///
    /// Only valid after a compositing requirements pass.
    #[must_use]
    pub fn has_compositing_descendant(&self, id: PaintLayerId) -> bool {
        self.validate(id);
        self.has_compositing_descendant[id.idx as usize]
    }

    /// Returns whether the layer was forced into compositing because it may
    /// paint over composited content.
    #[must_use]
    pub fn must_overlap_composited_layers(&self, id: PaintLayerId) -> bool {
        self.validate(id);
        self.must_overlap_composited_layers[id.idx as usize]
    }

    /// Returns whether the layer currently has a backing.
    #[must_use]
    pub fn is_composited(&self, id: PaintLayerId) -> bool {
        self.validate(id);
        self.backing[id.idx as usize].is_some()
    }

    /// Returns the layer's backing.
    #[must_use]
    pub fn backing(&self, id: PaintLayerId) -> Option<&Backing> {
        self.validate(id);
        self.backing[id.idx as usize].as_ref()
    }

    /// Returns the cached repaint rect, in root coordinates.
    #[must_use]
    pub fn repaint_rect(&self, id: PaintLayerId) -> Rect {
        self.validate(id);
        self.repaint_rect[id.idx as usize]
    }

    // -- Mutation API --

    /// Marks whether the layer is a stacking context.
    pub fn set_stacking_context(&mut self, id: PaintLayerId, stacking: bool) {
        self.validate(id);
        self.stacking_context[id.idx as usize] = stacking;
    }

    /// Sets the z-index, dirtying the parent's lists.
    pub fn set_z_index(&mut self, id: PaintLayerId, z: i32) {
        self.validate(id);
        self.z_index[id.idx as usize] = z;
        let p = self.parent[id.idx as usize];
        if p != INVALID {
            self.lists_dirty[p as usize] = true;
        }
    }

    /// Sets the offset from the parent layer.
    pub fn set_offset(&mut self, id: PaintLayerId, offset: Vec2) {
        self.validate(id);
        self.offset[id.idx as usize] = offset;
    }

    /// Sets the layer's own scroll offset.
    pub fn set_scroll_offset(&mut self, id: PaintLayerId, offset: Vec2) {
        self.validate(id);
        self.scroll_offset[id.idx as usize] = offset;
    }

    /// Sets the local bounding box.
    pub fn set_bounding_box(&mut self, id: PaintLayerId, bounds: Rect) {
        self.validate(id);
        self.bounding_box[id.idx as usize] = bounds;
    }

    /// Replaces the renderer style.
    pub fn set_style(&mut self, id: PaintLayerId, style: LayerStyle) {
        self.validate(id);
        self.style[id.idx as usize] = style;
    }

    /// Edits the renderer style in place.
    pub fn update_style(&mut self, id: PaintLayerId, f: impl FnOnce(&mut LayerStyle)) {
        self.validate(id);
        f(&mut self.style[id.idx as usize]);
    }

    pub(crate) fn set_has_compositing_descendant(&mut self, id: PaintLayerId, value: bool) {
        self.validate(id);
        self.has_compositing_descendant[id.idx as usize] = value;
    }

    pub(crate) fn set_must_overlap_composited_layers(&mut self, id: PaintLayerId, value: bool) {
        self.validate(id);
        self.must_overlap_composited_layers[id.idx as usize] = value;
    }

    pub(crate) fn backing_mut(&mut self, id: PaintLayerId) -> Option<&mut Backing> {
        self.validate(id);
        self.backing[id.idx as usize].as_mut()
    }

    pub(crate) fn set_backing(&mut self, id: PaintLayerId, backing: Backing) {
        self.validate(id);
        self.backing[id.idx as usize] = Some(backing);
    }

    pub(crate) fn take_backing(&mut self, id: PaintLayerId) -> Option<Backing> {
        self.validate(id);
        self.backing[id.idx as usize].take()
    }

    // -- Geometry --

    /// Returns the offset of `id` relative to `ancestor` (or to the top of
    /// the tree when `ancestor` is `None` or not an ancestor).
    ///
    /// Transforms of intermediate layers are not applied.
    #[must_use]
    pub fn convert_to_layer_coords(&self, id: PaintLayerId, ancestor: Option<PaintLayerId>) -> Vec2 {
        self.validate(id);
        let stop = ancestor.map_or(INVALID, |a| a.idx);
        let mut total = Vec2::ZERO;
        let mut cur = id.idx;
        while cur != INVALID && cur != stop {
            total += self.offset[cur as usize];
            cur = self.parent[cur as usize];
        }
        total
    }

    /// Returns the bounding box of the layer in root coordinates, mapped
    /// through every transform on the way up and rounded outward to whole
    /// pixels.
    #[must_use]
    pub fn absolute_bounding_box(&self, id: PaintLayerId) -> Rect {
        self.validate(id);
        let mut rect = self.bounding_box[id.idx as usize];
        let mut cur = id.idx;
        while cur != INVALID {
            let i = cur as usize;
            if let Some(t) = self.style[i].transform {
                rect = t.map_rect(rect);
            }
            rect = rect + self.offset[i];
            cur = self.parent[i];
        }
        rect.expand()
    }

    /// Recomputes the cached repaint rect of `id`.
    pub fn compute_repaint_rects(&mut self, id: PaintLayerId) {
        self.repaint_rect[id.idx as usize] = self.absolute_bounding_box(id);
    }

    /// Returns `id` and its descendants in paint order (the layer, then its
    /// negative, normal-flow and positive lists, recursively).
    ///
    /// Reflection layers are not included.
    #[must_use]
    pub fn subtree_in_paint_order(&self, id: PaintLayerId) -> Vec<PaintLayerId> {
        self.validate(id);
        let mut out = Vec::new();
        let mut stack = alloc::vec![id.idx];
        while let Some(idx) = stack.pop() {
            out.push(self.handle(idx));
            let i = idx as usize;
            for list in [&self.pos_z[i], &self.normal_flow[i], &self.neg_z[i]] {
                stack.extend(list.iter().rev());
            }
        }
        out
    }

    // -- Internal helpers --

    fn handle(&self, idx: u32) -> PaintLayerId {
        PaintLayerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn list(&self, idx: u32, list: PaintOrderList) -> &[u32] {
        let i = idx as usize;
        match list {
            PaintOrderList::NegativeZ => &self.neg_z[i],
            PaintOrderList::NormalFlow => &self.normal_flow[i],
            PaintOrderList::PositiveZ => &self.pos_z[i],
        }
    }

    fn list_mut(&mut self, idx: u32, list: PaintOrderList) -> &mut Vec<u32> {
        let i = idx as usize;
        match list {
            PaintOrderList::NegativeZ => &mut self.neg_z[i],
            PaintOrderList::NormalFlow => &mut self.normal_flow[i],
            PaintOrderList::PositiveZ => &mut self.pos_z[i],
        }
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: PaintLayerId) {
        assert!(
            id.idx < self.len
                && self.generation[id.idx as usize] == id.generation
                && self.alive[id.idx as usize],
            "stale PaintLayerId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }
}
