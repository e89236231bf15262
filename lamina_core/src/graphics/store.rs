// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays graphics-layer storage with allocation, topology, and
//! property management.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size, Vec2};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::traverse::Children;
use crate::dirty;
use crate::id::{GraphicsLayerId, INVALID, PlatformLayerId};
use crate::transform::Transform3d;

/// Struct-of-arrays storage for every graphics layer of a page.
///
/// One store is shared by all frames of a page so that a sub-frame's root
/// layer can be grafted under its owner's backing. Each graphics layer has an
/// opaque [`PlatformLayerId`] identifying the native layer it stands for.
///
/// Setters only mark a dirty channel when the value actually changes, so a
/// geometry pass that recomputes identical values produces an empty commit.
#[derive(Debug)]
pub struct GraphicsLayerStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Properties --
    pub(crate) position: Vec<Point>,
    pub(crate) size: Vec<Size>,
    pub(crate) transform: Vec<Transform3d>,
    pub(crate) opacity: Vec<f32>,
    pub(crate) masks_to_bounds: Vec<bool>,
    pub(crate) draws_content: Vec<bool>,
    pub(crate) replica: Vec<u32>,
    pub(crate) needs_display: Vec<Option<Rect>>,
    pub(crate) pixel_alignment_offset: Vec<Vec2>,
    pub(crate) name: Vec<&'static str>,
    pub(crate) platform: Vec<PlatformLayerId>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
    next_platform: u64,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl Default for GraphicsLayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsLayerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            position: Vec::new(),
            size: Vec::new(),
            transform: Vec::new(),
            opacity: Vec::new(),
            masks_to_bounds: Vec::new(),
            draws_content: Vec::new(),
            replica: Vec::new(),
            needs_display: Vec::new(),
            pixel_alignment_offset: Vec::new(),
            name: Vec::new(),
            platform: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            next_platform: 1,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new, unparented graphics layer with a fresh platform layer.
    ///
    /// The layer starts at the origin with zero size, an identity transform,
    /// full opacity, and no content.
    pub fn create_layer(&mut self, name: &'static str) -> GraphicsLayerId {
        let platform = PlatformLayerId(self.next_platform);
        self.next_platform += 1;
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.alive[i] = true;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.position[i] = Point::ZERO;
            self.size[i] = Size::ZERO;
            self.transform[i] = Transform3d::IDENTITY;
            self.opacity[i] = 1.0;
            self.masks_to_bounds[i] = false;
            self.draws_content[i] = false;
            self.replica[i] = INVALID;
            self.needs_display[i] = None;
            self.pixel_alignment_offset[i] = Vec2::ZERO;
            self.name[i] = name;
            self.platform[i] = platform;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.position.push(Point::ZERO);
            self.size.push(Size::ZERO);
            self.transform.push(Transform3d::IDENTITY);
            self.opacity.push(1.0);
            self.masks_to_bounds.push(false);
            self.draws_content.push(false);
            self.replica.push(INVALID);
            self.needs_display.push(None);
            self.pixel_alignment_offset.push(Vec2::ZERO);
            self.name.push(name);
            self.platform.push(platform);
            self.generation.push(0);
            self.alive.push(true);
            idx
        };

        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);

        GraphicsLayerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a layer, detaching it from its parent first.
    ///
    /// # Panics
    ///
    /// Panics if the layer has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_layer(&mut self, id: GraphicsLayerId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy layer with children"
        );

        if self.parent[idx as usize] != INVALID {
            let p = self.parent[idx as usize];
            self.unlink_from_parent(idx);
            self.dirty.mark(p, dirty::TOPOLOGY);
        }
        // Anything replicated by this layer loses its replica.
        for i in 0..self.len as usize {
            if self.replica[i] == idx {
                self.replica[i] = INVALID;
                self.dirty.mark(i as u32, dirty::APPEARANCE);
            }
        }

        self.dirty.remove_key(idx);
        self.generation[idx as usize] += 1;
        self.alive[idx as usize] = false;
        self.free_list.push(idx);
        self.pending_removed.push(idx);
    }

    /// Detaches every child of `id`, then destroys it.
    pub fn destroy_layer_and_orphan_children(&mut self, id: GraphicsLayerId) {
        self.remove_all_children(id);
        self.destroy_layer(id);
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: GraphicsLayerId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.alive[id.idx as usize]
    }

    // -- Topology API --

    /// Appends `child` to `parent`, detaching it from any previous parent.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or if `child == parent`.
    pub fn add_child(&mut self, parent: GraphicsLayerId, child: GraphicsLayerId) {
        self.validate(parent);
        self.validate(child);
        assert!(parent != child, "cannot add a layer to itself");
        let p = parent.idx;
        let c = child.idx;

        let old_p = self.parent[c as usize];
        if old_p != INVALID {
            self.unlink_from_parent(c);
            self.dirty.remove_dependency(c, old_p, dirty::GEOMETRY);
            self.dirty.mark(old_p, dirty::TOPOLOGY);
        }

        self.parent[c as usize] = p;
        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        // Child geometry depends on its parent's.
        let _ = self.dirty.add_dependency(c, p, dirty::GEOMETRY);
        self.dirty.mark_with(c, dirty::GEOMETRY, &EagerPolicy);
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Detaches `child` from its parent. Does nothing if it has none.
    pub fn remove_from_parent(&mut self, child: GraphicsLayerId) {
        self.validate(child);
        let c = child.idx;
        let p = self.parent[c as usize];
        if p == INVALID {
            return;
        }
        self.unlink_from_parent(c);
        self.dirty.remove_dependency(c, p, dirty::GEOMETRY);
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Detaches every child of `id`.
    pub fn remove_all_children(&mut self, id: GraphicsLayerId) {
        self.validate(id);
        let p = id.idx;
        let mut cur = self.first_child[p as usize];
        if cur == INVALID {
            return;
        }
        while cur != INVALID {
            let next = self.next_sibling[cur as usize];
            self.parent[cur as usize] = INVALID;
            self.prev_sibling[cur as usize] = INVALID;
            self.next_sibling[cur as usize] = INVALID;
            self.dirty.remove_dependency(cur, p, dirty::GEOMETRY);
            cur = next;
        }
        self.first_child[p as usize] = INVALID;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Replaces the children of `id` with `children`, in order.
    ///
    /// Does nothing (and marks nothing) when the child list already matches.
    pub fn set_children(&mut self, id: GraphicsLayerId, children: &[GraphicsLayerId]) {
        self.validate(id);
        if self.children(id).eq(children.iter().copied()) {
            return;
        }
        self.remove_all_children(id);
        for &child in children {
            self.add_child(id, child);
        }
    }

    /// Returns the parent of a layer, if any.
    #[must_use]
    pub fn parent(&self, id: GraphicsLayerId) -> Option<GraphicsLayerId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.handle(p))
    }

    /// Returns an iterator over the direct children of a layer.
    #[must_use]
    pub fn children(&self, id: GraphicsLayerId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the number of direct children.
    #[must_use]
    pub fn child_count(&self, id: GraphicsLayerId) -> usize {
        self.children(id).count()
    }

    /// Returns the number of live layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }

    // -- Property getters --

    /// Returns the position of the layer in its parent.
    #[must_use]
    pub fn position(&self, id: GraphicsLayerId) -> Point {
        self.validate(id);
        self.position[id.idx as usize]
    }

    /// Returns the size of the layer.
    #[must_use]
    pub fn size(&self, id: GraphicsLayerId) -> Size {
        self.validate(id);
        self.size[id.idx as usize]
    }

    /// Returns the layer transform.
    #[must_use]
    pub fn transform(&self, id: GraphicsLayerId) -> Transform3d {
        self.validate(id);
        self.transform[id.idx as usize]
    }

    /// Returns the layer opacity.
    #[must_use]
    pub fn opacity(&self, id: GraphicsLayerId) -> f32 {
        self.validate(id);
        self.opacity[id.idx as usize]
    }

    /// Returns whether the layer clips its sublayers.
    #[must_use]
    pub fn masks_to_bounds(&self, id: GraphicsLayerId) -> bool {
        self.validate(id);
        self.masks_to_bounds[id.idx as usize]
    }

    /// Returns whether the layer has its own backing store.
    #[must_use]
    pub fn draws_content(&self, id: GraphicsLayerId) -> bool {
        self.validate(id);
        self.draws_content[id.idx as usize]
    }

    /// Returns the replica (reflection) layer, if any.
    #[must_use]
    pub fn replica(&self, id: GraphicsLayerId) -> Option<GraphicsLayerId> {
        self.validate(id);
        let r = self.replica[id.idx as usize];
        (r != INVALID).then(|| self.handle(r))
    }

    /// Returns the pending invalidation rectangle, if any.
    #[must_use]
    pub fn needs_display(&self, id: GraphicsLayerId) -> Option<Rect> {
        self.validate(id);
        self.needs_display[id.idx as usize]
    }

    /// Returns the sub-pixel offset dropped when the position was rounded.
    #[must_use]
    pub fn pixel_alignment_offset(&self, id: GraphicsLayerId) -> Vec2 {
        self.validate(id);
        self.pixel_alignment_offset[id.idx as usize]
    }

    /// Returns the debug name.
    #[must_use]
    pub fn name(&self, id: GraphicsLayerId) -> &'static str {
        self.validate(id);
        self.name[id.idx as usize]
    }

    /// Returns the native layer this graphics layer stands for.
    #[must_use]
    pub fn platform_layer(&self, id: GraphicsLayerId) -> PlatformLayerId {
        self.validate(id);
        self.platform[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the position of the layer in its parent.
    pub fn set_position(&mut self, id: GraphicsLayerId, position: Point) {
        self.validate(id);
        if self.position[id.idx as usize] != position {
            self.position[id.idx as usize] = position;
            self.dirty.mark_with(id.idx, dirty::GEOMETRY, &EagerPolicy);
        }
    }

    /// Sets the size of the layer.
    pub fn set_size(&mut self, id: GraphicsLayerId, size: Size) {
        self.validate(id);
        if self.size[id.idx as usize] != size {
            self.size[id.idx as usize] = size;
            self.dirty.mark_with(id.idx, dirty::GEOMETRY, &EagerPolicy);
        }
    }

    /// Sets the layer transform.
    pub fn set_transform(&mut self, id: GraphicsLayerId, transform: Transform3d) {
        self.validate(id);
        if self.transform[id.idx as usize] != transform {
            self.transform[id.idx as usize] = transform;
            self.dirty.mark_with(id.idx, dirty::GEOMETRY, &EagerPolicy);
        }
    }

    /// Sets the layer opacity.
    pub fn set_opacity(&mut self, id: GraphicsLayerId, opacity: f32) {
        self.validate(id);
        if self.opacity[id.idx as usize] != opacity {
            self.opacity[id.idx as usize] = opacity;
            self.dirty.mark(id.idx, dirty::APPEARANCE);
        }
    }

    /// Sets whether the layer clips its sublayers.
    pub fn set_masks_to_bounds(&mut self, id: GraphicsLayerId, masks: bool) {
        self.validate(id);
        if self.masks_to_bounds[id.idx as usize] != masks {
            self.masks_to_bounds[id.idx as usize] = masks;
            self.dirty.mark(id.idx, dirty::APPEARANCE);
        }
    }

    /// Sets whether the layer has its own backing store.
    pub fn set_draws_content(&mut self, id: GraphicsLayerId, draws: bool) {
        self.validate(id);
        if self.draws_content[id.idx as usize] != draws {
            self.draws_content[id.idx as usize] = draws;
            self.dirty.mark(id.idx, dirty::APPEARANCE);
        }
    }

    /// Sets or clears the replica (reflection) layer.
    pub fn set_replicated_by(&mut self, id: GraphicsLayerId, replica: Option<GraphicsLayerId>) {
        self.validate(id);
        let r = match replica {
            Some(r) => {
                self.validate(r);
                r.idx
            }
            None => INVALID,
        };
        if self.replica[id.idx as usize] != r {
            self.replica[id.idx as usize] = r;
            self.dirty.mark(id.idx, dirty::APPEARANCE);
        }
    }

    /// Sets the sub-pixel offset dropped when the position was rounded.
    pub fn set_pixel_alignment_offset(&mut self, id: GraphicsLayerId, offset: Vec2) {
        self.validate(id);
        self.pixel_alignment_offset[id.idx as usize] = offset;
    }

    /// Invalidates the whole layer.
    pub fn set_needs_display(&mut self, id: GraphicsLayerId) {
        self.validate(id);
        let bounds = Rect::from_origin_size(Point::ZERO, self.size[id.idx as usize]);
        self.set_needs_display_in_rect(id, bounds);
    }

    /// Invalidates `rect` (in layer coordinates), accumulating with any
    /// pending invalidation.
    pub fn set_needs_display_in_rect(&mut self, id: GraphicsLayerId, rect: Rect) {
        self.validate(id);
        if !self.draws_content[id.idx as usize] {
            return;
        }
        let slot = &mut self.needs_display[id.idx as usize];
        *slot = Some(match *slot {
            Some(existing) => existing.union(rect),
            None => rect,
        });
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    // -- Internal helpers --

    pub(crate) fn handle(&self, idx: u32) -> GraphicsLayerId {
        GraphicsLayerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Panics if the handle is stale.
    fn validate(&self, id: GraphicsLayerId) {
        assert!(
            self.is_alive(id),
            "stale GraphicsLayerId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn create_and_destroy() {
        let mut store = GraphicsLayerStore::new();
        let id = store.create_layer("a");
        assert!(store.is_alive(id));
        assert_eq!(store.layer_count(), 1);
        store.destroy_layer(id);
        assert!(!store.is_alive(id));
        assert_eq!(store.layer_count(), 0);
    }

    #[test]
    fn platform_layers_are_never_reused() {
        let mut store = GraphicsLayerStore::new();
        let a = store.create_layer("a");
        let pa = store.platform_layer(a);
        store.destroy_layer(a);
        let b = store.create_layer("b");
        assert_eq!(a.index(), b.index());
        assert_ne!(store.platform_layer(b), pa);
    }

    #[test]
    fn add_child_reparents() {
        let mut store = GraphicsLayerStore::new();
        let p1 = store.create_layer("p1");
        let p2 = store.create_layer("p2");
        let c = store.create_layer("c");
        store.add_child(p1, c);
        store.add_child(p2, c);
        assert_eq!(store.parent(c), Some(p2));
        assert_eq!(store.child_count(p1), 0);
        assert_eq!(store.children(p2).collect::<Vec<_>>(), vec![c]);
    }

    #[test]
    fn remove_from_parent_without_parent_is_a_no_op() {
        let mut store = GraphicsLayerStore::new();
        let a = store.create_layer("a");
        store.remove_from_parent(a);
        assert_eq!(store.parent(a), None);
    }

    #[test]
    fn set_children_replaces_in_order() {
        let mut store = GraphicsLayerStore::new();
        let p = store.create_layer("p");
        let a = store.create_layer("a");
        let b = store.create_layer("b");
        let c = store.create_layer("c");
        store.set_children(p, &[a, b]);
        store.set_children(p, &[c, a]);
        assert_eq!(store.children(p).collect::<Vec<_>>(), vec![c, a]);
        assert_eq!(store.parent(b), None);
    }

    #[test]
    fn unchanged_child_list_commits_nothing() {
        let mut store = GraphicsLayerStore::new();
        let p = store.create_layer("p");
        let a = store.create_layer("a");
        store.set_children(p, &[a]);
        let _ = store.sync_compositing_state();
        store.set_children(p, &[a]);
        let commit = store.sync_compositing_state();
        assert!(!commit.topology_changed);
        assert!(commit.geometry.is_empty());
    }

    #[test]
    fn destroying_a_replica_clears_the_reference() {
        let mut store = GraphicsLayerStore::new();
        let a = store.create_layer("a");
        let r = store.create_layer("r");
        store.set_replicated_by(a, Some(r));
        assert_eq!(store.replica(a), Some(r));
        store.destroy_layer(r);
        assert_eq!(store.replica(a), None);
    }

    #[test]
    fn needs_display_accumulates_only_when_drawing() {
        let mut store = GraphicsLayerStore::new();
        let a = store.create_layer("a");
        store.set_needs_display_in_rect(a, Rect::new(0.0, 0.0, 5.0, 5.0));
        assert_eq!(store.needs_display(a), None);
        store.set_draws_content(a, true);
        store.set_needs_display_in_rect(a, Rect::new(0.0, 0.0, 5.0, 5.0));
        store.set_needs_display_in_rect(a, Rect::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(store.needs_display(a), Some(Rect::new(0.0, 0.0, 20.0, 20.0)));
    }

    #[test]
    #[should_panic(expected = "cannot destroy layer with children")]
    fn destroy_with_children_panics() {
        let mut store = GraphicsLayerStore::new();
        let p = store.create_layer("p");
        let c = store.create_layer("c");
        store.add_child(p, c);
        store.destroy_layer(p);
    }

    #[test]
    #[should_panic(expected = "stale GraphicsLayerId")]
    fn destroyed_handle_panics_on_position() {
        let mut store = GraphicsLayerStore::new();
        let a = store.create_layer("a");
        store.destroy_layer(a);
        let _ = store.position(a);
    }

    #[test]
    fn destroy_and_orphan_detaches_children() {
        let mut store = GraphicsLayerStore::new();
        let p = store.create_layer("p");
        let c = store.create_layer("c");
        store.add_child(p, c);
        store.destroy_layer_and_orphan_children(p);
        assert!(store.is_alive(c));
        assert_eq!(store.parent(c), None);
    }
}
