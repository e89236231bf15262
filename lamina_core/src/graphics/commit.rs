// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flushing graphics-layer changes to the platform.
//!
//! Synchronization follows a drain pattern for each dirty channel:
//!
//! 1. **GEOMETRY**: drain affected indices (marked layers plus their
//!    descendants).
//! 2. **APPEARANCE** / **CONTENT**: drain locally marked indices. Content
//!    entries carry the accumulated invalidation rect, which is cleared.
//! 3. **TOPOLOGY**: drain and reduce to a single flag.
//!
//! [`LayerCommit`] uses raw slot indices so presenters can index the store
//! directly via the `*_at()` accessors.

use alloc::vec::Vec;

use kurbo::Rect;

use super::store::GraphicsLayerStore;
use crate::dirty;

/// The set of changes produced by one
/// [`GraphicsLayerStore::sync_compositing_state`] call.
#[derive(Clone, Debug, Default)]
pub struct LayerCommit {
    /// Layers whose position, size, or transform changed, directly or
    /// through an ancestor.
    pub geometry: Vec<u32>,
    /// Layers whose opacity, masking, draws-content, or replica changed.
    pub appearance: Vec<u32>,
    /// Layers with pending invalidations, with the invalidated rect.
    pub content: Vec<(u32, Rect)>,
    /// Layers created since the last sync.
    pub added: Vec<u32>,
    /// Layers destroyed since the last sync.
    pub removed: Vec<u32>,
    /// Whether any child list changed.
    pub topology_changed: bool,
}

impl LayerCommit {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.geometry.clear();
        self.appearance.clear();
        self.content.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Returns whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
            && self.appearance.is_empty()
            && self.content.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl GraphicsLayerStore {
    /// Drains all pending changes into a [`LayerCommit`].
    pub fn sync_compositing_state(&mut self) -> LayerCommit {
        let mut commit = LayerCommit::default();
        self.sync_compositing_state_into(&mut commit);
        commit
    }

    /// Like [`sync_compositing_state`](Self::sync_compositing_state), but
    /// reuses a caller-provided buffer.
    pub fn sync_compositing_state_into(&mut self, commit: &mut LayerCommit) {
        commit.clear();

        let alive = &self.alive;
        commit.geometry = self
            .dirty
            .drain(dirty::GEOMETRY)
            .affected()
            .deterministic()
            .run()
            .filter(|&idx| alive[idx as usize])
            .collect();

        commit.appearance = self
            .dirty
            .drain(dirty::APPEARANCE)
            .deterministic()
            .run()
            .filter(|&idx| alive[idx as usize])
            .collect();

        let content: Vec<u32> = self
            .dirty
            .drain(dirty::CONTENT)
            .deterministic()
            .run()
            .collect();
        for idx in content {
            if let Some(rect) = self.needs_display[idx as usize].take() {
                if self.alive[idx as usize] {
                    commit.content.push((idx, rect));
                }
            }
        }

        let topology = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .count();
        commit.topology_changed = topology > 0;

        commit.added = core::mem::take(&mut self.pending_added);
        commit.removed = core::mem::take(&mut self.pending_removed);
        // A layer created and destroyed between syncs never reached the platform.
        commit.added.retain(|idx| !commit.removed.contains(idx));
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Size};

    use super::*;

    #[test]
    fn geometry_propagates_to_descendants() {
        let mut store = GraphicsLayerStore::new();
        let root = store.create_layer("root");
        let child = store.create_layer("child");
        let grandchild = store.create_layer("grandchild");
        store.add_child(root, child);
        store.add_child(child, grandchild);
        let _ = store.sync_compositing_state();

        store.set_position(root, Point::new(5.0, 5.0));
        let commit = store.sync_compositing_state();
        assert!(commit.geometry.contains(&root.index()), "root moved");
        assert!(commit.geometry.contains(&child.index()), "child moved");
        assert!(commit.geometry.contains(&grandchild.index()), "grandchild moved");
    }

    #[test]
    fn unchanged_values_do_not_dirty() {
        let mut store = GraphicsLayerStore::new();
        let a = store.create_layer("a");
        store.set_size(a, Size::new(10.0, 10.0));
        let _ = store.sync_compositing_state();
        store.set_size(a, Size::new(10.0, 10.0));
        store.set_opacity(a, 1.0);
        assert!(store.sync_compositing_state().is_empty());
    }

    #[test]
    fn appearance_is_local() {
        let mut store = GraphicsLayerStore::new();
        let root = store.create_layer("root");
        let child = store.create_layer("child");
        store.add_child(root, child);
        let _ = store.sync_compositing_state();
        store.set_opacity(root, 0.5);
        let commit = store.sync_compositing_state();
        assert_eq!(commit.appearance, alloc::vec![root.index()]);
        assert!(commit.geometry.is_empty());
    }

    #[test]
    fn content_carries_rect_and_clears_it() {
        let mut store = GraphicsLayerStore::new();
        let a = store.create_layer("a");
        store.set_draws_content(a, true);
        store.set_size(a, Size::new(50.0, 40.0));
        store.set_needs_display(a);
        let commit = store.sync_compositing_state();
        assert_eq!(commit.content, alloc::vec![(a.index(), Rect::new(0.0, 0.0, 50.0, 40.0))]);
        assert_eq!(store.needs_display(a), None);
    }

    #[test]
    fn lifecycle_lists_and_transient_layers() {
        let mut store = GraphicsLayerStore::new();
        let keep = store.create_layer("keep");
        let transient = store.create_layer("transient");
        store.destroy_layer(transient);
        let commit = store.sync_compositing_state();
        assert_eq!(commit.added, alloc::vec![keep.index()]);
        assert_eq!(commit.removed, alloc::vec![transient.index()]);
        assert!(commit.topology_changed);
        assert!(store.sync_compositing_state().is_empty());
    }
}
