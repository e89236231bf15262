// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Graphics-layer tree traversal.

use super::store::GraphicsLayerStore;
use crate::id::{GraphicsLayerId, INVALID};

/// An iterator over the direct children of a graphics layer.
///
/// Created by [`GraphicsLayerStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a GraphicsLayerStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a GraphicsLayerStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = GraphicsLayerId;

    fn next(&mut self) -> Option<GraphicsLayerId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_sibling[idx as usize];
        Some(self.store.handle(idx))
    }
}

impl GraphicsLayerStore {
    /// Visits `root` and its descendants depth-first, passing each layer's
    /// depth below `root`.
    pub fn walk(&self, root: GraphicsLayerId, f: &mut dyn FnMut(GraphicsLayerId, usize)) {
        fn visit(
            store: &GraphicsLayerStore,
            id: GraphicsLayerId,
            depth: usize,
            f: &mut dyn FnMut(GraphicsLayerId, usize),
        ) {
            f(id, depth);
            for child in store.children(id) {
                visit(store, child, depth + 1, f);
            }
        }
        visit(self, root, 0, f);
    }
}
