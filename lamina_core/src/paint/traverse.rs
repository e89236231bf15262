// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint-order traversal utilities.

use core::slice;

use super::tree::PaintLayerTree;
use crate::id::PaintLayerId;

/// An iterator over one paint-order list of a layer.
///
/// Created by [`PaintLayerTree::children`].
#[derive(Debug)]
pub struct PaintOrderChildren<'a> {
    tree: &'a PaintLayerTree,
    inner: slice::Iter<'a, u32>,
}

impl<'a> PaintOrderChildren<'a> {
    pub(crate) fn new(tree: &'a PaintLayerTree, list: &'a [u32]) -> Self {
        Self {
            tree,
            inner: list.iter(),
        }
    }
}

impl Iterator for PaintOrderChildren<'_> {
    type Item = PaintLayerId;

    fn next(&mut self) -> Option<PaintLayerId> {
        let &idx = self.inner.next()?;
        Some(PaintLayerId {
            idx,
            generation: self.tree.generation[idx as usize],
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for PaintOrderChildren<'_> {}
