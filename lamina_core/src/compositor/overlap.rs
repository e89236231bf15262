// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlap bookkeeping for one requirements pass.

use alloc::vec::Vec;

use kurbo::{Rect, Size};

use crate::id::PaintLayerId;

/// Absolute bounds of the layers composited so far in the current pass, in
/// paint order.
///
/// Queries are a linear scan. Rectangles that share a single point overlap.
#[derive(Clone, Debug, Default)]
pub struct OverlapMap {
    entries: Vec<(PaintLayerId, Rect)>,
}

impl OverlapMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns whether nothing was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of recorded layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Records `layer` with absolute bounds `bounds`.
    pub fn add(&mut self, layer: PaintLayerId, bounds: Rect) {
        self.entries.push((layer, bounds));
    }

    /// Returns whether `bounds` overlaps any recorded rectangle.
    #[must_use]
    pub fn overlaps(&self, bounds: Rect) -> bool {
        self.entries.iter().any(|&(_, r)| rects_overlap(r, bounds))
    }

    /// Returns whether `layer` was recorded.
    #[must_use]
    pub fn contains(&self, layer: PaintLayerId) -> bool {
        self.entries.iter().any(|&(l, _)| l == layer)
    }
}

/// Inclusive intersection test: touching edges count.
#[must_use]
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Inflates a zero-area rectangle to 1x1 so that it can still be tested.
#[must_use]
pub(crate) fn overlap_test_bounds(bounds: Rect) -> Rect {
    if bounds.is_zero_area() {
        Rect::from_origin_size(bounds.origin(), Size::new(1.0, 1.0))
    } else {
        bounds
    }
}
