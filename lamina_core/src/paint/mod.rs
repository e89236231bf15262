// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The paint-layer tree: the layout system's layers, as seen by the
//! compositor.
//!
//! Every layer belongs to one of its parent's three paint-order lists
//! (negative z, normal flow, positive z). Only stacking contexts have z-ordered
//! lists. The compositor walks these lists in painting order, which is what
//! makes overlap testing meaningful.

mod style;
mod traverse;
mod tree;

pub use style::{
    AcceleratedScrolling, AnimatedProperties, Insets, LayerStyle, Length, OverflowControls,
    Position, RendererKind,
};
pub use traverse::PaintOrderChildren;
pub use tree::{PaintLayerTree, PaintOrderList};
