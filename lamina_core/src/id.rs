// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handle types shared by the paint-layer tree, the graphics-layer store,
//! and the host.

use core::fmt;

/// Sentinel value indicating "no layer" in index fields.
pub const INVALID: u32 = u32::MAX;

macro_rules! generational_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name {
            /// Slot index into the owning arena.
            pub(crate) idx: u32,
            /// Generation counter; must match the arena's generation for this slot.
            pub(crate) generation: u32,
        }

        impl $name {
            /// Returns the raw slot index (for diagnostics and commit lists).
            #[inline]
            #[must_use]
            pub const fn index(self) -> u32 {
                self.idx
            }

            /// Returns the generation counter.
            #[inline]
            #[must_use]
            pub const fn generation(self) -> u32 {
                self.generation
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({}@gen{})"), self.idx, self.generation)
            }
        }
    };
}

generational_handle!(
    /// A handle to a layer in a [`PaintLayerTree`](crate::paint::PaintLayerTree).
    ///
    /// Paint layers are the layout system's layers: the input to every
    /// compositing decision.
    PaintLayerId
);

generational_handle!(
    /// A handle to a layer in a [`GraphicsLayerStore`](crate::graphics::GraphicsLayerStore).
    ///
    /// Graphics layers are the platform-facing layers the compositor builds.
    GraphicsLayerId
);

/// Opaque identity of the native layer backing a graphics layer.
///
/// This is the value handed to the chrome client when registering fixed and
/// scrolling layers. It is never reused within one store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlatformLayerId(pub u64);

impl fmt::Debug for PlatformLayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlatformLayerId({})", self.0)
    }
}

/// Identity of a frame (one document) within a page.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u32);

impl fmt::Debug for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameId({})", self.0)
    }
}

/// Identity of a node in the external scrolling tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScrollingNodeId(pub u64);

impl fmt::Debug for ScrollingNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScrollingNodeId({})", self.0)
    }
}
