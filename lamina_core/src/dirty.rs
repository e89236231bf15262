// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants for the graphics-layer store.
//!
//! Graphics-layer mutations are tracked with [`understory_dirty`] so that a
//! flush only hands the platform the layers that actually changed.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`GEOMETRY`] uses
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) with child-to-parent
//!   dependency edges. Moving or transforming a layer moves its whole
//!   subtree on screen, so descendants are reported too.
//!
//! - **Local-only**: [`APPEARANCE`] (opacity, masking, draws-content,
//!   replica) and [`CONTENT`] (needs-display) affect only the marked layer.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on child-list mutations and on
//!   create/destroy.
//!
//! # Consumption
//!
//! [`GraphicsLayerStore::sync_compositing_state`](crate::graphics::GraphicsLayerStore::sync_compositing_state)
//! drains every channel into a [`LayerCommit`](crate::graphics::LayerCommit).

use understory_dirty::Channel;

/// Position, size, or transform changed.
pub const GEOMETRY: Channel = Channel::new(0);

/// Opacity, masking, draws-content, or replica changed.
pub const APPEARANCE: Channel = Channel::new(1);

/// Content needs repainting.
pub const CONTENT: Channel = Channel::new(2);

/// Child lists changed.
pub const TOPOLOGY: Channel = Channel::new(3);
