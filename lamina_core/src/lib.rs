// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer compositing decisions for a document renderer.
//!
//! `lamina_core` decides which layers of a rendered document are promoted to
//! their own GPU-composited graphics layers, builds and maintains the
//! graphics-layer hierarchy that mirrors them, and hands the result to a
//! platform presenter. It is `no_std` compatible (with `alloc`) and stores
//! both layer trees as struct-of-arrays arenas with generational handles.
//!
//! # Architecture
//!
//! ```text
//!   Layout system
//!       │  styles, geometry, tree edits
//!       ▼
//!   PaintLayerTree ──► Compositor::update_compositing_layers()
//!                          │  requirements pass (overlap-aware)
//!                          │  tree builder / geometry refresh
//!                          ▼
//!                      GraphicsLayerStore ──► flush ──► LayerCommit ──► Presenter::apply()
//!                          │
//!                          └──► ChromeClient (root attachment, fixed and scrolling layers)
//! ```
//!
//! **[`paint`]**: The layout system's layer tree: paint-order lists,
//! geometry, and the renderer state ([`LayerStyle`](paint::LayerStyle)) each
//! compositing decision reads.
//!
//! **[`graphics`]**: The graphics-layer store the compositor builds, with
//! dirty tracking via `understory_dirty` and a drained
//! [`LayerCommit`](graphics::LayerCommit) per flush.
//!
//! **[`compositor`]**: The per-document [`Compositor`](compositor::Compositor):
//! compositing requirements, backings, the hierarchy rebuild, root layer
//! attachment, and fixed/scrolling layer registration.
//!
//! **[`page`]**: [`Page`](page::Page), a host for the documents of one frame
//! tree that routes requests between parent and child documents.
//!
//! **[`client`]**: The embedder seams: [`ChromeClient`](client::ChromeClient),
//! [`Presenter`](client::Presenter), and layer painting.
//!
//! **[`scheduler`]**: The deferred-update timer.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) and the update, flush,
//! and attachment events, behind a zero-overhead [`Tracer`](trace::Tracer).
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies.
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-layer
//!   backing and fixed-layer events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod client;
pub mod compositor;
pub mod dirty;
pub mod graphics;
pub mod id;
pub mod page;
pub mod paint;
pub mod scheduler;
pub mod trace;
pub mod transform;

#[cfg(test)]
mod testing;
