// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Graphics layers: the platform-facing tree the compositor builds.
//!
//! The store owns every graphics layer of a page. The compositor creates and
//! destroys layers through backings and its root-layer plumbing, rebuilds
//! child lists, and pushes geometry; a [`Presenter`](crate::client::Presenter)
//! mirrors the resulting [`LayerCommit`]s into native layers.

mod commit;
mod store;
mod traverse;

pub use commit::LayerCommit;
pub use store::GraphicsLayerStore;
pub use traverse::Children;
