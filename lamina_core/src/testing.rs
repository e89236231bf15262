// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording test doubles for the embedder seams.

use alloc::vec::Vec;

use kurbo::{Rect, Size, Vec2};

use crate::client::{ChromeClient, CompositingTriggers, FixedPositionAnchors, GraphicsLayerClient, Presenter};
use crate::graphics::{GraphicsLayerStore, LayerCommit};
use crate::id::{FrameId, GraphicsLayerId, PlatformLayerId, ScrollingNodeId};

/// One call made on a [`RecordingClient`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum ClientCall {
    Attach(FrameId, Option<GraphicsLayerId>),
    ScheduleSync,
    WillSync,
    DidSync,
    AddFixed {
        layer: PlatformLayerId,
        anchors: FixedPositionAnchors,
        bounds: Rect,
        during_flush: bool,
    },
    RemoveFixed(PlatformLayerId),
    AddScrolling(ScrollingNodeId, Size),
    RemoveScrolling(ScrollingNodeId),
}

/// Chrome client that records every call.
#[derive(Debug)]
pub(crate) struct RecordingClient {
    pub(crate) triggers: CompositingTriggers,
    pub(crate) calls: Vec<ClientCall>,
}

impl Default for RecordingClient {
    fn default() -> Self {
        Self {
            triggers: CompositingTriggers::all(),
            calls: Vec::new(),
        }
    }
}

impl RecordingClient {
    pub(crate) fn count(&self, f: impl Fn(&ClientCall) -> bool) -> usize {
        self.calls.iter().filter(|c| f(c)).count()
    }

    pub(crate) fn attached_root(&self, frame: FrameId) -> Option<GraphicsLayerId> {
        self.calls.iter().rev().find_map(|c| match *c {
            ClientCall::Attach(f, layer) if f == frame => Some(layer),
            _ => None,
        })?
    }

    pub(crate) fn fixed_adds(&self) -> Vec<ClientCall> {
        self.calls
            .iter()
            .copied()
            .filter(|c| matches!(c, ClientCall::AddFixed { .. }))
            .collect()
    }
}

impl ChromeClient for RecordingClient {
    fn attach_root_graphics_layer(&mut self, frame: FrameId, layer: Option<GraphicsLayerId>) {
        self.calls.push(ClientCall::Attach(frame, layer));
    }

    fn allowed_compositing_triggers(&self) -> CompositingTriggers {
        self.triggers
    }

    fn schedule_compositing_layer_sync(&mut self) {
        self.calls.push(ClientCall::ScheduleSync);
    }

    fn will_sync_compositing_layers(&mut self) {
        self.calls.push(ClientCall::WillSync);
    }

    fn did_sync_compositing_layers(&mut self) {
        self.calls.push(ClientCall::DidSync);
    }

    fn add_or_update_fixed_position_layer(
        &mut self,
        layer: PlatformLayerId,
        anchors: FixedPositionAnchors,
        bounds: Rect,
        _alignment_offset: Vec2,
        during_flush: bool,
    ) {
        self.calls.push(ClientCall::AddFixed {
            layer,
            anchors,
            bounds,
            during_flush,
        });
    }

    fn remove_fixed_position_layer(&mut self, layer: PlatformLayerId, _during_flush: bool) {
        self.calls.push(ClientCall::RemoveFixed(layer));
    }

    fn add_or_update_scrolling_layer(
        &mut self,
        node: ScrollingNodeId,
        _scrolling_layer: PlatformLayerId,
        _contents_layer: PlatformLayerId,
        scroll_size: Size,
    ) {
        self.calls.push(ClientCall::AddScrolling(node, scroll_size));
    }

    fn remove_scrolling_layer(
        &mut self,
        node: ScrollingNodeId,
        _scrolling_layer: PlatformLayerId,
        _contents_layer: PlatformLayerId,
    ) {
        self.calls.push(ClientCall::RemoveScrolling(node));
    }
}

/// Presenter that keeps every commit it was handed.
#[derive(Debug, Default)]
pub(crate) struct RecordingPresenter {
    pub(crate) commits: Vec<LayerCommit>,
}

impl Presenter for RecordingPresenter {
    fn apply(&mut self, _store: &GraphicsLayerStore, commit: &LayerCommit, _painter: &dyn GraphicsLayerClient) {
        self.commits.push(commit.clone());
    }
}
