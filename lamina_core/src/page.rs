// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A page: the documents of one frame tree sharing a graphics-layer store
//! and a chrome client.
//!
//! [`Page`] is the reference host for [`Compositor`]. It lends each
//! compositor a [`CompositingContext`] whose frame lookup sees every other
//! document, and it carries out the [`HostRequest`]s compositors queue for
//! one another.

use alloc::vec::Vec;

use hashbrown::HashSet;
use kurbo::Rect;

use crate::client::{ChromeClient, Presenter};
use crate::compositor::{
    CompositingContext, CompositingUpdateType, Compositor, CompositorSettings, FrameCompositors,
    FrameContents, FrameEnvironment, FrameOwner, FrameView, HostRequest, UpdateOutcome,
};
use crate::graphics::GraphicsLayerStore;
use crate::id::{FrameId, PaintLayerId};
use crate::paint::PaintLayerTree;
use crate::trace::{TraceSink, Tracer};

/// Upper bound on request/update rounds in [`Page::run_pending_updates`].
/// Each round can only propagate compositing one frame level.
const MAX_UPDATE_ROUNDS: usize = 16;

/// One document: its paint layers and its compositor.
#[derive(Debug)]
pub struct Document {
    /// The document's paint layers.
    pub tree: PaintLayerTree,
    /// The document's compositor.
    pub compositor: Compositor,
}

/// The documents of a page.
#[derive(Debug)]
pub struct Page<C> {
    graphics: GraphicsLayerStore,
    // Indexed by `FrameId`. A slot is empty while its document is lent out.
    documents: Vec<Option<Document>>,
    client: C,
    needs_update: HashSet<FrameId>,
    accelerated_rendering_changes: Vec<(FrameId, PaintLayerId)>,
}

impl<C: ChromeClient> Page<C> {
    /// Creates an empty page hosted by `client`.
    pub fn new(client: C) -> Self {
        Self {
            graphics: GraphicsLayerStore::new(),
            documents: Vec::new(),
            client,
            needs_update: HashSet::new(),
            accelerated_rendering_changes: Vec::new(),
        }
    }

    /// The page's graphics layers.
    #[must_use]
    pub fn graphics(&self) -> &GraphicsLayerStore {
        &self.graphics
    }

    /// The chrome client.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Mutable access to the chrome client.
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Adds the top-level document, with a root paint layer of `bounds`.
    pub fn add_main_frame(
        &mut self,
        settings: CompositorSettings,
        view: Option<FrameView>,
        bounds: Rect,
    ) -> FrameId {
        let frame = self.next_frame();
        self.add_document(FrameEnvironment::main_frame(frame), settings, view, bounds)
    }

    /// Adds a document hosted by `owner`. `configure` adjusts the new
    /// document's environment before its compositor is created.
    ///
    /// # Panics
    ///
    /// Panics if the owner's parent frame is not part of this page.
    pub fn add_subframe(
        &mut self,
        owner: FrameOwner,
        settings: CompositorSettings,
        view: Option<FrameView>,
        bounds: Rect,
        configure: impl FnOnce(&mut FrameEnvironment),
    ) -> FrameId {
        assert!(
            self.document(owner.parent_frame).is_some(),
            "parent frame {:?} is not part of this page",
            owner.parent_frame
        );
        let frame = self.next_frame();
        let mut env = FrameEnvironment::subframe(frame, owner);
        configure(&mut env);
        self.add_document(env, settings, view, bounds)
    }

    fn next_frame(&self) -> FrameId {
        FrameId(u32::try_from(self.documents.len()).unwrap_or(u32::MAX))
    }

    fn add_document(
        &mut self,
        env: FrameEnvironment,
        settings: CompositorSettings,
        view: Option<FrameView>,
        bounds: Rect,
    ) -> FrameId {
        let frame = env.frame;
        let mut tree = PaintLayerTree::new();
        tree.create_root(bounds);
        let mut compositor = Compositor::new(settings, env, view);
        {
            let ctx = CompositingContext::new(&mut tree, &mut self.graphics).with_client(&mut self.client);
            compositor.cache_accelerated_compositing_flags(&ctx);
        }
        self.documents.push(Some(Document { tree, compositor }));
        frame
    }

    /// The document of `frame`.
    #[must_use]
    pub fn document(&self, frame: FrameId) -> Option<&Document> {
        self.documents.get(frame.0 as usize)?.as_ref()
    }

    /// Mutable access to the document of `frame`.
    pub fn document_mut(&mut self, frame: FrameId) -> Option<&mut Document> {
        self.documents.get_mut(frame.0 as usize)?.as_mut()
    }

    /// The compositor of `frame`.
    #[must_use]
    pub fn compositor(&self, frame: FrameId) -> Option<&Compositor> {
        self.document(frame).map(|d| &d.compositor)
    }

    /// The paint layers of `frame`.
    #[must_use]
    pub fn tree(&self, frame: FrameId) -> Option<&PaintLayerTree> {
        self.document(frame).map(|d| &d.tree)
    }

    /// Mutable access to the paint layers of `frame`.
    pub fn tree_mut(&mut self, frame: FrameId) -> Option<&mut PaintLayerTree> {
        self.document_mut(frame).map(|d| &mut d.tree)
    }

    /// Frames in tree order.
    #[must_use]
    pub fn frames(&self) -> Vec<FrameId> {
        let lookup = PageFrames(&self.documents);
        let mut out = Vec::new();
        for (i, slot) in self.documents.iter().enumerate() {
            let Some(doc) = slot else { continue };
            if doc.compositor.environment().owner.is_none() {
                let frame = FrameId(u32::try_from(i).unwrap_or(u32::MAX));
                out.push(frame);
                out.extend(lookup.descendant_frames(frame));
            }
        }
        out
    }

    /// Runs `f` with the compositor of `frame` and a context lending it the
    /// page. Returns `None` if `frame` is not part of the page.
    pub fn with_context<R>(
        &mut self,
        frame: FrameId,
        f: impl FnOnce(&mut Compositor, &mut CompositingContext<'_>) -> R,
    ) -> Option<R> {
        self.lend(frame, None, f)
    }

    /// Like [`with_context`](Self::with_context), reporting to `sink`.
    pub fn with_context_traced<R>(
        &mut self,
        frame: FrameId,
        sink: &mut dyn TraceSink,
        f: impl FnOnce(&mut Compositor, &mut CompositingContext<'_>) -> R,
    ) -> Option<R> {
        self.lend(frame, Some(sink), f)
    }

    fn lend<R>(
        &mut self,
        frame: FrameId,
        sink: Option<&mut dyn TraceSink>,
        f: impl FnOnce(&mut Compositor, &mut CompositingContext<'_>) -> R,
    ) -> Option<R> {
        let slot = self.documents.get_mut(frame.0 as usize)?;
        let mut doc = slot.take()?;
        let result = {
            let tracer = match sink {
                Some(sink) => Tracer::new(sink),
                None => Tracer::none(),
            };
            let frames = PageFrames(&self.documents);
            let mut ctx = CompositingContext::new(&mut doc.tree, &mut self.graphics)
                .with_client(&mut self.client)
                .with_frames(&frames)
                .with_tracer(tracer);
            f(&mut doc.compositor, &mut ctx)
        };
        let requests = doc.compositor.take_host_requests();
        self.documents[frame.0 as usize] = Some(doc);
        for request in requests {
            self.handle_request(frame, request);
        }
        Some(result)
    }

    fn handle_request(&mut self, from: FrameId, request: HostRequest) {
        match request {
            HostRequest::ScheduleStyleRecalc { frame } => {
                // The owner element is restyled in the parent document.
                self.needs_update.insert(frame);
                if let Some(owner) = self.compositor(frame).and_then(|c| c.environment().owner) {
                    self.needs_update.insert(owner.parent_frame);
                }
            }
            HostRequest::UpdateRootLayerAttachment { frame } => {
                self.needs_update.insert(frame);
            }
            HostRequest::AcceleratedRenderingStateChanged { layer } => {
                self.accelerated_rendering_changes.push((from, layer));
            }
        }
    }

    /// Whether some document has work queued for
    /// [`run_pending_updates`](Self::run_pending_updates).
    #[must_use]
    pub fn has_pending_updates(&self) -> bool {
        !self.needs_update.is_empty()
    }

    /// Takes the video layers whose backing changed, for the media players.
    pub fn take_accelerated_rendering_changes(&mut self) -> Vec<(FrameId, PaintLayerId)> {
        core::mem::take(&mut self.accelerated_rendering_changes)
    }

    /// Restyles `layer` of `frame` and updates the document.
    pub fn layer_style_changed(&mut self, frame: FrameId, layer: PaintLayerId) -> Option<UpdateOutcome> {
        self.with_context(frame, |compositor, ctx| {
            compositor.layer_style_changed(ctx, layer);
            compositor.update_compositing_layers(ctx, CompositingUpdateType::AfterLayoutOrStyleChange, None)
        })
    }

    /// Runs a compositing update of `frame`.
    pub fn update(&mut self, frame: FrameId, update_type: CompositingUpdateType) -> Option<UpdateOutcome> {
        self.needs_update.remove(&frame);
        self.with_context(frame, |compositor, ctx| {
            compositor.update_compositing_layers(ctx, update_type, None)
        })
    }

    /// Carries out queued requests until every document is settled.
    ///
    /// A sub-frame that entered or left compositing has its owner element
    /// restyled in the parent document and its root attachment
    /// re-evaluated; every touched document is then updated.
    pub fn run_pending_updates(&mut self) {
        for _ in 0..MAX_UPDATE_ROUNDS {
            if self.needs_update.is_empty() {
                return;
            }
            let mut frames: Vec<_> = self.needs_update.drain().collect();
            frames.sort_unstable();
            for frame in frames {
                self.with_context(frame, |compositor, ctx| compositor.update_root_layer_attachment(ctx));
                let owner = self.compositor(frame).and_then(|c| c.environment().owner);
                if let Some(FrameOwner {
                    parent_frame,
                    layer: Some(layer),
                    ..
                }) = owner
                {
                    self.with_context(parent_frame, |compositor, ctx| {
                        compositor.layer_style_changed(ctx, layer);
                        compositor.set_compositing_layers_need_rebuild();
                    });
                    self.needs_update.insert(parent_frame);
                }
                self.with_context(frame, |compositor, ctx| {
                    compositor.update_compositing_layers(ctx, CompositingUpdateType::AfterLayoutOrStyleChange, None)
                });
            }
        }
    }

    /// Flushes every document whose root is not grafted into a parent.
    pub fn flush(&mut self, mut presenter: Option<&mut dyn Presenter>) {
        for frame in self.frames() {
            let is_flush_root = self
                .compositor(frame)
                .is_some_and(|c| c.environment().owner.is_none());
            self.with_context(frame, |compositor, ctx| {
                let presenter = presenter.as_mut().map(|p| &mut **p as &mut dyn Presenter);
                compositor.flush_pending_layer_changes(ctx, presenter, is_flush_root);
            });
        }
    }

    /// Tears down every document's compositing state.
    pub fn teardown(&mut self) {
        for frame in self.frames().into_iter().rev() {
            self.with_context(frame, |compositor, ctx| compositor.teardown(ctx));
        }
        self.needs_update.clear();
    }
}

/// Frame lookup over the documents not currently lent out.
struct PageFrames<'a>(&'a [Option<Document>]);

impl FrameCompositors for PageFrames<'_> {
    fn contents(&self, frame: FrameId) -> Option<&dyn FrameContents> {
        let doc = self.0.get(frame.0 as usize)?.as_ref()?;
        Some(&doc.compositor)
    }

    fn descendant_frames(&self, frame: FrameId) -> Vec<FrameId> {
        let mut out = Vec::new();
        let mut stack = alloc::vec![frame];
        while let Some(parent) = stack.pop() {
            // Children in reverse so the stack pops them in frame order.
            let children = self.0.iter().enumerate().rev().filter_map(|(i, slot)| {
                let owner = slot.as_ref()?.compositor.environment().owner?;
                (owner.parent_frame == parent).then(|| FrameId(u32::try_from(i).unwrap_or(u32::MAX)))
            });
            for child in children {
                stack.push(child);
            }
            if parent != frame {
                out.push(parent);
            }
        }
        out
    }
}
