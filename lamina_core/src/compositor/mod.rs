// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-document compositor.
//!
//! A [`Compositor`] decides which paint layers of one document get their own
//! graphics layers, keeps the graphics-layer hierarchy in sync with the
//! paint-layer tree, attaches the document's root graphics layer to the
//! chrome client (or to the parent document), and keeps the client informed
//! of viewport-fixed and accelerated-scrolling layers.
//!
//! The compositor owns no layers itself. Every operation that touches them
//! takes a [`CompositingContext`] that lends it the paint-layer tree, the
//! graphics-layer store, the chrome client, a lookup of the page's other
//! documents, and a [`Tracer`].
//!
//! # Update pipeline
//!
//! ```text
//! update_compositing_layers
//!   compute_compositing_requirements   backings created/destroyed (overlap-aware)
//!   rebuild_compositing_layer_tree     child lists, bounds, geometry
//!     or update_layer_tree_geometry    geometry only
//!   sync_fixed_position_layers         report changed fixed-layer sizing
//! flush_pending_layer_changes
//!   GraphicsLayerStore::sync_compositing_state -> Presenter::apply
//!   sync_fixed_position_layers
//! ```

mod attachment;
mod backing;
mod fixed;
mod frames;
mod overlap;
mod requirements;
mod settings;
mod tree_builder;

#[cfg(test)]
mod tests;

use alloc::vec::Vec;
use core::cell::Cell;

use hashbrown::{HashMap, HashSet};
use kurbo::Rect;

pub use attachment::RootLayerAttachment;
pub use backing::Backing;
pub use fixed::{FixedPositionSizing, compute_fixed_position_sizing};
pub use frames::{FrameCompositors, FrameContents, HostRequest, NoFrames};
pub use overlap::{OverlapMap, rects_overlap};
pub use requirements::{CompositingReasons, CompositingState};
pub use settings::{CompositorSettings, FrameEnvironment, FrameOwner, FrameOwnerKind, FrameView};

use crate::client::{ChromeClient, CompositingTriggers, Presenter};
use crate::graphics::GraphicsLayerStore;
use crate::id::{FrameId, GraphicsLayerId, PaintLayerId};
use crate::paint::PaintLayerTree;
use crate::scheduler::{RunLoop, UpdateTimer};
use crate::trace::{FlushEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, Tracer, UpdateEvent};
use fixed::ScrollingRegistration;

/// Why a compositing update runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositingUpdateType {
    /// After layout or a style change.
    AfterLayoutOrStyleChange,
    /// Before painting or hit testing.
    OnPaintingOrHitTest,
    /// After the document scrolled.
    OnScroll,
}

/// Whether to repaint when a layer's compositing state changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositingChangeRepaint {
    /// Repaint the affected area now.
    Now,
    /// The caller repaints later.
    Later,
}

/// How far a geometry refresh reaches below a composited layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeometryUpdateDepth {
    /// Stop at the nearest composited descendants.
    CompositingChildren,
    /// Visit every composited descendant.
    AllDescendants,
}

/// A property an accelerated animation can drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimatedProperty {
    /// `opacity`.
    Opacity,
    /// `transform`.
    Transform,
}

/// What one [`Compositor::update_compositing_layers`] call did. All fields
/// are `false` when the update was skipped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Compositing requirements were recomputed.
    pub hierarchy_checked: bool,
    /// The graphics-layer hierarchy was rebuilt.
    pub hierarchy_rebuilt: bool,
    /// Only geometry was refreshed.
    pub geometry_updated: bool,
    /// A backing was created or destroyed.
    pub layers_changed: bool,
}

/// Everything a compositor operation borrows from its host.
pub struct CompositingContext<'a> {
    /// The document's paint layers.
    pub tree: &'a mut PaintLayerTree,
    /// The page's graphics layers.
    pub graphics: &'a mut GraphicsLayerStore,
    /// The chrome client, when the document is attached to a page.
    pub client: Option<&'a mut dyn ChromeClient>,
    /// The page's other documents.
    pub frames: &'a dyn FrameCompositors,
    /// Trace sink.
    pub tracer: Tracer<'a>,
}

impl core::fmt::Debug for CompositingContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CompositingContext")
            .field("client", &self.client.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> CompositingContext<'a> {
    /// A context with no client, no other documents, and no tracing.
    #[must_use]
    pub fn new(tree: &'a mut PaintLayerTree, graphics: &'a mut GraphicsLayerStore) -> Self {
        Self {
            tree,
            graphics,
            client: None,
            frames: &NoFrames,
            tracer: Tracer::none(),
        }
    }

    /// Sets the chrome client.
    #[must_use]
    pub fn with_client(mut self, client: &'a mut dyn ChromeClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the lookup of other documents.
    #[must_use]
    pub fn with_frames(mut self, frames: &'a dyn FrameCompositors) -> Self {
        self.frames = frames;
        self
    }

    /// Sets the tracer.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Tracer<'a>) -> Self {
        self.tracer = tracer;
        self
    }
}

/// Compositing state of one document.
#[derive(Debug)]
pub struct Compositor {
    settings: CompositorSettings,
    env: FrameEnvironment,
    view: Option<FrameView>,

    has_accelerated_compositing: bool,
    show_debug_borders: bool,
    show_repaint_counter: bool,
    triggers: CompositingTriggers,

    compositing: bool,
    // Set from `&self` while classifying plug-ins and frames.
    compositing_depends_on_geometry: Cell<bool>,
    compositing_consults_overlap: bool,
    compositing_layers_need_rebuild: bool,
    flushing_layers: bool,
    force_compositing_mode: bool,
    root_layer_attachment: RootLayerAttachment,

    root_content_layer: Option<GraphicsLayerId>,
    overflow_controls_host_layer: Option<GraphicsLayerId>,
    clip_layer: Option<GraphicsLayerId>,
    scroll_layer: Option<GraphicsLayerId>,
    layer_for_horizontal_scrollbar: Option<GraphicsLayerId>,
    layer_for_vertical_scrollbar: Option<GraphicsLayerId>,
    layer_for_scroll_corner: Option<GraphicsLayerId>,

    fixed_position_layers: HashSet<PaintLayerId>,
    fixed_position_sizings: HashMap<PaintLayerId, FixedPositionSizing>,
    scrolling_layers: HashMap<PaintLayerId, ScrollingRegistration>,

    update_timer: UpdateTimer,
    host_requests: Vec<HostRequest>,
    window_damage: Vec<Rect>,
    needs_one_shot_drawing_synchronization: bool,
    update_count: u64,
}

impl Compositor {
    /// Creates the compositor of one document.
    #[must_use]
    pub fn new(settings: CompositorSettings, env: FrameEnvironment, view: Option<FrameView>) -> Self {
        // Sub-frames never force compositing; their owner would composite
        // for them.
        let force_compositing_mode = settings.force_compositing_mode
            && settings.accelerated_compositing_enabled
            && env.owner.is_none();
        Self {
            settings,
            env,
            view,
            has_accelerated_compositing: settings.accelerated_compositing_enabled,
            show_debug_borders: settings.show_debug_borders,
            show_repaint_counter: settings.show_repaint_counter,
            triggers: CompositingTriggers::all(),
            compositing: false,
            compositing_depends_on_geometry: Cell::new(false),
            compositing_consults_overlap: true,
            compositing_layers_need_rebuild: false,
            flushing_layers: false,
            force_compositing_mode,
            root_layer_attachment: RootLayerAttachment::Unattached,
            root_content_layer: None,
            overflow_controls_host_layer: None,
            clip_layer: None,
            scroll_layer: None,
            layer_for_horizontal_scrollbar: None,
            layer_for_vertical_scrollbar: None,
            layer_for_scroll_corner: None,
            fixed_position_layers: HashSet::new(),
            fixed_position_sizings: HashMap::new(),
            scrolling_layers: HashMap::new(),
            update_timer: UpdateTimer::new(),
            host_requests: Vec::new(),
            window_damage: Vec::new(),
            needs_one_shot_drawing_synchronization: false,
            update_count: 0,
        }
    }

    // -- Accessors --

    /// The document's frame.
    #[must_use]
    pub const fn frame(&self) -> FrameId {
        self.env.frame
    }

    /// The document settings.
    #[must_use]
    pub const fn settings(&self) -> &CompositorSettings {
        &self.settings
    }

    /// Where the document sits in the page.
    #[must_use]
    pub const fn environment(&self) -> &FrameEnvironment {
        &self.env
    }

    /// Mutable access to the page-level facts. Call
    /// [`update_root_layer_attachment`](Self::update_root_layer_attachment)
    /// after changing anything that affects propagation.
    pub fn environment_mut(&mut self) -> &mut FrameEnvironment {
        &mut self.env
    }

    /// The frame view state, if the document has a view.
    #[must_use]
    pub const fn frame_view(&self) -> Option<&FrameView> {
        self.view.as_ref()
    }

    /// Replaces the frame view state.
    pub fn set_frame_view(&mut self, view: Option<FrameView>) {
        self.view = view;
    }

    /// Whether the document is in compositing mode.
    #[must_use]
    pub const fn in_compositing_mode(&self) -> bool {
        self.compositing
    }

    /// Whether accelerated compositing is available.
    #[must_use]
    pub const fn has_accelerated_compositing(&self) -> bool {
        self.has_accelerated_compositing
    }

    /// The triggers the chrome client allows.
    #[must_use]
    pub const fn compositing_triggers(&self) -> CompositingTriggers {
        self.triggers
    }

    /// Whether debug borders are shown.
    #[must_use]
    pub const fn show_debug_borders(&self) -> bool {
        self.show_debug_borders
    }

    /// Whether repaint counters are shown.
    #[must_use]
    pub const fn show_repaint_counter(&self) -> bool {
        self.show_repaint_counter
    }

    /// Whether overlap testing decides which layers composite.
    #[must_use]
    pub const fn compositing_consults_overlap(&self) -> bool {
        self.compositing_consults_overlap
    }

    /// Turns overlap testing on or off.
    pub fn set_compositing_consults_overlap(&mut self, consult: bool) {
        self.compositing_consults_overlap = consult;
    }

    /// Whether compositing decisions depend on layout geometry (plug-in or
    /// frame sizes), so every layout needs a requirements pass.
    #[must_use]
    pub fn compositing_depends_on_geometry(&self) -> bool {
        self.compositing_depends_on_geometry.get()
    }

    /// Whether the next update must rebuild the hierarchy.
    #[must_use]
    pub const fn compositing_layers_need_rebuild(&self) -> bool {
        self.compositing_layers_need_rebuild
    }

    /// Whether compositing is forced on for this document.
    #[must_use]
    pub const fn force_compositing_mode(&self) -> bool {
        self.force_compositing_mode
    }

    /// Whether a flush is in progress.
    #[must_use]
    pub const fn is_flushing_layers(&self) -> bool {
        self.flushing_layers
    }

    /// Where the root graphics layer is attached.
    #[must_use]
    pub const fn root_layer_attachment(&self) -> RootLayerAttachment {
        self.root_layer_attachment
    }

    /// The document-sized layer hosting the root backing.
    #[must_use]
    pub const fn root_content_layer(&self) -> Option<GraphicsLayerId> {
        self.root_content_layer
    }

    /// The frame clipping layer.
    #[must_use]
    pub const fn clip_layer(&self) -> Option<GraphicsLayerId> {
        self.clip_layer
    }

    /// The frame scrolling layer.
    #[must_use]
    pub const fn scroll_layer(&self) -> Option<GraphicsLayerId> {
        self.scroll_layer
    }

    /// The frame's horizontal scrollbar layer.
    #[must_use]
    pub const fn layer_for_horizontal_scrollbar(&self) -> Option<GraphicsLayerId> {
        self.layer_for_horizontal_scrollbar
    }

    /// The frame's vertical scrollbar layer.
    #[must_use]
    pub const fn layer_for_vertical_scrollbar(&self) -> Option<GraphicsLayerId> {
        self.layer_for_vertical_scrollbar
    }

    /// The frame's scroll corner layer.
    #[must_use]
    pub const fn layer_for_scroll_corner(&self) -> Option<GraphicsLayerId> {
        self.layer_for_scroll_corner
    }

    /// Number of updates that were not skipped.
    #[must_use]
    pub const fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Takes the requests queued for the host.
    pub fn take_host_requests(&mut self) -> Vec<HostRequest> {
        core::mem::take(&mut self.host_requests)
    }

    /// Takes the window areas (root coordinates) that must be repainted
    /// outside any graphics layer.
    pub fn take_window_damage(&mut self) -> Vec<Rect> {
        core::mem::take(&mut self.window_damage)
    }

    /// Whether the next window repaint must be synchronized with the next
    /// layer flush.
    #[must_use]
    pub const fn needs_one_shot_drawing_synchronization(&self) -> bool {
        self.needs_one_shot_drawing_synchronization
    }

    /// Reads and clears the drawing-synchronization flag.
    pub fn take_one_shot_drawing_synchronization(&mut self) -> bool {
        core::mem::take(&mut self.needs_one_shot_drawing_synchronization)
    }

    // -- Configuration --

    /// Re-reads settings and the client's allowed triggers.
    pub fn cache_accelerated_compositing_flags(&mut self, ctx: &CompositingContext<'_>) {
        let mut has_accelerated_compositing = self.settings.accelerated_compositing_enabled;
        // The chrome may not support what the settings allow.
        if has_accelerated_compositing && self.env.has_page {
            if let Some(client) = ctx.client.as_deref() {
                self.triggers = client.allowed_compositing_triggers();
                has_accelerated_compositing = !self.triggers.is_empty();
            }
        }
        if has_accelerated_compositing != self.has_accelerated_compositing
            || self.settings.show_debug_borders != self.show_debug_borders
            || self.settings.show_repaint_counter != self.show_repaint_counter
        {
            self.set_compositing_layers_need_rebuild();
        }
        self.has_accelerated_compositing = has_accelerated_compositing;
        self.show_debug_borders = self.settings.show_debug_borders;
        self.show_repaint_counter = self.settings.show_repaint_counter;
    }

    /// Replaces the settings and re-reads the derived flags.
    pub fn set_settings(&mut self, ctx: &CompositingContext<'_>, settings: CompositorSettings) {
        self.settings = settings;
        self.cache_accelerated_compositing_flags(ctx);
    }

    /// Whether 3-D transforms can be rendered.
    #[must_use]
    pub fn can_render_3d_transforms(&self) -> bool {
        self.has_accelerated_compositing && self.triggers.contains(CompositingTriggers::THREE_D_TRANSFORM)
    }

    /// Requests a hierarchy rebuild on the next update. Ignored outside
    /// compositing mode.
    pub fn set_compositing_layers_need_rebuild(&mut self) {
        if self.compositing {
            self.compositing_layers_need_rebuild = true;
        }
    }

    // -- Scheduling --

    /// Asks the chrome client for a flush.
    pub fn schedule_layer_flush(&self, ctx: &mut CompositingContext<'_>) {
        if !self.env.has_page {
            return;
        }
        if let Some(client) = ctx.client.as_deref_mut() {
            client.schedule_compositing_layer_sync();
        }
    }

    /// Schedules a deferred update. Requests coalesce until it runs.
    pub fn schedule_compositing_layer_update(&mut self, run_loop: &mut dyn RunLoop) {
        self.update_timer.start_one_shot(run_loop);
    }

    /// Whether a deferred update is pending.
    #[must_use]
    pub const fn compositing_layer_update_pending(&self) -> bool {
        self.update_timer.is_active()
    }

    /// Runs the deferred update.
    pub fn update_compositing_layers_timer_fired(&mut self, ctx: &mut CompositingContext<'_>) -> UpdateOutcome {
        self.update_compositing_layers(ctx, CompositingUpdateType::AfterLayoutOrStyleChange, None)
    }

    // -- Update --

    /// Brings backings and the graphics-layer hierarchy up to date.
    ///
    /// `update_root` limits the hierarchy rebuild to a subtree; it is
    /// ignored (and the whole tree updated) when overlap testing is on or a
    /// rebuild was requested.
    pub fn update_compositing_layers(
        &mut self,
        ctx: &mut CompositingContext<'_>,
        update_type: CompositingUpdateType,
        update_root: Option<PaintLayerId>,
    ) -> UpdateOutcome {
        self.update_timer.stop();

        if self.force_compositing_mode && !self.compositing {
            self.enable_compositing_mode(ctx, true);
        }

        if !self.compositing_depends_on_geometry.get() && !self.compositing {
            return UpdateOutcome::default();
        }

        let mut check_for_hierarchy_update = self.compositing_depends_on_geometry.get();
        let mut need_geometry_update = false;
        match update_type {
            CompositingUpdateType::AfterLayoutOrStyleChange => {
                check_for_hierarchy_update = true;
                need_geometry_update = true;
            }
            CompositingUpdateType::OnPaintingOrHitTest => {
                check_for_hierarchy_update = true;
            }
            CompositingUpdateType::OnScroll => {
                if self.compositing_consults_overlap {
                    check_for_hierarchy_update = true;
                }
                need_geometry_update = true;
            }
        }

        if !check_for_hierarchy_update && !need_geometry_update {
            return UpdateOutcome::default();
        }

        let mut need_hierarchy_update = self.compositing_layers_need_rebuild;
        // The requirements pass sorts the lists a rebuild reads.
        check_for_hierarchy_update |= need_hierarchy_update;
        let root = match update_root {
            Some(layer) if !need_hierarchy_update && !self.compositing_consults_overlap => layer,
            _ => {
                // Overlap and pending rebuilds need the whole tree.
                self.compositing_layers_need_rebuild = false;
                match ctx.tree.root() {
                    Some(root) => root,
                    None => return UpdateOutcome::default(),
                }
            }
        };
        let is_full_update = Some(root) == ctx.tree.root();

        self.update_count += 1;
        let update_index = self.update_count;
        let frame = self.env.frame;
        let mut outcome = UpdateOutcome::default();

        if check_for_hierarchy_update {
            ctx.tracer.phase_begin(&PhaseBeginEvent {
                frame,
                update_index,
                phase: PhaseKind::Requirements,
            });
            let state = CompositingState::new(self.enclosing_compositing_layer(ctx.tree, root, false));
            let mut layers_changed = false;
            if self.compositing_consults_overlap {
                let mut overlap_map = OverlapMap::new();
                self.compute_compositing_requirements(ctx, root, Some(&mut overlap_map), state, &mut layers_changed);
            } else {
                self.compute_compositing_requirements(ctx, root, None, state, &mut layers_changed);
            }
            need_hierarchy_update |= layers_changed;
            outcome.hierarchy_checked = true;
            outcome.layers_changed = layers_changed;
            ctx.tracer.phase_end(&PhaseEndEvent {
                frame,
                update_index,
                phase: PhaseKind::Requirements,
            });
        }

        if need_hierarchy_update {
            ctx.tracer.phase_begin(&PhaseBeginEvent {
                frame,
                update_index,
                phase: PhaseKind::Rebuild,
            });
            let mut child_list = Vec::new();
            self.rebuild_compositing_layer_tree(ctx, root, 0, &mut child_list);
            if is_full_update {
                if child_list.is_empty() {
                    self.destroy_root_layer(ctx);
                } else if let Some(content_root) = self.root_content_layer {
                    ctx.graphics.set_children(content_root, &child_list);
                }
            }
            outcome.hierarchy_rebuilt = true;
            ctx.tracer.phase_end(&PhaseEndEvent {
                frame,
                update_index,
                phase: PhaseKind::Rebuild,
            });
        } else if need_geometry_update {
            ctx.tracer.phase_begin(&PhaseBeginEvent {
                frame,
                update_index,
                phase: PhaseKind::Geometry,
            });
            self.update_layer_tree_geometry(ctx, root, 0);
            outcome.geometry_updated = true;
            ctx.tracer.phase_end(&PhaseEndEvent {
                frame,
                update_index,
                phase: PhaseKind::Geometry,
            });
        }

        if !self.has_accelerated_compositing {
            self.enable_compositing_mode(ctx, false);
        }
        self.sync_fixed_position_layers(ctx);

        ctx.tracer.update(&UpdateEvent {
            frame,
            update_index,
            update_type,
            hierarchy_checked: outcome.hierarchy_checked,
            hierarchy_rebuilt: outcome.hierarchy_rebuilt,
            geometry_updated: outcome.geometry_updated,
            layers_changed: outcome.layers_changed,
        });
        outcome
    }

    // -- Flush --

    /// Pushes pending graphics-layer changes to the platform.
    ///
    /// Sub-frames grafted into their parent are flushed with it, so they
    /// only flush themselves when `is_flush_root`.
    ///
    /// # Panics
    ///
    /// Panics when called re-entrantly from inside a flush.
    pub fn flush_pending_layer_changes(
        &mut self,
        ctx: &mut CompositingContext<'_>,
        presenter: Option<&mut dyn Presenter>,
        is_flush_root: bool,
    ) {
        if !self.compositing {
            return;
        }
        if !is_flush_root && self.root_layer_attachment == RootLayerAttachment::ViaEnclosingFrame {
            return;
        }
        if let Some(client) = ctx.client.as_deref_mut() {
            client.will_sync_compositing_layers();
        }

        assert!(!self.flushing_layers, "flush_pending_layer_changes is not re-entrant");
        self.flushing_layers = true;

        let mut flushed = FlushEvent {
            frame: self.env.frame,
            geometry: 0,
            appearance: 0,
            content: 0,
            added: 0,
            removed: 0,
        };
        if self.root_graphics_layer().is_some() {
            let commit = ctx.graphics.sync_compositing_state();
            if let Some(presenter) = presenter {
                presenter.apply(&*ctx.graphics, &commit, &*self);
            }
            flushed = FlushEvent {
                frame: self.env.frame,
                geometry: count(commit.geometry.len()),
                appearance: count(commit.appearance.len()),
                content: count(commit.content.len()),
                added: count(commit.added.len()),
                removed: count(commit.removed.len()),
            };
        }

        self.flushing_layers = false;
        if let Some(client) = ctx.client.as_deref_mut() {
            client.did_sync_compositing_layers();
        }

        self.sync_fixed_position_layers(ctx);

        ctx.tracer.flush(&flushed);
    }

    // -- Notifications from the layout system --

    /// A layer's style changed.
    pub fn layer_style_changed(&mut self, ctx: &mut CompositingContext<'_>, layer: PaintLayerId) {
        if self.update_layer_compositing_state(ctx, layer, CompositingChangeRepaint::Now) {
            self.set_compositing_layers_need_rebuild();
        } else if ctx.tree.is_composited(layer) {
            self.update_backing_after_layout(ctx, layer, GeometryUpdateDepth::CompositingChildren);
        }
    }

    /// A layer was inserted under `parent`.
    pub fn layer_was_added(&mut self, _parent: PaintLayerId, _child: PaintLayerId) {
        self.set_compositing_layers_need_rebuild();
    }

    /// `child` is about to be removed from `parent`. Its backings (and its
    /// descendants') are destroyed and the area it covered is repainted.
    pub fn layer_will_be_removed(&mut self, ctx: &mut CompositingContext<'_>, parent: PaintLayerId, child: PaintLayerId) {
        if !ctx.tree.is_composited(child) {
            return;
        }
        self.remove_fixed_position_layer(ctx, child);
        self.set_compositing_parent(ctx, child, None);

        if let Some(container) = self.enclosing_compositing_layer(ctx.tree, parent, true) {
            let bounds = ctx.tree.backing(child).map_or(Rect::ZERO, Backing::composited_bounds);
            let offset = ctx.tree.convert_to_layer_coords(child, Some(container));
            self.set_backing_needs_repaint_in_rect(ctx, container, bounds + offset);
            // The repaint reaches the window before the layer disappears.
            self.needs_one_shot_drawing_synchronization = true;
        }

        self.clear_backing_for_layer_including_descendants(ctx, child);
        self.set_compositing_layers_need_rebuild();
    }

    /// An accelerated animation started. Transform animations move layers
    /// without layout, so overlap testing is turned off.
    pub fn did_start_accelerated_animation(&mut self, property: AnimatedProperty) {
        if property == AnimatedProperty::Transform {
            self.compositing_consults_overlap = false;
        }
    }

    /// Whether anything in the document uses 3-D rendering.
    #[must_use]
    pub fn has_3d_content(&self, tree: &PaintLayerTree) -> bool {
        tree.root().is_some_and(|root| self.layer_has_3d_content(tree, root))
    }

    /// Destroys every backing in the document.
    pub fn clear_backing_for_all_layers(&mut self, ctx: &mut CompositingContext<'_>) {
        if let Some(root) = ctx.tree.root() {
            self.clear_backing_for_layer_including_descendants(ctx, root);
        }
    }

    /// Leaves compositing mode for good: destroys every backing and root
    /// layer and detaches from the client.
    pub fn teardown(&mut self, ctx: &mut CompositingContext<'_>) {
        self.clear_backing_for_all_layers(ctx);
        self.destroy_root_layer(ctx);
        self.compositing = false;
        self.compositing_layers_need_rebuild = false;
        self.update_timer.invalidate();
    }
}

impl FrameContents for Compositor {
    fn root_graphics_layer(&self) -> Option<GraphicsLayerId> {
        Self::root_graphics_layer(self)
    }

    fn root_layer_attachment(&self) -> RootLayerAttachment {
        self.root_layer_attachment
    }

    fn in_compositing_mode(&self) -> bool {
        self.compositing
    }

    fn should_propagate_compositing_to_enclosing_frame(&self) -> bool {
        Self::should_propagate_compositing_to_enclosing_frame(self)
    }

    fn is_flushing_layers(&self) -> bool {
        self.flushing_layers
    }

    fn parent_frame(&self) -> Option<FrameId> {
        self.env.owner.map(|o| o.parent_frame)
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
