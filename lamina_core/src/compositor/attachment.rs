// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The document's root graphics layers and where they are attached.
//!
//! In compositing mode every document owns a content root layer. Documents
//! that scroll themselves also get a frame-level stack above it:
//!
//! ```text
//! overflow controls host
//!  +- frame clipping        (viewport-sized, masks)
//!  |   +- frame scrolling   (moved by the scroll position)
//!  |       +- content root  (document-sized; hosts the root backing)
//!  +- horizontal scrollbar / vertical scrollbar / scroll corner
//! ```
//!
//! The topmost of these is handed to the chrome client, or grafted under the
//! owner element's backing in the parent document.

use kurbo::{Point, Rect, Size, Vec2};

use super::{CompositingContext, Compositor, HostRequest};
use crate::client::{GraphicsContext, GraphicsLayerClient, OverflowControlPart, OverflowControlsOwner, PaintingPhase};
use crate::graphics::GraphicsLayerStore;
use crate::id::GraphicsLayerId;
use crate::trace::AttachmentEvent;

/// Where a document's root graphics layer is attached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RootLayerAttachment {
    /// Not attached anywhere.
    #[default]
    Unattached,
    /// Hosted directly by the chrome client.
    ViaChromeClient,
    /// Grafted into the parent document's layer tree.
    ViaEnclosingFrame,
}

impl Compositor {
    /// Returns whether this document's compositing must be expressed through
    /// its parent document instead of the chrome client.
    #[must_use]
    pub fn should_propagate_compositing_to_enclosing_frame(&self) -> bool {
        // The main frame has nothing to propagate to.
        let Some(owner) = self.env.enclosing_frame_element() else {
            return false;
        };
        // Parent content must be able to paint over a composited frame.
        if !self.env.allows_independently_composited_frames {
            return true;
        }
        if !owner.renderer_is_part {
            return false;
        }
        if self.env.page_scale_factor != 1.0 {
            return true;
        }
        self.env.overlapped_including_ancestors || self.env.has_compositing_ancestor
    }

    /// The topmost graphics layer of the document, if in compositing mode.
    #[must_use]
    pub fn root_graphics_layer(&self) -> Option<GraphicsLayerId> {
        self.overflow_controls_host_layer.or(self.root_content_layer)
    }

    /// Enters or leaves compositing mode.
    pub(crate) fn enable_compositing_mode(&mut self, ctx: &mut CompositingContext<'_>, enable: bool) {
        if enable == self.compositing {
            return;
        }
        self.compositing = enable;
        if enable {
            self.ensure_root_layer(ctx);
            self.notify_iframes_of_compositing_change(ctx);
        } else {
            self.destroy_root_layer(ctx);
        }
    }

    fn requires_scroll_layer(&self, attachment: RootLayerAttachment) -> bool {
        // Viewless documents and grafted frames scroll themselves.
        !self.view.is_some_and(|v| v.platform_widget) || attachment == RootLayerAttachment::ViaEnclosingFrame
    }

    /// Creates the root layers if needed and attaches them where this
    /// document's compositing should be shown.
    pub(crate) fn ensure_root_layer(&mut self, ctx: &mut CompositingContext<'_>) {
        let expected = if self.should_propagate_compositing_to_enclosing_frame() {
            RootLayerAttachment::ViaEnclosingFrame
        } else {
            RootLayerAttachment::ViaChromeClient
        };
        if expected == self.root_layer_attachment {
            return;
        }

        let content_root = match self.root_content_layer {
            Some(layer) => layer,
            None => {
                let layer = ctx.graphics.create_layer("content root");
                let size = self.view.map_or(Size::ZERO, |v| v.contents_size);
                ctx.graphics.set_size(layer, size);
                ctx.graphics.set_position(layer, Point::ZERO);
                // Transformed content must not show outside the frame.
                ctx.graphics.set_masks_to_bounds(layer, true);
                self.root_content_layer = Some(layer);
                layer
            }
        };

        if self.requires_scroll_layer(expected) {
            if self.overflow_controls_host_layer.is_none() {
                let host = ctx.graphics.create_layer("overflow controls host");
                let clip = ctx.graphics.create_layer("frame clipping");
                ctx.graphics.set_masks_to_bounds(clip, true);
                let scroll = ctx.graphics.create_layer("frame scrolling");

                ctx.graphics.add_child(host, clip);
                ctx.graphics.add_child(clip, scroll);
                ctx.graphics.add_child(scroll, content_root);

                self.overflow_controls_host_layer = Some(host);
                self.clip_layer = Some(clip);
                self.scroll_layer = Some(scroll);

                self.frame_view_did_change_size(ctx);
                let position = self.view.map_or(Point::ZERO, |v| v.scroll_position);
                self.frame_view_did_scroll(ctx, position);
            }
        } else {
            self.destroy_frame_scroll_layers(ctx.graphics);
        }

        if self.root_layer_attachment != RootLayerAttachment::Unattached {
            self.detach_root_layer(ctx);
        }
        self.attach_root_layer(ctx, expected);
    }

    fn destroy_frame_scroll_layers(&mut self, graphics: &mut GraphicsLayerStore) {
        for layer in [
            self.layer_for_horizontal_scrollbar.take(),
            self.layer_for_vertical_scrollbar.take(),
            self.layer_for_scroll_corner.take(),
            self.scroll_layer.take(),
            self.clip_layer.take(),
            self.overflow_controls_host_layer.take(),
        ]
        .into_iter()
        .flatten()
        {
            graphics.destroy_layer_and_orphan_children(layer);
        }
    }

    /// Detaches and destroys every root layer.
    pub(crate) fn destroy_root_layer(&mut self, ctx: &mut CompositingContext<'_>) {
        let Some(content_root) = self.root_content_layer else {
            return;
        };
        self.detach_root_layer(ctx);

        // Scrollbars go back to painting into the window.
        if let Some(view) = self.view {
            if self.layer_for_horizontal_scrollbar.is_some() {
                self.window_damage.extend(view.horizontal_scrollbar);
            }
            if self.layer_for_vertical_scrollbar.is_some() {
                self.window_damage.extend(view.vertical_scrollbar);
            }
            if self.layer_for_scroll_corner.is_some() {
                self.window_damage.extend(view.scroll_corner);
            }
        }
        self.destroy_frame_scroll_layers(ctx.graphics);
        ctx.graphics.destroy_layer_and_orphan_children(content_root);
        self.root_content_layer = None;
    }

    fn attach_root_layer(&mut self, ctx: &mut CompositingContext<'_>, attachment: RootLayerAttachment) {
        if self.root_content_layer.is_none() {
            return;
        }
        match attachment {
            // Not a destination.
            RootLayerAttachment::Unattached => return,
            RootLayerAttachment::ViaChromeClient => {
                if !self.env.has_page {
                    return;
                }
                let root = self.root_graphics_layer();
                if let Some(client) = ctx.client.as_deref_mut() {
                    client.attach_root_graphics_layer(self.env.frame, root);
                }
            }
            RootLayerAttachment::ViaEnclosingFrame => {
                // The owner's backing grafts us in when it is restyled.
                self.host_requests.push(HostRequest::ScheduleStyleRecalc {
                    frame: self.env.frame,
                });
            }
        }
        self.set_root_layer_attachment(ctx, attachment);
        // Fixed layers are replayed by the next sync, after geometry.
        self.register_all_scrolling_layers(ctx);
    }

    fn detach_root_layer(&mut self, ctx: &mut CompositingContext<'_>) {
        if self.root_content_layer.is_none() || self.root_layer_attachment == RootLayerAttachment::Unattached {
            return;
        }
        match self.root_layer_attachment {
            RootLayerAttachment::ViaEnclosingFrame => {
                if let Some(root) = self.root_graphics_layer() {
                    ctx.graphics.remove_from_parent(root);
                }
                self.host_requests.push(HostRequest::ScheduleStyleRecalc {
                    frame: self.env.frame,
                });
            }
            RootLayerAttachment::ViaChromeClient => {
                if !self.env.has_page {
                    return;
                }
                if let Some(client) = ctx.client.as_deref_mut() {
                    client.attach_root_graphics_layer(self.env.frame, None);
                }
            }
            RootLayerAttachment::Unattached => {}
        }
        self.unregister_all_fixed_position_layers(ctx);
        self.unregister_all_scrolling_layers(ctx);
        self.set_root_layer_attachment(ctx, RootLayerAttachment::Unattached);
    }

    fn set_root_layer_attachment(&mut self, ctx: &mut CompositingContext<'_>, to: RootLayerAttachment) {
        let from = self.root_layer_attachment;
        self.root_layer_attachment = to;
        ctx.tracer.attachment(&AttachmentEvent {
            frame: self.env.frame,
            from,
            to,
        });
        self.root_layer_attachment_changed(ctx);
    }

    /// Re-evaluates where the root layer should be attached. Does nothing
    /// outside compositing mode.
    pub fn update_root_layer_attachment(&mut self, ctx: &mut CompositingContext<'_>) {
        if self.compositing {
            self.ensure_root_layer(ctx);
        }
    }

    fn root_layer_attachment_changed(&mut self, ctx: &mut CompositingContext<'_>) {
        // Whether the root backing draws depends on the attachment.
        if let Some(root) = ctx.tree.root() {
            if ctx.tree.is_composited(root) {
                self.update_graphics_layer_configuration(ctx, root);
            }
        }
    }

    /// Moves the overflow-controls host to the view's position in its
    /// parent.
    pub fn frame_view_did_change_location(&mut self, ctx: &mut CompositingContext<'_>, contents_offset: Point) {
        if let Some(host) = self.overflow_controls_host_layer {
            ctx.graphics.set_position(host, contents_offset);
        }
    }

    /// Resizes the frame clip to the visible content size.
    pub fn frame_view_did_change_size(&mut self, ctx: &mut CompositingContext<'_>) {
        let (Some(clip), Some(view)) = (self.clip_layer, self.view) else {
            return;
        };
        ctx.graphics.set_size(clip, view.visible_content_size);
        self.frame_view_did_scroll(ctx, view.scroll_position);
        self.update_overflow_controls_layers(ctx);
    }

    /// Moves the frame scrolling layer to `scroll_position`.
    pub fn frame_view_did_scroll(&mut self, ctx: &mut CompositingContext<'_>, scroll_position: Point) {
        if let Some(view) = self.view.as_mut() {
            view.scroll_position = scroll_position;
        }
        if let Some(scroll) = self.scroll_layer {
            ctx.graphics
                .set_position(scroll, Point::ZERO - scroll_position.to_vec2());
        }
    }

    /// Sizes the content root to the document rect and the frame clip to
    /// the viewport.
    pub(crate) fn update_root_layer_position(&mut self, ctx: &mut CompositingContext<'_>) {
        let Some(view) = self.view else {
            return;
        };
        if let Some(content_root) = self.root_content_layer {
            ctx.graphics.set_size(content_root, view.document_rect.size());
            ctx.graphics.set_position(content_root, view.document_rect.origin());
        }
        if let Some(clip) = self.clip_layer {
            ctx.graphics.set_size(clip, view.visible_content_size);
        }
    }

    /// Creates or destroys the frame-level scrollbar and scroll-corner
    /// layers to match the view.
    pub fn update_overflow_controls_layers(&mut self, ctx: &mut CompositingContext<'_>) {
        let Some(host) = self.overflow_controls_host_layer else {
            return;
        };
        let view = self.view;
        let composites = view.is_some_and(|v| v.composites_overflow_controls());
        let wanted = |rect: Option<Rect>| if composites { rect } else { None };
        let parts = [
            (
                &mut self.layer_for_horizontal_scrollbar,
                wanted(view.and_then(|v| v.horizontal_scrollbar)),
                "horizontal scrollbar",
            ),
            (
                &mut self.layer_for_vertical_scrollbar,
                wanted(view.and_then(|v| v.vertical_scrollbar)),
                "vertical scrollbar",
            ),
            (
                &mut self.layer_for_scroll_corner,
                wanted(view.and_then(|v| v.scroll_corner)),
                "scroll corner",
            ),
        ];
        for (slot, rect, name) in parts {
            match (*slot, rect) {
                (None, Some(rect)) => {
                    let layer = ctx.graphics.create_layer(name);
                    ctx.graphics.set_draws_content(layer, true);
                    ctx.graphics.add_child(host, layer);
                    position_control(ctx.graphics, layer, rect);
                    *slot = Some(layer);
                }
                (Some(layer), Some(rect)) => position_control(ctx.graphics, layer, rect),
                (Some(layer), None) => {
                    ctx.graphics.destroy_layer(layer);
                    *slot = None;
                }
                (None, None) => {}
            }
        }
    }

    /// Attaches the root layer after the view comes on screen.
    pub fn did_move_onscreen(&mut self, ctx: &mut CompositingContext<'_>) {
        if !self.compositing || self.root_layer_attachment != RootLayerAttachment::Unattached {
            return;
        }
        let attachment = if self.should_propagate_compositing_to_enclosing_frame() {
            RootLayerAttachment::ViaEnclosingFrame
        } else {
            RootLayerAttachment::ViaChromeClient
        };
        self.attach_root_layer(ctx, attachment);
    }

    /// Detaches the root layer as the view goes off screen.
    pub fn will_move_offscreen(&mut self, ctx: &mut CompositingContext<'_>) {
        if !self.compositing || self.root_layer_attachment == RootLayerAttachment::Unattached {
            return;
        }
        self.detach_root_layer(ctx);
    }

    /// Asks the host to restyle every sub-frame owner (so frames can
    /// composite into us) and our own owner (whose compositing needs just
    /// changed).
    fn notify_iframes_of_compositing_change(&mut self, ctx: &mut CompositingContext<'_>) {
        for frame in ctx.frames.descendant_frames(self.env.frame) {
            self.host_requests.push(HostRequest::ScheduleStyleRecalc { frame });
        }
        if self.env.owner.is_some() {
            self.host_requests.push(HostRequest::ScheduleStyleRecalc {
                frame: self.env.frame,
            });
        }
    }
}

fn position_control(graphics: &mut GraphicsLayerStore, layer: GraphicsLayerId, rect: Rect) {
    graphics.set_position(layer, rect.origin());
    graphics.set_size(layer, rect.size());
}

impl GraphicsLayerClient for Compositor {
    fn paint_contents(
        &self,
        layer: GraphicsLayerId,
        context: &mut dyn GraphicsContext,
        _phase: PaintingPhase,
        clip: Rect,
    ) {
        let Some(view) = self.view else {
            return;
        };
        let part = if Some(layer) == self.layer_for_horizontal_scrollbar {
            view.horizontal_scrollbar
                .map(|r| (OverflowControlPart::HorizontalScrollbar, r))
        } else if Some(layer) == self.layer_for_vertical_scrollbar {
            view.vertical_scrollbar
                .map(|r| (OverflowControlPart::VerticalScrollbar, r))
        } else if Some(layer) == self.layer_for_scroll_corner {
            view.scroll_corner.map(|r| (OverflowControlPart::ScrollCorner, r))
        } else {
            None
        };
        let Some((part, frame_rect)) = part else {
            return;
        };
        let origin: Vec2 = frame_rect.origin().to_vec2();
        context.save();
        context.translate(-origin);
        context.paint_overflow_control(OverflowControlsOwner::FrameView, part, clip + origin);
        context.restore();
    }
}
