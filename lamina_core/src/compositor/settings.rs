// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-document configuration and the frame-view state the compositor reads.

use kurbo::{Point, Rect, Size};

use crate::id::{FrameId, PaintLayerId};

/// Document settings that affect compositing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositorSettings {
    /// Master switch for accelerated compositing.
    pub accelerated_compositing_enabled: bool,
    /// Enter compositing mode even when nothing requires it.
    pub force_compositing_mode: bool,
    /// Draw debug borders around graphics layers.
    pub show_debug_borders: bool,
    /// Draw repaint counters on graphics layers.
    pub show_repaint_counter: bool,
    /// Paint layer contents through accelerated drawing.
    pub accelerated_drawing_enabled: bool,
    /// Round graphics-layer positions to whole pixels, reporting the dropped
    /// fraction as the pixel-alignment offset.
    pub keep_layers_pixel_aligned: bool,
}

impl CompositorSettings {
    /// Settings with accelerated compositing turned off.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            accelerated_compositing_enabled: false,
            ..Self::DEFAULT
        }
    }

    const DEFAULT: Self = Self {
        accelerated_compositing_enabled: true,
        force_compositing_mode: false,
        show_debug_borders: false,
        show_repaint_counter: false,
        accelerated_drawing_enabled: false,
        keep_layers_pixel_aligned: true,
    };
}

impl Default for CompositorSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Element type of a frame's owner in the parent document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameOwnerKind {
    /// `<iframe>`.
    IFrame,
    /// `<frame>`.
    Frame,
    /// `<object>`.
    Object,
    /// Any other owner (for example `<embed>`). Such frames never propagate
    /// compositing to the parent document.
    Other,
}

/// The element hosting a sub-frame in its parent document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameOwner {
    /// The parent document's frame.
    pub parent_frame: FrameId,
    /// Owner element type.
    pub kind: FrameOwnerKind,
    /// Whether the owner is rendered by a frame-hosting renderer.
    pub renderer_is_part: bool,
    /// The owner's paint layer in the parent document, if it has one.
    pub layer: Option<PaintLayerId>,
}

/// Where a document sits in the page, and the page-level facts that decide
/// how its root layer attaches.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameEnvironment {
    /// This document's frame.
    pub frame: FrameId,
    /// The owner element, for sub-frames.
    pub owner: Option<FrameOwner>,
    /// Whether the platform can composite sub-frames independently of their
    /// parent document (for example with native views per frame).
    pub allows_independently_composited_frames: bool,
    /// Page scale of the main frame.
    pub page_scale_factor: f64,
    /// Whether this frame's view is overlapped by content of an ancestor
    /// document.
    pub overlapped_including_ancestors: bool,
    /// Whether some ancestor document is already compositing.
    pub has_compositing_ancestor: bool,
    /// Whether the document is attached to a page (and so to a chrome client).
    pub has_page: bool,
}

impl FrameEnvironment {
    /// The top-level document of a page.
    #[must_use]
    pub const fn main_frame(frame: FrameId) -> Self {
        Self {
            frame,
            owner: None,
            allows_independently_composited_frames: false,
            page_scale_factor: 1.0,
            overlapped_including_ancestors: false,
            has_compositing_ancestor: false,
            has_page: true,
        }
    }

    /// A document hosted by `owner`.
    #[must_use]
    pub const fn subframe(frame: FrameId, owner: FrameOwner) -> Self {
        Self {
            owner: Some(owner),
            ..Self::main_frame(frame)
        }
    }

    /// Returns the owner element if it is one that can propagate compositing
    /// (`iframe`, `frame`, or `object`).
    #[must_use]
    pub fn enclosing_frame_element(&self) -> Option<FrameOwner> {
        self.owner.filter(|o| o.kind != FrameOwnerKind::Other)
    }
}

/// The frame view's scrolling and sizing state, in document coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameView {
    /// Size of the scrollable contents.
    pub contents_size: Size,
    /// Size of the visible viewport.
    pub visible_content_size: Size,
    /// Current scroll position.
    pub scroll_position: Point,
    /// The document rect (may start at negative coordinates).
    pub document_rect: Rect,
    /// Whether the view is backed by a native widget that scrolls itself.
    pub platform_widget: bool,
    /// Whether scrollbars overlay the content.
    pub has_overlay_scrollbars: bool,
    /// Horizontal scrollbar frame, if shown.
    pub horizontal_scrollbar: Option<Rect>,
    /// Vertical scrollbar frame, if shown.
    pub vertical_scrollbar: Option<Rect>,
    /// Scroll corner frame, if visible.
    pub scroll_corner: Option<Rect>,
    /// The rect viewport-fixed content is laid out against.
    pub custom_fixed_position_layout_rect: Rect,
    /// Whether an element is animating into or out of full screen.
    pub is_animating_full_screen: bool,
    /// Whether the document is suspended in the page cache.
    pub in_page_cache: bool,
}

impl FrameView {
    /// A view whose viewport, contents, and fixed-position rect all equal
    /// `size`, scrolled to the origin.
    #[must_use]
    pub fn new(size: Size) -> Self {
        let rect = Rect::from_origin_size(Point::ZERO, size);
        Self {
            contents_size: size,
            visible_content_size: size,
            scroll_position: Point::ZERO,
            document_rect: rect,
            platform_widget: false,
            has_overlay_scrollbars: false,
            horizontal_scrollbar: None,
            vertical_scrollbar: None,
            scroll_corner: None,
            custom_fixed_position_layout_rect: rect,
            is_animating_full_screen: false,
            in_page_cache: false,
        }
    }

    /// Returns whether scrollbars get their own graphics layers.
    #[must_use]
    pub const fn composites_overflow_controls(&self) -> bool {
        !self.platform_widget && self.has_overlay_scrollbars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_frame_like_owners_enclose() {
        let owner = FrameOwner {
            parent_frame: FrameId(0),
            kind: FrameOwnerKind::Other,
            renderer_is_part: true,
            layer: None,
        };
        let env = FrameEnvironment::subframe(FrameId(1), owner);
        assert!(env.enclosing_frame_element().is_none());

        let env = FrameEnvironment::subframe(
            FrameId(1),
            FrameOwner {
                kind: FrameOwnerKind::IFrame,
                ..owner
            },
        );
        assert!(env.enclosing_frame_element().is_some());
    }

    #[test]
    fn overlay_scrollbars_composite_only_without_a_widget() {
        let mut view = FrameView::new(Size::new(800.0, 600.0));
        assert!(!view.composites_overflow_controls());
        view.has_overlay_scrollbars = true;
        assert!(view.composites_overflow_controls());
        view.platform_widget = true;
        assert!(!view.composites_overflow_controls());
    }

    #[test]
    fn disabled_settings_keep_other_defaults() {
        let s = CompositorSettings::disabled();
        assert!(!s.accelerated_compositing_enabled);
        assert!(s.keep_layers_pixel_aligned);
    }
}
