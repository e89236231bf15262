// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer state the compositor consults when deciding whether a paint
//! layer needs its own backing.
//!
//! The layout system owns this state; the compositor only reads it. Each
//! paint layer carries one [`LayerStyle`].

use kurbo::{Rect, Size};

use crate::id::{FrameId, ScrollingNodeId};
use crate::transform::Transform3d;

/// A CSS length that may be `auto`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Length {
    /// `auto`.
    #[default]
    Auto,
    /// A resolved pixel length.
    Px(f64),
}

impl Length {
    /// Returns whether this length is `auto`.
    #[inline]
    #[must_use]
    pub const fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }
}

/// The four positioning insets (`left`, `right`, `top`, `bottom`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Insets {
    /// `left`.
    pub left: Length,
    /// `right`.
    pub right: Length,
    /// `top`.
    pub top: Length,
    /// `bottom`.
    pub bottom: Length,
}

/// The CSS `position` of the layer's renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Position {
    /// `static`.
    #[default]
    Static,
    /// `relative`.
    Relative,
    /// `absolute`.
    Absolute,
    /// `fixed`.
    Fixed,
}

/// Properties currently driven by an accelerated animation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnimatedProperties {
    /// Opacity is animating.
    pub opacity: bool,
    /// Transform is animating.
    pub transform: bool,
}

/// Overflow controls painted by the layer itself, in layer-local coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OverflowControls {
    /// Horizontal scrollbar rectangle.
    pub horizontal_scrollbar: Option<Rect>,
    /// Vertical scrollbar rectangle.
    pub vertical_scrollbar: Option<Rect>,
    /// Scroll corner rectangle.
    pub scroll_corner: Option<Rect>,
}

impl OverflowControls {
    /// Returns whether any overflow control is present.
    #[must_use]
    pub fn any(&self) -> bool {
        self.horizontal_scrollbar.is_some()
            || self.vertical_scrollbar.is_some()
            || self.scroll_corner.is_some()
    }
}

/// Accelerated (touch) overflow scrolling configuration of a layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AcceleratedScrolling {
    /// The scrolling-tree node driven by this layer.
    pub node: ScrollingNodeId,
    /// Size of the scrolled contents.
    pub content_size: Size,
}

/// What kind of renderer owns the layer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum RendererKind {
    /// An ordinary box.
    #[default]
    Box,
    /// A video element.
    Video {
        /// Whether the element is currently displaying video frames.
        displaying: bool,
        /// Whether the media player renders through an accelerated layer.
        accelerated: bool,
    },
    /// A canvas element.
    Canvas {
        /// Whether the canvas uses an accelerated rendering context.
        accelerated: bool,
    },
    /// An embedded plug-in.
    Plugin {
        /// Whether the plug-in opted into accelerated compositing.
        allows_accelerated_compositing: bool,
        /// The plug-in's content box, in layer coordinates.
        content_box: Rect,
        /// Whether layout is pending, making `content_box` stale.
        needs_layout: bool,
    },
    /// An `iframe`/`frame`/`object` hosting another document.
    Frame {
        /// The hosted frame.
        frame: FrameId,
        /// The owner's content box, in layer coordinates.
        content_box: Rect,
        /// Whether layout is pending, making `content_box` stale.
        needs_layout: bool,
    },
    /// The placeholder standing in for an element animating into full screen.
    FullScreenPlaceholder,
}

/// The renderer state of one paint layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerStyle {
    /// Renderer kind and its capability state.
    pub kind: RendererKind,
    /// CSS `position`.
    pub position: Position,
    /// Positioning insets (used for fixed-layer anchoring).
    pub insets: Insets,
    /// Whether a fixed-position renderer is laid out against the custom
    /// fixed-position rect of the frame view.
    pub fixed_to_custom_rect: bool,
    /// The resolved transform, if any.
    pub transform: Option<Transform3d>,
    /// Whether the transform list contains a 3-D function.
    pub has_3d_transform_operation: bool,
    /// `transform-style: preserve-3d`.
    pub preserve_3d: bool,
    /// Whether a `perspective` property applies.
    pub has_perspective: bool,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Whether a mask is applied.
    pub has_mask: bool,
    /// `overflow` clips to the padding box.
    pub overflow_clip: bool,
    /// A CSS `clip` rectangle applies.
    pub css_clip: bool,
    /// `backface-visibility: hidden`.
    pub backface_hidden: bool,
    /// Accelerated animations running on this layer.
    pub animating: AnimatedProperties,
    /// Accelerated overflow scrolling, when enabled.
    pub accelerated_scrolling: Option<AcceleratedScrolling>,
    /// Overflow controls owned by the layer.
    pub overflow_controls: OverflowControls,
    /// Whether the layer paints itself (as opposed to painting into an
    /// ancestor).
    pub self_painting: bool,
    /// Whether the layer has anything of its own to paint.
    pub paints_content: bool,
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            kind: RendererKind::Box,
            position: Position::Static,
            insets: Insets::default(),
            fixed_to_custom_rect: false,
            transform: None,
            has_3d_transform_operation: false,
            preserve_3d: false,
            has_perspective: false,
            opacity: 1.0,
            has_mask: false,
            overflow_clip: false,
            css_clip: false,
            backface_hidden: false,
            animating: AnimatedProperties::default(),
            accelerated_scrolling: None,
            overflow_controls: OverflowControls::default(),
            self_painting: true,
            paints_content: true,
        }
    }
}

impl LayerStyle {
    /// Returns whether a transform applies.
    #[inline]
    #[must_use]
    pub const fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    /// Returns whether opacity is below one.
    #[inline]
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }

    /// Returns whether the transform needs 3-D rendering: a 3-D transform
    /// function, `preserve-3d`, or perspective.
    #[must_use]
    pub fn has_3d_transform(&self) -> bool {
        self.has_transform()
            && (self.has_3d_transform_operation || self.preserve_3d || self.has_perspective)
    }

    /// Returns whether the renderer is viewport-fixed against the frame
    /// view's custom fixed-position rect.
    #[inline]
    #[must_use]
    pub fn has_custom_fixed_position(&self) -> bool {
        self.position == Position::Fixed && self.fixed_to_custom_rect
    }

    /// Returns whether content clips descendants (`overflow` or CSS `clip`).
    #[inline]
    #[must_use]
    pub const fn clips_descendants(&self) -> bool {
        self.overflow_clip || self.css_clip
    }

    /// Returns whether this is a video renderer.
    #[inline]
    #[must_use]
    pub const fn is_video(&self) -> bool {
        matches!(self.kind, RendererKind::Video { .. })
    }
}
