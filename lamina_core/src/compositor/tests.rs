// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Point, Rect, Size, Vec2};

use super::*;
use crate::client::FixedPositionAnchors;
use crate::id::ScrollingNodeId;
use crate::page::Page;
use crate::paint::{AcceleratedScrolling, Insets, LayerStyle, Length, PaintOrderList, Position, RendererKind};
use crate::testing::{ClientCall, RecordingClient, RecordingPresenter};
use crate::transform::Transform3d;

const VIEW: Size = Size::new(800.0, 600.0);

fn page() -> (Page<RecordingClient>, FrameId) {
    let mut page = Page::new(RecordingClient::default());
    let frame = page.add_main_frame(
        CompositorSettings::default(),
        Some(FrameView::new(VIEW)),
        Rect::from_origin_size(Point::ZERO, VIEW),
    );
    (page, frame)
}

/// Adds a layer at `rect` (parent coordinates) under `parent`.
fn add_layer(
    page: &mut Page<RecordingClient>,
    frame: FrameId,
    parent: PaintLayerId,
    list: PaintOrderList,
    rect: Rect,
    style: LayerStyle,
) -> PaintLayerId {
    let tree = page.tree_mut(frame).unwrap();
    let layer = tree.create_layer();
    tree.set_offset(layer, rect.origin().to_vec2());
    tree.set_bounding_box(layer, Rect::from_origin_size(Point::ZERO, rect.size()));
    tree.set_style(layer, style);
    tree.append_child(parent, layer, list);
    layer
}

fn root_layer(page: &Page<RecordingClient>, frame: FrameId) -> PaintLayerId {
    page.tree(frame).unwrap().root().unwrap()
}

fn canvas() -> LayerStyle {
    LayerStyle {
        kind: RendererKind::Canvas { accelerated: true },
        ..LayerStyle::default()
    }
}

fn is_composited(page: &Page<RecordingClient>, frame: FrameId, layer: PaintLayerId) -> bool {
    page.tree(frame).unwrap().is_composited(layer)
}

fn backing(page: &Page<RecordingClient>, frame: FrameId, layer: PaintLayerId) -> Backing {
    *page.tree(frame).unwrap().backing(layer).unwrap()
}

fn children(page: &Page<RecordingClient>, layer: GraphicsLayerId) -> Vec<GraphicsLayerId> {
    page.graphics().children(layer).collect()
}

#[test]
fn plain_layer_never_enters_compositing() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let div = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(10.0, 10.0, 110.0, 110.0),
        LayerStyle::default(),
    );

    let outcome = page.layer_style_changed(frame, div).unwrap();

    assert_eq!(outcome, UpdateOutcome::default(), "update should be skipped");
    assert!(!page.compositor(frame).unwrap().in_compositing_mode(), "no compositing mode");
    assert!(page.client().calls.is_empty(), "client must not be called: {:?}", page.client().calls);
    assert_eq!(page.graphics().layer_count(), 0, "no graphics layers");
}

#[test]
fn three_d_layer_promotes_later_siblings() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let three_d = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        LayerStyle {
            transform: Some(Transform3d::from_rotation_z(0.1)),
            has_3d_transform_operation: true,
            ..LayerStyle::default()
        },
    );
    // Far away from the 3-D layer; promoted anyway.
    let sibling = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(500.0, 500.0, 600.0, 550.0),
        LayerStyle::default(),
    );

    page.layer_style_changed(frame, three_d);

    let compositor = page.compositor(frame).unwrap();
    assert!(compositor.in_compositing_mode(), "3-D transform enters compositing");
    assert!(!compositor.compositing_consults_overlap(), "3-D transforms disable overlap testing");
    assert!(is_composited(&page, frame, root), "root hosts the document");
    assert!(is_composited(&page, frame, three_d), "3-D layer composited");
    assert!(is_composited(&page, frame, sibling), "later sibling must paint over it");

    let host = compositor.root_graphics_layer().unwrap();
    assert_eq!(page.client().attached_root(frame), Some(host), "root attached via client");
    assert_eq!(compositor.root_layer_attachment(), RootLayerAttachment::ViaChromeClient);

    let root_backing = backing(&page, frame, root);
    assert_eq!(
        children(&page, root_backing.parent_for_sublayers()),
        vec![
            backing(&page, frame, three_d).graphics_layer(),
            backing(&page, frame, sibling).graphics_layer()
        ],
        "children follow paint order"
    );
    assert_eq!(
        children(&page, compositor.root_content_layer().unwrap()),
        vec![root_backing.graphics_layer()],
        "content root hosts the root backing"
    );
}

fn translate_z() -> LayerStyle {
    LayerStyle {
        transform: Some(Transform3d::IDENTITY),
        has_3d_transform_operation: true,
        ..LayerStyle::default()
    }
}

#[test]
fn three_d_layer_leaves_earlier_twin_uncomposited() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
    let first = add_layer(&mut page, frame, root, PaintOrderList::NormalFlow, rect, LayerStyle::default());
    let second = add_layer(&mut page, frame, root, PaintOrderList::NormalFlow, rect, translate_z());

    page.layer_style_changed(frame, second);

    assert!(is_composited(&page, frame, second), "3-D layer composited");
    // Overlap only promotes layers painted after a composited one.
    assert!(!is_composited(&page, frame, first), "earlier twin paints into the root");
    assert!(
        !page.tree(frame).unwrap().must_overlap_composited_layers(first),
        "nothing composited before it"
    );
    let root_backing = backing(&page, frame, root);
    assert_eq!(
        children(&page, root_backing.parent_for_sublayers()),
        vec![backing(&page, frame, second).graphics_layer()],
        "only the 3-D layer is grafted"
    );
}

#[test]
fn untriggered_3d_transform_keeps_overlap_testing() {
    let mut page = Page::new(RecordingClient {
        triggers: CompositingTriggers::CANVAS,
        ..RecordingClient::default()
    });
    let frame = page.add_main_frame(
        CompositorSettings::default(),
        Some(FrameView::new(VIEW)),
        Rect::from_origin_size(Point::ZERO, VIEW),
    );
    let root = root_layer(&page, frame);
    let base = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        canvas(),
    );
    // Composited for overlapping the canvas, not for its transform.
    let three_d = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(50.0, 50.0, 150.0, 150.0),
        translate_z(),
    );
    let apart = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(400.0, 400.0, 500.0, 500.0),
        LayerStyle::default(),
    );

    page.layer_style_changed(frame, base);

    let compositor = page.compositor(frame).unwrap();
    assert!(!compositor.can_render_3d_transforms(), "3-D trigger withheld");
    assert!(is_composited(&page, frame, three_d), "promoted by overlap");
    assert!(compositor.compositing_consults_overlap(), "overlap stays on");
    assert!(!is_composited(&page, frame, apart), "disjoint layer stays in its ancestor");
}

#[test]
fn only_overlapping_later_layers_are_promoted() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let base = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        canvas(),
    );
    let over = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(50.0, 50.0, 150.0, 150.0),
        LayerStyle::default(),
    );
    let touching = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(100.0, 200.0, 200.0, 300.0),
        LayerStyle::default(),
    );
    let apart = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(400.0, 400.0, 500.0, 500.0),
        LayerStyle::default(),
    );

    page.layer_style_changed(frame, base);

    assert!(page.compositor(frame).unwrap().compositing_consults_overlap(), "overlap stays on");
    assert!(is_composited(&page, frame, base), "canvas composited");
    assert!(is_composited(&page, frame, over), "overlapping layer composited");
    // `over` spans x 50..150 and ends at y 150; `touching` starts at y 200.
    assert!(!is_composited(&page, frame, touching), "disjoint layer stays in its ancestor");
    assert!(!is_composited(&page, frame, apart), "disjoint layer stays in its ancestor");
    let tree = page.tree(frame).unwrap();
    assert!(tree.must_overlap_composited_layers(over), "overlap flag recorded");
    assert!(!tree.must_overlap_composited_layers(apart), "no overlap flag");
}

#[test]
fn touching_edges_count_as_overlap() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let base = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        canvas(),
    );
    let edge = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(100.0, 0.0, 200.0, 100.0),
        LayerStyle::default(),
    );

    page.layer_style_changed(frame, base);

    assert!(is_composited(&page, frame, edge), "shared edge overlaps");
}

#[test]
fn negative_z_child_composites_its_stacking_context() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let context = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::PositiveZ,
        Rect::new(0.0, 0.0, 300.0, 300.0),
        LayerStyle::default(),
    );
    page.tree_mut(frame).unwrap().set_stacking_context(context, true);
    let behind = add_layer(
        &mut page,
        frame,
        context,
        PaintOrderList::NegativeZ,
        Rect::new(10.0, 10.0, 60.0, 60.0),
        canvas(),
    );
    page.tree_mut(frame).unwrap().set_z_index(behind, -1);

    page.layer_style_changed(frame, behind);

    assert!(is_composited(&page, frame, behind), "canvas composited");
    assert!(is_composited(&page, frame, context), "stacking context paints over it");
    let b = backing(&page, frame, context);
    let fg = b.foreground_layer().expect("foreground layer for content above negative z");
    assert_eq!(
        children(&page, b.parent_for_sublayers()),
        vec![backing(&page, frame, behind).graphics_layer(), fg],
        "negative z child sits below the foreground"
    );
}

#[test]
fn group_opacity_composites_around_composited_child() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let group = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 200.0, 200.0),
        LayerStyle {
            opacity: 0.5,
            ..LayerStyle::default()
        },
    );
    let child = add_layer(
        &mut page,
        frame,
        group,
        PaintOrderList::NormalFlow,
        Rect::new(20.0, 20.0, 80.0, 80.0),
        canvas(),
    );

    page.layer_style_changed(frame, child);

    assert!(is_composited(&page, frame, child), "canvas composited");
    assert!(is_composited(&page, frame, group), "opacity applies to the composited child");
    let g = backing(&page, frame, group);
    assert_eq!(page.graphics().opacity(g.graphics_layer()), 0.5, "opacity on the graphics layer");
    assert_eq!(
        children(&page, g.parent_for_sublayers()),
        vec![backing(&page, frame, child).graphics_layer()],
        "child parented under the group"
    );
}

#[test]
fn reflection_is_composited_as_replica() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let reflected = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        canvas(),
    );
    let tree = page.tree_mut(frame).unwrap();
    let reflection = tree.create_layer();
    tree.set_bounding_box(reflection, Rect::new(0.0, 0.0, 100.0, 100.0));
    tree.set_offset(reflection, Vec2::new(0.0, 100.0));
    tree.set_reflection(reflected, reflection);

    page.layer_style_changed(frame, reflected);

    assert!(is_composited(&page, frame, reflection), "reflection follows its layer");
    let primary = backing(&page, frame, reflected).graphics_layer();
    let replica = backing(&page, frame, reflection).graphics_layer();
    assert_eq!(page.graphics().replica(primary), Some(replica), "replica installed");
}

#[test]
fn composited_bounds_contain_painted_descendants() {
    let (mut page, frame) = page();
    page.with_context(frame, |c, _| c.set_compositing_consults_overlap(false));
    let root = root_layer(&page, frame);
    let host = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(10.0, 10.0, 110.0, 110.0),
        canvas(),
    );
    let inner = add_layer(
        &mut page,
        frame,
        host,
        PaintOrderList::NormalFlow,
        Rect::new(80.0, 80.0, 130.0, 130.0),
        LayerStyle::default(),
    );

    page.layer_style_changed(frame, host);

    assert!(!is_composited(&page, frame, inner), "inner paints into the host");
    let b = backing(&page, frame, host);
    assert_eq!(b.composited_bounds(), Rect::new(0.0, 0.0, 130.0, 130.0), "bounds cover inner");
    assert_eq!(page.graphics().size(b.graphics_layer()), Size::new(130.0, 130.0), "layer size");
    assert_eq!(page.graphics().position(b.graphics_layer()), Point::new(10.0, 10.0), "layer position");
}

#[test]
fn root_bounds_cover_content_overhanging_the_document() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let c = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(600.0, 0.0, 700.0, 100.0),
        canvas(),
    );
    let overhang = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(-50.0, 550.0, 150.0, 700.0),
        LayerStyle::default(),
    );

    page.layer_style_changed(frame, c);

    assert!(!is_composited(&page, frame, overhang), "paints into the root");
    let bounds = backing(&page, frame, root).composited_bounds();
    assert_eq!(bounds, Rect::new(-50.0, 0.0, 800.0, 700.0), "document plus overhang");
}

#[test]
fn clipping_layer_bounds_stop_at_the_clip() {
    let (mut page, frame) = page();
    page.with_context(frame, |c, _| c.set_compositing_consults_overlap(false));
    let root = root_layer(&page, frame);
    let clipper = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        LayerStyle {
            overflow_clip: true,
            ..LayerStyle::default()
        },
    );
    let child = add_layer(
        &mut page,
        frame,
        clipper,
        PaintOrderList::NormalFlow,
        Rect::new(50.0, 50.0, 250.0, 250.0),
        canvas(),
    );

    page.layer_style_changed(frame, child);

    assert!(is_composited(&page, frame, clipper), "clipper composited for its child");
    let b = backing(&page, frame, clipper);
    assert_eq!(b.composited_bounds(), Rect::new(0.0, 0.0, 100.0, 100.0), "clipped bounds");
    let clip = b.clipping_layer().expect("clipping layer");
    assert!(page.graphics().masks_to_bounds(clip), "clip masks");
    assert_eq!(
        children(&page, clip),
        vec![backing(&page, frame, child).graphics_layer()],
        "child under the clip"
    );
}

#[test]
fn repeated_updates_are_idempotent() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let a = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        canvas(),
    );
    add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(50.0, 50.0, 150.0, 150.0),
        LayerStyle::default(),
    );
    page.layer_style_changed(frame, a);
    let layers = page.graphics().layer_count();
    let calls = page.client().calls.len();

    for _ in 0..3 {
        let outcome = page
            .update(frame, CompositingUpdateType::AfterLayoutOrStyleChange)
            .unwrap();
        assert!(outcome.hierarchy_checked, "requirements re-run");
        assert!(!outcome.layers_changed, "no backing churn");
        assert!(!outcome.hierarchy_rebuilt, "nothing to rebuild");
        assert!(outcome.geometry_updated, "geometry refreshed");
    }
    assert_eq!(page.graphics().layer_count(), layers, "same graphics layers");
    assert_eq!(page.client().calls.len(), calls, "no further client calls");
}

#[test]
fn disabled_compositing_never_creates_backings() {
    let mut page = Page::new(RecordingClient::default());
    let frame = page.add_main_frame(
        CompositorSettings::disabled(),
        Some(FrameView::new(VIEW)),
        Rect::from_origin_size(Point::ZERO, VIEW),
    );
    let root = root_layer(&page, frame);
    let c = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        canvas(),
    );

    page.layer_style_changed(frame, c);

    assert!(!is_composited(&page, frame, c), "cannot composite without acceleration");
    assert!(!page.compositor(frame).unwrap().in_compositing_mode(), "stays out of compositing");
}

#[test]
fn client_triggers_limit_reasons() {
    let mut page = Page::new(RecordingClient {
        triggers: CompositingTriggers::VIDEO,
        ..RecordingClient::default()
    });
    let frame = page.add_main_frame(
        CompositorSettings::default(),
        Some(FrameView::new(VIEW)),
        Rect::from_origin_size(Point::ZERO, VIEW),
    );
    let root = root_layer(&page, frame);
    let c = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        canvas(),
    );

    page.layer_style_changed(frame, c);

    assert!(!is_composited(&page, frame, c), "canvas trigger not allowed");
    assert!(!page.compositor(frame).unwrap().can_render_3d_transforms(), "no 3-D trigger");
}

#[test]
fn forced_compositing_composites_the_root() {
    let mut page = Page::new(RecordingClient::default());
    let frame = page.add_main_frame(
        CompositorSettings {
            force_compositing_mode: true,
            ..CompositorSettings::default()
        },
        Some(FrameView::new(VIEW)),
        Rect::from_origin_size(Point::ZERO, VIEW),
    );

    let outcome = page
        .update(frame, CompositingUpdateType::AfterLayoutOrStyleChange)
        .unwrap();

    assert!(outcome.layers_changed, "root backing created");
    let root = root_layer(&page, frame);
    assert!(is_composited(&page, frame, root), "root composited");
    assert!(page.compositor(frame).unwrap().in_compositing_mode(), "compositing forced on");
}

fn fixed_footer() -> LayerStyle {
    LayerStyle {
        position: Position::Fixed,
        fixed_to_custom_rect: true,
        insets: Insets {
            right: Length::Px(10.0),
            bottom: Length::Px(10.0),
            ..Insets::default()
        },
        ..LayerStyle::default()
    }
}

#[test]
fn fixed_layer_anchors_to_far_edges_across_scrolls() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let footer = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::PositiveZ,
        Rect::new(690.0, 540.0, 790.0, 590.0),
        fixed_footer(),
    );
    let mut presenter = RecordingPresenter::default();

    page.layer_style_changed(frame, footer);
    page.flush(Some(&mut presenter));
    assert!(page.compositor(frame).unwrap().is_fixed_position_layer(footer), "registered set");

    for i in 1..=10_u32 {
        page.with_context(frame, |c, ctx| {
            c.frame_view_did_scroll(ctx, Point::new(0.0, f64::from(i) * 10.0));
            c.update_compositing_layers(ctx, CompositingUpdateType::OnScroll, None);
        });
        page.flush(Some(&mut presenter));
    }

    let adds = page.client().fixed_adds();
    assert_eq!(adds.len(), 1, "scrolling leaves the anchoring unchanged: {adds:?}");
    let ClientCall::AddFixed { anchors, bounds, during_flush, .. } = &adds[0] else {
        unreachable!("filtered to fixed adds");
    };
    assert_eq!(*anchors, FixedPositionAnchors::RIGHT | FixedPositionAnchors::BOTTOM, "anchors");
    assert_eq!(*bounds, Rect::new(10.0, 10.0, 110.0, 60.0), "offset from the far edges");
    assert!(!during_flush, "reported outside the flush");
    assert_eq!(
        page.client().count(|c| matches!(c, ClientCall::RemoveFixed(_))),
        0,
        "never unregistered while composited"
    );
    assert_eq!(presenter.commits.len(), 11, "one commit per flush");
}

#[test]
fn fixed_layer_inside_fixed_composited_context_is_not_rootmost() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let outer = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::PositiveZ,
        Rect::new(0.0, 0.0, 200.0, 200.0),
        fixed_footer(),
    );
    page.tree_mut(frame).unwrap().set_stacking_context(outer, true);
    let inner = add_layer(
        &mut page,
        frame,
        outer,
        PaintOrderList::PositiveZ,
        Rect::new(10.0, 10.0, 50.0, 50.0),
        fixed_footer(),
    );

    page.layer_style_changed(frame, outer);
    page.layer_style_changed(frame, inner);

    let compositor = page.compositor(frame).unwrap();
    let tree = page.tree(frame).unwrap();
    assert!(compositor.is_rootmost_fixed_layer(tree, outer), "outer is rootmost");
    assert!(!compositor.is_rootmost_fixed_layer(tree, inner), "inner moves with outer");
    assert!(compositor.is_fixed_position_layer(outer), "outer registered");
    assert!(!compositor.is_fixed_position_layer(inner), "inner not registered");
}

#[test]
fn teardown_balances_registrations() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let footer = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::PositiveZ,
        Rect::new(690.0, 540.0, 790.0, 590.0),
        fixed_footer(),
    );
    let scroller = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 300.0, 200.0),
        LayerStyle {
            overflow_clip: true,
            accelerated_scrolling: Some(AcceleratedScrolling {
                node: ScrollingNodeId(7),
                content_size: Size::new(300.0, 900.0),
            }),
            ..LayerStyle::default()
        },
    );
    page.layer_style_changed(frame, footer);
    page.layer_style_changed(frame, scroller);
    page.flush(None);

    let client = page.client();
    assert!(page.compositor(frame).unwrap().is_scrolling_layer(scroller), "scroller registered");
    assert!(
        client.count(|c| matches!(c, ClientCall::AddScrolling(ScrollingNodeId(7), _))) >= 1,
        "scrolling pair reported"
    );

    page.teardown();

    let client = page.client();
    assert_eq!(client.count(|c| matches!(c, ClientCall::RemoveFixed(_))), 1, "fixed removed once");
    assert_eq!(
        client.count(|c| matches!(c, ClientCall::RemoveScrolling(ScrollingNodeId(7)))),
        1,
        "scrolling removed once"
    );
    assert_eq!(client.calls.last(), Some(&ClientCall::Attach(frame, None)), "root detached last");
    assert_eq!(page.graphics().layer_count(), 0, "every graphics layer destroyed");
    assert!(!page.compositor(frame).unwrap().in_compositing_mode(), "out of compositing");
}

#[test]
fn removing_a_subtree_drops_its_fixed_layers() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let container = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 400.0, 300.0),
        canvas(),
    );
    page.tree_mut(frame).unwrap().set_stacking_context(container, true);
    let footer = add_layer(
        &mut page,
        frame,
        container,
        PaintOrderList::PositiveZ,
        Rect::new(290.0, 240.0, 390.0, 290.0),
        fixed_footer(),
    );
    page.layer_style_changed(frame, container);
    page.flush(None);
    assert!(page.compositor(frame).unwrap().is_fixed_position_layer(footer), "footer registered");

    page.with_context(frame, |compositor, ctx| {
        compositor.layer_will_be_removed(ctx, root, container);
        for layer in [container, footer] {
            assert!(
                !compositor.is_fixed_position_layer(layer) || ctx.tree.is_composited(layer),
                "fixed layer {layer:?} left without a backing"
            );
        }
    });

    assert!(!is_composited(&page, frame, footer), "descendant backing destroyed");
    assert!(!page.compositor(frame).unwrap().is_fixed_position_layer(footer), "dropped from the set");
    let client = page.client();
    assert_eq!(client.fixed_adds().len(), 1, "registered once");
    assert_eq!(client.count(|c| matches!(c, ClientCall::RemoveFixed(_))), 1, "removal balances the add");
}

#[test]
fn scrolling_keeps_a_single_root_attachment() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let c = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        canvas(),
    );
    page.layer_style_changed(frame, c);
    let host = page.compositor(frame).unwrap().root_graphics_layer();

    for y in [120.0, 240.0] {
        page.with_context(frame, |compositor, ctx| {
            compositor.frame_view_did_scroll(ctx, Point::new(0.0, y));
            compositor.update_compositing_layers(ctx, CompositingUpdateType::OnScroll, None);
        });
        page.flush(None);
    }

    let compositor = page.compositor(frame).unwrap();
    assert_eq!(compositor.root_layer_attachment(), RootLayerAttachment::ViaChromeClient);
    assert_eq!(compositor.root_graphics_layer(), host, "same host layer");
    assert_eq!(page.client().attached_root(frame), host, "still attached to the client");
    assert_eq!(
        page.client().count(|c| matches!(c, ClientCall::Attach(f, _) if *f == frame)),
        1,
        "attached exactly once"
    );
}

#[test]
fn removed_layer_loses_backing_and_repaints_container() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let c = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        canvas(),
    );
    page.layer_style_changed(frame, c);
    let before = page.graphics().layer_count();

    page.with_context(frame, |compositor, ctx| {
        compositor.layer_will_be_removed(ctx, root, c);
        assert!(compositor.compositing_layers_need_rebuild(), "rebuild requested");
        assert!(compositor.needs_one_shot_drawing_synchronization(), "sync requested");
    });
    page.tree_mut(frame).unwrap().remove_from_parent(c);
    page.update(frame, CompositingUpdateType::AfterLayoutOrStyleChange);

    assert!(!is_composited(&page, frame, c), "backing destroyed");
    assert_eq!(page.graphics().layer_count(), before - 1, "primary layer gone");
    let root_backing = backing(&page, frame, root);
    assert!(children(&page, root_backing.parent_for_sublayers()).is_empty(), "no children left");
}

#[test]
fn iframe_composites_through_its_owner() {
    let (mut page, main) = page();
    let root = root_layer(&page, main);
    let owner = add_layer(
        &mut page,
        main,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(20.0, 20.0, 320.0, 170.0),
        LayerStyle::default(),
    );
    let sub = page.add_subframe(
        FrameOwner {
            parent_frame: main,
            kind: FrameOwnerKind::IFrame,
            renderer_is_part: true,
            layer: Some(owner),
        },
        CompositorSettings::default(),
        Some(FrameView::new(Size::new(300.0, 150.0))),
        Rect::new(0.0, 0.0, 300.0, 150.0),
        |_| {},
    );
    page.tree_mut(main).unwrap().update_style(owner, |s| {
        s.kind = RendererKind::Frame {
            frame: sub,
            content_box: Rect::new(0.0, 0.0, 300.0, 150.0),
            needs_layout: false,
        };
    });
    let sub_root = root_layer(&page, sub);
    let content = add_layer(
        &mut page,
        sub,
        sub_root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        canvas(),
    );

    page.layer_style_changed(sub, content);
    assert!(page.has_pending_updates(), "owner must be restyled");
    page.run_pending_updates();

    let inner = page.compositor(sub).unwrap();
    assert_eq!(inner.root_layer_attachment(), RootLayerAttachment::ViaEnclosingFrame);
    assert!(is_composited(&page, main, owner), "owner composited for the frame");
    let hosting = backing(&page, main, owner).parent_for_sublayers();
    let inner_root = inner.root_graphics_layer().unwrap();
    assert_eq!(page.graphics().parent(inner_root), Some(hosting), "grafted under the owner");
    assert_eq!(
        page.client().count(|c| matches!(c, ClientCall::Attach(f, _) if *f == sub)),
        0,
        "sub-frame never attached to the client"
    );
    let outer = page.compositor(main).unwrap();
    assert_eq!(outer.root_layer_attachment(), RootLayerAttachment::ViaChromeClient);
    assert_eq!(page.client().attached_root(main), outer.root_graphics_layer(), "main attached");
}

#[test]
fn independently_composited_frame_attaches_to_client() {
    let (mut page, main) = page();
    let root = root_layer(&page, main);
    let owner = add_layer(
        &mut page,
        main,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 300.0, 150.0),
        LayerStyle::default(),
    );
    let sub = page.add_subframe(
        FrameOwner {
            parent_frame: main,
            kind: FrameOwnerKind::IFrame,
            renderer_is_part: true,
            layer: Some(owner),
        },
        CompositorSettings::default(),
        None,
        Rect::new(0.0, 0.0, 300.0, 150.0),
        |env| env.allows_independently_composited_frames = true,
    );
    let sub_root = root_layer(&page, sub);
    let c = add_layer(
        &mut page,
        sub,
        sub_root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        canvas(),
    );

    page.layer_style_changed(sub, c);

    let inner = page.compositor(sub).unwrap();
    assert!(!inner.should_propagate_compositing_to_enclosing_frame(), "independent frame");
    assert_eq!(inner.root_layer_attachment(), RootLayerAttachment::ViaChromeClient);
    assert_eq!(page.client().attached_root(sub), inner.root_graphics_layer(), "attached to client");
}

#[test]
fn independent_frame_reports_its_fixed_layers() {
    let (mut page, main) = page();
    let root = root_layer(&page, main);
    let owner = add_layer(
        &mut page,
        main,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 300.0, 150.0),
        LayerStyle::default(),
    );
    let sub_view = Size::new(300.0, 150.0);
    let sub = page.add_subframe(
        FrameOwner {
            parent_frame: main,
            kind: FrameOwnerKind::IFrame,
            renderer_is_part: true,
            layer: Some(owner),
        },
        CompositorSettings::default(),
        Some(FrameView::new(sub_view)),
        Rect::from_origin_size(Point::ZERO, sub_view),
        |env| env.allows_independently_composited_frames = true,
    );
    let sub_root = root_layer(&page, sub);
    let footer = add_layer(
        &mut page,
        sub,
        sub_root,
        PaintOrderList::PositiveZ,
        Rect::new(190.0, 90.0, 290.0, 140.0),
        fixed_footer(),
    );
    let mut presenter = RecordingPresenter::default();

    page.layer_style_changed(sub, footer);
    page.flush(Some(&mut presenter));
    page.flush(Some(&mut presenter));

    assert_eq!(
        page.compositor(sub).unwrap().root_layer_attachment(),
        RootLayerAttachment::ViaChromeClient,
        "attached on its own"
    );
    let platform = page
        .graphics()
        .platform_layer(backing(&page, sub, footer).graphics_layer());
    let adds = page.client().fixed_adds();
    assert_eq!(adds.len(), 1, "reported once: {adds:?}");
    let ClientCall::AddFixed { layer, bounds, .. } = adds[0] else {
        unreachable!("filtered to fixed adds");
    };
    assert_eq!(layer, platform, "footer's primary layer");
    assert_eq!(bounds, Rect::new(10.0, 10.0, 110.0, 60.0), "laid out before reporting");

    // Moving the footer changes its anchoring.
    page.tree_mut(sub).unwrap().set_offset(footer, Vec2::new(170.0, 80.0));
    page.update(sub, CompositingUpdateType::AfterLayoutOrStyleChange);
    page.flush(Some(&mut presenter));

    let adds = page.client().fixed_adds();
    assert_eq!(adds.len(), 2, "one more report after the move: {adds:?}");
    let ClientCall::AddFixed { bounds, .. } = adds[1] else {
        unreachable!("filtered to fixed adds");
    };
    assert_eq!(bounds, Rect::new(30.0, 20.0, 130.0, 70.0), "new offset from the far edges");
}

#[test]
fn frame_scroll_layers_follow_the_view() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let c = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        canvas(),
    );
    page.layer_style_changed(frame, c);

    page.with_context(frame, |compositor, ctx| {
        compositor.frame_view_did_scroll(ctx, Point::new(0.0, 250.0));
    });

    let compositor = page.compositor(frame).unwrap();
    let scroll = compositor.scroll_layer().expect("frame scrolling layer");
    let clip = compositor.clip_layer().expect("frame clipping layer");
    assert_eq!(page.graphics().position(scroll), Point::new(0.0, -250.0), "scrolled contents");
    assert_eq!(page.graphics().size(clip), VIEW, "clip sized to the viewport");
    assert!(page.graphics().masks_to_bounds(clip), "clip masks");
}

#[test]
fn overlay_scrollbars_get_frame_layers() {
    let mut page = Page::new(RecordingClient::default());
    let view = FrameView {
        has_overlay_scrollbars: true,
        vertical_scrollbar: Some(Rect::new(790.0, 0.0, 800.0, 600.0)),
        ..FrameView::new(VIEW)
    };
    let frame = page.add_main_frame(
        CompositorSettings::default(),
        Some(view),
        Rect::from_origin_size(Point::ZERO, VIEW),
    );
    let root = root_layer(&page, frame);
    let c = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        canvas(),
    );

    page.layer_style_changed(frame, c);

    let compositor = page.compositor(frame).unwrap();
    let bar = compositor.layer_for_vertical_scrollbar().expect("vertical scrollbar layer");
    assert!(compositor.layer_for_horizontal_scrollbar().is_none(), "no horizontal bar");
    assert_eq!(page.graphics().position(bar), Point::new(790.0, 0.0), "bar positioned");
    assert_eq!(page.graphics().size(bar), Size::new(10.0, 600.0), "bar sized");
    assert!(page.graphics().draws_content(bar), "bar paints");

    page.teardown();
    let compositor = page.compositor(frame).unwrap();
    assert!(compositor.layer_for_vertical_scrollbar().is_none(), "bar destroyed");
    let mut damage = Vec::new();
    page.with_context(frame, |c, _| damage = c.take_window_damage());
    assert_eq!(damage, vec![Rect::new(790.0, 0.0, 800.0, 600.0)], "bar repainted into the window");
}

#[test]
fn transform_animation_turns_off_overlap_testing() {
    let (mut page, frame) = page();
    page.with_context(frame, |c, _| {
        c.did_start_accelerated_animation(AnimatedProperty::Opacity);
        assert!(c.compositing_consults_overlap(), "opacity keeps overlap");
        c.did_start_accelerated_animation(AnimatedProperty::Transform);
        assert!(!c.compositing_consults_overlap(), "transform disables overlap");
    });
}

#[test]
fn scheduled_updates_coalesce() {
    let (mut page, frame) = page();
    let mut run_loop = crate::scheduler::ManualRunLoop;
    page.with_context(frame, |c, ctx| {
        c.schedule_compositing_layer_update(&mut run_loop);
        c.schedule_compositing_layer_update(&mut run_loop);
        assert!(c.compositing_layer_update_pending(), "pending after schedule");
        c.update_compositing_layers_timer_fired(ctx);
        assert!(!c.compositing_layer_update_pending(), "cleared by the update");
    });
}

#[test]
fn has_3d_content_finds_nested_perspective() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let outer = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        LayerStyle::default(),
    );
    let compositor = page.compositor(frame).unwrap();
    assert!(!compositor.has_3d_content(page.tree(frame).unwrap()), "flat document");

    add_layer(
        &mut page,
        frame,
        outer,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 10.0, 10.0),
        LayerStyle {
            has_perspective: true,
            ..LayerStyle::default()
        },
    );
    let compositor = page.compositor(frame).unwrap();
    assert!(compositor.has_3d_content(page.tree(frame).unwrap()), "nested perspective");
}

#[test]
#[should_panic(expected = "flush_pending_layer_changes is not re-entrant")]
fn reentrant_flush_panics() {
    let (mut page, frame) = page();
    let root = root_layer(&page, frame);
    let c = add_layer(
        &mut page,
        frame,
        root,
        PaintOrderList::NormalFlow,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        canvas(),
    );
    page.layer_style_changed(frame, c);
    page.with_context(frame, |compositor, ctx| {
        compositor.flushing_layers = true;
        compositor.flush_pending_layer_changes(ctx, None, true);
    });
}
