// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Graphics-layer tree dumps.
//!
//! [`write_layer_tree`] prints one line per layer, indented by depth.
//! [`layer_tree_json`] returns the same subtree as nested JSON objects.

use std::fmt::{self, Write};

use serde_json::{Value, json};

use lamina_core::graphics::GraphicsLayerStore;
use lamina_core::id::GraphicsLayerId;
use lamina_core::transform::Transform3d;

/// Writes the subtree rooted at `root`, one layer per line.
///
/// Properties at their default value are omitted.
pub fn write_layer_tree(
    store: &GraphicsLayerStore,
    root: GraphicsLayerId,
    out: &mut dyn Write,
) -> fmt::Result {
    let mut result = Ok(());
    store.walk(root, &mut |id, depth| {
        if result.is_ok() {
            result = write_layer(store, id, depth, &mut *out);
        }
    });
    result
}

/// Renders the subtree rooted at `root` as a string.
#[must_use]
pub fn layer_tree_to_string(store: &GraphicsLayerStore, root: GraphicsLayerId) -> String {
    let mut out = String::new();
    // Writing to a `String` cannot fail.
    _ = write_layer_tree(store, root, &mut out);
    out
}

fn write_layer(
    store: &GraphicsLayerStore,
    id: GraphicsLayerId,
    depth: usize,
    out: &mut dyn Write,
) -> fmt::Result {
    let indent = depth * 2;
    let position = store.position(id);
    let size = store.size(id);
    write!(
        out,
        "{:indent$}{} {:?} at ({}, {}) size {}x{}",
        "",
        store.name(id),
        store.platform_layer(id),
        position.x,
        position.y,
        size.width,
        size.height,
    )?;
    let opacity = store.opacity(id);
    if opacity < 1.0 {
        write!(out, " opacity {opacity}")?;
    }
    if store.transform(id) != Transform3d::IDENTITY {
        out.write_str(" transformed")?;
    }
    if store.masks_to_bounds(id) {
        out.write_str(" masks")?;
    }
    if store.draws_content(id) {
        out.write_str(" draws")?;
    }
    if let Some(replica) = store.replica(id) {
        write!(out, " replica {:?}", store.platform_layer(replica))?;
    }
    out.write_char('\n')
}

/// Returns the subtree rooted at `root` as nested JSON objects.
#[must_use]
pub fn layer_tree_json(store: &GraphicsLayerStore, root: GraphicsLayerId) -> Value {
    let position = store.position(root);
    let size = store.size(root);
    let children: Vec<Value> = store
        .children(root)
        .map(|child| layer_tree_json(store, child))
        .collect();
    json!({
        "name": store.name(root),
        "platform_layer": store.platform_layer(root).0,
        "position": [position.x, position.y],
        "size": [size.width, size.height],
        "opacity": store.opacity(root),
        "transformed": store.transform(root) != Transform3d::IDENTITY,
        "masks_to_bounds": store.masks_to_bounds(root),
        "draws_content": store.draws_content(root),
        "replica": store.replica(root).map(|r| store.platform_layer(r).0),
        "children": children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Point, Size};

    fn sample() -> (GraphicsLayerStore, GraphicsLayerId) {
        let mut store = GraphicsLayerStore::new();
        let root = store.create_layer("root");
        store.set_size(root, Size::new(800.0, 600.0));
        store.set_masks_to_bounds(root, true);
        let child = store.create_layer("child");
        store.set_position(child, Point::new(10.0, 20.0));
        store.set_size(child, Size::new(100.0, 50.0));
        store.set_opacity(child, 0.5);
        store.set_draws_content(child, true);
        store.add_child(root, child);
        (store, root)
    }

    #[test]
    fn text_dump_indents_children() {
        let (store, root) = sample();
        let text = layer_tree_to_string(&store, root);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "root PlatformLayerId(1) at (0, 0) size 800x600 masks",
                "  child PlatformLayerId(2) at (10, 20) size 100x50 opacity 0.5 draws",
            ],
            "unexpected dump:\n{text}"
        );
    }

    #[test]
    fn json_dump_nests_children() {
        let (store, root) = sample();
        let value = layer_tree_json(&store, root);
        assert_eq!(value["name"], "root", "root first");
        assert_eq!(value["masks_to_bounds"], true, "root clips");
        let children = value["children"].as_array().unwrap();
        assert_eq!(children.len(), 1, "one child");
        assert_eq!(children[0]["position"], json!([10.0, 20.0]), "child position");
        assert_eq!(children[0]["draws_content"], true, "child paints");
        assert!(children[0]["replica"].is_null(), "no replica");
    }
}
