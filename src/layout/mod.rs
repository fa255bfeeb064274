pub mod bounds;
pub mod compact;
pub mod flextree;
pub mod orientation;
pub mod paths;
pub(crate) mod types;
pub use bounds::*;
pub use orientation::{LayoutBinding, binding};
pub use types::*;

use crate::callbacks::{ChartCallbacks, Metrics, NodeInfo};
use crate::config::ChartConfig;
use crate::hierarchy::Hierarchy;
use crate::ir::{Connection, Orientation, Record};
use crate::state::{NodeKind, ViewStateTable, VisibleTree};
use compact::{CompactInfo, MemberSize};
use flextree::FlexTree;
use std::collections::HashMap;

/// Inputs of one layout pass.
pub struct LayoutContext<'a> {
    pub hierarchy: &'a Hierarchy,
    pub records: &'a [Record],
    pub states: &'a ViewStateTable,
    pub connections: &'a [Connection],
    pub config: &'a ChartConfig,
    pub callbacks: &'a ChartCallbacks,
    /// Screen positions from the previous pass, keyed by node id.
    pub previous: &'a HashMap<String, (f32, f32)>,
    /// Current zoom, carried into the root placement.
    pub scale: f32,
}

pub fn compute_layout(ctx: &LayoutContext<'_>) -> ChartLayout {
    let config = ctx.config;
    let binding = binding(config.layout.orientation);
    let metrics = Metrics::new(ctx.callbacks, &config.node, &config.compact);
    let compact_on = config.compact.enabled;
    let group_mode = compact_on && config.compact.no_children;

    let tree = VisibleTree::build(ctx.hierarchy, ctx.records, ctx.states, &metrics, group_mode);
    tracing::debug!(
        visible = tree.len(),
        total = ctx.hierarchy.len(),
        orientation = config.layout.orientation.as_str(),
        "laying out visible tree"
    );

    let infos: Vec<NodeInfo<'_>> = tree
        .nodes()
        .iter()
        .map(|node| node.info(ctx.hierarchy, ctx.records))
        .collect();
    let widths: Vec<f32> = infos.iter().map(|info| metrics.node_width(info)).collect();
    let heights: Vec<f32> = infos.iter().map(|info| metrics.node_height(info)).collect();
    let sizes: Vec<MemberSize> = infos
        .iter()
        .enumerate()
        .map(|(i, info)| MemberSize {
            column: binding.compact_column(widths[i], heights[i]),
            row: binding.compact_row(widths[i], heights[i]),
            pair: metrics.compact_margin_pair(info),
            between: metrics.compact_margin_between(info),
        })
        .collect();

    let compact = if compact_on {
        compact::compute_dimensions(&tree, &sizes, group_mode, metrics.group_padding())
    } else {
        CompactInfo::default()
    };
    if !compact.clusters.is_empty() {
        tracing::debug!(clusters = compact.clusters.len(), "compact clusters");
    }

    let mut flex = FlexTree::with_capacity(tree.len());
    for (i, node) in tree.nodes().iter().enumerate() {
        let size = compact.flex_size(i).unwrap_or_else(|| {
            binding.flex_size(
                widths[i],
                heights[i],
                metrics.siblings_margin(&infos[i]),
                metrics.children_margin(&infos[i]),
            )
        });
        flex.add(node.parent, size);
    }
    flex.layout(|a, b| {
        if tree.get(a).parent == tree.get(b).parent {
            0.0
        } else {
            metrics.neighbour_margin(&infos[a], &infos[b])
        }
    });

    let (mut xs, mut ys): (Vec<f32>, Vec<f32>) = (0..tree.len()).map(|i| flex.position(i)).unzip();
    if compact_on {
        compact::apply_positions(&compact, &sizes, &mut xs, &mut ys, metrics.recenter_threshold());
    }
    let screen: Vec<(f32, f32)> = xs
        .iter()
        .zip(&ys)
        .map(|(&x, &y)| binding.swap(x, y))
        .collect();
    let boxes: Vec<NodeBox> = (0..tree.len())
        .map(|i| NodeBox {
            x: screen[i].0,
            y: screen[i].1,
            width: widths[i],
            height: heights[i],
        })
        .collect();

    let nodes = build_nodes(ctx, &tree, &infos, &boxes, &compact, &metrics, &binding);
    let links = build_links(ctx, &tree, &boxes, &compact, &sizes, &binding, group_mode);
    let connections = build_connections(ctx.connections, &tree, &boxes, &binding);
    let group_boxes = compact::group_box_rects(&compact, &xs, &ys, metrics.group_padding())
        .into_iter()
        .map(|(parent, [left, top, w, h])| {
            let (ax, ay) = binding.swap(left, top);
            let (bx, by) = binding.swap(left + w, top + h);
            CompactGroupBox {
                parent: tree.get(parent).id.clone(),
                x: ax.min(bx),
                y: ay.min(by),
                width: (bx - ax).abs(),
                height: (by - ay).abs(),
                toggle_button: binding.swap(left + w + metrics.toggle_button_margin(), top),
            }
        })
        .collect();

    let bounds = compute_bounds(&nodes, &binding).unwrap_or(Bounds {
        min_x: 0.0,
        max_x: 0.0,
        min_y: 0.0,
        max_y: 0.0,
    });
    let root_transform = binding.center_transform(
        config.viewport.width,
        config.viewport.height,
        config.layout.root_margin,
        ctx.scale,
    );

    ChartLayout {
        orientation: config.layout.orientation,
        nodes,
        links,
        connections,
        group_boxes,
        bounds,
        root_transform,
        focus: None,
    }
}

fn build_nodes(
    ctx: &LayoutContext<'_>,
    tree: &VisibleTree,
    infos: &[NodeInfo<'_>],
    boxes: &[NodeBox],
    compact: &CompactInfo,
    metrics: &Metrics<'_>,
    binding: &LayoutBinding,
) -> Vec<NodeLayout> {
    tree.nodes()
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let info = &infos[i];
            let state = ctx.states.get(&node.id);
            let (x0, y0) = previous_position(ctx.previous, tree, i);
            let record = node.kind == NodeKind::Record;
            let button = record && metrics.button_visible(info);
            NodeLayout {
                id: node.id.clone(),
                kind: node.kind,
                parent: node.parent.map(|p| tree.get(p).id.clone()),
                depth: node.depth,
                x: boxes[i].x,
                y: boxes[i].y,
                width: boxes[i].width,
                height: boxes[i].height,
                x0,
                y0,
                direct_subordinates: info.direct_subordinates,
                total_subordinates: info.total_subordinates,
                visibility: node.visibility,
                button,
                button_at: button.then(|| binding.button_at(&boxes[i])),
                highlighted: record && state.highlighted,
                highlighted_to_root: record && state.highlighted_to_root,
                first_in_open_group: node.first_in_open_group,
                compact: compact.slot(i).copied(),
            }
        })
        .collect()
}

/// Previous position of the node, else of its nearest ancestor that had one.
fn previous_position(
    previous: &HashMap<String, (f32, f32)>,
    tree: &VisibleTree,
    index: usize,
) -> (f32, f32) {
    let mut cursor = Some(index);
    while let Some(i) = cursor {
        let node = tree.get(i);
        if let Some(&pos) = previous.get(&node.id) {
            return pos;
        }
        cursor = node.parent;
    }
    (0.0, 0.0)
}

fn build_links(
    ctx: &LayoutContext<'_>,
    tree: &VisibleTree,
    boxes: &[NodeBox],
    compact: &CompactInfo,
    sizes: &[MemberSize],
    binding: &LayoutBinding,
    group_mode: bool,
) -> Vec<LinkLayout> {
    let sy = ctx.config.layout.link_y_offset;
    let mut links = Vec::with_capacity(tree.len().saturating_sub(1));
    for (i, node) in tree.nodes().iter().enumerate() {
        let Some(parent) = node.parent else {
            continue;
        };
        let source = binding.link_parent(&boxes[parent]);
        // Group boxes keep plain edges; pair grids fan out from a mid line.
        let grid = if group_mode {
            None
        } else {
            compact.slot(i).zip(compact.anchor_of(parent))
        };
        let (target, mid) = match grid {
            Some((slot, cluster)) => {
                let anchor = &boxes[cluster.members[0]];
                let mid = binding.compact_link_mid(anchor, cluster.dims[0], sizes[i].pair);
                (binding.link_compact_start(&boxes[i], slot.even), Some(mid))
            }
            None => (binding.link_point(&boxes[i]), None),
        };
        let start = mid.unwrap_or(target);
        let path = binding.edge_path(start, source, mid.map(|_| target), sy);
        links.push(LinkLayout {
            from: tree.get(parent).id.clone(),
            to: node.id.clone(),
            source,
            target,
            mid,
            path,
            highlighted: ctx.states.get(&node.id).highlighted_to_root,
        });
    }
    links
}

fn build_connections(
    connections: &[Connection],
    tree: &VisibleTree,
    boxes: &[NodeBox],
    binding: &LayoutBinding,
) -> Vec<ConnectionLayout> {
    connections
        .iter()
        .filter_map(|conn| {
            let (Some(from), Some(to)) = (tree.index_of(&conn.from), tree.index_of(&conn.to)) else {
                tracing::trace!(from = %conn.from, to = %conn.to, "connection endpoint hidden");
                return None;
            };
            let source = binding.link_point(&boxes[from]);
            let target = binding.link_join(&boxes[to]);
            Some(ConnectionLayout {
                from: conn.from.clone(),
                to: conn.to.clone(),
                label: conn.label.clone(),
                source,
                target,
                path: paths::link_horizontal(source, target),
            })
        })
        .collect()
}
