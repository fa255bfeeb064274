use crate::config::{CompactConfig, NodeConfig};
use crate::hierarchy::{Hierarchy, NodeId};
use crate::ir::Record;
use crate::state::NodeKind;
use serde_json::Value;
use std::fmt;

static NULL_DATA: Value = Value::Null;

/// Read-only view of a node handed to every callback.
#[derive(Debug, Clone, Copy)]
pub struct NodeInfo<'a> {
    pub id: &'a str,
    pub data: &'a Value,
    pub depth: u32,
    pub direct_subordinates: usize,
    pub total_subordinates: usize,
    pub kind: NodeKind,
}

impl<'a> NodeInfo<'a> {
    pub fn of(hierarchy: &'a Hierarchy, records: &'a [Record], id: NodeId) -> Self {
        let node = hierarchy.get(id);
        let data = node
            .record
            .and_then(|pos| records.get(pos))
            .map(|record| &record.data)
            .unwrap_or(&NULL_DATA);
        Self {
            id: &node.id,
            data,
            depth: node.depth,
            direct_subordinates: node.direct_subordinates,
            total_subordinates: node.total_subordinates,
            kind: NodeKind::Record,
        }
    }
}

pub type NodeMetric = Box<dyn Fn(&NodeInfo<'_>) -> f32>;
pub type PairMetric = Box<dyn Fn(&NodeInfo<'_>, &NodeInfo<'_>) -> f32>;
pub type NodePredicate = Box<dyn Fn(&NodeInfo<'_>) -> bool>;
pub type PairPredicate = Box<dyn Fn(&NodeInfo<'_>, &NodeInfo<'_>) -> bool>;

/// Per-node overrides. Unset slots fall back to [`NodeConfig`] and
/// [`CompactConfig`] values.
#[derive(Default)]
pub struct ChartCallbacks {
    pub node_width: Option<NodeMetric>,
    pub node_height: Option<NodeMetric>,
    pub siblings_margin: Option<NodeMetric>,
    pub children_margin: Option<NodeMetric>,
    pub neighbour_margin: Option<PairMetric>,
    pub compact_margin_pair: Option<NodeMetric>,
    pub compact_margin_between: Option<NodeMetric>,
    pub compact_collapsed_width: Option<NodeMetric>,
    pub compact_collapsed_height: Option<NodeMetric>,
    pub is_node_button_visible: Option<NodePredicate>,
    pub is_node_draggable: Option<NodePredicate>,
    /// Called with the dragged node first, then the drop target.
    pub is_node_droppable: Option<PairPredicate>,
}

impl ChartCallbacks {
    pub fn with_node_width(mut self, f: impl Fn(&NodeInfo<'_>) -> f32 + 'static) -> Self {
        self.node_width = Some(Box::new(f));
        self
    }

    pub fn with_node_height(mut self, f: impl Fn(&NodeInfo<'_>) -> f32 + 'static) -> Self {
        self.node_height = Some(Box::new(f));
        self
    }

    pub fn with_siblings_margin(mut self, f: impl Fn(&NodeInfo<'_>) -> f32 + 'static) -> Self {
        self.siblings_margin = Some(Box::new(f));
        self
    }

    pub fn with_children_margin(mut self, f: impl Fn(&NodeInfo<'_>) -> f32 + 'static) -> Self {
        self.children_margin = Some(Box::new(f));
        self
    }

    pub fn with_neighbour_margin(
        mut self,
        f: impl Fn(&NodeInfo<'_>, &NodeInfo<'_>) -> f32 + 'static,
    ) -> Self {
        self.neighbour_margin = Some(Box::new(f));
        self
    }

    pub fn with_compact_margin_pair(mut self, f: impl Fn(&NodeInfo<'_>) -> f32 + 'static) -> Self {
        self.compact_margin_pair = Some(Box::new(f));
        self
    }

    pub fn with_compact_margin_between(
        mut self,
        f: impl Fn(&NodeInfo<'_>) -> f32 + 'static,
    ) -> Self {
        self.compact_margin_between = Some(Box::new(f));
        self
    }

    pub fn with_compact_collapsed_size(
        mut self,
        width: impl Fn(&NodeInfo<'_>) -> f32 + 'static,
        height: impl Fn(&NodeInfo<'_>) -> f32 + 'static,
    ) -> Self {
        self.compact_collapsed_width = Some(Box::new(width));
        self.compact_collapsed_height = Some(Box::new(height));
        self
    }

    pub fn with_button_visible(mut self, f: impl Fn(&NodeInfo<'_>) -> bool + 'static) -> Self {
        self.is_node_button_visible = Some(Box::new(f));
        self
    }

    pub fn with_draggable(mut self, f: impl Fn(&NodeInfo<'_>) -> bool + 'static) -> Self {
        self.is_node_draggable = Some(Box::new(f));
        self
    }

    pub fn with_droppable(
        mut self,
        f: impl Fn(&NodeInfo<'_>, &NodeInfo<'_>) -> bool + 'static,
    ) -> Self {
        self.is_node_droppable = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for ChartCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartCallbacks")
            .field("node_width", &self.node_width.is_some())
            .field("node_height", &self.node_height.is_some())
            .field("siblings_margin", &self.siblings_margin.is_some())
            .field("children_margin", &self.children_margin.is_some())
            .field("neighbour_margin", &self.neighbour_margin.is_some())
            .field("compact_margin_pair", &self.compact_margin_pair.is_some())
            .field("compact_margin_between", &self.compact_margin_between.is_some())
            .field("compact_collapsed_width", &self.compact_collapsed_width.is_some())
            .field("compact_collapsed_height", &self.compact_collapsed_height.is_some())
            .field("is_node_button_visible", &self.is_node_button_visible.is_some())
            .field("is_node_draggable", &self.is_node_draggable.is_some())
            .field("is_node_droppable", &self.is_node_droppable.is_some())
            .finish()
    }
}

/// Resolves every metric for a node: callback when set, config otherwise.
/// Non-finite callback results read as 0.
#[derive(Clone, Copy)]
pub struct Metrics<'a> {
    callbacks: &'a ChartCallbacks,
    node: &'a NodeConfig,
    compact: &'a CompactConfig,
}

impl<'a> Metrics<'a> {
    pub fn new(callbacks: &'a ChartCallbacks, node: &'a NodeConfig, compact: &'a CompactConfig) -> Self {
        Self {
            callbacks,
            node,
            compact,
        }
    }

    pub fn node_width(&self, info: &NodeInfo<'_>) -> f32 {
        if info.kind == NodeKind::GroupToggle {
            if let Some(f) = &self.callbacks.compact_collapsed_width {
                return finite(f(info));
            }
        }
        resolve(&self.callbacks.node_width, info, self.node.width)
    }

    pub fn node_height(&self, info: &NodeInfo<'_>) -> f32 {
        if info.kind == NodeKind::GroupToggle {
            if let Some(f) = &self.callbacks.compact_collapsed_height {
                return finite(f(info));
            }
        }
        resolve(&self.callbacks.node_height, info, self.node.height)
    }

    pub fn siblings_margin(&self, info: &NodeInfo<'_>) -> f32 {
        resolve(&self.callbacks.siblings_margin, info, self.node.siblings_margin)
    }

    pub fn children_margin(&self, info: &NodeInfo<'_>) -> f32 {
        resolve(&self.callbacks.children_margin, info, self.node.children_margin)
    }

    pub fn neighbour_margin(&self, a: &NodeInfo<'_>, b: &NodeInfo<'_>) -> f32 {
        match &self.callbacks.neighbour_margin {
            Some(f) => finite(f(a, b)),
            None => self.node.neighbour_margin,
        }
    }

    pub fn compact_margin_pair(&self, info: &NodeInfo<'_>) -> f32 {
        resolve(&self.callbacks.compact_margin_pair, info, self.compact.margin_pair)
    }

    pub fn compact_margin_between(&self, info: &NodeInfo<'_>) -> f32 {
        resolve(
            &self.callbacks.compact_margin_between,
            info,
            self.compact.margin_between,
        )
    }

    pub fn group_padding(&self) -> f32 {
        self.compact.no_children_margin
    }

    pub fn toggle_button_margin(&self) -> f32 {
        self.compact.toggle_button_margin
    }

    pub fn recenter_threshold(&self) -> f32 {
        self.compact.recenter_threshold
    }

    /// Defaults to "has at least one direct subordinate".
    pub fn button_visible(&self, info: &NodeInfo<'_>) -> bool {
        match &self.callbacks.is_node_button_visible {
            Some(f) => f(info),
            None => info.direct_subordinates > 0,
        }
    }

    /// The root never moves; everything else may by default.
    pub fn draggable(&self, info: &NodeInfo<'_>) -> bool {
        info.depth > 0
            && self
                .callbacks
                .is_node_draggable
                .as_ref()
                .is_none_or(|f| f(info))
    }

    pub fn droppable(&self, dragged: &NodeInfo<'_>, target: &NodeInfo<'_>) -> bool {
        self.callbacks
            .is_node_droppable
            .as_ref()
            .is_none_or(|f| f(dragged, target))
    }
}

fn resolve(slot: &Option<NodeMetric>, info: &NodeInfo<'_>, fallback: f32) -> f32 {
    match slot {
        Some(f) => finite(f(info)),
        None => fallback,
    }
}

fn finite(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}
