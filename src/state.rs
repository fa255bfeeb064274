use crate::callbacks::{Metrics, NodeInfo};
use crate::hierarchy::{Hierarchy, NodeId};
use crate::ir::{
    Record, SEED_CENTERED, SEED_COMPACT_EXPANDED, SEED_EXPANDED, SEED_HIGHLIGHTED,
};
use serde::Serialize;
use std::collections::HashMap;

/// Suffix of the synthetic node that stands in for a closed compact group.
pub const GROUP_TOGGLE_SUFFIX: &str = "::group-toggle";

pub fn group_toggle_id(parent: &str) -> String {
    format!("{parent}{GROUP_TOGGLE_SUFFIX}")
}

/// Parent id of a group-toggle placeholder id.
pub fn group_toggle_parent(id: &str) -> Option<&str> {
    id.strip_suffix(GROUP_TOGGLE_SUFFIX)
}

/// Engine-owned flags for one node. Never written back into records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub expanded: bool,
    pub compact_expanded: bool,
    pub centered: bool,
    pub centered_with_descendants: bool,
    pub highlighted: bool,
    pub highlighted_to_root: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeVisibility {
    ExpandedFull,
    ExpandedCompactCollapsed,
    ExpandedCompactOpen,
    Collapsed,
}

impl NodeVisibility {
    pub fn shows_children(self) -> bool {
        !matches!(self, Self::Collapsed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Record,
    GroupToggle,
}

#[derive(Debug, Clone, Default)]
pub struct ViewStateTable {
    states: HashMap<String, ViewState>,
    built: bool,
}

impl ViewStateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> ViewState {
        self.states.get(id).copied().unwrap_or_default()
    }

    pub fn get_mut(&mut self, id: &str) -> &mut ViewState {
        self.states.entry(id.to_string()).or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ViewState)> {
        self.states.iter().map(|(id, state)| (id.as_str(), state))
    }

    /// Reconciles the table with a freshly built hierarchy.
    ///
    /// Ids seen for the first time are seeded from their record payload; on
    /// the very first build nodes shallower than `expand_level` also open.
    /// Every expanded node then opens its whole ancestor chain.
    pub fn sync(&mut self, hierarchy: &Hierarchy, records: &[Record], expand_level: u32) {
        self.states.retain(|id, _| hierarchy.contains(id));
        let first_build = !self.built;

        for node in hierarchy.nodes() {
            if self.states.contains_key(&node.id) {
                continue;
            }
            let mut state = ViewState::default();
            if let Some(record) = node.record.and_then(|pos| records.get(pos)) {
                state.centered = record.flag(SEED_CENTERED).unwrap_or(false);
                state.expanded = record.flag(SEED_EXPANDED).unwrap_or(false) || state.centered;
                state.highlighted = record.flag(SEED_HIGHLIGHTED).unwrap_or(false);
                state.compact_expanded = record.flag(SEED_COMPACT_EXPANDED).unwrap_or(false);
            }
            if first_build && node.depth < expand_level && !node.children.is_empty() {
                state.expanded = true;
            }
            self.states.insert(node.id.clone(), state);
        }

        let opened: Vec<NodeId> = hierarchy
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, node)| self.get(&node.id).expanded)
            .map(|(i, _)| NodeId(i as u32))
            .collect();
        for id in opened {
            self.reveal(hierarchy, id);
        }
        self.built = true;
    }

    /// Opens strict ancestors so the node becomes reachable. Stops at the
    /// first one already open: an open node's chain is open up to the root.
    pub fn reveal(&mut self, hierarchy: &Hierarchy, id: NodeId) {
        let mut cursor = hierarchy.parent(id);
        while let Some(parent) = cursor {
            let key = hierarchy.get(parent).id.as_str();
            if self.get(key).expanded {
                break;
            }
            self.get_mut(key).expanded = true;
            cursor = hierarchy.parent(parent);
        }
    }

    pub fn set_expanded(&mut self, hierarchy: &Hierarchy, id: NodeId, flag: bool) {
        self.get_mut(&hierarchy.get(id).id).expanded = flag;
        if flag {
            self.reveal(hierarchy, id);
        }
    }

    /// Closes the node and everything under it, compact groups included.
    pub fn collapse_subtree(&mut self, hierarchy: &Hierarchy, id: NodeId) {
        for node in hierarchy.descendants(id) {
            let state = self.get_mut(&hierarchy.get(node).id);
            state.expanded = false;
            state.compact_expanded = false;
        }
    }

    /// Expand-button click. Returns true when the node ends up expanded.
    pub fn toggle(&mut self, hierarchy: &Hierarchy, id: NodeId) -> bool {
        if self.get(&hierarchy.get(id).id).expanded {
            self.collapse_subtree(hierarchy, id);
            false
        } else {
            self.set_expanded(hierarchy, id, true);
            true
        }
    }

    pub fn set_compact_expanded(&mut self, hierarchy: &Hierarchy, id: NodeId, flag: bool) {
        let state = self.get_mut(&hierarchy.get(id).id);
        state.compact_expanded = flag;
        if flag {
            state.expanded = true;
            self.reveal(hierarchy, id);
        }
    }

    pub fn expand_all(&mut self, hierarchy: &Hierarchy) {
        for node in hierarchy.nodes() {
            self.get_mut(&node.id).expanded = true;
        }
    }

    /// Closes every node; the root stays open when `keep_root_open` is set.
    pub fn collapse_all(&mut self, hierarchy: &Hierarchy, keep_root_open: bool) {
        for node in hierarchy.nodes() {
            let state = self.get_mut(&node.id);
            state.expanded = false;
            state.compact_expanded = false;
        }
        if keep_root_open {
            self.get_mut(&hierarchy.get(hierarchy.root()).id).expanded = true;
        }
    }

    pub fn set_up_to_root_highlighted(&mut self, hierarchy: &Hierarchy, id: NodeId) {
        for node in hierarchy.ancestors(id) {
            self.get_mut(&hierarchy.get(node).id).highlighted_to_root = true;
        }
        self.reveal(hierarchy, id);
    }

    pub fn clear_highlighting(&mut self) {
        for state in self.states.values_mut() {
            state.highlighted = false;
            state.highlighted_to_root = false;
        }
    }

    /// First node flagged for centering, in hierarchy order.
    pub fn first_centered(&self, hierarchy: &Hierarchy) -> Option<NodeId> {
        hierarchy
            .nodes()
            .iter()
            .position(|node| self.get(&node.id).centered)
            .map(|i| NodeId(i as u32))
    }

    pub fn clear_centered(&mut self) {
        for state in self.states.values_mut() {
            state.centered = false;
            state.centered_with_descendants = false;
        }
    }

    pub fn visibility(&self, id: &str, direct_children: usize, grouped: bool) -> NodeVisibility {
        let state = self.get(id);
        if !state.expanded {
            NodeVisibility::Collapsed
        } else if grouped && direct_children >= 2 {
            if state.compact_expanded {
                NodeVisibility::ExpandedCompactOpen
            } else {
                NodeVisibility::ExpandedCompactCollapsed
            }
        } else {
            NodeVisibility::ExpandedFull
        }
    }
}

/// A node qualifies for group-box packing when it has children and none of
/// them shows an expand button.
pub fn qualifies_for_group(
    hierarchy: &Hierarchy,
    records: &[Record],
    metrics: &Metrics<'_>,
    id: NodeId,
) -> bool {
    let children = hierarchy.children(id);
    !children.is_empty()
        && children
            .iter()
            .all(|&child| !metrics.button_visible(&NodeInfo::of(hierarchy, records, child)))
}

#[derive(Debug, Clone)]
pub struct VisibleNode {
    pub id: String,
    pub kind: NodeKind,
    /// Hierarchy node; for a group toggle, the group's parent.
    pub source: NodeId,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub depth: u32,
    pub visibility: NodeVisibility,
    pub group_eligible: bool,
    pub first_in_open_group: bool,
}

impl VisibleNode {
    /// NodeInfo for callbacks; group toggles report their parent's payload.
    pub fn info<'a>(&'a self, hierarchy: &'a Hierarchy, records: &'a [Record]) -> NodeInfo<'a> {
        let mut info = NodeInfo::of(hierarchy, records, self.source);
        if self.kind == NodeKind::GroupToggle {
            info.id = &self.id;
            info.depth = self.depth;
            info.kind = NodeKind::GroupToggle;
        }
        info
    }
}

/// The subset of the hierarchy currently on screen, in breadth-first order.
#[derive(Debug, Clone)]
pub struct VisibleTree {
    nodes: Vec<VisibleNode>,
    index: HashMap<String, usize>,
}

impl VisibleTree {
    pub fn build(
        hierarchy: &Hierarchy,
        records: &[Record],
        states: &ViewStateTable,
        metrics: &Metrics<'_>,
        group_mode: bool,
    ) -> Self {
        let root = hierarchy.root();
        let mut nodes = vec![VisibleNode {
            id: hierarchy.get(root).id.clone(),
            kind: NodeKind::Record,
            source: root,
            parent: None,
            children: Vec::new(),
            depth: 0,
            visibility: NodeVisibility::Collapsed,
            group_eligible: false,
            first_in_open_group: false,
        }];

        let mut cursor = 0;
        while cursor < nodes.len() {
            if nodes[cursor].kind == NodeKind::GroupToggle {
                cursor += 1;
                continue;
            }
            let source = nodes[cursor].source;
            let node = hierarchy.get(source);
            let eligible = group_mode && qualifies_for_group(hierarchy, records, metrics, source);
            let visibility = states.visibility(&node.id, node.children.len(), eligible);
            nodes[cursor].group_eligible = eligible;
            nodes[cursor].visibility = visibility;

            let depth = node.depth + 1;
            let mut added = Vec::new();
            match visibility {
                NodeVisibility::Collapsed => {}
                NodeVisibility::ExpandedCompactCollapsed => {
                    added.push(VisibleNode {
                        id: group_toggle_id(&node.id),
                        kind: NodeKind::GroupToggle,
                        source,
                        parent: Some(cursor),
                        children: Vec::new(),
                        depth,
                        visibility: NodeVisibility::Collapsed,
                        group_eligible: false,
                        first_in_open_group: false,
                    });
                }
                NodeVisibility::ExpandedFull | NodeVisibility::ExpandedCompactOpen => {
                    for (i, &child) in node.children.iter().enumerate() {
                        added.push(VisibleNode {
                            id: hierarchy.get(child).id.clone(),
                            kind: NodeKind::Record,
                            source: child,
                            parent: Some(cursor),
                            children: Vec::new(),
                            depth,
                            visibility: NodeVisibility::Collapsed,
                            group_eligible: false,
                            first_in_open_group: i == 0
                                && visibility == NodeVisibility::ExpandedCompactOpen,
                        });
                    }
                }
            }
            for child in added {
                let slot = nodes.len();
                nodes[cursor].children.push(slot);
                nodes.push(child);
            }
            cursor += 1;
        }

        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.clone(), i))
            .collect();
        Self { nodes, index }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[VisibleNode] {
        &self.nodes
    }

    pub fn get(&self, index: usize) -> &VisibleNode {
        &self.nodes[index]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

}
