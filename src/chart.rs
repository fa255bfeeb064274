use crate::callbacks::{ChartCallbacks, Metrics, NodeInfo};
use crate::config::ChartConfig;
use crate::error::{ChartError, Result};
use crate::hierarchy::{Hierarchy, NodeId};
use crate::ir::{Connection, Orientation, Record};
use crate::layout::{
    self, ChartLayout, FitOptions, LayoutContext, NodeLayout, Viewport, ViewportTransform,
    compute_bounds, compute_layout,
};
use crate::state::{ViewStateTable, group_toggle_parent};
use std::collections::{HashMap, HashSet};

/// Nodes framed when centering on a compact subtree.
const COMPACT_FOCUS_NODES: usize = 7;

/// Interactive org chart state: records, view flags and viewport.
///
/// Every mutation rebuilds what it needs and returns; call [`OrgChart::layout`]
/// to get fresh geometry.
#[derive(Debug)]
pub struct OrgChart {
    records: Vec<Record>,
    connections: Vec<Connection>,
    config: ChartConfig,
    callbacks: ChartCallbacks,
    hierarchy: Option<Hierarchy>,
    states: ViewStateTable,
    viewport: Viewport,
    previous: HashMap<String, (f32, f32)>,
    last: Option<ChartLayout>,
}

impl OrgChart {
    /// Builds the chart. Empty data is accepted and lays out as nothing.
    pub fn new(records: Vec<Record>, config: ChartConfig) -> Result<Self> {
        let viewport = Viewport::new(
            config.viewport.width,
            config.viewport.height,
            config.viewport.scale_extent,
        );
        let mut chart = Self {
            records,
            connections: Vec::new(),
            config,
            callbacks: ChartCallbacks::default(),
            hierarchy: None,
            states: ViewStateTable::new(),
            viewport,
            previous: HashMap::new(),
            last: None,
        };
        chart.rebuild()?;
        Ok(chart)
    }

    pub fn with_callbacks(mut self, callbacks: ChartCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn with_connections(mut self, connections: Vec<Connection>) -> Self {
        self.connections = connections;
        self
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn data(&self) -> &[Record] {
        &self.records
    }

    pub fn hierarchy(&self) -> Option<&Hierarchy> {
        self.hierarchy.as_ref()
    }

    pub fn states(&self) -> &ViewStateTable {
        &self.states
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn last_layout(&self) -> Option<&ChartLayout> {
        self.last.as_ref()
    }

    fn rebuild(&mut self) -> Result<()> {
        match Hierarchy::build_with(&self.records, self.config.data.merge_roots) {
            Ok(hierarchy) => {
                self.states
                    .sync(&hierarchy, &self.records, self.config.layout.expand_level);
                self.hierarchy = Some(hierarchy);
                Ok(())
            }
            Err(ChartError::EmptyData) => {
                tracing::debug!("no records, nothing to lay out");
                self.hierarchy = None;
                self.states = ViewStateTable::new();
                self.last = None;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot build hierarchy");
                Err(err)
            }
        }
    }

    /// Runs a full pass over the current flags and consumes any pending
    /// centering request. `None` when there is no data.
    pub fn layout(&mut self) -> Option<&ChartLayout> {
        let hierarchy = self.hierarchy.as_ref()?;
        let mut result = compute_layout(&LayoutContext {
            hierarchy,
            records: &self.records,
            states: &self.states,
            connections: &self.connections,
            config: &self.config,
            callbacks: &self.callbacks,
            previous: &self.previous,
            scale: self.viewport.transform.scale,
        });

        if let Some(target) = self.states.first_centered(hierarchy) {
            let id = hierarchy.get(target).id.clone();
            let with_descendants = self.states.get(&id).centered_with_descendants;
            let framed = focus_nodes(&result, &id, with_descendants, self.config.compact.enabled);
            if !framed.is_empty() {
                let binding = layout::binding(self.config.layout.orientation);
                let bounds = compute_bounds(framed, &binding);
                let transform = self.viewport.fit(
                    bounds,
                    FitOptions {
                        animate: true,
                        scale: false,
                    },
                );
                tracing::debug!(node = %id, ?transform, "centered");
                result.focus = Some(transform);
            }
            self.states.clear_centered();
        }

        self.previous = result
            .nodes
            .iter()
            .map(|node| (node.id.clone(), (node.x, node.y)))
            .collect();
        self.last = Some(result);
        self.last.as_ref()
    }

    fn node_id(&self, op: &'static str, id: &str) -> Result<NodeId> {
        self.hierarchy
            .as_ref()
            .and_then(|h| h.index_of(id))
            .ok_or_else(|| {
                tracing::warn!(op, id, "node not found in the tree");
                ChartError::UnknownNode {
                    op,
                    id: id.to_string(),
                }
            })
    }

    /// Runs `f` against the current hierarchy and view-state table.
    fn with_states<T>(&mut self, f: impl FnOnce(&Hierarchy, &mut ViewStateTable) -> T) -> Option<T> {
        let hierarchy = self.hierarchy.as_ref()?;
        Some(f(hierarchy, &mut self.states))
    }

    /// Appends records. The whole batch is rejected if any id is taken, any
    /// parent is unknown, or a record would become a second root.
    pub fn add_nodes(&mut self, records: Vec<Record>) -> Result<()> {
        {
            let known: HashSet<&str> = self.records.iter().map(|r| r.id.as_str()).collect();
            let mut fresh: HashSet<&str> = HashSet::with_capacity(records.len());
            for record in &records {
                if known.contains(record.id.as_str()) || !fresh.insert(record.id.as_str()) {
                    tracing::warn!(id = %record.id, "add_nodes: duplicate id, batch rejected");
                    return Err(ChartError::DuplicateId {
                        id: record.id.clone(),
                    });
                }
            }
            for record in &records {
                match record.parent_id.as_deref() {
                    Some(parent) if known.contains(parent) || fresh.contains(parent) => {}
                    Some(parent) => {
                        tracing::warn!(id = %record.id, parent, "add_nodes: parent not found, batch rejected");
                        return Err(ChartError::MissingParent {
                            id: record.id.clone(),
                            parent_id: parent.to_string(),
                        });
                    }
                    None if known.is_empty() || self.config.data.merge_roots => {}
                    None => {
                        let first = self
                            .hierarchy
                            .as_ref()
                            .map(|h| h.get(h.root()).id.clone())
                            .unwrap_or_default();
                        tracing::warn!(id = %record.id, "add_nodes: second root, batch rejected");
                        return Err(ChartError::MultipleRoots {
                            first,
                            second: record.id.clone(),
                        });
                    }
                }
            }
        }

        let before = self.records.len();
        self.records.extend(records);
        if let Err(err) = self.rebuild() {
            self.records.truncate(before);
            self.rebuild()?;
            return Err(err);
        }
        Ok(())
    }

    pub fn add_node(&mut self, record: Record) -> Result<()> {
        self.add_nodes(vec![record])
    }

    /// Removes the node and every descendant.
    pub fn remove_node(&mut self, id: &str) -> Result<()> {
        let node = self.node_id("remove_node", id)?;
        let Some(hierarchy) = self.hierarchy.as_ref() else {
            return Ok(());
        };
        let doomed: HashSet<&str> = hierarchy
            .descendants(node)
            .into_iter()
            .map(|d| hierarchy.get(d).id.as_str())
            .collect();
        let kept: Vec<Record> = self
            .records
            .iter()
            .filter(|r| !doomed.contains(r.id.as_str()))
            .cloned()
            .collect();
        tracing::debug!(id, removed = self.records.len() - kept.len(), "removing subtree");
        self.records = kept;
        self.rebuild()
    }

    pub fn set_expanded(&mut self, id: &str, expanded: bool) -> Result<()> {
        let node = self.node_id("set_expanded", id)?;
        self.with_states(|h, s| s.set_expanded(h, node, expanded));
        Ok(())
    }

    /// Reveals the node and asks the next layout to center on it.
    pub fn set_centered(&mut self, id: &str) -> Result<()> {
        let node = self.node_id("set_centered", id)?;
        self.with_states(|h, s| {
            s.get_mut(&h.get(node).id).centered = true;
            s.reveal(h, node);
        });
        Ok(())
    }

    pub fn set_highlighted(&mut self, id: &str) -> Result<()> {
        let node = self.node_id("set_highlighted", id)?;
        self.with_states(|h, s| {
            let state = s.get_mut(&h.get(node).id);
            state.highlighted = true;
            state.centered = true;
            s.reveal(h, node);
        });
        Ok(())
    }

    pub fn set_up_to_root_highlighted(&mut self, id: &str) -> Result<()> {
        let node = self.node_id("set_up_to_root_highlighted", id)?;
        self.with_states(|h, s| {
            s.set_up_to_root_highlighted(h, node);
            s.get_mut(&h.get(node).id).centered = true;
        });
        Ok(())
    }

    pub fn clear_highlighting(&mut self) {
        self.states.clear_highlighting();
    }

    /// Expand-button click. Returns whether the node ended up expanded.
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        let node = self.node_id("toggle", id)?;
        let center = self.config.layout.set_active_node_centered;
        let expanded = self
            .with_states(|h, s| {
                let expanded = s.toggle(h, node);
                if center {
                    let state = s.get_mut(&h.get(node).id);
                    state.centered = true;
                    state.centered_with_descendants = true;
                }
                expanded
            })
            .unwrap_or(false);
        Ok(expanded)
    }

    /// Opens or closes a compact group. Accepts the parent id or the id of
    /// its group-toggle placeholder; the placeholder always opens.
    pub fn toggle_compact_group(&mut self, id: &str) -> Result<bool> {
        let (target, force_open) = match group_toggle_parent(id) {
            Some(parent) => (parent, true),
            None => (id, false),
        };
        let node = self.node_id("toggle_compact_group", target)?;
        let open = self
            .with_states(|h, s| {
                let open = force_open || !s.get(&h.get(node).id).compact_expanded;
                s.set_compact_expanded(h, node, open);
                open
            })
            .unwrap_or(false);
        Ok(open)
    }

    pub fn set_compact_expanded(&mut self, id: &str, open: bool) -> Result<()> {
        let node = self.node_id("set_compact_expanded", id)?;
        self.with_states(|h, s| s.set_compact_expanded(h, node, open));
        Ok(())
    }

    pub fn expand_all(&mut self) {
        self.with_states(|h, s| s.expand_all(h));
    }

    /// Closes every node; the root stays open while `expand_level` is nonzero.
    pub fn collapse_all(&mut self) {
        let keep_root = self.config.layout.expand_level > 0;
        self.with_states(|h, s| s.collapse_all(h, keep_root));
    }

    /// Completes a drag and drop by moving `id` under `new_parent`.
    pub fn set_parent(&mut self, id: &str, new_parent: &str) -> Result<()> {
        let node = self.node_id("set_parent", id)?;
        let target = self.node_id("set_parent", new_parent)?;
        let Some(hierarchy) = self.hierarchy.as_ref() else {
            return Ok(());
        };
        let metrics = Metrics::new(&self.callbacks, &self.config.node, &self.config.compact);
        let dragged = NodeInfo::of(hierarchy, &self.records, node);
        let dropped_on = NodeInfo::of(hierarchy, &self.records, target);
        let allowed = metrics.draggable(&dragged)
            && !hierarchy.is_ancestor(node, target)
            && metrics.droppable(&dragged, &dropped_on);
        if !allowed {
            tracing::warn!(id, target = new_parent, "set_parent: move rejected");
            return Err(ChartError::InvalidMove {
                id: id.to_string(),
                target: new_parent.to_string(),
            });
        }

        let Some(record) = self.records.iter_mut().find(|r| r.id == id) else {
            return Err(ChartError::UnknownNode {
                op: "set_parent",
                id: id.to_string(),
            });
        };
        let old_parent = record.parent_id.replace(new_parent.to_string());
        if let Err(err) = self.rebuild() {
            if let Some(record) = self.records.iter_mut().find(|r| r.id == id) {
                record.parent_id = old_parent;
            }
            self.rebuild()?;
            return Err(err);
        }
        self.set_expanded(new_parent, true)
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.config.layout.orientation = orientation;
    }

    pub fn set_compact(&mut self, enabled: bool, no_children: bool) {
        self.config.compact.enabled = enabled;
        self.config.compact.no_children = no_children;
    }

    pub fn set_connections(&mut self, connections: Vec<Connection>) {
        self.connections = connections;
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.config.viewport.width = width;
        self.config.viewport.height = height;
        self.viewport.width = width;
        self.viewport.height = height;
    }

    /// Fits the given nodes, or every visible node when none of `ids` is
    /// on screen.
    pub fn fit(&mut self, ids: &[&str], options: FitOptions) -> ViewportTransform {
        if self.last.is_none() {
            self.layout();
        }
        let binding = layout::binding(self.config.layout.orientation);
        let bounds = self.last.as_ref().and_then(|last| {
            let picked: Vec<&NodeLayout> = last
                .nodes
                .iter()
                .filter(|node| ids.contains(&node.id.as_str()))
                .collect();
            if picked.is_empty() {
                compute_bounds(&last.nodes, &binding)
            } else {
                compute_bounds(picked, &binding)
            }
        });
        self.viewport.fit(bounds, options)
    }

    pub fn zoom(&mut self, scale: f32) -> ViewportTransform {
        self.viewport.zoom(scale)
    }

    pub fn zoom_in(&mut self) -> ViewportTransform {
        self.viewport.zoom_in()
    }

    pub fn zoom_out(&mut self) -> ViewportTransform {
        self.viewport.zoom_out()
    }
}

/// Nodes framed when centering on `id`: the node alone, or a slice of its
/// visible subtree.
fn focus_nodes<'a>(
    layout: &'a ChartLayout,
    id: &str,
    with_descendants: bool,
    compact: bool,
) -> Vec<&'a NodeLayout> {
    let Some(node) = layout.node(id) else {
        return Vec::new();
    };
    if !with_descendants {
        return vec![node];
    }

    let mut children: HashMap<&str, Vec<&NodeLayout>> = HashMap::new();
    for n in &layout.nodes {
        if let Some(parent) = n.parent.as_deref() {
            children.entry(parent).or_default().push(n);
        }
    }

    // Breadth-first subtree, node first.
    let mut subtree = vec![node];
    let mut cursor = 0;
    while cursor < subtree.len() {
        if let Some(kids) = children.get(subtree[cursor].id.as_str()) {
            subtree.extend(kids.iter().copied());
        }
        cursor += 1;
    }

    if compact {
        subtree.truncate(COMPACT_FOCUS_NODES);
        return subtree;
    }
    // Middle band of the subtree, two either side of its midpoint.
    let half = (subtree.len() as i64 + 1) / 2;
    let odd = subtree.len() % 2 == 1;
    subtree
        .into_iter()
        .enumerate()
        .filter(|(i, _)| {
            let i = *i as i64;
            i > half - 2 && if odd { i < half + 1 } else { i < half + 2 }
        })
        .map(|(_, n)| n)
        .collect()
}
