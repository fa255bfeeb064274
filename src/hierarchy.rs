use crate::error::{ChartError, Result};
use crate::ir::Record;
use crate::state::group_toggle_parent;
use std::collections::HashMap;

/// Id given to the synthetic root that gathers several parentless records.
pub const SYNTHETIC_ROOT_ID: &str = "__org_chart_root__";

/// Index into the hierarchy arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub id: String,
    /// Position of the source record; `None` for the synthetic root.
    pub record: Option<usize>,
    pub parent: Option<NodeId>,
    /// Children in record order.
    pub children: Vec<NodeId>,
    /// Root = 0
    pub depth: u32,
    pub direct_subordinates: usize,
    pub total_subordinates: usize,
}

/// Full rooted tree over every record, regardless of what is expanded.
///
/// Nodes are stored parent before child, so a reverse scan visits every
/// subtree before its root.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    nodes: Vec<HierarchyNode>,
    index: HashMap<String, NodeId>,
}

impl Hierarchy {
    pub fn build(records: &[Record]) -> Result<Self> {
        Self::build_with(records, false)
    }

    /// Like [`Hierarchy::build`], optionally hanging several roots under a
    /// synthetic one.
    pub fn build_with(records: &[Record], merge_roots: bool) -> Result<Self> {
        if records.is_empty() {
            return Err(ChartError::EmptyData);
        }

        let mut by_id: HashMap<&str, usize> = HashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            if group_toggle_parent(&record.id).is_some() {
                return Err(ChartError::ReservedId {
                    id: record.id.clone(),
                });
            }
            if by_id.insert(record.id.as_str(), pos).is_some() {
                return Err(ChartError::DuplicateId {
                    id: record.id.clone(),
                });
            }
        }

        let mut kids: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut roots = Vec::new();
        for (pos, record) in records.iter().enumerate() {
            match record.parent_id.as_deref() {
                None => roots.push(pos),
                Some(parent) if by_id.contains_key(parent) => {
                    kids.entry(parent).or_default().push(pos)
                }
                Some(parent) => {
                    return Err(ChartError::MissingParent {
                        id: record.id.clone(),
                        parent_id: parent.to_string(),
                    });
                }
            }
        }

        let mut nodes = Vec::with_capacity(records.len() + 1);
        let mut stack: Vec<(NodeId, usize)> = Vec::new();
        match roots.as_slice() {
            [] => {
                return Err(ChartError::Cycle {
                    id: records[0].id.clone(),
                });
            }
            [root] => {
                nodes.push(new_node(records[*root].id.clone(), Some(*root), None, 0));
                stack.push((NodeId(0), *root));
            }
            [first, second, ..] if !merge_roots => {
                return Err(ChartError::MultipleRoots {
                    first: records[*first].id.clone(),
                    second: records[*second].id.clone(),
                });
            }
            many => {
                if by_id.contains_key(SYNTHETIC_ROOT_ID) {
                    return Err(ChartError::DuplicateId {
                        id: SYNTHETIC_ROOT_ID.to_string(),
                    });
                }
                nodes.push(new_node(SYNTHETIC_ROOT_ID.to_string(), None, None, 0));
                for &pos in many {
                    let id = NodeId(nodes.len() as u32);
                    nodes.push(new_node(records[pos].id.clone(), Some(pos), Some(NodeId(0)), 1));
                    nodes[0].children.push(id);
                }
                let seeded: Vec<(NodeId, usize)> = nodes[0]
                    .children
                    .iter()
                    .zip(many)
                    .map(|(&id, &pos)| (id, pos))
                    .collect();
                stack.extend(seeded.into_iter().rev());
            }
        }

        // Pre-order walk; children get their arena slot when the parent is
        // expanded, so parents always precede children.
        while let Some((node_id, pos)) = stack.pop() {
            let Some(child_positions) = kids.get(records[pos].id.as_str()) else {
                continue;
            };
            let depth = nodes[node_id.index()].depth + 1;
            let mut pending = Vec::with_capacity(child_positions.len());
            for &child_pos in child_positions {
                let child_id = NodeId(nodes.len() as u32);
                nodes.push(new_node(
                    records[child_pos].id.clone(),
                    Some(child_pos),
                    Some(node_id),
                    depth,
                ));
                nodes[node_id.index()].children.push(child_id);
                pending.push((child_id, child_pos));
            }
            stack.extend(pending.into_iter().rev());
        }

        let reached = nodes.iter().filter(|node| node.record.is_some()).count();
        if reached < records.len() {
            let mut seen = vec![false; records.len()];
            for pos in nodes.iter().filter_map(|node| node.record) {
                seen[pos] = true;
            }
            let stray = seen.iter().position(|hit| !hit).unwrap_or(0);
            return Err(ChartError::Cycle {
                id: records[stray].id.clone(),
            });
        }

        for i in (0..nodes.len()).rev() {
            let total: usize = nodes[i]
                .children
                .iter()
                .map(|child| nodes[child.index()].total_subordinates + 1)
                .sum();
            nodes[i].direct_subordinates = nodes[i].children.len();
            nodes[i].total_subordinates = total;
        }

        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.clone(), NodeId(i as u32)))
            .collect();
        Ok(Self { nodes, index })
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &HierarchyNode {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    pub fn index_of(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// The node followed by each ancestor up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut cursor = self.parent(id);
        while let Some(parent) = cursor {
            chain.push(parent);
            cursor = self.parent(parent);
        }
        chain
    }

    /// Pre-order walk of the subtree, starting with the node itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes[id.index()].total_subordinates + 1);
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// True when `ancestor` lies on the path from `node` to the root,
    /// `node` itself included.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }
}

fn new_node(id: String, record: Option<usize>, parent: Option<NodeId>, depth: u32) -> HierarchyNode {
    HierarchyNode {
        id,
        record,
        parent,
        children: Vec::new(),
        depth,
        direct_subordinates: 0,
        total_subordinates: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, parent: Option<&str>) -> Record {
        Record::new(id, parent)
    }

    fn sample() -> Vec<Record> {
        vec![
            rec("ceo", None),
            rec("cto", Some("ceo")),
            rec("cfo", Some("ceo")),
            rec("dev1", Some("cto")),
            rec("dev2", Some("cto")),
            rec("acct", Some("cfo")),
        ]
    }

    #[test]
    fn builds_counts_and_depths() {
        let tree = Hierarchy::build(&sample()).unwrap();
        assert_eq!(tree.len(), 6);
        let root = tree.get(tree.root());
        assert_eq!(root.id, "ceo");
        assert_eq!(root.direct_subordinates, 2);
        assert_eq!(root.total_subordinates, 5);

        let cto = tree.get(tree.index_of("cto").unwrap());
        assert_eq!(cto.depth, 1);
        assert_eq!(cto.direct_subordinates, 2);
        assert_eq!(cto.total_subordinates, 2);

        let dev = tree.get(tree.index_of("dev2").unwrap());
        assert_eq!(dev.depth, 2);
        assert_eq!(dev.total_subordinates, 0);
    }

    #[test]
    fn children_keep_record_order_and_parents_come_first() {
        let tree = Hierarchy::build(&sample()).unwrap();
        let names: Vec<&str> = tree
            .children(tree.root())
            .iter()
            .map(|id| tree.get(*id).id.as_str())
            .collect();
        assert_eq!(names, ["cto", "cfo"]);
        for (i, node) in tree.nodes().iter().enumerate() {
            if let Some(parent) = node.parent {
                assert!(parent.index() < i);
            }
        }
    }

    #[test]
    fn walks() {
        let tree = Hierarchy::build(&sample()).unwrap();
        let dev1 = tree.index_of("dev1").unwrap();
        let chain: Vec<&str> = tree
            .ancestors(dev1)
            .iter()
            .map(|id| tree.get(*id).id.as_str())
            .collect();
        assert_eq!(chain, ["dev1", "cto", "ceo"]);

        let subtree: Vec<&str> = tree
            .descendants(tree.root())
            .iter()
            .map(|id| tree.get(*id).id.as_str())
            .collect();
        assert_eq!(subtree, ["ceo", "cto", "dev1", "dev2", "cfo", "acct"]);

        let cto = tree.index_of("cto").unwrap();
        assert!(tree.is_ancestor(cto, dev1));
        assert!(tree.is_ancestor(dev1, dev1));
        assert!(!tree.is_ancestor(dev1, cto));
    }

    #[test]
    fn rejects_structural_errors() {
        assert_eq!(Hierarchy::build(&[]).unwrap_err(), ChartError::EmptyData);

        let dup = vec![rec("a", None), rec("a", Some("a"))];
        assert!(matches!(
            Hierarchy::build(&dup),
            Err(ChartError::DuplicateId { .. })
        ));

        let orphan = vec![rec("a", None), rec("b", Some("ghost"))];
        assert_eq!(
            Hierarchy::build(&orphan).unwrap_err(),
            ChartError::MissingParent {
                id: "b".into(),
                parent_id: "ghost".into()
            }
        );

        let two = vec![rec("a", None), rec("b", None)];
        assert!(matches!(
            Hierarchy::build(&two),
            Err(ChartError::MultipleRoots { .. })
        ));
    }

    #[test]
    fn rejects_ids_shaped_like_group_toggles() {
        let records = vec![rec("lead", None), rec("lead::group-toggle", Some("lead"))];
        assert_eq!(
            Hierarchy::build(&records).unwrap_err(),
            ChartError::ReservedId {
                id: "lead::group-toggle".into()
            }
        );
        assert!(Hierarchy::build(&[rec("group-toggle", None)]).is_ok());
    }

    #[test]
    fn detects_cycles() {
        let ring = vec![rec("a", Some("b")), rec("b", Some("a"))];
        assert!(matches!(Hierarchy::build(&ring), Err(ChartError::Cycle { .. })));

        let side_loop = vec![
            rec("root", None),
            rec("x", Some("y")),
            rec("y", Some("x")),
        ];
        assert_eq!(
            Hierarchy::build(&side_loop).unwrap_err(),
            ChartError::Cycle { id: "x".into() }
        );
    }

    #[test]
    fn merges_roots_under_synthetic_node() {
        let two = vec![rec("a", None), rec("b", None), rec("c", Some("b"))];
        let tree = Hierarchy::build_with(&two, true).unwrap();
        let root = tree.get(tree.root());
        assert_eq!(root.id, SYNTHETIC_ROOT_ID);
        assert_eq!(root.record, None);
        assert_eq!(root.direct_subordinates, 2);
        assert_eq!(root.total_subordinates, 3);
        assert_eq!(tree.get(tree.index_of("c").unwrap()).depth, 2);
    }
}
