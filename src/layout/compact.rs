use super::*;

/// Oriented size and margins of one visible node, as compact packing sees it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemberSize {
    /// Extent along the sibling axis.
    pub column: f32,
    /// Extent along the depth axis.
    pub row: f32,
    pub pair: f32,
    pub between: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterMode {
    /// Leaf children packed two per row.
    PairGrid,
    /// Every child stacked in a single padded column.
    GroupBox,
}

#[derive(Debug, Clone)]
pub struct Cluster {
    pub parent: usize,
    /// Visible-tree indices; the first one anchors the cluster.
    pub members: Vec<usize>,
    pub mode: ClusterMode,
    pub dims: [f32; 2],
}

/// Per-pass compact bookkeeping, indexed like the visible tree.
#[derive(Debug, Clone, Default)]
pub struct CompactInfo {
    pub clusters: Vec<Cluster>,
    slots: Vec<Option<CompactSlot>>,
}

impl CompactInfo {
    pub fn slot(&self, index: usize) -> Option<&CompactSlot> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Box the flextree pass should use instead of the node's own size.
    pub fn flex_size(&self, index: usize) -> Option<[f32; 2]> {
        self.slot(index).map(|slot| slot.dims)
    }

    pub fn anchor_of(&self, parent: usize) -> Option<&Cluster> {
        self.clusters.iter().find(|cluster| cluster.parent == parent)
    }
}

pub fn compute_dimensions(
    tree: &VisibleTree,
    sizes: &[MemberSize],
    group_mode: bool,
    group_padding: f32,
) -> CompactInfo {
    let mut info = CompactInfo {
        clusters: Vec::new(),
        slots: vec![None; tree.len()],
    };

    for (parent, node) in tree.nodes().iter().enumerate() {
        if node.children.len() < 2 {
            continue;
        }
        let (mode, members): (ClusterMode, Vec<usize>) = if group_mode {
            if !node.group_eligible {
                continue;
            }
            (ClusterMode::GroupBox, node.children.clone())
        } else {
            let leaves = node
                .children
                .iter()
                .copied()
                .filter(|&child| tree.get(child).children.is_empty())
                .collect();
            (ClusterMode::PairGrid, leaves)
        };
        if members.len() < 2 {
            continue;
        }

        let anchor = members[0];
        let max_column = members
            .iter()
            .map(|&m| sizes[m].column)
            .fold(0.0f32, f32::max);
        let dims = match mode {
            ClusterMode::PairGrid => {
                let rows: f32 = row_extents(&members, sizes, |s| s.row + s.between)
                    .iter()
                    .sum();
                [
                    2.0 * max_column + sizes[anchor].pair,
                    rows - sizes[anchor].between,
                ]
            }
            ClusterMode::GroupBox => {
                let stacked: f32 = members
                    .iter()
                    .map(|&m| sizes[m].row + sizes[m].between)
                    .sum();
                [
                    max_column + 2.0 * group_padding,
                    2.0 * group_padding + stacked - sizes[parent].between,
                ]
            }
        };

        for (i, &member) in members.iter().enumerate() {
            info.slots[member] = Some(CompactSlot {
                row: match mode {
                    ClusterMode::PairGrid => i / 2,
                    ClusterMode::GroupBox => i,
                },
                even: i % 2 == 0,
                anchor: i == 0,
                dims: if i == 0 { dims } else { [0.0, 0.0] },
            });
        }
        info.clusters.push(Cluster {
            parent,
            members,
            mode,
            dims,
        });
    }
    info
}

/// Largest `extent` per pair-grid row.
fn row_extents(members: &[usize], sizes: &[MemberSize], extent: impl Fn(&MemberSize) -> f32) -> Vec<f32> {
    members
        .chunks(2)
        .map(|row| row.iter().map(|&m| extent(&sizes[m])).fold(0.0f32, f32::max))
        .collect()
}

/// Moves cluster members from where the flextree pass left them into their
/// grid or stack slots. Works on canonical coordinates.
pub fn apply_positions(
    info: &CompactInfo,
    sizes: &[MemberSize],
    xs: &mut [f32],
    ys: &mut [f32],
    recenter_threshold: f32,
) {
    for cluster in &info.clusters {
        let members = &cluster.members;
        let anchor = members[0];
        let top = ys[anchor];
        match cluster.mode {
            ClusterMode::PairGrid => {
                let w = cluster.dims[0];
                let left = xs[anchor] - w / 2.0;
                for (i, &m) in members.iter().enumerate().skip(1) {
                    xs[m] = if i % 2 == 0 {
                        left + w * 0.25 - sizes[m].pair / 4.0
                    } else {
                        left + w * 0.75 + sizes[m].pair / 4.0
                    };
                }
                let center = left + w / 2.0;
                xs[anchor] = left + w * 0.25 - sizes[anchor].pair / 4.0;
                let offset = xs[cluster.parent] - center;
                if offset.abs() < recenter_threshold {
                    for &m in members {
                        xs[m] += offset;
                    }
                }

                let between = sizes[anchor].between;
                let mut starts = Vec::new();
                let mut acc = 0.0;
                for row in row_extents(members, sizes, |s| s.row) {
                    starts.push(acc);
                    acc += row + between;
                }
                for (i, &m) in members.iter().enumerate() {
                    ys[m] = top + starts[i / 2];
                }
            }
            ClusterMode::GroupBox => {
                let x = xs[anchor];
                let mut y = top;
                for &m in members {
                    xs[m] = x;
                    ys[m] = y;
                    y += sizes[m].row + sizes[m].between;
                }
            }
        }
    }
}

/// Canonical `(parent, [left, top, width, height])` of every group box.
pub fn group_box_rects(
    info: &CompactInfo,
    xs: &[f32],
    ys: &[f32],
    group_padding: f32,
) -> Vec<(usize, [f32; 4])> {
    info.clusters
        .iter()
        .filter(|cluster| cluster.mode == ClusterMode::GroupBox)
        .map(|cluster| {
            let anchor = cluster.members[0];
            let [w, h] = cluster.dims;
            (
                cluster.parent,
                [xs[anchor] - w / 2.0, ys[anchor] - group_padding, w, h],
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::{ChartCallbacks, Metrics};
    use crate::config::{CompactConfig, NodeConfig};
    use crate::hierarchy::Hierarchy;
    use crate::ir::Record;
    use crate::state::ViewStateTable;

    fn visible(records: &[Record], group_mode: bool, open_groups: bool) -> VisibleTree {
        let hierarchy = Hierarchy::build(records).unwrap();
        let mut states = ViewStateTable::new();
        states.sync(&hierarchy, records, 1);
        states.expand_all(&hierarchy);
        if open_groups {
            for node in hierarchy.nodes() {
                states.get_mut(&node.id).compact_expanded = true;
            }
        }
        let callbacks = ChartCallbacks::default();
        let node = NodeConfig::default();
        let compact = CompactConfig::default();
        let metrics = Metrics::new(&callbacks, &node, &compact);
        VisibleTree::build(&hierarchy, records, &states, &metrics, group_mode)
    }

    fn team(size: usize) -> Vec<Record> {
        let mut records = vec![Record::new("lead", None)];
        for i in 0..size {
            records.push(Record::new(format!("m{i}"), Some("lead")));
        }
        records
    }

    fn uniform(n: usize) -> Vec<MemberSize> {
        vec![
            MemberSize {
                column: 100.0,
                row: 50.0,
                pair: 20.0,
                between: 10.0,
            };
            n
        ]
    }

    #[test]
    fn pair_grid_dimensions() {
        let tree = visible(&team(4), false, false);
        let info = compute_dimensions(&tree, &uniform(tree.len()), false, 15.0);
        assert_eq!(info.clusters.len(), 1);
        let cluster = &info.clusters[0];
        assert_eq!(cluster.mode, ClusterMode::PairGrid);
        assert_eq!(cluster.dims, [220.0, 110.0]);
        assert_eq!(info.flex_size(1), Some([220.0, 110.0]));
        for member in 2..5 {
            assert_eq!(info.flex_size(member), Some([0.0, 0.0]));
        }
        let last = info.slot(4).unwrap();
        assert_eq!((last.row, last.even, last.anchor), (1, false, false));
        assert_eq!(info.slot(0), None);
    }

    #[test]
    fn pair_grid_positions() {
        let tree = visible(&team(4), false, false);
        let sizes = uniform(tree.len());
        let info = compute_dimensions(&tree, &sizes, false, 15.0);
        let mut xs = vec![0.0; tree.len()];
        let mut ys = vec![0.0, 100.0, 100.0, 100.0, 100.0];
        apply_positions(&info, &sizes, &mut xs, &mut ys, 10.0);
        assert_eq!(&xs[1..], &[-60.0, 60.0, -60.0, 60.0]);
        assert_eq!(&ys[1..], &[100.0, 100.0, 160.0, 160.0]);
    }

    #[test]
    fn recenters_only_small_drift() {
        let tree = visible(&team(2), false, false);
        let sizes = uniform(tree.len());
        let info = compute_dimensions(&tree, &sizes, false, 15.0);

        let mut xs = vec![5.0, 0.0, 0.0];
        let mut ys = vec![0.0; 3];
        apply_positions(&info, &sizes, &mut xs, &mut ys, 10.0);
        assert_eq!(&xs[1..], &[-55.0, 65.0]);

        let mut xs = vec![30.0, 0.0, 0.0];
        apply_positions(&info, &sizes, &mut xs, &mut ys, 10.0);
        assert_eq!(&xs[1..], &[-60.0, 60.0]);

        let mut xs = vec![30.0, 0.0, 0.0];
        apply_positions(&info, &sizes, &mut xs, &mut ys, 50.0);
        assert_eq!(&xs[1..], &[-30.0, 90.0]);
    }

    #[test]
    fn managers_are_not_packed() {
        let mut records = team(3);
        records.push(Record::new("report", Some("m1")));
        let tree = visible(&records, false, false);
        let info = compute_dimensions(&tree, &uniform(tree.len()), false, 15.0);
        let cluster = &info.clusters[0];
        let ids: Vec<&str> = cluster
            .members
            .iter()
            .map(|&m| tree.get(m).id.as_str())
            .collect();
        assert_eq!(ids, ["m0", "m2"]);
    }

    #[test]
    fn single_leaf_is_left_alone() {
        let mut records = team(2);
        records.push(Record::new("report", Some("m1")));
        let tree = visible(&records, false, false);
        let info = compute_dimensions(&tree, &uniform(tree.len()), false, 15.0);
        assert!(info.clusters.is_empty());
    }

    #[test]
    fn group_box_stacks_members() {
        let tree = visible(&team(3), true, true);
        assert_eq!(tree.len(), 4);
        let sizes = uniform(tree.len());
        let info = compute_dimensions(&tree, &sizes, true, 15.0);
        let cluster = &info.clusters[0];
        assert_eq!(cluster.mode, ClusterMode::GroupBox);
        assert_eq!(cluster.dims, [130.0, 200.0]);

        let mut xs = vec![0.0, 12.0, 40.0, 80.0];
        let mut ys = vec![0.0, 200.0, 200.0, 200.0];
        apply_positions(&info, &sizes, &mut xs, &mut ys, 10.0);
        assert_eq!(&xs[1..], &[12.0, 12.0, 12.0]);
        assert_eq!(&ys[1..], &[200.0, 260.0, 320.0]);

        let rects = group_box_rects(&info, &xs, &ys, 15.0);
        assert_eq!(rects, vec![(0, [-53.0, 185.0, 130.0, 200.0])]);
    }

    #[test]
    fn group_mode_skips_closed_and_ineligible_parents() {
        let closed = visible(&team(3), true, false);
        assert_eq!(closed.len(), 2);
        let info = compute_dimensions(&closed, &uniform(closed.len()), true, 15.0);
        assert!(info.clusters.is_empty());

        let mut records = team(3);
        records.push(Record::new("report", Some("m1")));
        let mixed = visible(&records, true, true);
        let info = compute_dimensions(&mixed, &uniform(mixed.len()), true, 15.0);
        assert!(info.anchor_of(0).is_none());
    }
}
