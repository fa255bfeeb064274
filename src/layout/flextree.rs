//! Non-layered tidy tree layout for variable-sized nodes.
//!
//! A port of the van der Ploeg variant of Walker's algorithm, the same one
//! behind d3-flextree. Coordinates come out canonical: `x` is the center of a
//! node along the sibling axis, `y` its start along the depth axis, and the
//! root sits at `(0, 0)`.
//!
//! The two passes walk the arena by index instead of recursing, which relies
//! on every parent being added before its children.

#[derive(Debug, Clone)]
struct Slot {
    size: [f32; 2],
    parent: Option<usize>,
    children: Vec<usize>,
    x: f32,
    y: f32,
    rel_x: f32,
    prelim: f32,
    shift: f32,
    change: f32,
    l_ext: usize,
    r_ext: usize,
    l_ext_rel_x: f32,
    r_ext_rel_x: f32,
    l_thr: Option<usize>,
    r_thr: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct FlexTree {
    slots: Vec<Slot>,
}

impl FlexTree {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Adds a node of `size = [breadth, depth extent]`. The parent must
    /// already be in the tree.
    pub fn add(&mut self, parent: Option<usize>, size: [f32; 2]) -> usize {
        let id = self.slots.len();
        debug_assert!(parent.is_none_or(|p| p < id));
        self.slots.push(Slot {
            size,
            parent,
            children: Vec::new(),
            x: 0.0,
            y: 0.0,
            rel_x: 0.0,
            prelim: 0.0,
            shift: 0.0,
            change: 0.0,
            l_ext: id,
            r_ext: id,
            l_ext_rel_x: 0.0,
            r_ext_rel_x: 0.0,
            l_thr: None,
            r_thr: None,
        });
        if let Some(p) = parent {
            self.slots[p].children.push(id);
        }
        id
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn position(&self, id: usize) -> (f32, f32) {
        let slot = &self.slots[id];
        (slot.x, slot.y)
    }

    /// Runs both passes. `spacing(a, b)` is the extra gap required between
    /// two nodes facing each other across neighbouring subtrees.
    pub fn layout(&mut self, spacing: impl Fn(usize, usize) -> f32) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.rel_x = 0.0;
            slot.prelim = 0.0;
            slot.shift = 0.0;
            slot.change = 0.0;
            slot.l_ext = i;
            slot.r_ext = i;
            slot.l_ext_rel_x = 0.0;
            slot.r_ext_rel_x = 0.0;
            slot.l_thr = None;
            slot.r_thr = None;
        }

        for i in 0..self.slots.len() {
            self.slots[i].y = match self.slots[i].parent {
                Some(p) => self.slots[p].y + self.slots[p].size[1],
                None => 0.0,
            };
        }

        for i in (0..self.slots.len()).rev() {
            if !self.slots[i].children.is_empty() {
                self.layout_children(i, &spacing);
            }
        }

        let mut sums = vec![0.0f32; self.slots.len()];
        for i in 0..self.slots.len() {
            let (prev_sum, parent_x) = match self.slots[i].parent {
                Some(p) => (sums[p], self.slots[p].x),
                None => (-self.slots[i].rel_x - self.slots[i].prelim, 0.0),
            };
            let slot = &mut self.slots[i];
            let sum = prev_sum + slot.rel_x;
            slot.rel_x = sum + slot.prelim - parent_x;
            slot.prelim = 0.0;
            slot.x = parent_x + slot.rel_x;
            sums[i] = sum;
        }
    }

    fn bottom(&self, id: usize) -> f32 {
        self.slots[id].y + self.slots[id].size[1]
    }

    fn layout_children(&mut self, w: usize, spacing: &impl Fn(usize, usize) -> f32) {
        let kids = self.slots[w].children.clone();
        // (low y, child index); the last entry is the most recent.
        let mut lows: Vec<(f32, usize)> = Vec::new();
        for (i, &kid) in kids.iter().enumerate() {
            let low_y = if i == 0 {
                self.bottom(self.slots[kid].l_ext)
            } else {
                self.bottom(self.slots[kid].r_ext)
            };
            if i > 0 {
                self.separate(&kids, i, &lows, spacing);
            }
            while lows.last().is_some_and(|&(y, _)| low_y >= y) {
                lows.pop();
            }
            lows.push((low_y, i));
        }
        self.shift_change(&kids);
        self.position_root(w, &kids);
    }

    fn separate(
        &mut self,
        kids: &[usize],
        i: usize,
        lows: &[(f32, usize)],
        spacing: &impl Fn(usize, usize) -> f32,
    ) {
        let left_sib = kids[i - 1];
        let cur = kids[i];
        let mut r_contour = Some(left_sib);
        let mut r_sum_mods = self.slots[left_sib].rel_x;
        let mut l_contour = Some(cur);
        let mut l_sum_mods = self.slots[cur].rel_x;
        let mut is_first = true;
        let mut low = lows.len().saturating_sub(1);

        while let (Some(r), Some(l)) = (r_contour, l_contour) {
            if self.bottom(r) > lows[low].0 {
                low = low.saturating_sub(1);
            }
            let rs = &self.slots[r];
            let ls = &self.slots[l];
            let dist = (r_sum_mods + rs.prelim) - (l_sum_mods + ls.prelim)
                + rs.size[0] / 2.0
                + ls.size[0] / 2.0
                + spacing(r, l);
            if dist > 0.0 || (dist < 0.0 && is_first) {
                l_sum_mods += dist;
                self.move_subtree(cur, dist);
                self.distribute_extra(kids, i, lows[low].1, dist);
            }
            is_first = false;

            let right_bottom = self.bottom(r);
            let left_bottom = self.bottom(l);
            if right_bottom <= left_bottom {
                r_contour = self.next_r_contour(r);
                if let Some(next) = r_contour {
                    r_sum_mods += self.slots[next].rel_x;
                }
            }
            if right_bottom >= left_bottom {
                l_contour = self.next_l_contour(l);
                if let Some(next) = l_contour {
                    l_sum_mods += self.slots[next].rel_x;
                }
            }
        }

        match (r_contour, l_contour) {
            (None, Some(l)) => self.set_l_thr(kids, i, l, l_sum_mods),
            (Some(r), None) => self.set_r_thr(kids, i, r, r_sum_mods),
            _ => {}
        }
    }

    fn move_subtree(&mut self, id: usize, dist: f32) {
        let slot = &mut self.slots[id];
        slot.rel_x += dist;
        slot.l_ext_rel_x += dist;
        slot.r_ext_rel_x += dist;
    }

    fn distribute_extra(&mut self, kids: &[usize], cur_i: usize, left_sib_i: usize, dist: f32) {
        let n = cur_i.saturating_sub(left_sib_i);
        if n > 1 {
            let delta = dist / n as f32;
            self.slots[kids[left_sib_i + 1]].shift += delta;
            let cur = &mut self.slots[kids[cur_i]];
            cur.shift -= delta;
            cur.change -= dist - delta;
        }
    }

    fn next_l_contour(&self, id: usize) -> Option<usize> {
        let slot = &self.slots[id];
        slot.children.first().copied().or(slot.l_thr)
    }

    fn next_r_contour(&self, id: usize) -> Option<usize> {
        let slot = &self.slots[id];
        slot.children.last().copied().or(slot.r_thr)
    }

    fn set_l_thr(&mut self, kids: &[usize], i: usize, l_contour: usize, l_sum_mods: f32) {
        let first = kids[0];
        let cur = kids[i];
        let l_ext = self.slots[first].l_ext;
        self.slots[l_ext].l_thr = Some(l_contour);
        let diff = l_sum_mods - self.slots[l_contour].rel_x - self.slots[first].l_ext_rel_x;
        self.slots[l_ext].rel_x += diff;
        self.slots[l_ext].prelim -= diff;
        self.slots[first].l_ext = self.slots[cur].l_ext;
        self.slots[first].l_ext_rel_x = self.slots[cur].l_ext_rel_x;
    }

    fn set_r_thr(&mut self, kids: &[usize], i: usize, r_contour: usize, r_sum_mods: f32) {
        let cur = kids[i];
        let left_sib = kids[i - 1];
        let r_ext = self.slots[cur].r_ext;
        self.slots[r_ext].r_thr = Some(r_contour);
        let diff = r_sum_mods - self.slots[r_contour].rel_x - self.slots[cur].r_ext_rel_x;
        self.slots[r_ext].rel_x += diff;
        self.slots[r_ext].prelim -= diff;
        self.slots[cur].r_ext = self.slots[left_sib].r_ext;
        self.slots[cur].r_ext_rel_x = self.slots[left_sib].r_ext_rel_x;
    }

    fn shift_change(&mut self, kids: &[usize]) {
        let mut last_shift_sum = 0.0;
        let mut last_change_sum = 0.0;
        for &kid in kids {
            let slot = &mut self.slots[kid];
            let shift_sum = last_shift_sum + slot.shift;
            let change_sum = last_change_sum + shift_sum + slot.change;
            slot.rel_x += change_sum;
            last_shift_sum = shift_sum;
            last_change_sum = change_sum;
        }
    }

    /// Centers the parent over its outermost children.
    fn position_root(&mut self, w: usize, kids: &[usize]) {
        let (Some(&k0), Some(&kf)) = (kids.first(), kids.last()) else {
            return;
        };
        let (first, last) = (&self.slots[k0], &self.slots[kf]);
        let prelim = (first.prelim + first.rel_x - first.size[0] / 2.0
            + last.rel_x
            + last.prelim
            + last.size[0] / 2.0)
            / 2.0;
        let (l_ext, l_ext_rel_x) = (first.l_ext, first.l_ext_rel_x);
        let (r_ext, r_ext_rel_x) = (last.r_ext, last.r_ext_rel_x);
        let slot = &mut self.slots[w];
        slot.prelim = prelim;
        slot.l_ext = l_ext;
        slot.l_ext_rel_x = l_ext_rel_x;
        slot.r_ext = r_ext;
        slot.r_ext_rel_x = r_ext_rel_x;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    /// Every pair of boxes whose depth ranges overlap must not overlap in
    /// breadth either.
    fn assert_no_overlap(tree: &FlexTree) {
        for a in 0..tree.len() {
            for b in (a + 1)..tree.len() {
                let (sa, sb) = (&tree.slots[a], &tree.slots[b]);
                let depth_overlap = sa.y < sb.y + sb.size[1] - EPS && sb.y < sa.y + sa.size[1] - EPS;
                if !depth_overlap {
                    continue;
                }
                let gap = (sa.x - sb.x).abs() - (sa.size[0] + sb.size[0]) / 2.0;
                assert!(gap > -EPS, "nodes {a} and {b} overlap by {}", -gap);
            }
        }
    }

    #[test]
    fn single_node_sits_at_origin() {
        let mut tree = FlexTree::default();
        tree.add(None, [40.0, 20.0]);
        tree.layout(|_, _| 0.0);
        assert_eq!(tree.position(0), (0.0, 0.0));
    }

    #[test]
    fn two_children_straddle_the_parent() {
        let mut tree = FlexTree::default();
        let root = tree.add(None, [10.0, 10.0]);
        let a = tree.add(Some(root), [10.0, 10.0]);
        let b = tree.add(Some(root), [10.0, 10.0]);
        tree.layout(|_, _| 0.0);
        assert_eq!(tree.position(root), (0.0, 0.0));
        let (ax, ay) = tree.position(a);
        let (bx, by) = tree.position(b);
        assert_close(ax, -5.0);
        assert_close(bx, 5.0);
        assert_close(ay, 10.0);
        assert_close(by, 10.0);
    }

    #[test]
    fn three_children_are_evenly_packed() {
        let mut tree = FlexTree::default();
        let root = tree.add(None, [270.0, 210.0]);
        let kids: Vec<usize> = (0..3).map(|_| tree.add(Some(root), [270.0, 210.0])).collect();
        tree.layout(|_, _| 0.0);
        assert_close(tree.position(kids[0]).0, -270.0);
        assert_close(tree.position(kids[1]).0, 0.0);
        assert_close(tree.position(kids[2]).0, 270.0);
    }

    #[test]
    fn cousins_get_the_spacing_gap() {
        let mut tree = FlexTree::default();
        let root = tree.add(None, [10.0, 10.0]);
        let a = tree.add(Some(root), [10.0, 10.0]);
        let b = tree.add(Some(root), [10.0, 10.0]);
        let a1 = tree.add(Some(a), [30.0, 10.0]);
        let b1 = tree.add(Some(b), [30.0, 10.0]);
        let parents = [None, Some(0), Some(0), Some(1), Some(2)];
        tree.layout(|l, r| if parents[l] == parents[r] { 0.0 } else { 7.0 });

        let gap = tree.position(b1).0 - tree.position(a1).0 - 30.0;
        assert!(gap >= 7.0 - EPS, "gap {gap}");
        // Each parent stays centered over its only child.
        assert_close(tree.position(a).0, tree.position(a1).0);
        assert_close(tree.position(b).0, tree.position(b1).0);
        assert_close(tree.position(root).0, 0.0);
    }

    #[test]
    fn parent_is_centered_over_children() {
        let mut tree = FlexTree::default();
        let root = tree.add(None, [50.0, 10.0]);
        let a = tree.add(Some(root), [20.0, 10.0]);
        let _ = tree.add(Some(root), [60.0, 10.0]);
        let c = tree.add(Some(root), [40.0, 10.0]);
        tree.layout(|_, _| 0.0);
        let left = tree.position(a).0 - 10.0;
        let right = tree.position(c).0 + 20.0;
        assert_close((left + right) / 2.0, tree.position(root).0);
        assert_close(right - left, 120.0);
    }

    #[test]
    fn variable_sizes_never_overlap() {
        let mut tree = FlexTree::default();
        let root = tree.add(None, [120.0, 40.0]);
        let mut frontier = vec![root];
        let mut seed = 7u32;
        for _ in 0..4 {
            let mut next = Vec::new();
            for &parent in &frontier {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let fan = 1 + (seed >> 16) % 4;
                for _ in 0..fan {
                    seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                    let w = 20.0 + ((seed >> 16) % 90) as f32;
                    let h = 15.0 + ((seed >> 8) % 50) as f32;
                    next.push(tree.add(Some(parent), [w, h]));
                }
            }
            frontier = next;
        }
        tree.layout(|_, _| 0.0);
        assert_eq!(tree.position(root), (0.0, 0.0));
        assert_no_overlap(&tree);
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let mut tree = FlexTree::default();
        let mut parent = tree.add(None, [10.0, 10.0]);
        for _ in 0..50_000 {
            parent = tree.add(Some(parent), [10.0, 10.0]);
        }
        tree.layout(|_, _| 0.0);
        let (x, y) = tree.position(parent);
        assert_close(x, 0.0);
        assert_close(y, 500_000.0);
    }
}
