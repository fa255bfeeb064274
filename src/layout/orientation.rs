use super::*;

/// Everything that differs between the four orientations.
///
/// The flextree pass always works top-down; `swap` maps its canonical
/// coordinates to screen space. In screen space a node's `(x, y)` is the
/// middle of the edge that faces its parent: top center for `Top`, bottom
/// center for `Bottom`, left middle for `Left`, right middle for `Right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutBinding {
    pub orientation: Orientation,
}

pub fn binding(orientation: Orientation) -> LayoutBinding {
    LayoutBinding { orientation }
}

impl LayoutBinding {
    pub fn is_horizontal(&self) -> bool {
        self.orientation.is_horizontal()
    }

    pub fn swap(&self, x: f32, y: f32) -> (f32, f32) {
        match self.orientation {
            Orientation::Top => (x, y),
            Orientation::Bottom => (x, -y),
            Orientation::Left => (y, x),
            Orientation::Right => (-y, x),
        }
    }

    /// Flextree box: `[breadth, depth extent]`.
    pub fn flex_size(&self, width: f32, height: f32, siblings: f32, children: f32) -> [f32; 2] {
        if self.is_horizontal() {
            [height + siblings, width + children]
        } else {
            [width + siblings, height + children]
        }
    }

    pub fn compact_column(&self, width: f32, height: f32) -> f32 {
        if self.is_horizontal() { height } else { width }
    }

    pub fn compact_row(&self, width: f32, height: f32) -> f32 {
        if self.is_horizontal() { width } else { height }
    }

    pub fn node_left_x(&self, b: &NodeBox) -> f32 {
        match self.orientation {
            Orientation::Top | Orientation::Bottom => -b.width / 2.0,
            Orientation::Left => 0.0,
            Orientation::Right => -b.width,
        }
    }

    pub fn node_right_x(&self, b: &NodeBox) -> f32 {
        match self.orientation {
            Orientation::Top | Orientation::Bottom => b.width / 2.0,
            Orientation::Left => b.width,
            Orientation::Right => 0.0,
        }
    }

    pub fn node_top_y(&self, b: &NodeBox) -> f32 {
        match self.orientation {
            Orientation::Top => 0.0,
            Orientation::Bottom => -b.height,
            Orientation::Left | Orientation::Right => -b.height / 2.0,
        }
    }

    pub fn node_bottom_y(&self, b: &NodeBox) -> f32 {
        match self.orientation {
            Orientation::Top => b.height,
            Orientation::Bottom => 0.0,
            Orientation::Left | Orientation::Right => b.height / 2.0,
        }
    }

    /// Absolute `(min_x, max_x, min_y, max_y)` of the node rectangle.
    pub fn extents(&self, b: &NodeBox) -> (f32, f32, f32, f32) {
        (
            b.x + self.node_left_x(b),
            b.x + self.node_right_x(b),
            b.y + self.node_top_y(b),
            b.y + self.node_bottom_y(b),
        )
    }

    /// Top-left corner of the node rectangle.
    pub fn node_origin(&self, b: &NodeBox) -> (f32, f32) {
        (b.x + self.node_left_x(b), b.y + self.node_top_y(b))
    }

    /// Middle of the edge facing the node's children.
    pub fn link_join(&self, b: &NodeBox) -> (f32, f32) {
        match self.orientation {
            Orientation::Top => (b.x, b.y + b.height),
            Orientation::Bottom => (b.x, b.y - b.height),
            Orientation::Left => (b.x + b.width, b.y),
            Orientation::Right => (b.x - b.width, b.y),
        }
    }

    /// Middle of the edge facing the node's parent.
    pub fn link_point(&self, b: &NodeBox) -> (f32, f32) {
        (b.x, b.y)
    }

    /// Where a parent-child edge leaves the parent.
    pub fn link_parent(&self, parent: &NodeBox) -> (f32, f32) {
        self.link_join(parent)
    }

    /// Side of a compact member its edge attaches to: the outer side of its
    /// pair-grid column.
    pub fn link_compact_start(&self, b: &NodeBox, even: bool) -> (f32, f32) {
        let side = if even { 1.0 } else { -1.0 };
        match self.orientation {
            Orientation::Top => (b.x + side * b.width / 2.0, b.y + b.height / 2.0),
            Orientation::Bottom => (b.x + side * b.width / 2.0, b.y - b.height / 2.0),
            Orientation::Left => (b.x + b.width / 2.0, b.y + side * b.height / 2.0),
            Orientation::Right => (b.x - b.width / 2.0, b.y + side * b.height / 2.0),
        }
    }

    /// Point on the cluster's center line where compact edges fan out.
    pub fn compact_link_mid(&self, anchor: &NodeBox, cluster_breadth: f32, pair: f32) -> (f32, f32) {
        let offset = cluster_breadth / 4.0 + pair / 4.0;
        if self.is_horizontal() {
            (anchor.x, anchor.y + offset)
        } else {
            (anchor.x + offset, anchor.y)
        }
    }

    /// Expand button position relative to the node origin.
    pub fn button(&self, b: &NodeBox) -> (f32, f32) {
        match self.orientation {
            Orientation::Top => (b.width / 2.0, b.height),
            Orientation::Bottom => (b.width / 2.0, 0.0),
            Orientation::Left => (b.width, b.height / 2.0),
            Orientation::Right => (0.0, b.height / 2.0),
        }
    }

    /// Absolute expand button position: the middle of the edge facing the
    /// node's children.
    pub fn button_at(&self, b: &NodeBox) -> (f32, f32) {
        let (ox, oy) = self.node_origin(b);
        let (dx, dy) = self.button(b);
        (ox + dx, oy + dy)
    }

    /// Initial placement of the root inside a `width` x `height` viewport.
    pub fn center_transform(
        &self,
        width: f32,
        height: f32,
        root_margin: f32,
        scale: f32,
    ) -> ViewportTransform {
        let (translate_x, translate_y) = match self.orientation {
            Orientation::Top => (width / 2.0, root_margin),
            Orientation::Bottom => (width / 2.0, height - root_margin),
            Orientation::Left => (root_margin, height / 2.0),
            Orientation::Right => (width - root_margin, height / 2.0),
        };
        ViewportTransform {
            translate_x,
            translate_y,
            scale,
            animate: false,
        }
    }

    /// Edge path from a child point `s` back to its parent point `t`.
    pub fn edge_path(&self, s: (f32, f32), t: (f32, f32), m: Option<(f32, f32)>, sy: f32) -> String {
        if self.is_horizontal() {
            paths::hdiagonal(s, t, m)
        } else {
            paths::diagonal(s, t, m, sy)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(x: f32, y: f32) -> NodeBox {
        NodeBox {
            x,
            y,
            width: 200.0,
            height: 100.0,
        }
    }

    #[test]
    fn swaps() {
        assert_eq!(binding(Orientation::Top).swap(3.0, 4.0), (3.0, 4.0));
        assert_eq!(binding(Orientation::Bottom).swap(3.0, 4.0), (3.0, -4.0));
        assert_eq!(binding(Orientation::Left).swap(3.0, 4.0), (4.0, 3.0));
        assert_eq!(binding(Orientation::Right).swap(3.0, 4.0), (-4.0, 3.0));
    }

    #[test]
    fn flex_sizes_follow_the_depth_axis() {
        assert_eq!(binding(Orientation::Top).flex_size(250.0, 150.0, 20.0, 60.0), [270.0, 210.0]);
        assert_eq!(binding(Orientation::Left).flex_size(250.0, 150.0, 20.0, 60.0), [170.0, 310.0]);
        assert_eq!(binding(Orientation::Right).compact_column(250.0, 150.0), 150.0);
        assert_eq!(binding(Orientation::Bottom).compact_row(250.0, 150.0), 150.0);
    }

    #[test]
    fn extents_per_orientation() {
        let b = node(0.0, 0.0);
        assert_eq!(binding(Orientation::Top).extents(&b), (-100.0, 100.0, 0.0, 100.0));
        assert_eq!(binding(Orientation::Bottom).extents(&b), (-100.0, 100.0, -100.0, 0.0));
        assert_eq!(binding(Orientation::Left).extents(&b), (0.0, 200.0, -50.0, 50.0));
        assert_eq!(binding(Orientation::Right).extents(&b), (-200.0, 0.0, -50.0, 50.0));
    }

    #[test]
    fn parent_link_points_face_children() {
        let parent = node(10.0, 20.0);
        assert_eq!(binding(Orientation::Top).link_parent(&parent), (10.0, 120.0));
        assert_eq!(binding(Orientation::Bottom).link_parent(&parent), (10.0, -80.0));
        assert_eq!(binding(Orientation::Left).link_parent(&parent), (210.0, 20.0));
        assert_eq!(binding(Orientation::Right).link_parent(&parent), (-190.0, 20.0));
    }

    #[test]
    fn buttons_sit_on_the_child_facing_edge() {
        let b = node(10.0, 20.0);
        for orientation in Orientation::ALL {
            let binding = binding(orientation);
            assert_eq!(binding.button_at(&b), binding.link_join(&b), "{orientation:?}");
        }
        assert_eq!(binding(Orientation::Right).node_origin(&b), (-190.0, -30.0));
    }

    #[test]
    fn compact_edges_attach_on_outer_side() {
        let b = node(0.0, 0.0);
        let top = binding(Orientation::Top);
        assert_eq!(top.link_compact_start(&b, true), (100.0, 50.0));
        assert_eq!(top.link_compact_start(&b, false), (-100.0, 50.0));
        assert_eq!(top.compact_link_mid(&b, 600.0, 100.0), (175.0, 0.0));
        let left = binding(Orientation::Left);
        assert_eq!(left.compact_link_mid(&b, 600.0, 100.0), (0.0, 175.0));
    }

    #[test]
    fn root_placement() {
        let t = binding(Orientation::Top).center_transform(800.0, 600.0, 40.0, 1.0);
        assert_eq!((t.translate_x, t.translate_y), (400.0, 40.0));
        let t = binding(Orientation::Right).center_transform(800.0, 600.0, 40.0, 1.0);
        assert_eq!((t.translate_x, t.translate_y), (760.0, 300.0));
        let t = binding(Orientation::Bottom).center_transform(800.0, 600.0, 40.0, 2.0);
        assert_eq!((t.translate_x, t.translate_y, t.scale), (400.0, 560.0, 2.0));
    }

    #[test]
    fn edge_path_follows_orientation() {
        let vertical = binding(Orientation::Top).edge_path((0.0, 300.0), (0.0, 100.0), None, 30.0);
        assert!(vertical.contains("L 0.00 330.00"), "{vertical}");
        let horizontal = binding(Orientation::Left).edge_path((300.0, 0.0), (100.0, 0.0), None, 30.0);
        assert!(horizontal.starts_with("M 300.00 0.00"), "{horizontal}");
        assert!(!horizontal.contains("330.00"));
    }
}
