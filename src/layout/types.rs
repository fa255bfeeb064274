use crate::ir::Orientation;
use crate::state::{NodeKind, NodeVisibility};

/// Box of a placed node, in screen space, anchored the way the orientation
/// anchors nodes (see [`super::LayoutBinding`]).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompactSlot {
    pub row: usize,
    /// Left column of a pair grid.
    pub even: bool,
    pub anchor: bool,
    /// Cluster dimensions; zero for everyone but the anchor.
    pub dims: [f32; 2],
}

#[derive(Debug, Clone)]
pub struct NodeLayout {
    pub id: String,
    pub kind: NodeKind,
    pub parent: Option<String>,
    pub depth: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Position on the previous pass, for enter/update transitions.
    pub x0: f32,
    pub y0: f32,
    pub direct_subordinates: usize,
    pub total_subordinates: usize,
    pub visibility: NodeVisibility,
    /// Expand button is drawn.
    pub button: bool,
    /// Center of the expand button, when drawn.
    pub button_at: Option<(f32, f32)>,
    pub highlighted: bool,
    pub highlighted_to_root: bool,
    pub first_in_open_group: bool,
    pub compact: Option<CompactSlot>,
}

impl NodeLayout {
    pub fn node_box(&self) -> NodeBox {
        NodeBox {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Parent to child edge.
#[derive(Debug, Clone)]
pub struct LinkLayout {
    pub from: String,
    pub to: String,
    pub source: (f32, f32),
    pub target: (f32, f32),
    /// Bend point for edges into a compact cluster.
    pub mid: Option<(f32, f32)>,
    pub path: String,
    pub highlighted: bool,
}

#[derive(Debug, Clone)]
pub struct ConnectionLayout {
    pub from: String,
    pub to: String,
    pub label: String,
    pub source: (f32, f32),
    pub target: (f32, f32),
    pub path: String,
}

/// Rectangle drawn around an open group-box cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactGroupBox {
    pub parent: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Close button of the open group, past the box's far side.
    pub toggle_button: (f32, f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
    pub animate: bool,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            scale: 1.0,
            animate: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChartLayout {
    pub orientation: Orientation,
    /// Visible nodes, breadth first from the root.
    pub nodes: Vec<NodeLayout>,
    pub links: Vec<LinkLayout>,
    pub connections: Vec<ConnectionLayout>,
    pub group_boxes: Vec<CompactGroupBox>,
    pub bounds: Bounds,
    /// Initial placement of the root inside the viewport.
    pub root_transform: ViewportTransform,
    /// Set when the pass consumed a centering request.
    pub focus: Option<ViewportTransform>,
}

impl ChartLayout {
    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn link_to(&self, id: &str) -> Option<&LinkLayout> {
        self.links.iter().find(|link| link.to == id)
    }
}
