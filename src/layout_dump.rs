use crate::layout::{ChartLayout, ViewportTransform};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub orientation: String,
    pub bounds: BoundsDump,
    pub root_transform: TransformDump,
    pub focus: Option<TransformDump>,
    pub nodes: Vec<NodeDump>,
    pub links: Vec<LinkDump>,
    pub connections: Vec<ConnectionDump>,
    pub group_boxes: Vec<GroupBoxDump>,
}

#[derive(Debug, Serialize)]
pub struct BoundsDump {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

#[derive(Debug, Serialize)]
pub struct TransformDump {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
    pub animate: bool,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub kind: String,
    pub parent: Option<String>,
    pub depth: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub x0: f32,
    pub y0: f32,
    pub direct_subordinates: usize,
    pub total_subordinates: usize,
    pub visibility: String,
    pub button: bool,
    pub button_at: Option<[f32; 2]>,
    pub highlighted: bool,
    pub highlighted_to_root: bool,
    pub compact: Option<CompactDump>,
}

#[derive(Debug, Serialize)]
pub struct CompactDump {
    pub row: usize,
    pub even: bool,
    pub anchor: bool,
    pub first_in_open_group: bool,
    pub dims: Option<[f32; 2]>,
}

#[derive(Debug, Serialize)]
pub struct LinkDump {
    pub from: String,
    pub to: String,
    pub source: [f32; 2],
    pub target: [f32; 2],
    pub mid: Option<[f32; 2]>,
    pub path: String,
    pub highlighted: bool,
}

#[derive(Debug, Serialize)]
pub struct ConnectionDump {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct GroupBoxDump {
    pub parent: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub toggle_button: [f32; 2],
}

fn point((x, y): (f32, f32)) -> [f32; 2] {
    [x, y]
}

impl From<&ViewportTransform> for TransformDump {
    fn from(t: &ViewportTransform) -> Self {
        Self {
            translate_x: t.translate_x,
            translate_y: t.translate_y,
            scale: t.scale,
            animate: t.animate,
        }
    }
}

impl LayoutDump {
    pub fn from_layout(layout: &ChartLayout) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                kind: format!("{:?}", node.kind),
                parent: node.parent.clone(),
                depth: node.depth,
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                x0: node.x0,
                y0: node.y0,
                direct_subordinates: node.direct_subordinates,
                total_subordinates: node.total_subordinates,
                visibility: format!("{:?}", node.visibility),
                button: node.button,
                button_at: node.button_at.map(point),
                highlighted: node.highlighted,
                highlighted_to_root: node.highlighted_to_root,
                compact: node.compact.map(|slot| CompactDump {
                    row: slot.row,
                    even: slot.even,
                    anchor: slot.anchor,
                    first_in_open_group: node.first_in_open_group,
                    dims: slot.anchor.then_some(slot.dims),
                }),
            })
            .collect();

        let links = layout
            .links
            .iter()
            .map(|link| LinkDump {
                from: link.from.clone(),
                to: link.to.clone(),
                source: point(link.source),
                target: point(link.target),
                mid: link.mid.map(point),
                path: link.path.clone(),
                highlighted: link.highlighted,
            })
            .collect();

        let connections = layout
            .connections
            .iter()
            .map(|conn| ConnectionDump {
                from: conn.from.clone(),
                to: conn.to.clone(),
                label: conn.label.clone(),
                path: conn.path.clone(),
            })
            .collect();

        let group_boxes = layout
            .group_boxes
            .iter()
            .map(|group| GroupBoxDump {
                parent: group.parent.clone(),
                x: group.x,
                y: group.y,
                width: group.width,
                height: group.height,
                toggle_button: point(group.toggle_button),
            })
            .collect();

        LayoutDump {
            orientation: layout.orientation.as_str().to_string(),
            bounds: BoundsDump {
                min_x: layout.bounds.min_x,
                max_x: layout.bounds.max_x,
                min_y: layout.bounds.min_y,
                max_y: layout.bounds.max_y,
            },
            root_transform: TransformDump::from(&layout.root_transform),
            focus: layout.focus.as_ref().map(TransformDump::from),
            nodes,
            links,
            connections,
            group_boxes,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &ChartLayout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

/// Same as [`write_layout_dump`] for an already open sink, e.g. stdout.
pub fn write_layout_dump_to(writer: impl Write, layout: &ChartLayout) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, &LayoutDump::from_layout(layout))?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
