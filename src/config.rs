use crate::ir::Orientation;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub orientation: Orientation,
    /// Distance between the root and the viewport edge it grows from.
    pub root_margin: f32,
    /// Vertical offset of the bend in parent-child edge paths.
    pub link_y_offset: f32,
    /// Depth down to which nodes start expanded on the first build.
    pub expand_level: u32,
    /// Re-center on a node after its expand button is toggled.
    pub set_active_node_centered: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Top,
            root_margin: 40.0,
            link_y_offset: 30.0,
            expand_level: 1,
            set_active_node_centered: true,
        }
    }
}

/// Fallback node metrics used when no callback overrides them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub width: f32,
    pub height: f32,
    pub siblings_margin: f32,
    pub children_margin: f32,
    pub neighbour_margin: f32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            width: 250.0,
            height: 150.0,
            siblings_margin: 20.0,
            children_margin: 60.0,
            neighbour_margin: 80.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactConfig {
    pub enabled: bool,
    /// Group-box packing for parents whose children have no subordinates.
    pub no_children: bool,
    pub margin_pair: f32,
    pub margin_between: f32,
    /// Padding inside a group box.
    pub no_children_margin: f32,
    pub toggle_button_margin: f32,
    /// Pair-grid clusters snap under their parent only when the drift is
    /// smaller than this.
    pub recenter_threshold: f32,
}

impl Default for CompactConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            no_children: false,
            margin_pair: 100.0,
            margin_between: 20.0,
            no_children_margin: 15.0,
            toggle_button_margin: 10.0,
            recenter_threshold: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
    pub scale_extent: [f32; 2],
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            scale_extent: [0.001, 20.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub node_id_key: String,
    pub parent_node_id_key: String,
    /// Hang several parentless records under one synthetic root instead of
    /// rejecting them.
    pub merge_roots: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            node_id_key: "id".to_string(),
            parent_node_id_key: "parentId".to_string(),
            merge_roots: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartConfig {
    pub layout: LayoutConfig,
    pub node: NodeConfig,
    pub compact: CompactConfig,
    pub viewport: ViewportConfig,
    pub data: DataConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    layout: Option<String>,
    root_margin: Option<NumberOrString>,
    link_y_offset: Option<NumberOrString>,
    expand_level: Option<u32>,
    set_active_node_centered: Option<bool>,
    node_width: Option<NumberOrString>,
    node_height: Option<NumberOrString>,
    siblings_margin: Option<NumberOrString>,
    children_margin: Option<NumberOrString>,
    neighbour_margin: Option<NumberOrString>,
    compact: Option<bool>,
    compact_no_children: Option<bool>,
    compact_margin_pair: Option<NumberOrString>,
    compact_margin_between: Option<NumberOrString>,
    compact_no_children_margin: Option<NumberOrString>,
    compact_toggle_button_margin: Option<NumberOrString>,
    compact_recenter_threshold: Option<NumberOrString>,
    svg_width: Option<NumberOrString>,
    svg_height: Option<NumberOrString>,
    scale_extent: Option<[f32; 2]>,
    node_id: Option<String>,
    parent_node_id: Option<String>,
    merge_roots: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f32),
    String(String),
}

impl NumberOrString {
    fn as_f32(&self) -> Option<f32> {
        match self {
            NumberOrString::Number(val) => Some(*val),
            NumberOrString::String(val) => val.trim().trim_end_matches("px").parse::<f32>().ok(),
        }
        .filter(|val| val.is_finite())
    }
}

fn set_f32(target: &mut f32, value: Option<NumberOrString>) {
    if let Some(v) = value.as_ref().and_then(NumberOrString::as_f32) {
        *target = v;
    }
}

/// Parses config text as JSON, falling back to JSON5 for hand-written files
/// with comments or trailing commas.
pub fn parse_config(contents: &str) -> anyhow::Result<ChartConfig> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(json_err) => json5::from_str(contents)
            .map_err(|_| anyhow::anyhow!("invalid config: {json_err}"))?,
    };
    Ok(merge_config(parsed))
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<ChartConfig> {
    let Some(path) = path else {
        return Ok(ChartConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

fn merge_config(parsed: ConfigFile) -> ChartConfig {
    let mut config = ChartConfig::default();

    if let Some(token) = parsed.layout.as_deref() {
        match Orientation::from_token(token) {
            Some(orientation) => config.layout.orientation = orientation,
            None => tracing::warn!(layout = token, "unknown layout in config, keeping default"),
        }
    }
    set_f32(&mut config.layout.root_margin, parsed.root_margin);
    set_f32(&mut config.layout.link_y_offset, parsed.link_y_offset);
    if let Some(v) = parsed.expand_level {
        config.layout.expand_level = v;
    }
    if let Some(v) = parsed.set_active_node_centered {
        config.layout.set_active_node_centered = v;
    }

    set_f32(&mut config.node.width, parsed.node_width);
    set_f32(&mut config.node.height, parsed.node_height);
    set_f32(&mut config.node.siblings_margin, parsed.siblings_margin);
    set_f32(&mut config.node.children_margin, parsed.children_margin);
    set_f32(&mut config.node.neighbour_margin, parsed.neighbour_margin);

    if let Some(v) = parsed.compact {
        config.compact.enabled = v;
    }
    if let Some(v) = parsed.compact_no_children {
        config.compact.no_children = v;
    }
    set_f32(&mut config.compact.margin_pair, parsed.compact_margin_pair);
    set_f32(&mut config.compact.margin_between, parsed.compact_margin_between);
    set_f32(&mut config.compact.no_children_margin, parsed.compact_no_children_margin);
    set_f32(
        &mut config.compact.toggle_button_margin,
        parsed.compact_toggle_button_margin,
    );
    set_f32(
        &mut config.compact.recenter_threshold,
        parsed.compact_recenter_threshold,
    );

    set_f32(&mut config.viewport.width, parsed.svg_width);
    set_f32(&mut config.viewport.height, parsed.svg_height);
    if let Some([lo, hi]) = parsed.scale_extent {
        if lo > 0.0 && lo <= hi {
            config.viewport.scale_extent = [lo, hi];
        }
    }

    if let Some(v) = parsed.node_id {
        config.data.node_id_key = v;
    }
    if let Some(v) = parsed.parent_node_id {
        config.data.parent_node_id_key = v;
    }
    if let Some(v) = parsed.merge_roots {
        config.data.merge_roots = v;
    }

    config
}
