use crate::chart::OrgChart;
use crate::config::{ChartConfig, load_config};
use crate::ir::{Connection, Orientation, parse_records};
use crate::layout_dump::{write_layout_dump, write_layout_dump_to};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "orgchart", version, about = "Org chart layout engine")]
pub struct Args {
    /// Records file (JSON array) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout JSON. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Connections JSON file (array of {from, to, label})
    #[arg(long = "connections")]
    pub connections: Option<PathBuf>,

    /// Orientation: top, bottom, left or right
    #[arg(short = 'l', long = "layout", value_parser = parse_orientation)]
    pub layout: Option<Orientation>,

    /// Disable compact packing of leaf siblings
    #[arg(long = "no-compact")]
    pub no_compact: bool,

    /// Pack leaf-only teams into collapsible group boxes
    #[arg(long = "compact-no-children")]
    pub compact_no_children: bool,

    /// Expand every node before laying out
    #[arg(long = "expand-all")]
    pub expand_all: bool,

    /// Viewport width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Viewport height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,
}

fn parse_orientation(value: &str) -> std::result::Result<Orientation, String> {
    Orientation::from_token(value).ok_or_else(|| format!("unknown layout '{value}'"))
}

pub fn run() -> Result<()> {
    run_with(Args::parse())
}

pub fn run_with(args: Args) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_args(&mut config, &args);

    let input = read_input(args.input.as_deref())?;
    let connections = match args.connections.as_deref() {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading connections {}", path.display()))?;
            parse_connections(&text)?
        }
        None => Vec::new(),
    };

    let mut chart = build_chart(&input, connections, config)?;
    if args.expand_all {
        chart.expand_all();
    }
    let Some(layout) = chart.layout() else {
        return Err(anyhow::anyhow!("No records found in input"));
    };
    tracing::debug!(nodes = layout.nodes.len(), "layout ready");

    match args.output.as_deref() {
        Some(path) => write_layout_dump(path, layout)?,
        None => write_layout_dump_to(io::stdout().lock(), layout)?,
    }
    Ok(())
}

fn apply_args(config: &mut ChartConfig, args: &Args) {
    if let Some(orientation) = args.layout {
        config.layout.orientation = orientation;
    }
    if args.no_compact {
        config.compact.enabled = false;
    }
    if args.compact_no_children {
        config.compact.no_children = true;
    }
    if let Some(width) = args.width {
        config.viewport.width = width;
    }
    if let Some(height) = args.height {
        config.viewport.height = height;
    }
}

/// Parses the records document and builds a chart over it.
pub fn build_chart(
    input: &str,
    connections: Vec<Connection>,
    config: ChartConfig,
) -> Result<OrgChart> {
    let value: serde_json::Value = match serde_json::from_str(input) {
        Ok(value) => value,
        Err(_) => json5::from_str(input).context("records are neither JSON nor JSON5")?,
    };
    let records = parse_records(
        value,
        &config.data.node_id_key,
        &config.data.parent_node_id_key,
    )?;
    Ok(OrgChart::new(records, config)?.with_connections(connections))
}

fn parse_connections(text: &str) -> Result<Vec<Connection>> {
    serde_json::from_str(text).context("connections must be a JSON array of {from, to}")
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("reading records {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORG: &str = r#"[
        {"id": "ceo", "parentId": null, "name": "Ada"},
        {"id": "cto", "parentId": "ceo"},
        {"id": "cfo", "parentId": "ceo"},
        {"id": "dev", "parentId": "cto"}
    ]"#;

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "orgchart",
            "-i",
            "org.json",
            "--layout",
            "lr",
            "--no-compact",
            "--expand-all",
            "-w",
            "1024",
        ])
        .unwrap();
        assert_eq!(args.layout, Some(Orientation::Left));
        let mut config = ChartConfig::default();
        apply_args(&mut config, &args);
        assert!(!config.compact.enabled);
        assert_eq!(config.viewport.width, 1024.0);
        assert_eq!(config.viewport.height, 600.0);
        assert!(args.expand_all);
    }

    #[test]
    fn rejects_unknown_layout() {
        assert!(Args::try_parse_from(["orgchart", "--layout", "diagonal"]).is_err());
    }

    #[test]
    fn builds_chart_from_json() {
        let mut chart = build_chart(ORG, Vec::new(), ChartConfig::default()).unwrap();
        chart.expand_all();
        let layout = chart.layout().unwrap();
        assert_eq!(layout.nodes.len(), 4);
        assert_eq!(layout.nodes[0].id, "ceo");
    }

    #[test]
    fn honours_custom_keys() {
        let mut config = ChartConfig::default();
        config.data.node_id_key = "key".into();
        config.data.parent_node_id_key = "boss".into();
        let input = r#"[{key: 1}, {key: 2, boss: 1}]"#;
        let mut chart = build_chart(input, Vec::new(), config).unwrap();
        assert_eq!(chart.layout().unwrap().nodes.len(), 2);
    }

    #[test]
    fn connections_file_shape() {
        let conns = parse_connections(r#"[{"from": "cto", "to": "cfo", "label": "budget"}]"#).unwrap();
        assert_eq!(conns[0].label, "budget");
        assert!(parse_connections("{}").is_err());
    }

    #[test]
    fn invalid_records_surface_errors() {
        let input = r#"[{"id": "a", "parentId": "ghost"}]"#;
        let err = build_chart(input, Vec::new(), ChartConfig::default()).unwrap_err();
        assert!(err.to_string().contains("ghost"), "{err}");
    }
}
