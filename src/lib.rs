pub mod callbacks;
pub mod chart;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod state;

pub use callbacks::{ChartCallbacks, NodeInfo};
pub use chart::OrgChart;
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{ChartConfig, load_config};
pub use error::{ChartError, Result};
pub use ir::{Connection, Orientation, Record};
pub use layout::{ChartLayout, FitOptions, ViewportTransform};
