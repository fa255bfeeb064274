use crate::error::{ChartError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Direction the tree grows in, named after the side the root sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Top,
    Right,
    Bottom,
    Left,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Top,
        Orientation::Right,
        Orientation::Bottom,
        Orientation::Left,
    ];

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "top" | "tb" | "td" => Some(Self::Top),
            "bottom" | "bt" => Some(Self::Bottom),
            "left" | "lr" => Some(Self::Left),
            "right" | "rl" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Left => "left",
        }
    }

    /// Left and right layouts place siblings along the vertical axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Payload keys that seed the view state the first time an id is seen.
pub const SEED_EXPANDED: &str = "_expanded";
pub const SEED_CENTERED: &str = "_centered";
pub const SEED_HIGHLIGHTED: &str = "_highlighted";
pub const SEED_COMPACT_EXPANDED: &str = "_compactExpanded";

/// One caller-supplied row of the flat org data.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub parent_id: Option<String>,
    pub data: Value,
}

impl Record {
    pub fn new(id: impl Into<String>, parent_id: Option<&str>) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.map(str::to_string),
            data: Value::Null,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Reads one JSON object. Ids may be strings or numbers; a missing, null
    /// or empty parent id marks a root.
    pub fn from_value(value: Value, id_key: &str, parent_key: &str) -> Result<Self> {
        let Value::Object(map) = &value else {
            return Err(ChartError::InvalidRecord {
                message: format!("expected an object, found {}", type_name(&value)),
            });
        };
        let id = match map.get(id_key).and_then(id_text) {
            Some(id) if !id.is_empty() => id,
            _ => {
                return Err(ChartError::InvalidRecord {
                    message: format!("record without a usable \"{id_key}\" field"),
                });
            }
        };
        let parent_id = map
            .get(parent_key)
            .and_then(id_text)
            .filter(|parent| !parent.is_empty());
        Ok(Self {
            id,
            parent_id,
            data: value,
        })
    }

    /// Boolean payload flag, when the payload is an object carrying one.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.data.get(key).and_then(Value::as_bool)
    }
}

/// Parses a JSON array of record objects.
pub fn parse_records(value: Value, id_key: &str, parent_key: &str) -> Result<Vec<Record>> {
    let Value::Array(items) = value else {
        return Err(ChartError::InvalidRecord {
            message: format!("expected an array of records, found {}", type_name(&value)),
        });
    };
    items
        .into_iter()
        .map(|item| Record::from_value(item, id_key, parent_key))
        .collect()
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Non-tree link between two nodes, drawn only while both ends are visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: String,
}

impl Connection {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: String::new(),
        }
    }
}
