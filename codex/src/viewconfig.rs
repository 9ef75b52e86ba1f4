//! Typed per-view-type configuration shapes.
//!
//! A view definition's `config` block is interpreted according to its
//! `view_type` discriminator. Unrecognized view types keep their config as an
//! open mapping so that plugin-defined views are not constrained by the core
//! shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use serde_yaml::Value as YamlValue;

use crate::{value::yaml_to_json_map, Error, ViewQuery};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KanbanColumn {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KanbanConfig {
    #[serde(default)]
    pub columns: Vec<KanbanColumn>,
    /// The property whose value assigns a file to a column. Defaults to
    /// `status` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskListConfig {
    /// The boolean property marking a task as done. Defaults to `done`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_property: Option<String>,
    #[serde(default)]
    pub show_completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GalleryConfig {
    /// The property holding each card's image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollupOp {
    Count,
    Sum,
    Average,
    Min,
    Max,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollupConfig {
    /// The numeric property being aggregated. Not required for `count`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<RollupOp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorkboardConfig {
    /// The property that colors each card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_property: Option<String>,
}

/// One row of a dashboard layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub panels: Vec<DashboardPanel>,
}

/// One panel inside a dashboard row: an embedded view with its own type and,
/// optionally, its own query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardPanel {
    pub view_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<ViewQuery>,
    /// Relative width of the panel within its row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<u32>,
}

/// The typed view of a definition's `config` block, discriminated by the
/// definition's `view_type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ViewConfig {
    Kanban(KanbanConfig),
    TaskList(TaskListConfig),
    Gallery(GalleryConfig),
    Rollup(RollupConfig),
    Corkboard(CorkboardConfig),
    /// Config for a view type the core does not know; kept as an open record.
    Other(JsonMap<String, JsonValue>),
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self::Other(JsonMap::new())
    }
}

impl ViewConfig {
    /// Interpret a raw YAML config block according to the given view type.
    /// An absent (`Null`) block yields the type's default shape.
    pub fn from_yaml(view_type: &str, value: YamlValue) -> Result<Self, Error> {
        if !matches!(value, YamlValue::Null | YamlValue::Mapping(_)) {
            return Err(Error::ConfigNotAMapping);
        }
        Ok(match view_type {
            "kanban" => Self::Kanban(from_yaml_or_default(value)?),
            "task-list" => Self::TaskList(from_yaml_or_default(value)?),
            "gallery" => Self::Gallery(from_yaml_or_default(value)?),
            "rollup" => Self::Rollup(from_yaml_or_default(value)?),
            "corkboard" => Self::Corkboard(from_yaml_or_default(value)?),
            _ => Self::Other(yaml_to_json_map(value)?),
        })
    }
}

fn from_yaml_or_default<T>(value: YamlValue) -> Result<T, Error>
where
    T: Default + serde::de::DeserializeOwned,
{
    match value {
        YamlValue::Null => Ok(T::default()),
        other => Ok(serde_yaml::from_value(other)?),
    }
}
