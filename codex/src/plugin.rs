//! Plugin manifests.
//!
//! Each installed plugin lives in its own directory under the plugins root
//! and carries a `plugin.yaml` manifest declaring what it provides. View
//! plugins additionally declare one entry per view type. Production builds
//! also ship a generated `manifest.json` at the plugins root, mapping view
//! ids to compiled component paths.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::Error;

/// The manifest file name expected inside every plugin directory.
pub const PLUGIN_MANIFEST_FILE: &str = "plugin.yaml";

/// The generated production manifest at the plugins root.
pub const COMPILED_MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    #[default]
    View,
    Theme,
    Integration,
}

/// One view declared by a plugin manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewManifestEntry {
    /// The view type identifier this entry provides, e.g. `kanban`.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub config_schema: Option<JsonValue>,
    /// Component source path relative to the plugin directory. Defaults to
    /// `views/<id>.hbs` when omitted.
    #[serde(default)]
    pub component: Option<String>,
}

/// A plugin manifest as declared in `plugin.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginManifest {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(rename = "type", default)]
    pub kind: PluginKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub views: Vec<ViewManifestEntry>,
}

impl PluginManifest {
    /// Load and validate a manifest from the given `plugin.yaml` path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let wrap = |e: Error| Error::PluginManifest(path.to_path_buf(), Box::new(e));
        let content = fs::read_to_string(path)
            .map_err(|e| wrap(Error::Io(format!("while reading {}", path.display()), e)))?;
        let manifest: Self = serde_yaml::from_str(&content).map_err(|e| wrap(e.into()))?;
        manifest.validate().map_err(wrap)?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.id.is_empty() {
            return Err(Error::InvalidManifest("id is empty".to_string()));
        }
        if self.name.is_empty() {
            return Err(Error::InvalidManifest("name is empty".to_string()));
        }
        if self.version.is_empty() {
            return Err(Error::InvalidManifest("version is empty".to_string()));
        }
        for view in &self.views {
            if view.id.is_empty() {
                return Err(Error::InvalidManifest("view id is empty".to_string()));
            }
            if let Some(component) = &view.component {
                if is_path_escape(component) {
                    return Err(Error::InvalidManifest(format!(
                        "view component \"{}\" attempts path traversal",
                        component
                    )));
                }
            }
        }
        Ok(())
    }

    /// The registry entries contributed by this manifest's views.
    pub fn view_plugins(&self) -> Vec<ViewPlugin> {
        self.views
            .iter()
            .map(|view| ViewPlugin {
                id: view.id.clone(),
                name: view.name.clone(),
                description: view.description.clone().unwrap_or_default(),
                icon: view.icon.clone(),
                plugin_id: self.id.clone(),
                plugin_name: self.name.clone(),
                config_schema: view.config_schema.clone(),
            })
            .collect()
    }
}

/// A registry entry: one installable view type, read-only for the session
/// once the registry has initialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewPlugin {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub plugin_id: String,
    pub plugin_name: String,
    pub config_schema: Option<JsonValue>,
}

/// The generated production manifest: view id to compiled component path,
/// relative to the plugins root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompiledManifest {
    #[serde(default)]
    pub views: HashMap<String, CompiledViewEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledViewEntry {
    pub plugin_id: String,
    pub path: String,
}

impl CompiledManifest {
    /// Load and validate the compiled manifest. Component paths get the same
    /// traversal check as the per-plugin manifest entries.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("while reading {}", path.display()), e))?;
        let manifest: Self = serde_json::from_str(&content)?;
        for (id, entry) in &manifest.views {
            if is_path_escape(&entry.path) {
                return Err(Error::InvalidManifest(format!(
                    "compiled component path \"{}\" for view \"{}\" attempts path traversal",
                    entry.path, id
                )));
            }
        }
        Ok(manifest)
    }
}

/// Returns true if a relative path attempts to escape its root via `..` or
/// absolute components.
pub(crate) fn is_path_escape(relative: &str) -> bool {
    let path = Path::new(relative);
    if path.is_absolute() {
        return true;
    }
    path.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

#[cfg(test)]
mod test {
    use super::*;

    const MANIFEST: &str = r#"
id: boards
name: Boards
version: 1.2.0
type: view
views:
  - id: kanban
    name: Kanban board
    description: Cards in columns
  - id: corkboard
    name: Corkboard
    component: views/cork.hbs
"#;

    #[test]
    fn manifest_parses_and_yields_registry_entries() {
        let manifest: PluginManifest = serde_yaml::from_str(MANIFEST).unwrap();
        manifest.validate().unwrap();
        assert_eq!(manifest.kind, PluginKind::View);
        let entries = manifest.view_plugins();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "kanban");
        assert_eq!(entries[0].plugin_id, "boards");
        assert_eq!(entries[0].plugin_name, "Boards");
    }

    #[test]
    fn traversing_component_paths_are_rejected() {
        let mut manifest: PluginManifest = serde_yaml::from_str(MANIFEST).unwrap();
        manifest.views[1].component = Some("../../etc/passwd".to_string());
        match manifest.validate() {
            Err(Error::InvalidManifest(msg)) => assert!(msg.contains("traversal")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn traversing_compiled_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(COMPILED_MANIFEST_FILE);
        fs::write(
            &path,
            r#"{"views": {"kanban": {"plugin_id": "boards", "path": "../../outside.hbs"}}}"#,
        )
        .unwrap();
        match CompiledManifest::load(&path) {
            Err(Error::InvalidManifest(msg)) => assert!(msg.contains("traversal")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn path_escape_detection() {
        assert!(is_path_escape("../x"));
        assert!(is_path_escape("/abs"));
        assert!(!is_path_escape("views/kanban.hbs"));
    }
}
