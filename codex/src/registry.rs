//! View-type to component resolution.
//!
//! The registry maps a view definition's `view_type` string to a renderable
//! [`ViewComponent`]. Resolution is strategy-ordered: the built-in dashboard
//! short-circuits everything; development builds read component sources
//! straight from plugin directories (so edits show up on the next render);
//! production builds consult the generated compiled manifest; and as a last
//! resort the conventional `<plugin>/dist/<view_type>-view.hbs` location is
//! probed. When everything fails the caller still gets a component - the
//! warning placeholder - rather than an error.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use eyre::Result;
use log::{debug, warn};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::{
    component::{dashboard_component, fallback_component, ComponentOrigin, ViewComponent},
    plugin::{
        CompiledManifest, PluginManifest, ViewPlugin, COMPILED_MANIFEST_FILE, PLUGIN_MANIFEST_FILE,
    },
    Error, BUILTIN_VIEW_TYPES,
};

/// The view type rendered by the core itself rather than by a plugin.
pub const DASHBOARD_VIEW_TYPE: &str = "dashboard";

/// Which resolution strategies apply, mirroring the build mode of the
/// hosting application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryMode {
    Development,
    #[default]
    Production,
}

#[derive(Debug, Default)]
struct RegistryIndex {
    /// View type -> registry entry, from the per-plugin manifests.
    plugins: HashMap<String, ViewPlugin>,
    /// View type -> component source path (development resolution).
    sources: HashMap<String, PathBuf>,
    /// The generated compiled manifest (production resolution).
    compiled: CompiledManifest,
}

/// The view plugin registry.
///
/// Process-wide in spirit: construct one per plugins directory and share it.
/// Initialization is lazy and idempotent; the manifest scan happens at most
/// once per registry, no matter how many callers race into it.
pub struct PluginRegistry {
    plugins_dir: PathBuf,
    mode: RegistryMode,
    index: OnceCell<RegistryIndex>,
    // Resolved components, keyed by view type. Only successful loads land
    // here; failures degrade to the fallback and are re-attempted on the
    // next call.
    components: Mutex<HashMap<String, Arc<ViewComponent>>>,
    #[cfg(test)]
    scan_count: std::sync::atomic::AtomicUsize,
}

impl PluginRegistry {
    /// Constructor. No I/O happens until [`Self::initialize`] or the first
    /// component load.
    pub fn new<P: AsRef<Path>>(plugins_dir: P, mode: RegistryMode) -> Self {
        Self {
            plugins_dir: plugins_dir.as_ref().to_path_buf(),
            mode,
            index: OnceCell::new(),
            components: Mutex::new(HashMap::new()),
            #[cfg(test)]
            scan_count: Default::default(),
        }
    }

    /// Discover installed plugins by scanning the plugins directory for
    /// manifests.
    ///
    /// Idempotent: the first caller performs the scan, concurrent callers
    /// block on the same in-flight load, and later calls are no-ops.
    pub fn initialize(&self) -> Result<()> {
        self.index
            .get_or_try_init(|| self.load_index())
            .map(|_| ())
            .map_err(Into::into)
    }

    pub fn initialized(&self) -> bool {
        self.index.get().is_some()
    }

    /// The set of view types a definition may validly declare. Before
    /// initialization this falls back to the built-in list.
    pub fn valid_view_types(&self) -> Vec<String> {
        match self.index.get() {
            Some(index) => {
                let mut types: Vec<String> = index.plugins.keys().cloned().collect();
                types.push(DASHBOARD_VIEW_TYPE.to_string());
                types.sort();
                types.dedup();
                types
            }
            None => BUILTIN_VIEW_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// The registry entry for the given view type, if a plugin provides it.
    pub fn view_plugin(&self, view_type: &str) -> Option<ViewPlugin> {
        self.index.get()?.plugins.get(view_type).cloned()
    }

    /// Whether a component can be resolved for the given view type without
    /// falling back to the placeholder.
    pub fn has_view_component(&self, view_type: &str) -> bool {
        view_type == DASHBOARD_VIEW_TYPE
            || self
                .index
                .get()
                .map(|i| i.plugins.contains_key(view_type))
                .unwrap_or(false)
    }

    /// Resolve the component for the given view type.
    ///
    /// This never fails from the caller's point of view: every resolution
    /// error is logged and the next strategy attempted, ending at the
    /// fallback placeholder. Successful loads are memoized, except in
    /// development mode where plugin sources are re-read on every call.
    pub fn load_view_component(&self, view_type: &str) -> Arc<ViewComponent> {
        if view_type == DASHBOARD_VIEW_TYPE {
            return self.memoize(view_type, dashboard_component());
        }
        if self.mode != RegistryMode::Development {
            if let Some(component) = self.cached(view_type) {
                return component;
            }
        }
        let index = match self.index.get_or_try_init(|| self.load_index()) {
            Ok(index) => index,
            Err(e) => {
                warn!("Plugin registry initialization failed: {}", e);
                return Arc::new(fallback_component(view_type));
            }
        };
        match self.resolve(view_type, index) {
            Some(component) if component.origin() == ComponentOrigin::Development => {
                Arc::new(component)
            }
            Some(component) => self.memoize(view_type, component),
            None => {
                warn!(
                    "No component could be resolved for view type \"{}\", using fallback",
                    view_type
                );
                Arc::new(fallback_component(view_type))
            }
        }
    }

    fn resolve(&self, view_type: &str, index: &RegistryIndex) -> Option<ViewComponent> {
        if self.mode == RegistryMode::Development {
            if let Some(path) = index.sources.get(view_type) {
                match fs::read_to_string(path) {
                    Ok(source) => {
                        debug!("Loaded {} component from source: {}", view_type, path.display());
                        return Some(ViewComponent::new(
                            format!("{}-view", view_type),
                            source,
                            ComponentOrigin::Development,
                        ));
                    }
                    Err(e) => {
                        warn!("Failed to read component source {}: {}", path.display(), e)
                    }
                }
            }
        }
        if self.mode == RegistryMode::Production {
            if let Some(entry) = index.compiled.views.get(view_type) {
                let path = self.plugins_dir.join(&entry.path);
                match fs::read_to_string(&path) {
                    Ok(source) => {
                        debug!("Loaded {} component from compiled manifest: {}", view_type, path.display());
                        return Some(ViewComponent::new(
                            format!("{}-view", view_type),
                            source,
                            ComponentOrigin::Compiled,
                        ));
                    }
                    Err(e) => {
                        warn!("Failed to read compiled component {}: {}", path.display(), e)
                    }
                }
            }
        }
        // Last resort: the conventional dist layout.
        if let Some(entry) = index.plugins.get(view_type) {
            let path = self
                .plugins_dir
                .join(&entry.plugin_id)
                .join("dist")
                .join(format!("{}-view.hbs", view_type));
            match fs::read_to_string(&path) {
                Ok(source) => {
                    debug!("Loaded {} component from conventional path: {}", view_type, path.display());
                    return Some(ViewComponent::new(
                        format!("{}-view", view_type),
                        source,
                        ComponentOrigin::Conventional,
                    ));
                }
                Err(e) => debug!("No component at conventional path {}: {}", path.display(), e),
            }
        }
        None
    }

    fn load_index(&self) -> Result<RegistryIndex, Error> {
        #[cfg(test)]
        self.scan_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let mut index = RegistryIndex::default();
        let pattern = self.plugins_dir.join("*").join(PLUGIN_MANIFEST_FILE);
        let pattern = pattern.to_string_lossy().to_string();
        for entry in glob::glob(&pattern).map_err(|e| Error::FilePattern(pattern.clone(), e))? {
            let manifest_path = entry?;
            let manifest = match PluginManifest::load(&manifest_path) {
                Ok(m) => m,
                Err(e) => {
                    // A broken plugin must not take the whole registry down.
                    warn!("Skipping plugin manifest {}: {}", manifest_path.display(), e);
                    continue;
                }
            };
            let plugin_dir = manifest_path
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .to_path_buf();
            debug!("Loaded plugin {} ({} view(s))", manifest.id, manifest.views.len());
            for (view, entry) in manifest.views.iter().zip(manifest.view_plugins()) {
                if index.plugins.contains_key(&entry.id) {
                    warn!(
                        "Skipping duplicate view type \"{}\" from plugin {}",
                        entry.id, entry.plugin_id
                    );
                    continue;
                }
                let source_rel = view
                    .component
                    .clone()
                    .unwrap_or_else(|| format!("views/{}.hbs", view.id));
                index.sources.insert(entry.id.clone(), plugin_dir.join(source_rel));
                index.plugins.insert(entry.id.clone(), entry);
            }
        }
        if self.mode == RegistryMode::Production {
            let manifest_path = self.plugins_dir.join(COMPILED_MANIFEST_FILE);
            match CompiledManifest::load(&manifest_path) {
                Ok(m) => index.compiled = m,
                Err(e) => debug!(
                    "No compiled plugin manifest at {}: {}",
                    manifest_path.display(),
                    e
                ),
            }
        }
        Ok(index)
    }

    fn cached(&self, view_type: &str) -> Option<Arc<ViewComponent>> {
        self.components.lock().ok()?.get(view_type).cloned()
    }

    fn memoize(&self, view_type: &str, component: ViewComponent) -> Arc<ViewComponent> {
        let component = Arc::new(component);
        if let Ok(mut cache) = self.components.lock() {
            cache.insert(view_type.to_string(), component.clone());
        }
        component
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::thread;

    const MANIFEST: &str = r#"id: boards
name: Boards
version: 0.1.0
type: view
views:
  - id: kanban
    name: Kanban board
"#;

    fn plugins_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let plugin = dir.path().join("boards");
        fs::create_dir_all(plugin.join("views")).unwrap();
        fs::write(plugin.join(PLUGIN_MANIFEST_FILE), MANIFEST).unwrap();
        fs::write(
            plugin.join("views").join("kanban.hbs"),
            "<div class=\"kanban\">{{title}}</div>",
        )
        .unwrap();
        dir
    }

    #[test]
    fn development_mode_reads_plugin_sources() {
        let dir = plugins_dir();
        let registry = PluginRegistry::new(dir.path(), RegistryMode::Development);
        registry.initialize().unwrap();
        assert!(registry.has_view_component("kanban"));
        let component = registry.load_view_component("kanban");
        assert_eq!(component.origin(), ComponentOrigin::Development);
        assert!(component.source().contains("kanban"));
    }

    #[test]
    fn development_mode_picks_up_source_edits() {
        let dir = plugins_dir();
        let registry = PluginRegistry::new(dir.path(), RegistryMode::Development);
        registry.initialize().unwrap();
        let before = registry.load_view_component("kanban");
        fs::write(
            dir.path().join("boards").join("views").join("kanban.hbs"),
            "<div class=\"kanban-v2\">{{title}}</div>",
        )
        .unwrap();
        let after = registry.load_view_component("kanban");
        assert_ne!(before.source(), after.source());
        assert!(after.source().contains("kanban-v2"));
    }

    #[test]
    fn production_mode_uses_compiled_manifest() {
        let dir = plugins_dir();
        fs::create_dir_all(dir.path().join("boards").join("build")).unwrap();
        fs::write(
            dir.path().join("boards").join("build").join("kanban.hbs"),
            "<div class=\"compiled\"></div>",
        )
        .unwrap();
        fs::write(
            dir.path().join(COMPILED_MANIFEST_FILE),
            r#"{"views": {"kanban": {"plugin_id": "boards", "path": "boards/build/kanban.hbs"}}}"#,
        )
        .unwrap();
        let registry = PluginRegistry::new(dir.path(), RegistryMode::Production);
        registry.initialize().unwrap();
        let component = registry.load_view_component("kanban");
        assert_eq!(component.origin(), ComponentOrigin::Compiled);
        assert!(component.source().contains("compiled"));
    }

    #[test]
    fn conventional_path_is_the_last_resort() {
        let dir = plugins_dir();
        fs::create_dir_all(dir.path().join("boards").join("dist")).unwrap();
        fs::write(
            dir.path().join("boards").join("dist").join("kanban-view.hbs"),
            "<div class=\"dist\"></div>",
        )
        .unwrap();
        // Production mode with no compiled manifest present.
        let registry = PluginRegistry::new(dir.path(), RegistryMode::Production);
        registry.initialize().unwrap();
        let component = registry.load_view_component("kanban");
        assert_eq!(component.origin(), ComponentOrigin::Conventional);
    }

    #[test]
    fn unknown_view_type_degrades_to_fallback() {
        let dir = plugins_dir();
        let registry = PluginRegistry::new(dir.path(), RegistryMode::Development);
        registry.initialize().unwrap();
        assert!(!registry.has_view_component("timeline"));
        let component = registry.load_view_component("timeline");
        assert!(component.is_fallback());
        assert!(component.source().contains("Install or enable"));
    }

    #[test]
    fn dashboard_is_always_available() {
        let dir = tempfile::tempdir().unwrap();
        let registry = PluginRegistry::new(dir.path(), RegistryMode::Production);
        assert!(registry.has_view_component("dashboard"));
        let component = registry.load_view_component("dashboard");
        assert_eq!(component.origin(), ComponentOrigin::Builtin);
    }

    #[test]
    fn concurrent_initialization_scans_once() {
        let dir = plugins_dir();
        let registry =
            Arc::new(PluginRegistry::new(dir.path(), RegistryMode::Development));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || registry.initialize().unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.scan_count.load(Ordering::SeqCst), 1);
        assert_eq!(
            registry.valid_view_types(),
            vec!["dashboard".to_string(), "kanban".to_string()]
        );
    }

    #[test]
    fn uninitialized_registry_reports_builtin_types() {
        let registry = PluginRegistry::new("does-not-matter", RegistryMode::Production);
        assert_eq!(registry.valid_view_types().len(), BUILTIN_VIEW_TYPES.len());
    }
}
