//! Codex notebooks mix plain markdown files with "view" files: a YAML
//! frontmatter block describing a query and a pluggable rendering mode,
//! followed by a markdown body. This crate implements the view pipeline:
//! parsing view definitions, resolving template date variables, executing
//! queries over a notebook directory, resolving view types to
//! plugin-provided components, and rendering the result to HTML.
//!
//! This crate provides an API that allows for embedding the pipeline into
//! another application. For the command line interface, see the `codex-cli`
//! crate.

mod clock;
mod component;
mod definition;
mod error;
mod fs;
mod hash;
pub mod markdown;
mod metadata;
mod notebook;
mod plugin;
mod query;
mod registry;
mod renderer;
mod settings;
mod template;
mod value;
mod viewconfig;

pub use clock::TemplateVars;
pub use component::{ComponentOrigin, ViewComponent};
pub use definition::{
    parse_view_definition, parse_view_definition_at, validate_view_definition, Validation,
    ViewDefinition, BUILTIN_VIEW_TYPES,
};
pub use error::Error;
pub use metadata::{FileMetadata, FolderWithFiles};
pub use notebook::Notebook;
pub use plugin::{
    CompiledManifest, CompiledViewEntry, PluginKind, PluginManifest, ViewManifestEntry,
    ViewPlugin, COMPILED_MANIFEST_FILE, PLUGIN_MANIFEST_FILE,
};
pub use query::{
    DateRange, QueryGroup, QueryProvider, QueryResults, SortOrder, SortSpec, ViewQuery,
};
pub use registry::{PluginRegistry, RegistryMode, DASHBOARD_VIEW_TYPE};
pub use renderer::{RenderedView, Renderer};
pub use settings::Settings;
pub use viewconfig::{
    CorkboardConfig, DashboardPanel, DashboardRow, GalleryConfig, KanbanColumn, KanbanConfig,
    RollupConfig, RollupOp, TaskListConfig, ViewConfig,
};
