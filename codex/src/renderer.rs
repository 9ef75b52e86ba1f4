//! Rendering orchestration.
//!
//! The renderer ties the pipeline together: load a view file from the
//! notebook, parse its definition, run its query, resolve the matching
//! component through the plugin registry, and render the result to HTML.
//! It also carries the update cycle: child views report property patches
//! (e.g. a card dragged between kanban columns), which are merged into the
//! target file and followed by a full re-render of the hosting view.

use std::collections::HashMap;

use eyre::{Result, WrapErr};
use handlebars::Handlebars;
use log::{debug, warn};
use serde_json::{json, Map as JsonMap, Value as JsonValue};

use crate::{
    component::ViewComponent,
    definition::{parse_view_definition, validate_view_definition},
    hash::{sha256, sha256_short},
    markdown,
    query::QueryResults,
    registry::PluginRegistry,
    template, Error, Notebook, QueryProvider, ViewDefinition,
};

/// The outcome of one render cycle.
#[derive(Debug, Clone)]
pub struct RenderedView {
    pub title: String,
    pub view_type: String,
    pub html: String,
    /// Advisory problems: validation findings and fallback-component use.
    /// The view still rendered.
    pub warnings: Vec<String>,
}

/// Renders notebook views. One renderer per notebook/plugins pair; the
/// handlebars registry inside it memoizes compiled component templates
/// across renders.
pub struct Renderer<'a> {
    notebook: Notebook,
    registry: PluginRegistry,
    hb: Handlebars<'a>,
    // Maps template content hashes -> template IDs.
    template_hashes: HashMap<String, String>,
}

impl<'a> Renderer<'a> {
    /// Constructor.
    pub fn new(notebook: Notebook, registry: PluginRegistry) -> Self {
        let mut hb = Handlebars::new();
        hb.register_helper("markdown", Box::new(template::markdown));
        hb.register_helper("format_date", Box::new(template::format_date));
        Self {
            notebook,
            registry,
            hb,
            template_hashes: HashMap::new(),
        }
    }

    pub fn notebook(&self) -> &Notebook {
        &self.notebook
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Run the full render cycle for the view file at the given
    /// notebook-relative path.
    pub fn render_file<S: AsRef<str>>(&mut self, rel: S) -> Result<RenderedView> {
        let rel = rel.as_ref();
        let content = self
            .notebook
            .load(rel)
            .wrap_err_with(|| format!("failed to load view file {}", rel))?;
        let definition = parse_view_definition(&content)
            .wrap_err_with(|| format!("failed to parse view file {}", rel))?;
        self.render_definition(&definition)
    }

    /// Render an already-parsed definition.
    pub fn render_definition(&mut self, definition: &ViewDefinition) -> Result<RenderedView> {
        let mut warnings = Vec::new();

        // Validation is advisory; a definition that fails it still renders.
        let validation =
            validate_view_definition(definition, &self.registry.valid_view_types());
        for error in &validation.errors {
            warn!("View \"{}\": {}", definition.title, error);
            warnings.push(error.clone());
        }

        let results = match &definition.query {
            Some(query) => self.notebook.query(query)?,
            None => QueryResults::Flat(Vec::new()),
        };
        debug!(
            "View \"{}\" query matched {} file(s)",
            definition.title,
            results.len()
        );

        let component = self.registry.load_view_component(&definition.view_type);
        if component.is_fallback() {
            warnings.push(format!(
                "no component is installed for view type \"{}\"",
                definition.view_type
            ));
        }
        let template_id = self.register_component(&component)?;

        let context = render_context(definition, &results);
        let html = self
            .hb
            .render(&template_id, &context)
            .map_err(|e| Error::TemplateRender(template_id.clone(), e))?;

        Ok(RenderedView {
            title: definition.title.clone(),
            view_type: definition.view_type.clone(),
            html,
            warnings,
        })
    }

    /// The update event emitted by interactive child views: merge a property
    /// patch into the target file, then re-run the hosting view's cycle.
    pub fn apply_update<V, T>(
        &mut self,
        view_rel: V,
        target_rel: T,
        patch: &JsonMap<String, JsonValue>,
    ) -> Result<RenderedView>
    where
        V: AsRef<str>,
        T: AsRef<str>,
    {
        self.notebook
            .merge_properties(target_rel.as_ref(), patch)
            .wrap_err_with(|| format!("failed to update {}", target_rel.as_ref()))?;
        self.render_file(view_rel)
    }

    /// Compile the component's template into the handlebars registry,
    /// memoized by content hash so that repeated renders (and unchanged
    /// development sources) skip recompilation.
    fn register_component(&mut self, component: &ViewComponent) -> Result<String, Error> {
        let hash = sha256(component.source());
        if let Some(id) = self.template_hashes.get(&hash) {
            return Ok(id.clone());
        }
        let id = format!("{}-{}", component.name(), sha256_short(component.source()));
        debug!("Compiling component template {}", id);
        self.hb
            .register_template_string(&id, component.source())
            .map_err(|e| Error::TemplateCompile(id.clone(), e))?;
        self.template_hashes.insert(hash, id.clone());
        Ok(id)
    }
}

fn render_context(definition: &ViewDefinition, results: &QueryResults) -> JsonValue {
    let (files, groups) = match results {
        QueryResults::Flat(files) => (json!(files), json!([])),
        QueryResults::Grouped(groups) => (json!([]), json!(groups)),
    };
    json!({
        "view_type": definition.view_type,
        "title": definition.title,
        "description": definition.description,
        "query": definition.query,
        "config": definition.config,
        "layout": definition.layout,
        "files": files,
        "groups": groups,
        "grouped": results.is_grouped(),
        "total": results.len(),
        "body_html": markdown::to_html(&definition.content),
    })
}
