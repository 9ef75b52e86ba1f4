//! View components.
//!
//! A view component is a handlebars template that turns a render context
//! (definition fields, query results, the markdown body as HTML) into the
//! view's HTML. Plugins ship them as `.hbs` files; the core ships two of its
//! own: the dashboard component and the fallback shown when resolution fails.

/// Where a resolved component came from, in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentOrigin {
    /// Shipped with the core (currently only `dashboard`).
    Builtin,
    /// Development mode: read from the plugin's source tree.
    Development,
    /// Production mode: path listed in the generated plugins manifest.
    Compiled,
    /// The conventional `<plugin>/dist/<view_type>-view.hbs` location.
    Conventional,
    /// The warning placeholder used when every other strategy failed.
    Fallback,
}

/// A resolved, renderable view component.
#[derive(Debug, Clone)]
pub struct ViewComponent {
    name: String,
    source: String,
    origin: ComponentOrigin,
}

impl ViewComponent {
    pub(crate) fn new<N, S>(name: N, source: S, origin: ComponentOrigin) -> Self
    where
        N: AsRef<str>,
        S: AsRef<str>,
    {
        Self {
            name: name.as_ref().to_string(),
            source: source.as_ref().to_string(),
            origin,
        }
    }

    /// The component name, conventionally `<view_type>-view`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The handlebars template source.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn origin(&self) -> ComponentOrigin {
        self.origin
    }

    /// Whether this is the warning placeholder rather than a real view.
    pub fn is_fallback(&self) -> bool {
        self.origin == ComponentOrigin::Fallback
    }
}

const DASHBOARD_TEMPLATE: &str = r#"<div class="dashboard">
  <h1>{{title}}</h1>
  {{#if description}}<p class="dashboard-description">{{description}}</p>{{/if}}
  {{#each layout}}
  <div class="dashboard-row">
    {{#if title}}<h2>{{title}}</h2>{{/if}}
    {{#each panels}}
    <section class="dashboard-panel{{#if span}} span-{{span}}{{/if}}" data-view-type="{{view_type}}">
      <h3>{{#if title}}{{title}}{{else}}{{view_type}}{{/if}}</h3>
    </section>
    {{/each}}
  </div>
  {{/each}}
  {{{body_html}}}
</div>
"#;

const FALLBACK_TEMPLATE: &str = r#"<div class="view-fallback">
  <h2>Unavailable view: {{view_type}}</h2>
  <p>No component is installed for the view type &quot;{{view_type}}&quot;.</p>
  <p>Install or enable the plugin that provides it, then reload this view.</p>
</div>
"#;

/// The built-in dashboard component. Dashboards are rendered locally rather
/// than resolved through plugins.
pub(crate) fn dashboard_component() -> ViewComponent {
    ViewComponent::new("dashboard-view", DASHBOARD_TEMPLATE, ComponentOrigin::Builtin)
}

/// The placeholder component rendered when no real component could be
/// resolved for the given view type.
pub(crate) fn fallback_component(view_type: &str) -> ViewComponent {
    ViewComponent::new(
        format!("{}-fallback", view_type),
        FALLBACK_TEMPLATE,
        ComponentOrigin::Fallback,
    )
}
