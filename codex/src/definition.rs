//! View definition parsing and validation.
//!
//! A view file (`.cdx`) is a YAML frontmatter block followed by a free-form
//! markdown body:
//!
//! ```text
//! ---
//! type: view
//! view_type: kanban
//! title: Sprint board
//! query:
//!   tags: [sprint]
//! config:
//!   columns:
//!     - id: todo
//!       title: To Do
//! ---
//! Notes about this board go *here*.
//! ```
//!
//! Parsing is a pure, synchronous text transformation: no I/O, and the only
//! wall-clock dependency is the resolution of `{{...}}` template variables in
//! the query block.

use serde::Deserialize;
use serde_yaml::Value as YamlValue;

use crate::{
    clock::TemplateVars,
    viewconfig::{DashboardRow, ViewConfig},
    Error, ViewQuery,
};

/// View types shipped with the core distribution. Used as the valid set when
/// the plugin registry has not loaded any manifests.
pub const BUILTIN_VIEW_TYPES: &[&str] = &[
    "kanban",
    "task-list",
    "gallery",
    "rollup",
    "corkboard",
    "dashboard",
];

/// A parsed view definition.
///
/// Instances are only ever produced by [`parse_view_definition`], so holding
/// one implies the file declared `type: view` and carried a `view_type`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ViewDefinition {
    pub view_type: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<ViewQuery>,
    pub config: ViewConfig,
    /// Dashboard row layout; only meaningful for `view_type: dashboard`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Vec<DashboardRow>>,
    /// The markdown body below the frontmatter, trimmed.
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct RawDefinition {
    #[serde(rename = "type")]
    kind: Option<String>,
    view_type: Option<String>,
    title: Option<String>,
    description: Option<String>,
    query: Option<YamlValue>,
    config: Option<YamlValue>,
    layout: Option<Vec<DashboardRow>>,
}

/// Parse a view definition from raw file content.
///
/// Template variables in the query block are resolved against the current
/// wall-clock time; see [`TemplateVars`] for the token set.
pub fn parse_view_definition(content: &str) -> Result<ViewDefinition, Error> {
    parse_view_definition_at(content, &TemplateVars::now())
}

/// Same as [`parse_view_definition`], with an explicit template-variable
/// clock. This is the hook tests use to pin the wall-clock time.
pub fn parse_view_definition_at(
    content: &str,
    vars: &TemplateVars,
) -> Result<ViewDefinition, Error> {
    let (frontmatter, body) = split_frontmatter(content)?;
    let raw: RawDefinition = serde_yaml::from_str(frontmatter)?;

    match raw.kind.as_deref() {
        Some("view") => {}
        other => return Err(Error::NotAView(other.map(ToString::to_string))),
    }
    let view_type = raw.view_type.ok_or(Error::MissingViewType)?;

    let query = match raw.query {
        Some(q) => Some(serde_yaml::from_value(vars.substitute(q))?),
        None => None,
    };
    let config = ViewConfig::from_yaml(&view_type, raw.config.unwrap_or(YamlValue::Null))?;

    Ok(ViewDefinition {
        title: raw.title.unwrap_or_else(|| view_type.clone()),
        view_type,
        description: raw.description,
        query,
        config,
        layout: raw.layout,
        content: body.trim().to_string(),
    })
}

/// Split file content into its frontmatter block and markdown body. The
/// opening delimiter is anchored at the very start of the file.
pub(crate) fn split_frontmatter(content: &str) -> Result<(&str, &str), Error> {
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
        .ok_or(Error::MissingFrontmatter)?;
    for close in ["\n---\n", "\n---\r\n"] {
        if let Some(idx) = rest.find(close) {
            return Ok((&rest[..idx], &rest[idx + close.len()..]));
        }
    }
    // A closing delimiter as the very last line, with no trailing newline.
    if let Some(frontmatter) = rest.strip_suffix("\n---") {
        return Ok((frontmatter, ""));
    }
    Err(Error::UnterminatedFrontmatter)
}

/// The outcome of advisory validation: structural problems are reported, not
/// thrown, and callers may choose to render anyway.
#[derive(Debug, Clone, Default)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Structurally validate a parsed definition against the set of currently
/// registered view types. An empty `registered_types` slice means the
/// registry has not loaded anything yet, in which case the built-in list
/// stands in.
pub fn validate_view_definition(def: &ViewDefinition, registered_types: &[String]) -> Validation {
    let mut errors = Vec::new();

    let known = if registered_types.is_empty() {
        BUILTIN_VIEW_TYPES.iter().any(|t| *t == def.view_type)
    } else {
        registered_types.iter().any(|t| *t == def.view_type)
    };
    if !known {
        errors.push(format!("unknown view type \"{}\"", def.view_type));
    }

    if def.view_type == "kanban" {
        match &def.config {
            ViewConfig::Kanban(kanban) if !kanban.columns.is_empty() => {}
            _ => errors.push("kanban views require a \"columns\" array in config".to_string()),
        }
    }
    if def.view_type == "dashboard" && def.layout.as_ref().map(Vec::is_empty).unwrap_or(true) {
        errors.push("dashboard views require a \"layout\" with at least one row".to_string());
    }

    Validation {
        valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::viewconfig::KanbanConfig;
    use time::macros::datetime;

    const KANBAN_VIEW: &str = r#"---
type: view
view_type: kanban
title: Sprint board
query:
  tags: [sprint]
  date_range:
    property: due
    to: "{{endOfWeek}}"
config:
  columns:
    - id: todo
      title: To Do
    - id: done
      title: Done
---

Board notes go **here**.
"#;

    #[test]
    fn parses_a_complete_definition() {
        let def = parse_view_definition(KANBAN_VIEW).unwrap();
        assert_eq!(def.view_type, "kanban");
        assert_eq!(def.title, "Sprint board");
        assert_eq!(def.content, "Board notes go **here**.");
        let query = def.query.unwrap();
        assert_eq!(query.tags, vec!["sprint".to_string()]);
        match def.config {
            ViewConfig::Kanban(kanban) => assert_eq!(kanban.columns.len(), 2),
            other => panic!("expected a kanban config, but got {:?}", other),
        }
    }

    #[test]
    fn template_variables_resolve_at_parse_time() {
        let vars = TemplateVars::at(datetime!(2022-06-15 12:00:00 UTC));
        let def = parse_view_definition_at(KANBAN_VIEW, &vars).unwrap();
        let range = def.query.unwrap().date_range.unwrap();
        assert_eq!(range.to.as_deref(), Some("2022-06-19T23:59:59.999Z"));
    }

    #[test]
    fn missing_frontmatter_is_an_error() {
        let err = parse_view_definition("# Just markdown\n").unwrap_err();
        assert!(err.to_string().contains("frontmatter"));
    }

    #[test]
    fn unterminated_frontmatter_is_an_error() {
        let err = parse_view_definition("---\ntype: view\nview_type: kanban\n").unwrap_err();
        assert!(err.to_string().contains("frontmatter"));
    }

    #[test]
    fn wrong_type_literal_is_an_error() {
        let err =
            parse_view_definition("---\ntype: note\nview_type: kanban\n---\n").unwrap_err();
        match err {
            Error::NotAView(Some(kind)) => assert_eq!(kind, "note"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn missing_view_type_is_an_error() {
        let err = parse_view_definition("---\ntype: view\ntitle: T\n---\n").unwrap_err();
        match err {
            Error::MissingViewType => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn frontmatter_round_trips_through_serialization() {
        let def = parse_view_definition(KANBAN_VIEW).unwrap();
        let yaml = serde_yaml::to_string(&def).unwrap();
        let reparsed: YamlValue = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(reparsed["view_type"], YamlValue::String("kanban".to_string()));
        assert_eq!(
            reparsed["title"],
            YamlValue::String("Sprint board".to_string())
        );
        assert_eq!(
            reparsed["query"]["tags"][0],
            YamlValue::String("sprint".to_string())
        );
    }

    #[test]
    fn kanban_without_columns_fails_validation() {
        let def = parse_view_definition(
            "---\ntype: view\nview_type: kanban\ntitle: B\nconfig: {}\n---\n",
        )
        .unwrap();
        let validation = validate_view_definition(&def, &[]);
        assert!(!validation.valid);
        assert!(validation.errors.iter().any(|e| e.contains("columns")));
    }

    #[test]
    fn kanban_with_columns_passes_validation() {
        let def = parse_view_definition(KANBAN_VIEW).unwrap();
        let validation = validate_view_definition(&def, &[]);
        assert!(validation.valid, "errors: {:?}", validation.errors);
    }

    #[test]
    fn single_column_kanban_is_valid() {
        let def = parse_view_definition(
            "---\ntype: view\nview_type: kanban\ntitle: B\nconfig:\n  columns:\n    - id: a\n      title: A\n---\n",
        )
        .unwrap();
        assert_eq!(
            def.config,
            ViewConfig::Kanban(KanbanConfig {
                columns: vec![crate::viewconfig::KanbanColumn {
                    id: "a".to_string(),
                    title: "A".to_string(),
                    color: None,
                }],
                group_by: None,
            })
        );
        assert!(validate_view_definition(&def, &[]).valid);
    }

    #[test]
    fn dashboard_requires_a_layout() {
        let def =
            parse_view_definition("---\ntype: view\nview_type: dashboard\ntitle: D\n---\n")
                .unwrap();
        let validation = validate_view_definition(&def, &[]);
        assert!(!validation.valid);
        assert!(validation.errors.iter().any(|e| e.contains("layout")));
    }

    #[test]
    fn registered_types_override_the_builtin_list() {
        let def = parse_view_definition(
            "---\ntype: view\nview_type: timeline\ntitle: T\n---\n",
        )
        .unwrap();
        assert!(!validate_view_definition(&def, &[]).valid);
        let registered = vec!["timeline".to_string()];
        assert!(validate_view_definition(&def, &registered).valid);
    }
}
