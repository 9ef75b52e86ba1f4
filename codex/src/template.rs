//! Handlebars helpers available to every view component.

use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError,
};
use time::format_description;

use crate::clock::parse_timestamp;

/// Render a markdown string parameter to HTML.
///
/// Usage:
///
/// ```handlebars
/// {{{ markdown content }}}
/// ```
pub fn markdown(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let content = h
        .param(0)
        .and_then(|p| p.value().as_str())
        .unwrap_or_default();
    out.write(&crate::markdown::to_html(content))?;
    Ok(())
}

/// Parses a string as a date or timestamp and formats it according to a
/// formatting rule.
///
/// Usage:
///
/// ```handlebars
/// {{ format_date due "[month repr:long] [day], [year]" }}
/// ```
///
/// Produces `January 1, 2022`. The formatting rule is defined by the
/// [`time`](https://crates.io/crates/time) crate. See [the
/// docs](https://time-rs.github.io/book/api/format-description.html) for more
/// details.
pub fn format_date(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let value = h
        .param(0)
        .and_then(|p| p.value().as_str())
        .ok_or_else(|| RenderError::new("format_date expects a date string parameter"))?;
    let rule = h
        .param(1)
        .and_then(|p| p.value().as_str())
        .ok_or_else(|| RenderError::new("format_date expects a format rule parameter"))?;
    let timestamp = parse_timestamp(value)
        .map_err(|e| RenderError::new(format!("format_date: {}", e)))?;
    let format = format_description::parse(rule)
        .map_err(|e| RenderError::new(format!("format_date: bad format rule: {}", e)))?;
    let formatted = timestamp
        .format(&format)
        .map_err(|e| RenderError::new(format!("format_date: {}", e)))?;
    out.write(&formatted)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn registry() -> Handlebars<'static> {
        let mut hb = Handlebars::new();
        hb.register_helper("markdown", Box::new(markdown));
        hb.register_helper("format_date", Box::new(format_date));
        hb
    }

    #[test]
    fn markdown_helper_renders_html() {
        let hb = registry();
        let rendered = hb
            .render_template("{{{markdown body}}}", &json!({"body": "*em*"}))
            .unwrap();
        assert_eq!(rendered, "<p><em>em</em></p>\n");
    }

    #[test]
    fn format_date_helper_formats_bare_dates() {
        let hb = registry();
        let rendered = hb
            .render_template(
                r#"{{format_date due "[month repr:long] [day], [year]"}}"#,
                &json!({"due": "2022-01-01"}),
            )
            .unwrap();
        assert_eq!(rendered, "January 01, 2022");
    }

    #[test]
    fn format_date_helper_rejects_garbage() {
        let hb = registry();
        let result = hb.render_template(
            r#"{{format_date due "[year]"}}"#,
            &json!({"due": "not a date"}),
        );
        assert!(result.is_err());
    }
}
