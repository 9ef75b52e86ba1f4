//! Markdown rendering.

use pulldown_cmark::{html, Options, Parser};

/// Render markdown to HTML with the extensions enabled across Codex:
/// tables, footnotes, strikethrough and heading attributes.
pub fn to_html(content: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_HEADING_ATTRIBUTES;
    let parser = Parser::new_ext(content, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}
