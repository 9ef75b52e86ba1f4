use std::path::PathBuf;

use thiserror::Error;

/// The primary error type that can be produced by Codex.
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing frontmatter: view files must start with a \"---\"-delimited YAML block")]
    MissingFrontmatter,
    #[error("unterminated frontmatter: no closing \"---\" delimiter found")]
    UnterminatedFrontmatter,
    #[error("frontmatter must be a YAML mapping")]
    FrontmatterNotAMapping,
    #[error("expected a file of type \"view\", but found type {0:?}")]
    NotAView(Option<String>),
    #[error("view definition is missing the required \"view_type\" field")]
    MissingViewType,
    #[error("view config must be a YAML mapping")]
    ConfigNotAMapping,
    #[error("object property names must be strings")]
    ObjectKeysMustBeStrings,
    #[error("cannot represent non-finite number {0} in a property bag")]
    NonFiniteNumber(f64),
    #[error("cannot parse \"{0}\" as a date or timestamp")]
    InvalidDate(String),
    #[error("I/O error {0}: {1}")]
    Io(String, std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no such notebook directory: {0}")]
    NoSuchNotebook(PathBuf),
    #[error("no such file in notebook: {0}")]
    NoSuchFile(PathBuf),
    #[error("path escapes the notebook root: {0}")]
    PathEscapesNotebook(String),
    #[error("failed to load plugin manifest {0}: {1}")]
    PluginManifest(PathBuf, Box<Error>),
    #[error("invalid plugin manifest: {0}")]
    InvalidManifest(String),
    #[error("failed to load settings file: {0}")]
    FailedToLoadSettings(PathBuf),
    #[error("notebook files iteration failed: {0}")]
    NotebookIter(#[from] glob::GlobError),
    #[error("failed to parse file pattern \"{0}\": {1}")]
    FilePattern(String, glob::PatternError),
    #[error("failed to compile template \"{0}\": {1}")]
    TemplateCompile(String, #[source] handlebars::TemplateError),
    #[error("failed to render template \"{0}\": {1}")]
    TemplateRender(String, #[source] handlebars::RenderError),
}
