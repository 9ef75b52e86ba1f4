//! File and folder metadata as seen by the view layer.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Metadata for a single notebook file.
///
/// The `title` and `tags` frontmatter keys are lifted out; every other key
/// lands in the open `properties` bag, which is what queries filter and
/// group on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Notebook-relative path, which doubles as the file's identifier.
    pub id: String,
    /// Absolute path on disk.
    pub path: PathBuf,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub properties: JsonMap<String, JsonValue>,
    /// The markdown body, without frontmatter.
    #[serde(default)]
    pub content: String,
}

impl FileMetadata {
    /// Look up a property value, treating `title` and `id` as pseudo
    /// properties so that queries can sort and group on them uniformly.
    pub fn property(&self, name: &str) -> Option<JsonValue> {
        match name {
            "title" => Some(JsonValue::String(self.title.clone())),
            "id" => Some(JsonValue::String(self.id.clone())),
            _ => self.properties.get(name).cloned(),
        }
    }
}

/// A folder and the files directly inside it.
#[derive(Debug, Clone, Serialize)]
pub struct FolderWithFiles {
    /// Notebook-relative folder path; empty for the notebook root.
    pub folder: String,
    pub files: Vec<FileMetadata>,
}
