//! Notebook file store.
//!
//! A notebook is a directory of markdown and view files. The store handles
//! enumeration, frontmatter parsing into [`FileMetadata`], and the
//! merge-and-save update cycle driven by interactive views. Updates are
//! optimistic: read the latest content, merge the patch, write the whole
//! file back. Last write wins.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde_json::{Map as JsonMap, Value as JsonValue};
use serde_yaml::{Mapping, Value as YamlValue};

use crate::{
    definition::split_frontmatter,
    fs::ensure_parent_path_exists,
    plugin::is_path_escape,
    value::{json_to_yaml, yaml_to_json},
    Error, FileMetadata, FolderWithFiles, QueryProvider, QueryResults, ViewQuery,
};

/// A notebook rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct Notebook {
    root: PathBuf,
}

impl Notebook {
    /// Open the notebook rooted at the given directory, which must exist.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, Error> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::NoSuchNotebook(root.to_path_buf()));
        }
        let root = root
            .canonicalize()
            .map_err(|e| Error::Io(format!("while opening notebook {}", root.display()), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, rel: &str) -> Result<PathBuf, Error> {
        if is_path_escape(rel) {
            return Err(Error::PathEscapesNotebook(rel.to_string()));
        }
        Ok(self.root.join(rel))
    }

    /// Read the raw content of a notebook file.
    pub fn load<S: AsRef<str>>(&self, rel: S) -> Result<String, Error> {
        let path = self.resolve(rel.as_ref())?;
        if !path.is_file() {
            return Err(Error::NoSuchFile(path));
        }
        fs::read_to_string(&path)
            .map_err(|e| Error::Io(format!("while reading {}", path.display()), e))
    }

    /// Write a notebook file, creating parent directories as needed.
    pub fn save<S, C>(&self, rel: S, content: C) -> Result<(), Error>
    where
        S: AsRef<str>,
        C: AsRef<str>,
    {
        let path = self.resolve(rel.as_ref())?;
        ensure_parent_path_exists(&path)?;
        fs::write(&path, content.as_ref())
            .map_err(|e| Error::Io(format!("while writing {}", path.display()), e))
    }

    /// Load a single file and parse its frontmatter into metadata.
    pub fn load_metadata<S: AsRef<str>>(&self, rel: S) -> Result<FileMetadata, Error> {
        let rel = rel.as_ref();
        let content = self.load(rel)?;
        Ok(parse_metadata(rel, &self.resolve(rel)?, &content))
    }

    /// Enumerate every markdown file in the notebook, sorted by id.
    ///
    /// Files with malformed frontmatter are kept, with a warning, as plain
    /// files; one broken note must not break every view over the notebook.
    pub fn files(&self) -> Result<Vec<FileMetadata>, Error> {
        let pattern = self
            .root
            .join("**")
            .join("*.md")
            .to_string_lossy()
            .to_string();
        let mut files = Vec::new();
        for entry in glob::glob(&pattern).map_err(|e| Error::FilePattern(pattern.clone(), e))? {
            let path = entry?;
            if !path.is_file() {
                continue;
            }
            let rel = path
                .strip_prefix(&self.root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            let content = fs::read_to_string(&path)
                .map_err(|e| Error::Io(format!("while reading {}", path.display()), e))?;
            files.push(parse_metadata(&rel, &path, &content));
        }
        files.sort_by(|a, b| a.id.cmp(&b.id));
        debug!("Notebook {} holds {} file(s)", self.root.display(), files.len());
        Ok(files)
    }

    /// Group the notebook's files by their containing folder.
    pub fn folders_with_files(&self) -> Result<Vec<FolderWithFiles>, Error> {
        let mut folders: Vec<FolderWithFiles> = Vec::new();
        for file in self.files()? {
            let folder = Path::new(&file.id)
                .parent()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            match folders.iter_mut().find(|f| f.folder == folder) {
                Some(existing) => existing.files.push(file),
                None => folders.push(FolderWithFiles {
                    folder,
                    files: vec![file],
                }),
            }
        }
        Ok(folders)
    }

    /// Merge a property patch into a file's frontmatter and write the whole
    /// file back, returning the re-parsed metadata.
    pub fn merge_properties<S: AsRef<str>>(
        &self,
        rel: S,
        patch: &JsonMap<String, JsonValue>,
    ) -> Result<FileMetadata, Error> {
        let rel = rel.as_ref();
        let content = self.load(rel)?;
        let (mut mapping, body) = match split_frontmatter(&content) {
            Ok((frontmatter, body)) => match serde_yaml::from_str::<YamlValue>(frontmatter)? {
                YamlValue::Mapping(m) => (m, body.to_string()),
                YamlValue::Null => (Mapping::new(), body.to_string()),
                _ => return Err(Error::FrontmatterNotAMapping),
            },
            // A plain markdown file gains a frontmatter block.
            Err(Error::MissingFrontmatter) => (Mapping::new(), content),
            Err(e) => return Err(e),
        };
        for (key, value) in patch {
            mapping.insert(
                YamlValue::String(key.clone()),
                json_to_yaml(value.clone()),
            );
        }
        let mut frontmatter = serde_yaml::to_string(&YamlValue::Mapping(mapping))?;
        // Some serde_yaml versions emit a document marker; the opening
        // delimiter is written explicitly either way.
        if let Some(stripped) = frontmatter.strip_prefix("---\n") {
            frontmatter = stripped.to_string();
        }
        if !frontmatter.ends_with('\n') {
            frontmatter.push('\n');
        }
        self.save(rel, format!("---\n{}---\n{}", frontmatter, body))?;
        debug!("Merged {} propert(ies) into {}", patch.len(), rel);
        self.load_metadata(rel)
    }
}

impl QueryProvider for Notebook {
    fn query(&self, query: &ViewQuery) -> Result<QueryResults, Error> {
        query.apply(self.files()?)
    }
}

fn parse_metadata(id: &str, path: &Path, content: &str) -> FileMetadata {
    let (frontmatter, body) = match split_frontmatter(content) {
        Ok(parts) => parts,
        Err(_) => ("", content),
    };
    let mut meta = FileMetadata {
        id: id.to_string(),
        path: path.to_path_buf(),
        title: default_title(id),
        content: body.trim().to_string(),
        ..Default::default()
    };
    if frontmatter.is_empty() {
        return meta;
    }
    let mapping = match serde_yaml::from_str::<YamlValue>(frontmatter) {
        Ok(YamlValue::Mapping(m)) => m,
        Ok(_) | Err(_) => {
            warn!("Ignoring malformed frontmatter in {}", id);
            return meta;
        }
    };
    for (key, value) in mapping {
        let key = match key {
            YamlValue::String(s) => s,
            _ => continue,
        };
        match (key.as_str(), value) {
            ("title", YamlValue::String(title)) => meta.title = title,
            ("tags", YamlValue::Sequence(seq)) => {
                meta.tags = seq
                    .into_iter()
                    .filter_map(|t| match t {
                        YamlValue::String(s) => Some(s),
                        _ => None,
                    })
                    .collect();
            }
            ("tags", YamlValue::String(tag)) => meta.tags = vec![tag],
            (_, value) => match yaml_to_json(value) {
                Ok(json) => {
                    meta.properties.insert(key, json);
                }
                Err(e) => warn!("Dropping property \"{}\" in {}: {}", key, id, e),
            },
        }
    }
    meta
}

fn default_title(id: &str) -> String {
    Path::new(id)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| id.to_string())
}
