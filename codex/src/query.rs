//! View queries and their execution.
//!
//! A [`ViewQuery`] is a pure value object parsed from a view definition's
//! frontmatter. Execution is split behind the [`QueryProvider`] seam: the
//! built-in provider is the notebook store itself, but anything that can
//! produce [`FileMetadata`] records can stand in for it.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::trace;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::{clock::parse_timestamp, Error, FileMetadata};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// How to order query results: by which property, and in which direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub by: String,
    #[serde(default)]
    pub order: SortOrder,
}

/// An inclusive date-range filter over a single property. Bounds accept both
/// RFC 3339 timestamps and bare `YYYY-MM-DD` dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub property: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

/// Filter, sort and pagination parameters for a view's file set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewQuery {
    /// Tag filters; a file must carry every listed tag.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Property-equality filters.
    #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
    pub properties: JsonMap<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    /// Case-insensitive free-text search over title and body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    /// Group the results by the given property after filtering and sorting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
}

/// One group of query results, keyed by the stringified `group_by` property
/// value. Files missing the property group under the empty key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryGroup {
    pub key: String,
    pub files: Vec<FileMetadata>,
}

/// The outcome of executing a query: a flat file list, or groups of files
/// when the query asked for `group_by`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResults {
    Flat(Vec<FileMetadata>),
    Grouped(Vec<QueryGroup>),
}

impl QueryResults {
    pub fn is_grouped(&self) -> bool {
        matches!(self, Self::Grouped(_))
    }

    /// Total number of files across all groups.
    pub fn len(&self) -> usize {
        match self {
            Self::Flat(files) => files.len(),
            Self::Grouped(groups) => groups.iter().map(|g| g.files.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The seam between views and whatever produces their file sets.
pub trait QueryProvider {
    fn query(&self, query: &ViewQuery) -> Result<QueryResults, Error>;
}

impl ViewQuery {
    /// Execute this query against an already-loaded set of records: filter,
    /// sort, paginate, then group.
    pub fn apply(&self, records: Vec<FileMetadata>) -> Result<QueryResults, Error> {
        let mut files: Vec<FileMetadata> = records
            .into_iter()
            .filter(|f| self.matches(f))
            .collect();

        if let Some(sort) = &self.sort {
            files.sort_by(|a, b| {
                let ordering = compare_by(a, b, &sort.by);
                match sort.order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        let offset = self.offset.unwrap_or(0);
        let files: Vec<FileMetadata> = files
            .into_iter()
            .skip(offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect();
        trace!("Query matched {} file(s)", files.len());

        Ok(match &self.group_by {
            Some(property) => QueryResults::Grouped(group_by(files, property)),
            None => QueryResults::Flat(files),
        })
    }

    fn matches(&self, file: &FileMetadata) -> bool {
        if !self.tags.iter().all(|t| file.tags.contains(t)) {
            return false;
        }
        for (name, expected) in &self.properties {
            if file.property(name).as_ref() != Some(expected) {
                return false;
            }
        }
        if let Some(range) = &self.date_range {
            if !matches_date_range(file, range) {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            if !file.title.to_lowercase().contains(&needle)
                && !file.content.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

fn matches_date_range(file: &FileMetadata, range: &DateRange) -> bool {
    let value = match file.property(&range.property) {
        Some(JsonValue::String(s)) => s,
        // Missing or non-string property values never fall inside a range.
        _ => return false,
    };
    let value = match parse_timestamp(&value) {
        Ok(v) => v,
        Err(_) => {
            trace!(
                "Skipping {}: property {} is not a date ({})",
                file.id,
                range.property,
                value
            );
            return false;
        }
    };
    if let Some(from) = &range.from {
        match parse_timestamp(from) {
            Ok(from) if value >= from => {}
            _ => return false,
        }
    }
    if let Some(to) = &range.to {
        match parse_timestamp(to) {
            Ok(to) if value <= to => {}
            _ => return false,
        }
    }
    true
}

// Files missing the sort property collate after those that carry it.
fn compare_by(a: &FileMetadata, b: &FileMetadata, property: &str) -> Ordering {
    match (a.property(property), b.property(property)) {
        (Some(va), Some(vb)) => compare_values(&va, &vb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_values(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::Number(na), JsonValue::Number(nb)) => na
            .as_f64()
            .partial_cmp(&nb.as_f64())
            .unwrap_or(Ordering::Equal),
        (JsonValue::String(sa), JsonValue::String(sb)) => sa.cmp(sb),
        (JsonValue::Bool(ba), JsonValue::Bool(bb)) => ba.cmp(bb),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn group_by(files: Vec<FileMetadata>, property: &str) -> Vec<QueryGroup> {
    let mut groups: BTreeMap<String, Vec<FileMetadata>> = BTreeMap::new();
    for file in files {
        let key = match file.property(property) {
            Some(JsonValue::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        groups.entry(key).or_default().push(file);
    }
    groups
        .into_iter()
        .map(|(key, files)| QueryGroup { key, files })
        .collect()
}
