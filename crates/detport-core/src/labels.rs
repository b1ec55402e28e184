//! Label file extraction from exported model metadata.
//!
//! The exporter writes a `names` mapping of class index → class name into
//! `metadata.yaml`. An inference runtime reads `labels.txt` positionally, so
//! line *i* must hold the name of class *i*. Order is always recovered by
//! sorting on the parsed index; the mapping's own order is never trusted.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde_yaml::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::LabelError;

/// Field holding the class mapping in exporter metadata.
pub const DEFAULT_FIELD: &str = "names";

/// Conventional label file name written next to an export.
pub const LABEL_FILE_NAME: &str = "labels.txt";

/// Upper bound on missing indices carried in [`LabelError::NonContiguousIndex`].
pub const MAX_REPORTED_GAPS: usize = 16;

/// How gaps in the class index range are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexPolicy {
    /// Indices must be exactly `0..N`. Gaps are an error.
    #[default]
    Contiguous,
    /// Gaps are tolerated with a warning; names are still emitted in index order.
    Sorted,
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Top-level field holding the class mapping.
    pub field: String,
    pub policy: IndexPolicy,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            field: DEFAULT_FIELD.to_string(),
            policy: IndexPolicy::default(),
        }
    }
}

/// Class names in ascending class-index order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelList(Vec<String>);

impl LabelList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    /// Exact label file contents: every name followed by `\n`, nothing else.
    pub fn to_file_contents(&self) -> String {
        let mut out = String::with_capacity(self.0.iter().map(|s| s.len() + 1).sum());
        for name in &self.0 {
            out.push_str(name);
            out.push('\n');
        }
        out
    }
}

// ── Extraction ──

/// Parse a metadata document and return its class names in index order.
pub fn extract_labels(document: &str, opts: &ExtractOptions) -> Result<LabelList, LabelError> {
    let root: Value = serde_yaml::from_str(document)?;
    extract_from_value(&root, opts)
}

/// Same as [`extract_labels`] for an already-parsed document.
pub fn extract_from_value(root: &Value, opts: &ExtractOptions) -> Result<LabelList, LabelError> {
    if !root.is_mapping() {
        return Err(LabelError::malformed(format!(
            "document root must be a mapping, found {}",
            kind(root)
        )));
    }
    let field = root
        .get(opts.field.as_str())
        .ok_or_else(|| LabelError::malformed(format!("missing '{}' field", opts.field)))?;
    let mapping = field.as_mapping().ok_or_else(|| {
        LabelError::malformed(format!(
            "'{}' must be a mapping of class index to name, found {}",
            opts.field,
            kind(field)
        ))
    })?;

    let mut by_index = BTreeMap::new();
    let mut duplicates = Vec::new();
    for (key, value) in mapping {
        let index = parse_index(key)?;
        let name = class_name(index, value)?;
        if by_index.insert(index, name).is_some() {
            duplicates.push(index);
        }
    }
    duplicates.sort_unstable();
    duplicates.dedup();

    let missing = missing_indices(by_index.keys().copied());
    if !duplicates.is_empty() {
        return Err(LabelError::NonContiguousIndex {
            missing,
            duplicates,
        });
    }
    if !missing.is_empty() {
        match opts.policy {
            IndexPolicy::Contiguous => {
                return Err(LabelError::NonContiguousIndex {
                    missing,
                    duplicates,
                });
            }
            IndexPolicy::Sorted => {
                warn!(
                    ?missing,
                    classes = by_index.len(),
                    "class indices have gaps; label lines will not match model output indices"
                );
            }
        }
    }

    debug!(classes = by_index.len(), field = %opts.field, "extracted class names");
    Ok(LabelList(by_index.into_values().collect()))
}

fn parse_index(key: &Value) -> Result<u64, LabelError> {
    match key {
        Value::Number(n) => n.as_u64().ok_or_else(|| {
            LabelError::malformed(format!("class index {n} is not a non-negative integer"))
        }),
        // Only canonical decimal text: no sign, padding or leading zeros.
        Value::String(s) => match s.parse::<u64>() {
            Ok(index) if index.to_string() == *s => Ok(index),
            _ => Err(LabelError::malformed(format!(
                "class index {s:?} is not a non-negative integer"
            ))),
        },
        other => Err(LabelError::malformed(format!(
            "class index must be an integer, found {}",
            kind(other)
        ))),
    }
}

fn class_name(index: u64, value: &Value) -> Result<String, LabelError> {
    let name = match value {
        Value::String(s) => s.clone(),
        // An unquoted numeric class name is read back as a number.
        Value::Number(n) => n.to_string(),
        other => {
            return Err(LabelError::malformed(format!(
                "class {index} name must be a string, found {}",
                kind(other)
            )));
        }
    };
    if name.contains(['\n', '\r']) {
        return Err(LabelError::malformed(format!(
            "class {index} name {name:?} contains a line break"
        )));
    }
    Ok(name)
}

/// Indices absent from `0..=max`, given ascending input. Capped at [`MAX_REPORTED_GAPS`].
fn missing_indices(sorted: impl Iterator<Item = u64>) -> Vec<u64> {
    let mut missing = Vec::new();
    let mut expected = 0u64;
    for index in sorted {
        while expected < index && missing.len() < MAX_REPORTED_GAPS {
            missing.push(expected);
            expected += 1;
        }
        expected = index.saturating_add(1);
    }
    missing
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

// ── Label file I/O ──

/// Write a label file atomically.
///
/// Contents go to a temporary file in the destination directory which is
/// renamed onto `path` only after a complete write, so a failed run never
/// leaves a truncated label file behind.
pub fn write_label_file(path: &Path, labels: &LabelList) -> Result<(), LabelError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(labels.to_file_contents().as_bytes())?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    info!(path = %path.display(), classes = labels.len(), "wrote label file");
    Ok(())
}

/// Read a label file back, one name per `\n`-terminated line.
///
/// Only `\n` separates lines; a `\r` stays part of the name. A missing final
/// newline is tolerated here; use [`LabelList::to_file_contents`] for a
/// byte-exact comparison.
pub fn read_label_file(path: &Path) -> Result<LabelList, LabelError> {
    let contents = fs::read_to_string(path)?;
    if contents.is_empty() {
        return Ok(LabelList::default());
    }
    let body = contents.strip_suffix('\n').unwrap_or(&contents);
    Ok(LabelList(body.split('\n').map(String::from).collect()))
}

/// Read `metadata_path`, extract its class names and write them to `output_path`.
///
/// Nothing is written when extraction fails.
pub fn extract_label_file(
    metadata_path: &Path,
    output_path: &Path,
    opts: &ExtractOptions,
) -> Result<LabelList, LabelError> {
    let document = fs::read_to_string(metadata_path)?;
    let labels = extract_labels(&document, opts)?;
    write_label_file(output_path, &labels)?;
    Ok(labels)
}
