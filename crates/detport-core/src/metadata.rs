//! Descriptive fields of the exporter's `metadata.yaml`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

use crate::LabelError;
use crate::labels::{ExtractOptions, LabelList, extract_from_value};

/// File name the exporter gives its metadata document.
pub const METADATA_FILE_NAME: &str = "metadata.yaml";

/// Summary of an exported model.
///
/// Every descriptive field is optional; exporters differ in what they write
/// and unknown fields are ignored. `labels` comes from the class mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default, deserialize_with = "scalar_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub license: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub docs: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub task: Option<String>,
    #[serde(default)]
    pub stride: Option<u32>,
    #[serde(default)]
    pub batch: Option<u32>,
    /// Input resolution as `[height, width]`.
    #[serde(default)]
    pub imgsz: Option<Vec<u32>>,
    #[serde(default, skip_deserializing)]
    pub labels: LabelList,
}

impl ModelMetadata {
    pub fn from_yaml_str(document: &str, opts: &ExtractOptions) -> Result<Self, LabelError> {
        let root: Value = serde_yaml::from_str(document)?;
        let labels = extract_from_value(&root, opts)?;
        let mut metadata: ModelMetadata = serde_yaml::from_value(root)
            .map_err(|e| LabelError::malformed(e.to_string()))?;
        metadata.labels = labels;
        Ok(metadata)
    }

    pub fn from_path(path: &Path, opts: &ExtractOptions) -> Result<Self, LabelError> {
        let document = fs::read_to_string(path)?;
        Self::from_yaml_str(&document, opts)
    }

    pub fn class_count(&self) -> usize {
        self.labels.len()
    }
}

/// Accept a metadata argument that is either the document itself or an export
/// directory containing it.
pub fn resolve_metadata_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(METADATA_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

/// Read any scalar as text; YAML turns unquoted `8.1` or `2024` into numbers.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
