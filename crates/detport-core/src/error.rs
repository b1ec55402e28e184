use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("malformed metadata: {reason}")]
    MalformedMetadata { reason: String },

    /// `missing` lists at most [`crate::labels::MAX_REPORTED_GAPS`] indices.
    #[error("class indices are not contiguous from 0 (missing: {missing:?}, duplicated: {duplicates:?})")]
    NonContiguousIndex {
        missing: Vec<u64>,
        duplicates: Vec<u64>,
    },

    #[error("metadata is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LabelError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMetadata {
            reason: reason.into(),
        }
    }

    /// True for any structural problem with the metadata document, including
    /// a document that does not parse at all.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedMetadata { .. } | Self::Yaml(_))
    }
}
