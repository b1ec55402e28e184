use std::path::PathBuf;

use detport_core::LabelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid checkpoint {path}: {reason}")]
    InvalidCheckpoint { path: PathBuf, reason: String },

    #[error("failed to launch exporter {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("exporter exited with {status}: {stderr}")]
    ExporterFailed { status: String, stderr: String },

    #[error("metadata.yaml not found in export directory {0}")]
    MetadataNotFound(PathBuf),

    #[error("label extraction failed: {0}")]
    Labels(#[from] LabelError),
}
