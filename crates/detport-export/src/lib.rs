//! Export layer: drives the external model exporter and turns its metadata into a label file.

mod error;
pub use error::ExportError;

pub mod exporter;
pub mod format;
pub mod pipeline;

pub use exporter::{CliExporter, ExportArtifact, ExportRequest, ModelExporter, expected_output_dir};
pub use format::{ExportFormat, ImageSize, ParseFormatError, ParseImageSizeError};
pub use pipeline::{LabeledExport, export_with_labels};
