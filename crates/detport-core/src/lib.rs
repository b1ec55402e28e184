//! Core types for exported detector models: metadata parsing and label file extraction.

mod error;
pub use error::LabelError;

pub mod labels;
pub mod metadata;

pub use labels::{
    ExtractOptions, IndexPolicy, LabelList, extract_label_file, extract_labels, read_label_file,
    write_label_file,
};
pub use metadata::{ModelMetadata, resolve_metadata_path};
