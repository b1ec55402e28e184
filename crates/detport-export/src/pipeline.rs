//! Export followed by label extraction into the export directory.

use std::path::PathBuf;

use detport_core::labels::{ExtractOptions, LABEL_FILE_NAME, LabelList, extract_label_file};
use tracing::info;

use crate::ExportError;
use crate::exporter::{ExportArtifact, ExportRequest, ModelExporter};

#[derive(Debug)]
pub struct LabeledExport {
    pub artifact: ExportArtifact,
    pub labels_path: PathBuf,
    pub labels: LabelList,
}

/// Run `exporter`, then write `labels.txt` next to the exported model.
pub fn export_with_labels<E: ModelExporter + ?Sized>(
    exporter: &E,
    request: &ExportRequest,
    opts: &ExtractOptions,
) -> Result<LabeledExport, ExportError> {
    let artifact = exporter.export(request)?;
    let labels_path = artifact.dir.join(LABEL_FILE_NAME);
    let labels = extract_label_file(&artifact.metadata_path, &labels_path, opts)?;
    info!(
        dir = %artifact.dir.display(),
        classes = labels.len(),
        "export labelled"
    );
    Ok(LabeledExport {
        artifact,
        labels_path,
        labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;

    use detport_core::LabelError;
    use detport_core::metadata::METADATA_FILE_NAME;

    use crate::format::ExportFormat;

    /// Writes a fixed metadata document into the expected output directory.
    struct FakeExporter {
        metadata: &'static str,
        calls: RefCell<Vec<ExportFormat>>,
    }

    impl FakeExporter {
        fn new(metadata: &'static str) -> Self {
            Self {
                metadata,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl ModelExporter for FakeExporter {
        fn export(&self, request: &ExportRequest) -> Result<ExportArtifact, ExportError> {
            self.calls.borrow_mut().push(request.format);
            let dir = request.output_dir();
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(METADATA_FILE_NAME), self.metadata).unwrap();
            ExportArtifact::locate(&dir)
        }
    }

    fn checkpoint(dir: &Path) -> PathBuf {
        let ckpt = dir.join("best.pt");
        fs::write(&ckpt, b"weights").unwrap();
        ckpt
    }

    #[test]
    fn writes_labels_into_export_dir() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FakeExporter::new("names:\n  2: bicycle\n  1: car\n  0: person\n");
        let request = ExportRequest::new(checkpoint(dir.path()), ExportFormat::WebGraph);

        let out = export_with_labels(&exporter, &request, &ExtractOptions::default()).unwrap();

        assert_eq!(out.labels_path, dir.path().join("best_web_model").join("labels.txt"));
        assert_eq!(
            fs::read_to_string(&out.labels_path).unwrap(),
            "person\ncar\nbicycle\n"
        );
        assert_eq!(out.labels.len(), 3);
        assert_eq!(*exporter.calls.borrow(), [ExportFormat::WebGraph]);
    }

    #[test]
    fn bad_metadata_leaves_no_label_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FakeExporter::new("names:\n  0: cat\n  2: dog\n");
        let request = ExportRequest::new(checkpoint(dir.path()), ExportFormat::MobileInference);

        let err = export_with_labels(&exporter, &request, &ExtractOptions::default()).unwrap_err();

        assert!(matches!(
            err,
            ExportError::Labels(LabelError::NonContiguousIndex { .. })
        ));
        assert!(!request.output_dir().join(LABEL_FILE_NAME).exists());
    }

    #[test]
    fn exporter_failure_propagates() {
        struct Failing;
        impl ModelExporter for Failing {
            fn export(&self, _: &ExportRequest) -> Result<ExportArtifact, ExportError> {
                Err(ExportError::ExporterFailed {
                    status: "exit status: 1".into(),
                    stderr: "boom".into(),
                })
            }
        }

        let request = ExportRequest::new("best.pt", ExportFormat::WebGraph);
        let err = export_with_labels(&Failing, &request, &ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::ExporterFailed { .. }));
    }
}
