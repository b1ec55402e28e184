//! The model exporter collaborator.
//!
//! Conversion itself belongs to the detection framework. This module only
//! builds the request, runs the framework's command-line exporter and finds
//! the metadata document in whatever directory it produced.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use detport_core::metadata::METADATA_FILE_NAME;
use tracing::{debug, info};

use crate::ExportError;
use crate::format::{ExportFormat, ImageSize};

/// Checkpoint extension the exporter accepts.
pub const CHECKPOINT_EXTENSION: &str = "pt";

/// Default name of the framework's command-line entry point.
pub const DEFAULT_PROGRAM: &str = "yolo";

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub checkpoint: PathBuf,
    pub format: ExportFormat,
    pub imgsz: ImageSize,
}

impl ExportRequest {
    pub fn new(checkpoint: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            checkpoint: checkpoint.into(),
            format,
            imgsz: ImageSize::default(),
        }
    }

    pub fn with_imgsz(mut self, imgsz: ImageSize) -> Self {
        self.imgsz = imgsz;
        self
    }

    /// The checkpoint must be an existing `.pt` file.
    pub fn validate(&self) -> Result<(), ExportError> {
        let invalid = |reason: &str| ExportError::InvalidCheckpoint {
            path: self.checkpoint.clone(),
            reason: reason.to_string(),
        };
        if self.checkpoint.extension().and_then(|e| e.to_str()) != Some(CHECKPOINT_EXTENSION) {
            return Err(invalid("expected a .pt checkpoint"));
        }
        if !self.checkpoint.is_file() {
            return Err(invalid("file not found"));
        }
        Ok(())
    }

    pub fn output_dir(&self) -> PathBuf {
        expected_output_dir(&self.checkpoint, self.format)
    }
}

/// Directory the exporter writes for `checkpoint`: `<dir>/<stem><suffix>`.
///
/// `models/best.pt` exported to the web format lands in `models/best_web_model`.
pub fn expected_output_dir(checkpoint: &Path, format: ExportFormat) -> PathBuf {
    let mut name = checkpoint
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    name.push(format.output_suffix());
    checkpoint.with_file_name(name)
}

/// Output of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub dir: PathBuf,
    pub metadata_path: PathBuf,
}

impl ExportArtifact {
    /// Treat `dir` as an export directory and find its metadata document.
    pub fn locate(dir: &Path) -> Result<Self, ExportError> {
        let metadata_path = dir.join(METADATA_FILE_NAME);
        if !metadata_path.is_file() {
            return Err(ExportError::MetadataNotFound(dir.to_path_buf()));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            metadata_path,
        })
    }
}

/// Something that converts a checkpoint into a deployment format.
pub trait ModelExporter {
    fn export(&self, request: &ExportRequest) -> Result<ExportArtifact, ExportError>;
}

/// Runs the framework CLI: `yolo export model=<ckpt> format=<id> imgsz=<h>,<w>`.
///
/// `launcher_args` go before `export`, for wrappers such as
/// `conda run -n vision yolo`.
#[derive(Debug, Clone)]
pub struct CliExporter {
    program: OsString,
    launcher_args: Vec<OsString>,
}

impl Default for CliExporter {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl CliExporter {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            launcher_args: Vec::new(),
        }
    }

    pub fn launcher_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.launcher_args.push(arg.into());
        self
    }

    /// Arguments after the launcher arguments.
    pub fn export_args(request: &ExportRequest) -> Vec<OsString> {
        let mut model = OsString::from("model=");
        model.push(request.checkpoint.as_os_str());
        vec![
            OsString::from("export"),
            model,
            OsString::from(format!("format={}", request.format.framework_id())),
            OsString::from(format!("imgsz={}", request.imgsz)),
        ]
    }
}

impl ModelExporter for CliExporter {
    fn export(&self, request: &ExportRequest) -> Result<ExportArtifact, ExportError> {
        request.validate()?;

        let program = self.program.to_string_lossy().into_owned();
        info!(
            program = %program,
            checkpoint = %request.checkpoint.display(),
            format = %request.format,
            imgsz = %request.imgsz,
            "running model exporter"
        );

        let output = Command::new(&self.program)
            .args(&self.launcher_args)
            .args(Self::export_args(request))
            .output()
            .map_err(|source| ExportError::Spawn {
                program: program.clone(),
                source,
            })?;

        debug!(stdout = %String::from_utf8_lossy(&output.stdout), "exporter output");
        if !output.status.success() {
            return Err(ExportError::ExporterFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let artifact = ExportArtifact::locate(&request.output_dir())?;
        info!(dir = %artifact.dir.display(), "export complete");
        Ok(artifact)
    }
}
