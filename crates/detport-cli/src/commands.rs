//! Subcommand bodies.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use detport_core::labels::{ExtractOptions, LABEL_FILE_NAME};
use detport_core::{
    ModelMetadata, extract_label_file, extract_labels, read_label_file, resolve_metadata_path,
};
use detport_export::{ExportRequest, ModelExporter, export_with_labels};

use crate::display;

pub fn labels(metadata: &Path, output: Option<&Path>, opts: &ExtractOptions) -> anyhow::Result<()> {
    let metadata = resolve_metadata_path(metadata);
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_label_path(&metadata));

    let labels = extract_label_file(&metadata, &output, opts).with_context(|| {
        format!(
            "extracting labels from {} into {}",
            metadata.display(),
            output.display()
        )
    })?;
    println!("Wrote {} labels to {}", labels.len(), output.display());
    Ok(())
}

pub fn export<E: ModelExporter>(
    exporter: &E,
    request: &ExportRequest,
    opts: Option<&ExtractOptions>,
) -> anyhow::Result<()> {
    let context = || format!("exporting {} as {}", request.checkpoint.display(), request.format);
    match opts {
        Some(opts) => {
            let out = export_with_labels(exporter, request, opts).with_context(context)?;
            println!("Exported to {}", out.artifact.dir.display());
            println!(
                "Wrote {} labels to {}",
                out.labels.len(),
                out.labels_path.display()
            );
        }
        None => {
            let artifact = exporter.export(request).with_context(context)?;
            println!("Exported to {}", artifact.dir.display());
        }
    }
    Ok(())
}

pub fn inspect(metadata: &Path, json: bool, opts: &ExtractOptions) -> anyhow::Result<()> {
    let metadata = resolve_metadata_path(metadata);
    let model = ModelMetadata::from_path(&metadata, opts)
        .with_context(|| format!("reading {}", metadata.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&model)?);
    } else {
        display::print_model_card(&metadata, &model);
    }
    Ok(())
}

/// Succeeds only when `labels` holds exactly the bytes extraction would write.
pub fn verify(metadata: &Path, labels: &Path, opts: &ExtractOptions) -> anyhow::Result<()> {
    let metadata = resolve_metadata_path(metadata);
    let document = fs::read_to_string(&metadata)
        .with_context(|| format!("reading {}", metadata.display()))?;
    let expected = extract_labels(&document, opts)
        .with_context(|| format!("extracting labels from {}", metadata.display()))?;
    let actual = fs::read(labels).with_context(|| format!("reading {}", labels.display()))?;

    let expected_bytes = expected.to_file_contents().into_bytes();
    if actual == expected_bytes {
        println!("{} matches ({} labels)", labels.display(), expected.len());
        return Ok(());
    }

    let found = read_label_file(labels).with_context(|| format!("reading {}", labels.display()))?;
    if let Some(line) = (0..expected.len().max(found.len()))
        .find(|&i| expected.get(i) != found.get(i))
    {
        anyhow::bail!(
            "{} does not match {} at line {}: expected {:?}, found {:?}",
            labels.display(),
            metadata.display(),
            line + 1,
            expected.get(line).unwrap_or("<end of file>"),
            found.get(line).unwrap_or("<end of file>"),
        );
    }
    anyhow::bail!(
        "{} does not match {}: last line is missing its trailing newline",
        labels.display(),
        metadata.display()
    );
}

fn default_label_path(metadata: &Path) -> PathBuf {
    metadata
        .parent()
        .map(|dir| dir.join(LABEL_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(LABEL_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_label_path_sits_next_to_metadata() {
        assert_eq!(
            default_label_path(Path::new("best_web_model/metadata.yaml")),
            PathBuf::from("best_web_model/labels.txt")
        );
        assert_eq!(
            default_label_path(Path::new("metadata.yaml")),
            PathBuf::from("labels.txt")
        );
    }
}
