//! Vertical card display for exported model metadata.

use std::path::Path;

use detport_core::ModelMetadata;

const MAX_LIST_ITEMS: usize = 20;

/// Print model metadata as a card grouped into sections.
pub fn print_model_card(path: &Path, model: &ModelMetadata) {
    println!("=== {} ===", path.display());
    if let Some(description) = &model.description {
        println!("{description}");
    }
    println!();

    print_section(
        "Model",
        &[
            ("task", model.task.clone()),
            ("version", model.version.clone()),
            ("author", model.author.clone()),
            ("date", model.date.clone()),
            ("license", model.license.clone()),
            ("docs", model.docs.clone()),
        ],
    );
    print_section(
        "Input",
        &[
            ("imgsz", model.imgsz.as_deref().map(format_imgsz)),
            ("stride", model.stride.map(|v| v.to_string())),
            ("batch", model.batch.map(|v| v.to_string())),
        ],
    );
    print_classes(model);
}

fn print_section(header: &str, rows: &[(&str, Option<String>)]) {
    if rows.iter().all(|(_, v)| v.is_none()) {
        return;
    }
    println!("{header}");
    for (name, value) in rows {
        if let Some(value) = value {
            println!("  {:<26} {}", name, value);
        }
    }
    println!();
}

fn print_classes(model: &ModelMetadata) {
    let len = model.class_count();
    println!("Classes ({len})");
    for (index, name) in model.labels.iter().enumerate().take(MAX_LIST_ITEMS) {
        println!("  {:>4}  {}", index, name);
    }
    if len > MAX_LIST_ITEMS {
        println!("  ... and {} more", len - MAX_LIST_ITEMS);
    }
}

fn format_imgsz(dims: &[u32]) -> String {
    dims.iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(" x ")
}
