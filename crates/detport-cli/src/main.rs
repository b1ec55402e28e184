mod commands;
mod display;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use detport_core::labels::{DEFAULT_FIELD, ExtractOptions, IndexPolicy};
use detport_export::exporter::DEFAULT_PROGRAM;
use detport_export::{ExportFormat, ImageSize};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "detport",
    version,
    about = "Export detection checkpoints and extract their label files"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write labels.txt from an exported model's metadata.yaml
    Labels {
        /// metadata.yaml, or the export directory containing it
        metadata: PathBuf,
        /// Output path [default: labels.txt next to the metadata]
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Convert a .pt checkpoint with the framework exporter, then write labels.txt
    Export {
        checkpoint: PathBuf,
        /// web (tfjs) or mobile (tflite)
        #[arg(short, long, default_value = "web")]
        format: ExportFormat,
        /// Input resolution: N, H,W or HxW
        #[arg(long, default_value = "640")]
        imgsz: ImageSize,
        /// Exporter executable
        #[arg(long, env = "DETPORT_YOLO_BIN", default_value = DEFAULT_PROGRAM)]
        yolo_bin: PathBuf,
        /// Argument passed to the exporter executable before `export` (repeatable)
        #[arg(long = "yolo-arg", allow_hyphen_values = true)]
        yolo_args: Vec<String>,
        /// Skip label extraction
        #[arg(long)]
        no_labels: bool,
        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Summarise an exported model's metadata
    Inspect {
        metadata: PathBuf,
        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Check that a label file matches its metadata
    Verify {
        metadata: PathBuf,
        labels: PathBuf,
        #[command(flatten)]
        extract: ExtractArgs,
    },
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Metadata field holding the class mapping
    #[arg(long, env = "DETPORT_LABEL_FIELD", default_value = DEFAULT_FIELD)]
    field: String,
    /// Accept gaps in class indices (names are still written in index order)
    #[arg(long)]
    allow_gaps: bool,
}

impl ExtractArgs {
    fn options(&self) -> ExtractOptions {
        ExtractOptions {
            field: self.field.clone(),
            policy: if self.allow_gaps {
                IndexPolicy::Sorted
            } else {
                IndexPolicy::Contiguous
            },
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!("detport v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Labels {
            metadata,
            output,
            extract,
        } => commands::labels(&metadata, output.as_deref(), &extract.options()),
        Command::Export {
            checkpoint,
            format,
            imgsz,
            yolo_bin,
            yolo_args,
            no_labels,
            extract,
        } => {
            let exporter = yolo_args.into_iter().fold(
                detport_export::CliExporter::new(yolo_bin),
                |exporter, arg| exporter.launcher_arg(arg),
            );
            let request = detport_export::ExportRequest::new(checkpoint, format).with_imgsz(imgsz);
            let opts = (!no_labels).then(|| extract.options());
            commands::export(&exporter, &request, opts.as_ref())
        }
        Command::Inspect {
            metadata,
            json,
            extract,
        } => commands::inspect(&metadata, json, &extract.options()),
        Command::Verify {
            metadata,
            labels,
            extract,
        } => commands::verify(&metadata, &labels, &extract.options()),
    }
}

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
