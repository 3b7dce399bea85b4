//! Batch Conversion CLI
//!
//! Command-line surface for the conversion pipeline: pass the files to
//! convert, watch progress on stderr, press Ctrl-C to cancel.

use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};

use convert_core::{BatchState, ConversionKind, ConvertConfig, JobController};

#[derive(Parser)]
#[command(name = "batch-convert")]
#[command(about = "Convert a set of files with a bounded worker pool")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Files to convert
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Conversion kind label (pdf-to-docx, resize-image); anything else
    /// is treated as unknown
    #[arg(short, long, default_value = "unknown")]
    kind: String,

    /// Number of pool workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Output directory (default: the user's Downloads)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Delay per simulated step in milliseconds
    #[arg(long)]
    step_delay_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    convert_core::logging::init_logging();
    let cli = Cli::parse();

    let mut config = ConvertConfig::from_env()?;
    if let Some(workers) = cli.workers {
        config.worker_count = workers;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = Some(output_dir);
    }
    if let Some(step_delay_ms) = cli.step_delay_ms {
        config.step_delay_ms = step_delay_ms;
    }
    let kind = ConversionKind::from_label(&cli.kind);

    info!("Selected files:");
    for file in &cli.files {
        info!(" - {}", file.display());
    }

    let controller = JobController::new(config)?;
    let handle = controller.start_batch(cli.files, kind).await?;
    info!(batch_id = %handle.batch_id(), kind = %kind, "conversion started");

    let summary = tokio::select! {
        summary = handle.wait() => summary,
        _ = signal::ctrl_c() => {
            warn!("Conversion process cancelled.");
            handle.cancel();
            handle.wait().await
        }
    };

    info!(
        state = %summary.state,
        completed = summary.completed,
        failed = summary.failed,
        cancelled = summary.cancelled,
        total = summary.total,
        "batch finished"
    );

    if summary.state != BatchState::Complete {
        std::process::exit(1);
    }
    Ok(())
}
