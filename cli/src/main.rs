use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};

use stark::logging::{self, LogFormat};
use stark::{load_config, Config, JobStatus, PrintService};

/// Queue documents for conversion and printing, then report their history.
#[derive(Parser, Debug)]
#[command(name = "stark", version)]
struct Cli {
    /// JSON config file; built-in defaults are used when omitted
    #[arg(short, long, env = "STARK_CONFIG")]
    config: Option<PathBuf>,

    /// Client identifier recorded in the job history
    #[arg(long, default_value = "cli")]
    client: String,

    /// Default log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format: text or json
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Documents to print (pdf, docx, pptx, xlsx)
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level, cli.log_format)?;
    info!("Starting stark v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::SeqCst);
        })
        .context("Failed to install Ctrl+C handler")?;
    }

    let service = PrintService::start(&config).context("Failed to start print service")?;

    let mut rejected = 0usize;
    for path in &cli.files {
        if interrupted.load(Ordering::SeqCst) {
            warn!("Interrupted, not submitting remaining files");
            break;
        }

        match submit(&service, path, &cli.client) {
            Ok(job_id) => info!("Submitted {} as {}", path.display(), job_id),
            Err(e) => {
                rejected += 1;
                error!("Failed to submit {}: {:#}", path.display(), e);
            }
        }
    }

    let health = service.health();
    info!(
        "Waiting for {} queued job(s) on {} worker(s)",
        health.queue_size, health.workers
    );

    let ledger = Arc::clone(service.ledger());
    service.shutdown();

    let history = ledger.recent(config.history.query_limit);
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({ "history": history }))?
    );

    let failed = history
        .iter()
        .filter(|e| matches!(e.status, JobStatus::ConversionFailed | JobStatus::PrintFailed))
        .count();
    if rejected > 0 || failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn submit(service: &PrintService, path: &Path, client: &str) -> Result<String> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    Ok(service.gate().accept(&filename, client, file)?)
}
