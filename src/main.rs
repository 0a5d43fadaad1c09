use anyhow::{Context, Result};
use chat_analytics::{Aggregator, Reporter, RunDirectory, RunSummary, SvgCharts};
use chat_core::config::AnalysisConfig;
use chat_core::export::load_export;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "chat-analysis",
    about = "Charts and summary reports from a ChatGPT conversation export",
    version,
    author
)]
struct Cli {
    /// Path to the exported conversations.json
    input: PathBuf,

    /// Path to config file (default: ~/.config/chat-analysis/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Parent directory for the run's output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Bucket timestamps at this fixed offset from UTC, in minutes
    #[arg(long, allow_negative_numbers = true)]
    utc_offset_minutes: Option<i32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up tracing.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "chat_analysis=info,chat_core=info,chat_analytics=info,warn".into()),
        )
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(summary) if summary.is_complete() => ExitCode::SUCCESS,
        Ok(summary) => {
            eprintln!(
                "Error: {} of {} artifacts could not be written",
                summary.failures.len(),
                summary.failures.len() + summary.written.len()
            );
            for failure in &summary.failures {
                eprintln!("  {}: {}", failure.artifact, failure.error);
            }
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<RunSummary> {
    // Load config.
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load_from(path)?,
        None => AnalysisConfig::load()?,
    };

    // Apply CLI overrides.
    if let Some(dir) = cli.output_dir {
        config.output.root = dir;
    }
    if let Some(minutes) = cli.utc_offset_minutes {
        config.timezone.utc_offset_minutes = minutes;
    }
    let offset = config.timezone.offset()?;

    // Load before touching the filesystem so a bad export leaves no output behind.
    tracing::info!("Parsing conversations from {}", cli.input.display());
    let export = load_export(&cli.input)?;

    let aggregator = Aggregator::new(&export.conversations, offset);

    let started = chrono::Local::now().naive_local();
    let dir = RunDirectory::create(&config.output.root, &config.output.dir_prefix, started)
        .with_context(|| {
            format!(
                "Failed to create output directory under {}",
                config.output.root.display()
            )
        })?;

    tracing::info!("Generating reports and visualizations");
    let reporter = Reporter::new(
        Box::new(SvgCharts::from_config(&config.charts)),
        config.charts.max_models,
    )
    .with_bucket_limit(config.charts.max_buckets);
    let summary = reporter.write_all(&aggregator, &dir);

    println!("\nAnalysis complete! Results saved to: {}", dir.path().display());
    for path in &summary.written {
        println!("- {}", path.display());
    }

    Ok(summary)
}
