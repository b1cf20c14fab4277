use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use seismic_detector::relay::WindowRelay;
use seismic_detector::sink::JsonLinesSink;
use seismic_detector::source::SourceManager;
use seismic_detector::telemetry::TelemetryCollector;
use seismic_detector::{replay, AppConfig, DetectionOrchestrator, Segment};

#[derive(Parser, Debug)]
#[command(
    name = "seismic_cli",
    about = "Multi-channel seismic event detector"
)]
struct Cli {
    /// Configuration file (defaults to config/detector.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one batch file through the detectors and print the event
    Detect {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        models_dir: Option<PathBuf>,
    },
    /// Replay recorded channels end to end, one JSON line per batch
    Replay {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        models_dir: Option<PathBuf>,
        /// Also print every 48th reading of this channel (numbered from 1)
        #[arg(long)]
        preview_channel: Option<usize>,
    },
    /// Serve the HTTP request layer
    Serve {
        #[arg(long)]
        addr: Option<String>,
    },
}

/// Batch file: either a bare list of segments or a request body
#[derive(Deserialize)]
#[serde(untagged)]
enum BatchFile {
    Request { matrices: Vec<Segment> },
    Segments(Vec<Segment>),
}

impl BatchFile {
    fn into_segments(self) -> Vec<Segment> {
        match self {
            BatchFile::Request { matrices } => matrices,
            BatchFile::Segments(segments) => segments,
        }
    }
}

fn main() -> ExitCode {
    seismic_detector::init_logging();

    match run() {
        Ok(()) => ExitCode::from(0),
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    match cli.command {
        Commands::Detect { input, models_dir } => {
            if let Some(dir) = models_dir {
                config.detector.models_dir = dir;
            }
            runtime.block_on(run_detect(&config, input))
        }
        Commands::Replay {
            data_dir,
            models_dir,
            preview_channel,
        } => {
            if preview_channel.is_some() {
                config.relay.preview_channel = preview_channel;
            }
            if let Some(dir) = data_dir {
                config.source.data_dir = dir;
            }
            if let Some(dir) = models_dir {
                config.detector.models_dir = dir;
            }
            runtime.block_on(run_replay(&config))
        }
        Commands::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.http.bind_addr.clone());
            let addr: SocketAddr = addr
                .parse()
                .with_context(|| format!("invalid bind address {}", addr))?;
            runtime.block_on(run_serve(&config, addr))
        }
    }
}

fn stdout_orchestrator(config: &AppConfig) -> Result<DetectionOrchestrator> {
    DetectionOrchestrator::from_config(
        &config.detector,
        Arc::new(JsonLinesSink::new(std::io::stdout())),
        Arc::new(TelemetryCollector::default()),
    )
    .context("loading channel detectors")
}

async fn run_detect(config: &AppConfig, input: PathBuf) -> Result<()> {
    let contents =
        fs::read_to_string(&input).with_context(|| format!("reading {}", input.display()))?;
    let batch: BatchFile = serde_json::from_str(&contents)
        .with_context(|| format!("parsing batch {}", input.display()))?;

    let orchestrator = stdout_orchestrator(config)?;
    orchestrator
        .start_detection(batch.into_segments())
        .await
        .context("batch rejected")?;
    Ok(())
}

async fn run_replay(config: &AppConfig) -> Result<()> {
    let orchestrator = stdout_orchestrator(config)?;
    let channels = orchestrator.channel_count();

    let source = SourceManager::from_config(&config.source, channels)
        .with_context(|| format!("opening recordings in {}", config.source.data_dir.display()))?;
    let relay = WindowRelay::from_config(&config.relay, channels);

    let summary = replay::run(source, relay, &orchestrator).await;
    log::info!(
        "[Replay] {} frames, {} batches, {} rejected, {} previews",
        summary.frames,
        summary.batches,
        summary.rejected,
        summary.previews
    );
    Ok(())
}

#[cfg(feature = "http")]
async fn run_serve(config: &AppConfig, addr: SocketAddr) -> Result<()> {
    seismic_detector::http::serve(config, addr).await
}

#[cfg(not(feature = "http"))]
async fn run_serve(_config: &AppConfig, _addr: SocketAddr) -> Result<()> {
    anyhow::bail!("built without the `http` feature")
}
