use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use smc_engine::application::analysis_service::AnalysisService;
use smc_engine::application::engine::SmcEngine;
use smc_engine::config::EngineConfig;
use smc_engine::domain::market::CandleStore;
use smc_engine::domain::ports::SignalSink;
use smc_engine::domain::signal::{Signal, SignalStatus};
use smc_engine::domain::validation::CandleValidator;
use smc_engine::infrastructure::observability::Metrics;
use smc_engine::infrastructure::{InMemorySignalSink, JsonLinesSignalSink, source_for_path, symbol_from_path};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Smart-money structure analysis over OHLC candles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one analysis pass over a candle file and print the result as JSON
    Snapshot {
        /// CSV or JSON candle file
        #[arg(short, long)]
        input: PathBuf,

        /// Symbol label (defaults to the file name prefix)
        #[arg(short, long)]
        symbol: Option<String>,

        /// Engine configuration TOML (defaults to environment variables)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Feed candle files one close at a time and print emitted signals as JSON lines
    Replay {
        /// CSV or JSON candle files, replayed in parallel
        #[arg(short, long, num_args = 1.., required = true)]
        input: Vec<PathBuf>,

        /// Engine configuration TOML (defaults to environment variables)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print Prometheus metrics to stderr when done
        #[arg(long)]
        metrics: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Snapshot {
            input,
            symbol,
            config,
        } => snapshot(&input, symbol, config.as_deref()),
        Commands::Replay {
            input,
            config,
            metrics,
        } => replay(&input, config.as_deref(), metrics),
    }
}

fn snapshot(input: &Path, symbol: Option<String>, config: Option<&Path>) -> Result<()> {
    let config = EngineConfig::load(config)?;
    let symbol = symbol.unwrap_or_else(|| symbol_from_path(input));

    let candles = source_for_path(input)?.fetch(&symbol, config.store.timeframe)?;
    CandleValidator::find_gaps(&symbol, &candles, config.store.timeframe);
    let window = candles.len().saturating_sub(config.store.max_candles);

    let mut engine = SmcEngine::new(symbol, config);
    let report = engine.analyze(&candles[window..]);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &report).context("Failed to write analysis output")?;
    writeln!(out)?;
    Ok(())
}

fn replay(inputs: &[PathBuf], config: Option<&Path>, print_metrics: bool) -> Result<()> {
    let config = EngineConfig::load(config)?;
    let metrics = Metrics::new()?;

    let results: Vec<Result<Vec<Signal>>> = inputs
        .par_iter()
        .map(|path| replay_file(path, &config, &metrics))
        .collect();

    let mut sink = JsonLinesSignalSink::new(std::io::stdout());
    for (path, result) in inputs.iter().zip(results) {
        match result {
            Ok(signals) => {
                for signal in &signals {
                    sink.publish(signal)?;
                }
            }
            Err(e) => warn!("Replay of {} failed: {:#}", path.display(), e),
        }
    }
    sink.flush()?;
    info!("Replay finished: {} signals", sink.written());

    if print_metrics {
        eprint!("{}", metrics.encode_text());
    }
    Ok(())
}

fn replay_file(path: &Path, config: &EngineConfig, metrics: &Metrics) -> Result<Vec<Signal>> {
    let symbol = symbol_from_path(path);
    let candles = source_for_path(path)?.fetch(&symbol, config.store.timeframe)?;
    let gaps = CandleValidator::find_gaps(&symbol, &candles, config.store.timeframe);
    if !gaps.is_empty() {
        info!("{}: {} gaps in candle history", symbol, gaps.len());
    }

    let store = Arc::new(RwLock::new(CandleStore::new(
        symbol.clone(),
        config.store.timeframe,
        config.store.max_candles,
    )));
    let sink = InMemorySignalSink::new();
    let emitted = sink.handle();
    let service = AnalysisService::new(store, config.clone(), Box::new(sink), Some(metrics.clone()))?;

    for candle in candles {
        if let Err(e) = service.ingest(candle) {
            warn!("{}: skipping candle: {:#}", symbol, e);
            continue;
        }
        service.run_pass()?;
    }

    let tracked = service.tracked_signals()?;
    let success = tracked
        .iter()
        .filter(|t| t.status == SignalStatus::Success)
        .count();
    info!(
        "{}: {} signals emitted, {} reached TP3",
        symbol,
        tracked.len(),
        success
    );

    let signals = emitted
        .lock()
        .map_err(|_| anyhow::anyhow!("signal buffer lock poisoned"))?
        .clone();
    Ok(signals)
}
