//! Synthetic ECG CLI
//!
//! Generates a dataset of synthetic ECG records with progressive loading,
//! then lists, previews, browses or exports it.

use clap::Parser;
use ecg_synth::{
    analysis::SampleStatistics,
    engine::{Engine, EngineConfig, EngineError},
    loader::{Immediate, Pacer, ThreadPacer},
    render::ascii,
    synthesis::Severity,
};
use rand_core::RngCore;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Datasets at least this large are checked against the category weights.
const DISTRIBUTION_CHECK_MIN_RECORDS: usize = 1000;

/// Allowed deviation of an observed category share.
const DISTRIBUTION_TOLERANCE: f64 = 0.05;

#[derive(Parser, Debug)]
#[command(name = "ecg-synth", version, about = "Generate synthetic ECG records")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Total records to generate
    #[arg(short = 'n', long)]
    records: Option<usize>,

    /// Record duration in seconds
    #[arg(short, long)]
    duration: Option<u32>,

    /// Samples per second
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Seed label for a reproducible dataset
    #[arg(long)]
    seed: Option<String>,

    /// Write records as JSON Lines
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a summary line for the first N records
    #[arg(long, value_name = "N")]
    list: Option<usize>,

    /// Draw the current record in the terminal
    #[arg(long)]
    preview: bool,

    /// Step the cursor forward N times after the initial burst
    #[arg(long, value_name = "N", default_value_t = 0)]
    browse: usize,

    /// Run batches back to back instead of pacing them
    #[arg(long)]
    no_pacing: bool,

    /// Serve Prometheus metrics on this port
    #[cfg(feature = "metrics")]
    #[arg(long)]
    metrics_port: Option<u16>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode record: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "metrics")]
    #[error("metrics: {0}")]
    Metrics(#[from] ecg_synth::metrics::MetricsError),
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("ECG Synth v{}", ecg_synth::VERSION);

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        if let Err(e) = ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed)) {
            warn!("Failed to install Ctrl-C handler: {}", e);
        }
    }

    let result = match args.seed.as_deref() {
        Some(label) => {
            info!(seed = label, "Using reproducible random source");
            Engine::from_seed_label(config, label)
                .map_err(CliError::from)
                .and_then(|engine| run(engine, &args, &stop))
        }
        None => Engine::new(config)
            .map_err(CliError::from)
            .and_then(|engine| run(engine, &args, &stop)),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<EngineConfig, ecg_synth::ConfigError> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    if let Some(records) = args.records {
        config.loader.total_records = records;
    }
    if let Some(duration) = args.duration {
        config.synthesis.record_duration_secs = duration;
    }
    if let Some(rate) = args.sample_rate {
        config.synthesis.sample_rate_hz = rate;
    }

    config.validate()?;
    Ok(config)
}

fn run<R: RngCore>(
    mut engine: Engine<R>,
    args: &Args,
    stop: &AtomicBool,
) -> Result<(), CliError> {
    let publisher = Publisher::new(args)?;

    let pacing = engine.config().pacing.clone();
    let mut pacer: Box<dyn Pacer> = if args.no_pacing {
        Box::new(Immediate)
    } else {
        Box::new(ThreadPacer {
            frame_interval: pacing.frame_interval(),
            idle_fallback: pacing.idle_fallback(),
        })
    };

    engine.start();
    drain(&mut engine, pacer.as_mut(), stop, &publisher);

    // Simulated viewer stepping through records
    for _ in 0..args.browse {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        match engine.next_record() {
            Ok(record) => info!("Viewing {}", record.summary()),
            Err(e) => {
                warn!("Navigation failed: {}", e);
                break;
            }
        }
        drain(&mut engine, pacer.as_mut(), stop, &publisher);
    }

    report(&engine);

    if let Some(n) = args.list {
        for record in engine.store().iter().take(n) {
            let marker = match record.diagnosis().severity() {
                Severity::Normal => ' ',
                Severity::Caution => '!',
                Severity::Warning => '‼',
            };
            println!("{} {}", marker, record.summary());
        }
    }

    if args.preview {
        match engine.current() {
            Ok(record) => {
                println!("{}", record.summary());
                for line in ascii::plot(record.samples(), 100, 15, 4.0) {
                    println!("{}", line);
                }
            }
            Err(e) => warn!("Nothing to preview: {}", e),
        }
    }

    if let Some(path) = &args.output {
        let mut writer = BufWriter::new(File::create(path)?);
        for record in engine.store() {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        info!(path = %path.display(), records = engine.store().len(), "Records exported");
    }

    publisher.linger(stop);
    Ok(())
}

fn drain<R: RngCore>(
    engine: &mut Engine<R>,
    pacer: &mut dyn Pacer,
    stop: &AtomicBool,
    publisher: &Publisher,
) {
    let mut last_percent = 0;
    engine.run_until_settled(pacer, stop, |engine, report| {
        let percent = report.progress.percent() as u32;
        if percent / 10 > last_percent / 10 || report.progress.is_complete() {
            info!(phase = ?report.phase, "Progress {}", report.progress);
            last_percent = percent;
        }
        publisher.publish(engine);
    });
}

fn report<R: RngCore>(engine: &Engine<R>) {
    let store = engine.store();
    let distribution = store.distribution();
    let implausible = store
        .iter()
        .filter(|r| !SampleStatistics::analyze(r).looks_plausible())
        .count();

    info!(
        records = store.len(),
        normal = distribution.normal,
        tachycardia = distribution.tachycardia,
        bradycardia = distribution.bradycardia,
        arrhythmia = distribution.arrhythmia,
        draws = engine.synthesizer().random().draws(),
        refills = engine.synthesizer().random().refills(),
        "Generation finished ({:?})",
        engine.loader().phase()
    );

    if implausible > 0 {
        warn!(implausible, "Some records failed the sample sanity check");
    }

    if store.len() >= DISTRIBUTION_CHECK_MIN_RECORDS {
        if let Err(violation) = distribution.check_weights(DISTRIBUTION_TOLERANCE) {
            warn!("Category distribution off: {}", violation);
        }
    }
}

/// Pushes engine state to the metrics exporter when one is running.
struct Publisher {
    #[cfg(feature = "metrics")]
    state: Option<ecg_synth::metrics::SharedState>,
}

impl Publisher {
    #[cfg(feature = "metrics")]
    fn new(args: &Args) -> Result<Self, CliError> {
        use ecg_synth::metrics::{MetricsRegistry, MetricsServer, MetricsServerConfig};

        let Some(port) = args.metrics_port else {
            return Ok(Self { state: None });
        };

        let registry = MetricsRegistry::new()?;
        let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
        let state = server.state();

        std::thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("Failed to start metrics runtime: {}", e);
                    return;
                }
            };
            if let Err(e) = runtime.block_on(server.run()) {
                error!("Metrics server failed: {}", e);
            }
        });

        Ok(Self { state: Some(state) })
    }

    #[cfg(not(feature = "metrics"))]
    fn new(_args: &Args) -> Result<Self, CliError> {
        Ok(Self {})
    }

    #[cfg(feature = "metrics")]
    fn publish<R: RngCore>(&self, engine: &Engine<R>) {
        use ecg_synth::metrics::MetricsSnapshot;

        if let Some(state) = &self.state {
            let snapshot = MetricsSnapshot::from_components(
                engine.loader(),
                engine.store(),
                engine.synthesizer().random(),
            );
            state.blocking_write().update(snapshot);
        }
    }

    #[cfg(not(feature = "metrics"))]
    fn publish<R: RngCore>(&self, _engine: &Engine<R>) {}

    /// Keeps serving metrics until Ctrl-C.
    #[cfg(feature = "metrics")]
    fn linger(&self, stop: &AtomicBool) {
        if self.state.is_some() {
            info!("Serving metrics; press Ctrl-C to exit");
            while !stop.load(Ordering::Relaxed) {
                std::thread::sleep(std::time::Duration::from_millis(200));
            }
        }
    }

    #[cfg(not(feature = "metrics"))]
    fn linger(&self, _stop: &AtomicBool) {}
}
