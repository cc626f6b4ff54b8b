use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use signalchain::engine::sink::ConsoleSink;
use signalchain::engine::{Engine, Shutdown};
use signalchain::settings::{Settings, StageConfig};
use std::io::{self, BufWriter};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "signalchain")]
#[command(version)]
#[command(about = "Generates a sine wave and streams it block by block through a chain of stages.")]
struct Args {
    #[arg(long, env = "SIGNALCHAIN_CONFIG", help = "JSON settings file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Samples per second")]
    sample_rate: Option<u32>,

    #[arg(long, help = "Samples per block")]
    block_size: Option<usize>,

    #[arg(long, help = "Source frequency in Hz")]
    frequency: Option<f64>,

    #[arg(long, help = "Pause between blocks in milliseconds")]
    cadence_ms: Option<u64>,

    #[arg(
        long = "stage",
        value_name = "KIND:PARAMS",
        help = "Stage to append, e.g. gain:2.0, delay:4800, clip:0.8 (replaces configured stages)"
    )]
    stages: Vec<StageConfig>,

    #[arg(long, help = "Stop after this many blocks")]
    cycles: Option<u64>,

    #[arg(long, default_value_t = 8, help = "Decimal places per printed sample")]
    precision: usize,

    #[arg(long, help = "Write the effective settings to this file and exit")]
    save_config: Option<PathBuf>,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(sample_rate) = self.sample_rate {
            settings.sample_rate = sample_rate;
        }
        if let Some(block_size) = self.block_size {
            settings.block_size = block_size;
        }
        if let Some(frequency) = self.frequency {
            settings.frequency = frequency;
        }
        if let Some(cadence_ms) = self.cadence_ms {
            settings.cadence_ms = cadence_ms;
        }
        if !self.stages.is_empty() {
            settings.stages.clone_from(&self.stages);
        }
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    info!("signalchain v{}", env!("CARGO_PKG_VERSION"));
    info!("Args: {:?}", args);

    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply(&mut settings);
    settings.validate().context("invalid configuration")?;

    info!("Settings:\n{settings}");

    if let Some(path) = &args.save_config {
        settings
            .save_to(path)
            .with_context(|| format!("failed to save settings to '{}'", path.display()))?;
        info!("Settings saved to {}", path.display());
        return Ok(());
    }

    let sink = ConsoleSink::new(BufWriter::new(io::stdout().lock()), args.precision);
    let (mut engine, stats) =
        Engine::from_settings(&settings, sink).context("failed to create engine")?;

    let shutdown = Shutdown::new();
    let handler_shutdown = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("Ctrl+C received, shutting down...");
        handler_shutdown.trigger();
    })
    .context("error setting Ctrl+C handler")?;

    let cycles = engine.run(&shutdown, args.cycles)?;

    let stats = stats.snapshot();
    match stats.peak_dbfs() {
        Some(db) => info!(
            "Processed {cycles} blocks ({} samples), peak {db:.2} dBFS",
            stats.samples
        ),
        None => info!(
            "Processed {cycles} blocks ({} samples), silent",
            stats.samples
        ),
    }

    Ok(())
}
