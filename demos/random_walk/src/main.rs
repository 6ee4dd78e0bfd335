//! Random Walk Example
//!
//! A periodic clock drives a seeded random source. One value accumulates the
//! steps into a walk; a reset-on-read copy of it is sampled at a slower
//! rate, so each sample is the distance covered since the previous one.

mod config;

use clap::Parser;
use config::{DemoConfig, DemoError};
use simval_core::{
    seed, Accumulate, Clock, PeriodicClock, RandomIntSource, ResetOnRead, SimpleValue, Value,
};
use simval_trace::TraceHook;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "random-walk")]
#[command(about = "Sample a seeded random walk through a reset-on-read value", long_about = None)]
struct Args {
    /// RON config file; defaults apply to anything it leaves out
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Master seed, overriding the config
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of samples, overriding the config
    #[arg(short, long)]
    reads: Option<u32>,

    /// Disable per-cycle trace lines
    #[arg(long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match load(&args).and_then(run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("random walk failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load(args: &Args) -> Result<DemoConfig, DemoError> {
    let mut config = match &args.config {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(reads) = args.reads {
        config.reads = reads;
    }
    if args.quiet {
        config.trace = false;
    }
    Ok(config)
}

fn run(config: DemoConfig) -> Result<(), DemoError> {
    if let Some(master_seed) = config.seed {
        seed::init(master_seed);
    }

    let clock = PeriodicClock::shared(config.interval())?;
    let source = Arc::new(RandomIntSource::new(clock.clone(), config.min, config.max)?);
    if let Some(state) = seed::current() {
        info!(
            master_seed = state.master_seed,
            auto = state.auto_initialized,
            "seed registry ready"
        );
    }

    let walk = SimpleValue::new(source.clone(), vec![Accumulate::shared()]);
    let sampled = ResetOnRead::from_boxed(walk.clone_value(), 0);
    if config.trace {
        sampled.set_update_hook(Some(Arc::new(TraceHook::printing())));
    }

    clock.start();
    for _ in 0..config.reads {
        println!(">>> ResetOnRead Value: {}", sampled.value());
        std::thread::sleep(config.read_interval());
    }
    clock.stop();

    println!("\n=== Final Stats ===");
    let clock_stats = clock.stats();
    println!(
        "Clock: ticks={} running={} interval={:?}",
        clock_stats.tick_count, clock_stats.is_running, clock_stats.interval
    );
    let source_stats = source.stats();
    println!(
        "Source: generations={} subscribers={}",
        source_stats.generation_count, source_stats.subscriber_count
    );
    let value_stats = sampled.stats();
    println!(
        "Value: updates={} current={} transforms={}",
        value_stats.update_count, value_stats.current_value, value_stats.transform_count
    );
    println!("Walk: position={}", walk.value());

    Ok(())
}
