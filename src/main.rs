//! Planet Weather - Entry Point
//!
//! Loads the planet dataset, starts the weather controllers and prints a
//! weather report for every planet a given number of times.

use std::path::PathBuf;

use clap::Parser;
use tokio::runtime::Runtime;

use planet_weather::core::config::WeatherConfig;
use planet_weather::core::error::Result;
use planet_weather::data::DataReader;
use planet_weather::simulation::WeatherSystem;

/// Simulated weather reports for a set of planets
#[derive(Parser, Debug)]
#[command(name = "planet-weather")]
#[command(about = "Print simulated weather reports for every planet in a dataset")]
struct Args {
    /// Number of report cycles
    #[arg(default_value_t = 20)]
    times: u32,

    /// Planet dataset (JSON)
    #[arg(long, default_value = "data/all_data.json")]
    data: PathBuf,

    /// Optional TOML config overriding tick intervals
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for controller RNGs
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    // Logs go to stderr, reports to stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("planet_weather=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => WeatherConfig::from_file(path)?,
        None => WeatherConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let rt = Runtime::new()?;
    rt.block_on(run(args, config))
}

async fn run(args: Args, config: WeatherConfig) -> Result<()> {
    let reader = DataReader::open(&args.data)?;
    let mut system = WeatherSystem::new(reader, config)?;
    system.start()?;
    tracing::info!(cycles = args.times, "reporting");

    let outcome = report_loop(&mut system, args.times).await;
    let stopped = system.shutdown().await;
    outcome.and(stopped)
}

async fn report_loop(system: &mut WeatherSystem, times: u32) -> Result<()> {
    let interval = system.config().report_interval();
    for cycle in 0..times {
        {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let failures = system.report_all(&mut out)?;
            if !failures.is_empty() {
                tracing::debug!(cycle, failed = failures.len(), "partial report cycle");
            }
        }

        if cycle + 1 == times {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
    }
    Ok(())
}
