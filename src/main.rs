//! FedSense command line — entry point.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use fedsense::core::SimulationConfig;
use fedsense::federated::{Network, RunOutcome};
use fedsense::monitoring::{init_logging, LogLevel, LoggerConfig};
use fedsense::visualization::console::{format_network_health, format_sensor_analysis};
use fedsense::visualization::{ChartExporter, VisualizationSink};

const INFO: &str = "\
Federated Sensor Network (FedSense)

Components:
  - Sensors with local pattern learning
  - Privacy-preserving pattern sharing
  - Network health aggregation
  - Chart export

Parameters:
  --hours      Simulation hours
  --sensors    Number of sensors
  --interval   Seconds between simulated hours
  --output     Directory for results

Example Usage:
  fedsense run
  fedsense run --hours 200 --sensors 5
  fedsense run --output ./results";

#[derive(Parser)]
#[command(
    name = "fedsense",
    about = "Federated Sensor Network (FedSense) simulation",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a federated sensor network simulation.
    Run {
        /// Number of simulation hours.
        #[arg(long, default_value_t = 100)]
        hours: u32,

        /// Number of sensors (cycles factory, office, outdoor).
        #[arg(long)]
        sensors: Option<usize>,

        /// Seconds to wait between simulated hours.
        #[arg(long, default_value_t = 0.2)]
        interval: f64,

        /// Seed for reproducible runs.
        #[arg(long)]
        seed: Option<u64>,

        /// JSON simulation config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for the final chart.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Forecast every sensor's next reading each hour.
        #[arg(long)]
        forecast: bool,
    },

    /// Display information about the system.
    Info,
}

struct RunArgs {
    hours: u32,
    sensors: Option<usize>,
    interval: f64,
    seed: Option<u64>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    forecast: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level: LogLevel = cli.log_level.parse()?;
    init_logging(&LoggerConfig {
        level,
        ..LoggerConfig::default()
    });

    match cli.command {
        Commands::Run {
            hours,
            sensors,
            interval,
            seed,
            config,
            output,
            forecast,
        } => {
            run(RunArgs {
                hours,
                sensors,
                interval,
                seed,
                config,
                output,
                forecast,
            })
            .await
        }
        Commands::Info => {
            println!("{}", INFO);
            Ok(())
        }
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    if args.hours == 0 {
        bail!("--hours must be positive");
    }
    let interval = Duration::try_from_secs_f64(args.interval)
        .with_context(|| format!("invalid --interval {}", args.interval))?;

    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(count) = args.sensors {
        config = config.with_sensor_count(count);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    config.forecast_each_tick |= args.forecast;

    let network = Network::from_config(&config, ChartExporter::new())?.with_tick_interval(interval);

    let stop = network.stop_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.request_stop();
        }
    });

    println!("Federated Sensor Network Simulation");
    println!("Showing detailed pattern analysis and privacy metrics\n");

    let hours = args.hours;
    let (network, report) = tokio::task::spawn_blocking(move || {
        let mut network = network;
        let report = network.run_simulation(hours);
        (network, report)
    })
    .await
    .context("simulation thread panicked")?;

    let report = report?;

    println!("{}\n", format_network_health(&network.get_network_metrics()));
    println!("{}", format_sensor_analysis(network.sensors()));

    match report.outcome {
        RunOutcome::Completed => println!("Simulation Complete!"),
        RunOutcome::Interrupted { at_hour } => {
            println!("Simulation interrupted by user at hour {}", at_hour)
        }
    }

    if let Some(dir) = args.output {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        let path = dir.join("simulation_final.json");
        network.sink().save(&path)?;
        println!("Saved chart to {}", path.display());
    }

    Ok(())
}
