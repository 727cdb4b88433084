//! Car Interface CLI Application
//!
//! Command-line driver for the car-interface control core:
//! - Replays a candump log cycle by cycle and prints the frames the core
//!   would send, together with the decoded vehicle state
//! - Without a log, dumps the outbound schedule for a number of silent cycles
//! - Loads the DBC catalog, bus assignment and an optional variant override
//!   from a TOML config

use anyhow::{bail, Context, Result};
use car_interface::{CarInterface, CycleOutput, SignalDatabase, VariantConfig, VehicleState};
use clap::Parser;
use std::path::PathBuf;

mod candump;
mod config;
mod replay;
mod report;

use config::{AppConfig, OutputFormat};
use replay::Replay;
use report::Report;

/// Car Interface - Run the vehicle control core against recorded traffic
#[derive(Parser, Debug)]
#[command(name = "car-interface")]
#[command(about = "Replay CAN logs through the vehicle control core", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a candump log file to replay
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Path to DBC file(s) (can be repeated)
    #[arg(long, value_name = "FILE")]
    dbc: Vec<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Cycles to run when no log is given
    #[arg(long, value_name = "COUNT", default_value_t = 100)]
    cycles: u64,

    /// Requested steering torque fraction [-1, 1]
    #[arg(long, allow_hyphen_values = true)]
    steer: Option<f64>,

    /// Requested gas fraction [0, 1]
    #[arg(long)]
    gas: Option<f64>,

    /// Requested brake fraction [0, 1]
    #[arg(long)]
    brake: Option<f64>,

    /// Engage control
    #[arg(long)]
    enabled: bool,

    /// Ask the cruise system to cancel
    #[arg(long)]
    cancel: bool,

    /// Emit JSON lines instead of text
    #[arg(long)]
    json: bool,

    /// Leave the decoded vehicle state out of the output
    #[arg(long)]
    no_state: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Car Interface CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using control core v{}", car_interface::VERSION);

    let config = match &args.config {
        Some(path) => {
            let config = config::load_config(path)?;
            log::info!("Configuration loaded: {:?}", path);
            config
        }
        None => AppConfig::default(),
    };
    let config = merge_args(config, &args);

    if config.input.dbc_files.is_empty() {
        bail!("No DBC file given; use --dbc <FILE> or [input].dbc_files");
    }

    let mut db = SignalDatabase::new();
    for path in &config.input.dbc_files {
        db.add_dbc(path)
            .with_context(|| format!("Failed to load DBC: {:?}", path))?;
    }
    let stats = db.stats();
    log::info!(
        "Signal database: {} messages, {} signals",
        stats.num_messages,
        stats.num_signals
    );

    let variant = config.variant.clone().unwrap_or_else(VariantConfig::celica);
    let mut car = CarInterface::new(variant, &db, config.buses)
        .context("Failed to bind the variant to the DBC catalog")?;

    let mut report = Report::open(
        config.output.path.as_deref(),
        config.output.format,
        config.output.include_state,
    )?;

    let replay = Replay::new(
        &mut car,
        config.actuation.request(),
        config.actuation.hud_alert,
    );
    let on_cycle =
        |output: &CycleOutput, state: &VehicleState| report.write_cycle(output, state);

    let stats = match &config.input.log {
        Some(path) => {
            let frames = candump::read_log(path)?;
            replay.run_log(&frames, on_cycle)?
        }
        None => {
            log::info!("No log given; running {} silent cycles", args.cycles);
            replay.run_silent(args.cycles, on_cycle)?
        }
    };

    report.finish(&stats)
}

/// Command-line flags take precedence over the config file
fn merge_args(mut config: AppConfig, args: &Args) -> AppConfig {
    if args.log.is_some() {
        config.input.log = args.log.clone();
    }
    config.input.dbc_files.extend(args.dbc.iter().cloned());

    if args.output.is_some() {
        config.output.path = args.output.clone();
    }
    if args.json {
        config.output.format = OutputFormat::Json;
    }
    if args.no_state {
        config.output.include_state = false;
    }

    let actuation = &mut config.actuation;
    if let Some(steer) = args.steer {
        actuation.steer = steer;
    }
    if let Some(gas) = args.gas {
        actuation.gas = gas;
    }
    if let Some(brake) = args.brake {
        actuation.brake = brake;
    }
    actuation.enabled |= args.enabled;
    actuation.cancel_requested |= args.cancel;

    config
}

fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "car-interface",
            "--dbc",
            "extra.dbc",
            "--steer",
            "-0.5",
            "--enabled",
            "--json",
        ]);
        let mut config = AppConfig::default();
        config.input.dbc_files.push(PathBuf::from("base.dbc"));
        config.actuation.gas = 0.2;

        let config = merge_args(config, &args);
        assert_eq!(config.input.dbc_files.len(), 2);
        assert_eq!(config.actuation.steer, -0.5);
        assert_eq!(config.actuation.gas, 0.2);
        assert!(config.actuation.enabled);
        assert!(!config.actuation.cancel_requested);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.include_state);
    }
}
