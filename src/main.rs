use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mxspeak::core::config::CONFIG_PATH;
use mxspeak::util::{CsvFileLog, ReplyLog, TracingLog};
use mxspeak::{ChannelConfig, Configuration, Controller, ControllerConfig, Error, Transport};

#[derive(Parser, Debug)]
#[command(name = "mxspeak", version, about = "Discover and poll points on an MX Speak panel")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Stop after discovery
    #[arg(long)]
    discover_only: bool,

    /// Number of polling passes to run; polls forever when omitted
    #[arg(long)]
    cycles: Option<usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::ChannelOpen { port, source }) => {
            eprintln!("Unable to open port '{}': {}", port, source);
            eprintln!("Check that the port exists and the panel is connected");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> mxspeak::Result<()> {
    let config = Configuration::load(&cli.config)?;
    info!(version = %config.mx_speak_version, "configuration loaded");

    let channel = ChannelConfig::from_configuration(&config)?;
    let transport = Transport::open(&channel)?;

    let log: Box<dyn ReplyLog> = if config.logging.enabled {
        let log = CsvFileLog::open(&config.logging.directory)?;
        info!(path = %log.path().display(), "writing replies to file");
        Box::new(log)
    } else {
        Box::new(TracingLog)
    };

    let mut controller = Controller::new(transport, ControllerConfig::from_configuration(&config), log);
    let discovered = controller.discover()?;
    info!(points = ?discovered, "discovered points");

    if cli.discover_only {
        return Ok(());
    }

    let passes = controller.run_polling(|passes| cli.cycles.map_or(true, |cycles| passes < cycles))?;
    info!(passes, "polling stopped");
    Ok(())
}
