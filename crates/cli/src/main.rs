//! co2mon - USB CO2 monitor reader
//!
//! Reads ambient temperature and CO2 concentration from the common
//! 04d9:a052 USB sensor and prints them as tab-separated lines or JSON.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod heartbeat;
mod hid;
mod output;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};
use co2mon_hid_protocol::{PRODUCT_ID, VENDOR_ID};
use co2mon_session::FramePolicy;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::CliError;
use crate::hid::DeviceSelector;
use crate::settings::{Overrides, parse_hex_u16};

#[derive(Parser)]
#[command(name = "co2mon")]
#[command(about = "Read temperature and CO2 concentration from a USB CO2 monitor")]
#[command(version)]
struct Cli {
    /// YAML session configuration file
    #[arg(long, global = true, env = "CO2MON_CONFIG")]
    config: Option<PathBuf>,

    /// Open the device at this HID path instead of matching VID/PID
    #[arg(long, global = true, env = "CO2MON_PATH", conflicts_with_all = ["vid", "pid"])]
    path: Option<String>,

    /// USB vendor id in hex
    #[arg(long, global = true, value_parser = parse_hex_u16)]
    vid: Option<u16>,

    /// USB product id in hex
    #[arg(long, global = true, value_parser = parse_hex_u16)]
    pid: Option<u16>,

    /// Session key (magic table) as 16 hex digits
    #[arg(long, global = true, env = "CO2MON_KEY")]
    key: Option<String>,

    /// Treat reports as already descrambled
    #[arg(long, global = true)]
    no_decode: bool,

    /// Print unrecognised report codes as `0x<code>\t<value>`
    #[arg(long, global = true)]
    report_unknown: bool,

    /// Read timeout per report in milliseconds
    #[arg(long, global = true, env = "CO2MON_TIMEOUT_MS")]
    timeout_ms: Option<u32>,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List attached CO2 monitors
    List {
        /// Include every HID device, not just CO2 monitors
        #[arg(long)]
        all: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print readings one poll at a time
    Read {
        /// Stop after this many readings
        #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
        count: Option<u64>,

        /// Output JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Run the polling loop until Ctrl-C or a device fault
    Watch {
        /// Write the unix time of the last good reading to this file
        #[arg(long, env = "CO2MON_HEARTBEAT_FILE")]
        heartbeat_file: Option<PathBuf>,

        /// End the loop on the first malformed report
        #[arg(long)]
        stop_on_error: bool,

        /// Output JSON lines
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn selector(&self) -> DeviceSelector {
        match &self.path {
            Some(path) => DeviceSelector::Path(path.clone()),
            None => DeviceSelector::Ids {
                vid: self.vid.unwrap_or(VENDOR_ID),
                pid: self.pid.unwrap_or(PRODUCT_ID),
            },
        }
    }

    fn overrides(&self) -> Overrides {
        let frame_policy = match self.command {
            Commands::Watch {
                stop_on_error: true,
                ..
            } => Some(FramePolicy::Stop),
            _ => None,
        };
        Overrides {
            key: self.key.clone(),
            no_decode: self.no_decode,
            report_unknown: self.report_unknown,
            timeout_ms: self.timeout_ms,
            frame_policy,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("co2mon={log_level},co2mon_session={log_level}").into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&e);
            let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    if let Commands::List { all, json } = cli.command {
        return commands::device::execute(all, json);
    }

    let config = settings::session_config(cli.config.as_deref(), &cli.overrides())
        .map_err(CliError::from)?;
    let selector = cli.selector();
    let stop = commands::install_stop_flag()?;

    match &cli.command {
        Commands::Read { count, json } => {
            commands::read::execute(&selector, config, *count, *json, &stop)
        }
        Commands::Watch {
            heartbeat_file,
            json,
            ..
        } => commands::watch::execute(
            &selector,
            config,
            heartbeat_file.as_deref(),
            *json,
            &stop,
        ),
        Commands::List { .. } => Ok(()),
    }
}
