//! `co2mon watch`: run the polling loop until Ctrl-C or a device fault.

use crate::error::CliError;
use crate::heartbeat::FileHeartbeat;
use crate::hid::DeviceSelector;
use crate::output;
use anyhow::{Context, Result};
use co2mon_hid_protocol::Reading;
use co2mon_session::{LoopExit, SessionConfig};
use hidapi::HidApi;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use tracing::{info, warn};

pub fn execute(
    selector: &DeviceSelector,
    config: SessionConfig,
    heartbeat_file: Option<&Path>,
    json: bool,
    stop: &AtomicBool,
) -> Result<()> {
    let api = HidApi::new()
        .map_err(CliError::from)
        .context("failed to initialise HID API")?;
    let mut session = super::open_session(&api, selector, config)?;
    if let Some(path) = heartbeat_file {
        info!("Writing heartbeat to {}", path.display());
        session = session.with_heartbeat(FileHeartbeat::new(path));
    }

    let mut print = |reading: &Reading| {
        if let Err(e) = output::print_reading(reading, json) {
            warn!("Failed to format reading: {}", e);
        }
    };
    let report = session
        .run_until(&mut print, stop)
        .map_err(CliError::from)?;
    info!(
        "Loop ended after {} polls ({} readings, {} rejected)",
        report.polls, report.emitted, report.rejected
    );

    match report.exit {
        LoopExit::Stopped => {
            session.close().map_err(CliError::from)?;
            Ok(())
        }
        LoopExit::Rejected(status) => {
            warn!("Stopped on rejected report ({:?})", status);
            session.close().map_err(CliError::from)?;
            Ok(())
        }
        LoopExit::DeviceFault(e) => {
            Err(CliError::DeviceFault(e)).context("CO2 monitor stopped responding")
        }
    }
}
