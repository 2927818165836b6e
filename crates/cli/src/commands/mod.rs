//! Command implementations

pub mod device;
pub mod read;
pub mod watch;

use crate::error::CliError;
use crate::hid::{DeviceSelector, HidapiTransport};
use crate::output::PrintUnknown;
use anyhow::{Context, Result};
use co2mon_session::{Session, SessionConfig, Transport};
use hidapi::HidApi;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Open the selected sensor and negotiate the session key.
pub fn open_session(
    api: &HidApi,
    selector: &DeviceSelector,
    config: SessionConfig,
) -> Result<Session<HidapiTransport>, CliError> {
    let transport = HidapiTransport::open(api, selector)?;
    let session = Session::open(transport, config)?;
    let device = session
        .transport()
        .device_info()
        .map_or_else(|| selector.describe(), |info| info.display_name());
    info!("Session ready on {}", device);

    Ok(if session.config().report_unknown {
        session.with_diagnostics(PrintUnknown)
    } else {
        session
    })
}

/// Flag raised by Ctrl-C.
pub fn install_stop_flag() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_clone = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        stop_clone.store(true, Ordering::Relaxed);
    })
    .context("failed to install Ctrl-C handler")?;
    Ok(stop)
}
