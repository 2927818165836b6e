//! `co2mon list`

use crate::error::CliError;
use crate::hid::enumerate;
use crate::output;
use anyhow::{Context, Result};
use hidapi::HidApi;

pub fn execute(all: bool, json: bool) -> Result<()> {
    let api = HidApi::new()
        .map_err(CliError::from)
        .context("failed to initialise HID API")?;
    let devices = enumerate(&api, !all);
    output::print_device_list(&devices, json)?;
    Ok(())
}
