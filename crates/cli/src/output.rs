//! Output formatting for readings and device lists

use anyhow::Error;
use chrono::{DateTime, SecondsFormat, Utc};
use colored::Colorize;
use co2mon_hid_protocol::{Reading, SensorKind};
use co2mon_session::{DeviceInfo, DiagnosticSink};
use serde_json::{Number, Value, json};

/// Print error in human-readable format
pub fn print_error(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

/// Tab-separated line in the classic `Tamb`/`CntR` format.
///
/// Returns `None` for readings that carry nothing to print.
pub fn format_line(reading: &Reading) -> Option<String> {
    if !reading.is_ok() {
        return None;
    }
    match reading.kind {
        SensorKind::Temperature => Some(format!("Tamb\t{:.4}", reading.value)),
        SensorKind::Co2 => Some(format!("CntR\t{:.0}", reading.value)),
        SensorKind::Other => None,
    }
}

/// One JSON-lines record: `{"ts": ..., "temp": 21.4}` or `{"ts": ..., "co2": 800}`.
pub fn format_json(
    reading: &Reading,
    ts: DateTime<Utc>,
) -> Result<Option<Value>, serde_json::Error> {
    if !reading.is_ok() {
        return Ok(None);
    }
    let ts = ts.to_rfc3339_opts(SecondsFormat::Millis, true);
    let record = match reading.kind {
        SensorKind::Temperature => json!({ "ts": ts, "temp": fixed(reading.value, 1)? }),
        SensorKind::Co2 => json!({ "ts": ts, "co2": fixed(reading.value, 0)? }),
        SensorKind::Other => return Ok(None),
    };
    Ok(Some(record))
}

fn fixed(value: f64, decimals: usize) -> Result<Number, serde_json::Error> {
    serde_json::from_str(&format!("{value:.decimals$}"))
}

/// Print one reading in the selected format.
pub fn print_reading(reading: &Reading, json: bool) -> Result<(), serde_json::Error> {
    if json {
        if let Some(record) = format_json(reading, Utc::now())? {
            println!("{record}");
        }
    } else if let Some(line) = format_line(reading) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_unknown(code: u8, word: u16) -> String {
    format!("{code:#04x}\t{word}")
}

/// Prints unknown report codes to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintUnknown;

impl DiagnosticSink for PrintUnknown {
    fn unknown_report(&mut self, code: u8, word: u16) {
        println!("{}", format_unknown(code, word));
    }
}

/// Print device list in specified format
pub fn print_device_list(devices: &[DeviceInfo], json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No CO2 monitors found.");
        return Ok(());
    }

    println!(
        "{:<8} {:<8} {:<20} {:<28} {:<12} Path",
        "VID", "PID", "Manufacturer", "Product", "Serial"
    );
    println!("{}", "-".repeat(90));
    for dev in devices {
        println!(
            "{:<8} {:<8} {:<20} {:<28} {:<12} {}",
            format!("0x{:04X}", dev.vendor_id),
            format!("0x{:04X}", dev.product_id),
            dev.manufacturer.as_deref().unwrap_or("(unknown)"),
            dev.product_name.as_deref().unwrap_or("(unknown)"),
            dev.serial_number.as_deref().unwrap_or("-"),
            dev.path,
        );
    }
    Ok(())
}
