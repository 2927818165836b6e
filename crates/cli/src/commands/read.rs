//! `co2mon read`: poll one report at a time.

use crate::error::CliError;
use crate::hid::DeviceSelector;
use crate::output;
use anyhow::{Context, Result};
use co2mon_hid_protocol::{Reading, Status};
use co2mon_session::{Session, SessionConfig, Transport, TransportError};
use hidapi::HidApi;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

pub fn execute(
    selector: &DeviceSelector,
    config: SessionConfig,
    count: Option<u64>,
    json: bool,
    stop: &AtomicBool,
) -> Result<()> {
    let api = HidApi::new()
        .map_err(CliError::from)
        .context("failed to initialise HID API")?;
    let mut session = super::open_session(&api, selector, config)?;

    let result = poll_readings(&mut session, count, stop, |reading| {
        output::print_reading(reading, json).map_err(CliError::from)
    });
    let closed = session.close().map_err(CliError::from);
    let printed = result?;
    closed?;
    info!("Printed {} readings", printed);
    Ok(())
}

/// Call `read_one` until `count` Ok readings were emitted, the stop flag is
/// raised or the device stops answering. Returns the number emitted.
///
/// Malformed reports are skipped. A device read failure ends the loop with
/// [`CliError::DeviceFault`] carrying the transport's own error.
pub fn poll_readings<T: Transport>(
    session: &mut Session<T>,
    count: Option<u64>,
    stop: &AtomicBool,
    mut emit: impl FnMut(&Reading) -> Result<(), CliError>,
) -> Result<u64> {
    let mut printed: u64 = 0;
    while !stop.load(Ordering::Relaxed) && count.is_none_or(|limit| printed < limit) {
        let reading = session.read_one();
        match reading.status {
            Status::Ok => {
                emit(&reading)?;
                printed = printed.saturating_add(1);
            }
            status if status.is_transient() => debug!("Skipping report ({:?})", status),
            _ => {
                let cause = session
                    .take_last_error()
                    .unwrap_or(TransportError::Disconnected);
                return Err(CliError::DeviceFault(cause))
                    .context("reading from CO2 monitor failed");
            }
        }
    }
    Ok(printed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use co2mon_hid_protocol::{REPORT_LEN, SensorKind, SessionKey, build_frame, encode};
    use co2mon_session::mock::ScriptedTransport;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn wire(code: u8, word: u16) -> [u8; REPORT_LEN] {
        encode(&build_frame(code, word), &SessionKey::ZERO)
    }

    fn session(transport: ScriptedTransport) -> Result<Session<ScriptedTransport>, CliError> {
        Ok(Session::open(transport, SessionConfig::default())?)
    }

    #[test]
    fn given_count_when_polling_then_stops_without_extra_read() -> TestResult {
        let mut transport = ScriptedTransport::new();
        transport
            .push_report(wire(0x50, 800))
            .push_report(wire(0x42, 4485))
            .push_report(wire(0x50, 812));
        let mut session = session(transport)?;
        let mut seen = Vec::new();

        let printed = poll_readings(&mut session, Some(2), &AtomicBool::new(false), |r| {
            seen.push(*r);
            Ok(())
        })?;

        assert_eq!(printed, 2);
        assert_eq!(seen.first().map(|r| r.kind), Some(SensorKind::Co2));
        assert_eq!(seen.get(1).map(|r| r.kind), Some(SensorKind::Temperature));
        assert_eq!(session.transport().read_attempts(), 2);
        assert_eq!(session.transport().remaining(), 1);
        Ok(())
    }

    #[test]
    fn given_zero_count_when_polling_then_nothing_is_read() -> TestResult {
        let mut transport = ScriptedTransport::new();
        transport.push_report(wire(0x50, 800));
        let mut session = session(transport)?;
        let mut emitted = 0;

        let printed = poll_readings(&mut session, Some(0), &AtomicBool::new(false), |_| {
            emitted += 1;
            Ok(())
        })?;

        assert_eq!(printed, 0);
        assert_eq!(emitted, 0);
        assert_eq!(session.transport().read_attempts(), 0);
        Ok(())
    }

    #[test]
    fn given_stop_flag_raised_when_polling_then_returns_immediately() -> TestResult {
        let mut transport = ScriptedTransport::new();
        transport.push_report(wire(0x50, 800));
        let mut session = session(transport)?;

        let printed = poll_readings(&mut session, None, &AtomicBool::new(true), |_| Ok(()))?;

        assert_eq!(printed, 0);
        assert_eq!(session.transport().read_attempts(), 0);
        Ok(())
    }

    #[test]
    fn given_malformed_report_when_polling_then_skipped() -> TestResult {
        let mut transport = ScriptedTransport::new();
        transport
            .push_report(encode(
                &[0x50, 0x03, 0x20, 0x00, 0x0D, 0x00, 0x00, 0x00],
                &SessionKey::ZERO,
            ))
            .push_report(wire(0x50, 800));
        let mut session = session(transport)?;

        let printed = poll_readings(&mut session, Some(1), &AtomicBool::new(false), |_| Ok(()))?;

        assert_eq!(printed, 1);
        assert_eq!(session.transport().read_attempts(), 2);
        Ok(())
    }

    #[test]
    fn given_read_failure_when_polling_then_device_fault_with_cause() -> TestResult {
        let mut transport = ScriptedTransport::new();
        transport
            .push_report(wire(0x50, 800))
            .push_failure("hid_read_timeout: timed out");
        let mut session = session(transport)?;
        let mut emitted = 0;

        let err = poll_readings(&mut session, Some(5), &AtomicBool::new(false), |_| {
            emitted += 1;
            Ok(())
        })
        .err()
        .ok_or("read failure should end the loop")?;

        assert_eq!(emitted, 1);
        let cli_err = err
            .downcast_ref::<CliError>()
            .ok_or("expected a CliError")?;
        assert!(matches!(
            cli_err,
            CliError::DeviceFault(TransportError::Read(msg)) if msg.contains("timed out")
        ));
        assert_eq!(cli_err.exit_code(), 5);
        Ok(())
    }

    #[test]
    fn given_exhausted_device_when_polling_unbounded_then_disconnect_reported() -> TestResult {
        let mut transport = ScriptedTransport::new();
        transport.push_report(wire(0x42, 4485));
        let mut session = session(transport)?;

        let err = poll_readings(&mut session, None, &AtomicBool::new(false), |_| Ok(()))
            .err()
            .ok_or("exhausted script should end the loop")?;

        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::DeviceFault(TransportError::Disconnected))
        ));
        Ok(())
    }
}
