//! Collaborators that receive session output.

use chrono::{DateTime, Utc};
use co2mon_hid_protocol::Reading;
use tracing::info;

/// Records the time of the last successful reading.
///
/// Called once per Ok reading and never for rejected or discarded reports.
/// Fire-and-forget: implementations swallow their own failures.
pub trait HeartbeatSink {
    fn record_heartbeat(&mut self, at: DateTime<Utc>);
}

/// Receives reports whose code is not interpreted, when enabled in
/// [`SessionConfig::report_unknown`](crate::SessionConfig::report_unknown).
pub trait DiagnosticSink {
    fn unknown_report(&mut self, code: u8, word: u16);
}

/// Consumer of Ok readings produced by the polling loop.
pub trait ReadingSink {
    fn emit(&mut self, reading: &Reading);
}

impl<F: FnMut(&Reading)> ReadingSink for F {
    fn emit(&mut self, reading: &Reading) {
        self(reading)
    }
}

/// Heartbeat sink that drops every heartbeat.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHeartbeat;

impl HeartbeatSink for NoHeartbeat {
    fn record_heartbeat(&mut self, _at: DateTime<Utc>) {}
}

/// Diagnostic sink that logs unknown reports through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl DiagnosticSink for LogDiagnostics {
    fn unknown_report(&mut self, code: u8, word: u16) {
        info!(code = format_args!("{code:#04x}"), word, "unknown report code");
    }
}
