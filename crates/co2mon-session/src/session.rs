//! Session lifecycle and the polling pipeline.
//!
//! ```text
//! Uninitialized --negotiate_key--> KeyNegotiated --read_one/run_*--> Polling
//!        |                               |                              |
//!        +--------- key write failed ----+--> Faulted <-- device fault -+
//!                                                                       |
//!                                          Closed <------- close() -----+
//! ```

use crate::config::{FramePolicy, SessionConfig};
use crate::error::{SessionError, TransportError};
use crate::sink::{DiagnosticSink, HeartbeatSink, LogDiagnostics, NoHeartbeat, ReadingSink};
use crate::transport::Transport;
use chrono::Utc;
use co2mon_hid_protocol::{
    REPORT_LEN, Reading, SensorKind, Status, decode, interpret_with_ceiling, validate,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created; the magic table has not been sent.
    Uninitialized,
    /// Magic table accepted by the device.
    KeyNegotiated,
    /// At least one poll has been issued.
    Polling,
    /// Transport released by [`Session::close`].
    Closed,
    /// Key negotiation or a device read failed.
    Faulted,
}

impl SessionState {
    /// Whether reads may be issued in this state.
    pub fn is_ready(self) -> bool {
        matches!(self, SessionState::KeyNegotiated | SessionState::Polling)
    }
}

/// Why a polling loop ended.
#[derive(Debug)]
pub enum LoopExit {
    /// The stop flag was raised.
    Stopped,
    /// A read failed; the session is now [`SessionState::Faulted`].
    DeviceFault(TransportError),
    /// A report was rejected under [`FramePolicy::Stop`].
    Rejected(Status),
}

/// Counters and exit reason of one polling loop.
#[derive(Debug)]
pub struct LoopReport {
    /// Reads issued, including the one that ended the loop.
    pub polls: u64,
    /// Ok readings handed to the sink.
    pub emitted: u64,
    /// Reports that were malformed, unknown or discarded.
    pub rejected: u64,
    pub exit: LoopExit,
}

/// One open sensor: key, transport and the collaborators fed by each poll.
pub struct Session<T: Transport> {
    transport: T,
    config: SessionConfig,
    state: SessionState,
    last_error: Option<TransportError>,
    heartbeat: Box<dyn HeartbeatSink>,
    diagnostics: Box<dyn DiagnosticSink>,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            state: SessionState::Uninitialized,
            last_error: None,
            heartbeat: Box::new(NoHeartbeat),
            diagnostics: Box::new(LogDiagnostics),
        }
    }

    /// Create a session and send the magic table.
    pub fn open(transport: T, config: SessionConfig) -> Result<Self, SessionError> {
        let mut session = Self::new(transport, config);
        session.negotiate_key()?;
        Ok(session)
    }

    pub fn with_heartbeat(mut self, sink: impl HeartbeatSink + 'static) -> Self {
        self.heartbeat = Box::new(sink);
        self
    }

    pub fn with_diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Box::new(sink);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Take the transport failure behind the last
    /// [`Status::DeviceReadError`] returned by [`read_one`](Self::read_one).
    pub fn take_last_error(&mut self) -> Option<TransportError> {
        self.last_error.take()
    }

    /// Send the session key to the device as an 8-byte feature report.
    ///
    /// Only valid from [`SessionState::Uninitialized`]. Any outcome other
    /// than exactly eight bytes written leaves the session `Faulted` and
    /// returns [`SessionError::KeyNegotiation`]; a short write carries
    /// [`TransportError::ShortWrite`].
    pub fn negotiate_key(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Uninitialized {
            return Err(SessionError::InvalidState {
                state: self.state,
                required: "Uninitialized",
            });
        }

        let table = *self.config.key.as_bytes();
        let outcome = match self.transport.send_feature_report(&table) {
            Ok(REPORT_LEN) => Ok(()),
            Ok(written) => Err(TransportError::ShortWrite {
                written,
                expected: REPORT_LEN,
            }),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => {
                self.state = SessionState::KeyNegotiated;
                info!("Magic table sent, session key negotiated");
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Faulted;
                error!("Unable to send magic table to CO2 device: {}", e);
                Err(SessionError::KeyNegotiation(e))
            }
        }
    }

    /// Alias of [`negotiate_key`](Self::negotiate_key) under the device's own name.
    pub fn send_magic_table(&mut self) -> Result<(), SessionError> {
        self.negotiate_key()
    }

    /// Poll once and return the processed reading.
    ///
    /// Transport failures come back as [`Status::DeviceReadError`] and are
    /// not retried; the cause is kept for [`take_last_error`](Self::take_last_error)
    /// and the session state is left for the caller to decide on.
    /// Outside `KeyNegotiated`/`Polling` the transport is not touched.
    pub fn read_one(&mut self) -> Reading {
        self.last_error = None;
        if !self.state.is_ready() {
            debug!("read_one called in state {:?}", self.state);
            return Reading::failed(Status::DeviceReadError);
        }
        self.state = SessionState::Polling;

        match self.poll() {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Device read failed: {}", e);
                self.last_error = Some(e);
                Reading::failed(Status::DeviceReadError)
            }
        }
    }

    /// Poll until the device faults, emitting every Ok reading to `sink`.
    pub fn run_forever(&mut self, sink: &mut dyn ReadingSink) -> Result<LoopReport, SessionError> {
        self.run_loop(sink, None)
    }

    /// Like [`run_forever`](Self::run_forever), also ending once `stop` is set.
    ///
    /// The flag is checked before each poll, so a stop takes effect within
    /// one read timeout.
    pub fn run_until(
        &mut self,
        sink: &mut dyn ReadingSink,
        stop: &AtomicBool,
    ) -> Result<LoopReport, SessionError> {
        self.run_loop(sink, Some(stop))
    }

    /// Release the transport. Idempotent once it succeeds.
    ///
    /// A failed transport close leaves the session `Faulted`, so a later
    /// call tries again.
    pub fn close(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        if let Err(e) = self.transport.close() {
            error!("Failed to close transport: {}", e);
            self.state = SessionState::Faulted;
            return Err(e.into());
        }
        self.state = SessionState::Closed;
        info!("Session closed");
        Ok(())
    }

    fn run_loop(
        &mut self,
        sink: &mut dyn ReadingSink,
        stop: Option<&AtomicBool>,
    ) -> Result<LoopReport, SessionError> {
        if !self.state.is_ready() {
            return Err(SessionError::InvalidState {
                state: self.state,
                required: "KeyNegotiated or Polling",
            });
        }
        self.state = SessionState::Polling;
        info!(
            "Polling CO2 monitor (timeout {} ms, policy {:?})",
            self.config.read_timeout_ms, self.config.frame_policy
        );

        let mut polls: u64 = 0;
        let mut emitted: u64 = 0;
        let mut rejected: u64 = 0;

        let exit = loop {
            if stop.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                info!("Stop requested after {} polls", polls);
                break LoopExit::Stopped;
            }

            polls = polls.saturating_add(1);
            match self.poll() {
                Ok(reading) if reading.is_ok() => {
                    emitted = emitted.saturating_add(1);
                    sink.emit(&reading);
                }
                Ok(reading) => {
                    rejected = rejected.saturating_add(1);
                    if self.config.frame_policy == FramePolicy::Stop {
                        warn!("Stopping on rejected report ({:?})", reading.status);
                        break LoopExit::Rejected(reading.status);
                    }
                }
                Err(e) => {
                    error!("Device read failed, ending session: {}", e);
                    self.state = SessionState::Faulted;
                    break LoopExit::DeviceFault(e);
                }
            }
        };

        Ok(LoopReport {
            polls,
            emitted,
            rejected,
            exit,
        })
    }

    /// Read, decode, validate and interpret one report.
    fn poll(&mut self) -> Result<Reading, TransportError> {
        let mut raw = [0u8; REPORT_LEN];
        let got = self
            .transport
            .read_timeout(&mut raw, self.config.read_timeout_ms)?;
        if got != REPORT_LEN {
            return Err(TransportError::ShortRead {
                got,
                expected: REPORT_LEN,
            });
        }

        let plain = decode(&raw, &self.config.key, self.config.decode);
        debug!("Report {:02x?} -> {:02x?}", raw, plain);

        let frame = match validate(&plain) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Rejected report: {}", e);
                return Ok(Reading::failed(e.status()));
            }
        };

        let reading = interpret_with_ceiling(&frame, self.config.co2_ceiling_ppm);
        match (reading.kind, reading.status) {
            (_, Status::Ok) => {
                debug!("{}\t{}", reading.kind.label(), reading.value);
                self.heartbeat.record_heartbeat(Utc::now());
            }
            (SensorKind::Co2, _) => {
                debug!("Discarded implausible CO2 value {} ppm", frame.word);
            }
            _ if self.config.report_unknown => {
                self.diagnostics.unknown_report(frame.code, frame.word);
            }
            _ => {
                debug!("Unknown report code {:#04x} ({})", frame.code, frame.word);
            }
        }
        Ok(reading)
    }
}
