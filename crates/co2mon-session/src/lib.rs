//! Session layer for the USB CO2 monitor.
//!
//! A [`Session`] owns one [`Transport`], sends the magic table that seeds the
//! descrambler, and runs every report through the
//! [`co2mon_hid_protocol`] pipeline. Ok readings feed a [`HeartbeatSink`];
//! unrecognised report codes can be forwarded to a [`DiagnosticSink`].
//!
//! ```
//! use co2mon_hid_protocol::{SessionKey, build_frame, encode};
//! use co2mon_session::{Session, SessionConfig, mock::ScriptedTransport};
//!
//! # fn main() -> Result<(), co2mon_session::SessionError> {
//! let mut transport = ScriptedTransport::new();
//! transport.push_report(encode(&build_frame(0x50, 800), &SessionKey::ZERO));
//!
//! let mut session = Session::open(transport, SessionConfig::default())?;
//! let reading = session.read_one();
//! assert!(reading.is_ok());
//! assert_eq!(reading.kind, co2mon_hid_protocol::SensorKind::Co2);
//! # Ok(())
//! # }
//! ```

#![deny(static_mut_refs)]

pub mod config;
pub mod device_info;
pub mod error;
pub mod session;
pub mod sink;
pub mod transport;

pub use config::{DEFAULT_READ_TIMEOUT_MS, FramePolicy, SessionConfig, format_key, parse_key};
pub use device_info::DeviceInfo;
pub use error::{ConfigError, SessionError, TransportError};
pub use session::{LoopExit, LoopReport, Session, SessionState};
pub use sink::{DiagnosticSink, HeartbeatSink, LogDiagnostics, NoHeartbeat, ReadingSink};
pub use transport::{Transport, mock};
