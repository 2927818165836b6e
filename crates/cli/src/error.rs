//! Error types for the co2mon CLI

use co2mon_session::{ConfigError, SessionError, TransportError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Key negotiation failed: {0}")]
    KeyNegotiation(#[source] SessionError),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("Device fault: {0}")]
    DeviceFault(#[source] TransportError),

    #[error("Session error: {0}")]
    SessionError(#[source] SessionError),

    #[error("HID error: {0}")]
    HidError(#[from] hidapi::HidError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::DeviceNotFound(_) => 2,
            CliError::KeyNegotiation(_) => 3,
            CliError::InvalidConfiguration(_) => 4,
            CliError::DeviceFault(_) => 5,
            _ => 1,
        }
    }
}

impl From<TransportError> for CliError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::NotFound(what) => CliError::DeviceNotFound(what),
            other => CliError::DeviceFault(other),
        }
    }
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        if err.is_key_negotiation() {
            return CliError::KeyNegotiation(err);
        }
        match err {
            SessionError::Transport(inner) => inner.into(),
            other => CliError::SessionError(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_missing_device_when_mapped_then_exit_code_2() {
        let err: CliError = TransportError::NotFound("04d9:a052".to_string()).into();
        assert!(matches!(err, CliError::DeviceNotFound(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn given_key_write_failure_when_mapped_then_exit_code_3() {
        let err: CliError = SessionError::KeyNegotiation(TransportError::ShortWrite {
            written: 0,
            expected: 8,
        })
        .into();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn given_config_error_when_mapped_then_exit_code_4() {
        let err: CliError = ConfigError::InvalidKey("xyz".to_string()).into();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn given_read_failure_when_mapped_then_exit_code_5() {
        let err: CliError = SessionError::Transport(TransportError::Disconnected).into();
        assert!(matches!(err, CliError::DeviceFault(TransportError::Disconnected)));
        assert_eq!(err.exit_code(), 5);
    }
}
