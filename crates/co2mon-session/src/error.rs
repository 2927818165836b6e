//! Error types for the session layer.

use crate::session::SessionState;
use std::path::PathBuf;

/// Failures reported by a [`Transport`](crate::Transport) implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Device not found: {0}")]
    NotFound(String),

    #[error("Failed to open device: {0}")]
    Open(String),

    #[error("Failed to read from device: {0}")]
    Read(String),

    #[error("Failed to write to device: {0}")]
    Write(String),

    #[error("transferred {got} bytes, expected {expected} bytes")]
    ShortRead { got: usize, expected: usize },

    #[error("wrote {written} bytes, expected {expected}")]
    ShortWrite { written: usize, expected: usize },

    #[error("Device disconnected")]
    Disconnected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Session lifecycle failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Unable to send magic table to CO2 device: {0}")]
    KeyNegotiation(#[source] TransportError),

    #[error("session is {state:?}, operation requires {required}")]
    InvalidState {
        state: SessionState,
        required: &'static str,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SessionError {
    /// Whether the magic-table exchange failed.
    pub fn is_key_negotiation(&self) -> bool {
        matches!(self, SessionError::KeyNegotiation(_))
    }
}

/// Configuration loading and validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid session key '{0}': expected 16 hex digits")]
    InvalidKey(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
