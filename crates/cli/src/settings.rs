//! Merge the config file with command-line overrides.

use co2mon_hid_protocol::DecodeMode;
use co2mon_session::{ConfigError, FramePolicy, SessionConfig, parse_key};
use std::path::Path;

/// Session settings given on the command line. `None`/`false` keeps the
/// file (or default) value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub key: Option<String>,
    pub no_decode: bool,
    pub report_unknown: bool,
    pub timeout_ms: Option<u32>,
    pub frame_policy: Option<FramePolicy>,
}

/// Build the session configuration: defaults, then `file`, then `overrides`.
pub fn session_config(
    file: Option<&Path>,
    overrides: &Overrides,
) -> Result<SessionConfig, ConfigError> {
    let mut config = match file {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    if let Some(key) = &overrides.key {
        config.key = parse_key(key)?;
    }
    if overrides.no_decode {
        config.decode = DecodeMode::Passthrough;
    }
    if overrides.report_unknown {
        config.report_unknown = true;
    }
    if let Some(timeout_ms) = overrides.timeout_ms {
        config.read_timeout_ms = timeout_ms;
    }
    if let Some(policy) = overrides.frame_policy {
        config.frame_policy = policy;
    }

    config.validate()?;
    Ok(config)
}

/// Parse a 16-bit id written in hex, with or without `0x`.
pub fn parse_hex_u16(text: &str) -> Result<u16, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid hex id '{text}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use co2mon_hid_protocol::SessionKey;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn given_no_file_and_no_flags_then_defaults() -> TestResult {
        let config = session_config(None, &Overrides::default())?;
        assert_eq!(config, SessionConfig::default());
        Ok(())
    }

    #[test]
    fn given_file_and_flags_then_flags_win() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("co2mon.yaml");
        std::fs::write(&path, "read_timeout_ms: 1000\nreport_unknown: false\n")?;

        let overrides = Overrides {
            key: Some("0102030405060708".to_string()),
            no_decode: true,
            report_unknown: true,
            timeout_ms: Some(2500),
            frame_policy: Some(FramePolicy::Stop),
        };
        let config = session_config(Some(&path), &overrides)?;
        assert_eq!(config.key, SessionKey::new([1, 2, 3, 4, 5, 6, 7, 8]));
        assert_eq!(config.decode, DecodeMode::Passthrough);
        assert!(config.report_unknown);
        assert_eq!(config.read_timeout_ms, 2500);
        assert_eq!(config.frame_policy, FramePolicy::Stop);
        Ok(())
    }

    #[test]
    fn given_file_only_then_file_values_kept() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("co2mon.yaml");
        std::fs::write(&path, "read_timeout_ms: 1000\n")?;
        let config = session_config(Some(&path), &Overrides::default())?;
        assert_eq!(config.read_timeout_ms, 1000);
        Ok(())
    }

    #[test]
    fn given_bad_key_flag_then_config_error() {
        let overrides = Overrides {
            key: Some("nope".to_string()),
            ..Overrides::default()
        };
        let result = session_config(None, &overrides);
        assert!(matches!(result, Err(ConfigError::InvalidKey(_))));
    }

    #[test]
    fn given_zero_timeout_flag_then_rejected() {
        let overrides = Overrides {
            timeout_ms: Some(0),
            ..Overrides::default()
        };
        assert!(matches!(
            session_config(None, &overrides),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn parse_hex_u16_accepts_both_forms() -> TestResult {
        assert_eq!(parse_hex_u16("04d9")?, 0x04D9);
        assert_eq!(parse_hex_u16("0xA052")?, 0xA052);
        assert!(parse_hex_u16("xyz").is_err());
        assert!(parse_hex_u16("0x12345").is_err());
        Ok(())
    }
}
