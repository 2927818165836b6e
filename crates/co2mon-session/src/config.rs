//! Session configuration.
//!
//! Every knob is an explicit field handed to the
//! [`Session`](crate::Session) at construction time.
//!
//! ```yaml
//! key: "0000000000000000"
//! decode: descramble        # or: passthrough
//! report_unknown: false
//! read_timeout_ms: 5000
//! co2_ceiling_ppm: 3000
//! frame_policy: continue    # or: stop
//! ```

use crate::ConfigError;
use co2mon_hid_protocol::{CO2_CEILING_PPM, DecodeMode, REPORT_LEN, SessionKey};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Read timeout per report.
pub const DEFAULT_READ_TIMEOUT_MS: u32 = 5000;

/// What the polling loop does after a malformed or discarded report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramePolicy {
    /// Log and poll again.
    #[default]
    Continue,
    /// End the loop.
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Magic table sent at session start and used to descramble reports.
    #[serde(with = "key_hex")]
    pub key: SessionKey,
    #[serde(with = "decode_mode")]
    pub decode: DecodeMode,
    /// Forward unrecognised report codes to the diagnostic sink.
    pub report_unknown: bool,
    pub read_timeout_ms: u32,
    /// CO2 values above this are discarded.
    pub co2_ceiling_ppm: u16,
    pub frame_policy: FramePolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            key: SessionKey::ZERO,
            decode: DecodeMode::Descramble,
            report_unknown: false,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            co2_ceiling_ppm: CO2_CEILING_PPM,
            frame_policy: FramePolicy::Continue,
        }
    }
}

impl SessionConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "read_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse a session key written as 16 hex digits, optionally `0x`-prefixed.
pub fn parse_key(text: &str) -> Result<SessionKey, ConfigError> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let invalid = || ConfigError::InvalidKey(text.to_string());

    if digits.len() != REPORT_LEN * 2 || !digits.is_ascii() {
        return Err(invalid());
    }

    let mut bytes = [0u8; REPORT_LEN];
    for (byte, pair) in bytes.iter_mut().zip(digits.as_bytes().chunks_exact(2)) {
        *byte = std::str::from_utf8(pair)
            .ok()
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .ok_or_else(invalid)?;
    }
    Ok(SessionKey::new(bytes))
}

/// Render a session key as 16 lowercase hex digits.
pub fn format_key(key: &SessionKey) -> String {
    key.as_bytes().iter().map(|b| format!("{b:02x}")).collect()
}

mod key_hex {
    use super::{SessionKey, format_key, parse_key};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(key: &SessionKey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_key(key))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SessionKey, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_key(&text).map_err(D::Error::custom)
    }
}

mod decode_mode {
    use super::DecodeMode;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(mode: &DecodeMode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match mode {
            DecodeMode::Descramble => "descramble",
            DecodeMode::Passthrough => "passthrough",
        })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DecodeMode, D::Error> {
        let text = String::deserialize(deserializer)?;
        match text.trim().to_ascii_lowercase().as_str() {
            "descramble" | "decode" => Ok(DecodeMode::Descramble),
            "passthrough" | "raw" | "none" => Ok(DecodeMode::Passthrough),
            other => Err(D::Error::custom(format!(
                "unknown decode mode '{other}', expected 'descramble' or 'passthrough'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_device_behaviour() {
        let config = SessionConfig::default();
        assert!(config.key.is_zero());
        assert_eq!(config.decode, DecodeMode::Descramble);
        assert_eq!(config.read_timeout_ms, 5000);
        assert_eq!(config.co2_ceiling_ppm, 3000);
        assert_eq!(config.frame_policy, FramePolicy::Continue);
        assert!(!config.report_unknown);
    }

    #[test]
    fn test_empty_yaml_gives_defaults() -> Result<(), ConfigError> {
        assert_eq!(SessionConfig::from_yaml_str("{}")?, SessionConfig::default());
        Ok(())
    }

    #[test]
    fn test_full_yaml() -> Result<(), ConfigError> {
        let config = SessionConfig::from_yaml_str(
            "key: \"8641c9a87f413cac\"\n\
             decode: passthrough\n\
             report_unknown: true\n\
             read_timeout_ms: 1000\n\
             co2_ceiling_ppm: 5000\n\
             frame_policy: stop\n",
        )?;
        assert_eq!(
            config.key,
            SessionKey::new([0x86, 0x41, 0xC9, 0xA8, 0x7F, 0x41, 0x3C, 0xAC])
        );
        assert_eq!(config.decode, DecodeMode::Passthrough);
        assert!(config.report_unknown);
        assert_eq!(config.read_timeout_ms, 1000);
        assert_eq!(config.co2_ceiling_ppm, 5000);
        assert_eq!(config.frame_policy, FramePolicy::Stop);
        Ok(())
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(SessionConfig::from_yaml_str("decode_data: 1\n").is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = SessionConfig::from_yaml_str("read_timeout_ms: 0\n");
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_yaml_round_trip() -> Result<(), ConfigError> {
        let config = SessionConfig {
            key: SessionKey::new([1, 2, 3, 4, 5, 6, 7, 8]),
            decode: DecodeMode::Passthrough,
            ..SessionConfig::default()
        };
        let yaml = config.to_yaml_string()?;
        assert!(yaml.contains("0102030405060708"), "{yaml}");
        assert_eq!(SessionConfig::from_yaml_str(&yaml)?, config);
        Ok(())
    }

    #[test]
    fn test_parse_key() -> Result<(), ConfigError> {
        assert_eq!(parse_key("0000000000000000")?, SessionKey::ZERO);
        assert_eq!(
            parse_key("0x8641C9A87F413CAC")?,
            SessionKey::new([0x86, 0x41, 0xC9, 0xA8, 0x7F, 0x41, 0x3C, 0xAC])
        );
        assert!(parse_key("00").is_err());
        assert!(parse_key("zz00000000000000").is_err());
        assert!(parse_key("00000000000000000").is_err());
        assert!(parse_key("ééééééééé").is_err());
        Ok(())
    }

    #[test]
    fn test_format_key() {
        let key = SessionKey::new([0x86, 0x41, 0xC9, 0xA8, 0x7F, 0x41, 0x3C, 0xAC]);
        assert_eq!(format_key(&key), "8641c9a87f413cac");
    }

    #[test]
    fn test_load_from_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("co2mon.yaml");
        std::fs::write(&path, "report_unknown: true\n")?;
        let config = SessionConfig::load(&path)?;
        assert!(config.report_unknown);

        let missing = SessionConfig::load(&dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
        Ok(())
    }
}
