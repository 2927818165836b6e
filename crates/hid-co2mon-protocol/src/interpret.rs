//! Report code interpretation.
//!
//! Only two codes carry readings this crate surfaces; the device also emits
//! a rotating set of undocumented codes (humidity on some models, internal
//! counters on others), which come back as [`SensorKind::Other`].

#![deny(static_mut_refs)]

use crate::frame::ValidatedFrame;
use crate::reading::{Reading, SensorKind, Status};

/// Ambient temperature, 1/16 K per LSB.
pub const CODE_AMBIENT_TEMPERATURE: u8 = 0x42;

/// Relative CO2 concentration, ppm.
pub const CODE_CO2_CONCENTRATION: u8 = 0x50;

/// CO2 values above this are treated as uninitialised sensor state.
pub const CO2_CEILING_PPM: u16 = 3000;

/// Convert the device's 1/16 Kelvin fixed-point value to degrees Celsius.
pub fn decode_temperature(word: u16) -> f64 {
    f64::from(word) * 0.0625 - 273.15
}

/// Interpret a validated frame using the default CO2 ceiling.
pub fn interpret(frame: &ValidatedFrame) -> Reading {
    interpret_with_ceiling(frame, CO2_CEILING_PPM)
}

/// Interpret a validated frame, discarding CO2 values above `ceiling_ppm`.
///
/// A discarded CO2 value keeps `kind = Co2` so callers can tell it apart from
/// an unknown code, but its status is [`Status::UnexpectedData`].
pub fn interpret_with_ceiling(frame: &ValidatedFrame, ceiling_ppm: u16) -> Reading {
    match frame.code {
        CODE_AMBIENT_TEMPERATURE => {
            Reading::ok(SensorKind::Temperature, decode_temperature(frame.word))
        }
        CODE_CO2_CONCENTRATION if frame.word > ceiling_ppm => Reading {
            kind: SensorKind::Co2,
            value: f64::from(frame.word),
            status: Status::UnexpectedData,
        },
        CODE_CO2_CONCENTRATION => Reading::ok(SensorKind::Co2, f64::from(frame.word)),
        _ => Reading::failed(Status::UnexpectedData),
    }
}
