//! USB CO2 monitor HID protocol.
//!
//! The sensor (sold as "KIT MT 8057", "AirCO2NTROL Mini" and under several
//! OEM names) enumerates as VID `0x04D9` / PID `0xA052` and streams fixed
//! 8-byte input reports. Each report is scrambled on the wire; once
//! descrambled it carries a one-byte code, a big-endian 16-bit value, a
//! checksum and a `0x0D` terminator.
//!
//! # Pipeline
//!
//! 1. [`codec::decode`]: swap, XOR with the session key, rotate, unmask.
//! 2. [`frame::validate`]: terminator and checksum checks.
//! 3. [`interpret::interpret`]: code → typed [`Reading`], CO2 plausibility filter.
//!
//! This crate is intentionally I/O-free. Transport, heartbeat and logging
//! live in `co2mon-session`.

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod codec;
pub mod frame;
pub mod ids;
pub mod interpret;
pub mod reading;

pub use codec::{DecodeMode, MAGIC_WORD, REPORT_LEN, SessionKey, decode, descramble, encode};
pub use frame::{
    FRAME_TERMINATOR, FrameError, TERMINATOR_OFFSET, ValidatedFrame, build_frame, checksum,
    validate,
};
pub use ids::{PRODUCT_ID, VENDOR_ID, is_co2mon_device, product_name};
pub use interpret::{
    CO2_CEILING_PPM, CODE_AMBIENT_TEMPERATURE, CODE_CO2_CONCENTRATION, decode_temperature,
    interpret, interpret_with_ceiling,
};
pub use reading::{Reading, SensorKind, Status};
