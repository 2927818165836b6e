//! Structural validation of descrambled reports.
//!
//! # Frame layout
//! | Offset | Size | Field      | Encoding                       |
//! |--------|------|------------|--------------------------------|
//! | 0      | u8   | code       | reading type                   |
//! | 1–2    | u16  | word       | BE                             |
//! | 3      | u8   | checksum   | `(b0 + b1 + b2) mod 256`       |
//! | 4      | u8   | terminator | always `0x0D`                  |
//! | 5–7    |      | padding    | ignored                        |

#![deny(static_mut_refs)]

use crate::codec::REPORT_LEN;
use crate::reading::Status;

/// Byte offset of the frame terminator.
pub const TERMINATOR_OFFSET: usize = 4;

/// Expected terminator value (ASCII carriage return).
pub const FRAME_TERMINATOR: u8 = 0x0D;

/// A descrambled report that passed the terminator and checksum checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValidatedFrame {
    /// Lead byte identifying the reading type.
    pub code: u8,
    /// Big-endian value from bytes 1–2.
    pub word: u16,
}

/// Why a descrambled report was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("unexpected data from device (data[4] = {found:#04x}, want 0x0d)")]
    UnexpectedTerminator { found: u8 },

    #[error("checksum error ({computed:#04x}, await {expected:#04x})")]
    Checksum { computed: u8, expected: u8 },
}

impl FrameError {
    /// Reading status this rejection maps to.
    pub fn status(&self) -> Status {
        match self {
            FrameError::UnexpectedTerminator { .. } => Status::UnexpectedData,
            FrameError::Checksum { .. } => Status::ChecksumError,
        }
    }
}

/// Wrapping sum of the code and value bytes.
pub fn checksum(frame: &[u8; REPORT_LEN]) -> u8 {
    frame[0].wrapping_add(frame[1]).wrapping_add(frame[2])
}

/// Check the terminator, then the checksum, and extract code and value.
pub fn validate(frame: &[u8; REPORT_LEN]) -> Result<ValidatedFrame, FrameError> {
    let found = frame[TERMINATOR_OFFSET];
    if found != FRAME_TERMINATOR {
        return Err(FrameError::UnexpectedTerminator { found });
    }

    let computed = checksum(frame);
    if computed != frame[3] {
        return Err(FrameError::Checksum {
            computed,
            expected: frame[3],
        });
    }

    Ok(ValidatedFrame {
        code: frame[0],
        word: u16::from_be_bytes([frame[1], frame[2]]),
    })
}

/// Build a plain (descrambled) frame carrying `code` and `word`.
///
/// Padding bytes are zero. Pair with [`encode`](crate::codec::encode) to
/// produce what the device would put on the wire.
pub fn build_frame(code: u8, word: u16) -> [u8; REPORT_LEN] {
    let [hi, lo] = word.to_be_bytes();
    let mut frame = [code, hi, lo, 0, FRAME_TERMINATOR, 0, 0, 0];
    frame[3] = checksum(&frame);
    frame
}
