//! Report descrambling.
//!
//! # Transform
//! | Step | Operation                                                     |
//! |------|---------------------------------------------------------------|
//! | 1    | swap bytes (0,2), (1,4), (3,7), (5,6)                         |
//! | 2    | XOR byte `i` with `key[i]`                                    |
//! | 3    | rotate the big-endian 64-bit block right by 3 bits            |
//! | 4    | subtract `rotl4(b"Htemp99e"[i])` from byte `i`, wrapping      |
//!
//! Step 3 is the same as `out[i] = (in[i-1] << 5) | (in[i] >> 3)` with the
//! index taken modulo 8. Every step is a bijection, so [`encode`] undoes
//! [`decode`] exactly.

#![deny(static_mut_refs)]

/// Input report length in bytes. The device never sends anything else.
pub const REPORT_LEN: usize = 8;

/// ASCII constant the unmasking step is derived from.
pub const MAGIC_WORD: [u8; REPORT_LEN] = *b"Htemp99e";

/// Disjoint byte pairs exchanged in step 1.
const SWAP_PAIRS: [(usize, usize); 4] = [(0, 2), (1, 4), (3, 7), (5, 6)];

/// Bit distance of the circular shift in step 3.
const ROTATE_BITS: u32 = 3;

/// Per-byte subtraction mask: each `MAGIC_WORD` byte with its nibbles swapped.
const MASK: [u8; REPORT_LEN] = [0x84, 0x47, 0x56, 0xD6, 0x07, 0x93, 0x93, 0x56];

/// The 8-byte "magic table" sent to the device as a feature report when a
/// session starts, and used as the XOR mask while descrambling.
///
/// The device default is all zeroes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SessionKey([u8; REPORT_LEN]);

impl SessionKey {
    /// The all-zero key the device uses unless told otherwise.
    pub const ZERO: Self = Self([0u8; REPORT_LEN]);

    pub const fn new(bytes: [u8; REPORT_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; REPORT_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; REPORT_LEN]
    }
}

impl From<[u8; REPORT_LEN]> for SessionKey {
    fn from(bytes: [u8; REPORT_LEN]) -> Self {
        Self(bytes)
    }
}

/// Whether incoming reports are descrambled or used as-is.
///
/// Some firmware revisions send plain reports; `Passthrough` covers them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DecodeMode {
    /// Apply the full swap/XOR/rotate/unmask transform.
    #[default]
    Descramble,
    /// Return the raw report unchanged.
    Passthrough,
}

/// Decode a raw report according to `mode`.
pub fn decode(raw: &[u8; REPORT_LEN], key: &SessionKey, mode: DecodeMode) -> [u8; REPORT_LEN] {
    match mode {
        DecodeMode::Descramble => descramble(raw, key),
        DecodeMode::Passthrough => *raw,
    }
}

/// Apply the full descrambling transform to a raw report.
pub fn descramble(raw: &[u8; REPORT_LEN], key: &SessionKey) -> [u8; REPORT_LEN] {
    let mut buf = *raw;
    swap_pairs(&mut buf);

    for (byte, k) in buf.iter_mut().zip(key.as_bytes()) {
        *byte ^= k;
    }

    let mut out = u64::from_be_bytes(buf)
        .rotate_right(ROTATE_BITS)
        .to_be_bytes();

    for (byte, m) in out.iter_mut().zip(MASK) {
        *byte = byte.wrapping_sub(m);
    }
    out
}

/// Scramble a plain frame the way the device does before sending it.
///
/// Exact inverse of [`descramble`]; used to build fixtures and simulated devices.
pub fn encode(frame: &[u8; REPORT_LEN], key: &SessionKey) -> [u8; REPORT_LEN] {
    let mut buf = *frame;
    for (byte, m) in buf.iter_mut().zip(MASK) {
        *byte = byte.wrapping_add(m);
    }

    let mut out = u64::from_be_bytes(buf)
        .rotate_left(ROTATE_BITS)
        .to_be_bytes();

    for (byte, k) in out.iter_mut().zip(key.as_bytes()) {
        *byte ^= k;
    }
    swap_pairs(&mut out);
    out
}

fn swap_pairs(buf: &mut [u8; REPORT_LEN]) {
    for (a, b) in SWAP_PAIRS {
        buf.swap(a, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_is_nibble_swapped_magic_word() {
        let derived: Vec<u8> = MAGIC_WORD.iter().map(|b| b.rotate_left(4)).collect();
        assert_eq!(derived, MASK);
    }

    #[test]
    fn passthrough_returns_input() {
        let raw = [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF];
        assert_eq!(decode(&raw, &SessionKey::ZERO, DecodeMode::Passthrough), raw);
        assert_eq!(decode(&[0u8; 8], &SessionKey::ZERO, DecodeMode::Passthrough), [0u8; 8]);
    }

    #[test]
    fn zero_report_zero_key() {
        // Swap, XOR and rotate are all no-ops on zeroes; only the mask remains.
        let out = decode(&[0u8; 8], &SessionKey::ZERO, DecodeMode::Descramble);
        assert_eq!(out, [0x7C, 0xB9, 0xAA, 0x2A, 0xF9, 0x6D, 0x6D, 0xAA]);
    }

    #[test]
    fn rotation_matches_bytewise_formula() {
        let input = [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF];
        let rotated = u64::from_be_bytes(input).rotate_right(ROTATE_BITS).to_be_bytes();
        let previous = input.iter().cycle().skip(REPORT_LEN - 1);
        for (i, ((out, cur), prev)) in rotated.iter().zip(&input).zip(previous).enumerate() {
            assert_eq!(*out, (prev << 5) | (cur >> 3), "byte {i}");
        }
    }

    #[test]
    fn known_temperature_report() {
        let raw = [0xDD, 0xA4, 0x32, 0xB6, 0xC6, 0x9A, 0x9C, 0x70];
        let out = descramble(&raw, &SessionKey::ZERO);
        assert_eq!(out, [0x42, 0x11, 0x85, 0xD8, 0x0D, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn known_co2_report_with_key() {
        let key = SessionKey::new([0x86, 0x41, 0xC9, 0xA8, 0x7F, 0x41, 0x3C, 0xAC]);
        let raw = [0x7B, 0xDB, 0x24, 0x1A, 0x12, 0xA6, 0xDD, 0xE0];
        let out = descramble(&raw, &key);
        assert_eq!(out, [0x50, 0x03, 0x20, 0x73, 0x0D, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn encode_inverts_descramble() {
        let key = SessionKey::new([0x86, 0x41, 0xC9, 0xA8, 0x7F, 0x41, 0x3C, 0xAC]);
        let raw = [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF];
        assert_eq!(encode(&descramble(&raw, &key), &key), raw);
    }

    #[test]
    fn session_key_defaults_to_zero() {
        assert!(SessionKey::default().is_zero());
        assert_eq!(SessionKey::default(), SessionKey::ZERO);
        assert!(!SessionKey::from([1, 0, 0, 0, 0, 0, 0, 0]).is_zero());
    }
}
