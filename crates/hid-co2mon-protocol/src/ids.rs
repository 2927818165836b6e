//! USB vendor and product ID constants.
//!
//! The sensor board is built on a Holtek HT USB controller and enumerates
//! under Holtek's VID `0x04D9`. The same PID is used by every rebadged
//! variant (TFA Dostmann AirCO2NTROL Mini, KIT MT 8057, CO2Meter RAD-0301).
//!
//! Sources:
//! - USB ID database: `04d9` "Holtek Semiconductor, Inc.", `a052` "USB-zyTemp"
//! - dmage/co2mon udev rule: `ATTRS{idVendor}=="04d9", ATTRS{idProduct}=="a052"`

#![deny(static_mut_refs)]

/// Holtek Semiconductor USB Vendor ID.
pub const VENDOR_ID: u16 = 0x04D9;

/// "USB-zyTemp" CO2 monitor product ID.
pub const PRODUCT_ID: u16 = 0xA052;

/// Returns `true` if the VID/PID pair identifies a supported CO2 monitor.
pub fn is_co2mon_device(vid: u16, pid: u16) -> bool {
    vid == VENDOR_ID && pid == PRODUCT_ID
}

/// Returns the product name for a known PID, or `None`.
pub fn product_name(pid: u16) -> Option<&'static str> {
    match pid {
        PRODUCT_ID => Some("USB-zyTemp CO2 monitor"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_product_recognised() {
        assert!(is_co2mon_device(VENDOR_ID, PRODUCT_ID));
    }

    #[test]
    fn unknown_product_not_recognised() {
        assert!(!is_co2mon_device(VENDOR_ID, 0x0001));
        assert!(!is_co2mon_device(0x0000, PRODUCT_ID));
    }

    #[test]
    fn product_names() {
        assert_eq!(product_name(PRODUCT_ID), Some("USB-zyTemp CO2 monitor"));
        assert_eq!(product_name(0xFFFF), None);
    }
}
