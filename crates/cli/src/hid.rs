//! hidapi-backed transport.

use co2mon_hid_protocol::{PRODUCT_ID, VENDOR_ID, product_name};
use co2mon_session::{DeviceInfo, Transport, TransportError};
use hidapi::{HidApi, HidDevice};
use std::ffi::CString;
use tracing::debug;

/// Which sensor to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    /// Platform HID path as printed by `co2mon list`.
    Path(String),
    /// First device with this VID/PID pair.
    Ids { vid: u16, pid: u16 },
}

impl Default for DeviceSelector {
    fn default() -> Self {
        DeviceSelector::Ids {
            vid: VENDOR_ID,
            pid: PRODUCT_ID,
        }
    }
}

impl DeviceSelector {
    pub fn describe(&self) -> String {
        match self {
            DeviceSelector::Path(path) => path.clone(),
            DeviceSelector::Ids { vid, pid } => format!("{vid:04x}:{pid:04x}"),
        }
    }
}

pub struct HidapiTransport {
    device: Option<HidDevice>,
    info: DeviceInfo,
}

impl HidapiTransport {
    /// Open the selected device.
    ///
    /// Returns [`TransportError::NotFound`] when nothing matching is attached.
    pub fn open(api: &HidApi, selector: &DeviceSelector) -> Result<Self, TransportError> {
        let info = enumerate(api, false)
            .into_iter()
            .find(|info| match selector {
                DeviceSelector::Path(path) => info.path == *path,
                DeviceSelector::Ids { vid, pid } => {
                    info.vendor_id == *vid && info.product_id == *pid
                }
            })
            .ok_or_else(|| TransportError::NotFound(selector.describe()))?;

        let path = CString::new(info.path.clone())
            .map_err(|e| TransportError::Open(format!("invalid HID path '{}': {e}", info.path)))?;
        let device = api
            .open_path(&path)
            .map_err(|e| TransportError::Open(format!("{}: {e}", info.path)))?;

        debug!("Opened {} at {}", info.display_name(), info.path);
        Ok(Self {
            device: Some(device),
            info,
        })
    }

    fn device(&self) -> Result<&HidDevice, TransportError> {
        self.device.as_ref().ok_or(TransportError::Disconnected)
    }
}

impl Transport for HidapiTransport {
    fn send_feature_report(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        self.device()?
            .send_feature_report(data)
            .map_err(|e| TransportError::Write(format!("hid_send_feature_report: {e}")))?;
        // hidapi reports success only for a complete transfer.
        Ok(data.len())
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, TransportError> {
        let timeout = i32::try_from(timeout_ms).unwrap_or(i32::MAX);
        self.device()?
            .read_timeout(buf, timeout)
            .map_err(|e| TransportError::Read(format!("hid_read_timeout: {e}")))
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.device.take().is_some() {
            debug!("Closed {}", self.info.path);
        }
        Ok(())
    }

    fn device_info(&self) -> Option<&DeviceInfo> {
        Some(&self.info)
    }
}

/// List attached HID devices, optionally only the CO2 monitors.
pub fn enumerate(api: &HidApi, co2mon_only: bool) -> Vec<DeviceInfo> {
    let mut devices: Vec<DeviceInfo> = api
        .device_list()
        .map(|d| {
            let mut info = DeviceInfo::new(
                d.vendor_id(),
                d.product_id(),
                d.path().to_string_lossy().into_owned(),
            );
            info.serial_number = d.serial_number().map(str::to_string);
            info.manufacturer = d.manufacturer_string().map(str::to_string);
            let known_name = if info.is_co2mon() {
                product_name(info.product_id)
            } else {
                None
            };
            info.product_name = d
                .product_string()
                .or(known_name)
                .map(str::to_string);
            info
        })
        .filter(|info| !co2mon_only || info.is_co2mon())
        .collect();
    devices.sort_by(|a, b| a.path.cmp(&b.path));
    devices.dedup_by(|a, b| a.path == b.path);
    devices
}
