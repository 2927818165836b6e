//! HID transport seam.

use crate::{DeviceInfo, TransportError};

/// Blocking access to one open sensor.
///
/// Implementations are owned by exactly one [`Session`](crate::Session) and
/// are never shared, so methods take `&mut self` and need no locking.
pub trait Transport {
    /// Write a feature report, returning the number of bytes transferred.
    fn send_feature_report(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Read one input report, blocking for at most `timeout_ms`.
    ///
    /// Returns the number of bytes written into `buf`; `Ok(0)` means the
    /// timeout elapsed without a report.
    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, TransportError>;

    /// Release the device. Must only be called from the owning thread while
    /// no read is in flight.
    fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn device_info(&self) -> Option<&DeviceInfo> {
        None
    }
}

pub mod mock {
    //! Scripted in-memory transport for tests and demos.

    use super::*;
    use co2mon_hid_protocol::{PRODUCT_ID, REPORT_LEN, VENDOR_ID};
    use std::collections::VecDeque;

    /// One scripted response to `read_timeout`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ScriptedRead {
        /// A full raw (still scrambled) report.
        Report([u8; REPORT_LEN]),
        /// A transfer of the given bytes, typically the wrong length.
        Partial(Vec<u8>),
        /// A transport failure.
        Fail(String),
    }

    /// How the mock answers the magic-table feature report.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum FeatureWrite {
        Accept,
        Short(usize),
        Fail,
    }

    /// Transport that replays a fixed script of reads.
    ///
    /// Once the script is exhausted every read fails with
    /// [`TransportError::Disconnected`].
    pub struct ScriptedTransport {
        info: DeviceInfo,
        reads: VecDeque<ScriptedRead>,
        feature_reports: Vec<Vec<u8>>,
        feature_write: FeatureWrite,
        read_attempts: usize,
        last_timeout_ms: Option<u32>,
        close_failures: usize,
        close_attempts: usize,
        closed: bool,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self {
                info: DeviceInfo::new(VENDOR_ID, PRODUCT_ID, "mock://co2mon"),
                reads: VecDeque::new(),
                feature_reports: Vec::new(),
                feature_write: FeatureWrite::Accept,
                read_attempts: 0,
                last_timeout_ms: None,
                close_failures: 0,
                close_attempts: 0,
                closed: false,
            }
        }

        pub fn push_report(&mut self, raw: [u8; REPORT_LEN]) -> &mut Self {
            self.reads.push_back(ScriptedRead::Report(raw));
            self
        }

        pub fn push_partial(&mut self, bytes: impl Into<Vec<u8>>) -> &mut Self {
            self.reads.push_back(ScriptedRead::Partial(bytes.into()));
            self
        }

        pub fn push_failure(&mut self, message: impl Into<String>) -> &mut Self {
            self.reads.push_back(ScriptedRead::Fail(message.into()));
            self
        }

        /// Make the magic-table write report fewer bytes than sent.
        pub fn short_key_write(&mut self, written: usize) -> &mut Self {
            self.feature_write = FeatureWrite::Short(written);
            self
        }

        /// Make the magic-table write fail outright.
        pub fn reject_key_write(&mut self) -> &mut Self {
            self.feature_write = FeatureWrite::Fail;
            self
        }

        /// Make the next `times` calls to `close` fail.
        pub fn fail_close(&mut self, times: usize) -> &mut Self {
            self.close_failures = times;
            self
        }

        pub fn feature_reports(&self) -> &[Vec<u8>] {
            &self.feature_reports
        }

        pub fn read_attempts(&self) -> usize {
            self.read_attempts
        }

        pub fn last_timeout_ms(&self) -> Option<u32> {
            self.last_timeout_ms
        }

        pub fn remaining(&self) -> usize {
            self.reads.len()
        }

        pub fn close_attempts(&self) -> usize {
            self.close_attempts
        }

        pub fn is_closed(&self) -> bool {
            self.closed
        }
    }

    impl Default for ScriptedTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for ScriptedTransport {
        fn send_feature_report(&mut self, data: &[u8]) -> Result<usize, TransportError> {
            if self.closed {
                return Err(TransportError::Disconnected);
            }
            match self.feature_write {
                FeatureWrite::Accept => {
                    self.feature_reports.push(data.to_vec());
                    Ok(data.len())
                }
                FeatureWrite::Short(written) => {
                    self.feature_reports.push(data.to_vec());
                    Ok(written)
                }
                FeatureWrite::Fail => Err(TransportError::Write(
                    "hid_send_feature_report: error".to_string(),
                )),
            }
        }

        fn read_timeout(
            &mut self,
            buf: &mut [u8],
            timeout_ms: u32,
        ) -> Result<usize, TransportError> {
            self.read_attempts += 1;
            self.last_timeout_ms = Some(timeout_ms);
            if self.closed {
                return Err(TransportError::Disconnected);
            }
            match self.reads.pop_front() {
                Some(ScriptedRead::Report(raw)) => copy_into(buf, &raw),
                Some(ScriptedRead::Partial(bytes)) => copy_into(buf, &bytes),
                Some(ScriptedRead::Fail(message)) => Err(TransportError::Read(message)),
                None => Err(TransportError::Disconnected),
            }
        }

        fn close(&mut self) -> Result<(), TransportError> {
            self.close_attempts += 1;
            if self.close_failures > 0 {
                self.close_failures -= 1;
                return Err(TransportError::Io(std::io::Error::other(
                    "hid_close: device busy",
                )));
            }
            self.closed = true;
            Ok(())
        }

        fn device_info(&self) -> Option<&DeviceInfo> {
            Some(&self.info)
        }
    }

    fn copy_into(buf: &mut [u8], bytes: &[u8]) -> Result<usize, TransportError> {
        let n = bytes.len().min(buf.len());
        buf.iter_mut()
            .zip(bytes)
            .for_each(|(dst, src)| *dst = *src);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::mock::ScriptedTransport;
    use super::*;

    #[test]
    fn test_mock_feature_report_recorded() -> Result<(), TransportError> {
        let mut transport = ScriptedTransport::new();
        assert_eq!(transport.send_feature_report(&[0u8; 8])?, 8);
        assert_eq!(transport.feature_reports(), &[vec![0u8; 8]]);
        Ok(())
    }

    #[test]
    fn test_mock_reads_follow_script() -> Result<(), TransportError> {
        let mut transport = ScriptedTransport::new();
        transport
            .push_report([1, 2, 3, 4, 5, 6, 7, 8])
            .push_partial(vec![9, 9])
            .push_failure("boom");

        let mut buf = [0u8; 8];
        assert_eq!(transport.read_timeout(&mut buf, 5000)?, 8);
        assert_eq!(buf, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(transport.read_timeout(&mut buf, 5000)?, 2);
        assert!(matches!(
            transport.read_timeout(&mut buf, 5000),
            Err(TransportError::Read(_))
        ));
        assert!(matches!(
            transport.read_timeout(&mut buf, 5000),
            Err(TransportError::Disconnected)
        ));
        assert_eq!(transport.read_attempts(), 4);
        assert_eq!(transport.last_timeout_ms(), Some(5000));
        Ok(())
    }

    #[test]
    fn test_mock_closed_rejects_io() -> Result<(), TransportError> {
        let mut transport = ScriptedTransport::new();
        transport.push_report([0u8; 8]);
        transport.close()?;
        assert!(transport.is_closed());
        let mut buf = [0u8; 8];
        assert!(transport.read_timeout(&mut buf, 10).is_err());
        assert!(transport.send_feature_report(&[0u8; 8]).is_err());
        Ok(())
    }

    #[test]
    fn test_mock_device_info() {
        let transport = ScriptedTransport::new();
        let info = transport.device_info();
        assert!(info.is_some_and(DeviceInfo::is_co2mon));
    }
}
