//! Typed sensor readings.

#![deny(static_mut_refs)]

/// What a report measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// Ambient temperature in degrees Celsius.
    Temperature,
    /// CO2 concentration in parts per million.
    Co2,
    /// Any report code this crate does not interpret.
    Other,
}

impl SensorKind {
    /// Short label used by the tab-separated output format.
    pub fn label(self) -> &'static str {
        match self {
            SensorKind::Temperature => "Tamb",
            SensorKind::Co2 => "CntR",
            SensorKind::Other => "Other",
        }
    }
}

/// Outcome of processing one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    /// Transport read failed or returned the wrong number of bytes.
    DeviceReadError,
    /// Bad terminator, unknown code or a discarded implausible value.
    UnexpectedData,
    ChecksumError,
}

impl Status {
    /// Whether the loop can move on to the next poll after this status.
    pub fn is_transient(self) -> bool {
        matches!(self, Status::UnexpectedData | Status::ChecksumError)
    }
}

/// One processed report.
///
/// `value` is meaningful only when `status` is [`Status::Ok`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub kind: SensorKind,
    pub value: f64,
    pub status: Status,
}

impl Reading {
    /// Placeholder value carried by failed readings.
    pub const NO_VALUE: f64 = -99.0;

    pub fn ok(kind: SensorKind, value: f64) -> Self {
        Self {
            kind,
            value,
            status: Status::Ok,
        }
    }

    /// A failed reading with no known kind.
    pub fn failed(status: Status) -> Self {
        Self {
            kind: SensorKind::Other,
            value: Self::NO_VALUE,
            status,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}
