use std::{error::Error as StdError, fmt::Display};

use crate::{ParameterId, ValueKind};

/// Failure reported by a remote register client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientError {
    /// The remote side did not answer within the configured timeout.
    TimedOut,
    /// The connection to the remote service broke down.
    Transport,
    /// The remote service answered with a non-success code.
    Remote(i32),
}

impl Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::TimedOut => write!(f, "remote call timed out"),
            ClientError::Transport => write!(f, "transport failure"),
            ClientError::Remote(code) => write!(f, "remote error code {}", code),
        }
    }
}

impl StdError for ClientError {}

/// Errors that may occur when dispatching parameters to the hardware.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A remote procedure returned a non-success code.
    HardwareAccessFailed {
        service: String,
        register: &'static str,
        source: ClientError,
    },
    /// The logical hardware unit number is outside of the supported range.
    InvalidDevice { number: u32, min: u32, max: u32 },
    /// The address is outside of the range configured for the driver.
    InvalidAddress { address: u32, max: u32 },
    /// The formatted service name does not fit into the service name buffer.
    NameTooLong { name: String, max: usize },
    /// No divider combination places the synthesizer VCO in range for this frequency.
    FrequencyOutOfRange(f64),
    /// The synthesizer crystal frequency is not a finite, positive number.
    InvalidCrystal(f64),
    /// The HS_DIV register holds a code that is not part of the divider table.
    InvalidHsDiv(u32),
    /// A parameter was registered twice.
    DuplicateBinding(ParameterId),
    /// The value box does not match the value kind the parameter was declared with.
    ValueKind {
        id: ParameterId,
        expected: ValueKind,
        got: ValueKind,
    },
    /// The initial or an explicit connection attempt failed.
    ConnectFailed {
        endpoint: String,
        source: ClientError,
    },
    /// A hardware access was attempted while no client is connected.
    Disconnected,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::HardwareAccessFailed {
                service,
                register,
                source,
            } => write!(
                f,
                "Hardware access to {} on service {} failed: {}",
                register, service, source
            ),
            Error::InvalidDevice { number, min, max } => write!(
                f,
                "Invalid timing receiver number {}, must be within {}..={}",
                number, min, max
            ),
            Error::InvalidAddress { address, max } => {
                write!(f, "Invalid address {}, must be below {}", address, max)
            }
            Error::NameTooLong { name, max } => write!(
                f,
                "Service name {} exceeds the maximum of {} characters",
                name,
                max - 1
            ),
            Error::FrequencyOutOfRange(frequency) => write!(
                f,
                "No synthesizer divider combination reaches {} Hz",
                frequency
            ),
            Error::InvalidCrystal(fxtal) => {
                write!(f, "Invalid synthesizer crystal frequency {} Hz", fxtal)
            }
            Error::InvalidHsDiv(code) => write!(f, "Invalid HS_DIV register code {}", code),
            Error::DuplicateBinding(id) => {
                write!(f, "Parameter {} already has a hardware binding", id)
            }
            Error::ValueKind { id, expected, got } => write!(
                f,
                "Parameter {} expects a {} value, but got {}",
                id, expected, got
            ),
            Error::ConnectFailed { endpoint, source } => {
                write!(f, "Could not connect to {}: {}", endpoint, source)
            }
            Error::Disconnected => write!(f, "Not connected to the register service"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::HardwareAccessFailed { source, .. } | Error::ConnectFailed { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

#[test]
fn name_too_long_reports_usable_length() {
    let err = Error::NameTooLong {
        name: "X".to_string(),
        max: 50,
    };
    assert_eq!(
        err.to_string(),
        "Service name X exceeds the maximum of 49 characters"
    );
}

#[test]
fn hardware_failure_keeps_client_error_as_source() {
    let err = Error::HardwareAccessFailed {
        service: "HALCS1:DEVIO:LNLS_AFC_TIMING0".to_string(),
        register: "amc_en",
        source: ClientError::TimedOut,
    };
    let source = StdError::source(&err).expect("source should be set");
    assert_eq!(source.to_string(), "remote call timed out");
}
