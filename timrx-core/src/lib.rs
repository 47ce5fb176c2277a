//! # Timing Receiver Core
//!
//! This crate provides the hardware-independent core of the timing receiver driver:
//! a typed dispatch layer that forwards parameter reads and writes to a remote
//! register service, and the frequency math for the Si57x clock synthesizers that
//! sit on the RTM and AFC boards.
//!
//! ## Overview
//!
//! A timing receiver exposes its registers (link status, AMC/FMC trigger channels,
//! PLL loop parameters) through a remote hardware-access service. Every register is
//! reached through a named remote procedure that is either:
//!
//! - a plain 32-bit accessor,
//! - a per-channel 32-bit accessor, or
//! - a 64-bit floating-point accessor.
//!
//! This crate lets a driver describe, once, which call shape each parameter uses
//! and then read or write any parameter through a single entry point.
//!
//! ## Components
//!
//! - [`RegisterClient`] / [`Connector`]: the contract a remote register client must
//!   fulfil. The transport itself lives outside this crate.
//! - [`registry::FunctionRegistry`]: maps a [`ParameterId`] to a [`registry::CallShape`]
//!   and dispatches reads and writes.
//! - [`naming::ServiceNaming`]: builds the fully qualified service name of a
//!   timing core, e.g. `HALCS3:DEVIO:LNLS_AFC_TIMING1`.
//! - [`synth::Si57x`]: converts between an output frequency and the
//!   `N1`/`HS_DIV`/`RFREQ` register encoding.
//!
//! ## Basic Usage
//!
//! ### Computing synthesizer registers
//!
//! ```
//! use timrx_core::synth::Si57x;
//!
//! let si57x = Si57x::default();
//! let setting = si57x.compute_settings(100_000_000.0).expect("100 MHz is reachable");
//! assert_eq!(setting.n1, 5);
//! assert_eq!(setting.hs_div, 5);
//!
//! let frequency = si57x.compute_frequency(&setting).expect("HS_DIV code is valid");
//! assert!((frequency - 100_000_000.0).abs() < 0.01);
//! ```
//!
//! ### Dispatching a register write
//!
//! ```ignore
//! use timrx_core::{
//!     ParameterId, Value,
//!     naming::ServiceNaming,
//!     registry::{CallShape, FunctionRegistry},
//! };
//!
//! let mut registry = FunctionRegistry::new();
//! registry.register(ParameterId::new(3), CallShape::ChannelInt32 {
//!     service: "LNLS_AFC_TIMING",
//!     register: "amc_en",
//!     write: Some(write_amc_en),
//!     read: Some(read_amc_en),
//! })?;
//!
//! let naming = ServiceNaming::new(1)?;
//! registry.dispatch_write(&mut client, &naming, ParameterId::new(3), 2, Value::UInt32(1))?;
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`error::Error`]. A parameter without a hardware
//! binding is not an error: reads report [`Readback::Disabled`] and writes succeed
//! without touching the hardware.
//!
//! ## Thread Safety
//!
//! The registry is immutable after construction and holds no locks. Callers are
//! expected to serialize access to the [`RegisterClient`] they pass in.
use std::{fmt::Display, time::Duration};

pub mod error;
pub mod naming;
pub mod registry;
pub mod synth;
mod value;

pub use error::ClientError;
pub use value::{ParameterId, Readback, Value, ValueKind};

/// Client of the remote register service.
///
/// Each method executes one remote procedure. `service` is the fully qualified
/// service name of the timing core (see [`naming::ServiceNaming`]), `register`
/// names the procedure on that service, e.g. `amc_en` or `rtm_n1`.
///
/// Implementations are expected to block until the remote side answers or the
/// timeout given at connection time elapses. Retrying is left to the implementation.
pub trait RegisterClient {
    /// Write a plain 32-bit register.
    fn write_u32(&mut self, service: &str, register: &str, value: u32)
    -> Result<(), ClientError>;

    /// Read a plain 32-bit register.
    fn read_u32(&mut self, service: &str, register: &str) -> Result<u32, ClientError>;

    /// Write a 32-bit register of one channel of a register bank.
    fn write_channel_u32(
        &mut self,
        service: &str,
        register: &str,
        channel: u32,
        value: u32,
    ) -> Result<(), ClientError>;

    /// Read a 32-bit register of one channel of a register bank.
    fn read_channel_u32(
        &mut self,
        service: &str,
        register: &str,
        channel: u32,
    ) -> Result<u32, ClientError>;

    /// Write a floating-point register.
    fn write_f64(&mut self, service: &str, register: &str, value: f64)
    -> Result<(), ClientError>;

    /// Read a floating-point register.
    fn read_f64(&mut self, service: &str, register: &str) -> Result<f64, ClientError>;

    /// Release the connection. Called once before the client is dropped.
    fn disconnect(&mut self) {}
}

/// Options handed to a [`Connector`] when a new client is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Address of the remote register service, e.g. `ipc:///tmp/malamute`
    pub endpoint: String,
    /// Verbosity of the client library's own diagnostics
    pub verbosity: u32,
    /// Where the client library writes its diagnostics, e.g. `stdout`
    pub log_sink: String,
    /// Timeout of a single remote call
    pub timeout: Duration,
}

impl Display for ConnectOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (verbosity={}, timeout={:?})",
            self.endpoint, self.verbosity, self.timeout
        )
    }
}

/// Opens connections to the remote register service.
pub trait Connector {
    type Client: RegisterClient;

    /// Open a new client. Fails if the endpoint cannot be reached.
    fn connect(&self, options: &ConnectOptions) -> Result<Self::Client, ClientError>;
}
