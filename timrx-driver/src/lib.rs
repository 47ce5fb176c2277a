//! # Timing Receiver Driver
//!
//! This crate exposes the registers of an AFC timing receiver as typed parameters.
//! The registers live behind a remote hardware-access service; this crate knows
//! which remote procedure serves each parameter and how to call it.
//!
//! ## Overview
//!
//! A host (for example a control-system IOC) creates one [`driver::Driver`] per
//! timing receiver and forwards its parameter reads and writes to it. The driver:
//!
//! - validates the logical timing receiver number and derives the service name of
//!   its timing core,
//! - binds every parameter of the [`catalog`] to its remote procedure once at
//!   construction,
//! - stores the last written value of every parameter and address, and
//! - translates synthesizer frequencies to `N1`/`HS_DIV`/`RFREQ` register writes.
//!
//! ## Architecture
//!
//! - **[`catalog::Param`]**: every parameter with its host-facing name, e.g.
//!   `TIM_RX_AMC_EN`, and its value kind.
//! - **[`driver::Driver`]**: connection bookkeeping, the parameter store and the
//!   inbound read/write calls.
//! - **[`timrx_core::Connector`]**: opens clients of the remote register service.
//!   The transport is provided by the host.
//!
//! ## How It Works
//!
//! 1. The host implements [`timrx_core::Connector`] for its register service client
//! 2. A [`driver::Builder`] validates the configuration and connects
//! 3. Each read or write is resolved through the function registry of `timrx-core`
//! 4. Parameters without a hardware procedure are served from the stored value
//!
//! ## Basic Usage
//!
//! ```ignore
//! use timrx_driver::{catalog::{Param, Pll}, driver::Builder};
//!
//! let driver = Builder::new()
//!     .unit_number(3)
//!     .endpoint("tcp://10.0.18.35:8978")
//!     .build(my_connector)?;
//!
//! // Enable AMC trigger channel 2
//! driver.write_u32(Param::AmcEn, 2, 1, 0x1)?;
//! let link = driver.read_u32(Param::LinkStatus, 0, 0x1)?;
//!
//! let readback = driver.set_frequency(Pll::Rtm, 100e6)?;
//! println!("RTM synthesizer at {} Hz", readback.frequency);
//! ```
//!
//! ## Error Handling
//!
//! All calls return [`timrx_core::error::Error`]. A failing remote procedure is
//! reported as `HardwareAccessFailed`; the driver never retries and never
//! reconnects on its own. While disconnected, hardware-backed parameters fail
//! with `Disconnected`.
//!
//! ## Logging
//!
//! This crate uses the `log` crate. Connection changes are logged at `info`,
//! remote failures at `error` and the dispatch flow at `debug` and `trace`.
//!
//! ## Thread Model
//!
//! A single lock guards the client and the stored values. Every call holds it
//! until the remote side has answered, so calls are serialized per driver.
pub mod catalog;
pub mod driver;
mod procedures;

pub use procedures::SERVICE_AFC_TIMING;
