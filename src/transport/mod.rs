//! # Printer Transport Layer
//!
//! How bytes reach the virtual printer.
//!
//! ## Available Transports
//!
//! - [`parallel`]: LPT data/status/control registers with strobe handshake
//!
//! Hosts that already have a byte stream can skip the port and call
//! [`crate::printer::Printer::write_all`] directly.

pub mod parallel;

pub use parallel::ParallelPort;
