//! # dotmatrix - Virtual ESC/P Dot-Matrix Printer
//!
//! dotmatrix emulates a 24-pin Epson ESC/P printer. Bytes arriving over a
//! (virtual) parallel port are interpreted as text, control codes and
//! escape sequences, printed onto an in-memory page, and emitted as PNG,
//! BMP or PostScript when the page is ejected. It provides:
//!
//! - **Protocol**: ESC/P command table, streaming parser, code pages
//! - **Printer**: Typographic state, page handling, bit images, bar codes
//! - **Rendering**: Glyph rasterizer and colour page raster
//! - **Output**: PNG/BMP files, PostScript documents, print spooler
//! - **Transport**: Parallel port register emulation
//!
//! ## Quick Start
//!
//! ```no_run
//! use dotmatrix::printer::{OutputFormat, Printer, PrinterConfig};
//!
//! let config = PrinterConfig {
//!     output: OutputFormat::PostScript,
//!     docpath: "out".into(),
//!     ..PrinterConfig::letter()
//! };
//! let mut printer = Printer::new(config)?;
//!
//! // Bold heading, then plain text
//! printer.write_all(b"\x1b@\x1bEInvoice\x1bF\r\n");
//! printer.write_all(b"Total: 42.00\r\n");
//!
//! // Eject the page
//! printer.form_feed();
//! # Ok::<(), dotmatrix::error::PrinterError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | ESC/P command table and parser |
//! | [`printer`] | The printer: state, commands, pages |
//! | [`render`] | Glyphs and the page raster |
//! | [`output`] | Page encoders and file naming |
//! | [`transport`] | Parallel port |
//! | [`error`] | Error types |

pub mod error;
pub mod output;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod transport;

// Re-exports for convenience
pub use error::PrinterError;
pub use printer::{Printer, PrinterConfig};
pub use transport::ParallelPort;
