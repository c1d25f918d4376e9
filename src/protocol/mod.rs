//! # ESC/P Protocol
//!
//! The command language of 9/24-pin Epson-compatible dot-matrix printers:
//! what the bytes mean, not what they do to the page.
//!
//! ## Module Structure
//!
//! - [`commands`]: Control codes and the command descriptor table
//! - [`parser`]: Byte-at-a-time state machine producing [`parser::Action`]s
//! - [`charset`]: Code page and international character set tables
//!
//! ## Usage Example
//!
//! ```
//! use dotmatrix::protocol::parser::{Action, Parser};
//!
//! let mut parser = Parser::new();
//! let actions: Vec<Action> = b"\x1bEHi\r\n"
//!     .iter()
//!     .map(|&b| parser.feed(b))
//!     .filter(|a| *a != Action::None)
//!     .collect();
//! assert_eq!(actions.len(), 5);
//! ```

pub mod charset;
pub mod commands;
pub mod parser;

pub use parser::{Action, Parser, ParserState};
