//! # Error Types
//!
//! This module defines error types used throughout the dotmatrix library.
//!
//! The interpreter itself never fails: malformed command streams are logged
//! and resynchronised. These errors surface from the layers that touch the
//! outside world (output files, the print spooler, configuration files and
//! font resources), where the caller decides whether to log or propagate.

use thiserror::Error;

/// Main error type for dotmatrix operations
#[derive(Debug, Error)]
pub enum PrinterError {
    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Font resource could not be loaded or parsed
    #[error("Font error: {0}")]
    Font(String),

    /// Image encoding error (PNG/BMP)
    #[error("Image error: {0}")]
    Image(String),

    /// Bar code data the symbology rejects
    #[error("Bar code error: {0}")]
    Barcode(String),

    /// Native print spooler could not be started or fed
    #[error("Spooler error: {0}")]
    Spooler(String),

    /// Configuration file parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
