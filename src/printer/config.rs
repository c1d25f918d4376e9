//! # Printer Configuration
//!
//! This module defines the options a virtual printer is created with.
//!
//! ## Options
//!
//! | Key | Default | Meaning |
//! |-----|---------|---------|
//! | `printer` | `true` | Enable printer emulation |
//! | `dpi` | 360 | Page raster resolution |
//! | `width` | 85 | Paper width in 1/10 inch (8.5") |
//! | `height` | 110 | Paper height in 1/10 inch (11.0") |
//! | `printoutput` | `png` | `png`, `ps`, `bmp` or `printer` |
//! | `multipage` | `false` | Collect pages in one PostScript file / spooler job |
//! | `docpath` | `.` | Directory for output files |
//! | `timeout` | 0 | Auto-eject after this many idle milliseconds (0 = off) |
//! | `fontpath` | `FONTS` | Directory with the TrueType printer faces |
//! | `spooler` | `lpr` | Command receiving PostScript for `printoutput = printer` |
//!
//! ## Usage
//!
//! ```
//! use dotmatrix::printer::PrinterConfig;
//!
//! let config = PrinterConfig::letter();
//! assert_eq!(config.page_pixels(), (3060, 3960));
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PrinterError;

// ============================================================================
// OUTPUT FORMAT
// ============================================================================

/// Where finished pages go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One PNG image per page (`page<N>.png`)
    #[default]
    Png,
    /// PostScript, one file per page or one multipage document
    #[serde(rename = "ps")]
    PostScript,
    /// One BMP image per page (`page<N>.bmp`)
    Bmp,
    /// PostScript piped to the host print spooler
    Printer,
}

impl OutputFormat {
    /// File extension of the artifacts this format produces.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::PostScript | Self::Printer => "ps",
            Self::Bmp => "bmp",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = PrinterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "ps" | "postscript" => Ok(Self::PostScript),
            "bmp" => Ok(Self::Bmp),
            "printer" => Ok(Self::Printer),
            other => Err(PrinterError::Config(format!(
                "Unknown output '{}'. Use png, ps, bmp or printer",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Png => "png",
            Self::PostScript => "ps",
            Self::Bmp => "bmp",
            Self::Printer => "printer",
        };
        f.write_str(name)
    }
}

// ============================================================================
// PRINTER CONFIGURATION
// ============================================================================

/// # Printer Configuration
///
/// Paper geometry, raster resolution and output routing of one virtual
/// printer.
///
/// ## Calculations
///
/// ```text
/// page_width_in  = width / 10
/// width_px       = page_width_in * dpi
///
/// For US Letter at 360 DPI:
///   width_px  = 8.5 * 360  = 3060
///   height_px = 11.0 * 360 = 3960
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterConfig {
    /// Enable printer emulation
    #[serde(rename = "printer")]
    pub enabled: bool,

    /// Resolution in dots per inch
    pub dpi: u16,

    /// Paper width in 1/10 inch
    pub width: u16,

    /// Paper height in 1/10 inch
    pub height: u16,

    /// Output method for finished pages
    #[serde(rename = "printoutput")]
    pub output: OutputFormat,

    /// Keep one document open across pages until explicitly finished
    pub multipage: bool,

    /// Directory where output files are stored
    pub docpath: PathBuf,

    /// Auto-eject timeout in milliseconds (0 disables)
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,

    /// Directory holding `roman.ttf`, `sansserif.ttf`, `courier.ttf`,
    /// `script.ttf` and `ocra.ttf`
    #[serde(rename = "fontpath")]
    pub font_path: PathBuf,

    /// Spooler command for `printoutput = printer`
    pub spooler: String,
}

impl PrinterConfig {
    /// # US Letter, 360 DPI, PNG output
    ///
    /// The power-on configuration of the emulated printer.
    pub fn letter() -> Self {
        Self {
            enabled: true,
            dpi: 360,
            width: 85,
            height: 110,
            output: OutputFormat::Png,
            multipage: false,
            docpath: PathBuf::from("."),
            timeout_ms: 0,
            font_path: PathBuf::from("FONTS"),
            spooler: "lpr".to_string(),
        }
    }

    /// # A4, 360 DPI, PNG output
    ///
    /// 210 × 297 mm rounded to 8.3" × 11.7".
    pub fn a4() -> Self {
        Self {
            width: 83,
            height: 117,
            ..Self::letter()
        }
    }

    /// Load a configuration from a JSON file.
    ///
    /// Missing keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PrinterError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the geometry describes a usable page.
    pub fn validate(&self) -> Result<(), PrinterError> {
        if self.dpi == 0 {
            return Err(PrinterError::Config("dpi must be positive".to_string()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(PrinterError::Config(format!(
                "Invalid paper size {}x{} (1/10 inch)",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Paper width in inches
    #[inline]
    pub fn page_width_inches(&self) -> f64 {
        self.width as f64 / 10.0
    }

    /// Paper height in inches
    #[inline]
    pub fn page_height_inches(&self) -> f64 {
        self.height as f64 / 10.0
    }

    /// Page raster size in pixels `(width, height)`
    pub fn page_pixels(&self) -> (usize, usize) {
        let dpi = self.dpi as f64;
        (
            (self.page_width_inches() * dpi).round() as usize,
            (self.page_height_inches() * dpi).round() as usize,
        )
    }

    /// Auto-eject timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::letter()
    }
}

// ============================================================================
// TESTS
// ============================================================================
