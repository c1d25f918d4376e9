//! # Virtual Printer
//!
//! An Epson ESC/P 24-pin printer that prints onto an in-memory page and
//! hands finished pages to the configured output.
//!
//! ## Modules
//!
//! - [`config`]: Paper, resolution and output options
//! - [`state`]: Typographic registers (margins, pitch, style, tabs, tables)
//! - [`bitimage`]: Bit image density table and column rendering
//! - [`barcode`]: `ESC ( B` bar codes
//! - [`timer`]: Auto-eject timeout
//!
//! ## Data Flow
//!
//! ```text
//! byte ─▶ MSB control ─▶ Parser ─▶ Action ─┬─▶ PrinterState (registers)
//!                                          └─▶ PageRaster (glyphs, graphics)
//!                                                   │
//!                       form feed / page overflow ──┴─▶ PageOutput
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use dotmatrix::printer::{Printer, PrinterConfig};
//!
//! let mut printer = Printer::new(PrinterConfig::letter())?;
//! printer.write_all(b"\x1b@\x1bEHello, world!\r\n\x0c");
//! # Ok::<(), dotmatrix::error::PrinterError>(())
//! ```

pub mod barcode;
pub mod bitimage;
pub mod config;
mod execute;
pub mod state;
pub mod timer;

use std::time::Instant;

use crate::error::PrinterError;
use crate::output::{Artifact, PageOutput};
use crate::protocol::parser::{Action, Parser};
use crate::render::glyph::GlyphRasterizer;
use crate::render::raster::PageRaster;

pub use config::{OutputFormat, PrinterConfig};
pub use state::{PrinterState, Score, Style};

use bitimage::BitImageMode;
use timer::EjectTimer;

/// Rows between the two strokes of a double score line
const DOUBLE_SCORE_GAP: i64 = 5;

/// # Printer
///
/// Feed it bytes with [`Printer::print_char`] or [`Printer::write_all`].
/// Pages are emitted when the paper runs out, on form feed, and on
/// [`Printer::form_feed`] (the panel eject button).
pub struct Printer {
    config: PrinterConfig,
    state: PrinterState,
    parser: Parser,
    page: PageRaster,
    fonts: GlyphRasterizer,
    output: PageOutput,
    /// Layout of the bit image being received
    bit_image: Option<BitImageMode>,
    timer: EjectTimer,
    autofeed: bool,
    /// A byte arrived since the last ACK
    char_read: bool,
    artifacts: Vec<Artifact>,
}

impl Printer {
    /// Power on a printer with `config`.
    pub fn new(config: PrinterConfig) -> Result<Self, PrinterError> {
        config.validate()?;
        let (width, height) = config.page_pixels();

        let mut printer = Self {
            state: PrinterState::new(config.page_width_inches(), config.page_height_inches()),
            parser: Parser::new(),
            page: PageRaster::new(width, height, config.dpi),
            fonts: GlyphRasterizer::new(&config.font_path, config.dpi),
            output: PageOutput::new(&config),
            bit_image: None,
            timer: EjectTimer::new(config.timeout()),
            autofeed: false,
            char_read: false,
            artifacts: Vec::new(),
            config,
        };
        printer.reset();

        log::debug!(
            "Printer enabled: {}x{} px at {} dpi, output {}",
            width,
            height,
            printer.config.dpi,
            printer.config.output
        );
        Ok(printer)
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    pub fn state(&self) -> &PrinterState {
        &self.state
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// The page being printed
    pub fn page(&self) -> &PageRaster {
        &self.page
    }

    /// Pages emitted so far
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    /// Receive one byte from the host.
    pub fn print_char(&mut self, byte: u8) {
        self.char_read = true;

        let byte = match self.state.msb {
            Some(false) => byte & 0x7F,
            Some(true) => byte | 0x80,
            None => byte,
        };

        match self.parser.feed(byte) {
            Action::None => {}
            Action::Print(b) => self.print_glyph(b),
            Action::Control(code) => self.execute_control(code),
            Action::Command { command, params } => self.execute_command(command, &params),
            Action::Payload { command, data } => self.execute_payload(command, &data),
            Action::HorizontalTabs(columns) => self.state.set_horizontal_tabs(&columns),
            Action::VerticalTabs(lines) => self.state.set_vertical_tabs(&lines),
            Action::BitImageColumn(column) => self.print_bit_column(&column),
        }

        self.timer.arm(Instant::now());
    }

    /// Receive a block of bytes.
    pub fn write_all(&mut self, data: &[u8]) {
        for &byte in data {
            self.print_char(byte);
        }
    }

    // ------------------------------------------------------------------------
    // Control lines
    // ------------------------------------------------------------------------

    /// Initialise the printer (`ESC @`).
    pub fn reset(&mut self) {
        self.state.reset();
        self.parser.reset();
        self.parser.set_upper_control_codes(!self.state.print_upper_control);
        self.bit_image = None;
        self.new_page(false, true);
    }

    /// INIT line: initialise and forget a pending acknowledge.
    pub fn reset_hard(&mut self) {
        self.char_read = false;
        self.reset();
    }

    pub fn set_autofeed(&mut self, autofeed: bool) {
        self.autofeed = autofeed;
    }

    pub fn autofeed(&self) -> bool {
        self.autofeed
    }

    /// A virtual printer is never busy.
    pub fn is_busy(&self) -> bool {
        false
    }

    /// Acknowledge the last byte. Returns `true` once per received byte.
    pub fn ack(&mut self) -> bool {
        std::mem::take(&mut self.char_read)
    }

    /// Eject the current page (if anything is on it) and close an open
    /// multipage document.
    pub fn form_feed(&mut self) {
        self.timer.disarm();
        self.new_page(true, true);
        self.finish_multipage();
    }

    /// Check the auto-eject timeout. Returns `true` if it fired.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.timer.expired(now) {
            return false;
        }
        log::debug!("Printer timeout, ejecting page");
        self.form_feed();
        true
    }

    /// Close the multipage document or print job, if one is open.
    pub fn finish_multipage(&mut self) {
        match self.output.finish_multipage() {
            Ok(Some(path)) => log::info!("Document written to {}", path.display()),
            Ok(None) => {}
            Err(e) => log::error!("Unable to finish document: {}", e),
        }
    }

    // ------------------------------------------------------------------------
    // Pages
    // ------------------------------------------------------------------------

    /// Start a fresh sheet, emitting the current one first if `save` and
    /// anything was printed on it.
    fn new_page(&mut self, save: bool, reset_x: bool) {
        self.timer.disarm();

        if save && !self.page.is_blank() {
            self.output_page();
        }
        if reset_x {
            self.state.x = self.state.left_margin;
        }
        self.state.y = self.state.top_margin;
        self.page.clear();
    }

    fn output_page(&mut self) {
        match self.output.output_page(&self.page) {
            Ok(artifact) => {
                match &artifact {
                    Artifact::File(path) => log::info!("Page written to {}", path.display()),
                    Artifact::Spooled { page } => log::info!("Page {} sent to spooler", page),
                }
                self.artifacts.push(artifact);
            }
            Err(e) => log::error!("Unable to output page: {}", e),
        }
    }

    /// Move down one line, feeding a new sheet past the bottom margin.
    fn line_feed(&mut self) {
        self.state.x = self.state.left_margin;
        self.state.y += self.state.line_spacing;
        if self.state.y > self.state.bottom_margin {
            self.new_page(true, false);
        }
    }

    // ------------------------------------------------------------------------
    // Printing
    // ------------------------------------------------------------------------

    fn print_glyph(&mut self, byte: u8) {
        let byte = if byte == 0x01 { b' ' } else { byte };
        let ch = self.state.translate(byte);
        let spec = self.state.font;
        let glyph = self.fonts.rasterize(ch, &spec);
        let metrics = self.fonts.metrics(&spec);

        let dpi = self.config.dpi;
        let style = self.state.style;
        let ink = self.state.ink;
        let pixel_x = self.state.pixel_x(dpi);
        let pixel_y = self.state.pixel_y(dpi);

        let pen_x = pixel_x + glyph.left as i64;
        let mut pen_y = pixel_y - glyph.top as i64 + metrics.ascender as i64;
        if style.contains(Style::SUBSCRIPT) {
            pen_y += glyph.height as i64 / 2;
        }

        self.page.blit_glyph(&glyph, pen_x, pen_y, false, ink);
        self.page.blit_glyph(&glyph, pen_x + 1, pen_y, true, ink);
        if style.contains(Style::DOUBLESTRIKE) {
            self.page.blit_glyph(&glyph, pen_x, pen_y + 1, true, ink);
            self.page.blit_glyph(&glyph, pen_x + 1, pen_y + 1, true, ink);
        }
        if style.contains(Style::BOLD) {
            for dx in 1..=3 {
                self.page.blit_glyph(&glyph, pen_x + dx, pen_y, true, ink);
            }
        }

        let line_start = pixel_x;
        let mut advance = if style.contains(Style::PROPORTIONAL) {
            glyph.advance / dpi as f64
        } else {
            self.state.fixed_advance()
        };
        advance += self.state.extra_spacing;
        self.state.x += advance;

        let score = self.state.score;
        if score != Score::None && style.intersects(Style::SCORES) {
            let height = metrics.height;
            let line_y = if style.contains(Style::UNDERLINE) {
                pixel_y + (height * 0.9) as i64
            } else if style.contains(Style::STRIKETHROUGH) {
                pixel_y + (height * 0.45) as i64
            } else if score.is_double() {
                pixel_y - DOUBLE_SCORE_GAP
            } else {
                pixel_y
            };

            let line_end = self.state.pixel_x(dpi);
            self.page.draw_line(line_start, line_end, line_y, score.is_broken());
            if score.is_double() {
                self.page
                    .draw_line(line_start, line_end, line_y + DOUBLE_SCORE_GAP, score.is_broken());
            }
        }

        // Wrap when the next character would cross the right margin.
        if self.state.x + advance > self.state.right_margin {
            self.state.x = self.state.left_margin;
            self.state.y += self.state.line_spacing;
            if self.state.y > self.state.bottom_margin {
                self.new_page(true, false);
            }
        }
    }

    fn print_bit_column(&mut self, column: &[u8]) {
        let Some(mode) = self.bit_image else {
            return;
        };
        mode.print_column(&mut self.page, column, self.state.x, self.state.y, self.state.ink);
        self.state.x += mode.column_width();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;

    fn printer_in(dir: &Path) -> Printer {
        let config = PrinterConfig {
            dpi: 60,
            docpath: dir.to_path_buf(),
            font_path: dir.join("no-fonts"),
            ..PrinterConfig::default()
        };
        Printer::new(config).unwrap()
    }

    #[test]
    fn test_power_on() {
        let dir = tempfile::tempdir().unwrap();
        let printer = printer_in(dir.path());
        assert_eq!(printer.page().width(), 510);
        assert_eq!(printer.page().height(), 660);
        assert!(printer.page().is_blank());
        assert!(printer.parser().is_idle());
        assert!(!printer.autofeed());
        assert!(!printer.is_busy());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = PrinterConfig {
            dpi: 0,
            ..PrinterConfig::default()
        };
        assert!(Printer::new(config).is_err());
    }

    #[test]
    fn test_text_advances_and_marks_page() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"AB");
        assert!(!printer.page().is_blank());
        assert!((printer.state().x - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_msb_control() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        // ESC = clears bit 7, so 0x8D arrives as CR
        printer.write_all(b"AAA\x1b=\x8d");
        assert_eq!(printer.state().x, 0.0);

        printer.write_all(b"\x1b#AAA\x8d");
        assert!(printer.state().x > 0.0);
    }

    #[test]
    fn test_ack_once_per_byte() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        assert!(!printer.ack());
        printer.print_char(b'A');
        assert!(printer.ack());
        assert!(!printer.ack());

        printer.print_char(b'A');
        printer.reset_hard();
        assert!(!printer.ack());
    }

    #[test]
    fn test_form_feed_skips_blank_pages() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.form_feed();
        assert!(printer.artifacts().is_empty());

        printer.write_all(b"X");
        printer.form_feed();
        assert_eq!(printer.artifacts().len(), 1);
        assert!(dir.path().join("page1.png").exists());
        assert!(printer.page().is_blank());
    }

    #[test]
    fn test_blank_sheets_are_not_emitted() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"\x0c\x1b\x19R");
        assert!(printer.artifacts().is_empty());

        // 66 lines fill the sheet, the rest feed onto a fresh one
        printer.write_all(&[b'\n'; 70]);
        assert!(printer.artifacts().is_empty());
        assert!(!dir.path().join("page1.png").exists());
        assert!(printer.state().y < 1.0);
    }

    #[test]
    fn test_timeout_ejects_page() {
        let dir = tempfile::tempdir().unwrap();
        let config = PrinterConfig {
            dpi: 60,
            timeout_ms: 200,
            docpath: dir.path().to_path_buf(),
            font_path: dir.path().join("no-fonts"),
            ..PrinterConfig::default()
        };
        let mut printer = Printer::new(config).unwrap();
        printer.write_all(b"Hello");

        let now = Instant::now();
        assert!(!printer.poll(now));
        assert!(printer.poll(now + Duration::from_secs(1)));
        assert_eq!(printer.artifacts().len(), 1);
        assert!(!printer.poll(now + Duration::from_secs(2)));
    }

    #[test]
    fn test_autofeed_carriage_return() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"A\r");
        assert_eq!(printer.state().y, 0.0);

        printer.set_autofeed(true);
        printer.write_all(b"A\r");
        assert!((printer.state().y - 1.0 / 6.0).abs() < 1e-9);
        assert_eq!(printer.state().x, 0.0);
    }
}
