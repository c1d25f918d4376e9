//! Effects of control codes and escape sequences on the printer.

use crate::protocol::charset;
use crate::protocol::commands::{
    self, BEL, BS, CAN, CR, Command, DC1, DC2, DC3, DC4, FF, HT, Introducer, LF, NUL, SI, SO, VT,
};
use crate::render::glyph::Typeface;
use crate::render::raster::Ink;

use super::Printer;
use super::barcode::Barcode;
use super::bitimage::BitImageMode;
use super::state::{PrintQuality, Score, Style, VerticalTabs};

/// Point sizes `ESC X` can select
const MIN_MULTI_POINTS: f64 = 8.0;
const MAX_MULTI_POINTS: f64 = 32.0;

/// `0`/`'0'` turn a feature off, `1`/`'1'` turn it on.
fn switch(n: u8) -> Option<bool> {
    match n {
        0 | b'0' => Some(false),
        1 | b'1' => Some(true),
        _ => None,
    }
}

impl Printer {
    // ========================================================================
    // CONTROL CODES
    // ========================================================================

    pub(super) fn execute_control(&mut self, code: u8) {
        match code {
            NUL | BEL | DC1 | DC3 | CAN => {}
            BS => {
                let step = self.state.fixed_advance();
                let x = self.state.x - step;
                if x >= self.state.left_margin {
                    self.state.x = x;
                }
            }
            HT => {
                if let Some(tab) = self.state.next_horizontal_tab() {
                    self.state.x = tab;
                }
            }
            VT => {
                self.vertical_tab();
                self.state.end_line();
            }
            FF => {
                self.state.end_line();
                self.new_page(true, true);
            }
            CR => {
                self.state.x = self.state.left_margin;
                if self.autofeed {
                    self.state.end_line();
                    self.line_feed();
                }
            }
            LF => {
                self.state.end_line();
                self.line_feed();
            }
            SO => self.double_width_one_line(),
            SI => self.condensed(),
            DC2 => {
                self.state.hmi = None;
                self.state.style.remove(Style::CONDENSED);
                self.state.update_font();
            }
            DC4 => {
                self.state.hmi = None;
                self.state.style.remove(Style::DOUBLEWIDTHONELINE);
                self.state.update_font();
            }
            _ => log::trace!("Ignoring control code {:02X}h", code),
        }
    }

    fn vertical_tab(&mut self) {
        let cancelled = matches!(&self.state.vertical_tabs, VerticalTabs::Set(tabs) if tabs.is_empty());
        if cancelled {
            self.state.x = self.state.left_margin;
            return;
        }
        if self.state.vertical_tabs == VerticalTabs::Unset {
            self.line_feed();
            return;
        }
        match self.state.next_vertical_tab() {
            Some(tab) if tab <= self.state.bottom_margin => self.state.y = tab,
            _ => self.new_page(true, false),
        }
    }

    fn double_width_one_line(&mut self) {
        if !self.state.multipoint {
            self.state.hmi = None;
            self.state.style.insert(Style::DOUBLEWIDTHONELINE);
            self.state.update_font();
        }
    }

    fn condensed(&mut self) {
        if !self.state.multipoint && self.state.cpi != 15.0 {
            self.state.hmi = None;
            self.state.style.insert(Style::CONDENSED);
            self.state.update_font();
        }
    }

    // ========================================================================
    // ESCAPE SEQUENCES
    // ========================================================================

    pub(super) fn execute_command(&mut self, command: Command, params: &[u8]) {
        use Introducer::{Esc, EscParen, Fs};

        let p = |i: usize| params.get(i).copied().unwrap_or(0);
        let p16 = |i: usize| commands::param16(params, i);

        match (command.introducer, command.opcode) {
            (Esc, b'@') => self.reset(),

            // Line spacing
            (Esc, b'0') => self.state.line_spacing = 1.0 / 8.0,
            (Esc, b'1') => self.state.line_spacing = 7.0 / 72.0,
            (Esc, b'2') | (Fs, b'2') => self.state.line_spacing = 1.0 / 6.0,
            (Esc, b'3') => self.state.line_spacing = p(0) as f64 / 180.0,
            (Esc, b'+') | (Fs, b'3') => self.state.line_spacing = p(0) as f64 / 360.0,
            (Esc, b'A') | (Fs, b'A') => self.state.line_spacing = p(0) as f64 / 60.0,
            (Fs, b'F') => self.state.line_spacing = self.state.line_spacing.abs(),

            // Page format
            (Esc, b'C') => self.page_length(p(0), p(1)),
            (Esc, b'N') => {
                let margin = p(0) as f64 * self.state.line_spacing;
                if p(0) > 0 && margin < self.state.page_height {
                    self.state.bottom_margin = self.state.page_height - margin;
                }
            }
            (Esc, b'O') => {
                self.state.top_margin = 0.0;
                self.state.bottom_margin = self.state.page_height;
            }
            (Esc, b'Q') => {
                let right = (p(0) as f64 - 1.0) / self.state.cpi;
                if p(0) > 0 && right > self.state.left_margin {
                    self.state.right_margin = right.min(self.state.page_width);
                }
            }
            (Esc, b'l') => {
                let left = (p(0).max(1) as f64 - 1.0) / self.state.cpi;
                if left < self.state.right_margin {
                    self.state.left_margin = left;
                    if self.state.x < left {
                        self.state.x = left;
                    }
                }
            }
            (EscParen, b'C') => {
                if let (true, Some(unit)) = (p(0) != 0, self.state.defined_unit) {
                    let height = p16(2) as f64 * unit;
                    if height > 0.0 {
                        self.state.page_height = height;
                        self.state.bottom_margin = height;
                        self.state.top_margin = 0.0;
                    }
                }
            }
            (EscParen, b'c') => self.page_format(p16(2), p16(4)),
            (EscParen, b'U') => {
                if p(2) > 0 {
                    self.state.defined_unit = Some(p(2) as f64 / 3600.0);
                }
            }

            // Horizontal position
            (Esc, b'$') => {
                let x = self.state.left_margin + p16(0) as f64 * self.state.absolute_unit();
                if x <= self.state.right_margin {
                    self.state.x = x;
                }
            }
            (Esc, b'\\') => {
                let x = self.state.x + (p16(0) as i16) as f64 * self.state.relative_unit();
                if x >= self.state.left_margin && x <= self.state.right_margin {
                    self.state.x = x;
                }
            }
            (Esc, b'c') => {
                self.state.hmi = Some(p16(0) as f64 / 360.0);
                self.state.extra_spacing = 0.0;
            }
            (Esc, b' ') => {
                if !self.state.multipoint {
                    let unit = match self.state.print_quality {
                        PrintQuality::Draft => 120.0,
                        PrintQuality::LetterQuality => 180.0,
                    };
                    self.state.extra_spacing = p(0) as f64 / unit;
                    self.state.hmi = None;
                    self.state.update_font();
                }
            }
            (Esc, b'f') => self.skip(p(0), p(1)),
            (Esc, b'e') => match p(0) {
                0 => self.state.set_horizontal_tab_increment(p(1)),
                1 => self.state.set_vertical_tab_increment(p(1)),
                m => log::warn!("{}: invalid tab type {}", command, m),
            },

            // Vertical position
            (Esc, b'J') => {
                self.state.y += p(0) as f64 / 180.0;
                if self.state.y > self.state.bottom_margin {
                    self.new_page(true, false);
                }
            }
            (Esc, b'j') => self.reverse_feed(p(0) as f64 / 216.0),
            (Esc, LF) => self.reverse_feed(self.state.line_spacing),
            (Esc, FF) => self.state.y = self.state.top_margin,
            (EscParen, b'V') => {
                let y = self.state.top_margin + p16(2) as f64 * self.state.vertical_unit();
                if y > self.state.bottom_margin {
                    self.new_page(true, false);
                } else {
                    self.state.y = y;
                }
            }
            (EscParen, b'v') => {
                let y = self.state.y + (p16(2) as i16) as f64 * self.state.vertical_unit();
                if y > self.state.top_margin {
                    if y > self.state.bottom_margin {
                        self.new_page(true, false);
                    } else {
                        self.state.y = y;
                    }
                }
            }
            (Esc, 0x19) => {
                if p(0) == b'R' {
                    self.new_page(true, false);
                }
            }

            // Pitch and point
            (Esc, b'P') => self.fixed_pitch(10.0),
            (Esc, b'M') => self.fixed_pitch(12.0),
            (Esc, b'g') => self.fixed_pitch(15.0),
            (Esc, b'!') => self.master_select(p(0)),
            (Esc, b'X') => self.pitch_and_point(p(0), p16(1)),
            (Esc, b'p') => {
                match switch(p(0)) {
                    Some(false) => self.state.style.remove(Style::PROPORTIONAL),
                    Some(true) => {
                        self.state.style.insert(Style::PROPORTIONAL);
                        self.state.print_quality = PrintQuality::LetterQuality;
                    }
                    None => {}
                }
                self.state.multipoint = false;
                self.state.hmi = None;
                self.state.update_font();
            }
            (Esc, b'x') => {
                match switch(p(0)) {
                    Some(false) => self.state.print_quality = PrintQuality::Draft,
                    Some(true) => self.state.print_quality = PrintQuality::LetterQuality,
                    None => {}
                }
                self.state.hmi = None;
                self.state.update_font();
            }
            (Esc, SO) => self.double_width_one_line(),
            (Esc, SI) => self.condensed(),

            // Character style
            (Esc, b'E') => self.set_style(Style::BOLD, true),
            (Esc, b'F') => self.set_style(Style::BOLD, false),
            (Esc, b'G') => self.set_style(Style::DOUBLESTRIKE, true),
            (Esc, b'H') => self.set_style(Style::DOUBLESTRIKE, false),
            (Esc, b'4') | (Fs, b'4') => self.set_style(Style::ITALICS, true),
            (Esc, b'5') | (Fs, b'5') => self.set_style(Style::ITALICS, false),
            (Esc, b'-') => match switch(p(0)) {
                Some(false) => self.set_style(Style::UNDERLINE, false),
                Some(true) => {
                    self.state.score = Score::Single;
                    self.set_style(Style::UNDERLINE, true);
                }
                None => {}
            },
            (EscParen, b'-') => {
                self.state.style.remove(Style::SCORES);
                self.state.score = Score::from_param(p(4));
                if self.state.score != Score::None {
                    match p(3) {
                        1 => self.state.style.insert(Style::UNDERLINE),
                        2 => self.state.style.insert(Style::STRIKETHROUGH),
                        3 => self.state.style.insert(Style::OVERSCORE),
                        _ => {}
                    }
                }
                self.state.update_font();
            }
            (Esc, b'S') => {
                match switch(p(0)) {
                    Some(false) => {
                        self.state.style.remove(Style::SUPERSCRIPT);
                        self.state.style.insert(Style::SUBSCRIPT);
                    }
                    Some(true) => {
                        self.state.style.remove(Style::SUBSCRIPT);
                        self.state.style.insert(Style::SUPERSCRIPT);
                    }
                    None => {}
                }
                self.state.update_font();
            }
            (Esc, b'T') => self.set_style(Style::SUPERSCRIPT | Style::SUBSCRIPT, false),
            (Esc, b'W') => {
                if !self.state.multipoint {
                    self.state.hmi = None;
                    if let Some(on) = switch(p(0)) {
                        self.set_style(Style::DOUBLEWIDTH, on);
                    }
                }
            }
            (Esc, b'w') | (Fs, b'V') => {
                if let (false, Some(on)) = (self.state.multipoint, switch(p(0))) {
                    self.set_style(Style::DOUBLEHEIGHT, on);
                }
            }
            (Esc, b'r') => self.state.ink = Ink::from_selector(p(0)),
            (Esc, b'k') | (Fs, b'C') => {
                match Typeface::from_id(p(0)) {
                    Some(typeface) => self.state.typeface = typeface,
                    None => log::warn!("{}: unknown typeface {}", command, p(0)),
                }
                self.state.update_font();
            }

            // Character tables
            (Esc, b't') | (Fs, b'I') => {
                let slot = match p(0) {
                    n @ 0..=3 => n as usize,
                    n @ 48..=51 => (n - 48) as usize,
                    _ => self.state.active_table,
                };
                self.state.select_table(slot);
                self.state.update_font();
            }
            (EscParen, b't') => {
                if !self.state.assign_table(p(2) as usize, p(3)) {
                    log::warn!("{}: invalid table {} / code page {}", command, p(2), p(3));
                }
                self.state.update_font();
            }
            (Esc, b'R') => {
                if !charset::apply_international(&mut self.state.char_map, p(0)) {
                    log::warn!("{}: unknown international set {}", command, p(0));
                }
            }

            // Data interpretation
            (Esc, b'#') => self.state.msb = None,
            (Esc, b'=') => self.state.msb = Some(false),
            (Esc, b'>') => self.state.msb = Some(true),
            (Esc, b'6') => self.upper_control_codes(true),
            (Esc, b'7') => self.upper_control_codes(false),
            (Esc, b'^') => self.parser.print_literally(1),

            // Bit images
            (Esc, b'K') => self.setup_bit_image(self.state.densities.k, p16(0)),
            (Esc, b'L') => self.setup_bit_image(self.state.densities.l, p16(0)),
            (Esc, b'Y') => self.setup_bit_image(self.state.densities.y, p16(0)),
            (Esc, b'Z') => self.setup_bit_image(self.state.densities.z, p16(0)),
            (Esc, b'*') => self.setup_bit_image(p(0), p16(1)),
            (Fs, b'Z') => self.setup_bit_image(40, p16(0)),
            (Esc, b'?') => match p(0) {
                b'K' => self.state.densities.k = p(1),
                b'L' => self.state.densities.l = p(1),
                b'Y' => self.state.densities.y = p(1),
                b'Z' => self.state.densities.z = p(1),
                other => log::warn!("{}: cannot reassign {:02X}h", command, other),
            },

            // Paper handling, print head and user-defined characters
            (Esc, 0x02 | b'/' | b'8' | b'9' | b'<' | b'U' | b'a' | b'h' | b'i' | b's')
            | (Esc, b'I' | b'[' | b'~' | b'%' | b':')
            | (Fs, b'E' | b'S' | b'R') => log::trace!("Ignoring {} ({})", command, command.name()),

            _ => log::warn!("Unhandled command {}", command),
        }
    }

    /// Length-prefixed `ESC (` commands.
    pub(super) fn execute_payload(&mut self, command: Command, data: &[u8]) {
        if command != Command::paren(b'B') {
            log::warn!("Unhandled command {} with {} bytes", command, data.len());
            return;
        }

        let printed = Barcode::parse(data).and_then(|barcode| {
            barcode.print(&mut self.page, self.state.x, self.state.y, self.state.ink)
        });
        match printed {
            Ok(width) => self.state.x += width,
            Err(e) => log::warn!("{}", e),
        }
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn set_style(&mut self, flags: Style, on: bool) {
        self.state.style.set(flags, on);
        self.state.update_font();
    }

    fn fixed_pitch(&mut self, cpi: f64) {
        self.state.cpi = cpi;
        self.state.hmi = None;
        self.state.multipoint = false;
        self.state.update_font();
    }

    /// `ESC !`: pitch and the first seven style flags in one byte.
    fn master_select(&mut self, n: u8) {
        const BITS: [(u8, Style); 6] = [
            (0x02, Style::PROPORTIONAL),
            (0x04, Style::CONDENSED),
            (0x08, Style::BOLD),
            (0x10, Style::DOUBLESTRIKE),
            (0x20, Style::DOUBLEWIDTH),
            (0x40, Style::ITALICS),
        ];

        self.state.cpi = if n & 0x01 != 0 { 12.0 } else { 10.0 };
        self.state.style.remove(Style::MASTER_SELECT);
        for (bit, flag) in BITS {
            if n & bit != 0 {
                self.state.style.insert(flag);
            }
        }
        if n & 0x80 != 0 {
            self.state.score = Score::Single;
            self.state.style.insert(Style::UNDERLINE);
        }

        self.state.hmi = None;
        self.state.multipoint = false;
        self.state.update_font();
    }

    /// `ESC X m nL nH`: pitch `360/m` cpi (or proportional for `m = 1`),
    /// point size `n/2`.
    fn pitch_and_point(&mut self, m: u8, half_points: u16) {
        let state = &mut self.state;
        state.multipoint = true;
        if state.multi_cpi == 0.0 {
            state.multi_cpi = state.cpi;
        }
        if m == 1 {
            state.style.insert(Style::PROPORTIONAL);
        } else if m >= 5 {
            state.multi_cpi = 360.0 / m as f64;
        }
        if state.multi_point_size == 0.0 {
            state.multi_point_size = 10.5;
        }
        if half_points > 0 {
            state.multi_point_size =
                (half_points as f64 / 2.0).clamp(MIN_MULTI_POINTS, MAX_MULTI_POINTS);
        }
        state.update_font();
    }

    /// `ESC C n` (lines) or `ESC C 0 n` (inches).
    fn page_length(&mut self, lines: u8, inches: u8) {
        let height = if lines != 0 {
            lines as f64 * self.state.line_spacing
        } else {
            self.state.top_margin = 0.0;
            inches as f64
        };
        if height > 0.0 {
            self.state.page_height = height;
            self.state.bottom_margin = height;
        }
    }

    /// `ESC ( c`: top and bottom margin in defined units.
    fn page_format(&mut self, top: u16, bottom: u16) {
        let Some(unit) = self.state.defined_unit else {
            log::warn!("Page format needs a unit (ESC ( U)");
            return;
        };
        let top = top as f64 * unit;
        let bottom = bottom as f64 * unit;
        if top >= bottom {
            return;
        }

        let state = &mut self.state;
        if top < state.page_height {
            state.top_margin = top;
        }
        if bottom < state.page_height {
            state.bottom_margin = bottom;
        }
        if state.y < state.top_margin {
            state.y = state.top_margin;
        }
    }

    /// Move the paper back by `distance` inches, not above the top margin.
    fn reverse_feed(&mut self, distance: f64) {
        self.state.y = (self.state.y - distance).max(self.state.top_margin);
    }

    /// `ESC f m n`: skip `n` columns (`m = 0`) or lines (`m = 1`).
    fn skip(&mut self, m: u8, n: u8) {
        match m {
            0 => {
                let x = self.state.x + n as f64 * self.state.fixed_advance();
                if x <= self.state.right_margin {
                    self.state.x = x;
                }
            }
            1 => {
                self.state.x = self.state.left_margin;
                self.state.y += n as f64 * self.state.line_spacing;
                if self.state.y > self.state.bottom_margin {
                    self.new_page(true, false);
                }
            }
            _ => log::warn!("ESC f: invalid direction {}", m),
        }
    }

    /// `ESC 6` prints `0x80..=0x9F`, `ESC 7` treats them as control codes.
    fn upper_control_codes(&mut self, printable: bool) {
        self.state.print_upper_control = printable;
        self.parser.set_upper_control_codes(!printable);
    }

    fn setup_bit_image(&mut self, density: u8, columns: u16) {
        match BitImageMode::from_density(density) {
            Some(mode) => {
                self.bit_image = Some(mode);
                self.parser.begin_bit_image(columns, mode.bytes_per_column);
            }
            None => {
                log::warn!("Unsupported bit image density {}", density);
                self.bit_image = None;
                self.parser.begin_bit_image(columns, 1);
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Artifact;
    use crate::printer::PrinterConfig;
    use std::path::Path;

    fn printer_in(dir: &Path) -> Printer {
        let config = PrinterConfig {
            dpi: 60,
            docpath: dir.to_path_buf(),
            font_path: dir.join("no-fonts"),
            ..PrinterConfig::default()
        };
        Printer::new(config).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_line_spacing_commands() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        let cases: [(&[u8], f64); 8] = [
            (b"\x1b0", 1.0 / 8.0),
            (b"\x1b1", 7.0 / 72.0),
            (b"\x1b2", 1.0 / 6.0),
            (b"\x1b3\x5a", 0.5),
            (b"\x1b+\x5a", 0.25),
            (b"\x1bA\x0c", 0.2),
            (b"\x1c3\xb4", 0.5),
            (b"\x1cA\x1e", 0.5),
        ];
        for (bytes, expected) in cases {
            printer.write_all(bytes);
            assert!(close(printer.state().line_spacing, expected), "{:?}", bytes);
        }
    }

    #[test]
    fn test_master_select() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"\x1b!\xb9");
        let state = printer.state();
        assert_eq!(state.cpi, 12.0);
        assert_eq!(
            state.style,
            Style::BOLD | Style::DOUBLESTRIKE | Style::DOUBLEWIDTH | Style::UNDERLINE
        );
        assert_eq!(state.score, Score::Single);
        assert_eq!(state.font.cpi, 6.0);

        printer.write_all(b"\x1bS\x01\x1b!\x00");
        assert_eq!(printer.state().style, Style::SUPERSCRIPT);
        assert_eq!(printer.state().cpi, 10.0);
    }

    #[test]
    fn test_pitch_and_point() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        // 360/24 = 15 cpi, 24/2 = 12 pt
        printer.write_all(b"\x1bX\x18\x18\x00");
        let state = printer.state();
        assert!(state.multipoint);
        assert_eq!(state.font.cpi, 15.0);
        assert_eq!(state.font.vertical_points, 12.0);

        // Double width is refused in multipoint mode
        printer.write_all(b"\x1bW\x01");
        assert!(!printer.state().style.contains(Style::DOUBLEWIDTH));

        printer.write_all(b"\x1bP");
        assert!(!printer.state().multipoint);
        assert_eq!(printer.state().font.cpi, 10.0);
    }

    #[test]
    fn test_point_size_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"\x1bX\x00\xff\xffA");
        assert_eq!(printer.state().font.vertical_points, 32.0);
        assert!(!printer.page().is_blank());

        printer.write_all(b"\x1bX\x00\x02\x00");
        assert_eq!(printer.state().font.vertical_points, 8.0);
    }

    #[test]
    fn test_margins_and_wrap() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        // left margin column 11 (1.0"), right margin column 21 (2.0")
        printer.write_all(b"\x1bl\x0b\x1bQ\x15");
        assert!(close(printer.state().left_margin, 1.0));
        assert!(close(printer.state().right_margin, 2.0));
        assert!(close(printer.state().x, 1.0));

        // HMI 90/360 inch
        printer.write_all(b"\x1bc\x5a\x00AAA");
        assert_eq!(printer.state().x, 1.75);
        assert_eq!(printer.state().y, 0.0);
        printer.write_all(b"A");
        assert_eq!(printer.state().x, 1.0);
        assert!(close(printer.state().y, 1.0 / 6.0));
    }

    #[test]
    fn test_absolute_and_relative_position() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"\x1b$\x3c\x00");
        assert!(close(printer.state().x, 1.0));

        // -90/180 inch
        printer.write_all(b"\x1b\\\xa6\xff");
        assert!(close(printer.state().x, 0.5));

        // Past the left margin: ignored
        printer.write_all(b"\x1b\\\x00\xf0");
        assert!(close(printer.state().x, 0.5));

        // Defined unit 1/360
        printer.write_all(b"\x1b(U\x01\x00\x0a\x1b$\xb4\x00");
        assert!(close(printer.state().x, 0.5));
    }

    #[test]
    fn test_vertical_moves() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"\x1bJ\xb4");
        assert!(close(printer.state().y, 1.0));
        printer.write_all(b"\x1bj\x6c");
        assert!(close(printer.state().y, 0.5));
        printer.write_all(b"\x1bj\xff");
        assert_eq!(printer.state().y, 0.0);

        // ESC ( V at 1/360: 720 units = 2"
        printer.write_all(b"\x1b(V\x02\x00\xd0\x02");
        assert!(close(printer.state().y, 2.0));
        // ESC ( v -360 units
        printer.write_all(b"\x1b(v\x02\x00\x98\xfe");
        assert!(close(printer.state().y, 1.0));

        printer.write_all(b"\x1b\x0a");
        assert!(close(printer.state().y, 1.0 - 1.0 / 6.0));
        printer.write_all(b"\x1b\x0c");
        assert_eq!(printer.state().y, 0.0);
    }

    #[test]
    fn test_feed_past_bottom_emits_page() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"X\x1b(V\x02\x00\xff\xff");
        assert_eq!(
            printer.artifacts(),
            &[Artifact::File(dir.path().join("page1.png"))]
        );
        assert!(printer.page().is_blank());
        assert_eq!(printer.state().y, 0.0);
    }

    #[test]
    fn test_page_length_and_margins() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"\x1bC\x0c");
        assert!(close(printer.state().page_height, 2.0));
        assert!(close(printer.state().bottom_margin, 2.0));

        printer.write_all(b"\x1bC\x00\x05");
        assert_eq!(printer.state().page_height, 5.0);

        // Bottom margin 6 lines = 1"
        printer.write_all(b"\x1bN\x06");
        assert!(close(printer.state().bottom_margin, 4.0));
        printer.write_all(b"\x1bO");
        assert_eq!(printer.state().bottom_margin, 5.0);

        // Page format in 1/360: top 180 (0.5"), bottom 1080 (3")
        printer.write_all(b"\x1b(U\x01\x00\x0a\x1b(c\x04\x00\xb4\x00\x38\x04");
        assert!(close(printer.state().top_margin, 0.5));
        assert!(close(printer.state().bottom_margin, 3.0));
        assert!(close(printer.state().y, 0.5));

        printer.write_all(b"\x1b(C\x02\x00\x10\x0e");
        assert!(close(printer.state().page_height, 10.0));
        assert_eq!(printer.state().top_margin, 0.0);
    }

    #[test]
    fn test_tabs() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"A\t");
        assert!(close(printer.state().x, 0.8));

        printer.write_all(b"\x1bD\x05\x0a\x00\r\t");
        assert!(close(printer.state().x, 0.5));
        printer.write_all(b"\t");
        assert!(close(printer.state().x, 1.0));
        printer.write_all(b"\t");
        assert!(close(printer.state().x, 1.0));

        // Vertical tabs unset: VT acts as LF
        printer.write_all(b"\x0b");
        assert!(close(printer.state().y, 1.0 / 6.0));
        assert_eq!(printer.state().x, 0.0);

        printer.write_all(b"\x1bB\x06\x0c\x00\x0b");
        assert!(close(printer.state().y, 1.0));

        // All cancelled: VT acts as CR
        printer.write_all(b"\x1bB\x00A\x0b");
        assert!(close(printer.state().y, 1.0));
        assert_eq!(printer.state().x, 0.0);
    }

    #[test]
    fn test_tab_increments_and_skip() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"\x1be\x00\x05\t");
        assert!(close(printer.state().x, 0.5));
        printer.write_all(b"\x1bf\x00\x03");
        assert!(close(printer.state().x, 0.8));
        printer.write_all(b"\x1bf\x01\x03");
        assert_eq!(printer.state().x, 0.0);
        assert!(close(printer.state().y, 0.5));
    }

    #[test]
    fn test_backspace_stops_at_margin() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"AA\x08");
        assert!(close(printer.state().x, 0.1));
        printer.write_all(b"\x08\x08");
        assert!(close(printer.state().x, 0.0));
    }

    #[test]
    fn test_one_line_double_width() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"\x0eA");
        assert!(close(printer.state().x, 0.2));
        printer.write_all(b"\r\nA");
        assert!(close(printer.state().x, 0.1));

        printer.write_all(b"\x0f");
        assert!(close(printer.state().font.cpi, 17.14));
        printer.write_all(b"\x12");
        assert_eq!(printer.state().font.cpi, 10.0);
    }

    #[test]
    fn test_super_and_subscript_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"\x1bS0");
        assert_eq!(printer.state().style, Style::SUBSCRIPT);
        printer.write_all(b"\x1bS1");
        assert_eq!(printer.state().style, Style::SUPERSCRIPT);
        printer.write_all(b"\x1bT");
        assert_eq!(printer.state().style, Style::empty());
    }

    #[test]
    fn test_score_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"\x1b(-\x03\x00\x01\x02\x06");
        assert_eq!(printer.state().style, Style::STRIKETHROUGH);
        assert_eq!(printer.state().score, Score::DoubleBroken);

        printer.write_all(b"\x1b(-\x03\x00\x01\x01\x00");
        assert_eq!(printer.state().style, Style::empty());
        assert_eq!(printer.state().score, Score::None);
    }

    #[test]
    fn test_underline_draws_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b" ");
        assert!(printer.page().is_blank());
        printer.write_all(b"\x1b-\x01 ");
        assert!(!printer.page().is_blank());
    }

    #[test]
    fn test_typeface_and_colour() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"\x1bk\x02\x1br\x04");
        assert_eq!(printer.state().font.typeface, Typeface::Courier);
        assert_eq!(printer.state().ink, Ink::Yellow);

        printer.write_all(b"\x1bk\x0c");
        assert_eq!(printer.state().typeface, Typeface::Courier);
    }

    #[test]
    fn test_character_tables() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        // Slot 2 := code page 866, then select it
        printer.write_all(b"\x1b(t\x03\x00\x02\x0e\x00\x1bt2");
        assert_eq!(printer.state().active_table, 2);
        assert_eq!(printer.state().translate(0x80), 'А');

        // Slot 0 is the italic table
        printer.write_all(b"\x1bt\x00");
        assert!(printer.state().font.italic);

        printer.write_all(b"\x1bt\x01\x1bR\x02");
        assert_eq!(printer.state().translate(0x40), '§');
        printer.write_all(b"\x1bR\x63");
        assert_eq!(printer.state().translate(0x40), '§');
    }

    #[test]
    fn test_upper_control_codes() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"AAA\x1b7\x8d");
        assert_eq!(printer.state().x, 0.0);
        assert!(!printer.state().print_upper_control);

        printer.write_all(b"\x1b6\x8d");
        assert!(close(printer.state().x, 0.1));
    }

    #[test]
    fn test_print_next_literally() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"\x1b^\x0d");
        assert!(close(printer.state().x, 0.1));

        printer.write_all(b"\x1b(^\x02\x00\x0d\x0a");
        assert!(close(printer.state().x, 0.3));
        assert_eq!(printer.state().y, 0.0);
    }

    #[test]
    fn test_bit_image_columns() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        // ESC K: density 0 (60 dpi), 2 columns
        printer.write_all(b"\x1bK\x02\x00\x80\x01");
        assert!(close(printer.state().x, 2.0 / 60.0));
        assert_eq!(printer.page().get(0, 0), Some(0xFF));
        assert_eq!(printer.page().get(1, 7), Some(0xFF));
        assert_eq!(printer.page().get(1, 0), Some(0));
        assert!(printer.parser().is_idle());
    }

    #[test]
    fn test_unknown_density_consumes_payload() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"\x1b*\x05\x03\x00\x0d\x0a\x0c");
        assert!(printer.page().is_blank());
        assert!(printer.parser().is_idle());
        assert_eq!(printer.state().y, 0.0);
    }

    #[test]
    fn test_reassign_density() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"\x1b?K\x27");
        assert_eq!(printer.state().densities.k, 39);
        // 39 takes three bytes per column at 180 dpi
        printer.write_all(b"\x1bK\x01\x00\xff\xff\xff");
        assert!(close(printer.state().x, 1.0 / 180.0));
        assert!(printer.parser().is_idle());
    }

    #[test]
    fn test_barcode_advances() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        let mut seq = b"\x1b(B".to_vec();
        let data = b"590123412345";
        let len = (6 + data.len()) as u16;
        seq.extend_from_slice(&len.to_le_bytes());
        seq.extend_from_slice(&[0, 2, 0, 90, 0, 0]);
        seq.extend_from_slice(data);
        printer.write_all(&seq);

        assert!(printer.state().x > 0.9);
        assert!(!printer.page().is_blank());
    }

    #[test]
    fn test_eject_command_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let mut printer = printer_in(dir.path());
        printer.write_all(b"X\x1b\x19R");
        assert_eq!(printer.artifacts().len(), 1);

        printer.write_all(b"\x1bE\x1bl\x05X\x1b@");
        assert_eq!(printer.state().style, Style::empty());
        assert_eq!(printer.state().left_margin, 0.0);
        assert!(printer.page().is_blank());
        assert_eq!(printer.artifacts().len(), 1);
    }
}
