//! # Printer State
//!
//! Typographic and layout registers of the virtual printer: cursor,
//! margins, pitch, style flags, tab stops, character tables and bit image
//! densities. All positions are in inches from the top-left paper corner.
//!
//! ## Font Size Calculation
//!
//! ```text
//! start at 10.5 pt × 10.5 pt
//!   not condensed         → both × 10/cpi
//!   fixed pitch condensed → 10 cpi: 17.14 cpi, h × 10/17.14
//!                           12 cpi: 20 cpi,    h × 1/2, v × 10/12
//!   proportional condensed→ h / 2
//!   double width          → cpi / 2, h × 2
//!   double height         → v × 2
//!   multipoint (ESC X)    → replaces all of the above
//!   super/subscript       → h, v × 2/3, cpi × 3/2
//! ```

use arrayvec::ArrayVec;
use bitflags::bitflags;

use crate::protocol::charset::{self, CharMap};
use crate::protocol::parser::{MAX_HORIZONTAL_TABS, MAX_VERTICAL_TABS};
use crate::render::glyph::{FontSpec, Typeface};
use crate::render::raster::Ink;

bitflags! {
    /// Character style flags.
    ///
    /// The first seven are the ones `ESC !` sets and clears together.
    #[derive(Default)]
    pub struct Style: u16 {
        const PROPORTIONAL = 1 << 0;
        const CONDENSED = 1 << 1;
        const BOLD = 1 << 2;
        const DOUBLESTRIKE = 1 << 3;
        const DOUBLEWIDTH = 1 << 4;
        const ITALICS = 1 << 5;
        const UNDERLINE = 1 << 6;
        const DOUBLEWIDTHONELINE = 1 << 7;
        const DOUBLEHEIGHT = 1 << 8;
        const SUPERSCRIPT = 1 << 9;
        const SUBSCRIPT = 1 << 10;
        const STRIKETHROUGH = 1 << 11;
        const OVERSCORE = 1 << 12;

        const MASTER_SELECT = Self::PROPORTIONAL.bits
            | Self::CONDENSED.bits
            | Self::BOLD.bits
            | Self::DOUBLESTRIKE.bits
            | Self::DOUBLEWIDTH.bits
            | Self::ITALICS.bits
            | Self::UNDERLINE.bits;
        const SCORES = Self::UNDERLINE.bits | Self::STRIKETHROUGH.bits | Self::OVERSCORE.bits;
    }
}

/// Line style for underline, strike-through and overscore (`ESC ( -`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Score {
    #[default]
    None,
    Single,
    Double,
    SingleBroken,
    DoubleBroken,
}

impl Score {
    /// Map the `ESC ( -` line style byte (1, 2, 5, 6).
    pub fn from_param(d: u8) -> Self {
        match d {
            1 => Self::Single,
            2 => Self::Double,
            5 => Self::SingleBroken,
            6 => Self::DoubleBroken,
            _ => Self::None,
        }
    }

    pub fn is_double(self) -> bool {
        matches!(self, Self::Double | Self::DoubleBroken)
    }

    pub fn is_broken(self) -> bool {
        matches!(self, Self::SingleBroken | Self::DoubleBroken)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintQuality {
    Draft,
    #[default]
    LetterQuality,
}

/// Vertical tab stops.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum VerticalTabs {
    /// None set since reset: VT acts as LF
    #[default]
    Unset,
    /// Positions in inches; empty means all cancelled and VT acts as CR
    Set(ArrayVec<f64, MAX_VERTICAL_TABS>),
}

/// Bit image densities behind `ESC K/L/Y/Z`, reassignable with `ESC ?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Densities {
    pub k: u8,
    pub l: u8,
    pub y: u8,
    pub z: u8,
}

impl Default for Densities {
    fn default() -> Self {
        Self {
            k: 0,
            l: 1,
            y: 2,
            z: 3,
        }
    }
}

/// # Printer State Register
#[derive(Debug, Clone, PartialEq)]
pub struct PrinterState {
    /// Paper size set by the configuration, restored on reset
    pub default_page_width: f64,
    pub default_page_height: f64,

    pub page_width: f64,
    pub page_height: f64,

    pub x: f64,
    pub y: f64,

    pub top_margin: f64,
    pub bottom_margin: f64,
    pub left_margin: f64,
    pub right_margin: f64,

    pub line_spacing: f64,
    pub cpi: f64,
    pub style: Style,
    pub score: Score,
    pub ink: Ink,
    pub print_quality: PrintQuality,
    pub typeface: Typeface,

    /// Extra space after every character (`ESC SP`)
    pub extra_spacing: f64,
    /// Horizontal motion index (`ESC c`), overrides 1/cpi
    pub hmi: Option<f64>,
    /// Unit for `ESC ( V/v/C/c`, `ESC $`, `ESC \` (`ESC ( U`)
    pub defined_unit: Option<f64>,

    /// `ESC X` pitch and point mode
    pub multipoint: bool,
    pub multi_cpi: f64,
    pub multi_point_size: f64,

    /// Forced MSB (`ESC =` / `ESC >`), `None` when cancelled
    pub msb: Option<bool>,
    /// Print 0x80-0x9F as characters (`ESC 6`) instead of control codes
    pub print_upper_control: bool,

    pub densities: Densities,

    /// Code page per table slot (`ESC ( t`)
    pub char_tables: [u16; 4],
    /// Active slot (`ESC t`)
    pub active_table: usize,
    pub char_map: CharMap,

    pub horizontal_tabs: ArrayVec<f64, MAX_HORIZONTAL_TABS>,
    pub vertical_tabs: VerticalTabs,

    /// Derived by [`PrinterState::update_font`]
    pub font: FontSpec,
}

impl PrinterState {
    /// Power-on state for paper of `width` × `height` inches.
    pub fn new(width: f64, height: f64) -> Self {
        let mut state = Self {
            default_page_width: width,
            default_page_height: height,
            page_width: width,
            page_height: height,
            x: 0.0,
            y: 0.0,
            top_margin: 0.0,
            bottom_margin: height,
            left_margin: 0.0,
            right_margin: width,
            line_spacing: 1.0 / 6.0,
            cpi: 10.0,
            style: Style::empty(),
            score: Score::None,
            ink: Ink::Black,
            print_quality: PrintQuality::LetterQuality,
            typeface: Typeface::Roman,
            extra_spacing: 0.0,
            hmi: None,
            defined_unit: None,
            multipoint: false,
            multi_cpi: 0.0,
            multi_point_size: 0.0,
            msb: None,
            print_upper_control: true,
            densities: Densities::default(),
            char_tables: [0, 437, 437, 437],
            active_table: 1,
            char_map: charset::char_map(437),
            horizontal_tabs: ArrayVec::new(),
            vertical_tabs: VerticalTabs::Unset,
            font: FontSpec::default(),
        };
        state.set_default_tabs();
        state.update_font();
        state
    }

    /// Restore the power-on state, keeping the configured paper size.
    pub fn reset(&mut self) {
        *self = Self::new(self.default_page_width, self.default_page_height);
    }

    /// Horizontal tabs every 8 columns at the current pitch.
    fn set_default_tabs(&mut self) {
        self.horizontal_tabs = (0..MAX_HORIZONTAL_TABS)
            .map(|i| (i * 8) as f64 / self.cpi)
            .collect();
    }

    /// Recompute [`PrinterState::font`] from pitch and style.
    pub fn update_font(&mut self) {
        let mut h = 10.5;
        let mut v = 10.5;
        let mut cpi = self.cpi;
        let style = self.style;

        if !self.multipoint {
            if !style.contains(Style::CONDENSED) {
                h *= 10.0 / self.cpi;
                v *= 10.0 / self.cpi;
            }

            if !style.contains(Style::PROPORTIONAL) {
                if style.contains(Style::CONDENSED) && self.cpi == 10.0 {
                    cpi = 17.14;
                    h *= 10.0 / 17.14;
                }
                if style.contains(Style::CONDENSED) && self.cpi == 12.0 {
                    cpi = 20.0;
                    h *= 10.0 / 20.0;
                    v *= 10.0 / 12.0;
                }
            } else if style.contains(Style::CONDENSED) {
                h /= 2.0;
            }

            if style.intersects(Style::DOUBLEWIDTH | Style::DOUBLEWIDTHONELINE) {
                cpi /= 2.0;
                h *= 2.0;
            }

            if style.contains(Style::DOUBLEHEIGHT) {
                v *= 2.0;
            }
        } else {
            cpi = self.multi_cpi;
            h = self.multi_point_size;
            v = self.multi_point_size;
        }

        if style.intersects(Style::SUPERSCRIPT | Style::SUBSCRIPT) {
            h *= 2.0 / 3.0;
            v *= 2.0 / 3.0;
            cpi /= 2.0 / 3.0;
        }

        self.font = FontSpec {
            typeface: self.typeface,
            horizontal_points: h,
            vertical_points: v,
            cpi,
            italic: style.contains(Style::ITALICS) || self.char_tables[self.active_table] == 0,
        };
    }

    /// Width of one character cell at fixed pitch: the HMI if set,
    /// otherwise 1/cpi.
    pub fn fixed_advance(&self) -> f64 {
        self.hmi.unwrap_or(1.0 / self.font.cpi)
    }

    /// Unit for `ESC $`, 1/60 inch unless redefined.
    pub fn absolute_unit(&self) -> f64 {
        self.defined_unit.unwrap_or(1.0 / 60.0)
    }

    /// Unit for `ESC \`, 1/120 (draft) or 1/180 (LQ) inch unless redefined.
    pub fn relative_unit(&self) -> f64 {
        self.defined_unit.unwrap_or(match self.print_quality {
            PrintQuality::Draft => 1.0 / 120.0,
            PrintQuality::LetterQuality => 1.0 / 180.0,
        })
    }

    /// Unit for `ESC ( V/v`, 1/360 inch unless redefined.
    pub fn vertical_unit(&self) -> f64 {
        self.defined_unit.unwrap_or(1.0 / 360.0)
    }

    // ------------------------------------------------------------------------
    // Character tables
    // ------------------------------------------------------------------------

    /// Make table slot `slot` active and rebuild the character map.
    pub fn select_table(&mut self, slot: usize) {
        if slot < self.char_tables.len() {
            self.active_table = slot;
            self.char_map = charset::char_map(self.char_tables[slot]);
        }
    }

    /// Assign the code page behind Epson selector `selector` to `slot`.
    /// Returns `false` when either is out of range.
    pub fn assign_table(&mut self, slot: usize, selector: u8) -> bool {
        let Some(codepage) = charset::epson_codepage(selector) else {
            return false;
        };
        let Some(entry) = self.char_tables.get_mut(slot) else {
            return false;
        };
        *entry = codepage;
        if slot == self.active_table {
            self.char_map = charset::char_map(codepage);
        }
        true
    }

    /// Translate a printer byte through the active table.
    #[inline]
    pub fn translate(&self, byte: u8) -> char {
        self.char_map[byte as usize]
    }

    // ------------------------------------------------------------------------
    // Tabs
    // ------------------------------------------------------------------------

    /// Replace the horizontal tabs with column numbers at the current pitch.
    pub fn set_horizontal_tabs(&mut self, columns: &[u8]) {
        let cpi = self.cpi;
        self.horizontal_tabs = columns
            .iter()
            .take(MAX_HORIZONTAL_TABS)
            .map(|&c| c as f64 / cpi)
            .collect();
    }

    /// Replace the vertical tabs with line numbers at the current spacing.
    pub fn set_vertical_tabs(&mut self, lines: &[u8]) {
        let spacing = self.line_spacing;
        self.vertical_tabs = VerticalTabs::Set(
            lines
                .iter()
                .take(MAX_VERTICAL_TABS)
                .map(|&l| l as f64 * spacing)
                .collect(),
        );
    }

    /// First horizontal tab right of the cursor and left of the right
    /// margin.
    pub fn next_horizontal_tab(&self) -> Option<f64> {
        self.horizontal_tabs
            .iter()
            .copied()
            .find(|&t| t > self.x && t < self.right_margin)
    }

    /// First vertical tab below the cursor, `None` when there is none.
    pub fn next_vertical_tab(&self) -> Option<f64> {
        match &self.vertical_tabs {
            VerticalTabs::Set(tabs) => tabs.iter().copied().find(|&t| t > self.y),
            VerticalTabs::Unset => None,
        }
    }

    /// Tab stops every `n` columns (`ESC e 0 n`).
    pub fn set_horizontal_tab_increment(&mut self, n: u8) {
        if n == 0 {
            self.horizontal_tabs.clear();
            return;
        }
        let step = n as f64 / self.cpi;
        self.horizontal_tabs = (1..=MAX_HORIZONTAL_TABS)
            .map(|i| i as f64 * step)
            .take_while(|&t| t < self.page_width)
            .collect();
    }

    /// Tab stops every `n` lines (`ESC e 1 n`).
    pub fn set_vertical_tab_increment(&mut self, n: u8) {
        let step = n as f64 * self.line_spacing;
        self.vertical_tabs = VerticalTabs::Set(if n == 0 {
            ArrayVec::new()
        } else {
            (1..=MAX_VERTICAL_TABS)
                .map(|i| i as f64 * step)
                .take_while(|&t| t < self.page_height)
                .collect()
        });
    }

    // ------------------------------------------------------------------------
    // Style helpers
    // ------------------------------------------------------------------------

    /// Cancel one-line double width (line end).
    pub fn end_line(&mut self) {
        if self.style.contains(Style::DOUBLEWIDTHONELINE) {
            self.style.remove(Style::DOUBLEWIDTHONELINE);
            self.update_font();
        }
    }

    /// Pixel column of the cursor at `dpi`
    #[inline]
    pub fn pixel_x(&self, dpi: u16) -> i64 {
        (self.x * dpi as f64 + 0.5).floor() as i64
    }

    /// Pixel row of the cursor at `dpi`
    #[inline]
    pub fn pixel_y(&self, dpi: u16) -> i64 {
        (self.y * dpi as f64 + 0.5).floor() as i64
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn letter() -> PrinterState {
        PrinterState::new(8.5, 11.0)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_power_on_defaults() {
        let state = letter();
        assert_eq!(state.cpi, 10.0);
        assert_eq!(state.style, Style::empty());
        assert_eq!(state.right_margin, 8.5);
        assert_eq!(state.bottom_margin, 11.0);
        assert!(close(state.line_spacing, 1.0 / 6.0));
        assert_eq!(state.char_tables, [0, 437, 437, 437]);
        assert_eq!(state.active_table, 1);
        assert_eq!(state.vertical_tabs, VerticalTabs::Unset);
        assert_eq!(state.horizontal_tabs.len(), 32);
        assert!(close(state.horizontal_tabs[1], 0.8));
        assert_eq!(state.font.horizontal_points, 10.5);
        assert!(!state.font.italic);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut state = letter();
        state.style = Style::BOLD | Style::CONDENSED;
        state.cpi = 12.0;
        state.left_margin = 1.0;
        state.assign_table(1, 14);
        state.set_vertical_tabs(&[2, 4]);
        state.update_font();
        assert_ne!(state, letter());

        state.reset();
        assert_eq!(state, letter());
    }

    #[test]
    fn test_condensed_pitch() {
        let mut state = letter();
        state.style = Style::CONDENSED;
        state.update_font();
        assert!(close(state.font.cpi, 17.14));
        assert!(close(state.font.horizontal_points, 10.5 * 10.0 / 17.14));
        assert_eq!(state.font.vertical_points, 10.5);

        state.cpi = 12.0;
        state.update_font();
        assert_eq!(state.font.cpi, 20.0);
        assert!(close(state.font.horizontal_points, 5.25));
        assert!(close(state.font.vertical_points, 8.75));
    }

    #[test]
    fn test_double_width_and_height() {
        let mut state = letter();
        state.style = Style::DOUBLEWIDTH | Style::DOUBLEHEIGHT;
        state.update_font();
        assert_eq!(state.font.cpi, 5.0);
        assert_eq!(state.font.horizontal_points, 21.0);
        assert_eq!(state.font.vertical_points, 21.0);
    }

    #[test]
    fn test_superscript_scales() {
        let mut state = letter();
        state.style = Style::SUPERSCRIPT;
        state.update_font();
        assert!(close(state.font.cpi, 15.0));
        assert!(close(state.font.vertical_points, 7.0));
    }

    #[test]
    fn test_multipoint_overrides_style() {
        let mut state = letter();
        state.multipoint = true;
        state.multi_cpi = 360.0 / 24.0;
        state.multi_point_size = 12.0;
        state.style = Style::DOUBLEWIDTH;
        state.update_font();
        assert_eq!(state.font.cpi, 15.0);
        assert_eq!(state.font.horizontal_points, 12.0);
    }

    #[test]
    fn test_italic_table_selects_italic() {
        let mut state = letter();
        state.select_table(0);
        state.update_font();
        assert!(state.font.italic);
    }

    #[test]
    fn test_assign_table_bounds() {
        let mut state = letter();
        assert!(state.assign_table(1, 14));
        assert_eq!(state.translate(0x80), 'А');
        assert!(state.assign_table(2, 3));
        assert_eq!(state.translate(0x9B), 'Ы');
        state.select_table(2);
        assert_eq!(state.translate(0x9B), 'ø');
        assert!(!state.assign_table(4, 1));
        assert!(!state.assign_table(1, 16));
    }

    #[test]
    fn test_tab_lookup() {
        let mut state = letter();
        state.x = 0.85;
        assert!(close(state.next_horizontal_tab().unwrap_or(0.0), 1.6));

        state.set_horizontal_tabs(&[5, 20]);
        state.x = 0.0;
        assert_eq!(state.next_horizontal_tab(), Some(0.5));
        state.right_margin = 1.5;
        state.x = 0.6;
        assert_eq!(state.next_horizontal_tab(), None);

        assert_eq!(state.next_vertical_tab(), None);
        state.set_vertical_tabs(&[6, 12]);
        state.y = 1.2;
        assert!(close(state.next_vertical_tab().unwrap_or(0.0), 2.0));
    }

    #[test]
    fn test_tab_increments() {
        let mut state = letter();
        state.set_horizontal_tab_increment(10);
        assert_eq!(state.horizontal_tabs.first(), Some(&1.0));
        assert_eq!(state.horizontal_tabs.len(), 8);

        state.set_vertical_tab_increment(0);
        assert_eq!(state.vertical_tabs, VerticalTabs::Set(ArrayVec::new()));
    }

    #[test]
    fn test_units() {
        let mut state = letter();
        assert_eq!(state.absolute_unit(), 1.0 / 60.0);
        assert_eq!(state.relative_unit(), 1.0 / 180.0);
        state.print_quality = PrintQuality::Draft;
        assert_eq!(state.relative_unit(), 1.0 / 120.0);
        state.defined_unit = Some(1.0 / 720.0);
        assert_eq!(state.vertical_unit(), 1.0 / 720.0);
    }

    #[test]
    fn test_end_line_clears_one_line_double_width() {
        let mut state = letter();
        state.style.insert(Style::DOUBLEWIDTHONELINE);
        state.update_font();
        assert_eq!(state.font.cpi, 5.0);
        state.end_line();
        assert_eq!(state.font.cpi, 10.0);
    }

    #[test]
    fn test_pixel_position_rounds() {
        let mut state = letter();
        state.x = 0.1;
        state.y = 1.0 / 6.0;
        assert_eq!(state.pixel_x(360), 36);
        assert_eq!(state.pixel_y(360), 60);
    }
}
