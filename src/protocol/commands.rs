//! # ESC/P Command Table
//!
//! This module describes the command language understood by the virtual
//! printer: the single-byte control codes and the descriptor table for the
//! three escape introducers (`ESC x`, `FS x`, `ESC ( x`).
//!
//! ## Sequence Structure
//!
//! Commands follow these patterns:
//! - Single byte: `LF`, `FF`, `HT`, `SO`, `SI`
//! - Escape with fixed parameters: `ESC @`, `ESC E`, `ESC J n`, `ESC * m nL nH`
//! - IBM-style `FS` commands: `FS 4`, `FS C n`, `FS Z nL nH`
//! - Extended `ESC ( x nL nH data...`: the first two parameter bytes are a
//!   little-endian byte count of the data that follows
//! - Open-ended lists: `ESC D n1 n2 ... NUL`, `ESC B n1 n2 ... NUL`
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! - `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`
//!
//! ## Lookup
//!
//! ```
//! use dotmatrix::protocol::commands::{Command, ParamSpec};
//!
//! assert_eq!(Command::esc(b'J').params(), Some(ParamSpec::Fixed(1)));
//! assert_eq!(Command::paren(b'B').params(), Some(ParamSpec::Counted));
//! assert_eq!(Command::esc(b'V').params(), None);
//! ```

use std::fmt;

// ============================================================================
// CONTROL CODES
// ============================================================================

/// NUL - Ignored outside of parameter data
pub const NUL: u8 = 0x00;

/// BEL - Beeper, ignored
pub const BEL: u8 = 0x07;

/// BS (Backspace) - Move back one character width, never past the left margin
pub const BS: u8 = 0x08;

/// HT (Horizontal Tab) - Advance to the next horizontal tab stop
pub const HT: u8 = 0x09;

/// LF (Line Feed) - Return to the left margin and advance one line
pub const LF: u8 = 0x0A;

/// VT (Vertical Tab) - Advance to the next vertical tab stop
///
/// Acts like `CR` when all tabs were cancelled and like `LF` when no tabs
/// have been set since the last reset.
pub const VT: u8 = 0x0B;

/// FF (Form Feed) - Eject the current page
pub const FF: u8 = 0x0C;

/// CR (Carriage Return) - Return to the left margin
///
/// Followed by an implicit line feed when the host drives the autofeed line.
pub const CR: u8 = 0x0D;

/// SO (Shift Out) - Double width for the rest of the line
pub const SO: u8 = 0x0E;

/// SI (Shift In) - Condensed printing
pub const SI: u8 = 0x0F;

/// DC1 - Select printer, ignored
pub const DC1: u8 = 0x11;

/// DC2 - Cancel condensed printing
pub const DC2: u8 = 0x12;

/// DC3 - Deselect printer, ignored
pub const DC3: u8 = 0x13;

/// DC4 - Cancel one-line double width
pub const DC4: u8 = 0x14;

/// CAN - Cancel line, ignored (there is no line buffer)
pub const CAN: u8 = 0x18;

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// FS (File Separator) - IBM-compatible command prefix
pub const FS: u8 = 0x1C;

/// `(` after `ESC` selects the extended command table
pub const EXTENDED: u8 = b'(';

/// Is `byte` one of the control codes that act on their own?
///
/// `ESC` and `FS` are not included; they start a sequence instead of
/// completing an action.
#[inline]
pub fn is_control(byte: u8) -> bool {
    matches!(
        byte,
        NUL | BEL | BS | HT | LF | VT | FF | CR | SO | SI | DC1 | DC2 | DC3 | DC4 | CAN
    )
}

// ============================================================================
// COMMAND KEYS
// ============================================================================

/// The prefix that introduced a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Introducer {
    /// `ESC x`
    Esc,
    /// `FS x`
    Fs,
    /// `ESC ( x`
    EscParen,
}

/// A command identifier: introducer plus opcode byte.
///
/// Keying on the pair keeps `ESC 4` and `FS 4` (and `ESC C` / `ESC ( C`)
/// apart without packing them into one integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command {
    pub introducer: Introducer,
    pub opcode: u8,
}

impl Command {
    /// `ESC opcode`
    #[inline]
    pub const fn esc(opcode: u8) -> Self {
        Self {
            introducer: Introducer::Esc,
            opcode,
        }
    }

    /// `FS opcode`
    #[inline]
    pub const fn fs(opcode: u8) -> Self {
        Self {
            introducer: Introducer::Fs,
            opcode,
        }
    }

    /// `ESC ( opcode`
    #[inline]
    pub const fn paren(opcode: u8) -> Self {
        Self {
            introducer: Introducer::EscParen,
            opcode,
        }
    }

    /// Descriptor of this command, `None` when unknown.
    pub fn descriptor(&self) -> Option<&'static CommandSpec> {
        COMMANDS.iter().find(|spec| spec.command == *self)
    }

    /// Parameter layout of this command, `None` when unknown.
    #[inline]
    pub fn params(&self) -> Option<ParamSpec> {
        self.descriptor().map(|spec| spec.params)
    }

    /// Human readable name, used in log messages.
    pub fn name(&self) -> &'static str {
        self.descriptor().map(|spec| spec.name).unwrap_or("unknown")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.introducer {
            Introducer::Esc => "ESC",
            Introducer::Fs => "FS",
            Introducer::EscParen => "ESC (",
        };
        if self.opcode.is_ascii_graphic() {
            write!(f, "{} {} ({:02X}h)", prefix, self.opcode as char, self.opcode)
        } else {
            write!(f, "{} {:02X}h", prefix, self.opcode)
        }
    }
}

// ============================================================================
// DESCRIPTOR TABLE
// ============================================================================

/// How the parameter bytes of a command are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSpec {
    /// Exactly `n` bytes (0 executes immediately)
    Fixed(u8),
    /// `nL nH` then that many data bytes
    Counted,
    /// `ESC D`: ascending column list ended by NUL or a non-increasing value
    HorizontalTabs,
    /// `ESC B`: ascending line list ended by NUL or a non-increasing value
    VerticalTabs,
    /// `ESC b c ...`: channel byte, then a vertical tab list
    VfuTabs,
    /// `ESC &`: user-defined character data
    UserDefinedCharacters,
}

/// One row of the command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: Command,
    pub params: ParamSpec,
    pub name: &'static str,
}

const fn esc(opcode: u8, params: ParamSpec, name: &'static str) -> CommandSpec {
    CommandSpec {
        command: Command::esc(opcode),
        params,
        name,
    }
}

const fn fs(opcode: u8, params: ParamSpec, name: &'static str) -> CommandSpec {
    CommandSpec {
        command: Command::fs(opcode),
        params,
        name,
    }
}

const fn paren(opcode: u8, params: ParamSpec, name: &'static str) -> CommandSpec {
    CommandSpec {
        command: Command::paren(opcode),
        params,
        name,
    }
}

use ParamSpec::{Counted, Fixed};

/// # Command Descriptor Table
///
/// Every sequence the interpreter recognises, with its parameter layout.
/// Commands that are recognised but have no effect on a virtual page
/// (paper-out detector, print direction, ...) are listed too, so their
/// parameters are consumed and the stream stays in sync.
///
/// `ESC (` commands with a fixed layout count their two length bytes as
/// parameters: `ESC ( U 01 00 m` is `Fixed(3)`.
pub static COMMANDS: &[CommandSpec] = &[
    // ESC, no parameters
    esc(0x02, Fixed(0), "undocumented"),
    esc(LF, Fixed(0), "reverse line feed"),
    esc(FF, Fixed(0), "top of current page"),
    esc(SO, Fixed(0), "double width (one line)"),
    esc(SI, Fixed(0), "condensed"),
    esc(b'#', Fixed(0), "cancel MSB control"),
    esc(b'0', Fixed(0), "1/8 inch line spacing"),
    esc(b'1', Fixed(0), "7/72 inch line spacing"),
    esc(b'2', Fixed(0), "1/6 inch line spacing"),
    esc(b'4', Fixed(0), "italic on"),
    esc(b'5', Fixed(0), "italic off"),
    esc(b'6', Fixed(0), "print upper control codes"),
    esc(b'7', Fixed(0), "upper control codes"),
    esc(b'8', Fixed(0), "disable paper-out detector"),
    esc(b'9', Fixed(0), "enable paper-out detector"),
    esc(b'<', Fixed(0), "unidirectional (one line)"),
    esc(b'=', Fixed(0), "MSB 0"),
    esc(b'>', Fixed(0), "MSB 1"),
    esc(b'@', Fixed(0), "initialize printer"),
    esc(b'E', Fixed(0), "bold on"),
    esc(b'F', Fixed(0), "bold off"),
    esc(b'G', Fixed(0), "double strike on"),
    esc(b'H', Fixed(0), "double strike off"),
    esc(b'M', Fixed(0), "12 cpi"),
    esc(b'O', Fixed(0), "cancel bottom margin"),
    esc(b'P', Fixed(0), "10 cpi"),
    esc(b'T', Fixed(0), "cancel super/subscript"),
    esc(b'^', Fixed(0), "print next character"),
    esc(b'g', Fixed(0), "15 cpi"),
    // ESC, one parameter
    esc(0x19, Fixed(1), "paper loading/ejecting"),
    esc(b' ', Fixed(1), "intercharacter space"),
    esc(b'!', Fixed(1), "master select"),
    esc(b'+', Fixed(1), "n/360 inch line spacing"),
    esc(b'-', Fixed(1), "underline"),
    esc(b'/', Fixed(1), "vertical tab channel"),
    esc(b'3', Fixed(1), "n/180 inch line spacing"),
    esc(b'A', Fixed(1), "n/60 inch line spacing"),
    esc(b'C', Fixed(1), "page length in lines"),
    esc(b'I', Fixed(1), "character type"),
    esc(b'J', Fixed(1), "advance n/180 inch"),
    esc(b'N', Fixed(1), "bottom margin"),
    esc(b'Q', Fixed(1), "right margin"),
    esc(b'R', Fixed(1), "international character set"),
    esc(b'S', Fixed(1), "super/subscript"),
    esc(b'U', Fixed(1), "unidirectional"),
    esc(b'W', Fixed(1), "double width"),
    esc(b'a', Fixed(1), "justification"),
    esc(b'f', Fixed(2), "horizontal/vertical skip"),
    esc(b'h', Fixed(1), "double/quadruple size"),
    esc(b'i', Fixed(1), "immediate print"),
    esc(b'j', Fixed(1), "reverse feed n/216 inch"),
    esc(b'k', Fixed(1), "typeface"),
    esc(b'l', Fixed(1), "left margin"),
    esc(b'p', Fixed(1), "proportional"),
    esc(b'r', Fixed(1), "printing colour"),
    esc(b's', Fixed(1), "low speed"),
    esc(b't', Fixed(1), "character table"),
    esc(b'w', Fixed(1), "double height"),
    esc(b'x', Fixed(1), "print quality"),
    esc(b'~', Fixed(1), "slash zero"),
    // ESC, two or more parameters
    esc(b'$', Fixed(2), "absolute horizontal position"),
    esc(b'?', Fixed(2), "reassign bit image mode"),
    esc(b'K', Fixed(2), "60 dpi graphics"),
    esc(b'L', Fixed(2), "120 dpi graphics"),
    esc(b'Y', Fixed(2), "120 dpi double speed graphics"),
    esc(b'Z', Fixed(2), "240 dpi graphics"),
    esc(b'\\', Fixed(2), "relative horizontal position"),
    esc(b'c', Fixed(2), "horizontal motion index"),
    esc(b'e', Fixed(2), "fixed tab increment"),
    esc(b'*', Fixed(3), "bit image"),
    esc(b'X', Fixed(3), "pitch and point"),
    esc(b'[', Fixed(7), "character height, width, line spacing"),
    // ESC, open-ended
    esc(b'B', ParamSpec::VerticalTabs, "vertical tabs"),
    esc(b'b', ParamSpec::VfuTabs, "VFU channel tabs"),
    esc(b'D', ParamSpec::HorizontalTabs, "horizontal tabs"),
    esc(b'%', Fixed(1), "select user-defined set"),
    esc(b'&', ParamSpec::UserDefinedCharacters, "define user-defined characters"),
    esc(b':', Fixed(3), "copy ROM to RAM"),
    // FS
    fs(b'4', Fixed(0), "italic on"),
    fs(b'5', Fixed(0), "italic off"),
    fs(b'F', Fixed(0), "forward feed"),
    fs(b'R', Fixed(0), "reverse feed"),
    fs(b'2', Fixed(0), "1/6 inch line spacing"),
    fs(b'3', Fixed(1), "n/360 inch line spacing"),
    fs(b'A', Fixed(1), "n/60 inch line spacing"),
    fs(b'C', Fixed(1), "typeface"),
    fs(b'E', Fixed(1), "character width"),
    fs(b'I', Fixed(1), "character table"),
    fs(b'S', Fixed(1), "high speed/high density"),
    fs(b'V', Fixed(1), "double height"),
    fs(b'Z', Fixed(2), "24-bit hex density graphics"),
    // ESC (
    paren(b'B', Counted, "bar code"),
    paren(b'^', Counted, "print data as characters"),
    paren(b'U', Fixed(3), "set unit"),
    paren(b'C', Fixed(4), "page length in defined unit"),
    paren(b'V', Fixed(4), "absolute vertical position"),
    paren(b'v', Fixed(4), "relative vertical position"),
    paren(b't', Fixed(5), "assign character table"),
    paren(b'-', Fixed(5), "line/score"),
    paren(b'c', Fixed(6), "page format"),
];

/// Read a little-endian `u16` from `params` at `offset`.
///
/// Missing bytes read as zero.
#[inline]
pub fn param16(params: &[u8], offset: usize) -> u16 {
    let lo = params.get(offset).copied().unwrap_or(0);
    let hi = params.get(offset + 1).copied().unwrap_or(0);
    u16::from_le_bytes([lo, hi])
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_has_no_duplicates() {
        let mut seen = HashSet::new();
        for spec in COMMANDS {
            assert!(seen.insert(spec.command), "duplicate entry {}", spec.command);
        }
    }

    #[test]
    fn test_introducers_do_not_collide() {
        assert_eq!(Command::esc(b'4').name(), "italic on");
        assert_eq!(Command::fs(b'4').name(), "italic on");
        assert_eq!(Command::esc(b'C').params(), Some(Fixed(1)));
        assert_eq!(Command::paren(b'C').params(), Some(Fixed(4)));
        assert_eq!(Command::fs(b'Z').params(), Some(Fixed(2)));
        assert_eq!(Command::esc(b'Z').params(), Some(Fixed(2)));
    }

    #[test]
    fn test_unknown_commands() {
        assert_eq!(Command::esc(b'V').params(), None);
        assert_eq!(Command::fs(b'@').params(), None);
        assert_eq!(Command::paren(b'z').params(), None);
        assert_eq!(Command::paren(b'z').name(), "unknown");
    }

    #[test]
    fn test_param16() {
        assert_eq!(param16(&[0x34, 0x12], 0), 0x1234);
        assert_eq!(param16(&[0x00, 0x05, 0x01], 1), 0x0105);
        assert_eq!(param16(&[0x07], 0), 7);
        assert_eq!(param16(&[], 4), 0);
    }

    #[test]
    fn test_is_control() {
        for byte in [NUL, BEL, BS, HT, LF, VT, FF, CR, SO, SI, DC1, DC2, DC3, DC4, CAN] {
            assert!(is_control(byte));
        }
        assert!(!is_control(ESC));
        assert!(!is_control(FS));
        assert!(!is_control(b'A'));
        assert!(!is_control(0x01));
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::esc(b'@').to_string(), "ESC @ (40h)");
        assert_eq!(Command::paren(b'B').to_string(), "ESC ( B (42h)");
        assert_eq!(Command::esc(SO).to_string(), "ESC 0Eh");
    }
}
