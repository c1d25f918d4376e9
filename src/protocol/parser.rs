//! # Byte Stream Parser
//!
//! Splits the byte stream arriving at the printer into actions: characters
//! to print, control codes, complete escape sequences with their parameters,
//! tab stop lists and bit image columns.
//!
//! The parser is a resumable state machine. Every call to [`Parser::feed`]
//! consumes exactly one byte and returns at most one [`Action`]; partial
//! sequences are kept in the [`ParserState`] value between calls.
//!
//! ```text
//! Idle ──ESC──▶ AwaitingEscapeCommand ──(──▶ CollectingTwoByteEscape
//!  │                 │                              │
//!  └──FS──▶ AwaitingFsCommand                       │
//!                    │                              │
//!                    ▼                              ▼
//!          CollectingParams ──complete──▶ Idle / CollectingPayload
//! ```
//!
//! Effects are not applied here. Bit image commands depend on the density
//! table kept in the printer state, so the printer answers such a command
//! by calling [`Parser::begin_bit_image`].

use arrayvec::ArrayVec;

use super::commands::{self, Command, ParamSpec, ESC, FS};

/// Longest fixed parameter list in the command table (`ESC [`).
pub const MAX_PARAMS: usize = 8;

/// Horizontal tab stop capacity (`ESC D`).
pub const MAX_HORIZONTAL_TABS: usize = 32;

/// Vertical tab stop capacity (`ESC B`).
pub const MAX_VERTICAL_TABS: usize = 16;

/// Largest bit image column (72-pin densities).
pub const MAX_COLUMN_BYTES: usize = 6;

pub type Params = ArrayVec<u8, MAX_PARAMS>;

/// Where the parser is inside a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParserState {
    /// Between sequences
    #[default]
    Idle,
    /// `ESC` seen, waiting for the command byte
    AwaitingEscapeCommand,
    /// `FS` seen, waiting for the command byte
    AwaitingFsCommand,
    /// `ESC (` seen, waiting for the command byte
    CollectingTwoByteEscape,
    /// Gathering the fixed parameter bytes of `command`
    CollectingParams {
        command: Command,
        needed: u8,
        params: Params,
    },
    /// `ESC B`: reading line numbers
    CollectingVerticalTabs {
        tabs: ArrayVec<u8, MAX_VERTICAL_TABS>,
        last: u8,
    },
    /// `ESC D`: reading column numbers
    CollectingHorizontalTabs {
        tabs: ArrayVec<u8, MAX_HORIZONTAL_TABS>,
        last: u8,
    },
    /// Consuming graphics data, `remaining` bytes to go
    InBitImagePayload {
        remaining: usize,
        bytes_per_column: u8,
        column: ArrayVec<u8, MAX_COLUMN_BYTES>,
    },
    /// Consuming the data of a length-prefixed `ESC (` command
    CollectingPayload {
        command: Command,
        remaining: usize,
        data: Vec<u8>,
        discard: bool,
    },
    /// `ESC b`: the channel byte in front of the tab list
    SkippingVfuChannel,
    /// `ESC &`: user-defined glyph data, consumed without effect
    DefiningCharacters {
        header: ArrayVec<u8, 3>,
        chars_left: u16,
        glyph_header: ArrayVec<u8, 3>,
        data_left: usize,
    },
}

/// What a byte turned out to mean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do yet (inside a sequence, or the byte was dropped)
    None,
    /// Render this byte as a character
    Print(u8),
    /// A single-byte control code
    Control(u8),
    /// A complete fixed-length command
    Command { command: Command, params: Params },
    /// A complete length-prefixed `ESC (` command and its data
    Payload { command: Command, data: Vec<u8> },
    /// New horizontal tab stops, in columns
    HorizontalTabs(ArrayVec<u8, MAX_HORIZONTAL_TABS>),
    /// New vertical tab stops, in lines (empty: all tabs cancelled)
    VerticalTabs(ArrayVec<u8, MAX_VERTICAL_TABS>),
    /// One complete bit image column
    BitImageColumn(ArrayVec<u8, MAX_COLUMN_BYTES>),
}

/// # ESC/P Byte Parser
///
/// ## Example
///
/// ```
/// use dotmatrix::protocol::parser::{Action, Parser};
/// use dotmatrix::protocol::commands::Command;
///
/// let mut parser = Parser::new();
/// assert_eq!(parser.feed(0x1B), Action::None);
/// assert_eq!(parser.feed(b'J'), Action::None);
/// match parser.feed(30) {
///     Action::Command { command, params } => {
///         assert_eq!(command, Command::esc(b'J'));
///         assert_eq!(params.as_slice(), &[30]);
///     }
///     other => panic!("unexpected {:?}", other),
/// }
/// assert!(parser.is_idle());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Parser {
    state: ParserState,
    /// Bytes still to print without interpretation (`ESC ( ^`)
    literal: usize,
    /// `0x80..=0x9F` act as control codes (`ESC 7`)
    upper_control_codes: bool,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// Is the parser between sequences?
    pub fn is_idle(&self) -> bool {
        self.state == ParserState::Idle
    }

    /// Number of bytes that will still be printed literally.
    pub fn literal_remaining(&self) -> usize {
        self.literal
    }

    /// Print the next `count` bytes as characters, whatever their value
    /// (`ESC ^`).
    pub fn print_literally(&mut self, count: usize) {
        self.literal = count;
    }

    /// Drop any partial sequence.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Treat `0x80..=0x9F` as control codes (`true`) or as characters.
    pub fn set_upper_control_codes(&mut self, enabled: bool) {
        self.upper_control_codes = enabled;
    }

    /// Start consuming `columns` bit image columns of `bytes_per_column`
    /// bytes each.
    pub fn begin_bit_image(&mut self, columns: u16, bytes_per_column: u8) {
        if columns == 0 {
            return;
        }
        let bytes_per_column = bytes_per_column.clamp(1, MAX_COLUMN_BYTES as u8);
        self.state = ParserState::InBitImagePayload {
            remaining: columns as usize * bytes_per_column as usize,
            bytes_per_column,
            column: ArrayVec::new(),
        };
    }

    /// Consume one byte.
    pub fn feed(&mut self, byte: u8) -> Action {
        let state = std::mem::take(&mut self.state);
        let (next, action) = self.step(state, byte);
        self.state = next;
        action
    }

    fn step(&mut self, state: ParserState, byte: u8) -> (ParserState, Action) {
        use ParserState::*;

        match state {
            Idle => self.idle(byte),

            AwaitingEscapeCommand if byte == commands::EXTENDED => {
                (CollectingTwoByteEscape, Action::None)
            }
            AwaitingEscapeCommand => self.start(Command::esc(byte)),
            AwaitingFsCommand => self.start(Command::fs(byte)),
            CollectingTwoByteEscape => {
                let command = Command::paren(byte);
                if command.params().is_some() {
                    self.start(command)
                } else {
                    log::warn!("Skipping unsupported command {}", command);
                    (
                        CollectingParams {
                            command,
                            needed: 2,
                            params: Params::new(),
                        },
                        Action::None,
                    )
                }
            }

            CollectingParams {
                command,
                needed,
                mut params,
            } => {
                // Capacity is MAX_PARAMS and no layout needs more.
                let _ = params.try_push(byte);
                if params.len() < needed as usize {
                    (
                        CollectingParams {
                            command,
                            needed,
                            params,
                        },
                        Action::None,
                    )
                } else {
                    self.complete(command, params)
                }
            }

            CollectingPayload {
                command,
                remaining,
                mut data,
                discard,
            } => {
                if !discard {
                    data.push(byte);
                }
                let remaining = remaining - 1;
                if remaining > 0 {
                    return (
                        CollectingPayload {
                            command,
                            remaining,
                            data,
                            discard,
                        },
                        Action::None,
                    );
                }
                if discard {
                    (Idle, Action::None)
                } else {
                    (Idle, Action::Payload { command, data })
                }
            }

            CollectingHorizontalTabs { mut tabs, last } => {
                if byte == 0 || (!tabs.is_empty() && byte <= last) {
                    return (Idle, Action::HorizontalTabs(tabs));
                }
                let _ = tabs.try_push(byte);
                (CollectingHorizontalTabs { tabs, last: byte }, Action::None)
            }

            CollectingVerticalTabs { mut tabs, last } => {
                if byte == 0 || (!tabs.is_empty() && byte <= last) {
                    return (Idle, Action::VerticalTabs(tabs));
                }
                let _ = tabs.try_push(byte);
                (CollectingVerticalTabs { tabs, last: byte }, Action::None)
            }

            SkippingVfuChannel => (
                CollectingVerticalTabs {
                    tabs: ArrayVec::new(),
                    last: 0,
                },
                Action::None,
            ),

            InBitImagePayload {
                remaining,
                bytes_per_column,
                mut column,
            } => {
                let _ = column.try_push(byte);
                let remaining = remaining - 1;
                let complete = column.len() == bytes_per_column as usize;
                let action = if complete {
                    Action::BitImageColumn(std::mem::take(&mut column))
                } else {
                    Action::None
                };
                if remaining == 0 {
                    (Idle, action)
                } else {
                    (
                        InBitImagePayload {
                            remaining,
                            bytes_per_column,
                            column,
                        },
                        action,
                    )
                }
            }

            DefiningCharacters {
                header,
                chars_left,
                glyph_header,
                data_left,
            } => self.define_characters(header, chars_left, glyph_header, data_left, byte),
        }
    }

    fn idle(&mut self, byte: u8) -> (ParserState, Action) {
        if self.literal > 0 {
            self.literal -= 1;
            return (ParserState::Idle, Action::Print(byte));
        }

        let upper = self.upper_control_codes && (0x80..=0x9F).contains(&byte);
        let code = if upper { byte & 0x7F } else { byte };

        match code {
            ESC => (ParserState::AwaitingEscapeCommand, Action::None),
            FS => (ParserState::AwaitingFsCommand, Action::None),
            c if commands::is_control(c) => (ParserState::Idle, Action::Control(c)),
            _ if upper => (ParserState::Idle, Action::None),
            _ => (ParserState::Idle, Action::Print(byte)),
        }
    }

    fn start(&mut self, command: Command) -> (ParserState, Action) {
        let Some(spec) = command.params() else {
            log::warn!("Unknown command {}, unable to skip parameters", command);
            return (ParserState::Idle, Action::None);
        };

        match spec {
            ParamSpec::Fixed(0) => (
                ParserState::Idle,
                Action::Command {
                    command,
                    params: Params::new(),
                },
            ),
            ParamSpec::Fixed(needed) => (
                ParserState::CollectingParams {
                    command,
                    needed,
                    params: Params::new(),
                },
                Action::None,
            ),
            ParamSpec::Counted => (
                ParserState::CollectingParams {
                    command,
                    needed: 2,
                    params: Params::new(),
                },
                Action::None,
            ),
            ParamSpec::HorizontalTabs => (
                ParserState::CollectingHorizontalTabs {
                    tabs: ArrayVec::new(),
                    last: 0,
                },
                Action::None,
            ),
            ParamSpec::VerticalTabs => (
                ParserState::CollectingVerticalTabs {
                    tabs: ArrayVec::new(),
                    last: 0,
                },
                Action::None,
            ),
            ParamSpec::VfuTabs => (ParserState::SkippingVfuChannel, Action::None),
            ParamSpec::UserDefinedCharacters => {
                log::warn!("User-defined characters are not supported, skipping {}", command);
                (
                    ParserState::DefiningCharacters {
                        header: ArrayVec::new(),
                        chars_left: 0,
                        glyph_header: ArrayVec::new(),
                        data_left: 0,
                    },
                    Action::None,
                )
            }
        }
    }

    fn complete(&mut self, command: Command, params: Params) -> (ParserState, Action) {
        // ESC C NUL n: page length in inches takes one more byte
        if command == Command::esc(b'C') && params.len() == 1 && params[0] == 0 {
            return (
                ParserState::CollectingParams {
                    command,
                    needed: 2,
                    params,
                },
                Action::None,
            );
        }

        let spec = command.params();
        if !matches!(spec, Some(ParamSpec::Counted) | None) {
            return (ParserState::Idle, Action::Command { command, params });
        }

        let len = commands::param16(&params, 0) as usize;
        let discard = spec.is_none();

        if command == Command::paren(b'^') {
            self.print_literally(len);
            return (ParserState::Idle, Action::None);
        }
        if len == 0 {
            let action = if discard {
                Action::None
            } else {
                Action::Payload {
                    command,
                    data: Vec::new(),
                }
            };
            return (ParserState::Idle, action);
        }

        (
            ParserState::CollectingPayload {
                command,
                remaining: len,
                data: if discard { Vec::new() } else { Vec::with_capacity(len) },
                discard,
            },
            Action::None,
        )
    }

    /// `ESC & 0 n m` followed, per character, by `a0 a1 a2` and `a1 * 3`
    /// column bytes.
    fn define_characters(
        &mut self,
        mut header: ArrayVec<u8, 3>,
        mut chars_left: u16,
        mut glyph_header: ArrayVec<u8, 3>,
        mut data_left: usize,
        byte: u8,
    ) -> (ParserState, Action) {
        if !header.is_full() {
            header.push(byte);
            if header.is_full() {
                let (first, last) = (header[1], header[2]);
                if last < first {
                    return (ParserState::Idle, Action::None);
                }
                chars_left = (last - first) as u16 + 1;
            }
        } else if data_left > 0 {
            data_left -= 1;
            if data_left == 0 {
                chars_left -= 1;
                glyph_header.clear();
            }
        } else {
            glyph_header.push(byte);
            if glyph_header.is_full() {
                data_left = glyph_header[1] as usize * 3;
                if data_left == 0 {
                    chars_left -= 1;
                    glyph_header.clear();
                }
            }
        }

        if header.is_full() && chars_left == 0 {
            return (ParserState::Idle, Action::None);
        }
        (
            ParserState::DefiningCharacters {
                header,
                chars_left,
                glyph_header,
                data_left,
            },
            Action::None,
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
