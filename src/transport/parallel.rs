//! # Parallel Port
//!
//! The printer side of an LPT port: the three registers a host driver
//! reads and writes, wired to a [`Printer`].
//!
//! ## Registers
//!
//! | Register | Bits |
//! |----------|------|
//! | Data     | Byte latched for the next strobe |
//! | Status   | 7 not busy, 6 /ACK, 4-0 always set |
//! | Control  | 2 INIT, 1 autofeed, 0 strobe |
//!
//! The printer is powered on by the first strobe, so a port whose printer
//! is disabled (or never used) reports `0xDF`: no printer attached.
//!
//! ## Handshake
//!
//! ```text
//! write_data(b)
//! write_control(ctl | STROBE)   strobe high
//! write_control(ctl)            falling edge: printer receives b
//! read_status()                 bit 6 low once: byte acknowledged
//! ```

use std::time::Instant;

use crate::error::PrinterError;
use crate::printer::{Printer, PrinterConfig};

/// Control register: strobe
pub const STROBE: u8 = 0x01;

/// Control register: line feed after every carriage return
pub const AUTOFEED: u8 = 0x02;

/// Control register: initialise printer on rising edge
pub const INIT: u8 = 0x04;

/// Status register: printer not busy
pub const NOT_BUSY: u8 = 0x80;

/// Status register: no acknowledge pending
pub const NOT_ACK: u8 = 0x40;

/// Status register with no printer attached
pub const NO_PRINTER: u8 = 0xDF;

/// Status bits that always read high
const STATUS_IDLE: u8 = 0x1F;

/// Control bits that always read high
const CONTROL_UNUSED: u8 = 0xE0;

/// # Parallel Port
///
/// Owns the printer. It is created on the first strobed byte from the
/// stored configuration and lives as long as the port.
pub struct ParallelPort {
    config: PrinterConfig,
    printer: Option<Printer>,
    data: u8,
    control: u8,
}

impl ParallelPort {
    /// A port for a printer with `config`.
    pub fn new(config: PrinterConfig) -> Result<Self, PrinterError> {
        config.validate()?;
        Ok(Self {
            config,
            printer: None,
            data: 0,
            control: INIT,
        })
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    /// The attached printer, once powered on.
    pub fn printer(&self) -> Option<&Printer> {
        self.printer.as_ref()
    }

    pub fn printer_mut(&mut self) -> Option<&mut Printer> {
        self.printer.as_mut()
    }

    pub fn read_data(&self) -> u8 {
        self.data
    }

    pub fn write_data(&mut self, value: u8) {
        self.data = value;
    }

    /// Read the status register. Reading consumes a pending ACK.
    pub fn read_status(&mut self) -> u8 {
        let Some(printer) = self.printer.as_mut() else {
            return NO_PRINTER;
        };

        let mut status = STATUS_IDLE;
        if !printer.is_busy() {
            status |= NOT_BUSY;
        }
        if !printer.ack() {
            status |= NOT_ACK;
        }
        status
    }

    pub fn read_control(&self) -> u8 {
        match &self.printer {
            None => CONTROL_UNUSED | self.control,
            Some(printer) => {
                let autofeed = if printer.autofeed() { AUTOFEED } else { 0 };
                CONTROL_UNUSED | autofeed | (self.control & !AUTOFEED)
            }
        }
    }

    pub fn write_control(&mut self, value: u8) {
        let init_rising = value & INIT != 0 && self.control & INIT == 0;
        let strobe_falling = value & STROBE == 0 && self.control & STROBE != 0;

        if init_rising {
            if let Some(printer) = self.printer.as_mut() {
                log::debug!("INIT: resetting printer");
                printer.reset_hard();
            }
        }

        if strobe_falling {
            let data = self.data;
            if let Some(printer) = self.power_on() {
                printer.print_char(data);
            }
        }

        self.control = value;
        if let Some(printer) = self.printer.as_mut() {
            printer.set_autofeed(value & AUTOFEED != 0);
        }
    }

    /// Strobe every byte of `data` through the port.
    pub fn send(&mut self, data: &[u8]) {
        let idle = self.control & !STROBE;
        for &byte in data {
            self.write_data(byte);
            self.write_control(idle | STROBE);
            self.write_control(idle);
            self.read_status();
        }
    }

    /// Panel eject button.
    pub fn form_feed(&mut self) {
        if let Some(printer) = self.printer.as_mut() {
            printer.form_feed();
        }
    }

    /// Run the auto-eject timer. Returns `true` if a page was ejected.
    pub fn poll(&mut self, now: Instant) -> bool {
        self.printer.as_mut().is_some_and(|printer| printer.poll(now))
    }

    fn power_on(&mut self) -> Option<&mut Printer> {
        if self.printer.is_none() && self.config.enabled {
            match Printer::new(self.config.clone()) {
                Ok(mut printer) => {
                    printer.set_autofeed(self.control & AUTOFEED != 0);
                    self.printer = Some(printer);
                }
                Err(e) => log::error!("Unable to start printer: {}", e),
            }
        }
        self.printer.as_mut()
    }
}

// ============================================================================
// TESTS
// ============================================================================
