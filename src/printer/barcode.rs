//! # Bar Codes (ESC ( B)
//!
//! ESC/P2 bar code printing. The payload after the length bytes is:
//!
//! | Byte  | Meaning |
//! |-------|---------|
//! | k     | Symbology (see [`Symbology`]) |
//! | m     | Module width in 1/180 inch dots (2-5) |
//! | s     | Space adjustment in 1/360 inch (signed, -3..3) |
//! | v1 v2 | Bar length in 1/180 inch (v1 + v2 × 256) |
//! | c     | Control flags (check digit, human readable text) |
//! | d...  | Bar code data |
//!
//! Bars are encoded with barcoders and drawn at the print position; the
//! position then moves right by the width of the symbol. Human readable
//! text under the symbol is not printed.

use barcoders::sym::code128::Code128;
use barcoders::sym::code39::Code39;
use barcoders::sym::ean13::EAN13;
use barcoders::sym::ean8::EAN8;
use barcoders::sym::tf::TF;

use crate::error::PrinterError;
use crate::render::raster::{Ink, PageRaster};

/// Number of header bytes before the bar code data
const HEADER_LEN: usize = 6;

/// Bar code symbology selector `k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Symbology {
    Ean13 = 0,
    Ean8 = 1,
    Interleaved2of5 = 2,
    UpcA = 3,
    UpcE = 4,
    Code39 = 5,
    Code128 = 6,
    Postnet = 7,
}

impl Symbology {
    pub fn from_selector(k: u8) -> Option<Self> {
        Some(match k {
            0 => Self::Ean13,
            1 => Self::Ean8,
            2 => Self::Interleaved2of5,
            3 => Self::UpcA,
            4 => Self::UpcE,
            5 => Self::Code39,
            6 => Self::Code128,
            7 => Self::Postnet,
            _ => return None,
        })
    }
}

/// A decoded `ESC ( B` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcode {
    pub symbology: Symbology,
    /// Module width in 1/180 inch
    pub module_width: u8,
    /// Extra space width in 1/360 inch
    pub space_adjustment: i8,
    /// Bar length in 1/180 inch
    pub bar_length: u16,
    pub flags: u8,
    pub data: Vec<u8>,
}

impl Barcode {
    /// Decode the payload of `ESC ( B`.
    pub fn parse(payload: &[u8]) -> Result<Self, PrinterError> {
        if payload.len() < HEADER_LEN {
            return Err(PrinterError::Barcode(format!(
                "header needs {} bytes, got {}",
                HEADER_LEN,
                payload.len()
            )));
        }
        let symbology = Symbology::from_selector(payload[0])
            .ok_or_else(|| PrinterError::Barcode(format!("unknown symbology {}", payload[0])))?;

        Ok(Self {
            symbology,
            module_width: payload[1].clamp(2, 5),
            space_adjustment: (payload[2] as i8).clamp(-3, 3),
            bar_length: u16::from_le_bytes([payload[3], payload[4]]),
            flags: payload[5],
            data: payload[HEADER_LEN..].to_vec(),
        })
    }

    fn text(&self) -> String {
        self.data.iter().map(|&b| b as char).collect()
    }

    fn digits(&self, max: usize) -> String {
        self.data
            .iter()
            .filter(|b| b.is_ascii_digit())
            .take(max)
            .map(|&b| b as char)
            .collect()
    }

    /// Modules of the symbol, 1 = bar, 0 = space.
    pub fn encode(&self) -> Result<Vec<u8>, PrinterError> {
        let rejected = |e: barcoders::error::Error| {
            PrinterError::Barcode(format!("{:?} rejected data: {}", self.symbology, e))
        };

        match self.symbology {
            Symbology::Ean13 => Ok(EAN13::new(&self.digits(12)).map_err(rejected)?.encode()),
            Symbology::UpcA => {
                let data = format!("0{}", self.digits(11));
                Ok(EAN13::new(&data).map_err(rejected)?.encode())
            }
            Symbology::Ean8 => Ok(EAN8::new(&self.digits(7)).map_err(rejected)?.encode()),
            Symbology::Interleaved2of5 => {
                Ok(TF::interleaved(&self.digits(usize::MAX)).map_err(rejected)?.encode())
            }
            Symbology::Code39 => Ok(Code39::new(&self.text()).map_err(rejected)?.encode()),
            Symbology::Code128 => {
                // Data starts with the code set letter.
                let text = self.text();
                let data = match text.as_bytes().first() {
                    Some(b'C') => format!("\u{0106}{}", &text[1..]),
                    Some(b'A' | b'B') => format!("\u{0181}{}", &text[1..]),
                    _ => format!("\u{0181}{}", text),
                };
                Ok(Code128::new(&data).map_err(rejected)?.encode())
            }
            Symbology::UpcE | Symbology::Postnet => Err(PrinterError::Barcode(format!(
                "{:?} is not supported",
                self.symbology
            ))),
        }
    }

    /// Draw the symbol with its top-left corner at `(x, y)` inches and
    /// return its width in inches.
    pub fn print(&self, page: &mut PageRaster, x: f64, y: f64, ink: Ink) -> Result<f64, PrinterError> {
        let modules = self.encode()?;
        let dpi = page.dpi() as f64;
        let module = self.module_width as f64 / 180.0;
        let space = module + self.space_adjustment as f64 / 360.0;
        let height = (self.bar_length as f64 / 180.0 * dpi).round().max(1.0) as usize;
        let top = (y * dpi + 0.5).floor() as i64;

        let mut cursor = x;
        for &bar in &modules {
            if bar == 1 {
                let left = (cursor * dpi + 0.5).floor() as i64;
                let right = ((cursor + module) * dpi + 0.5).floor() as i64;
                page.fill_rect(left, top, (right - left).max(1) as usize, height, ink);
                cursor += module;
            } else {
                cursor += space.max(0.0);
            }
        }
        Ok(cursor - x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(k: u8, data: &[u8]) -> Vec<u8> {
        let mut p = vec![k, 2, 0, 90, 0, 0];
        p.extend_from_slice(data);
        p
    }

    #[test]
    fn test_parse_header() {
        let barcode = Barcode::parse(&[5, 9, 0xFE, 0x2C, 0x01, 0x01, b'A']).unwrap();
        assert_eq!(barcode.symbology, Symbology::Code39);
        assert_eq!(barcode.module_width, 5);
        assert_eq!(barcode.space_adjustment, -2);
        assert_eq!(barcode.bar_length, 300);
        assert_eq!(barcode.data, b"A");
    }

    #[test]
    fn test_parse_rejects_short_and_unknown() {
        assert!(Barcode::parse(&[0, 2, 0]).is_err());
        assert!(Barcode::parse(&[9, 2, 0, 1, 0, 0]).is_err());
    }

    #[test]
    fn test_encode_ean13() {
        let barcode = Barcode::parse(&payload(0, b"590123412345")).unwrap();
        let modules = barcode.encode().unwrap();
        // 3 + 42 + 5 + 42 + 3
        assert_eq!(modules.len(), 95);
    }

    #[test]
    fn test_encode_code39() {
        let barcode = Barcode::parse(&payload(5, b"ABC123")).unwrap();
        assert!(barcode.encode().unwrap().contains(&1));
    }

    #[test]
    fn test_unsupported_symbology() {
        let barcode = Barcode::parse(&payload(7, b"12345")).unwrap();
        assert!(barcode.encode().is_err());
    }

    #[test]
    fn test_print_draws_bars() {
        let mut page = PageRaster::new(400, 200, 180);
        let barcode = Barcode::parse(&payload(0, b"590123412345")).unwrap();
        let width = barcode.print(&mut page, 0.0, 0.0, Ink::Black).unwrap();
        assert!(width > 0.9 && width < 1.1);
        // Start guard is a bar
        assert_eq!(page.get(0, 0), Some(0xFF));
        assert_eq!(page.get(0, 89), Some(0xFF));
        assert_eq!(page.get(0, 90), Some(0));
    }
}
