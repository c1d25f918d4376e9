//! # Bit Image Graphics
//!
//! Column graphics sent with `ESC K/L/Y/Z`, `ESC *` and `FS Z`. Each column
//! is 1, 3 or 6 bytes, most significant bit on top; the print head moves
//! right by one horizontal dot after every column.
//!
//! ## Densities
//!
//! | m  | Horizontal dpi | Vertical dpi | Adjacent | Bytes/column |
//! |----|----------------|--------------|----------|--------------|
//! | 0  | 60             | 60           | yes      | 1            |
//! | 1  | 120            | 60           | yes      | 1            |
//! | 2  | 120            | 60           | no       | 1            |
//! | 3  | 60             | 240          | no       | 1            |
//! | 4  | 80             | 60           | yes      | 1            |
//! | 6  | 90             | 60           | yes      | 1            |
//! | 32 | 60             | 180          | yes      | 3            |
//! | 33 | 120            | 180          | yes      | 3            |
//! | 38 | 90             | 180          | yes      | 3            |
//! | 39 | 180            | 180          | yes      | 3            |
//! | 40 | 360            | 180          | no       | 3            |
//! | 71 | 180            | 360          | yes      | 6            |
//! | 72 | 360            | 360          | no       | 6            |
//! | 73 | 360            | 360          | yes      | 6            |
//!
//! Adjacent-dot modes enlarge every dot to `dpi / density` pixels so the
//! image stays solid when the page resolution is higher than the graphics
//! resolution.

use crate::render::raster::{Ink, PageRaster};

/// Resolution and column layout of a bit image density.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitImageMode {
    pub horizontal_dpi: u16,
    pub vertical_dpi: u16,
    pub adjacent: bool,
    pub bytes_per_column: u8,
}

const fn mode(horizontal_dpi: u16, vertical_dpi: u16, adjacent: bool, bytes_per_column: u8) -> BitImageMode {
    BitImageMode {
        horizontal_dpi,
        vertical_dpi,
        adjacent,
        bytes_per_column,
    }
}

impl BitImageMode {
    /// Look up density `m`. Unknown densities return `None`.
    pub fn from_density(m: u8) -> Option<Self> {
        Some(match m {
            0 => mode(60, 60, true, 1),
            1 => mode(120, 60, true, 1),
            2 => mode(120, 60, false, 1),
            3 => mode(60, 240, false, 1),
            4 => mode(80, 60, true, 1),
            6 => mode(90, 60, true, 1),
            32 => mode(60, 180, true, 3),
            33 => mode(120, 180, true, 3),
            38 => mode(90, 180, true, 3),
            39 => mode(180, 180, true, 3),
            40 => mode(360, 180, false, 3),
            71 => mode(180, 360, true, 6),
            72 => mode(360, 360, false, 6),
            73 => mode(360, 360, true, 6),
            _ => return None,
        })
    }

    /// Size of one dot in page pixels at `dpi`.
    pub fn dot_size(&self, dpi: u16) -> (usize, usize) {
        if !self.adjacent {
            return (1, 1);
        }
        (
            (dpi / self.horizontal_dpi).max(1) as usize,
            (dpi / self.vertical_dpi).max(1) as usize,
        )
    }

    /// Horizontal advance per column in inches
    pub fn column_width(&self) -> f64 {
        1.0 / self.horizontal_dpi as f64
    }

    /// Print one column with its top at `(x, y)` inches.
    pub fn print_column(&self, page: &mut PageRaster, column: &[u8], x: f64, y: f64, ink: Ink) {
        let dpi = page.dpi();
        let (dot_width, dot_height) = self.dot_size(dpi);
        let pixel_x = (x * dpi as f64 + 0.5).floor() as i64;
        let dot_pitch = 1.0 / self.vertical_dpi as f64;

        let bits = column
            .iter()
            .flat_map(|&byte| (0..8).rev().map(move |bit| byte & (1 << bit) != 0));
        for (row, on) in bits.enumerate() {
            if !on {
                continue;
            }
            let dot_y = y + row as f64 * dot_pitch;
            let pixel_y = (dot_y * dpi as f64 + 0.5).floor() as i64;
            page.fill_rect(pixel_x, pixel_y, dot_width, dot_height, ink);
        }
    }
}
