//! # Page Raster
//!
//! One physical page as an 8-bit indexed pixel buffer.
//!
//! ## Pixel Format
//!
//! ```text
//!   7 6 5 4 3 2 1 0
//!  ┌─────┬─────────┐
//!  │ yyy │  xxxxx  │   yyy   = ink colour bits (000 = paper)
//!  └─────┴─────────┘   xxxxx = intensity, 31 = full ink
//! ```
//!
//! Inks are subtractive: printing yellow (100) over magenta (001) ORs the
//! colour bits to red (101), which reproduces a colour ribbon overprint.
//! Index 0 is blank paper.

use super::glyph::Glyph;

/// Intensity mask of a pixel
const INTENSITY: u8 = 0x1F;

/// Ribbon colour selected with `ESC r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ink {
    #[default]
    Black,
    Magenta,
    Cyan,
    Violet,
    Yellow,
    Red,
    Green,
}

impl Ink {
    /// Map an `ESC r n` selector. 0 and anything above 6 is black.
    pub fn from_selector(n: u8) -> Self {
        match n {
            1 => Self::Magenta,
            2 => Self::Cyan,
            3 => Self::Violet,
            4 => Self::Yellow,
            5 => Self::Red,
            6 => Self::Green,
            _ => Self::Black,
        }
    }

    /// Colour bits in pixel position (`yyy00000`).
    #[inline]
    pub fn bits(self) -> u8 {
        let band: u8 = match self {
            Self::Magenta => 1,
            Self::Cyan => 2,
            Self::Violet => 3,
            Self::Yellow => 4,
            Self::Red => 5,
            Self::Green => 6,
            Self::Black => 7,
        };
        band << 5
    }
}

// ============================================================================
// PALETTE
// ============================================================================

/// Which RGB channels each colour band absorbs, band 0 to 7.
const BAND_ABSORPTION: [[u8; 3]; 8] = [
    [0, 0, 0],       // paper
    [0, 255, 0],     // magenta
    [255, 0, 0],     // cyan
    [255, 255, 0],   // violet
    [0, 0, 255],     // yellow
    [0, 255, 255],   // red
    [255, 0, 255],   // green
    [255, 255, 255], // black
];

/// RGB colour of a pixel index.
///
/// Each band fades linearly from white at intensity 0 to its full colour at
/// intensity 31.
pub fn rgb(index: u8) -> [u8; 3] {
    let band = (index >> 5) as usize;
    let intensity = (index & INTENSITY) as f64;
    let absorb = BAND_ABSORPTION[band];
    let channel = |max: u8| (255.0 - (max as f64 / 30.9) * intensity) as u8;
    [channel(absorb[0]), channel(absorb[1]), channel(absorb[2])]
}

/// Grey level of a pixel index (ITU-R BT.601 weights).
pub fn luminance(index: u8) -> u8 {
    let [r, g, b] = rgb(index);
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64).round() as u8
}

// ============================================================================
// RASTER
// ============================================================================

/// # Page Raster
///
/// All drawing operations clip to the page; coordinates outside it are
/// silently dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRaster {
    width: usize,
    height: usize,
    dpi: u16,
    pixels: Vec<u8>,
}

impl PageRaster {
    /// Allocate a blank page of `width` × `height` pixels at `dpi`.
    pub fn new(width: usize, height: usize, dpi: u16) -> Self {
        Self {
            width,
            height,
            dpi,
            pixels: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dpi(&self) -> u16 {
        self.dpi
    }

    /// Raw pixel indices, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Reset every pixel to blank paper.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Has nothing been printed on this page?
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&p| p == 0)
    }

    /// Pixel by linear index (row-major). Out of range reads as paper.
    pub fn pixel(&self, index: usize) -> u8 {
        self.pixels.get(index).copied().unwrap_or(0)
    }

    /// Pixel at `(x, y)`, `None` outside the page.
    pub fn get(&self, x: i64, y: i64) -> Option<u8> {
        self.offset(x, y).map(|i| self.pixels[i])
    }

    #[inline]
    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            None
        } else {
            Some(y as usize * self.width + x as usize)
        }
    }

    /// Composite a glyph coverage bitmap with its top-left corner at
    /// `(x, y)`.
    ///
    /// Coverage is reduced to 5 bits. A non-additive blit replaces the
    /// pixel; an additive blit adds to its intensity and saturates at 31,
    /// forcing the ink bits on overflow.
    pub fn blit_glyph(&mut self, glyph: &Glyph, x: i64, y: i64, additive: bool, ink: Ink) {
        let color = ink.bits();
        for gy in 0..glyph.height {
            for gx in 0..glyph.width {
                let source = glyph.data[gy * glyph.width + gx];
                if source == 0 {
                    continue;
                }
                let Some(i) = self.offset(x + gx as i64, y + gy as i64) else {
                    continue;
                };
                let source = source >> 3;
                let target = &mut self.pixels[i];
                if additive {
                    if (*target & INTENSITY) + source > INTENSITY {
                        *target |= color | INTENSITY;
                    } else {
                        *target += source;
                        *target |= color;
                    }
                } else {
                    *target = source | color;
                }
            }
        }
    }

    /// Draw a three pixel high horizontal rule from `from` to `to`
    /// (inclusive) centred on row `y`.
    ///
    /// Broken rules leave a gap in the last fifth of every 1/15 inch.
    pub fn draw_line(&mut self, from: i64, to: i64, y: i64, broken: bool) {
        let breakmod = (self.dpi as i64 / 15).max(1);
        let gapstart = breakmod * 4 / 5;
        let center = if broken { 240 } else { 255 };

        for x in from.max(0)..=to {
            if broken && x % breakmod > gapstart {
                continue;
            }
            for (row, value) in [(y - 1, 240), (y, center), (y + 1, 240)] {
                if let Some(i) = self.offset(x, row) {
                    self.pixels[i] = value;
                }
            }
        }
    }

    /// OR full-intensity ink into a rectangle.
    pub fn fill_rect(&mut self, x: i64, y: i64, width: usize, height: usize, ink: Ink) {
        let value = ink.bits() | INTENSITY;
        for row in y..y + height as i64 {
            for col in x..x + width as i64 {
                if let Some(i) = self.offset(col, row) {
                    self.pixels[i] |= value;
                }
            }
        }
    }

    /// Expand to packed RGB8.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let lut: Vec<[u8; 3]> = (0..=255u8).map(rgb).collect();
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for &p in &self.pixels {
            out.extend_from_slice(&lut[p as usize]);
        }
        out
    }

    /// Expand to 8-bit grey, one byte per pixel.
    pub fn to_luma8(&self) -> Vec<u8> {
        let lut: Vec<u8> = (0..=255u8).map(luminance).collect();
        self.pixels.iter().map(|&p| lut[p as usize]).collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
