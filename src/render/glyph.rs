//! # Glyph Rasterizer
//!
//! Produces coverage bitmaps for printer characters at the current point
//! size and resolution.
//!
//! TrueType faces are read from the configured font directory on first use
//! (`roman.ttf`, `sansserif.ttf`, `courier.ttf`, `script.ttf`, `ocra.ttf`)
//! and rendered with ab_glyph. When a face is missing, the built-in Spleen
//! 12×24 bitmap font is scaled to the requested cell instead, so output is
//! never empty just because no fonts were installed.
//!
//! Italics are synthesised with a 0.2 horizontal shear around the baseline.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use spleen_font::{PSF2Font, FONT_12X24};

use crate::error::PrinterError;

/// Horizontal shear applied for synthetic italics
const ITALIC_SHEAR: f64 = 0.2;

/// Share of the fallback cell above the baseline
const FALLBACK_ASCENT: f64 = 0.8;

/// Largest em size rendered, one inch. Larger requests are drawn at this size.
const MAX_POINTS: f64 = 72.0;

// ============================================================================
// TYPEFACES
// ============================================================================

/// LQ typefaces selectable with `ESC k` / `FS C`, by Epson id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Typeface {
    #[default]
    Roman,
    SansSerif,
    Courier,
    Prestige,
    Script,
    OcrB,
    OcrA,
    Orator,
    OratorS,
    ScriptC,
    RomanT,
    SansSerifH,
    SvBusaba,
    SvJittra,
}

impl Typeface {
    /// Map an `ESC k n` selector. Unknown ids are rejected.
    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => Self::Roman,
            1 => Self::SansSerif,
            2 => Self::Courier,
            3 => Self::Prestige,
            4 => Self::Script,
            5 => Self::OcrB,
            6 => Self::OcrA,
            7 => Self::Orator,
            8 => Self::OratorS,
            9 => Self::ScriptC,
            10 => Self::RomanT,
            11 => Self::SansSerifH,
            30 => Self::SvBusaba,
            31 => Self::SvJittra,
            _ => return None,
        })
    }

    /// TrueType file rendering this typeface. Faces without their own file
    /// use Roman.
    pub fn font_file(self) -> &'static str {
        match self {
            Self::SansSerif => "sansserif.ttf",
            Self::Courier => "courier.ttf",
            Self::Script => "script.ttf",
            Self::OcrA | Self::OcrB => "ocra.ttf",
            _ => "roman.ttf",
        }
    }
}

// ============================================================================
// FONT SPEC & GLYPH
// ============================================================================

/// The font the printer state currently asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub typeface: Typeface,
    /// Horizontal em size in points
    pub horizontal_points: f64,
    /// Vertical em size in points
    pub vertical_points: f64,
    /// Effective characters per inch for fixed pitch advance
    pub cpi: f64,
    pub italic: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            typeface: Typeface::Roman,
            horizontal_points: 10.5,
            vertical_points: 10.5,
            cpi: 10.0,
            italic: false,
        }
    }
}

/// A rendered glyph.
///
/// `left` and `top` place the bitmap relative to the pen position on the
/// baseline (`top` counts rows above the baseline).
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub width: usize,
    pub height: usize,
    pub left: i32,
    pub top: i32,
    /// Horizontal advance in pixels
    pub advance: f64,
    /// Coverage, 0 = none, 255 = full, row-major
    pub data: Vec<u8>,
}

impl Glyph {
    fn empty(advance: f64) -> Self {
        Self {
            width: 0,
            height: 0,
            left: 0,
            top: 0,
            advance,
            data: Vec::new(),
        }
    }

    /// Shear rows above the baseline to the right, rows below to the left.
    fn sheared(self, factor: f64) -> Self {
        if self.width == 0 || self.height == 0 {
            return self;
        }
        let shifts: Vec<i32> = (0..self.height)
            .map(|row| ((self.top - row as i32) as f64 * factor).round() as i32)
            .collect();
        let min = shifts.iter().copied().min().unwrap_or(0);
        let max = shifts.iter().copied().max().unwrap_or(0);
        let width = self.width + (max - min) as usize;

        let mut data = vec![0u8; width * self.height];
        for (row, shift) in shifts.iter().enumerate() {
            let dst = row * width + (shift - min) as usize;
            let src = row * self.width;
            data[dst..dst + self.width].copy_from_slice(&self.data[src..src + self.width]);
        }

        Self {
            width,
            left: self.left + min,
            data,
            ..self
        }
    }
}

/// Vertical metrics of the current font, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    /// Baseline distance from the top of the line
    pub ascender: f64,
    /// Line height
    pub height: f64,
}

// ============================================================================
// RASTERIZER
// ============================================================================

/// What a rendered glyph depends on besides the character.
type SizeKey = (&'static str, u64, u64, bool);

fn size_key(spec: &FontSpec) -> SizeKey {
    (
        spec.typeface.font_file(),
        spec.horizontal_points.to_bits(),
        spec.vertical_points.to_bits(),
        spec.italic,
    )
}

/// # Glyph Rasterizer
///
/// Caches loaded faces per file. Rendered glyphs are cached for the most
/// recent font only and dropped when the font changes.
pub struct GlyphRasterizer {
    font_dir: PathBuf,
    dpi: u16,
    faces: HashMap<&'static str, Option<FontArc>>,
    size: Option<SizeKey>,
    glyphs: HashMap<char, Glyph>,
}

impl GlyphRasterizer {
    pub fn new(font_dir: impl Into<PathBuf>, dpi: u16) -> Self {
        Self {
            font_dir: font_dir.into(),
            dpi,
            faces: HashMap::new(),
            size: None,
            glyphs: HashMap::new(),
        }
    }

    /// Is a TrueType face available for `typeface`?
    pub fn has_face(&mut self, typeface: Typeface) -> bool {
        self.face(typeface).is_some()
    }

    fn face(&mut self, typeface: Typeface) -> Option<FontArc> {
        let file = typeface.font_file();
        let dir = &self.font_dir;
        self.faces
            .entry(file)
            .or_insert_with(|| match load_face(&dir.join(file)) {
                Ok(face) => {
                    log::debug!("Loaded font {}", file);
                    Some(face)
                }
                Err(e) => {
                    log::warn!("{}; using built-in bitmap font", e);
                    None
                }
            })
            .clone()
    }

    /// Em size in pixels for `points`
    fn pixels(&self, points: f64) -> f64 {
        points.clamp(0.0, MAX_POINTS) / 72.0 * self.dpi as f64
    }

    /// Vertical metrics for `spec`.
    pub fn metrics(&mut self, spec: &FontSpec) -> FontMetrics {
        match self.face(spec.typeface) {
            Some(face) => {
                let scaled = face.as_scaled(self.scale(&face, spec));
                FontMetrics {
                    ascender: scaled.ascent() as f64,
                    height: scaled.height() as f64,
                }
            }
            None => {
                let height = self.pixels(spec.vertical_points).round().max(1.0);
                FontMetrics {
                    ascender: (height * FALLBACK_ASCENT).round(),
                    height,
                }
            }
        }
    }

    /// Render `ch` at `spec`.
    pub fn rasterize(&mut self, ch: char, spec: &FontSpec) -> Glyph {
        let size = size_key(spec);
        if self.size != Some(size) {
            self.glyphs.clear();
            self.size = Some(size);
        }
        if let Some(glyph) = self.glyphs.get(&ch) {
            return glyph.clone();
        }

        let glyph = match self.face(spec.typeface) {
            Some(face) => self.outline(&face, ch, spec),
            None => self.bitmap(ch, spec),
        };
        let glyph = if spec.italic {
            glyph.sheared(ITALIC_SHEAR)
        } else {
            glyph
        };

        self.glyphs.insert(ch, glyph.clone());
        glyph
    }

    /// ab_glyph scales so that ascent - descent spans `scale.y` pixels;
    /// convert the em size accordingly.
    fn scale(&self, face: &FontArc, spec: &FontSpec) -> PxScale {
        let em = face.units_per_em().unwrap_or(1000.0) as f64;
        let k = face.height_unscaled() as f64 / em;
        PxScale {
            x: (self.pixels(spec.horizontal_points) * k) as f32,
            y: (self.pixels(spec.vertical_points) * k) as f32,
        }
    }

    fn outline(&self, face: &FontArc, ch: char, spec: &FontSpec) -> Glyph {
        let scale = self.scale(face, spec);
        let scaled = face.as_scaled(scale);
        let id = face.glyph_id(ch);
        let advance = scaled.h_advance(id) as f64;

        let glyph = id.with_scale_and_position(scale, ab_glyph::point(0.0, 0.0));
        let Some(outlined) = face.outline_glyph(glyph) else {
            return Glyph::empty(advance);
        };

        let bounds = outlined.px_bounds();
        let width = bounds.width().max(0.0) as usize;
        let height = bounds.height().max(0.0) as usize;
        let mut data = vec![0u8; width * height];
        outlined.draw(|x, y, coverage| {
            let (x, y) = (x as usize, y as usize);
            if x < width && y < height {
                data[y * width + x] = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
            }
        });

        Glyph {
            width,
            height,
            left: bounds.min.x as i32,
            top: -bounds.min.y as i32,
            advance,
            data,
        }
    }

    /// Scale the Spleen 12×24 glyph to the requested cell.
    fn bitmap(&self, ch: char, spec: &FontSpec) -> Glyph {
        let height = self.pixels(spec.vertical_points).round().max(1.0) as usize;
        let width = (self.pixels(spec.horizontal_points) * 0.5).round().max(1.0) as usize;

        let Some(source) = spleen_bitmap(ch) else {
            return Glyph::empty(width as f64);
        };

        let mut data = vec![0u8; width * height];
        for dy in 0..height {
            for dx in 0..width {
                let sx = dx * SPLEEN_WIDTH / width;
                let sy = dy * SPLEEN_HEIGHT / height;
                if source[sy * SPLEEN_WIDTH + sx] {
                    data[dy * width + dx] = 255;
                }
            }
        }

        Glyph {
            width,
            height,
            left: 0,
            top: (height as f64 * FALLBACK_ASCENT).round() as i32,
            advance: width as f64,
            data,
        }
    }
}

fn load_face(path: &Path) -> Result<FontArc, PrinterError> {
    let bytes = std::fs::read(path)
        .map_err(|e| PrinterError::Font(format!("Unable to load font {}: {}", path.display(), e)))?;
    FontArc::try_from_vec(bytes)
        .map_err(|e| PrinterError::Font(format!("Invalid font {}: {}", path.display(), e)))
}

const SPLEEN_WIDTH: usize = 12;
const SPLEEN_HEIGHT: usize = 24;

fn spleen_bitmap(ch: char) -> Option<Vec<bool>> {
    let mut font = PSF2Font::new(FONT_12X24).ok()?;
    let utf8 = ch.to_string();
    let rows = font.glyph_for_utf8(utf8.as_bytes())?;

    let mut bitmap = vec![false; SPLEEN_WIDTH * SPLEEN_HEIGHT];
    for (y, row) in rows.enumerate().take(SPLEEN_HEIGHT) {
        for (x, on) in row.enumerate().take(SPLEEN_WIDTH) {
            bitmap[y * SPLEEN_WIDTH + x] = on;
        }
    }
    Some(bitmap)
}

// ============================================================================
// TESTS
// ============================================================================
