//! # Rendering Module
//!
//! Pixels for the virtual page.
//!
//! ## Modules
//!
//! - [`raster`]: Indexed colour page buffer with ink-overlap compositing
//! - [`glyph`]: TrueType / bitmap glyph rasterizer for the printer typefaces
//!
//! ## Usage Example
//!
//! ```
//! use dotmatrix::render::glyph::{FontSpec, GlyphRasterizer};
//! use dotmatrix::render::raster::{Ink, PageRaster};
//!
//! let mut page = PageRaster::new(612, 792, 72);
//! let mut fonts = GlyphRasterizer::new("FONTS", 72);
//! let glyph = fonts.rasterize('A', &FontSpec::default());
//! page.blit_glyph(&glyph, 10, 10, false, Ink::Black);
//! assert!(!page.is_blank());
//! ```

pub mod glyph;
pub mod raster;

pub use glyph::{FontMetrics, FontSpec, Glyph, GlyphRasterizer, Typeface};
pub use raster::{Ink, PageRaster};
