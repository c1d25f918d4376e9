//! # Bitmap Page Output
//!
//! PNG and BMP files of a finished page, one file per page, in RGB with
//! the ribbon palette applied.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::bmp::BmpEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};

use crate::error::PrinterError;
use crate::render::raster::PageRaster;

fn dimensions(page: &PageRaster) -> Result<(u32, u32), PrinterError> {
    let width = u32::try_from(page.width())
        .map_err(|_| PrinterError::Image(format!("page width {} too large", page.width())))?;
    let height = u32::try_from(page.height())
        .map_err(|_| PrinterError::Image(format!("page height {} too large", page.height())))?;
    Ok((width, height))
}

/// Encode `page` as PNG at best compression into `writer`.
pub fn encode_png<W: Write>(page: &PageRaster, writer: W) -> Result<(), PrinterError> {
    let (width, height) = dimensions(page)?;
    let encoder = PngEncoder::new_with_quality(writer, CompressionType::Best, FilterType::Adaptive);
    encoder
        .write_image(&page.to_rgb8(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e: image::ImageError| PrinterError::Image(e.to_string()))
}

/// Encode `page` as an uncompressed BMP into `writer`.
pub fn encode_bmp<W: Write>(page: &PageRaster, mut writer: W) -> Result<(), PrinterError> {
    let (width, height) = dimensions(page)?;
    let encoder = BmpEncoder::new(&mut writer);
    encoder
        .write_image(&page.to_rgb8(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e: image::ImageError| PrinterError::Image(e.to_string()))
}

pub fn write_png(page: &PageRaster, path: &Path) -> Result<(), PrinterError> {
    let mut writer = BufWriter::new(File::create(path)?);
    encode_png(page, &mut writer)?;
    writer.flush()?;
    Ok(())
}

pub fn write_bmp(page: &PageRaster, path: &Path) -> Result<(), PrinterError> {
    let mut writer = BufWriter::new(File::create(path)?);
    encode_bmp(page, &mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::raster::Ink;

    fn sample() -> PageRaster {
        let mut page = PageRaster::new(8, 4, 72);
        page.fill_rect(1, 1, 2, 2, Ink::Black);
        page
    }

    #[test]
    fn test_png_round_trip_pixels() {
        let mut bytes = Vec::new();
        encode_png(&sample(), &mut bytes).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (8, 4));
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(decoded.get_pixel(1, 1).0, [0, 0, 0]);
    }

    #[test]
    fn test_bmp_header() {
        let mut bytes = Vec::new();
        encode_bmp(&sample(), &mut bytes).unwrap();
        assert_eq!(&bytes[0..2], b"BM");
    }
}
