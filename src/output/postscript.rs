//! # PostScript Output
//!
//! DSC-conforming Level 2 PostScript with one full-page 8-bit grey image
//! per page.
//!
//! ## Document Layout
//!
//! ```text
//! %!PS-Adobe-3.0
//! %%Pages: (atend)
//! %%BoundingBox: 0 0 612 792
//! %%Creator: dotmatrix virtual printer
//! %%CreationDate: 2026-01-27 09:30:00
//! %%DocumentData: Clean7Bit
//! %%LanguageLevel: 2
//! %%EndComments
//! %%Page: 1 1
//! 612 792 scale
//! 3060 3960 8 [3060 0 0 -3060 0 3960]
//! currentfile
//! /ASCII85Decode filter
//! /RunLengthDecode filter
//! image
//! <ASCII85 of RunLength data>~>
//! showpage
//! %%Pages: 1
//! %%EOF
//! ```
//!
//! ## Sample Encoding
//!
//! Samples are the palette luminance of each pixel. They are
//! RunLength-encoded (runs of three or more equal samples become a repeat
//! record, at most 128 samples per record) and the result is ASCII85
//! encoded in lines of at most 79 columns.

use std::io::{self, Write};

use crate::error::PrinterError;
use crate::render::raster::{PageRaster, luminance};

/// PostScript points per inch
const POINTS_PER_INCH: f64 = 72.0;

/// Longest RunLength record
const MAX_RUN: usize = 128;

/// RunLength end-of-data marker
const RLE_EOD: u8 = 128;

/// ASCII85 output line width
const LINE_WIDTH: usize = 79;

/// # PostScript Document
///
/// Header on creation, one `%%Page` per [`PsDocument::write_page`], trailer
/// on [`PsDocument::finish`].
pub struct PsDocument<W: Write> {
    writer: W,
    width_points: u32,
    height_points: u32,
    pages: u32,
}

impl<W: Write> PsDocument<W> {
    /// Start a document for paper of `width` × `height` inches.
    pub fn begin(mut writer: W, width: f64, height: f64) -> Result<Self, PrinterError> {
        let width_points = (width * POINTS_PER_INCH).round() as u32;
        let height_points = (height * POINTS_PER_INCH).round() as u32;
        let date = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

        writeln!(writer, "%!PS-Adobe-3.0")?;
        writeln!(writer, "%%Pages: (atend)")?;
        writeln!(writer, "%%BoundingBox: 0 0 {} {}", width_points, height_points)?;
        writeln!(writer, "%%Creator: dotmatrix virtual printer")?;
        writeln!(writer, "%%CreationDate: {}", date)?;
        writeln!(writer, "%%DocumentData: Clean7Bit")?;
        writeln!(writer, "%%LanguageLevel: 2")?;
        writeln!(writer, "%%EndComments")?;

        Ok(Self {
            writer,
            width_points,
            height_points,
            pages: 0,
        })
    }

    /// Pages written so far
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// Append `page` as the next page.
    pub fn write_page(&mut self, page: &PageRaster) -> Result<(), PrinterError> {
        self.pages += 1;
        let (w, h) = (page.width(), page.height());
        let out = &mut self.writer;

        writeln!(out, "%%Page: {} {}", self.pages, self.pages)?;
        writeln!(out, "{} {} scale", self.width_points, self.height_points)?;
        writeln!(out, "{} {} 8 [{} 0 0 -{} 0 {}]", w, h, w, h, h)?;
        writeln!(out, "currentfile")?;
        writeln!(out, "/ASCII85Decode filter")?;
        writeln!(out, "/RunLengthDecode filter")?;
        writeln!(out, "image")?;

        let samples: Vec<u8> = page.pixels().iter().map(|&p| luminance(p)).collect();
        let mut encoder = Ascii85::new(&mut *out);
        run_length(&samples, &mut encoder)?;
        encoder.finish()?;

        writeln!(out, "showpage")?;
        Ok(())
    }

    /// Write the trailer and hand back the writer.
    pub fn finish(mut self) -> Result<W, PrinterError> {
        writeln!(self.writer, "%%Pages: {}", self.pages)?;
        writeln!(self.writer, "%%EOF")?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

fn starts_run(samples: &[u8]) -> bool {
    samples.len() >= 3 && samples[0] == samples[1] && samples[1] == samples[2]
}

/// PostScript RunLengthDecode encoding of `samples`, EOD included.
fn run_length<W: Write>(samples: &[u8], out: &mut Ascii85<W>) -> io::Result<()> {
    let mut i = 0;
    while i < samples.len() {
        if starts_run(&samples[i..]) {
            let value = samples[i];
            let run = samples[i..]
                .iter()
                .take(MAX_RUN)
                .take_while(|&&s| s == value)
                .count();
            out.push((257 - run) as u8)?;
            out.push(value)?;
            i += run;
        } else {
            let start = i;
            let mut end = i + 1;
            while end < samples.len() && end - start < MAX_RUN && !starts_run(&samples[end..]) {
                end += 1;
            }
            out.push((end - start - 1) as u8)?;
            for &s in &samples[start..end] {
                out.push(s)?;
            }
            i = end;
        }
    }
    out.push(RLE_EOD)
}

/// Streaming ASCII85 encoder with line wrapping.
struct Ascii85<W: Write> {
    out: W,
    tuple: [u8; 4],
    len: usize,
    column: usize,
}

impl<W: Write> Ascii85<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            tuple: [0; 4],
            len: 0,
            column: 0,
        }
    }

    fn push(&mut self, byte: u8) -> io::Result<()> {
        self.tuple[self.len] = byte;
        self.len += 1;
        if self.len == 4 {
            self.flush_tuple(false)?;
        }
        Ok(())
    }

    fn emit(&mut self, c: u8) -> io::Result<()> {
        // A line must not start with a comment character.
        if self.column == 0 && c == b'%' {
            self.out.write_all(b" ")?;
            self.column += 1;
        }
        self.out.write_all(&[c])?;
        self.column += 1;
        if self.column >= LINE_WIDTH {
            self.out.write_all(b"\n")?;
            self.column = 0;
        }
        Ok(())
    }

    fn flush_tuple(&mut self, partial: bool) -> io::Result<()> {
        let count = self.len;
        self.tuple[count..].fill(0);
        self.len = 0;
        let value = u32::from_be_bytes(self.tuple);

        if value == 0 && !partial {
            return self.emit(b'z');
        }

        let mut digits = [0u8; 5];
        let mut n = value;
        for d in digits.iter_mut().rev() {
            *d = (n % 85) as u8 + b'!';
            n /= 85;
        }
        let keep = if partial { count + 1 } else { 5 };
        for &d in &digits[..keep] {
            self.emit(d)?;
        }
        Ok(())
    }

    fn finish(mut self) -> io::Result<()> {
        if self.len > 0 {
            self.flush_tuple(true)?;
        }
        // The end marker must fit on the line too.
        if self.column > LINE_WIDTH - 2 {
            self.out.write_all(b"\n")?;
        }
        self.out.write_all(b"~>\n")
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::raster::Ink;

    fn ascii85(bytes: &[u8]) -> String {
        let mut out = Vec::new();
        let mut enc = Ascii85::new(&mut out);
        for &b in bytes {
            enc.push(b).unwrap();
        }
        enc.finish().unwrap();
        String::from_utf8(out).unwrap()
    }

    fn decode_ascii85(text: &str) -> Vec<u8> {
        let body = &text[..text.find("~>").unwrap()];
        let mut out = Vec::new();
        let mut group = Vec::new();
        for c in body.bytes().filter(|c| !c.is_ascii_whitespace()) {
            if c == b'z' {
                out.extend_from_slice(&[0; 4]);
                continue;
            }
            group.push(c - b'!');
            if group.len() == 5 {
                let n = group.iter().fold(0u32, |acc, &d| acc * 85 + d as u32);
                out.extend_from_slice(&n.to_be_bytes());
                group.clear();
            }
        }
        if !group.is_empty() {
            let keep = group.len() - 1;
            while group.len() < 5 {
                group.push(84);
            }
            let n = group.iter().fold(0u32, |acc, &d| acc * 85 + d as u32);
            out.extend_from_slice(&n.to_be_bytes()[..keep]);
        }
        out
    }

    fn decode_run_length(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut i = 0;
        while data[i] != RLE_EOD {
            let len = data[i] as usize;
            if len < 128 {
                out.extend_from_slice(&data[i + 1..i + 2 + len]);
                i += len + 2;
            } else {
                out.extend(std::iter::repeat(data[i + 1]).take(257 - len));
                i += 2;
            }
        }
        out
    }

    #[test]
    fn test_ascii85_known_values() {
        assert_eq!(ascii85(b"Man "), "9jqo^~>\n");
        assert_eq!(ascii85(&[0, 0, 0, 0]), "z~>\n");
        assert_eq!(ascii85(b"."), "/c~>\n");
    }

    #[test]
    fn test_ascii85_line_width() {
        let text = ascii85(&[0xAB; 400]);
        for line in text.lines() {
            assert!(line.len() <= LINE_WIDTH);
            assert!(!line.starts_with('%'));
        }
    }

    #[test]
    fn test_end_marker_wraps() {
        // 78 zero groups leave the line one short of full
        let text = ascii85(&[0; 78 * 4]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 78);
        assert_eq!(lines[1], "~>");
    }

    #[test]
    fn test_run_length_records() {
        let mut out = Vec::new();
        let mut enc = Ascii85::new(&mut out);
        let samples = [7u8, 7, 7, 7, 1, 2];
        run_length(&samples, &mut enc).unwrap();
        enc.finish().unwrap();

        let decoded = decode_ascii85(&String::from_utf8(out).unwrap());
        // repeat 4 × 7, literal [1, 2], EOD
        assert_eq!(decoded, vec![253, 7, 1, 1, 2, 128]);
        assert_eq!(decode_run_length(&decoded), samples);
    }

    #[test]
    fn test_long_runs_split_at_128() {
        let samples = vec![255u8; 300];
        let mut out = Vec::new();
        let mut enc = Ascii85::new(&mut out);
        run_length(&samples, &mut enc).unwrap();
        enc.finish().unwrap();

        let decoded = decode_ascii85(&String::from_utf8(out).unwrap());
        assert_eq!(decoded[0], 129);
        assert_eq!(decode_run_length(&decoded), samples);
    }

    #[test]
    fn test_document_structure() {
        let mut page = PageRaster::new(36, 36, 72);
        page.fill_rect(4, 4, 10, 10, Ink::Black);

        let mut doc = PsDocument::begin(Vec::new(), 0.5, 0.5).unwrap();
        doc.write_page(&page).unwrap();
        doc.write_page(&page).unwrap();
        assert_eq!(doc.pages(), 2);
        let text = String::from_utf8(doc.finish().unwrap()).unwrap();

        assert!(text.starts_with("%!PS-Adobe-3.0\n%%Pages: (atend)\n"));
        assert!(text.contains("%%BoundingBox: 0 0 36 36\n"));
        assert!(text.contains("%%Page: 2 2\n"));
        assert!(text.contains("36 36 8 [36 0 0 -36 0 36]\n"));
        assert_eq!(text.matches("showpage").count(), 2);
        assert!(text.ends_with("%%Pages: 2\n%%EOF\n"));

        let start = text.find("image\n").unwrap() + "image\n".len();
        let samples = decode_run_length(&decode_ascii85(&text[start..]));
        assert_eq!(samples.len(), 36 * 36);
        assert_eq!(samples[0], 255);
        assert_eq!(samples[4 * 36 + 4], 0);
    }
}
