//! # Page Output
//!
//! Where finished pages go.
//!
//! ## Modules
//!
//! - [`image`]: PNG / BMP files, one per page
//! - [`postscript`]: PostScript documents (RunLength + ASCII85 images)
//! - [`spooler`]: PostScript piped to the host print spooler
//!
//! ## File Naming
//!
//! Files are written to the configured document directory as
//! `page<N>.<ext>` (or `doc<N>.ps` for multipage PostScript) with the
//! first `N ≥ 1` that does not exist yet, so earlier output is never
//! overwritten.

pub mod image;
pub mod postscript;
pub mod spooler;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::error::PrinterError;
use crate::printer::config::{OutputFormat, PrinterConfig};
use crate::render::raster::PageRaster;

use postscript::PsDocument;
use spooler::SpoolJob;

/// What happened to a page handed to [`PageOutput::output_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// Written to (or appended to) this file
    File(PathBuf),
    /// Sent to the spooler as page `page` of the current job
    Spooled { page: u32 },
}

/// First `<dir>/<front><N><ext>` with `N ≥ 1` that does not exist.
pub fn find_next_name(dir: &Path, front: &str, ext: &str) -> PathBuf {
    (1u32..)
        .map(|n| dir.join(format!("{}{}{}", front, n, ext)))
        .find(|path| !path.exists())
        .unwrap_or_else(|| dir.join(format!("{}{}", front, ext)))
}

/// An open PostScript file in multipage mode.
struct OpenDocument {
    path: PathBuf,
    document: PsDocument<BufWriter<File>>,
}

/// # Page Output
///
/// Encodes pages in the configured format. Multipage PostScript files and
/// spooler jobs stay open between pages until
/// [`PageOutput::finish_multipage`].
pub struct PageOutput {
    format: OutputFormat,
    multipage: bool,
    docpath: PathBuf,
    spooler: String,
    /// Paper size in inches, for the PostScript bounding box
    paper: (f64, f64),
    document: Option<OpenDocument>,
    job: Option<SpoolJob>,
}

impl PageOutput {
    pub fn new(config: &PrinterConfig) -> Self {
        Self {
            format: config.output,
            multipage: config.multipage,
            docpath: config.docpath.clone(),
            spooler: config.spooler.clone(),
            paper: (config.page_width_inches(), config.page_height_inches()),
            document: None,
            job: None,
        }
    }

    /// Is a multipage document or job waiting for more pages?
    pub fn is_open(&self) -> bool {
        self.document.is_some() || self.job.is_some()
    }

    /// Encode one finished page.
    pub fn output_page(&mut self, page: &PageRaster) -> Result<Artifact, PrinterError> {
        let extension = format!(".{}", self.format.extension());
        match self.format {
            OutputFormat::Png => {
                let path = find_next_name(&self.docpath, "page", &extension);
                image::write_png(page, &path)?;
                Ok(Artifact::File(path))
            }
            OutputFormat::Bmp => {
                let path = find_next_name(&self.docpath, "page", &extension);
                image::write_bmp(page, &path)?;
                Ok(Artifact::File(path))
            }
            OutputFormat::PostScript => self.output_postscript(page),
            OutputFormat::Printer => self.output_spooled(page),
        }
    }

    fn output_postscript(&mut self, page: &PageRaster) -> Result<Artifact, PrinterError> {
        let mut open = match self.document.take() {
            Some(open) => open,
            None => {
                let front = if self.multipage { "doc" } else { "page" };
                let path = find_next_name(&self.docpath, front, ".ps");
                let file = BufWriter::new(File::create(&path)?);
                let (width, height) = self.paper;
                OpenDocument {
                    document: PsDocument::begin(file, width, height)?,
                    path,
                }
            }
        };

        open.document.write_page(page)?;
        let path = open.path.clone();
        if self.multipage {
            self.document = Some(open);
        } else {
            open.document.finish()?;
        }
        Ok(Artifact::File(path))
    }

    fn output_spooled(&mut self, page: &PageRaster) -> Result<Artifact, PrinterError> {
        let mut job = match self.job.take() {
            Some(job) => job,
            None => {
                let (width, height) = self.paper;
                SpoolJob::start(&self.spooler, width, height)?
            }
        };

        job.write_page(page)?;
        let number = job.pages();
        if self.multipage {
            self.job = Some(job);
        } else {
            job.finish()?;
        }
        Ok(Artifact::Spooled { page: number })
    }

    /// Close an open multipage document or job. Returns the file written,
    /// if any.
    pub fn finish_multipage(&mut self) -> Result<Option<PathBuf>, PrinterError> {
        if let Some(job) = self.job.take() {
            let pages = job.finish()?;
            log::debug!("Print job finished with {} pages", pages);
        }
        match self.document.take() {
            Some(open) => {
                let pages = open.document.pages();
                open.document.finish()?;
                log::debug!("Closed {} ({} pages)", open.path.display(), pages);
                Ok(Some(open.path))
            }
            None => Ok(None),
        }
    }
}

impl Drop for PageOutput {
    fn drop(&mut self) {
        if let Err(e) = self.finish_multipage() {
            log::error!("Unable to finish document: {}", e);
        }
    }
}
