//! # Native Print Spooler
//!
//! Sends pages to a real printer by piping PostScript into the configured
//! spooler command (`lpr` by default). One spooler process is one print
//! job; in multipage mode the job stays open until the document is
//! finished.

use std::process::{Child, ChildStdin, Command, Stdio};

use crate::error::PrinterError;
use crate::render::raster::PageRaster;

use super::postscript::PsDocument;

/// # Spool Job
///
/// A running spooler process with a PostScript document on its stdin.
pub struct SpoolJob {
    child: Child,
    document: PsDocument<ChildStdin>,
}

impl SpoolJob {
    /// Start `command` (program and whitespace-separated arguments).
    pub fn start(command: &str, width: f64, height: f64) -> Result<Self, PrinterError> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| PrinterError::Spooler("no spooler command configured".into()))?;

        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| PrinterError::Spooler(format!("cannot start '{}': {}", command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PrinterError::Spooler(format!("'{}' has no stdin", command)))?;

        log::debug!("Started print job with '{}'", command);
        Ok(Self {
            child,
            document: PsDocument::begin(stdin, width, height)?,
        })
    }

    pub fn write_page(&mut self, page: &PageRaster) -> Result<(), PrinterError> {
        self.document.write_page(page)
    }

    pub fn pages(&self) -> u32 {
        self.document.pages()
    }

    /// Close the document and wait for the spooler to accept it.
    pub fn finish(mut self) -> Result<u32, PrinterError> {
        let pages = self.document.pages();
        // Dropping stdin signals end of job.
        drop(self.document.finish()?);
        let status = self.child.wait()?;
        if !status.success() {
            return Err(PrinterError::Spooler(format!("spooler exited with {}", status)));
        }
        Ok(pages)
    }
}
