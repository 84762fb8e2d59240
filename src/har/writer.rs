//! Streaming HAR file writer

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use super::model::{Creator, Entry};
use crate::{AkitaError, Result};

/// Writes HAR entries one at a time.
///
/// The log header is written on creation and the closing brackets on
/// [`HarWriter::close`], so the output only parses as a HAR document once
/// closed. Every entry is flushed as it is written.
pub struct HarWriter<W: Write = BufWriter<File>> {
    target: String,
    out: Option<W>,
    entry_count: usize,
}

impl HarWriter {
    /// Create a new HAR file, truncating any existing one
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be created or the header written
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        HarWriter::with_target(BufWriter::new(file), path.display().to_string())
    }
}

impl<W: Write> HarWriter<W> {
    /// Write HAR output to an arbitrary sink
    ///
    /// # Errors
    ///
    /// Returns error if the header cannot be written
    pub fn from_writer(out: W) -> Result<Self> {
        Self::with_target(out, "<writer>".to_string())
    }

    fn with_target(mut out: W, target: String) -> Result<Self> {
        let creator = serde_json::to_string(&Creator::default())?;
        write!(
            out,
            "{{\"log\":{{\"version\":\"{}\",\"creator\":{creator},\"entries\":[",
            super::HAR_VERSION
        )?;
        out.flush()?;

        info!("Opened HAR output: {target}");

        Ok(Self {
            target,
            out: Some(out),
            entry_count: 0,
        })
    }

    /// Append an entry
    ///
    /// # Errors
    ///
    /// Returns error if the writer is closed or the write fails
    pub fn write_entry(&mut self, entry: &Entry) -> Result<()> {
        let out = self.out.as_mut().ok_or(AkitaError::WriterClosed)?;

        // Separator and entry in a single write
        let mut chunk = Vec::new();
        if self.entry_count > 0 {
            chunk.push(b',');
        }
        serde_json::to_writer(&mut chunk, entry)?;
        out.write_all(&chunk)?;
        out.flush()?;

        self.entry_count += 1;
        debug!("Wrote HAR entry {} to {}", self.entry_count, self.target);

        Ok(())
    }

    /// Number of entries written so far
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Path or description of the output
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Whether [`HarWriter::close`] has already run
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.out.is_none()
    }

    /// Terminate the document and flush it. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns error if the final write or flush fails
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut out) = self.out.take() {
            out.write_all(b"]}}")?;
            out.flush()?;
            info!(
                "Closed HAR output {} ({} entries)",
                self.target, self.entry_count
            );
        }
        Ok(())
    }
}

impl<W: Write> Drop for HarWriter<W> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close HAR output {}: {e}", self.target);
        }
    }
}
