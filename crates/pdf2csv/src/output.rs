//! Atomic file output.
//!
//! Data is written to a temporary file next to the destination and renamed
//! onto it only by [`AtomicOutput::commit`]. Dropping an uncommitted output
//! deletes the temporary file, so a failed run never leaves a partial file
//! at the requested path.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// A file that appears at its destination only once complete.
#[derive(Debug)]
pub struct AtomicOutput {
    file: BufWriter<NamedTempFile>,
    dest: PathBuf,
}

impl AtomicOutput {
    /// Start writing `dest` through a temporary file in the same directory.
    pub fn create(dest: impl AsRef<Path>) -> io::Result<Self> {
        let dest = dest.as_ref().to_path_buf();
        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let tmp = tempfile::Builder::new()
            .prefix(".pdf2csv-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        Ok(Self {
            file: BufWriter::new(tmp),
            dest,
        })
    }

    /// Flush and move the data into place.
    pub fn commit(self) -> io::Result<()> {
        let tmp = self.file.into_inner().map_err(|e| e.into_error())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.dest).map_err(|e| e.error)?;
        tracing::debug!(path = %self.dest.display(), "output committed");
        Ok(())
    }
}

impl Write for AtomicOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Write `data` to `path` atomically.
pub fn write_atomic(path: impl AsRef<Path>, data: &[u8]) -> io::Result<()> {
    let mut out = AtomicOutput::create(path)?;
    out.write_all(data)?;
    out.commit()
}
