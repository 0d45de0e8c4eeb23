//! Archiver collaborator and the tar archive format

use std::{
    fs::File,
    io::{self, BufWriter, Write},
};

use log::trace;

/// Writes entries into an open archive
pub trait Archiver {
    /// Start a new entry at `path`, using `/` separators
    fn open_entry(&mut self, path: &str) -> io::Result<()>;

    /// Append bytes to the open entry
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    fn close_entry(&mut self) -> io::Result<()>;

    /// Complete the archive and flush it to its file
    fn finish(self: Box<Self>) -> io::Result<()>;
}

/// Factory for archivers of one format
pub trait ArchiveFormat {
    fn open(&self, file: File) -> io::Result<Box<dyn Archiver>>;
}

/// Uncompressed tar archives
#[derive(Debug, Clone, Copy, Default)]
pub struct TarFormat;

impl ArchiveFormat for TarFormat {
    fn open(&self, file: File) -> io::Result<Box<dyn Archiver>> {
        Ok(Box::new(TarArchiver::new(BufWriter::new(file))))
    }
}

/// Entry being assembled; tar needs the size before the data
#[derive(Debug)]
struct PendingEntry {
    path: String,
    data: Vec<u8>,
}

pub struct TarArchiver<W: Write> {
    builder: tar::Builder<W>,
    pending: Option<PendingEntry>,
}

impl<W: Write> std::fmt::Debug for TarArchiver<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TarArchiver")
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl<W: Write> TarArchiver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            builder: tar::Builder::new(writer),
            pending: None,
        }
    }

    fn no_open_entry() -> io::Error {
        io::Error::other("no archive entry is open")
    }
}

impl<W: Write> Archiver for TarArchiver<W> {
    fn open_entry(&mut self, path: &str) -> io::Result<()> {
        if let Some(pending) = &self.pending {
            return Err(io::Error::other(format!(
                "archive entry {} is still open",
                pending.path
            )));
        }
        trace!("Opening archive entry {path}");
        self.pending = Some(PendingEntry {
            path: path.to_owned(),
            data: Vec::new(),
        });
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let pending = self.pending.as_mut().ok_or_else(Self::no_open_entry)?;
        pending.data.extend_from_slice(bytes);
        Ok(())
    }

    fn close_entry(&mut self) -> io::Result<()> {
        let pending = self.pending.take().ok_or_else(Self::no_open_entry)?;
        let mut header = tar::Header::new_gnu();
        header.set_size(pending.data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_cksum();
        self.builder
            .append_data(&mut header, &pending.path, pending.data.as_slice())
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        let this = *self;
        if let Some(pending) = this.pending {
            return Err(io::Error::other(format!(
                "archive entry {} was never closed",
                pending.path
            )));
        }
        let mut writer = this.builder.into_inner()?;
        writer.flush()
    }
}
