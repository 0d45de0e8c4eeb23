//! Incrementally written compilation unit backed by a scoped file

use std::{
    fmt::Write as _,
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::scoped_file::ScopedFile;

/// Destination of emitted source text
pub trait UnitWriter {
    fn write_text(&mut self, text: &str) -> io::Result<()>;
}

impl UnitWriter for String {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.push_str(text);
        Ok(())
    }
}

/// A generated source file that is removed again unless committed
#[derive(Debug)]
pub struct OutputUnit {
    writer: BufWriter<File>,
    guard: ScopedFile,
    escape_unicode: bool,
}

impl OutputUnit {
    /// Create (or truncate) the unit at `path`
    pub fn create(path: &Path, escape_unicode: bool) -> io::Result<Self> {
        let (guard, file) = ScopedFile::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            guard,
            escape_unicode,
        })
    }

    pub fn path(&self) -> &Path {
        self.guard.path()
    }

    /// Flush the buffered text and keep the file
    pub fn commit(self) -> io::Result<PathBuf> {
        let Self {
            mut writer, guard, ..
        } = self;
        writer.flush()?;
        drop(writer);
        Ok(guard.keep())
    }
}

impl UnitWriter for OutputUnit {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        if self.escape_unicode && !text.is_ascii() {
            self.writer.write_all(escape_non_ascii(text).as_bytes())
        } else {
            self.writer.write_all(text.as_bytes())
        }
    }
}

/// Spell every non-ASCII character as `\uXXXX` UTF-16 code units
pub fn escape_non_ascii(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut units = [0u16; 2];
    for ch in text.chars() {
        if ch.is_ascii() {
            escaped.push(ch);
        } else {
            for unit in ch.encode_utf16(&mut units) {
                let _ = write!(escaped, "\\u{unit:04X}");
            }
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_escape_non_ascii() {
        assert_eq!(escape_non_ascii("plain"), "plain");
        assert_eq!(escape_non_ascii("Größe"), "Gr\\u00F6\\u00DFe");
        assert_eq!(escape_non_ascii("𝔸"), "\\uD835\\uDD38");
    }

    #[test]
    fn test_uncommitted_unit_is_removed() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("p/DraftImpl.java");
        {
            let mut unit = OutputUnit::create(&path, true).expect("created");
            unit.write_text("package p;\n").expect("written");
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_committed_unit_is_escaped() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("Café.java");
        let mut unit = OutputUnit::create(&path, true).expect("created");
        unit.write_text("class Café {}\n").expect("written");
        assert_eq!(unit.commit().expect("committed"), path);
        assert_eq!(
            fs::read_to_string(&path).expect("readable"),
            "class Caf\\u00E9 {}\n"
        );
    }
}
