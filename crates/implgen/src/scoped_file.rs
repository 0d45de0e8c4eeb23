//! Scoped ownership of files created during an invocation
//!
//! A [`ScopedFile`] deletes its file on drop unless it has been kept, along
//! with any directories it had to create that are empty by then. Cleanup
//! failures are logged and never surface as errors.

use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use log::{debug, warn};

/// Drop guard for a file this invocation created
#[must_use = "ScopedFile must be held in scope until the file is committed"]
#[derive(Debug)]
pub struct ScopedFile {
    path: PathBuf,
    /// Directories created for the file, innermost first
    created_dirs: Vec<PathBuf>,
    armed: bool,
}

impl ScopedFile {
    /// Create (or truncate) `path`, creating missing parent directories
    pub fn create(path: &Path) -> io::Result<(Self, File)> {
        let mut created_dirs = Vec::new();
        let mut ancestor = path.parent();
        while let Some(dir) = ancestor {
            if dir.as_os_str().is_empty() || dir.exists() {
                break;
            }
            created_dirs.push(dir.to_path_buf());
            ancestor = dir.parent();
        }

        let guard = Self {
            path: path.to_path_buf(),
            created_dirs,
            armed: true,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok((guard, file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the file: it is no longer removed on drop
    pub fn keep(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ScopedFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed {}", self.path.display()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!("Failed to remove {}: {err}", self.path.display()),
        }
        for dir in &self.created_dirs {
            // Stops at the first directory something else has written into
            if fs::remove_dir(dir).is_err() {
                break;
            }
        }
    }
}
