//! Build and package driver
//!
//! Compiles an emitted unit with an external [`Compiler`] and stores the
//! compiled unit in an archive through an [`ArchiveFormat`]. A partially
//! written archive is removed before any fault propagates.

use std::{
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::{error::ImplError, scoped_file::ScopedFile, types::TypePath};

pub mod archiver;
pub mod compiler;

pub use archiver::{ArchiveFormat, Archiver, TarArchiver, TarFormat};
pub use compiler::{Compiler, ExternalCompiler};

const COPY_BUFFER_SIZE: usize = 8 * 1024;

/// What to compile and where to put the result
#[derive(Debug, Clone, Copy)]
pub struct PackageRequest<'a> {
    pub target: &'a TypePath,
    /// Emitted source file
    pub source: &'a Path,
    /// Compiled unit the compiler leaves next to `source`
    pub compiled: &'a Path,
    pub classpath: &'a [PathBuf],
    /// Archive entry name, `/`-separated
    pub entry: &'a str,
    pub archive: &'a Path,
}

/// Drives the compiler and archiver for one invocation
pub struct PackageDriver<'a> {
    compiler: &'a dyn Compiler,
    format: &'a dyn ArchiveFormat,
}

impl std::fmt::Debug for PackageDriver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageDriver").finish_non_exhaustive()
    }
}

impl<'a> PackageDriver<'a> {
    pub fn new(compiler: &'a dyn Compiler, format: &'a dyn ArchiveFormat) -> Self {
        Self { compiler, format }
    }

    /// Compile the unit and archive it, returning the archive path
    pub fn package(&self, request: &PackageRequest<'_>) -> Result<PathBuf, ImplError> {
        let type_name = request.target.canonical();

        info!("Compiling {}", request.source.display());
        let exit_code = self
            .compiler
            .compile(request.source, request.classpath)
            .map_err(|err| ImplError::CompilationFailed {
                type_name: type_name.clone(),
                detail: format!("failed to run the compiler: {err}"),
            })?;
        if exit_code != 0 {
            return Err(ImplError::CompilationFailed {
                type_name,
                detail: format!("compiler exited with status {exit_code}"),
            });
        }

        info!("Archiving {} into {}", request.entry, request.archive.display());
        let packaging_failed = |source: io::Error| ImplError::PackagingFailed {
            type_name: type_name.clone(),
            source,
        };
        let (guard, file) = ScopedFile::create(request.archive).map_err(packaging_failed)?;
        self.write_archive(file, request)
            .map_err(packaging_failed)?;
        Ok(guard.keep())
    }

    fn write_archive(&self, file: File, request: &PackageRequest<'_>) -> io::Result<()> {
        let mut compiled = File::open(request.compiled)?;
        let mut archiver = self.format.open(file)?;
        archiver.open_entry(request.entry)?;

        let mut buffer = [0u8; COPY_BUFFER_SIZE];
        let mut copied = 0;
        loop {
            let read = compiled.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            archiver.write(&buffer[..read])?;
            copied += read;
        }
        debug!("Copied {copied} bytes of {}", request.compiled.display());

        archiver.close_entry()?;
        archiver.finish()
    }
}
