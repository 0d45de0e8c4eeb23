//! Compiler collaborator

use std::{
    env, io,
    path::{Path, PathBuf},
    process::Command,
};

use log::debug;

/// Compiles a single generated source file in place
pub trait Compiler {
    /// Compile `source` against `classpath`, returning the compiler's exit code
    ///
    /// An `Err` means the compiler could not be run at all.
    fn compile(&self, source: &Path, classpath: &[PathBuf]) -> io::Result<i32>;
}

/// An external compiler executable, `javac` by default
#[derive(Debug, Clone)]
pub struct ExternalCompiler {
    program: String,
    args: Vec<String>,
}

impl ExternalCompiler {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for ExternalCompiler {
    fn default() -> Self {
        Self::new("javac", Vec::new())
    }
}

impl Compiler for ExternalCompiler {
    fn compile(&self, source: &Path, classpath: &[PathBuf]) -> io::Result<i32> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if !classpath.is_empty() {
            let joined = env::join_paths(classpath)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
            cmd.arg("-cp").arg(joined);
        }
        cmd.arg(source);

        debug!("Running {cmd:?}");
        let status = cmd.status()?;
        // Killed by a signal
        Ok(status.code().unwrap_or(-1))
    }
}
