//! Configuration for implgen
//!
//! Settings are layered, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. `implgen/implgen.toml` in the user configuration directory
//! 3. `implgen.toml` in the working directory
//! 4. an explicitly named configuration file
//! 5. `IMPLGEN_COMPILER` and `IMPLGEN_CLASSPATH` from the environment
//! 6. command-line flags, applied by the caller as a final overlay

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use etcetera::{BaseStrategy, choose_base_strategy};
use log::debug;
use serde::Deserialize;

/// File name looked up in the configuration directories
pub const CONFIG_FILE_NAME: &str = "implgen.toml";

/// Environment variable naming the compiler executable
pub const COMPILER_ENV: &str = "IMPLGEN_COMPILER";

/// Environment variable holding extra classpath entries
pub const CLASSPATH_ENV: &str = "IMPLGEN_CLASSPATH";

/// Effective settings of an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Appended to the target's simple name to form the generated type's name
    pub impl_suffix: String,
    pub source_extension: String,
    pub compiled_extension: String,
    /// Write non-ASCII characters as `\uXXXX` escapes
    pub escape_unicode: bool,
    pub compiler: String,
    pub compiler_args: Vec<String>,
    pub classpath: Vec<PathBuf>,
    /// Include the built-in declarations of the root types
    pub prelude: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            impl_suffix: "Impl".to_owned(),
            source_extension: "java".to_owned(),
            compiled_extension: "class".to_owned(),
            escape_unicode: true,
            compiler: "javac".to_owned(),
            compiler_args: Vec::new(),
            classpath: Vec::new(),
            prelude: true,
        }
    }
}

/// A partial set of settings from one configuration layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigOverlay {
    pub impl_suffix: Option<String>,
    pub source_extension: Option<String>,
    pub compiled_extension: Option<String>,
    pub escape_unicode: Option<bool>,
    pub compiler: Option<String>,
    pub compiler_args: Option<Vec<String>>,
    pub classpath: Option<Vec<PathBuf>>,
    pub prelude: Option<bool>,
}

impl ConfigOverlay {
    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&source)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Settings taken from the environment
    pub fn from_env() -> Self {
        let compiler = env::var(COMPILER_ENV).ok().filter(|value| !value.is_empty());
        let classpath = env::var_os(CLASSPATH_ENV)
            .filter(|value| !value.is_empty())
            .map(|value| env::split_paths(&value).collect());
        Self {
            compiler,
            classpath,
            ..Self::default()
        }
    }
}

impl Config {
    /// Load the layered configuration, ending with an optional explicit file
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let implicit = Self::user_config_path()
            .into_iter()
            .chain(std::iter::once(PathBuf::from(CONFIG_FILE_NAME)));
        for path in implicit.filter(|path| path.is_file()) {
            debug!("Loading config from {}", path.display());
            config.apply(ConfigOverlay::from_file(&path)?);
        }

        if let Some(path) = explicit {
            debug!("Loading config from {}", path.display());
            config.apply(ConfigOverlay::from_file(path)?);
        }

        config.apply(ConfigOverlay::from_env());
        Ok(config)
    }

    /// `implgen/implgen.toml` under the platform's configuration directory
    pub fn user_config_path() -> Option<PathBuf> {
        let strategy = choose_base_strategy().ok()?;
        Some(strategy.config_dir().join("implgen").join(CONFIG_FILE_NAME))
    }

    /// Apply an overlay on top of the current settings
    ///
    /// Classpath entries accumulate across layers; every other setting is
    /// replaced.
    pub fn apply(&mut self, overlay: ConfigOverlay) {
        if let Some(impl_suffix) = overlay.impl_suffix {
            self.impl_suffix = impl_suffix;
        }
        if let Some(source_extension) = overlay.source_extension {
            self.source_extension = source_extension;
        }
        if let Some(compiled_extension) = overlay.compiled_extension {
            self.compiled_extension = compiled_extension;
        }
        if let Some(escape_unicode) = overlay.escape_unicode {
            self.escape_unicode = escape_unicode;
        }
        if let Some(compiler) = overlay.compiler {
            self.compiler = compiler;
        }
        if let Some(compiler_args) = overlay.compiler_args {
            self.compiler_args = compiler_args;
        }
        if let Some(classpath) = overlay.classpath {
            self.classpath.extend(classpath);
        }
        if let Some(prelude) = overlay.prelude {
            self.prelude = prelude;
        }
    }
}
