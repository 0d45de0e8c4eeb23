use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use implgen::{
    Config, Implementor, TypeRegistry,
    config::ConfigOverlay,
    types::TypeRef,
};
use log::{debug, info};

/// Generate stub implementations of JVM classes and interfaces
#[derive(Parser, Debug)]
#[command(name = "implgen", version, about, long_about = None)]
struct Cli {
    /// Binary names of the types to implement, e.g. `com.acme.Outer$Api`
    #[arg(required = true, value_name = "TYPE")]
    targets: Vec<String>,

    /// Type metadata files (TOML)
    #[arg(short, long = "types", value_name = "FILE", required = true)]
    types: Vec<PathBuf>,

    /// Root directory for generated sources
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,

    /// Compile the implementation and pack it into this archive
    #[arg(short, long, value_name = "FILE", conflicts_with = "output")]
    archive: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Suffix appended to the name of each generated type
    #[arg(long, value_name = "SUFFIX")]
    suffix: Option<String>,

    /// Compiler executable used with --archive
    #[arg(long, value_name = "PROGRAM")]
    compiler: Option<String>,

    /// Extra classpath entries for the compiler
    #[arg(long, value_name = "PATH")]
    classpath: Vec<PathBuf>,

    /// Do not declare java.lang.Object and java.lang.Enum implicitly
    #[arg(long)]
    no_prelude: bool,

    /// Write non-ASCII characters as-is instead of \uXXXX escapes
    #[arg(long)]
    raw_unicode: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overlay(&self) -> ConfigOverlay {
        ConfigOverlay {
            impl_suffix: self.suffix.clone(),
            compiler: self.compiler.clone(),
            classpath: (!self.classpath.is_empty()).then(|| self.classpath.clone()),
            prelude: self.no_prelude.then_some(false),
            escape_unicode: self.raw_unicode.then_some(false),
            ..ConfigOverlay::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply(cli.overlay());
    debug!("Effective configuration: {config:?}");

    let mut registry = if config.prelude {
        TypeRegistry::with_prelude()?
    } else {
        TypeRegistry::new()
    };
    for path in &cli.types {
        registry.load_file(path)?;
    }
    registry
        .validate()
        .context("Failed to validate type metadata")?;
    info!("Loaded {} type declarations", registry.len());

    let tokens: Vec<TypeRef> = cli.targets.iter().map(|name| TypeRef::named(name.as_str())).collect();
    let implementor = Implementor::new(&registry, &config);

    if let Some(archive) = &cli.archive {
        let [token] = tokens.as_slice() else {
            bail!("--archive packages exactly one type, got {}", tokens.len());
        };
        let written = implementor.implement_archive(token, archive)?;
        info!("Packaged {}", written.display());
    } else {
        let written = implementor.implement_all(&tokens, &cli.output)?;
        for path in written {
            info!("Generated {}", path.display());
        }
    }
    Ok(())
}
