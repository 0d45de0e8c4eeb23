//! Type registry: the introspection facility synthesis runs against
//!
//! The registry is the single source of truth for declared types during an
//! invocation. It is populated once from TOML metadata files, validated, and
//! then only read through the [`TypeIntrospection`] trait.

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use indexmap::IndexMap;
use log::{debug, warn};
use once_cell::sync::Lazy;
use petgraph::{algo::toposort, graph::DiGraph};
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    declarations::TypeDecl,
    types::{TypePath, TypeRef},
};

/// Built-in declarations of the language's root types
const PRELUDE: &str = include_str!("prelude.toml");

/// Binary type names: dotted identifiers, with `$` separating member types
static BINARY_NAME: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[\p{L}_$][\p{L}\p{N}_$]*(\.[\p{L}_$][\p{L}\p{N}_$]*)*$"));

/// Read access to declared types
///
/// Every synthesis stage consumes types through this trait, so any metadata
/// source can back an invocation.
pub trait TypeIntrospection {
    /// Look up a declared type by binary name
    fn lookup(&self, path: &TypePath) -> Option<&TypeDecl>;
}

/// On-disk layout of a metadata file
#[derive(Debug, Deserialize)]
struct MetadataFile {
    #[serde(default)]
    types: Vec<TypeDecl>,
}

/// Insertion-ordered collection of declared types
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<TypePath, TypeDecl>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in root types
    pub fn with_prelude() -> Result<Self> {
        let mut registry = Self::new();
        registry
            .add_toml_str(PRELUDE)
            .context("Failed to load the built-in prelude")?;
        Ok(registry)
    }

    /// Add a declaration, replacing any earlier declaration with the same name
    pub fn insert(&mut self, decl: TypeDecl) -> Result<()> {
        let pattern = BINARY_NAME
            .as_ref()
            .map_err(|e| anyhow!("Invalid binary name pattern: {e}"))?;
        if !pattern.is_match(decl.name.as_str()) {
            bail!("Invalid type name '{}'", decl.name);
        }
        if decl.name.is_primitive() {
            bail!("Primitive type '{}' cannot be declared", decl.name);
        }
        if let Some(previous) = self.types.insert(decl.name.clone(), decl) {
            debug!("Replaced earlier declaration of {}", previous.name);
        }
        Ok(())
    }

    /// Parse a metadata document and add every declaration in it
    pub fn add_toml_str(&mut self, source: &str) -> Result<usize> {
        let file: MetadataFile = toml::from_str(source)?;
        let count = file.types.len();
        for decl in file.types {
            self.insert(decl)?;
        }
        Ok(count)
    }

    /// Load a metadata file from disk
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read type metadata {}", path.display()))?;
        let count = self
            .add_toml_str(&source)
            .with_context(|| format!("Failed to parse type metadata {}", path.display()))?;
        debug!("Loaded {count} declarations from {}", path.display());
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDecl> {
        self.types.values()
    }

    /// Check that the inheritance graph is acyclic
    ///
    /// Supertypes that are not declared in the registry are treated as opaque
    /// leaves and only logged.
    pub fn validate(&self) -> Result<()> {
        let mut graph = DiGraph::<&TypePath, ()>::new();
        let nodes: FxHashMap<&TypePath, _> = self
            .types
            .keys()
            .map(|path| (path, graph.add_node(path)))
            .collect();

        for decl in self.types.values() {
            for supertype in decl.supertypes() {
                let Some(raw) = supertype.raw_path() else {
                    bail!(
                        "Type '{}' has a supertype that is not a class or interface",
                        decl.name
                    );
                };
                match nodes.get(raw) {
                    Some(&target) => {
                        graph.add_edge(nodes[&decl.name], target, ());
                    }
                    None if raw.is_object() => {}
                    None => warn!("Supertype {raw} of {} is not declared", decl.name),
                }
                if let TypeRef::Parameterized { raw, args } = &supertype {
                    if let Some(raw_decl) = self.types.get(raw) {
                        if raw_decl.type_params.len() != args.len() {
                            warn!(
                                "{} passes {} type arguments to {raw}, which declares {}",
                                decl.name,
                                args.len(),
                                raw_decl.type_params.len()
                            );
                        }
                    }
                }
            }
        }

        toposort(&graph, None).map_err(|cycle| {
            anyhow!("Cyclic inheritance involving '{}'", graph[cycle.node_id()])
        })?;
        Ok(())
    }
}

impl TypeIntrospection for TypeRegistry {
    fn lookup(&self, path: &TypePath) -> Option<&TypeDecl> {
        self.types.get(path)
    }
}
