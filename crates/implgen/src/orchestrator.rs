//! Entry points: implement a type as source, or as a packaged archive
//!
//! An invocation runs closure, resolution, emission and (optionally)
//! packaging start to finish on the calling thread. Targets are validated
//! before any file is touched, members are resolved before the output file
//! is opened, and the output file only survives a fully successful emission.

use std::path::{Path, PathBuf};

use cow_utils::CowUtils;
use log::{debug, info, warn};
use rustc_hash::FxHashSet;

use crate::{
    closure::build_closure,
    code_generator::{OutputUnit, SourceEmitter},
    config::Config,
    declarations::{TypeDecl, TypeKind},
    error::{ImplError, SynthesisError},
    member_resolver::resolve_members,
    packager::{
        ArchiveFormat, Compiler, ExternalCompiler, PackageDriver, PackageRequest, TarFormat,
    },
    type_registry::TypeIntrospection,
    types::{TypePath, TypeRef},
};

const ENUM: &str = "java.lang.Enum";

/// Generates stub implementations of declared types
pub struct Implementor<'a> {
    types: &'a dyn TypeIntrospection,
    config: &'a Config,
}

impl std::fmt::Debug for Implementor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Implementor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'a> Implementor<'a> {
    pub fn new(types: &'a dyn TypeIntrospection, config: &'a Config) -> Self {
        Self { types, config }
    }

    /// Write the implementation of `token` under `root`, returning its path
    ///
    /// The file lands at `<root>/<package path>/<Simple><suffix>.<ext>`; an
    /// existing file there is overwritten.
    pub fn implement(&self, token: &TypeRef, root: &Path) -> Result<PathBuf, ImplError> {
        let target = self.validate_target(token)?;
        info!("Implementing {}", target.name);
        let fault = |err: SynthesisError| err.into_impl_error(&target.name);

        let table = build_closure(target, self.types);
        let members = resolve_members(target, self.types, &table).map_err(fault)?;

        let path = self.source_path(target, root);
        let emitter = SourceEmitter::new(target, self.types, &table, &self.config.impl_suffix);
        let mut unit = OutputUnit::create(&path, self.config.escape_unicode)
            .map_err(|err| fault(err.into()))?;
        emitter.emit(&members, &mut unit).map_err(fault)?;
        let written = unit.commit().map_err(|err| fault(err.into()))?;

        info!("Wrote {}", written.display());
        Ok(written)
    }

    /// Implement several targets into one root, stopping at the first failure
    ///
    /// Units written before the failure are complete and stay in place.
    pub fn implement_all(&self, tokens: &[TypeRef], root: &Path) -> Result<Vec<PathBuf>, ImplError> {
        tokens.iter().map(|token| self.implement(token, root)).collect()
    }

    /// Implement `token`, compile it with the configured compiler and store the
    /// compiled unit in a tar archive at `archive`
    pub fn implement_archive(&self, token: &TypeRef, archive: &Path) -> Result<PathBuf, ImplError> {
        let compiler = ExternalCompiler::new(&self.config.compiler, self.config.compiler_args.clone());
        self.implement_archive_with(token, archive, &compiler, &TarFormat)
    }

    /// [`Self::implement_archive`] with explicit collaborators
    pub fn implement_archive_with(
        &self,
        token: &TypeRef,
        archive: &Path,
        compiler: &dyn Compiler,
        format: &dyn ArchiveFormat,
    ) -> Result<PathBuf, ImplError> {
        let target = self.validate_target(token)?;
        let temp = tempfile::Builder::new()
            .prefix("implgen-")
            .tempdir()
            .map_err(|source| ImplError::IoFailure {
                type_name: target.name.canonical(),
                source,
            })?;
        debug!("Building in {}", temp.path().display());

        let result = self.package_in(token, target, temp.path(), archive, compiler, format);

        let temp_path = temp.path().to_path_buf();
        if let Err(err) = temp.close() {
            warn!(
                "Failed to remove temporary directory {}: {err}",
                temp_path.display()
            );
        }
        result
    }

    fn package_in(
        &self,
        token: &TypeRef,
        target: &TypeDecl,
        temp_root: &Path,
        archive: &Path,
        compiler: &dyn Compiler,
        format: &dyn ArchiveFormat,
    ) -> Result<PathBuf, ImplError> {
        let source = self.implement(token, temp_root)?;
        let compiled = source.with_extension(&self.config.compiled_extension);

        let mut classpath = vec![temp_root.to_path_buf()];
        classpath.extend(self.config.classpath.iter().cloned());
        for entry in self.declared_classpath(target) {
            if !classpath.contains(&entry) {
                classpath.push(entry);
            }
        }

        let entry = self.archive_entry(target);
        PackageDriver::new(compiler, format).package(&PackageRequest {
            target: &target.name,
            source: &source,
            compiled: &compiled,
            classpath: &classpath,
            entry: &entry,
            archive,
        })
    }

    /// Location of the generated source for `target` under `root`
    pub fn source_path(&self, target: &TypeDecl, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        if !target.package().is_empty() {
            path.extend(target.package().split('.'));
        }
        path.push(format!(
            "{}.{}",
            self.impl_name(target),
            self.config.source_extension
        ));
        path
    }

    /// `/`-separated archive entry of the compiled implementation
    pub fn archive_entry(&self, target: &TypeDecl) -> String {
        let file_name = format!(
            "{}.{}",
            self.impl_name(target),
            self.config.compiled_extension
        );
        if target.package().is_empty() {
            file_name
        } else {
            format!("{}/{file_name}", target.package().cow_replace('.', "/"))
        }
    }

    fn impl_name(&self, target: &TypeDecl) -> String {
        format!("{}{}", target.simple_name(), self.config.impl_suffix)
    }

    /// Reject tokens that cannot be implemented, before any I/O happens
    fn validate_target(&self, token: &TypeRef) -> Result<&'a TypeDecl, ImplError> {
        let path = match token {
            TypeRef::Named(path) => path,
            TypeRef::Array(_) => {
                return Err(ImplError::invalid_target(token_name(token), "array type"));
            }
            _ => {
                return Err(ImplError::invalid_target(
                    token_name(token),
                    "not a class or interface",
                ));
            }
        };
        let invalid = |reason: &str| ImplError::invalid_target(path.canonical(), reason);

        if path.is_empty() {
            return Err(invalid("empty type name"));
        }
        if path.is_primitive() {
            return Err(invalid("primitive type"));
        }
        let Some(target) = self.types.lookup(path) else {
            return Err(invalid("unknown type"));
        };
        if target.kind == TypeKind::Enum || path.as_str() == ENUM {
            return Err(invalid("enum type"));
        }
        if !target.is_interface() && target.modifiers.is_final() {
            return Err(invalid("final class"));
        }
        if target.modifiers.is_private() {
            return Err(invalid("private member type"));
        }
        Ok(target)
    }

    /// Classpath entries recorded on the target and its ancestors
    fn declared_classpath(&self, target: &TypeDecl) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = Vec::new();
        let mut visited: FxHashSet<TypePath> = FxHashSet::default();
        let mut pending = vec![target];
        while let Some(decl) = pending.pop() {
            if !visited.insert(decl.name.clone()) {
                continue;
            }
            if let Some(entry) = &decl.classpath
                && !entries.contains(entry)
            {
                entries.push(entry.clone());
            }
            for supertype in decl.supertypes() {
                if let Some(parent) = supertype.raw_path().and_then(|raw| self.types.lookup(raw)) {
                    pending.push(parent);
                }
            }
        }
        entries
    }
}

/// Readable name of a type token for diagnostics
fn token_name(token: &TypeRef) -> String {
    match token {
        TypeRef::Named(path) => path.canonical(),
        TypeRef::Array(component) => format!("{}[]", token_name(component)),
        TypeRef::Variable { name, .. } => name.clone(),
        TypeRef::Wildcard { .. } => "?".to_owned(),
        TypeRef::Parameterized { raw, .. } => raw.canonical(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{type_registry::TypeRegistry, types::Modifiers};

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::with_prelude().expect("prelude");
        registry
            .insert(TypeDecl::class("p.Sealed", Modifiers::PUBLIC | Modifiers::FINAL))
            .expect("valid");
        registry
            .insert(TypeDecl::new("p.Color", TypeKind::Enum, Modifiers::PUBLIC))
            .expect("valid");
        registry
            .insert(TypeDecl::class("p.Outer$Secret", Modifiers::PRIVATE | Modifiers::STATIC))
            .expect("valid");
        registry
            .insert(TypeDecl::interface("p.Api"))
            .expect("valid");
        registry
    }

    fn reason(result: Result<&TypeDecl, ImplError>) -> String {
        match result {
            Err(ImplError::InvalidTarget { reason, .. }) => reason,
            other => panic!("expected an invalid target, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_targets_are_rejected() {
        let registry = registry();
        let config = Config::default();
        let implementor = Implementor::new(&registry, &config);

        let cases = [
            (TypeRef::named(""), "empty type name"),
            (TypeRef::named("int"), "primitive type"),
            (TypeRef::array(TypeRef::named("p.Api")), "array type"),
            (
                TypeRef::parameterized("p.Api", vec![TypeRef::object()]),
                "not a class or interface",
            ),
            (TypeRef::named("p.Missing"), "unknown type"),
            (TypeRef::named("p.Color"), "enum type"),
            (TypeRef::named("java.lang.Enum"), "enum type"),
            (TypeRef::named("p.Sealed"), "final class"),
            (TypeRef::named("p.Outer$Secret"), "private member type"),
        ];
        for (token, expected) in cases {
            assert_eq!(reason(implementor.validate_target(&token)), expected);
        }
        assert!(implementor.validate_target(&TypeRef::named("p.Api")).is_ok());
    }

    #[test]
    fn test_output_locations() {
        let registry = registry();
        let config = Config::default();
        let implementor = Implementor::new(&registry, &config);
        let api = registry.lookup(&TypePath::new("p.Api")).expect("declared");
        let nested = TypeDecl::interface("com.acme.Outer$Inner");
        let top = TypeDecl::interface("Plain");

        assert_eq!(
            implementor.source_path(api, Path::new("out")),
            Path::new("out").join("p").join("ApiImpl.java")
        );
        assert_eq!(
            implementor.source_path(&nested, Path::new("out")),
            Path::new("out").join("com").join("acme").join("InnerImpl.java")
        );
        assert_eq!(implementor.archive_entry(&nested), "com/acme/InnerImpl.class");
        assert_eq!(implementor.archive_entry(&top), "PlainImpl.class");
    }

    #[test]
    fn test_declared_classpath_follows_ancestors() {
        let mut registry = TypeRegistry::new();
        let mut base = TypeDecl::interface("p.Base");
        base.classpath = Some(PathBuf::from("lib/base.jar"));
        registry.insert(base).expect("valid");
        let mut api = TypeDecl::interface("p.Api").implementing(TypeRef::named("p.Base"));
        api.classpath = Some(PathBuf::from("lib/api.jar"));
        registry.insert(api).expect("valid");

        let config = Config::default();
        let implementor = Implementor::new(&registry, &config);
        let api = registry.lookup(&TypePath::new("p.Api")).expect("declared");
        assert_eq!(
            implementor.declared_classpath(api),
            vec![PathBuf::from("lib/api.jar"), PathBuf::from("lib/base.jar")]
        );
    }
}
