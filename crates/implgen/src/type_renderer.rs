//! Rendering of type references to source text
//!
//! Rendering is a pure function of the reference, the declaring context and
//! the invocation's substitution table. Variables are substituted first, so
//! an ancestor's `T` comes out as whatever the target bound it to.

use log::debug;

use crate::{
    closure::SubstitutionTable,
    declarations::TypeParam,
    error::SynthesisError,
    type_registry::TypeIntrospection,
    types::{BoundKind, TypePath, TypeRef},
};

/// Renders type references for one invocation
#[derive(Clone, Copy)]
pub struct TypeRenderer<'a> {
    types: &'a dyn TypeIntrospection,
    table: &'a SubstitutionTable,
}

impl std::fmt::Debug for TypeRenderer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRenderer")
            .field("bindings", &self.table.len())
            .finish_non_exhaustive()
    }
}

impl<'a> TypeRenderer<'a> {
    pub fn new(types: &'a dyn TypeIntrospection, table: &'a SubstitutionTable) -> Self {
        Self { types, table }
    }

    /// Render `ty` as referenced from a member declared in `owner`
    pub fn render(&self, ty: &TypeRef, owner: &TypePath) -> Result<String, SynthesisError> {
        self.render_resolved(&self.table.resolve(ty), owner)
    }

    /// Render the last parameter of a variadic member as `Component...`
    pub fn render_variadic(&self, ty: &TypeRef, owner: &TypePath) -> Result<String, SynthesisError> {
        match self.table.resolve(ty) {
            TypeRef::Array(component) => Ok(format!("{}...", self.render_resolved(&component, owner)?)),
            other => {
                debug!("Variadic parameter {other:?} in {owner} is not an array");
                self.render_resolved(&other, owner)
            }
        }
    }

    /// Render a list of references joined by `separator`
    pub fn render_list(
        &self,
        types: &[TypeRef],
        separator: &str,
        owner: &TypePath,
    ) -> Result<String, SynthesisError> {
        let rendered = types
            .iter()
            .map(|ty| self.render(ty, owner))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rendered.join(separator))
    }

    /// Render generic parameter declarations, e.g. `<K, V extends Comparable<V>>`
    ///
    /// Returns an empty string when there are no parameters.
    pub fn render_type_params(
        &self,
        params: &[TypeParam],
        owner: &TypePath,
    ) -> Result<String, SynthesisError> {
        if params.is_empty() {
            return Ok(String::new());
        }
        let declarations = params
            .iter()
            .map(|param| {
                if param.has_explicit_bounds() {
                    Ok(format!(
                        "{} extends {}",
                        param.name,
                        self.render_list(&param.bounds, " & ", owner)?
                    ))
                } else {
                    Ok(param.name.clone())
                }
            })
            .collect::<Result<Vec<_>, SynthesisError>>()?;
        Ok(format!("<{}>", declarations.join(", ")))
    }

    /// Render generic parameters as arguments, e.g. `<K, V>`
    pub fn render_type_args(params: &[TypeParam]) -> String {
        if params.is_empty() {
            return String::new();
        }
        let names: Vec<&str> = params.iter().map(|param| param.name.as_str()).collect();
        format!("<{}>", names.join(", "))
    }

    /// Fully qualified source name of a declared type
    ///
    /// Member types are qualified through their enclosing types; a private
    /// type at any level cannot be named from the generated unit.
    pub fn render_named(&self, path: &TypePath, owner: &TypePath) -> Result<String, SynthesisError> {
        let Some(decl) = self.types.lookup(path) else {
            return Ok(path.canonical());
        };
        let Some(enclosing) = decl.enclosing() else {
            return Ok(path.canonical());
        };
        if decl.modifiers.is_private() {
            debug!("{path} referenced from {owner} is private");
            return Err(SynthesisError::InaccessibleMember(path.clone()));
        }
        Ok(format!(
            "{}.{}",
            self.render_named(&enclosing, owner)?,
            decl.simple_name()
        ))
    }

    fn render_resolved(&self, ty: &TypeRef, owner: &TypePath) -> Result<String, SynthesisError> {
        match ty {
            TypeRef::Named(path) => self.render_named(path, owner),
            TypeRef::Array(component) => Ok(format!("{}[]", self.render_resolved(component, owner)?)),
            TypeRef::Variable { name, .. } => Ok(name.clone()),
            TypeRef::Wildcard { kind, bounds } => self.render_wildcard(*kind, bounds, owner),
            TypeRef::Parameterized { raw, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.render_resolved(arg, owner))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!(
                    "{}<{}>",
                    self.render_named(raw, owner)?,
                    args.join(", ")
                ))
            }
        }
    }

    fn render_wildcard(
        &self,
        kind: BoundKind,
        bounds: &[TypeRef],
        owner: &TypePath,
    ) -> Result<String, SynthesisError> {
        let object_only = bounds.len() == 1 && bounds[0].is_object();
        if bounds.is_empty() || kind == BoundKind::Upper && object_only {
            return Ok("?".to_string());
        }
        let keyword = match kind {
            BoundKind::Upper => "extends",
            BoundKind::Lower => "super",
        };
        let bounds = bounds
            .iter()
            .map(|bound| self.render_resolved(bound, owner))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("? {keyword} {}", bounds.join(" & ")))
    }
}
