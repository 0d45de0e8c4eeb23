//! Declared types and their members
//!
//! These are the records a type-introspection facility hands to the
//! synthesis stages. They are deserialized from metadata files and never
//! mutated after the registry has been validated.

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{Modifiers, OBJECT, TypePath, TypeRef, VarOwner};

/// Kind of a declared type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
}

impl TypeKind {
    /// Annotations are interfaces as far as implementing them goes
    pub fn is_interface(self) -> bool {
        matches!(self, Self::Interface | Self::Annotation)
    }
}

/// A declared generic parameter, e.g. `T extends Comparable<T>`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TypeParam {
    pub name: String,
    #[serde(default)]
    pub bounds: Vec<TypeRef>,
}

impl TypeParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
        }
    }

    pub fn bounded(name: impl Into<String>, bounds: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            bounds,
        }
    }

    /// Whether the parameter has a bound worth spelling out
    pub fn has_explicit_bounds(&self) -> bool {
        !(self.bounds.is_empty() || self.bounds.len() == 1 && self.bounds[0].is_object())
    }
}

/// A declared constructor
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConstructorDecl {
    pub modifiers: Modifiers,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<TypeRef>,
    pub throws: Vec<TypeRef>,
    pub varargs: bool,
}

/// A declared method
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub type_params: Vec<TypeParam>,
    #[serde(default)]
    pub params: Vec<TypeRef>,
    #[serde(default = "TypeRef::void")]
    pub returns: TypeRef,
    #[serde(default)]
    pub throws: Vec<TypeRef>,
    #[serde(default)]
    pub varargs: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub synthetic: bool,
    #[serde(default)]
    pub bridge: bool,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            name: name.into(),
            modifiers,
            type_params: Vec::new(),
            params: Vec::new(),
            returns: TypeRef::void(),
            throws: Vec::new(),
            varargs: false,
            deprecated: false,
            synthetic: false,
            bridge: false,
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: Vec<TypeRef>) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn returning(mut self, returns: TypeRef) -> Self {
        self.returns = returns;
        self
    }

    #[must_use]
    pub fn throwing(mut self, throws: Vec<TypeRef>) -> Self {
        self.throws = throws;
        self
    }

    #[must_use]
    pub fn with_type_params(mut self, type_params: Vec<TypeParam>) -> Self {
        self.type_params = type_params;
        self
    }

    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.varargs = true;
        self
    }

    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Position of a method-scoped generic variable among this method's parameters
    pub fn type_param_index(&self, name: &str) -> Option<usize> {
        self.type_params.iter().position(|param| param.name == name)
    }
}

/// A declared class, interface, enum or annotation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TypeDecl {
    pub name: TypePath,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub type_params: Vec<TypeParam>,
    #[serde(default)]
    pub superclass: Option<TypeRef>,
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub constructors: Vec<ConstructorDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    /// Classpath entry holding the compiled form of this type
    #[serde(default)]
    pub classpath: Option<PathBuf>,
}

impl TypeDecl {
    pub fn class(name: impl Into<String>, modifiers: Modifiers) -> Self {
        Self::new(name, TypeKind::Class, modifiers)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(
            name,
            TypeKind::Interface,
            Modifiers::PUBLIC | Modifiers::ABSTRACT,
        )
    }

    pub fn new(name: impl Into<String>, kind: TypeKind, modifiers: Modifiers) -> Self {
        Self {
            name: TypePath::new(name),
            kind,
            modifiers,
            type_params: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            classpath: None,
        }
    }

    #[must_use]
    pub fn with_type_params(mut self, names: &[&str]) -> Self {
        self.type_params = names.iter().copied().map(TypeParam::new).collect();
        self
    }

    #[must_use]
    pub fn extending(mut self, superclass: TypeRef) -> Self {
        self.superclass = Some(superclass);
        self
    }

    #[must_use]
    pub fn implementing(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    #[must_use]
    pub fn with_constructor(mut self, constructor: ConstructorDecl) -> Self {
        self.constructors.push(constructor);
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn is_interface(&self) -> bool {
        self.kind.is_interface()
    }

    pub fn package(&self) -> &str {
        self.name.package()
    }

    pub fn simple_name(&self) -> &str {
        self.name.simple_name()
    }

    pub fn enclosing(&self) -> Option<TypePath> {
        self.name.enclosing()
    }

    /// Variable reference to one of this type's own generic parameters
    pub fn own_variable(&self, name: &str) -> TypeRef {
        TypeRef::variable(name, VarOwner::of_type(self.name.clone()))
    }

    /// Effective superclass: classes without an explicit one extend the top type
    pub fn effective_superclass(&self) -> Option<TypeRef> {
        match (&self.superclass, self.kind) {
            (Some(superclass), _) => Some(superclass.clone()),
            (None, TypeKind::Class) if !self.name.is_object() => {
                Some(TypeRef::named(OBJECT))
            }
            _ => None,
        }
    }

    /// Direct supertypes: the effective superclass first, then interfaces in
    /// declaration order
    pub fn supertypes(&self) -> Vec<TypeRef> {
        self.effective_superclass()
            .into_iter()
            .chain(self.interfaces.iter().cloned())
            .collect()
    }

    /// Declared constructors, or the implicit no-argument one the language
    /// provides when none are declared
    pub fn effective_constructors(&self) -> Vec<ConstructorDecl> {
        if self.constructors.is_empty() {
            vec![ConstructorDecl {
                modifiers: self.modifiers.access(),
                ..ConstructorDecl::default()
            }]
        } else {
            self.constructors.clone()
        }
    }
}
