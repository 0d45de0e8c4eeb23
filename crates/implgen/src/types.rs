//! Shared type definitions for the implgen crate
//!
//! This module contains the structural vocabulary used by every stage of
//! synthesis: type paths, type references, generic variable owners, and
//! modifier sets. Declarations that use these live in [`crate::declarations`].

use std::fmt;

use serde::Deserialize;

/// Names of the primitive types, including `void`
pub const PRIMITIVES: [&str; 9] = [
    "boolean", "byte", "short", "char", "int", "long", "float", "double", "void",
];

/// The universal top type of the reference hierarchy
pub const OBJECT: &str = "java.lang.Object";

/// Binary name of a declared type, e.g. `com.acme.Outer$Inner`
///
/// Nested types use `$` to separate themselves from their enclosing type, so
/// the package, simple name and enclosing type can all be derived from the
/// path without a registry lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct TypePath(String);

impl TypePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if this path names a primitive type (or `void`)
    pub fn is_primitive(&self) -> bool {
        PRIMITIVES.contains(&self.0.as_str())
    }

    pub fn is_void(&self) -> bool {
        self.0 == "void"
    }

    pub fn is_boolean(&self) -> bool {
        self.0 == "boolean"
    }

    pub fn is_object(&self) -> bool {
        self.0 == OBJECT
    }

    /// Package portion of the path; empty for the default package
    pub fn package(&self) -> &str {
        let top_level = self.0.split('$').next().unwrap_or_default();
        top_level
            .rfind('.')
            .map_or("", |index| &top_level[..index])
    }

    /// Simple name of the type, without package or enclosing types
    pub fn simple_name(&self) -> &str {
        let tail = self.0.rsplit('$').next().unwrap_or_default();
        tail.rsplit('.').next().unwrap_or_default()
    }

    /// Binary name of the directly enclosing type, if this is a member type
    pub fn enclosing(&self) -> Option<TypePath> {
        self.0
            .rfind('$')
            .map(|index| TypePath::new(&self.0[..index]))
    }

    /// Source-level spelling of the path (`$` separators become `.`)
    pub fn canonical(&self) -> String {
        self.0.replace('$', ".")
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The declaration that introduces a generic variable
///
/// Class-level variables are owned by their type; variables of generic
/// methods and constructors are additionally qualified by the member name so
/// that `<T> T foo()` never collides with a class-level `T`. The metadata
/// spelling is `pkg.Type` or `pkg.Type#member`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "String")]
pub struct VarOwner {
    pub ty: TypePath,
    pub member: Option<String>,
}

impl VarOwner {
    pub fn of_type(ty: TypePath) -> Self {
        Self { ty, member: None }
    }

    pub fn of_member(ty: TypePath, member: impl Into<String>) -> Self {
        Self {
            ty,
            member: Some(member.into()),
        }
    }

    /// Owner used when comparing generic methods up to renaming of their variables
    pub(crate) fn positional() -> Self {
        Self {
            ty: TypePath::new(""),
            member: Some(String::new()),
        }
    }

    pub fn is_member_scoped(&self) -> bool {
        self.member.is_some()
    }
}

impl From<String> for VarOwner {
    fn from(value: String) -> Self {
        match value.split_once('#') {
            Some((ty, member)) => Self::of_member(TypePath::new(ty), member),
            None => Self::of_type(TypePath::new(value)),
        }
    }
}

impl fmt::Display for VarOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            Some(member) => write!(f, "{}#{member}", self.ty),
            None => write!(f, "{}", self.ty),
        }
    }
}

/// Direction of a wildcard's bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundKind {
    /// `? extends A & B` (or plain `?`)
    #[default]
    Upper,
    /// `? super A`
    Lower,
}

/// A reference to a type as it appears in a signature
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "TypeRefRepr")]
pub enum TypeRef {
    /// A raw class, interface or primitive
    Named(TypePath),
    /// `component[]`
    Array(Box<TypeRef>),
    /// A generic variable together with the declaration that introduced it
    Variable { name: String, owner: VarOwner },
    /// `?`, `? extends ...` or `? super ...`
    Wildcard { kind: BoundKind, bounds: Vec<TypeRef> },
    /// `raw<args...>`
    Parameterized { raw: TypePath, args: Vec<TypeRef> },
}

impl TypeRef {
    pub fn named(path: impl Into<String>) -> Self {
        Self::Named(TypePath::new(path))
    }

    pub fn array(component: TypeRef) -> Self {
        Self::Array(Box::new(component))
    }

    pub fn variable(name: impl Into<String>, owner: VarOwner) -> Self {
        Self::Variable {
            name: name.into(),
            owner,
        }
    }

    pub fn parameterized(raw: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self::Parameterized {
            raw: TypePath::new(raw),
            args,
        }
    }

    pub fn void() -> Self {
        Self::named("void")
    }

    pub fn object() -> Self {
        Self::named(OBJECT)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Named(path) if path.is_void())
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Named(path) if path.is_object())
    }

    /// Raw type path of a named or parameterized reference
    pub fn raw_path(&self) -> Option<&TypePath> {
        match self {
            Self::Named(path) | Self::Parameterized { raw: path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Metadata spelling of a [`TypeRef`]: either a shorthand string such as
/// `"java.lang.String"` / `"int[][]"`, or a table tagged by `kind`
#[derive(Deserialize)]
#[serde(untagged)]
enum TypeRefRepr {
    Shorthand(String),
    Tagged(TaggedTypeRef),
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TaggedTypeRef {
    Named {
        name: TypePath,
    },
    Array {
        component: TypeRef,
    },
    Variable {
        name: String,
        owner: VarOwner,
    },
    Wildcard {
        #[serde(default)]
        bound: BoundKind,
        #[serde(default)]
        bounds: Vec<TypeRef>,
    },
    Parameterized {
        raw: TypePath,
        args: Vec<TypeRef>,
    },
}

impl TryFrom<TypeRefRepr> for TypeRef {
    type Error = String;

    fn try_from(repr: TypeRefRepr) -> Result<Self, Self::Error> {
        let ty = match repr {
            TypeRefRepr::Shorthand(text) => {
                let mut base = text.trim();
                let mut dimensions = 0;
                while let Some(stripped) = base.strip_suffix("[]") {
                    base = stripped.trim_end();
                    dimensions += 1;
                }
                if base.contains(['<', '>', '?']) {
                    return Err(format!(
                        "`{text}` is not a plain type name; spell generic types as a table \
                         with `kind = \"parameterized\"` or `kind = \"wildcard\"`"
                    ));
                }
                (0..dimensions).fold(TypeRef::named(base), |component, _| {
                    TypeRef::array(component)
                })
            }
            TypeRefRepr::Tagged(TaggedTypeRef::Named { name }) => TypeRef::Named(name),
            TypeRefRepr::Tagged(TaggedTypeRef::Array { component }) => TypeRef::array(component),
            TypeRefRepr::Tagged(TaggedTypeRef::Variable { name, owner }) => {
                TypeRef::Variable { name, owner }
            }
            TypeRefRepr::Tagged(TaggedTypeRef::Wildcard { bound, bounds }) => {
                if bound == BoundKind::Lower && bounds.is_empty() {
                    return Err("a lower-bounded wildcard needs at least one bound".to_owned());
                }
                TypeRef::Wildcard {
                    kind: bound,
                    bounds,
                }
            }
            TypeRefRepr::Tagged(TaggedTypeRef::Parameterized { raw, args }) => {
                TypeRef::Parameterized { raw, args }
            }
        };
        Ok(ty)
    }
}

/// Set of declaration modifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct Modifiers(u16);

impl Modifiers {
    pub const PUBLIC: Self = Self(0x0001);
    pub const PRIVATE: Self = Self(0x0002);
    pub const PROTECTED: Self = Self(0x0004);
    pub const STATIC: Self = Self(0x0008);
    pub const FINAL: Self = Self(0x0010);
    pub const SYNCHRONIZED: Self = Self(0x0020);
    pub const VOLATILE: Self = Self(0x0040);
    pub const TRANSIENT: Self = Self(0x0080);
    pub const NATIVE: Self = Self(0x0100);
    pub const ABSTRACT: Self = Self(0x0400);
    pub const STRICT: Self = Self(0x0800);

    /// Keyword order used when rendering a modifier set
    const CANONICAL_ORDER: [(Self, &'static str); 11] = [
        (Self::PUBLIC, "public"),
        (Self::PROTECTED, "protected"),
        (Self::PRIVATE, "private"),
        (Self::ABSTRACT, "abstract"),
        (Self::STATIC, "static"),
        (Self::FINAL, "final"),
        (Self::TRANSIENT, "transient"),
        (Self::VOLATILE, "volatile"),
        (Self::SYNCHRONIZED, "synchronized"),
        (Self::NATIVE, "native"),
        (Self::STRICT, "strictfp"),
    ];

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    pub const fn is_protected(self) -> bool {
        self.contains(Self::PROTECTED)
    }

    pub const fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }

    pub const fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    pub const fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }

    pub const fn is_native(self) -> bool {
        self.contains(Self::NATIVE)
    }

    pub const fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    /// Access modifiers only (`public`, `protected`, `private`)
    pub const fn access(self) -> Self {
        Self(self.0 & (Self::PUBLIC.0 | Self::PROTECTED.0 | Self::PRIVATE.0))
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        Self::CANONICAL_ORDER
            .iter()
            .find(|(_, name)| *name == keyword)
            .map(|(modifier, _)| *modifier)
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl TryFrom<Vec<String>> for Modifiers {
    type Error = String;

    fn try_from(keywords: Vec<String>) -> Result<Self, Self::Error> {
        keywords.iter().try_fold(Self::empty(), |acc, keyword| {
            Self::from_keyword(keyword)
                .map(|modifier| acc | modifier)
                .ok_or_else(|| format!("unknown modifier `{keyword}`"))
        })
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (modifier, keyword) in Self::CANONICAL_ORDER {
            if self.contains(modifier) {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(keyword)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_path_components() {
        let path = TypePath::new("com.acme.Outer$Inner");
        assert_eq!(path.package(), "com.acme");
        assert_eq!(path.simple_name(), "Inner");
        assert_eq!(path.enclosing(), Some(TypePath::new("com.acme.Outer")));
        assert_eq!(path.canonical(), "com.acme.Outer.Inner");

        let top = TypePath::new("Standalone");
        assert_eq!(top.package(), "");
        assert_eq!(top.simple_name(), "Standalone");
        assert_eq!(top.enclosing(), None);
    }

    #[test]
    fn test_var_owner_spelling() {
        let owner = VarOwner::from("com.acme.Box#map".to_string());
        assert_eq!(owner.ty, TypePath::new("com.acme.Box"));
        assert_eq!(owner.member.as_deref(), Some("map"));
        assert_eq!(owner.to_string(), "com.acme.Box#map");
        assert!(!VarOwner::from("com.acme.Box".to_string()).is_member_scoped());
    }

    #[test]
    fn test_modifiers_render_in_canonical_order() {
        let modifiers = Modifiers::try_from(vec![
            "abstract".to_string(),
            "synchronized".to_string(),
            "public".to_string(),
        ])
        .expect("known modifiers");
        assert_eq!(modifiers.to_string(), "public abstract synchronized");
        assert_eq!(
            modifiers.without(Modifiers::ABSTRACT).to_string(),
            "public synchronized"
        );
        assert_eq!(modifiers.access(), Modifiers::PUBLIC);
    }

    #[test]
    fn test_unknown_modifier_is_rejected() {
        let error = Modifiers::try_from(vec!["sealed".to_string()]).unwrap_err();
        assert_eq!(error, "unknown modifier `sealed`");
    }

    #[derive(Deserialize)]
    struct Holder {
        ty: TypeRef,
    }

    #[test]
    fn test_type_ref_shorthand() {
        let holder: Holder = toml::from_str(r#"ty = "int[][]""#).expect("valid shorthand");
        assert_eq!(
            holder.ty,
            TypeRef::array(TypeRef::array(TypeRef::named("int")))
        );
    }

    #[test]
    fn test_type_ref_tagged_table() {
        let holder: Holder = toml::from_str(
            r#"ty = { kind = "parameterized", raw = "java.util.List", args = [{ kind = "wildcard", bound = "lower", bounds = ["java.lang.Number"] }] }"#,
        )
        .expect("valid table");
        assert_eq!(
            holder.ty,
            TypeRef::parameterized(
                "java.util.List",
                vec![TypeRef::Wildcard {
                    kind: BoundKind::Lower,
                    bounds: vec![TypeRef::named("java.lang.Number")],
                }]
            )
        );
    }

    #[test]
    fn test_generic_shorthand_is_rejected() {
        let error = toml::from_str::<Holder>(r#"ty = "java.util.List<java.lang.String>""#)
            .err()
            .expect("generic shorthand is not a type name");
        assert!(error.to_string().contains("kind = \"parameterized\""));
        assert!(toml::from_str::<Holder>(r#"ty = "?""#).is_err());
    }

    #[test]
    fn test_lower_wildcard_without_bounds_is_rejected() {
        let error = toml::from_str::<Holder>(r#"ty = { kind = "wildcard", bound = "lower" }"#)
            .err()
            .expect("lower wildcard needs a bound");
        assert!(
            error
                .to_string()
                .contains("a lower-bounded wildcard needs at least one bound")
        );

        let holder: Holder = toml::from_str(r#"ty = { kind = "wildcard" }"#).expect("plain `?`");
        assert_eq!(
            holder.ty,
            TypeRef::Wildcard {
                kind: BoundKind::Upper,
                bounds: Vec::new(),
            }
        );
    }
}
