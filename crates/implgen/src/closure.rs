//! Type closure: generic substitutions along the ancestor chain
//!
//! Walking from the target towards the root types, every parameterized
//! supertype reference binds the supertype's declared variables to the
//! arguments the descendant supplied. The resulting table lets any later
//! stage see an ancestor's `T` as whatever the target actually made of it.

use indexmap::IndexMap;
use log::{debug, trace, warn};
use rustc_hash::FxHashSet;

use crate::{
    declarations::TypeDecl,
    type_registry::TypeIntrospection,
    types::{TypePath, TypeRef, VarOwner},
};

/// A generic variable qualified by the declaration that introduced it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubstitutionKey {
    pub name: String,
    pub owner: VarOwner,
}

impl SubstitutionKey {
    pub fn new(name: impl Into<String>, owner: VarOwner) -> Self {
        Self {
            name: name.into(),
            owner,
        }
    }
}

/// Bindings from ancestor variables to descendant-supplied arguments
///
/// Built fresh for each invocation and read-only once the closure walk is
/// done.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionTable {
    bindings: IndexMap<SubstitutionKey, TypeRef>,
}

impl SubstitutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable; a later binding for the same key wins
    pub fn insert(&mut self, key: SubstitutionKey, value: TypeRef) {
        trace!("Binding {}::{} to {value:?}", key.owner, key.name);
        self.bindings.insert(key, value);
    }

    pub fn get(&self, key: &SubstitutionKey) -> Option<&TypeRef> {
        self.bindings.get(key)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Substitute every bound variable in `ty`, following chains of bindings
    /// to their fixed point
    ///
    /// A chain that revisits a variable it is already expanding stops there
    /// and leaves that variable in place.
    pub fn resolve(&self, ty: &TypeRef) -> TypeRef {
        self.resolve_guarded(ty, &mut Vec::new())
    }

    fn resolve_guarded(&self, ty: &TypeRef, expanding: &mut Vec<SubstitutionKey>) -> TypeRef {
        match ty {
            TypeRef::Named(_) => ty.clone(),
            TypeRef::Array(component) => {
                TypeRef::Array(Box::new(self.resolve_guarded(component, expanding)))
            }
            TypeRef::Variable { name, owner } => {
                let key = SubstitutionKey::new(name.clone(), owner.clone());
                if expanding.contains(&key) {
                    debug!("Cyclic binding for {owner}::{name}, keeping the variable");
                    return ty.clone();
                }
                match self.bindings.get(&key) {
                    Some(bound) => {
                        expanding.push(key);
                        let resolved = self.resolve_guarded(bound, expanding);
                        expanding.pop();
                        resolved
                    }
                    None => ty.clone(),
                }
            }
            TypeRef::Wildcard { kind, bounds } => TypeRef::Wildcard {
                kind: *kind,
                bounds: bounds
                    .iter()
                    .map(|bound| self.resolve_guarded(bound, expanding))
                    .collect(),
            },
            TypeRef::Parameterized { raw, args } => TypeRef::Parameterized {
                raw: raw.clone(),
                args: args
                    .iter()
                    .map(|arg| self.resolve_guarded(arg, expanding))
                    .collect(),
            },
        }
    }
}

/// Build the substitution table for `target` in one walk over its ancestors
pub fn build_closure(target: &TypeDecl, types: &dyn TypeIntrospection) -> SubstitutionTable {
    let mut table = SubstitutionTable::new();
    let mut visited = FxHashSet::default();
    walk_ancestors(target, types, &mut table, &mut visited);
    debug!(
        "Type closure of {} binds {} variables",
        target.name,
        table.len()
    );
    table
}

fn walk_ancestors(
    decl: &TypeDecl,
    types: &dyn TypeIntrospection,
    table: &mut SubstitutionTable,
    visited: &mut FxHashSet<TypePath>,
) {
    if !visited.insert(decl.name.clone()) {
        return;
    }

    for supertype in decl.supertypes() {
        let (raw, args) = match &supertype {
            TypeRef::Named(raw) => (raw, None),
            TypeRef::Parameterized { raw, args } => (raw, Some(args)),
            other => {
                warn!("Ignoring malformed supertype {other:?} of {}", decl.name);
                continue;
            }
        };

        let Some(raw_decl) = types.lookup(raw) else {
            debug!("Supertype {raw} of {} is opaque", decl.name);
            continue;
        };

        if let Some(args) = args {
            let owner = VarOwner::of_type(raw.clone());
            for (param, arg) in raw_decl.type_params.iter().zip(args) {
                table.insert(
                    SubstitutionKey::new(param.name.clone(), owner.clone()),
                    arg.clone(),
                );
            }
        }

        walk_ancestors(raw_decl, types, table, visited);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{type_registry::TypeRegistry, types::Modifiers};

    fn owner(path: &str) -> VarOwner {
        VarOwner::of_type(TypePath::new(path))
    }

    #[test]
    fn test_chain_of_parameterized_supertypes() {
        // Base<E> <- Middle<M> extends Base<M> <- Leaf extends Middle<String>
        let mut registry = TypeRegistry::new();
        registry
            .insert(TypeDecl::interface("p.Base").with_type_params(&["E"]))
            .expect("valid");
        registry
            .insert(
                TypeDecl::interface("p.Middle")
                    .with_type_params(&["M"])
                    .implementing(TypeRef::parameterized(
                        "p.Base",
                        vec![TypeRef::variable("M", owner("p.Middle"))],
                    )),
            )
            .expect("valid");
        let leaf = TypeDecl::class("p.Leaf", Modifiers::PUBLIC | Modifiers::ABSTRACT)
            .implementing(TypeRef::parameterized(
                "p.Middle",
                vec![TypeRef::named("java.lang.String")],
            ));

        let table = build_closure(&leaf, &registry);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.resolve(&TypeRef::variable("E", owner("p.Base"))),
            TypeRef::named("java.lang.String")
        );
    }

    #[test]
    fn test_nested_arguments_are_substituted_deeply() {
        let mut table = SubstitutionTable::new();
        table.insert(
            SubstitutionKey::new("T", owner("p.Holder")),
            TypeRef::parameterized("java.util.List", vec![TypeRef::variable("X", owner("p.Impl"))]),
        );
        table.insert(
            SubstitutionKey::new("X", owner("p.Impl")),
            TypeRef::named("java.lang.Long"),
        );

        let resolved = table.resolve(&TypeRef::array(TypeRef::variable("T", owner("p.Holder"))));
        assert_eq!(
            resolved,
            TypeRef::array(TypeRef::parameterized(
                "java.util.List",
                vec![TypeRef::named("java.lang.Long")]
            ))
        );
    }

    #[test]
    fn test_repeated_variables_in_siblings_are_all_substituted() {
        let mut table = SubstitutionTable::new();
        table.insert(
            SubstitutionKey::new("K", owner("p.Pair")),
            TypeRef::named("java.lang.String"),
        );
        let pair = TypeRef::parameterized(
            "java.util.Map",
            vec![
                TypeRef::variable("K", owner("p.Pair")),
                TypeRef::variable("K", owner("p.Pair")),
            ],
        );
        assert_eq!(
            table.resolve(&pair),
            TypeRef::parameterized(
                "java.util.Map",
                vec![
                    TypeRef::named("java.lang.String"),
                    TypeRef::named("java.lang.String")
                ]
            )
        );
    }

    #[test]
    fn test_cyclic_bindings_terminate() {
        let mut table = SubstitutionTable::new();
        table.insert(
            SubstitutionKey::new("A", owner("p.One")),
            TypeRef::variable("B", owner("p.Two")),
        );
        table.insert(
            SubstitutionKey::new("B", owner("p.Two")),
            TypeRef::variable("A", owner("p.One")),
        );
        assert_eq!(
            table.resolve(&TypeRef::variable("A", owner("p.One"))),
            TypeRef::variable("A", owner("p.One"))
        );
    }

    #[test]
    fn test_diamond_later_binding_wins() {
        let mut registry = TypeRegistry::new();
        registry
            .insert(TypeDecl::interface("p.Top").with_type_params(&["T"]))
            .expect("valid");
        let target = TypeDecl::interface("p.Both")
            .implementing(TypeRef::parameterized(
                "p.Top",
                vec![TypeRef::named("java.lang.Integer")],
            ))
            .implementing(TypeRef::parameterized(
                "p.Top",
                vec![TypeRef::named("java.lang.Number")],
            ));

        let table = build_closure(&target, &registry);
        assert_eq!(
            table.resolve(&TypeRef::variable("T", owner("p.Top"))),
            TypeRef::named("java.lang.Number")
        );
    }

    #[test]
    fn test_method_scoped_variables_are_untouched() {
        let mut table = SubstitutionTable::new();
        table.insert(
            SubstitutionKey::new("T", owner("p.Box")),
            TypeRef::named("java.lang.String"),
        );
        let method_var = TypeRef::variable("T", VarOwner::of_member(TypePath::new("p.Box"), "map"));
        assert_eq!(table.resolve(&method_var), method_var);
    }
}
