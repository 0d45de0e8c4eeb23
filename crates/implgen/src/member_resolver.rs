//! Member resolution: which constructors to forward and which methods to stub
//!
//! Methods are gathered in two passes over the ancestors of the target:
//!
//! 1. every public method of the full ancestor closure (superclasses and
//!    interfaces alike)
//! 2. the superclass chain again, this time admitting protected methods and
//!    package-private methods declared in the target's own package
//!
//! A `final` sighting anywhere forbids the signature for good and evicts any
//! candidate already accepted for it.

use indexmap::IndexMap;
use log::{debug, trace};
use rustc_hash::FxHashSet;

use crate::{
    closure::SubstitutionTable,
    declarations::{ConstructorDecl, MethodDecl, TypeDecl, TypeParam},
    error::SynthesisError,
    type_registry::TypeIntrospection,
    types::{Modifiers, TypePath, TypeRef, VarOwner},
};

/// Override identity of a method: its name and resolved parameter types
///
/// The return type takes no part in equality. Variables introduced by the
/// method itself are replaced by their position, so `<T> void f(T)` and
/// `<U> void f(U)` share a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub name: String,
    pub params: Vec<TypeRef>,
}

impl MethodSignature {
    pub fn of(method: &MethodDecl, declaring: &TypePath, table: &SubstitutionTable) -> Self {
        let params = method
            .params
            .iter()
            .map(|param| positional(&table.resolve(param), method, declaring))
            .collect();
        Self {
            name: method.name.clone(),
            params,
        }
    }
}

impl std::fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.name, self.params.len())
    }
}

/// Replace the method's own generic variables with positional placeholders
fn positional(ty: &TypeRef, method: &MethodDecl, declaring: &TypePath) -> TypeRef {
    match ty {
        TypeRef::Named(_) => ty.clone(),
        TypeRef::Array(component) => TypeRef::array(positional(component, method, declaring)),
        TypeRef::Variable { name, owner }
            if owner.ty == *declaring && owner.member.as_deref() == Some(method.name.as_str()) =>
        {
            match method.type_param_index(name) {
                Some(index) => TypeRef::variable(index.to_string(), VarOwner::positional()),
                None => ty.clone(),
            }
        }
        TypeRef::Variable { .. } => ty.clone(),
        TypeRef::Wildcard { kind, bounds } => TypeRef::Wildcard {
            kind: *kind,
            bounds: bounds
                .iter()
                .map(|bound| positional(bound, method, declaring))
                .collect(),
        },
        TypeRef::Parameterized { raw, args } => TypeRef::Parameterized {
            raw: raw.clone(),
            args: args
                .iter()
                .map(|arg| positional(arg, method, declaring))
                .collect(),
        },
    }
}

/// A method accepted for stubbing, together with the type that declared it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMethod {
    pub method: MethodDecl,
    pub declaring: TypePath,
}

impl CandidateMethod {
    pub fn modifiers(&self) -> Modifiers {
        self.method.modifiers
    }

    pub fn throws(&self) -> &[TypeRef] {
        &self.method.throws
    }

    pub fn is_varargs(&self) -> bool {
        self.method.varargs
    }
}

/// A super-constructor the generated type forwards to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorSpec {
    pub modifiers: Modifiers,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<TypeRef>,
    pub throws: Vec<TypeRef>,
    pub varargs: bool,
    pub declaring: TypePath,
    /// Supplied by the language rather than written out, e.g. the no-argument
    /// constructor of a type implementing an interface
    pub implicit: bool,
}

impl ConstructorSpec {
    fn forwarding(decl: &ConstructorDecl, declaring: &TypePath) -> Self {
        Self {
            modifiers: decl.modifiers,
            type_params: decl.type_params.clone(),
            params: decl.params.clone(),
            throws: decl.throws.clone(),
            varargs: decl.varargs,
            declaring: declaring.clone(),
            implicit: false,
        }
    }

    fn implicit(declaring: &TypePath) -> Self {
        Self {
            modifiers: Modifiers::PUBLIC,
            type_params: Vec::new(),
            params: Vec::new(),
            throws: Vec::new(),
            varargs: false,
            declaring: declaring.clone(),
            implicit: true,
        }
    }
}

/// Everything the emitter needs to write the body of the generated type
#[derive(Debug, Clone, Default)]
pub struct ResolvedMembers {
    pub constructors: Vec<ConstructorSpec>,
    pub methods: Vec<CandidateMethod>,
}

/// Resolve constructors and methods of `target`
pub fn resolve_members(
    target: &TypeDecl,
    types: &dyn TypeIntrospection,
    table: &SubstitutionTable,
) -> Result<ResolvedMembers, SynthesisError> {
    let constructors = resolve_constructors(target)?;
    let methods = resolve_methods(target, types, table);
    debug!(
        "Resolved {} constructors and {} methods for {}",
        constructors.len(),
        methods.len(),
        target.name
    );
    Ok(ResolvedMembers {
        constructors,
        methods,
    })
}

/// Constructors the generated type forwards to
///
/// Interfaces get the single implicit no-argument constructor. Classes
/// forward every non-private constructor and fail when none is left.
pub fn resolve_constructors(target: &TypeDecl) -> Result<Vec<ConstructorSpec>, SynthesisError> {
    if target.is_interface() {
        return Ok(vec![ConstructorSpec::implicit(&target.name)]);
    }

    let constructors: Vec<_> = target
        .effective_constructors()
        .iter()
        .filter(|constructor| !constructor.modifiers.is_private())
        .map(|constructor| ConstructorSpec::forwarding(constructor, &target.name))
        .collect();

    if constructors.is_empty() {
        debug!("Every constructor of {} is private", target.name);
        return Err(SynthesisError::NoUsableConstructor);
    }
    Ok(constructors)
}

/// Accepted and forbidden signatures collected across both passes
#[derive(Default)]
struct MethodCollector {
    accepted: IndexMap<MethodSignature, CandidateMethod>,
    forbidden: FxHashSet<MethodSignature>,
}

impl MethodCollector {
    fn offer(&mut self, method: &MethodDecl, declaring: &TypePath, table: &SubstitutionTable) {
        if method.synthetic || method.bridge {
            trace!("Skipping compiler-generated {declaring}.{}", method.name);
            return;
        }

        let signature = MethodSignature::of(method, declaring, table);
        if method.modifiers.is_final() {
            if self.accepted.shift_remove(&signature).is_some() {
                debug!("Final {declaring}.{signature} evicts an accepted candidate");
            }
            self.forbidden.insert(signature);
            return;
        }

        if method.deprecated && !method.modifiers.is_abstract() {
            trace!("Skipping deprecated {declaring}.{signature}");
            return;
        }
        if self.forbidden.contains(&signature) || is_forbidden_executable(method.modifiers) {
            trace!("Skipping {declaring}.{signature}");
            return;
        }

        if self.accepted.contains_key(&signature) {
            trace!("Suppressing duplicate {declaring}.{signature}");
            return;
        }
        trace!("Accepting {declaring}.{signature}");
        self.accepted.insert(
            signature,
            CandidateMethod {
                method: method.clone(),
                declaring: declaring.clone(),
            },
        );
    }
}

fn is_forbidden_executable(modifiers: Modifiers) -> bool {
    modifiers.is_final() || modifiers.is_static() || modifiers.is_native() || modifiers.is_private()
}

/// Interface members without an access modifier are implicitly public
fn is_public_member(declaring: &TypeDecl, method: &MethodDecl) -> bool {
    method.modifiers.is_public() || declaring.is_interface() && !method.modifiers.is_private()
}

/// Methods the generated type must override, in a deterministic order
pub fn resolve_methods(
    target: &TypeDecl,
    types: &dyn TypeIntrospection,
    table: &SubstitutionTable,
) -> Vec<CandidateMethod> {
    let mut collector = MethodCollector::default();

    // Pass A: public members of the whole ancestor closure
    let mut visited = FxHashSet::default();
    collect_public(target, types, table, &mut collector, &mut visited);

    // Pass B: protected and package members along the superclass chain
    let package = target.package();
    let mut chain = FxHashSet::default();
    let mut level = Some(target);
    while let Some(decl) = level {
        if !chain.insert(decl.name.clone()) {
            debug!("Superclass chain of {} revisits {}", target.name, decl.name);
            break;
        }
        for method in &decl.methods {
            if is_public_member(decl, method) || method.modifiers.is_private() {
                continue;
            }
            if method.modifiers.is_protected() || decl.package() == package {
                collector.offer(method, &decl.name, table);
            }
        }
        level = decl
            .effective_superclass()
            .as_ref()
            .and_then(TypeRef::raw_path)
            .and_then(|raw| types.lookup(raw));
    }

    collector.accepted.into_values().collect()
}

fn collect_public(
    decl: &TypeDecl,
    types: &dyn TypeIntrospection,
    table: &SubstitutionTable,
    collector: &mut MethodCollector,
    visited: &mut FxHashSet<TypePath>,
) {
    if !visited.insert(decl.name.clone()) {
        return;
    }
    for method in &decl.methods {
        if !is_public_member(decl, method) {
            continue;
        }
        if method.modifiers.is_public() {
            collector.offer(method, &decl.name, table);
        } else {
            let implicit = MethodDecl {
                modifiers: method.modifiers | Modifiers::PUBLIC,
                ..method.clone()
            };
            collector.offer(&implicit, &decl.name, table);
        }
    }
    for supertype in decl.supertypes() {
        let Some(raw) = supertype.raw_path() else {
            continue;
        };
        match types.lookup(raw) {
            Some(parent) => collect_public(parent, types, table, collector, visited),
            None => debug!("No members known for opaque supertype {raw}"),
        }
    }
}
