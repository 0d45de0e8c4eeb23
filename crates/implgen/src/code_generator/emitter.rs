//! Source emission for the generated implementation
//!
//! The unit is written piece by piece: header, forwarding constructors, one
//! stub per accepted method, closing brace. Every piece is rendered in full
//! before it is written, so a rendering fault never leaves half a member
//! behind in the unit.

use log::trace;

use super::output_unit::UnitWriter;
use crate::{
    closure::SubstitutionTable,
    declarations::{TypeDecl, TypeParam},
    error::SynthesisError,
    member_resolver::{CandidateMethod, ConstructorSpec, ResolvedMembers},
    type_registry::TypeIntrospection,
    type_renderer::TypeRenderer,
    types::{Modifiers, TypePath, TypeRef},
};

const INDENT: &str = "    ";

/// Writes the implementation of one target type
#[derive(Debug)]
pub struct SourceEmitter<'a> {
    target: &'a TypeDecl,
    renderer: TypeRenderer<'a>,
    impl_name: String,
}

impl<'a> SourceEmitter<'a> {
    pub fn new(
        target: &'a TypeDecl,
        types: &'a dyn TypeIntrospection,
        table: &'a SubstitutionTable,
        impl_suffix: &str,
    ) -> Self {
        Self {
            target,
            renderer: TypeRenderer::new(types, table),
            impl_name: format!("{}{impl_suffix}", target.simple_name()),
        }
    }

    /// Simple name of the generated type
    pub fn impl_name(&self) -> &str {
        &self.impl_name
    }

    /// Emit the whole unit into `out`
    pub fn emit(
        &self,
        members: &ResolvedMembers,
        out: &mut dyn UnitWriter,
    ) -> Result<(), SynthesisError> {
        out.write_text(&self.header()?)?;
        if !self.target.is_interface() {
            for constructor in members.constructors.iter().filter(|spec| !spec.implicit) {
                out.write_text(&self.constructor(constructor)?)?;
            }
        }
        for candidate in &members.methods {
            trace!("Emitting {}.{}", candidate.declaring, candidate.method.name);
            out.write_text(&self.method(candidate)?)?;
        }
        out.write_text("}\n")?;
        Ok(())
    }

    /// Package clause and class declaration, up to the opening brace
    pub fn header(&self) -> Result<String, SynthesisError> {
        let target = self.target;
        let mut header = String::new();
        if !target.package().is_empty() {
            header.push_str(&format!("package {};\n\n", target.package()));
        }
        let relation = if target.is_interface() {
            "implements"
        } else {
            "extends"
        };
        header.push_str(&format!(
            "public class {}{} {relation} {}{} {{\n",
            self.impl_name,
            self.renderer
                .render_type_params(&target.type_params, &target.name)?,
            self.renderer.render_named(&target.name, &target.name)?,
            TypeRenderer::render_type_args(&target.type_params),
        ));
        Ok(header)
    }

    /// A constructor forwarding every argument to `super`
    pub fn constructor(&self, spec: &ConstructorSpec) -> Result<String, SynthesisError> {
        let arguments: Vec<String> = (0..spec.params.len()).map(|i| format!("arg{i}")).collect();
        Ok(format!(
            "\n{INDENT}{}{}{}({}){} {{\n{INDENT}{INDENT}super({});\n{INDENT}}}\n",
            prefixed(spec.modifiers.without(Modifiers::ABSTRACT)),
            self.type_params(&spec.type_params, &spec.declaring)?,
            self.impl_name,
            self.parameters(&spec.params, spec.varargs, &spec.declaring)?,
            self.throws_clause(&spec.throws, &spec.declaring)?,
            arguments.join(", "),
        ))
    }

    /// An overriding stub returning the default value of its return type
    pub fn method(&self, candidate: &CandidateMethod) -> Result<String, SynthesisError> {
        let method = &candidate.method;
        let declaring = &candidate.declaring;
        let body = match default_value(&method.returns) {
            Some(value) => format!("{INDENT}{INDENT}return {value};\n"),
            None => String::new(),
        };
        Ok(format!(
            "\n{INDENT}@Override\n{INDENT}{}{}{} {}({}){} {{\n{body}{INDENT}}}\n",
            prefixed(candidate.modifiers().without(Modifiers::ABSTRACT)),
            self.type_params(&method.type_params, declaring)?,
            self.renderer.render(&method.returns, declaring)?,
            method.name,
            self.parameters(&method.params, candidate.is_varargs(), declaring)?,
            self.throws_clause(candidate.throws(), declaring)?,
        ))
    }

    fn type_params(&self, params: &[TypeParam], owner: &TypePath) -> Result<String, SynthesisError> {
        let rendered = self.renderer.render_type_params(params, owner)?;
        Ok(if rendered.is_empty() {
            rendered
        } else {
            rendered + " "
        })
    }

    fn parameters(
        &self,
        params: &[TypeRef],
        varargs: bool,
        owner: &TypePath,
    ) -> Result<String, SynthesisError> {
        let last = params.len().saturating_sub(1);
        let rendered = params
            .iter()
            .enumerate()
            .map(|(index, param)| {
                let ty = if varargs && index == last {
                    self.renderer.render_variadic(param, owner)?
                } else {
                    self.renderer.render(param, owner)?
                };
                Ok(format!("{ty} arg{index}"))
            })
            .collect::<Result<Vec<_>, SynthesisError>>()?;
        Ok(rendered.join(", "))
    }

    fn throws_clause(&self, throws: &[TypeRef], owner: &TypePath) -> Result<String, SynthesisError> {
        if throws.is_empty() {
            return Ok(String::new());
        }
        Ok(format!(" throws {}", self.renderer.render_list(throws, ", ", owner)?))
    }
}

/// Modifier keywords followed by a space, or nothing
fn prefixed(modifiers: Modifiers) -> String {
    if modifiers.is_empty() {
        String::new()
    } else {
        format!("{modifiers} ")
    }
}

/// Default value returned by a stub, `None` for `void`
///
/// Generic variables never stand for primitives, so the declared type
/// decides without substitution.
fn default_value(returns: &TypeRef) -> Option<&'static str> {
    match returns {
        TypeRef::Named(path) if path.is_void() => None,
        TypeRef::Named(path) if path.is_boolean() => Some("false"),
        TypeRef::Named(path) if path.is_primitive() => Some("0"),
        _ => Some("null"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        closure::build_closure,
        declarations::{ConstructorDecl, MethodDecl},
        member_resolver::resolve_members,
        type_registry::TypeRegistry,
        types::VarOwner,
    };

    fn emit(target: &TypeDecl, registry: &TypeRegistry) -> Result<String, SynthesisError> {
        let table = build_closure(target, registry);
        let members = resolve_members(target, registry, &table)?;
        let emitter = SourceEmitter::new(target, registry, &table, "Impl");
        let mut out = String::new();
        emitter.emit(&members, &mut out)?;
        Ok(out)
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_value(&TypeRef::void()), None);
        assert_eq!(default_value(&TypeRef::named("boolean")), Some("false"));
        assert_eq!(default_value(&TypeRef::named("double")), Some("0"));
        assert_eq!(default_value(&TypeRef::named("char")), Some("0"));
        assert_eq!(
            default_value(&TypeRef::array(TypeRef::named("int"))),
            Some("null")
        );
        assert_eq!(default_value(&TypeRef::object()), Some("null"));
    }

    #[test]
    fn test_marker_interface_in_default_package() {
        let marker = TypeDecl::interface("Marker");
        let source = emit(&marker, &TypeRegistry::new()).expect("emits");
        assert_eq!(source, "public class MarkerImpl implements Marker {\n}\n");
    }

    #[test]
    fn test_substituted_getter() {
        let mut registry = TypeRegistry::new();
        registry
            .insert(
                TypeDecl::interface("demo.Source")
                    .with_type_params(&["T"])
                    .with_method(
                        MethodDecl::new("get", Modifiers::PUBLIC | Modifiers::ABSTRACT).returning(
                            TypeRef::variable("T", VarOwner::of_type(TypePath::new("demo.Source"))),
                        ),
                    ),
            )
            .expect("valid");
        let target = TypeDecl::interface("demo.NumberSource").implementing(
            TypeRef::parameterized("demo.Source", vec![TypeRef::named("java.lang.Integer")]),
        );

        let source = emit(&target, &registry).expect("emits");
        assert_eq!(
            source,
            "package demo;\n\
             \n\
             public class NumberSourceImpl implements demo.NumberSource {\n\
             \n    @Override\n\
             \x20   public java.lang.Integer get() {\n\
             \x20       return null;\n\
             \x20   }\n\
             }\n"
        );
    }

    #[test]
    fn test_constructor_forwards_arguments() {
        let target = TypeDecl::class("p.Base", Modifiers::PUBLIC | Modifiers::ABSTRACT)
            .with_constructor(ConstructorDecl {
                modifiers: Modifiers::PROTECTED,
                params: vec![
                    TypeRef::named("int"),
                    TypeRef::array(TypeRef::named("java.lang.String")),
                ],
                throws: vec![TypeRef::named("java.io.IOException")],
                varargs: true,
                ..ConstructorDecl::default()
            });
        let registry = TypeRegistry::new();
        let table = SubstitutionTable::new();
        let members = resolve_members(&target, &registry, &table).expect("resolves");
        let emitter = SourceEmitter::new(&target, &registry, &table, "Impl");

        assert_eq!(
            emitter
                .constructor(&members.constructors[0])
                .expect("renders"),
            "\n    protected BaseImpl(int arg0, java.lang.String... arg1) throws java.io.IOException {\n        super(arg0, arg1);\n    }\n"
        );
    }

    #[test]
    fn test_generic_target_header() {
        let mut target = TypeDecl::class("p.Cache", Modifiers::PUBLIC | Modifiers::ABSTRACT);
        target.type_params = vec![
            TypeParam::new("K"),
            TypeParam::bounded(
                "V",
                vec![TypeRef::parameterized(
                    "java.lang.Comparable",
                    vec![TypeRef::variable("V", VarOwner::of_type(TypePath::new("p.Cache")))],
                )],
            ),
        ];
        let registry = TypeRegistry::new();
        let table = SubstitutionTable::new();
        let emitter = SourceEmitter::new(&target, &registry, &table, "Stub");
        assert_eq!(emitter.impl_name(), "CacheStub");
        assert_eq!(
            emitter.header().expect("renders"),
            "package p;\n\npublic class CacheStub<K, V extends java.lang.Comparable<V>> extends p.Cache<K, V> {\n"
        );
    }

    #[test]
    fn test_private_enclosing_type_is_a_synthesis_fault() {
        let mut registry = TypeRegistry::new();
        registry
            .insert(TypeDecl::class("p.Outer", Modifiers::PUBLIC))
            .expect("valid");
        registry
            .insert(TypeDecl::class("p.Outer$Hidden", Modifiers::PRIVATE | Modifiers::STATIC))
            .expect("valid");
        let target = TypeDecl::interface("p.Api").with_method(
            MethodDecl::new("leak", Modifiers::PUBLIC | Modifiers::ABSTRACT)
                .returning(TypeRef::named("p.Outer$Hidden")),
        );
        assert!(matches!(
            emit(&target, &registry),
            Err(SynthesisError::InaccessibleMember(path)) if path == TypePath::new("p.Outer$Hidden")
        ));
    }
}
