//! Stub implementation generator for JVM class and interface declarations
//!
//! Given the declaration of a non-final class or interface, implgen writes
//! the smallest concrete subtype that compiles: every constructor forwards to
//! `super`, every abstract or overridable method returns a default value.
//! The result can be left as source or compiled and packed into an archive.

pub mod closure;
pub mod code_generator;
pub mod config;
pub mod declarations;
pub mod error;
pub mod member_resolver;
pub mod orchestrator;
pub mod packager;
pub mod scoped_file;
pub mod type_registry;
pub mod type_renderer;
pub mod types;

pub use config::Config;
pub use error::ImplError;
pub use orchestrator::Implementor;
pub use type_registry::{TypeIntrospection, TypeRegistry};
