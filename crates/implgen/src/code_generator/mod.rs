//! Code generation for stub implementations
//!
//! The [`SourceEmitter`] turns resolved members into source text, and the
//! [`OutputUnit`] carries that text to disk, escaping non-ASCII characters
//! and removing the file again unless the unit is committed.

pub mod emitter;
pub mod output_unit;

pub use emitter::SourceEmitter;
pub use output_unit::{OutputUnit, UnitWriter};
