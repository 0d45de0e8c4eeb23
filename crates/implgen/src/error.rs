//! Error types for stub synthesis and packaging

use std::io;

use crate::types::TypePath;

/// The single failure an invocation reports, always naming the offending type
#[derive(Debug, thiserror::Error)]
pub enum ImplError {
    #[error("cannot implement `{type_name}`: {reason}")]
    InvalidTarget { type_name: String, reason: String },

    #[error("`{type_name}` has no non-private constructor to forward to")]
    NoUsableConstructor { type_name: String },

    #[error("`{type_name}` requires `{member}`, which is private at some enclosing level")]
    InaccessibleMember { type_name: String, member: String },

    #[error("compilation of the implementation of `{type_name}` failed: {detail}")]
    CompilationFailed { type_name: String, detail: String },

    #[error("packaging the implementation of `{type_name}` failed: {source}")]
    PackagingFailed {
        type_name: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O failure while implementing `{type_name}`: {source}")]
    IoFailure {
        type_name: String,
        #[source]
        source: io::Error,
    },
}

impl ImplError {
    pub fn invalid_target(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Name of the type the failed invocation was implementing
    pub fn type_name(&self) -> &str {
        match self {
            Self::InvalidTarget { type_name, .. }
            | Self::NoUsableConstructor { type_name }
            | Self::InaccessibleMember { type_name, .. }
            | Self::CompilationFailed { type_name, .. }
            | Self::PackagingFailed { type_name, .. }
            | Self::IoFailure { type_name, .. } => type_name,
        }
    }
}

/// Faults raised inside the synthesis stages
///
/// These carry no target name; the seam that owns the output file converts
/// them into an [`ImplError`] once it has cleaned up.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("no usable constructor")]
    NoUsableConstructor,

    #[error("`{0}` is not accessible")]
    InaccessibleMember(TypePath),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SynthesisError {
    pub fn into_impl_error(self, target: &TypePath) -> ImplError {
        let type_name = target.canonical();
        match self {
            Self::NoUsableConstructor => ImplError::NoUsableConstructor { type_name },
            Self::InaccessibleMember(member) => ImplError::InaccessibleMember {
                type_name,
                member: member.canonical(),
            },
            Self::Io(source) => ImplError::IoFailure { type_name, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_error_names_target() {
        let target = TypePath::new("com.acme.Outer$Api");
        let error = SynthesisError::InaccessibleMember(TypePath::new("com.acme.Outer$Hidden"))
            .into_impl_error(&target);
        assert_eq!(error.type_name(), "com.acme.Outer.Api");
        assert_eq!(
            error.to_string(),
            "`com.acme.Outer.Api` requires `com.acme.Outer.Hidden`, which is private at some \
             enclosing level"
        );
    }
}
