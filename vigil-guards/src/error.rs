#![forbid(unsafe_code)]

use miette::Diagnostic;
use thiserror::Error;

use crate::guard_source::GuardSource;

#[derive(Debug, Error, Diagnostic)]
pub enum GuardError {
    #[error("cannot guard constant source `{name}`")]
    #[diagnostic(
        code(vigil::guards::constant_source),
        help("constants are folded into the trace and never need a runtime check")
    )]
    ConstantSource { name: String },

    #[error("guard source `{guard_source}` does not select a builder scope")]
    #[diagnostic(code(vigil::guards::unselectable_source))]
    UnselectableSource { guard_source: GuardSource },

    #[error("guard `{name}` has no source to select a builder scope from")]
    #[diagnostic(code(vigil::guards::unsourced))]
    Unsourced { name: String },

    #[error("guard `{name}`: guarded class must be identical, or unset (had `{existing}`, got `{incoming}`)")]
    #[diagnostic(code(vigil::guards::guarded_class_mismatch))]
    GuardedClassMismatch {
        name: String,
        existing: String,
        incoming: String,
    },

    #[error("guard `{name}`: guarded object must be identical, or unset")]
    #[diagnostic(code(vigil::guards::guarded_object_mismatch))]
    GuardedObjectMismatch { name: String },

    #[error("duplicate inputs must name two distinct sources, got `{name}` twice")]
    #[diagnostic(code(vigil::guards::duplicate_inputs))]
    DuplicateInputs { name: String },
}
