#![forbid(unsafe_code)]

use miette::Diagnostic;
use thiserror::Error;
use vigil_guards::GuardError;

#[derive(Debug, Error, Diagnostic)]
pub enum ContextError {
    #[error("frame context must be entered within an ongoing trace")]
    #[diagnostic(
        code(vigil::trace::no_active_context),
        help("install a tracing context with `with_tracing` or `TracingScope::enter` first")
    )]
    NoActiveContext,

    #[error("the current tracing context is mutably borrowed; cannot enter a frame")]
    #[diagnostic(
        code(vigil::trace::context_borrowed),
        help("release the `borrow_mut` on the tracing handle before entering a frame")
    )]
    ContextBorrowed,

    #[error("module name `{name}` is already registered")]
    #[diagnostic(
        code(vigil::trace::name_already_registered),
        help("the attribute-name uniquifier returned a name it had already issued")
    )]
    NameAlreadyRegistered { name: String },

    #[error("guard `{name}` is not tracked by this guards context")]
    #[diagnostic(code(vigil::trace::unknown_guard))]
    UnknownGuard { name: String },

    #[error("frame stack exceeded the configured depth of {max_depth}")]
    #[diagnostic(code(vigil::trace::frame_depth_exceeded), help("raise `frames.max_depth`"))]
    FrameDepthExceeded { max_depth: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Guard(#[from] GuardError),
}
