#![forbid(unsafe_code)]

//! Guard records for a speculative tracing compiler.
//!
//! A [`Guard`] is an assumption about runtime state under which a captured trace stays
//! valid. Guards are produced by [`Source`]s and compiled into checks by externally
//! supplied [`CreateFn`]s; this crate only owns their identity, ordering and export
//! metadata.

mod env_expr;
mod error;
mod guard;
mod guard_source;
mod shape;
mod source;

pub use env_expr::{DuplicateInputs, GuardEnvExpr};
pub use error::GuardError;
pub use guard::{CreateFn, ExportInfo, Guard, GuardBuilder, GuardSortKey, GuardedClass, ObjectRef};
pub use guard_source::GuardSource;
pub use shape::ShapeGuard;
pub use source::{Source, SourceRef};
