#![forbid(unsafe_code)]

use std::fmt;
use std::sync::Arc;

use crate::error::GuardError;
use crate::guard::{CreateFn, Guard};
use crate::guard_source::GuardSource;

/// An access path into the traced program's state.
///
/// Concrete sources (locals, attribute chains, subscripts, ...) are provided by the
/// tracer. A source denotes exactly one object, so two sources with the same scope
/// and the same name are the same source.
pub trait Source: fmt::Debug + Send + Sync {
    fn guard_source(&self) -> GuardSource;

    /// An expression that yields the guarded object when evaluated against the
    /// frame's locals and globals. It must be side-effect free and stable.
    fn name(&self) -> String;

    fn make_guard(&self, create_fn: &CreateFn, is_volatile: bool) -> Result<Guard, GuardError> {
        let guard_source = self.guard_source();
        if guard_source == GuardSource::Constant {
            return Err(GuardError::ConstantSource { name: self.name() });
        }
        Ok(Guard::new(self.name(), guard_source, create_fn.clone(), is_volatile))
    }

    fn is_nn_module(&self) -> bool {
        self.guard_source().is_nn_module()
    }
}

pub type SourceRef = Arc<dyn Source>;

impl PartialEq for dyn Source {
    fn eq(&self, other: &Self) -> bool {
        self.guard_source() == other.guard_source() && self.name() == other.name()
    }
}

impl Eq for dyn Source {}
