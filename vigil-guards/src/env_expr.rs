#![forbid(unsafe_code)]

use crate::error::GuardError;
use crate::source::SourceRef;

/// Relational guard constraints that do not fit a single [`crate::Guard`].
///
/// Guard compilers must match every variant.
#[derive(Clone, Debug, PartialEq)]
pub enum GuardEnvExpr {
    DuplicateInputs(DuplicateInputs),
}

/// Two distinct input sources observed to alias the same object.
#[derive(Clone, Debug)]
pub struct DuplicateInputs {
    input_source_a: SourceRef,
    input_source_b: SourceRef,
}

impl DuplicateInputs {
    pub fn new(input_source_a: SourceRef, input_source_b: SourceRef) -> Result<Self, GuardError> {
        if *input_source_a == *input_source_b {
            return Err(GuardError::DuplicateInputs {
                name: input_source_a.name(),
            });
        }
        Ok(Self {
            input_source_a,
            input_source_b,
        })
    }

    pub fn input_source_a(&self) -> &SourceRef {
        &self.input_source_a
    }

    pub fn input_source_b(&self) -> &SourceRef {
        &self.input_source_b
    }
}

impl PartialEq for DuplicateInputs {
    fn eq(&self, other: &Self) -> bool {
        *self.input_source_a == *other.input_source_a
            && *self.input_source_b == *other.input_source_b
    }
}

impl From<DuplicateInputs> for GuardEnvExpr {
    fn from(value: DuplicateInputs) -> Self {
        GuardEnvExpr::DuplicateInputs(value)
    }
}
