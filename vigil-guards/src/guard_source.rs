#![forbid(unsafe_code)]

use std::fmt;

use crate::error::GuardError;

/// Where a guarded value lives in the traced program.
///
/// Ordinals are stable and feed [`crate::Guard::sort_key`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GuardSource {
    Local = 0,
    Global = 1,
    LocalNnModule = 2,
    GlobalNnModule = 3,
    Constant = 4,
    RandomValue = 5,
    ShapeEnv = 6,
}

impl GuardSource {
    pub const ALL: [GuardSource; 7] = [
        GuardSource::Local,
        GuardSource::Global,
        GuardSource::LocalNnModule,
        GuardSource::GlobalNnModule,
        GuardSource::Constant,
        GuardSource::RandomValue,
        GuardSource::ShapeEnv,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Pick the builder scope a guard on this source is compiled against.
    pub fn select<T>(self, locals: T, globals: T) -> Result<T, GuardError> {
        match self {
            // Shape-env expressions can reference frame locals, and random values are
            // materialized into a local temporary before they are checked.
            GuardSource::Local
            | GuardSource::LocalNnModule
            | GuardSource::ShapeEnv
            | GuardSource::RandomValue => Ok(locals),
            GuardSource::Global | GuardSource::GlobalNnModule => Ok(globals),
            GuardSource::Constant => Err(GuardError::UnselectableSource { guard_source: self }),
        }
    }

    pub fn is_nn_module(self) -> bool {
        matches!(self, GuardSource::LocalNnModule | GuardSource::GlobalNnModule)
    }

    pub fn is_local(self) -> bool {
        matches!(self, GuardSource::Local | GuardSource::LocalNnModule)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GuardSource::Local => "local",
            GuardSource::Global => "global",
            GuardSource::LocalNnModule => "local_nn_module",
            GuardSource::GlobalNnModule => "global_nn_module",
            GuardSource::Constant => "constant",
            GuardSource::RandomValue => "random_value",
            GuardSource::ShapeEnv => "shape_env",
        }
    }
}

impl fmt::Display for GuardSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
