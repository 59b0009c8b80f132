#![forbid(unsafe_code)]

//! Per-trace bookkeeping: the guard set and module registry of one speculative trace
//! attempt, their checkpoint/restore discipline, and scoped installation of the
//! current [`TracingContext`].

mod checkpoint;
pub mod config;
mod error;
mod guards_context;
mod module_context;
mod scope;
mod tracing_context;
mod uniquify;

pub use checkpoint::Checkpointable;
pub use config::{ConfigError, FrameConfig, ModuleConfig, TraceConfig};
pub use error::ContextError;
pub use guards_context::{GuardsCheckpointState, GuardsContext};
pub use module_context::{ModuleCheckpointState, ModuleContext};
pub use scope::{with_tracing, FrameScope, TracingScope};
pub use tracing_context::{FakeMode, FrameSummary, TracingCheckpoint, TracingContext, TracingHandle};
pub use uniquify::{normalize_attr_name, AttrNameUniquifier, Uniquify};
