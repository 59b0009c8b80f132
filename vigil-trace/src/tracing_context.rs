#![forbid(unsafe_code)]

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use vigil_guards::SourceRef;

use crate::checkpoint::Checkpointable;
use crate::config::TraceConfig;
use crate::error::ContextError;
use crate::guards_context::{GuardsCheckpointState, GuardsContext};
use crate::module_context::{ModuleCheckpointState, ModuleContext};
use crate::uniquify::AttrNameUniquifier;

/// Handle to the fake-execution mode the trace runs under. Opaque to this crate.
pub type FakeMode = Arc<dyn Any + Send + Sync>;

/// Shared handle through which a context is installed as current.
pub type TracingHandle = Rc<RefCell<TracingContext>>;

/// One frame of the user program the tracer is currently inside.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameSummary {
    pub filename: String,
    pub lineno: u32,
    pub name: String,
    pub line: Option<String>,
}

impl FrameSummary {
    pub fn new(filename: impl Into<String>, lineno: u32, name: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            lineno,
            name: name.into(),
            line: None,
        }
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.line = Some(line.into());
        self
    }
}

impl fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File \"{}\", line {}, in {}", self.filename, self.lineno, self.name)?;
        if let Some(line) = &self.line {
            write!(f, "\n    {}", line.trim())?;
        }
        Ok(())
    }
}

/// Frame stack shared between a context and the [`crate::FrameScope`]s pushed onto it.
///
/// It lives in its own cell so frames can be entered and left while the context itself
/// is borrowed.
#[derive(Clone, Debug)]
pub(crate) struct FrameStack {
    frames: Rc<RefCell<Vec<FrameSummary>>>,
    max_depth: usize,
}

impl FrameStack {
    fn new(max_depth: usize) -> Self {
        Self {
            frames: Rc::new(RefCell::new(Vec::new())),
            max_depth,
        }
    }

    pub(crate) fn push(&self, frame: FrameSummary) -> Result<(), ContextError> {
        let mut frames = self.frames.borrow_mut();
        if frames.len() >= self.max_depth {
            return Err(ContextError::FrameDepthExceeded {
                max_depth: self.max_depth,
            });
        }
        tracing::trace!(frame = %frame, depth = frames.len() + 1, "push frame");
        frames.push(frame);
        Ok(())
    }

    pub(crate) fn pop(&self) -> Option<FrameSummary> {
        let mut frames = self.frames.borrow_mut();
        let frame = frames.pop();
        tracing::trace!(depth = frames.len(), "pop frame");
        frame
    }

    fn to_vec(&self) -> Vec<FrameSummary> {
        self.frames.borrow().clone()
    }

    fn last(&self) -> Option<FrameSummary> {
        self.frames.borrow().last().cloned()
    }
}

/// Snapshot of everything in a [`TracingContext`] that a failed trace attempt must
/// roll back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TracingCheckpoint {
    pub guards: GuardsCheckpointState,
    pub modules: ModuleCheckpointState,
}

/// Everything accumulated while tracing one frame.
///
/// Subsystems reach the current context through [`TracingContext::get`] instead of
/// having their state plumbed back to where frame interpretation started. Guard
/// accumulation across the tracer, the shape engine and later compiler passes is the
/// main example.
#[derive(Debug)]
pub struct TracingContext {
    pub guards_context: GuardsContext,
    pub module_context: ModuleContext,
    fake_mode: Option<FakeMode>,
    frame_summary_stack: FrameStack,
    aot_autograd_arg_pos_to_source: Vec<SourceRef>,
    config: TraceConfig,
}

impl TracingContext {
    pub fn new(fake_mode: Option<FakeMode>) -> Self {
        Self::with_config(fake_mode, TraceConfig::default())
    }

    pub fn with_config(fake_mode: Option<FakeMode>, config: TraceConfig) -> Self {
        let uniquifier = AttrNameUniquifier::with_separator(config.modules.separator.clone());
        Self {
            guards_context: GuardsContext::new(),
            module_context: ModuleContext::with_uniquifier(Box::new(uniquifier)),
            fake_mode,
            frame_summary_stack: FrameStack::new(config.frames.max_depth),
            aot_autograd_arg_pos_to_source: Vec::new(),
            config,
        }
    }

    pub fn into_handle(self) -> TracingHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn fake_mode(&self) -> Option<&FakeMode> {
        self.fake_mode.as_ref()
    }

    pub fn fake_mode_as<T: Any>(&self) -> Option<&T> {
        self.fake_mode.as_deref()?.downcast_ref::<T>()
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Frames entered through [`crate::FrameScope`], outermost first.
    pub fn frame_summary_stack(&self) -> Vec<FrameSummary> {
        self.frame_summary_stack.to_vec()
    }

    pub fn current_frame_summary(&self) -> Option<FrameSummary> {
        self.frame_summary_stack.last()
    }

    /// Append the source of the next compiled-graph argument and return its position.
    pub fn record_arg_source(&mut self, source: SourceRef) -> usize {
        self.aot_autograd_arg_pos_to_source.push(source);
        self.aot_autograd_arg_pos_to_source.len() - 1
    }

    pub fn aot_autograd_arg_pos_to_source(&self) -> &[SourceRef] {
        &self.aot_autograd_arg_pos_to_source
    }

    pub(crate) fn frames(&self) -> FrameStack {
        self.frame_summary_stack.clone()
    }
}

// Frames and both append-only lists stay outside the checkpoint.
impl Checkpointable<TracingCheckpoint> for TracingContext {
    fn copy_graphstate(&self) -> TracingCheckpoint {
        TracingCheckpoint {
            guards: self.guards_context.copy_graphstate(),
            modules: self.module_context.copy_graphstate(),
        }
    }

    fn restore_graphstate(&mut self, state: TracingCheckpoint) {
        self.guards_context.restore_graphstate(state.guards);
        self.module_context.restore_graphstate(state.modules);
    }
}
