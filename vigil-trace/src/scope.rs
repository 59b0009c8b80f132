#![forbid(unsafe_code)]

use std::cell::RefCell;

use crate::error::ContextError;
use crate::tracing_context::{FrameStack, FrameSummary, TracingContext, TracingHandle};

thread_local! {
    static CURRENT_TRACING_CONTEXT: RefCell<Option<TracingHandle>> = const { RefCell::new(None) };
}

impl TracingContext {
    /// The context installed on this thread, or `None` outside any tracing scope.
    pub fn get() -> Option<TracingHandle> {
        CURRENT_TRACING_CONTEXT.with(|slot| slot.borrow().clone())
    }

    pub fn is_active() -> bool {
        CURRENT_TRACING_CONTEXT.with(|slot| slot.borrow().is_some())
    }

    /// Run `f` with `frame_summary` pushed onto the current context's frame stack.
    pub fn current_frame<R>(
        frame_summary: FrameSummary,
        f: impl FnOnce() -> R,
    ) -> Result<R, ContextError> {
        let _frame = FrameScope::enter(frame_summary)?;
        Ok(f())
    }
}

/// Installs a context as current until dropped, then reinstalls whatever was current
/// before (possibly nothing).
///
/// Scopes nest like a stack as long as they are dropped in reverse order of entry.
#[must_use = "the context is uninstalled as soon as the scope is dropped"]
pub struct TracingScope {
    installed: TracingHandle,
    previous: Option<TracingHandle>,
}

impl TracingScope {
    pub fn enter(context: TracingHandle) -> Self {
        let previous = CURRENT_TRACING_CONTEXT.with(|slot| slot.replace(Some(context.clone())));
        tracing::debug!(nested = previous.is_some(), "enter tracing context");
        Self {
            installed: context,
            previous,
        }
    }

    pub fn context(&self) -> &TracingHandle {
        &self.installed
    }
}

impl Drop for TracingScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let restores_outer = previous.is_some();
        // The slot is already gone if this runs during thread teardown.
        let _ = CURRENT_TRACING_CONTEXT.try_with(|slot| *slot.borrow_mut() = previous);
        tracing::debug!(restores_outer, "exit tracing context");
    }
}

/// Run `f` with `context` installed as the current tracing context.
pub fn with_tracing<R>(context: TracingHandle, f: impl FnOnce(&TracingHandle) -> R) -> R {
    let scope = TracingScope::enter(context);
    f(scope.context())
}

/// Keeps a frame on the current context's frame stack until dropped.
///
/// The frame is popped from the context it was pushed onto, even if another context has
/// been installed in the meantime. Borrows of the context itself never block the pop.
#[must_use = "the frame is popped as soon as the scope is dropped"]
pub struct FrameScope {
    frames: FrameStack,
}

impl FrameScope {
    pub fn enter(frame_summary: FrameSummary) -> Result<Self, ContextError> {
        let context = TracingContext::get().ok_or(ContextError::NoActiveContext)?;
        let frames = context
            .try_borrow()
            .map_err(|_| ContextError::ContextBorrowed)?
            .frames();
        frames.push(frame_summary)?;
        Ok(Self { frames })
    }
}

impl Drop for FrameScope {
    fn drop(&mut self) {
        self.frames.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_outside_scope_is_none() {
        assert!(TracingContext::get().is_none());
        assert!(!TracingContext::is_active());
    }

    #[test]
    fn test_scope_installs_and_uninstalls() {
        let handle = TracingContext::new(None).into_handle();
        {
            let _scope = TracingScope::enter(handle.clone());
            let current = TracingContext::get().unwrap();
            assert!(std::rc::Rc::ptr_eq(&current, &handle));
        }
        assert!(TracingContext::get().is_none());
    }

    #[test]
    fn test_frame_scope_requires_active_context() {
        let err = FrameScope::enter(FrameSummary::new("a.py", 1, "f")).err().unwrap();
        assert!(matches!(err, ContextError::NoActiveContext));
    }

    #[test]
    fn test_frame_pops_from_the_context_it_was_pushed_onto() {
        let outer = TracingContext::new(None).into_handle();
        let inner = TracingContext::new(None).into_handle();

        with_tracing(outer.clone(), |_| {
            let frame = FrameScope::enter(FrameSummary::new("a.py", 1, "f")).unwrap();
            let scope = TracingScope::enter(inner.clone());
            drop(frame);
            drop(scope);
        });

        assert!(outer.borrow().frame_summary_stack().is_empty());
        assert!(inner.borrow().frame_summary_stack().is_empty());
    }

    #[test]
    fn test_frame_entered_while_context_is_read() {
        let handle = TracingContext::new(None).into_handle();
        with_tracing(handle.clone(), |ctx| {
            let reader = ctx.borrow();
            let depth = TracingContext::current_frame(FrameSummary::new("a.py", 1, "f"), || {
                reader.frame_summary_stack().len()
            })
            .unwrap();
            assert_eq!(depth, 1);
            assert!(reader.frame_summary_stack().is_empty());
        });
    }

    #[test]
    fn test_frame_refused_while_context_is_mutably_borrowed() {
        let handle = TracingContext::new(None).into_handle();
        with_tracing(handle.clone(), |ctx| {
            let _writer = ctx.borrow_mut();
            let err = TracingContext::current_frame(FrameSummary::new("a.py", 1, "f"), || ())
                .unwrap_err();
            assert!(matches!(err, ContextError::ContextBorrowed));
        });
        assert!(handle.borrow().frame_summary_stack().is_empty());
    }

    #[test]
    fn test_frame_popped_when_result_borrows_context() {
        let handle = TracingContext::new(None).into_handle();
        with_tracing(handle.clone(), |ctx| {
            let held = TracingContext::current_frame(FrameSummary::new("a.py", 1, "f"), || {
                ctx.borrow()
            })
            .unwrap();
            assert!(held.frame_summary_stack().is_empty());
        });
        assert!(handle.borrow().frame_summary_stack().is_empty());
    }
}
