#![forbid(unsafe_code)]

/// A symbolic shape constraint produced by an external shape engine.
///
/// `expr` is opaque here; `stack` records where the constraint was introduced.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShapeGuard<E> {
    pub expr: E,
    pub stack: String,
}

impl<E> ShapeGuard<E> {
    pub fn new(expr: E, stack: impl Into<String>) -> Self {
        Self {
            expr,
            stack: stack.into(),
        }
    }
}
