#![forbid(unsafe_code)]

/// State that can be snapshotted and later rolled back to.
///
/// `copy_graphstate` emits a snapshot that `restore_graphstate` accepts. Restoring is a
/// total overwrite, never a merge. When to snapshot is up to the caller; the trait
/// promises nothing about calling order or repeated restores.
pub trait Checkpointable<T> {
    fn copy_graphstate(&self) -> T;

    fn restore_graphstate(&mut self, state: T);
}
