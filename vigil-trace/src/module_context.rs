#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use vigil_guards::SourceRef;

use crate::checkpoint::Checkpointable;
use crate::error::ContextError;
use crate::uniquify::{AttrNameUniquifier, Uniquify};

/// Snapshot of a [`ModuleContext`]'s registry.
#[derive(Clone, Debug, Default)]
pub struct ModuleCheckpointState {
    names_to_sources: BTreeMap<String, SourceRef>,
}

impl ModuleCheckpointState {
    pub fn new(names_to_sources: BTreeMap<String, SourceRef>) -> Self {
        Self { names_to_sources }
    }

    pub fn names_to_sources(&self) -> &BTreeMap<String, SourceRef> {
        &self.names_to_sources
    }

    /// Names registered in exactly one of the two snapshots, or `None` if the key sets
    /// match.
    pub fn diff(&self, other: &ModuleCheckpointState) -> Option<BTreeSet<String>> {
        let ours: BTreeSet<&String> = self.names_to_sources.keys().collect();
        let theirs: BTreeSet<&String> = other.names_to_sources.keys().collect();
        let delta: BTreeSet<String> = ours
            .symmetric_difference(&theirs)
            .map(|name| (*name).clone())
            .collect();
        if delta.is_empty() { None } else { Some(delta) }
    }
}

impl PartialEq for ModuleCheckpointState {
    fn eq(&self, other: &Self) -> bool {
        self.diff(other).is_none()
    }
}

impl Eq for ModuleCheckpointState {}

/// Registry of module attributes and parameters captured by the trace, keyed by a
/// name unique within the trace.
pub struct ModuleContext {
    names_to_sources: BTreeMap<String, SourceRef>,
    uniquifier: Box<dyn Uniquify>,
}

impl ModuleContext {
    pub fn new() -> Self {
        Self::with_uniquifier(Box::new(AttrNameUniquifier::new()))
    }

    pub fn with_uniquifier(uniquifier: Box<dyn Uniquify>) -> Self {
        Self {
            names_to_sources: BTreeMap::new(),
            uniquifier,
        }
    }

    /// Register `source` under a trace-unique version of `name` and return that name.
    ///
    /// The source's own name is meant for evaluation (`getattr(foo, 'bar')[0].weight`)
    /// and is usually unfit as a key; it is still a reasonable `name` to pass here.
    pub fn register(&mut self, name: &str, source: SourceRef) -> Result<String, ContextError> {
        let unique = self.uniquifier.uniquify(name);
        if self.names_to_sources.contains_key(&unique) {
            return Err(ContextError::NameAlreadyRegistered { name: unique });
        }
        tracing::debug!(
            requested = name,
            registered = %unique,
            source = %source.name(),
            "register module source"
        );
        self.names_to_sources.insert(unique.clone(), source);
        Ok(unique)
    }

    pub fn get(&self, name: &str) -> Option<&SourceRef> {
        self.names_to_sources.get(name)
    }

    pub fn names_to_sources(&self) -> &BTreeMap<String, SourceRef> {
        &self.names_to_sources
    }

    pub fn len(&self) -> usize {
        self.names_to_sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names_to_sources.is_empty()
    }
}

impl Default for ModuleContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleContext")
            .field("names_to_sources", &self.names_to_sources)
            .finish_non_exhaustive()
    }
}

// The uniquifier is not part of the snapshot, so names issued before a restore stay
// reserved.
impl Checkpointable<ModuleCheckpointState> for ModuleContext {
    fn copy_graphstate(&self) -> ModuleCheckpointState {
        tracing::debug!(modules = self.names_to_sources.len(), "checkpoint modules");
        ModuleCheckpointState::new(self.names_to_sources.clone())
    }

    fn restore_graphstate(&mut self, state: ModuleCheckpointState) {
        tracing::debug!(
            discarded = self.names_to_sources.len(),
            restored = state.names_to_sources.len(),
            "restore modules"
        );
        self.names_to_sources = state.names_to_sources;
    }
}
