#![forbid(unsafe_code)]

use std::collections::HashSet;

use vigil_guards::{Guard, GuardEnvExpr, GuardedClass, ObjectRef};

use crate::checkpoint::Checkpointable;
use crate::error::ContextError;

/// Snapshot of a [`GuardsContext`]'s guard set.
#[derive(Clone, Debug, Default)]
pub struct GuardsCheckpointState {
    dynamo_guards: HashSet<Guard>,
}

impl GuardsCheckpointState {
    pub fn new(dynamo_guards: HashSet<Guard>) -> Self {
        Self { dynamo_guards }
    }

    pub fn dynamo_guards(&self) -> &HashSet<Guard> {
        &self.dynamo_guards
    }

    /// Guards present here but missing from `other`, or `None` when there are none.
    ///
    /// The difference is one-directional: `a.diff(b)` and `b.diff(a)` generally differ.
    pub fn diff(&self, other: &GuardsCheckpointState) -> Option<HashSet<Guard>> {
        let delta: HashSet<Guard> = self
            .dynamo_guards
            .difference(&other.dynamo_guards)
            .cloned()
            .collect();
        if delta.is_empty() { None } else { Some(delta) }
    }

    /// Every guard of this snapshot is also in `other`.
    pub fn is_covered_by(&self, other: &GuardsCheckpointState) -> bool {
        self.diff(other).is_none()
    }
}

impl PartialEq for GuardsCheckpointState {
    fn eq(&self, other: &Self) -> bool {
        self.dynamo_guards == other.dynamo_guards
    }
}

impl Eq for GuardsCheckpointState {}

/// All guards accumulated by one trace attempt.
///
/// Only `dynamo_guards` takes part in checkpointing; `aotautograd_guards` is side
/// information that survives a restore.
#[derive(Debug, Default)]
pub struct GuardsContext {
    dynamo_guards: HashSet<Guard>,
    aotautograd_guards: Vec<GuardEnvExpr>,
}

impl GuardsContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when an equal guard was already recorded.
    pub fn add(&mut self, guard: Guard) -> bool {
        let name = guard.name().to_string();
        let inserted = self.dynamo_guards.insert(guard);
        tracing::debug!(guard = %name, inserted, total = self.dynamo_guards.len(), "record guard");
        inserted
    }

    pub fn contains(&self, guard: &Guard) -> bool {
        self.dynamo_guards.contains(guard)
    }

    pub fn len(&self) -> usize {
        self.dynamo_guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dynamo_guards.is_empty()
    }

    pub fn dynamo_guards(&self) -> &HashSet<Guard> {
        &self.dynamo_guards
    }

    /// Guards in their deterministic sort order.
    pub fn sorted_guards(&self) -> Vec<&Guard> {
        let mut guards: Vec<&Guard> = self.dynamo_guards.iter().collect();
        guards.sort();
        guards
    }

    /// Attach export metadata to the recorded guard equal to `guard`.
    pub fn set_export_info(
        &mut self,
        guard: &Guard,
        guard_type: impl Into<String>,
        guarded_class: Option<GuardedClass>,
        code_list: Vec<String>,
        obj_weakref: Option<ObjectRef>,
    ) -> Result<(), ContextError> {
        let mut stored = self
            .dynamo_guards
            .take(guard)
            .ok_or_else(|| ContextError::UnknownGuard {
                name: guard.name().to_string(),
            })?;
        let result = stored.set_export_info(guard_type, guarded_class, code_list, obj_weakref);
        self.dynamo_guards.insert(stored);
        result.map_err(ContextError::from)
    }

    pub fn add_env_expr(&mut self, expr: impl Into<GuardEnvExpr>) {
        self.aotautograd_guards.push(expr.into());
    }

    pub fn aotautograd_guards(&self) -> &[GuardEnvExpr] {
        &self.aotautograd_guards
    }
}

impl Checkpointable<GuardsCheckpointState> for GuardsContext {
    fn copy_graphstate(&self) -> GuardsCheckpointState {
        tracing::debug!(guards = self.dynamo_guards.len(), "checkpoint guards");
        GuardsCheckpointState::new(self.dynamo_guards.clone())
    }

    fn restore_graphstate(&mut self, state: GuardsCheckpointState) {
        tracing::debug!(
            discarded = self.dynamo_guards.len(),
            restored = state.dynamo_guards.len(),
            "restore guards"
        );
        self.dynamo_guards = state.dynamo_guards;
    }
}
