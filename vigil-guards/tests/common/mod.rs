#![allow(dead_code)]

use std::sync::Arc;

use vigil_guards::{GuardSource, Source, SourceRef};

/// A plain named access path, enough to drive guard construction in tests.
#[derive(Debug)]
pub struct PathSource {
    pub path: String,
    pub scope: GuardSource,
}

impl Source for PathSource {
    fn guard_source(&self) -> GuardSource {
        self.scope
    }

    fn name(&self) -> String {
        self.path.clone()
    }
}

pub fn source(path: &str, scope: GuardSource) -> SourceRef {
    Arc::new(PathSource {
        path: path.to_string(),
        scope,
    })
}

pub fn local(path: &str) -> SourceRef {
    source(path, GuardSource::Local)
}
