#![allow(dead_code)]

use std::sync::Arc;

use vigil_guards::{CreateFn, Guard, GuardSource, Source, SourceRef};

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

pub fn local(path: &str) -> SourceRef {
    Arc::new(PathSource {
        path: path.to_string(),
        scope: GuardSource::Local,
    })
}

pub fn nn_param(path: &str) -> SourceRef {
    Arc::new(PathSource {
        path: path.to_string(),
        scope: GuardSource::LocalNnModule,
    })
}

pub fn type_match() -> CreateFn {
    CreateFn::new("TYPE_MATCH", |_, _| Ok(()))
}

pub fn guard(path: &str, create_fn: &CreateFn) -> Guard {
    local(path).make_guard(create_fn, false).expect("local sources are guardable")
}
