#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static NON_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("regex compile"));

/// Turns a requested attribute name into one not handed out before.
///
/// Implementations must be deterministic for the lifetime of the owning
/// [`crate::ModuleContext`] and must never return a name twice.
pub trait Uniquify: Send {
    fn uniquify(&mut self, name: &str) -> String;
}

/// Default uniquifier: normalizes a source expression into an identifier and
/// suffixes a counter on collision.
///
/// `L['self'].layers[0].weight` becomes `L_self_layers_0_weight`, then
/// `L_self_layers_0_weight_1` the second time it is requested.
#[derive(Clone, Debug)]
pub struct AttrNameUniquifier {
    separator: String,
    issued: HashSet<String>,
}

impl AttrNameUniquifier {
    pub fn new() -> Self {
        Self::with_separator("_")
    }

    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            issued: HashSet::new(),
        }
    }

    pub fn issued(&self) -> usize {
        self.issued.len()
    }
}

impl Default for AttrNameUniquifier {
    fn default() -> Self {
        Self::new()
    }
}

pub fn normalize_attr_name(name: &str) -> String {
    let replaced = NON_IDENT.replace_all(name, "_");
    let trimmed = replaced.trim_end_matches('_');
    if trimmed.is_empty() {
        return "attr".to_string();
    }
    if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{trimmed}")
    } else {
        trimmed.to_string()
    }
}

impl Uniquify for AttrNameUniquifier {
    fn uniquify(&mut self, name: &str) -> String {
        let base = normalize_attr_name(name);
        let mut candidate = base.clone();
        let mut n = 1usize;
        while self.issued.contains(&candidate) {
            candidate = format!("{base}{}{n}", self.separator);
            n += 1;
        }
        self.issued.insert(candidate.clone());
        candidate
    }
}
