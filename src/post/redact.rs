//! Blunt masking of values that look like personal names.
//!
//! Meant to flag fields that were not explicitly excluded, not to guarantee
//! anonymity.

use crate::mapper::Leaf;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

pub const REDACTED: &str = "[PII redacted]";

static PERSON_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Z]([a-z]+|\.)(?:\s+[A-Z]([a-z]+|\.))*(?:\s+[a-z][a-z\-]+){0,2}\s+[A-Z]([a-z]+|\.)").unwrap()
});

/// Mask every name-like span, or `None` if nothing matched
pub fn redact(s: &str) -> Option<String> {
    if PERSON_NAME.is_match(s) {
        Some(PERSON_NAME.replace_all(s, REDACTED).into_owned())
    } else {
        None
    }
}

/// Applies [`redact`] to the string values of field leaves
#[derive(Debug, Default)]
pub struct Redactor {
    redacted: usize,
}

impl Redactor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, leaves: Vec<Leaf>) -> Vec<Leaf> {
        leaves
            .into_iter()
            .map(|mut leaf| {
                if leaf.is_tree() {
                    return leaf;
                }
                if let Value::String(s) = &leaf.value {
                    if let Some(masked) = redact(s) {
                        debug!("Redacted {}.{}", leaf.name, leaf.path);
                        leaf.value = Value::String(masked);
                        self.redacted += 1;
                    }
                }
                leaf
            })
            .collect()
    }

    /// Number of values masked so far
    pub fn redacted(&self) -> usize {
        self.redacted
    }
}
