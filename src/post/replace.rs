use crate::error::{LeafError, Result};
use crate::mapper::Leaf;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Case-insensitive exact-match substitution of names, paths and string values
#[derive(Debug, Clone, Default)]
pub struct Replacer {
    table: HashMap<String, String>,
}

#[derive(Deserialize)]
struct Pair(String, String);

impl Replacer {
    /// Build from `(replacement, original)` pairs
    pub fn new<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let table = pairs
            .into_iter()
            .map(|(replacement, original)| (original.into().to_lowercase(), replacement.into()))
            .collect();

        Replacer { table }
    }

    /// Load `[replacement, original]` pairs from a YAML list
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| LeafError::read(path, e))?;
        let pairs: Vec<Pair> = serde_yaml::from_str(&content)?;
        Ok(Self::new(pairs.into_iter().map(|Pair(r, o)| (r, o))))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn apply(&self, leaves: Vec<Leaf>) -> Vec<Leaf> {
        leaves
            .into_iter()
            .map(|mut leaf| {
                leaf.name = self.get(leaf.name);
                leaf.path = self.get(leaf.path);
                if let Value::String(s) = leaf.value {
                    leaf.value = Value::String(self.get(s));
                }
                leaf
            })
            .collect()
    }

    fn get(&self, s: String) -> String {
        match self.table.get(&s.to_lowercase()) {
            Some(replacement) => replacement.clone(),
            None => s,
        }
    }
}
