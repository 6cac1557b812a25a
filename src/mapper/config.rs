//! Mapper configuration: overrides, substitutions and table boundaries.

use crate::error::{LeafError, Result};
use crate::mapper::naming::normalize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Redirect one (table, column) pair to another table and column.
///
/// In YAML either a mapping or the sequence form
/// `[source_table, source_column, target_table, target_column]` is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OverrideRepr")]
pub struct ColumnOverride {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
}

impl ColumnOverride {
    pub fn new(
        source_table: impl Into<String>,
        source_column: impl Into<String>,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        ColumnOverride {
            source_table: source_table.into(),
            source_column: source_column.into(),
            target_table: target_table.into(),
            target_column: target_column.into(),
        }
    }

    /// Parse the comma-separated form `table,column,new_table,new_column`
    pub fn parse(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.split(',').map(str::trim).collect();
        match parts.as_slice() {
            [st, sc, tt, tc] => Ok(Self::new(*st, *sc, *tt, *tc)),
            _ => Err(LeafError::config(format!(
                "column override '{}' must have 4 comma-separated fields, found {}",
                text,
                parts.len()
            ))),
        }
    }
}

/// Literal substring replacement applied to every occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SubstitutionRepr")]
pub struct Substitution {
    pub from: String,
    pub to: String,
}

impl Substitution {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Substitution {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Parse the `from=to` form
    pub fn parse(text: &str) -> Result<Self> {
        match text.split_once('=') {
            Some((from, to)) => Ok(Self::new(from, to)),
            None => Err(LeafError::config(format!(
                "substitution '{}' must have the form from=to",
                text
            ))),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OverrideRepr {
    Seq(String, String, String, String),
    Map {
        source_table: String,
        source_column: String,
        target_table: String,
        target_column: String,
    },
}

impl From<OverrideRepr> for ColumnOverride {
    fn from(repr: OverrideRepr) -> Self {
        match repr {
            OverrideRepr::Seq(st, sc, tt, tc) => ColumnOverride::new(st, sc, tt, tc),
            OverrideRepr::Map {
                source_table,
                source_column,
                target_table,
                target_column,
            } => ColumnOverride::new(source_table, source_column, target_table, target_column),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SubstitutionRepr {
    Seq(String, String),
    Map { from: String, to: String },
}

impl From<SubstitutionRepr> for Substitution {
    fn from(repr: SubstitutionRepr) -> Self {
        match repr {
            SubstitutionRepr::Seq(from, to) | SubstitutionRepr::Map { from, to } => Substitution::new(from, to),
        }
    }
}

/// Configuration for the mapping process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fields pulled out of their structural table into another one
    pub column_overrides: Vec<ColumnOverride>,

    /// Substitutions applied to normalized column paths, in order
    pub column_subs: Vec<Substitution>,

    /// Column paths at which nested objects/arrays start their own table
    pub table_names: Vec<String>,

    /// Substitutions applied to normalized table names, in order
    pub table_subs: Vec<Substitution>,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| LeafError::read(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject entries that could never match or that contradict each other.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashMap<(String, String), (String, String)> = HashMap::new();

        for o in &self.column_overrides {
            let fields = [&o.source_table, &o.source_column, &o.target_table, &o.target_column];
            if fields.iter().any(|f| f.trim().is_empty()) {
                return Err(LeafError::config(format!(
                    "column override {:?} has an empty field",
                    o
                )));
            }

            let source = (normalize(&o.source_table), normalize(&o.source_column));
            let target = (normalize(&o.target_table), normalize(&o.target_column));
            if let Some(existing) = seen.get(&source) {
                if *existing != target {
                    return Err(LeafError::config(format!(
                        "conflicting overrides for {}.{}: {}.{} and {}.{}",
                        source.0, source.1, existing.0, existing.1, target.0, target.1
                    )));
                }
            }
            seen.insert(source, target);
        }

        for sub in self.column_subs.iter().chain(&self.table_subs) {
            if sub.from.is_empty() {
                return Err(LeafError::config(format!(
                    "substitution to '{}' has an empty 'from'",
                    sub.to
                )));
            }
        }

        if self.table_names.iter().any(|t| t.trim().is_empty()) {
            return Err(LeafError::config("table boundary paths must not be empty"));
        }

        Ok(())
    }

    /// Normalized table-boundary paths
    pub(crate) fn boundaries(&self) -> Vec<String> {
        self.table_names.iter().map(|t| normalize(t)).collect()
    }
}
