use crate::mapper::config::ColumnOverride;
use crate::mapper::naming::normalize;
use std::collections::HashMap;

/// Where an overridden column ends up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub table: String,
    pub column: String,
}

/// Lookup from normalized (table, column) to its redirect target
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    by_table: HashMap<String, HashMap<String, Target>>,
}

impl Overrides {
    pub fn new(entries: &[ColumnOverride]) -> Self {
        let mut by_table: HashMap<String, HashMap<String, Target>> = HashMap::new();

        for o in entries {
            by_table
                .entry(normalize(&o.source_table))
                .or_default()
                .insert(
                    normalize(&o.source_column),
                    Target {
                        table: normalize(&o.target_table),
                        column: normalize(&o.target_column),
                    },
                );
        }

        Overrides { by_table }
    }

    /// Target for a normalized table/column pair, if one is configured
    pub fn resolve(&self, table: &str, column: &str) -> Option<&Target> {
        self.by_table.get(table)?.get(column)
    }
}
