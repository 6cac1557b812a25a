//! Graphviz view of the tables a set of leaves describes.

use crate::mapper::{DataType, Leaf, NodeId};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

static PLAIN_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Columns of one table, sorted by path
type Columns = BTreeMap<String, DataType>;

#[derive(Debug, Clone, Default)]
struct SubGraph {
    name: String,
    tables: BTreeMap<String, Columns>,
    edges: BTreeSet<(String, String)>,
}

impl SubGraph {
    fn from_leaves(name: &str, leaves: &[Leaf]) -> Self {
        let table_of: HashMap<&NodeId, &str> = leaves
            .iter()
            .filter(|l| l.is_tree())
            .filter_map(|l| match &l.value {
                Value::String(table) => Some((&l.id, table.as_str())),
                _ => None,
            })
            .collect();

        let mut graph = SubGraph {
            name: name.to_string(),
            ..SubGraph::default()
        };

        for leaf in leaves.iter().filter(|l| !l.is_tree()) {
            graph
                .tables
                .entry(leaf.name.clone())
                .or_default()
                .insert(leaf.path.clone(), leaf.data_type);

            let parent_table = leaf.parent_id.as_ref().and_then(|p| table_of.get(p));
            if let Some(parent_table) = parent_table {
                if *parent_table != leaf.name {
                    graph.edges.insert((parent_table.to_string(), leaf.name.clone()));
                }
            }
        }

        graph
    }
}

/// A directed graph of tables, one subgraph per mapped document
#[derive(Debug, Clone)]
pub struct Graph {
    name: String,
    subgraphs: Vec<SubGraph>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Graph {
            name: name.into(),
            subgraphs: Vec::new(),
        }
    }

    /// Add the tables and parent/child edges found in one document's leaves
    pub fn add_subgraph(&mut self, name: &str, leaves: &[Leaf]) {
        self.subgraphs.push(SubGraph::from_leaves(name, leaves));
    }

    pub fn is_empty(&self) -> bool {
        self.subgraphs.is_empty()
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph {} {{", quote(&self.name))?;

        for sub in &self.subgraphs {
            writeln!(f, "\tsubgraph {} {{", quote(&sub.name))?;
            for (table, columns) in &sub.tables {
                writeln!(f, "\t\t{} [ label=\"{}\", shape=record ];", quote(table), label(table, columns))?;
            }
            writeln!(f, "\t}}")?;

            for (parent, child) in &sub.edges {
                writeln!(f, "\t{}->{};", quote(parent), quote(child))?;
            }
        }

        writeln!(f, "}}")
    }
}

/// `{short name|+ path : type\l...}` record label
fn label(table: &str, columns: &Columns) -> String {
    let short = table.rsplit("__").next().unwrap_or(table);

    let mut s = format!("{{{}|", escape_record(short));
    for (path, data_type) in columns {
        s.push_str(&format!("+ {} : {}\\l", escape_record(path), data_type));
    }
    s.push('}');
    s
}

fn escape_record(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '{' | '}' | '|' | '<' | '>' | '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn quote(id: &str) -> String {
    if PLAIN_ID.is_match(id) {
        id.to_string()
    } else {
        format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\""))
    }
}
