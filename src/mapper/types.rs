use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Table name carried by node bookkeeping leaves
pub const TREE_TABLE: &str = "_tree";

/// Represents a unique identifier for a node (one row of a destination table)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    /// Generate a fresh, globally unique node id
    pub fn generate() -> Self {
        NodeId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of payload a leaf carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Number,
    Boolean,
    /// Anything that is not a JSON scalar, stored as JSON text
    Json,
}

impl DataType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => DataType::String,
            Value::Number(_) => DataType::Number,
            Value::Bool(_) => DataType::Boolean,
            Value::Null | Value::Array(_) | Value::Object(_) => DataType::Json,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Boolean => "boolean",
            DataType::Json => "json",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One flattened record: either a field value or a node's `_tree` record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    /// Kind of `value`
    pub data_type: DataType,

    /// Destination table name, e.g. "doc", "doc__posts"
    pub name: String,

    /// Node (row) this leaf belongs to
    pub id: NodeId,

    /// Node this node was spawned from, `None` at a document root
    pub parent_id: Option<NodeId>,

    /// Column name within the table, e.g. "author__name" or "val"
    pub path: String,

    pub value: Value,
}

impl Leaf {
    pub fn new(name: String, path: String, id: NodeId, parent_id: Option<NodeId>, value: Value) -> Self {
        Leaf {
            data_type: DataType::of(&value),
            name,
            id,
            parent_id,
            path,
            value,
        }
    }

    /// The bookkeeping record naming the table `id` belongs to
    pub fn tree(table: &str, id: NodeId, parent_id: Option<NodeId>) -> Self {
        Leaf {
            data_type: DataType::String,
            name: TREE_TABLE.to_string(),
            id,
            parent_id,
            path: "name".to_string(),
            value: Value::String(table.to_string()),
        }
    }

    pub fn is_tree(&self) -> bool {
        self.name == TREE_TABLE
    }
}
