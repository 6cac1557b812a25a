//! JSON flattening - turn nested documents into typed leaf records
//!
//! The walker descends a parsed document depth-first. Object fields are
//! inlined into the current row with `__`-joined column paths; array
//! elements become rows of a child table named after the field that held
//! the array. Configured table boundaries and column overrides move parts
//! of a document into tables of their own.

pub mod config;
pub mod naming;
pub mod overrides;
pub mod registry;
pub mod types;
pub mod walker;

pub use config::{ColumnOverride, Config, Substitution};
pub use naming::normalize;
pub use overrides::{Overrides, Target};
pub use registry::NodeRegistry;
pub use types::{DataType, Leaf, NodeId, TREE_TABLE};
pub use walker::Mapper;
