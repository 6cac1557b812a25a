//! # json2leaf - flatten JSON documents into typed leaf records
//!
//! Arbitrarily nested JSON (or XML converted to JSON) is normalized into a
//! flat sequence of leaves suitable for bulk-loading into one relational
//! table. Generated node ids keep the parent/child structure.
//!
//! ## Modules
//!
//! - **mapper**: the recursive flattening walk, naming, overrides and node registry
//! - **output**: COPY bulk-load script, JSON Lines and Graphviz writers
//! - **post**: redaction and replacement passes over finished leaves
//! - **document** / **xml**: loading `.json` and `.xml` inputs
//!
//! ## Quick Start
//!
//! ```rust
//! use json2leaf::{Config, Mapper};
//! use serde_json::json;
//!
//! # fn main() -> json2leaf::Result<()> {
//! let doc = json!({
//!     "id": 1,
//!     "author": {"name": "Alice"},
//!     "tags": ["rust", "json"]
//! });
//!
//! let mut mapper = Mapper::new(Config::default())?;
//! let leaves = mapper.map("post", &doc);
//!
//! // post.id, post.author__name, two post__tags.val rows,
//! // and one _tree record per node
//! assert_eq!(leaves.iter().filter(|l| !l.is_tree()).count(), 4);
//! # Ok(())
//! # }
//! ```

use std::io::Write;
use std::path::Path;

pub mod document;
pub mod error;
pub mod mapper;
pub mod output;
pub mod post;
pub mod xml;

// Re-export commonly used types for convenience
pub use error::{LeafError, Result};
pub use mapper::{ColumnOverride, Config, DataType, Leaf, Mapper, NodeId, NodeRegistry, Substitution};
pub use output::{CopyWriter, Graph, JsonLinesWriter};
pub use post::{Redactor, Replacer};

/// Main entry point: load one `.json`/`.xml` file and map it under its file stem
pub fn map_file(path: &Path, config: Config) -> Result<Vec<Leaf>> {
    let value = document::load(path)?;
    let mut mapper = Mapper::new(config)?;
    Ok(mapper.map(&document::table_name(path), &value))
}

/// Map one file and append its rows to a COPY script
pub fn map_file_to_copy<W: Write>(path: &Path, config: Config, writer: &mut CopyWriter<W>) -> Result<usize> {
    let leaves = map_file(path, config)?;
    writer.write_leaves(&leaves)?;
    Ok(leaves.len())
}
