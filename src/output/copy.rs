//! PostgreSQL `COPY ... FROM stdin` script for the `nodes` table.

use crate::error::Result;
use crate::mapper::Leaf;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::io::Write;

const INIT_SCRIPT: &str = "DROP TABLE IF EXISTS nodes CASCADE;

CREATE TABLE nodes (
    id VARCHAR,
    parent_id VARCHAR,
    name VARCHAR NOT NULL,
    path VARCHAR NOT NULL,
    data_type VARCHAR NOT NULL,
    value TEXT
);
";

const COPY_HEADER: &str = "COPY nodes (id, parent_id, name, path, data_type, value) FROM stdin;\n";

const COPY_NULL: &str = "\\N";

// Content hashes in file names version a document but mean nothing as table names
static HASH_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"__[a-f0-9]{32}__").unwrap());

static HASH_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"__[a-f0-9]{32}$").unwrap());

/// Writes leaves as rows of a bulk-load script
pub struct CopyWriter<W: Write> {
    writer: W,
    started: bool,
}

impl<W: Write> CopyWriter<W> {
    pub fn new(writer: W) -> Self {
        CopyWriter {
            writer,
            started: false,
        }
    }

    /// (Re)create the destination table
    pub fn write_init_script(&mut self) -> Result<()> {
        self.writer.write_all(INIT_SCRIPT.as_bytes())?;
        Ok(())
    }

    /// Append one row per leaf, opening the COPY block on first use
    pub fn write_leaves(&mut self, leaves: &[Leaf]) -> Result<()> {
        if !self.started {
            self.writer.write_all(COPY_HEADER.as_bytes())?;
            self.started = true;
        }

        for leaf in leaves {
            let value = if leaf.is_tree() {
                match &leaf.value {
                    Value::String(table) => escape(&clean_name(table)),
                    other => format_value(other),
                }
            } else {
                format_value(&leaf.value)
            };

            writeln!(
                self.writer,
                "{}\t{}\t{}\t{}\t{}\t{}",
                escape(leaf.id.as_str()),
                leaf.parent_id.as_ref().map_or_else(|| COPY_NULL.to_string(), |p| escape(p.as_str())),
                escape(&clean_name(&leaf.name)),
                escape(&leaf.path),
                leaf.data_type,
                value,
            )?;
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Terminate the COPY block and hand back the underlying writer
    pub fn finish(mut self) -> Result<W> {
        if self.started {
            self.writer.write_all(b"\\.\n")?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Drop 32-hex-digit content hashes from a table name
pub fn clean_name(name: &str) -> String {
    let name = HASH_SEGMENT.replace_all(name, "__");
    HASH_SUFFIX.replace_all(&name, "").into_owned()
}

/// Escape a field for COPY text format
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\0' => {}
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => COPY_NULL.to_string(),
        Value::String(s) => escape(s),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => escape(&value.to_string()),
    }
}
