use crate::error::Result;
use crate::mapper::Leaf;
use std::io::Write;

/// Writes leaves as newline-delimited JSON, one leaf per line
pub struct JsonLinesWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesWriter { writer }
    }

    pub fn write_leaves(&mut self, leaves: &[Leaf]) -> Result<()> {
        for leaf in leaves {
            serde_json::to_writer(&mut self.writer, leaf)?;
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::NodeId;
    use serde_json::{json, Value};

    #[test]
    fn test_jsonl_writer() {
        let mut writer = JsonLinesWriter::new(Vec::new());
        let leaf = Leaf::new("doc".into(), "name".into(), NodeId::new("n1"), None, json!("Alice"));

        writer.write_leaves(&[leaf.clone(), Leaf::tree("doc", NodeId::new("n1"), None)]).unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["value"], "Alice");
        assert_eq!(first["name"], "doc");

        let back: Leaf = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(back, leaf);
    }
}
