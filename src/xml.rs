//! XML to JSON conversion ahead of mapping.
//!
//! Attributes become `-name` keys, text that sits next to attributes or child
//! elements becomes `#content`, and repeated child elements become arrays.
//! The normalizer strips `-` and `#`, so these markers vanish from column names.

use crate::error::{LeafError, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::io::Read;
use xml::reader::{EventReader, XmlEvent};

#[derive(Debug, Default)]
struct Element {
    name: String,
    fields: Map<String, Value>,
    repeated: HashSet<String>,
    text: String,
    has_children: bool,
}

impl Element {
    fn new(name: String) -> Self {
        Element {
            name,
            ..Element::default()
        }
    }

    fn add_child(&mut self, name: String, value: Value) {
        self.has_children = true;

        match self.fields.get_mut(&name) {
            None => {
                self.fields.insert(name, value);
            }
            Some(Value::Array(items)) if self.repeated.contains(&name) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
                self.repeated.insert(name);
            }
        }
    }

    fn into_value(mut self) -> Value {
        let text = self.text.trim();

        if self.fields.is_empty() && !self.has_children {
            return Value::String(text.to_string());
        }

        if !text.is_empty() {
            self.fields.insert("#content".to_string(), Value::String(text.to_string()));
        }
        Value::Object(self.fields)
    }
}

/// Convert an XML document to a JSON object keyed by its root element
pub fn to_json<R: Read>(reader: R) -> Result<Value> {
    let mut stack: Vec<Element> = Vec::new();

    for event in EventReader::new(reader) {
        match event.map_err(LeafError::parse)? {
            XmlEvent::StartElement { name, attributes, .. } => {
                let mut element = Element::new(name.local_name);
                for attr in attributes {
                    element
                        .fields
                        .insert(format!("-{}", attr.name.local_name), Value::String(attr.value));
                }
                stack.push(element);
            }
            XmlEvent::Characters(text) | XmlEvent::CData(text) => {
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&text);
                }
            }
            XmlEvent::EndElement { .. } => {
                let element = stack
                    .pop()
                    .ok_or_else(|| LeafError::parse("unbalanced end element"))?;
                let name = element.name.clone();
                let value = element.into_value();

                match stack.last_mut() {
                    Some(parent) => parent.add_child(name, value),
                    None => {
                        let mut root = Map::new();
                        root.insert(name, value);
                        return Ok(Value::Object(root));
                    }
                }
            }
            _ => {}
        }
    }

    Err(LeafError::parse("XML document has no root element"))
}

/// Undo the literal `\n` and `\"` escaping some exporters leave in XML files
///
/// Works on raw bytes so the parser still sees the document's declared encoding.
pub fn unescape_exported(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied().peekable();

    while let Some(b) = iter.next() {
        let unescaped = match (b, iter.peek()) {
            (b'\\', Some(b'n')) => Some(b'\n'),
            (b'\\', Some(b'"')) => Some(b'"'),
            _ => None,
        };
        match unescaped {
            Some(c) => {
                out.push(c);
                iter.next();
            }
            None => out.push(b),
        }
    }
    out
}
