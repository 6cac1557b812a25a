use crate::document::parse_json;
use crate::error::Result;
use crate::mapper::config::{Config, Substitution};
use crate::mapper::naming::{join, normalize, substitute};
use crate::mapper::overrides::Overrides;
use crate::mapper::registry::NodeRegistry;
use crate::mapper::types::{Leaf, NodeId};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

/// Position of the walk: which table and row we are filling, and under which column
#[derive(Debug, Clone)]
struct Frame {
    table: String,
    path: String,
    node: NodeId,
    parent: Option<NodeId>,
}

impl Frame {
    fn root(table: &str) -> Self {
        Frame {
            table: table.to_string(),
            path: String::new(),
            node: NodeId::generate(),
            parent: None,
        }
    }

    /// Same row, one key deeper
    fn field(&self, key: &str) -> Self {
        Frame {
            table: self.table.clone(),
            path: join(&self.path, key),
            node: self.node.clone(),
            parent: self.parent.clone(),
        }
    }

    /// A new row of the table named after the current path
    fn split(self) -> Self {
        Frame {
            table: self.path,
            path: String::new(),
            node: NodeId::generate(),
            parent: Some(self.node),
        }
    }

    /// A new row for one array element
    fn element(&self) -> Self {
        Frame {
            table: self.table.clone(),
            path: String::new(),
            node: NodeId::generate(),
            parent: Some(self.node.clone()),
        }
    }
}

/// Flattens JSON documents into an ordered sequence of leaves
pub struct Mapper {
    column_subs: Vec<Substitution>,
    table_subs: Vec<Substitution>,
    boundaries: Vec<String>,
    overrides: Overrides,
    registry: Arc<NodeRegistry>,
    leaves: Vec<Leaf>,
}

impl Mapper {
    /// Create a mapper with its own node registry
    pub fn new(config: Config) -> Result<Self> {
        Self::with_registry(config, Arc::new(NodeRegistry::new()))
    }

    /// Create a mapper that deduplicates `_tree` leaves through a shared registry
    pub fn with_registry(config: Config, registry: Arc<NodeRegistry>) -> Result<Self> {
        config.validate()?;

        Ok(Mapper {
            boundaries: config.boundaries(),
            overrides: Overrides::new(&config.column_overrides),
            column_subs: config.column_subs,
            table_subs: config.table_subs,
            registry,
            leaves: Vec::new(),
        })
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Map a parsed document, returning its leaves in visitation order
    pub fn map(&mut self, name: &str, value: &Value) -> Vec<Leaf> {
        self.walk(Frame::root(name), value);

        let leaves = std::mem::take(&mut self.leaves);
        debug!("Mapped document '{}' into {} leaves", name, leaves.len());
        leaves
    }

    /// Map only the subtree at a dot-separated key path, e.g. "foo.bar"
    pub fn map_path(&mut self, name: &str, path: &str, value: &Value) -> Vec<Leaf> {
        let keys: Vec<&str> = path.split('.').filter(|k| !k.is_empty()).collect();
        let selected = select(value, &keys);
        self.map(name, &selected)
    }

    /// Parse and map raw JSON bytes. A parse failure yields no leaves.
    pub fn map_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<Vec<Leaf>> {
        let value = parse_json(bytes.to_vec())?;
        Ok(self.map(name, &value))
    }

    fn walk(&mut self, frame: Frame, value: &Value) {
        match value {
            Value::Null => {}
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                self.add(frame, value);
            }
            Value::Array(items) => {
                let mut frame = self.enter(frame);
                if !frame.table.is_empty() && !frame.path.is_empty() {
                    frame.table = join(&frame.table, &frame.path);
                    frame.path.clear();
                }

                for item in items {
                    self.walk(frame.element(), item);
                }
            }
            Value::Object(fields) => {
                let frame = self.enter(frame);
                for (key, child) in fields {
                    self.walk(frame.field(key), child);
                }
            }
        }
    }

    /// Split into a new table when the current path is a configured boundary
    fn enter(&self, frame: Frame) -> Frame {
        if frame.path.is_empty() {
            return frame;
        }

        let path = normalize(&frame.path);
        if self.boundaries.iter().any(|b| *b == path) {
            debug!("Table boundary at '{}' under '{}'", path, frame.table);
            frame.split()
        } else {
            frame
        }
    }

    fn add(&mut self, frame: Frame, value: &Value) {
        let raw_path = if frame.path.is_empty() { "val" } else { frame.path.as_str() };
        let mut path = substitute(normalize(raw_path), &self.column_subs);
        let mut name = substitute(normalize(&frame.table), &self.table_subs);

        let Frame { mut node, mut parent, .. } = frame;

        if let Some(target) = self.overrides.resolve(&name, &path) {
            debug!("Override {}.{} -> {}.{}", name, path, target.table, target.column);
            name = target.table.clone();
            path = target.column.clone();
            parent = Some(node);
            node = NodeId::generate();
        }

        let first_sight = self.registry.register(&node, parent.as_ref());
        let tree = first_sight.then(|| Leaf::tree(&name, node.clone(), parent.clone()));

        self.emit(Leaf::new(name, path, node, parent, value.clone()));
        if let Some(tree) = tree {
            self.emit(tree);
        }
    }

    fn emit(&mut self, leaf: Leaf) {
        trace!(name = %leaf.name, path = %leaf.path, id = %leaf.id, "leaf");
        self.leaves.push(leaf);
    }
}

/// Follow `keys` through objects; arrays on the way fan out over their elements
fn select(value: &Value, keys: &[&str]) -> Value {
    let Some((key, rest)) = keys.split_first() else {
        return value.clone();
    };

    match value {
        Value::Object(fields) => fields.get(*key).map_or(Value::Null, |child| select(child, rest)),
        Value::Array(items) => Value::Array(items.iter().map(|item| select(item, keys)).collect()),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::config::ColumnOverride;
    use crate::error::LeafError;
    use crate::mapper::types::DataType;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashSet;

    fn data(leaves: &[Leaf]) -> Vec<&Leaf> {
        leaves.iter().filter(|l| !l.is_tree()).collect()
    }

    fn trees(leaves: &[Leaf]) -> Vec<&Leaf> {
        leaves.iter().filter(|l| l.is_tree()).collect()
    }

    fn find<'a>(leaves: &'a [Leaf], name: &str, path: &str) -> &'a Leaf {
        leaves
            .iter()
            .find(|l| l.name == name && l.path == path)
            .unwrap_or_else(|| panic!("no leaf {}/{}", name, path))
    }

    #[test]
    fn test_inlines_nested_object_fields() {
        let mut mapper = Mapper::new(Config::default()).unwrap();
        let leaves = mapper.map("doc", &json!({"foo": "v", "bar": {"baz": "w"}}));

        assert_eq!(data(&leaves).len(), 2);
        assert_eq!(find(&leaves, "doc", "foo").value, json!("v"));
        assert_eq!(find(&leaves, "doc", "bar__baz").value, json!("w"));

        let trees = trees(&leaves);
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].value, json!("doc"));
        assert_eq!(trees[0].parent_id, None);
        assert_eq!(trees[0].id, find(&leaves, "doc", "foo").id);
    }

    #[test]
    fn test_scalar_array_becomes_child_table() {
        let mut mapper = Mapper::new(Config::default()).unwrap();
        let leaves = mapper.map("doc", &json!({"top": 1, "baz": ["a", 1, false]}));

        let root = find(&leaves, "doc", "top").id.clone();
        let elements: Vec<&Leaf> = data(&leaves).into_iter().filter(|l| l.name == "doc__baz").collect();

        assert_eq!(elements.len(), 3);
        assert_eq!(
            elements.iter().map(|l| l.value.clone()).collect::<Vec<_>>(),
            vec![json!("a"), json!(1), json!(false)]
        );
        assert_eq!(
            elements.iter().map(|l| l.data_type).collect::<Vec<_>>(),
            vec![DataType::String, DataType::Number, DataType::Boolean]
        );
        assert!(elements.iter().all(|l| l.path == "val"));
        assert!(elements.iter().all(|l| l.parent_id.as_ref() == Some(&root)));

        let ids: HashSet<&NodeId> = elements.iter().map(|&l| &l.id).collect();
        assert_eq!(ids.len(), 3);

        // one _tree per element node plus the root
        assert_eq!(trees(&leaves).len(), 4);
    }

    #[test]
    fn test_array_of_objects_rows() {
        let mut mapper = Mapper::new(Config::default()).unwrap();
        let leaves = mapper.map("doc", &json!({"baz": [{"foo1": 1.3}, {"foo2": 1}]}));

        let foo1 = find(&leaves, "doc__baz", "foo1");
        let foo2 = find(&leaves, "doc__baz", "foo2");
        assert_eq!(foo1.value, json!(1.3));
        assert_ne!(foo1.id, foo2.id);
        assert_eq!(foo1.parent_id, foo2.parent_id);
    }

    #[test]
    fn test_nulls_produce_nothing() {
        let mut mapper = Mapper::new(Config::default()).unwrap();
        let leaves = mapper.map("doc", &json!({"a": null, "b": [null], "c": "x"}));

        assert_eq!(data(&leaves).len(), 1);
        assert_eq!(trees(&leaves).len(), 1);
        assert!(mapper.map("doc", &Value::Null).is_empty());
    }

    #[test]
    fn test_table_boundary_splits_once() {
        let input = json!({
            "ObjectA": {"SubObject": {"foo": {"bar": "a", "baz": "b", "qux": 3}}},
            "other": "o"
        });

        let config = Config {
            table_names: vec!["ObjectA__SubObject".to_string()],
            ..Config::default()
        };
        let mut mapper = Mapper::new(config).unwrap();
        let leaves = mapper.map("test", &input);

        let root = find(&leaves, "test", "other");
        let split: Vec<&Leaf> = data(&leaves)
            .into_iter()
            .filter(|l| l.name == "object_a__sub_object")
            .collect();

        assert_eq!(split.len(), 3);
        let paths: HashSet<&str> = split.iter().map(|&l| l.path.as_str()).collect();
        assert_eq!(paths, HashSet::from(["foo__bar", "foo__baz", "foo__qux"]));

        let nodes: HashSet<&NodeId> = split.iter().map(|&l| &l.id).collect();
        assert_eq!(nodes.len(), 1);
        assert!(split.iter().all(|l| l.parent_id.as_ref() == Some(&root.id)));
        assert_eq!(trees(&leaves).len(), 2);
    }

    #[test]
    fn test_table_boundary_on_array() {
        let config = Config {
            table_names: vec!["items".to_string()],
            ..Config::default()
        };
        let mut mapper = Mapper::new(config).unwrap();
        let leaves = mapper.map("doc", &json!({"x": 1, "items": [{"a": 1}, {"a": 2}]}));

        let root = find(&leaves, "doc", "x");
        let rows: Vec<&Leaf> = data(&leaves).into_iter().filter(|l| l.name == "items").collect();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|l| l.path == "a"));
        assert_ne!(rows[0].id, rows[1].id);

        let parent = rows[0].parent_id.as_ref().unwrap();
        assert_eq!(rows[1].parent_id.as_ref(), Some(parent));
        assert_ne!(parent, &root.id);
        assert!(rows.iter().all(|l| &l.id != parent));
        assert!(!leaves.iter().any(|l| l.name == "doc__items"));
    }

    #[test]
    fn test_map_path_selects_subtree() {
        let input = json!({
            "foo": {
                "bar": [
                    {
                        "ObjectA": {"SubObject": {"foo": {"bar": "a"}}},
                        "ObjectB": {"SubObject": {"foo": {"bar": "b"}}}
                    }
                ]
            }
        });

        let mut mapper = Mapper::new(Config::default()).unwrap();
        let leaves = mapper.map_path("test", "foo.bar", &input);
        let mut found: Vec<(String, String)> = data(&leaves)
            .iter()
            .map(|l| (l.name.clone(), l.path.clone()))
            .collect();
        found.sort();

        assert_eq!(
            found,
            vec![
                ("test".to_string(), "object_a__sub_object__foo__bar".to_string()),
                ("test".to_string(), "object_b__sub_object__foo__bar".to_string()),
            ]
        );

        let config = Config {
            table_names: vec!["ObjectA__SubObject".to_string(), "ObjectB__SubObject".to_string()],
            ..Config::default()
        };
        let mut mapper = Mapper::new(config).unwrap();
        let leaves = mapper.map_path("test", "foo.bar", &input);
        let mut found: Vec<(String, String)> = data(&leaves)
            .iter()
            .map(|l| (l.name.clone(), l.path.clone()))
            .collect();
        found.sort();

        assert_eq!(
            found,
            vec![
                ("object_a__sub_object".to_string(), "foo__bar".to_string()),
                ("object_b__sub_object".to_string(), "foo__bar".to_string()),
            ]
        );
    }

    #[test]
    fn test_map_path_missing_key() {
        let mut mapper = Mapper::new(Config::default()).unwrap();
        assert!(mapper.map_path("doc", "nope.deeper", &json!({"a": 1})).is_empty());
    }

    #[test]
    fn test_column_override_spawns_node() {
        let input = json!({"foo": {"bar": 1}});

        let mut plain = Mapper::new(Config::default()).unwrap();
        let leaves = plain.map("test", &input);
        assert_eq!(find(&leaves, "test", "foo__bar").value, json!(1));

        let config = Config {
            column_overrides: vec![ColumnOverride::new("test", "foo__bar", "a", "b")],
            ..Config::default()
        };
        let mut mapper = Mapper::new(config).unwrap();
        let leaves = mapper.map("test", &input);

        let fields = data(&leaves);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "a");
        assert_eq!(fields[0].path, "b");

        // the root node never received a field, so only the spawned node has a _tree
        let trees = trees(&leaves);
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].id, fields[0].id);
        assert_eq!(trees[0].value, json!("a"));

        let root = fields[0].parent_id.clone().unwrap();
        assert_ne!(root, fields[0].id);
    }

    #[test]
    fn test_override_parent_is_root_node() {
        let config = Config {
            column_overrides: vec![ColumnOverride::new("test", "foo__bar", "a", "b")],
            ..Config::default()
        };
        let mut mapper = Mapper::new(config).unwrap();
        let leaves = mapper.map("test", &json!({"foo": {"bar": 1}, "keep": true}));

        let root = find(&leaves, "test", "keep");
        let moved = find(&leaves, "a", "b");
        assert_eq!(moved.parent_id.as_ref(), Some(&root.id));
    }

    #[test]
    fn test_substitutions_apply_to_names_and_paths() {
        let config = Config {
            column_subs: vec![Substitution::new("identifier", "id")],
            table_subs: vec![Substitution::new("my_document", "doc")],
            ..Config::default()
        };
        let mut mapper = Mapper::new(config).unwrap();
        let leaves = mapper.map("MyDocument", &json!({"userIdentifier": "u1", "tags": ["x"]}));

        assert_eq!(find(&leaves, "doc", "user_id").value, json!("u1"));
        assert_eq!(find(&leaves, "doc__tags", "val").value, json!("x"));
    }

    #[test]
    fn test_invalid_config_is_rejected_up_front() {
        let config = Config {
            column_subs: vec![Substitution::new("", "x")],
            ..Config::default()
        };
        assert!(matches!(Mapper::new(config), Err(LeafError::Config(_))));
    }

    #[test]
    fn test_map_bytes_parse_error() {
        let mut mapper = Mapper::new(Config::default()).unwrap();
        let err = mapper.map_bytes("doc", b"{\"a\": ").unwrap_err();
        assert!(matches!(err, LeafError::Parse(_)));

        let leaves = mapper.map_bytes("doc", br#"{"a": "b"}"#).unwrap();
        assert_eq!(leaves.len(), 2);
    }

    #[test]
    fn test_tree_leaves_match_distinct_pairs() {
        let input = json!({
            "flat": "one",
            "foo": [
                {"bar": {"baz": "qux"}},
                {"bar2": {"baz2": "qux2", "arrX": [{"x1": 1}, {"x1": 12, "x2": 2}], "arr": [{"arr3": [3]}, {"arr2": [1, 2]}]}}
            ]
        });

        let mut mapper = Mapper::new(Config::default()).unwrap();
        let leaves = mapper.map("test1", &input);

        let pairs: HashSet<(&NodeId, Option<&NodeId>)> =
            data(&leaves).into_iter().map(|l| (&l.id, l.parent_id.as_ref())).collect();
        let tree_pairs: Vec<(&NodeId, Option<&NodeId>)> =
            trees(&leaves).into_iter().map(|l| (&l.id, l.parent_id.as_ref())).collect();

        assert_eq!(tree_pairs.len(), pairs.len());
        assert_eq!(tree_pairs.iter().cloned().collect::<HashSet<_>>(), pairs);

        let tables: HashSet<&str> = data(&leaves).into_iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            tables,
            HashSet::from([
                "test1",
                "test1__foo",
                "test1__foo__bar2__arr_x",
                "test1__foo__bar2__arr__arr3",
                "test1__foo__bar2__arr__arr2",
            ])
        );
    }

    #[test]
    fn test_shared_registry_dedups_across_mappers() {
        let registry = Arc::new(NodeRegistry::new());
        let mut a = Mapper::with_registry(Config::default(), Arc::clone(&registry)).unwrap();
        let mut b = Mapper::with_registry(Config::default(), Arc::clone(&registry)).unwrap();

        a.map("one", &json!({"x": 1}));
        b.map("two", &json!({"y": 2, "z": [1]}));

        assert_eq!(registry.len(), 3);
        assert!(Arc::ptr_eq(a.registry(), b.registry()));
    }
}
