//! Resource payload representation.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Value is the decoded content of one resource, independent of whether it
/// came from JSON, YAML or the Kubernetes API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Map),
}

/// Map is a field map. Fields are kept sorted by name so that walking a map
/// is deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Map {
    pub fields: BTreeMap<String, Value>,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Looks up a nested field by its dotted path, e.g. `metadata.name`.
    /// Returns None as soon as a segment is missing or not a map.
    pub fn lookup(&self, dotted: &str) -> Option<&Value> {
        dotted
            .split('.')
            .try_fold(self, |current, segment| current.as_map()?.get(segment))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        fn type_order(v: &Value) -> u8 {
            match v {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Int(_) => 2,
                Value::Float(_) => 3,
                Value::String(_) => 4,
                Value::List(_) => 5,
                Value::Map(_) => 6,
            }
        }

        let type_cmp = type_order(self).cmp(&type_order(other));
        if type_cmp != Ordering::Equal {
            return type_cmp;
        }

        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::List(l) => l.hash(state),
            Value::Map(m) => {
                for (k, v) in &m.fields {
                    k.hash(state);
                    v.hash(state);
                }
            }
        }
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for Map {}

impl PartialOrd for Map {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Map {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fields.cmp(&other.fields)
    }
}

impl Map {
    pub fn new() -> Self {
        Map {
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

impl FromIterator<(String, Value)> for Map {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Map {
            fields: iter.into_iter().collect(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Parse a value from JSON.
pub fn from_json(json: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(json)
}

/// Serialize a value to JSON.
pub fn to_json(value: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// Parse a value from a single YAML document.
pub fn from_yaml(yaml: &str) -> Result<Value, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

/// Parse every document of a YAML stream. Empty documents decode to
/// [`Value::Null`] and are dropped.
pub fn from_yaml_documents(yaml: &str) -> Result<Vec<Value>, serde_yaml::Error> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(yaml) {
        let value = Value::deserialize(document)?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Null, Value::Null);
        assert_eq!(Value::Bool(true), Value::Bool(true));
        assert_ne!(Value::Bool(true), Value::Bool(false));
        assert_eq!(Value::Int(42), Value::Int(42));
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_eq!(Value::String("hello".into()), Value::String("hello".into()));
    }

    #[test]
    fn test_map_operations() {
        let mut map = Map::new();
        assert!(map.is_empty());

        map.set("key", Value::String("value".into()));
        assert!(map.has("key"));
        assert_eq!(map.get("key"), Some(&Value::String("value".into())));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_lookup() {
        let value = from_json(r#"{"metadata":{"name":"web","labels":{"app":"web"}}}"#).unwrap();
        assert_eq!(value.lookup("metadata.name").and_then(Value::as_str), Some("web"));
        assert_eq!(value.lookup("metadata.labels.app").and_then(Value::as_str), Some("web"));
        assert_eq!(value.lookup("metadata.namespace"), None);
        assert_eq!(value.lookup("metadata.name.first"), None);
    }

    #[test]
    fn test_json_and_yaml_agree() {
        let json = from_json(r#"{"kind":"Pod","spec":{"replicas":3,"ratio":0.5,"tags":["a","b"]}}"#)
            .unwrap();
        let yaml = from_yaml("kind: Pod\nspec:\n  replicas: 3\n  ratio: 0.5\n  tags: [a, b]\n").unwrap();
        assert_eq!(json, yaml);
    }

    #[test]
    fn test_from_serde_json() {
        let json = serde_json::json!({"a": 1, "b": [true, null], "c": 1.5});
        let value = Value::from(json);
        let expected = from_json(r#"{"a":1,"b":[true,null],"c":1.5}"#).unwrap();
        assert_eq!(value, expected);
    }

    #[test]
    fn test_yaml_documents_skip_empty() {
        let docs = from_yaml_documents("---\nkind: A\n---\n---\nkind: B\n").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].lookup("kind").and_then(Value::as_str), Some("B"));
    }

    #[test]
    fn test_to_json() {
        let mut map = Map::new();
        map.set("count", Value::Int(2));
        map.set("name", Value::String("x".into()));
        assert_eq!(to_json(&Value::Map(map)).unwrap(), r#"{"count":2,"name":"x"}"#);
    }
}
