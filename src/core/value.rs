//! Values stored in front matter and in the book configuration

use std::fmt;

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Key to value mapping used for metadata and configuration objects.
/// Keeps the order keys were read or inserted in.
pub type Map = IndexMap<String, Value>;

/// A closed YAML/JSON-like value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    /// Integers above `i64::MAX`
    Unsigned(u64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Map),
}

impl Value {
    /// Borrow as a string slice if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// View as a list of strings; `None` unless every element is a string
    pub fn as_str_list(&self) -> Option<Vec<String>> {
        match self {
            Value::List(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => None,
        }
    }

    /// Borrow as a nested object
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Plain text form of a scalar, used for form fields and CLI arguments
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Unsigned(u) => Some(u.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::List(_) | Value::Map(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let yaml = serde_yaml::Value::deserialize(deserializer)?;
        Value::try_from(yaml).map_err(D::Error::custom)
    }
}

impl TryFrom<serde_yaml::Value> for Value {
    type Error = String;

    /// Scalar mapping keys (`2021: draft`, `true: x`) become their text.
    /// Lists or mappings used as keys are rejected.
    fn try_from(yaml: serde_yaml::Value) -> Result<Self, Self::Error> {
        Ok(match yaml {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Unsigned(u)
                } else {
                    n.as_f64().map_or(Value::Null, Value::Float)
                }
            }
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(items) => Value::List(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            serde_yaml::Value::Mapping(mapping) => {
                let mut map = Map::with_capacity(mapping.len());
                for (key, value) in mapping {
                    map.insert(key_text(key)?, Value::try_from(value)?);
                }
                Value::Map(map)
            }
            serde_yaml::Value::Tagged(tagged) => Value::try_from(tagged.value)?,
        })
    }
}

fn key_text(key: serde_yaml::Value) -> Result<String, String> {
    match key {
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Tagged(tagged) => key_text(tagged.value),
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => {
            Err("mapping keys must be scalars".to_string())
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scalar_text() {
            Some(text) => f.write_str(&text),
            None => match serde_json::to_string(self) {
                Ok(json) => f.write_str(&json),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items.into_iter().map(Value::String).collect())
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_scalars_keep_their_kind() {
        let value: Value = serde_yaml::from_str("a: 12\nb: 1.5\nc: true\nd: ~\ne: text").unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map["a"], Value::Integer(12));
        assert_eq!(map["b"], Value::Float(1.5));
        assert_eq!(map["c"], Value::Bool(true));
        assert_eq!(map["d"], Value::Null);
        assert_eq!(map["e"], Value::from("text"));
    }

    #[test]
    fn test_str_list_requires_all_strings() {
        let names = Value::from(vec!["a.md".to_string(), "b.md".to_string()]);
        assert_eq!(names.as_str_list(), Some(vec!["a.md".into(), "b.md".into()]));

        let mixed = Value::List(vec![Value::from("a.md"), Value::Integer(3)]);
        assert_eq!(mixed.as_str_list(), None);
    }

    #[test]
    fn test_scalar_keys_become_text() {
        let value: Value = serde_yaml::from_str("2021: draft\ntrue: yes\n1.5: x\nname: n").unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map["2021"], Value::from("draft"));
        assert_eq!(map["true"], Value::from("yes"));
        assert_eq!(map["1.5"], Value::from("x"));
        assert_eq!(map["name"], Value::from("n"));
    }

    #[test]
    fn test_collection_keys_are_rejected() {
        assert!(serde_yaml::from_str::<Value>("? [a, b]\n: x\n").is_err());
    }

    #[test]
    fn test_keys_keep_document_order() {
        let value: Value = serde_yaml::from_str("zeta: 1\nalpha: 2\nmid: 3").unwrap();
        let keys: Vec<&str> = value.as_map().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(serde_yaml::to_string(&value).unwrap(), "zeta: 1\nalpha: 2\nmid: 3\n");
    }

    #[test]
    fn test_large_integers_stay_integers() {
        let value: Value = serde_yaml::from_str("id: 18446744073709551615").unwrap();
        let id = &value.as_map().unwrap()["id"];
        assert_eq!(id, &Value::Unsigned(u64::MAX));
        assert_eq!(id.to_string(), "18446744073709551615");
        assert_eq!(serde_yaml::to_string(&value).unwrap(), "id: 18446744073709551615\n");
    }
}
