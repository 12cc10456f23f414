//! Configuration value tree.
//!
//! [`ConfigValue`] represents configuration data independently of the format
//! it was loaded from, with recursive merging for layered sources.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};

/// Format-agnostic configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Null/None value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<ConfigValue>),
    /// Object/table of key-value pairs
    Object(HashMap<String, ConfigValue>),
}

impl ConfigValue {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        Self::String(s.into())
    }

    /// Create a new object value
    pub fn object(map: HashMap<String, ConfigValue>) -> Self {
        Self::Object(map)
    }

    /// Create an empty object
    pub fn empty() -> Self {
        Self::Object(HashMap::new())
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Bool(_) => "boolean",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::String(_) => "string",
            ConfigValue::Array(_) => "array",
            ConfigValue::Object(_) => "object",
        }
    }

    /// Try to convert to boolean
    pub fn as_bool(&self) -> ConfigResult<bool> {
        match self {
            ConfigValue::Bool(b) => Ok(*b),
            _ => Err(ConfigError::validation(format!(
                "Expected boolean, found {}",
                self.type_name()
            ))),
        }
    }

    /// Try to convert to integer
    pub fn as_integer(&self) -> ConfigResult<i64> {
        match self {
            ConfigValue::Integer(i) => Ok(*i),
            ConfigValue::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
            _ => Err(ConfigError::validation(format!(
                "Expected integer, found {}",
                self.type_name()
            ))),
        }
    }

    /// Try to convert to string
    pub fn as_string(&self) -> ConfigResult<&str> {
        match self {
            ConfigValue::String(s) => Ok(s),
            _ => Err(ConfigError::validation(format!(
                "Expected string, found {}",
                self.type_name()
            ))),
        }
    }

    /// Try to convert to array
    pub fn as_array(&self) -> ConfigResult<&Vec<ConfigValue>> {
        match self {
            ConfigValue::Array(arr) => Ok(arr),
            _ => Err(ConfigError::validation(format!(
                "Expected array, found {}",
                self.type_name()
            ))),
        }
    }

    /// Try to convert to object
    pub fn as_object(&self) -> ConfigResult<&HashMap<String, ConfigValue>> {
        match self {
            ConfigValue::Object(obj) => Ok(obj),
            _ => Err(ConfigError::validation(format!(
                "Expected object, found {}",
                self.type_name()
            ))),
        }
    }

    /// Get value at object key
    pub fn get(&self, key: &str) -> ConfigResult<&ConfigValue> {
        let obj = self.as_object()?;
        obj.get(key)
            .ok_or_else(|| ConfigError::not_found(format!("Key '{}'", key)))
    }

    /// Merge this value with another value.
    /// Objects are merged recursively; arrays and scalars are replaced.
    pub fn merge(mut self, other: ConfigValue) -> ConfigValue {
        match (&mut self, other) {
            (ConfigValue::Object(ref mut left), ConfigValue::Object(right)) => {
                for (key, value) in right {
                    match left.remove(&key) {
                        Some(existing) => {
                            left.insert(key, existing.merge(value));
                        }
                        None => {
                            left.insert(key, value);
                        }
                    }
                }
                self
            }
            (_, other_value) => other_value,
        }
    }

    /// Recursively lowercases object keys. Lookup paths are lowercased to
    /// match, making the store case-insensitive.
    pub fn normalize_keys(self) -> ConfigValue {
        match self {
            ConfigValue::Object(obj) => ConfigValue::Object(
                obj.into_iter()
                    .map(|(k, v)| (k.to_lowercase(), v.normalize_keys()))
                    .collect(),
            ),
            ConfigValue::Array(arr) => {
                ConfigValue::Array(arr.into_iter().map(ConfigValue::normalize_keys).collect())
            }
            other => other,
        }
    }

    /// Convert from a parsed YAML document.
    pub fn from_yaml_value(value: serde_yaml::Value) -> ConfigResult<Self> {
        let converted = match value {
            serde_yaml::Value::Null => ConfigValue::Null,
            serde_yaml::Value::Bool(b) => ConfigValue::Bool(b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ConfigValue::Integer(i)
                } else {
                    ConfigValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_yaml::Value::String(s) => ConfigValue::String(s),
            serde_yaml::Value::Sequence(seq) => {
                let arr: Result<Vec<_>, _> =
                    seq.into_iter().map(Self::from_yaml_value).collect();
                ConfigValue::Array(arr?)
            }
            serde_yaml::Value::Mapping(map) => {
                let mut obj = HashMap::new();
                for (k, v) in map {
                    let key = match k {
                        serde_yaml::Value::String(s) => s,
                        other => {
                            return Err(ConfigError::validation(format!(
                                "configuration keys must be strings, found {:?}",
                                other
                            )))
                        }
                    };
                    obj.insert(key, Self::from_yaml_value(v)?);
                }
                ConfigValue::Object(obj)
            }
            serde_yaml::Value::Tagged(tagged) => Self::from_yaml_value(tagged.value)?,
        };
        Ok(converted)
    }

    /// Parse from a YAML string
    pub fn from_yaml_str(s: &str) -> ConfigResult<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(s)?;
        Self::from_yaml_value(value)
    }

    /// Render as a YAML string
    pub fn to_yaml_string(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => write!(f, "null"),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Integer(i) => write!(f, "{}", i),
            ConfigValue::Float(fl) => write!(f, "{}", fl),
            ConfigValue::String(s) => write!(f, "\"{}\"", s),
            ConfigValue::Array(arr) => {
                write!(f, "[")?;
                for (i, item) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            ConfigValue::Object(obj) => {
                write!(f, "{{")?;
                for (i, (key, value)) in obj.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "\"{}\": {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_recursive_for_objects() {
        let base = ConfigValue::from_yaml_str("a: {x: 1, y: old}\nb: keep\n").unwrap();
        let layer = ConfigValue::from_yaml_str("a: {y: new, z: true}\n").unwrap();

        let merged = base.merge(layer);
        let a = merged.get("a").unwrap();
        assert_eq!(a.get("x").unwrap().as_integer().unwrap(), 1);
        assert_eq!(a.get("y").unwrap().as_string().unwrap(), "new");
        assert!(a.get("z").unwrap().as_bool().unwrap());
        assert_eq!(merged.get("b").unwrap().as_string().unwrap(), "keep");
    }

    #[test]
    fn test_merge_replaces_non_object_leaves() {
        let base = ConfigValue::from_yaml_str("a: [1, 2, 3]\n").unwrap();
        let layer = ConfigValue::from_yaml_str("a: [9]\n").unwrap();
        let merged = base.merge(layer);
        assert_eq!(merged.get("a").unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_normalize_keys() {
        let value = ConfigValue::from_yaml_str("Outer:\n  Inner: 1\n").unwrap().normalize_keys();
        assert!(value.get("outer").is_ok());
        assert!(value.get("outer").unwrap().get("inner").is_ok());
    }

    #[test]
    fn test_yaml_round_trip() {
        let value = ConfigValue::from_yaml_str("name: test\ncount: 42\nenabled: true\n").unwrap();
        let rendered = value.to_yaml_string().unwrap();
        let reparsed = ConfigValue::from_yaml_str(&rendered).unwrap();
        assert_eq!(reparsed, value);
    }
}
