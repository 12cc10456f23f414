//! Layered, dotted-path configuration.
//!
//! A [`Configuration`] is assembled from ordered layers (file, environment,
//! explicit overrides); later layers override earlier ones key-by-key for
//! nested mappings and wholesale for leaves. All keys are lowercased on
//! ingestion, making lookups case-insensitive.

pub mod error;
pub mod value;

use std::path::Path;

use log::debug;

pub use error::{ConfigError, ConfigResult};
pub use value::ConfigValue;

/// The parallel namespace consulted when an entity-specific key is absent.
const TEMPLATE_NAMESPACE: &str = "template";

/// A merged, normalized configuration store.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    root: ConfigValue,
}

impl Configuration {
    /// Builds a configuration from ordered layers; later layers win.
    pub fn from_layers(layers: Vec<ConfigValue>) -> Self {
        let mut root = ConfigValue::empty();
        for layer in layers {
            root = root.merge(layer.normalize_keys());
        }
        Self { root }
    }

    /// Reads one YAML file as a layer.
    pub fn layer_from_file(path: &Path) -> ConfigResult<ConfigValue> {
        let text = std::fs::read_to_string(path)?;
        ConfigValue::from_yaml_str(&text)
    }

    /// Collects environment variables carrying the given prefix as a layer.
    /// `__` separates nesting levels; values are parsed as YAML scalars so
    /// numbers and booleans keep their types.
    pub fn layer_from_env(prefix: &str) -> ConfigValue {
        let mut layer = ConfigValue::empty();
        for (key, raw) in std::env::vars() {
            let Some(stripped) = key.strip_prefix(prefix) else {
                continue;
            };
            if stripped.is_empty() {
                continue;
            }
            let path: Vec<String> = stripped
                .split("__")
                .map(|segment| segment.to_lowercase())
                .collect();
            debug!("configuration from environment: {}", path.join("."));
            layer = layer.merge(nested_value(&path, scalar_from_text(&raw)));
        }
        layer
    }

    /// Parses `key.path=value` override pairs as a layer.
    pub fn layer_from_pairs(pairs: &[String]) -> ConfigResult<ConfigValue> {
        let mut layer = ConfigValue::empty();
        for pair in pairs {
            let (path, raw) = pair.split_once('=').ok_or_else(|| {
                ConfigError::validation(format!("override '{}' is not of the form key=value", pair))
            })?;
            let segments: Vec<String> = path.split('.').map(str::to_lowercase).collect();
            if segments.iter().any(String::is_empty) {
                return Err(ConfigError::validation(format!(
                    "override '{}' has an empty key segment",
                    pair
                )));
            }
            layer = layer.merge(nested_value(&segments, scalar_from_text(raw)));
        }
        Ok(layer)
    }

    /// The merged root value.
    pub fn root(&self) -> &ConfigValue {
        &self.root
    }

    /// Looks up a dotted path.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotFound`] when any segment is absent.
    pub fn get(&self, path: &str) -> ConfigResult<&ConfigValue> {
        self.lookup(path)
            .ok_or_else(|| ConfigError::not_found(path.to_string()))
    }

    /// Looks up a dotted path, falling back to the given value.
    pub fn get_or(&self, path: &str, fallback: ConfigValue) -> ConfigValue {
        self.lookup(path).cloned().unwrap_or(fallback)
    }

    /// Looks up a dotted path, then the parallel `template` namespace, then
    /// the fallback. The template path replaces the entity-specific prefix
    /// (the first two segments) with `template`, so
    /// `transformations.myjob.extract` falls back to `template.extract`.
    ///
    /// Sources are tried in order and the first hit wins; there is no
    /// error-driven control flow here.
    pub fn get_with_template_fallback(&self, path: &str, fallback: ConfigValue) -> ConfigValue {
        let sources = [Some(path.to_string()), template_path(path)];
        sources
            .into_iter()
            .flatten()
            .find_map(|candidate| self.lookup(&candidate).cloned())
            .unwrap_or(fallback)
    }

    fn lookup(&self, path: &str) -> Option<&ConfigValue> {
        let mut current = &self.root;
        for segment in path.split('.') {
            let segment = segment.to_lowercase();
            current = match current {
                ConfigValue::Object(obj) => obj.get(&segment)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// The template-namespace twin of an entity path, when the path is deep
/// enough to have an entity prefix.
fn template_path(path: &str) -> Option<String> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.len() < 3 {
        return None;
    }
    let mut twin = vec![TEMPLATE_NAMESPACE];
    twin.extend(&segments[2..]);
    Some(twin.join("."))
}

/// Wraps a scalar into nested single-key objects along the path.
fn nested_value(path: &[String], leaf: ConfigValue) -> ConfigValue {
    let mut value = leaf;
    for segment in path.iter().rev() {
        let mut obj = std::collections::HashMap::new();
        obj.insert(segment.clone(), value);
        value = ConfigValue::Object(obj);
    }
    value
}

/// Parses override/environment text as a YAML scalar, keeping plain strings
/// as strings.
fn scalar_from_text(raw: &str) -> ConfigValue {
    match ConfigValue::from_yaml_str(raw) {
        Ok(value @ (ConfigValue::Bool(_)
        | ConfigValue::Integer(_)
        | ConfigValue::Float(_)
        | ConfigValue::Null)) => value,
        _ => ConfigValue::string(raw),
    }
}
