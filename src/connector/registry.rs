//! Explicit connector factory.
//!
//! Configuration selects connectors by a `type` string; the registry maps
//! that string to a statically known constructor. There is no dynamic class
//! loading: an unknown type is a configuration error.

use std::collections::HashMap;

use super::csv::{CsvExtractor, CsvLoader};
use super::jsonl::{JsonlExtractor, JsonlLoader};
use super::{Extract, Load};
use crate::config::{ConfigError, ConfigValue};
use crate::error::RecastResult;

type ExtractorFactory = fn(&ConfigValue) -> RecastResult<Box<dyn Extract>>;
type LoaderFactory = fn(&ConfigValue) -> RecastResult<Box<dyn Load>>;

/// Maps connector type names to constructors.
pub struct ConnectorRegistry {
    extractors: HashMap<&'static str, ExtractorFactory>,
    loaders: HashMap<&'static str, LoaderFactory>,
}

impl ConnectorRegistry {
    /// The built-in connectors.
    pub fn standard() -> Self {
        let mut registry = Self {
            extractors: HashMap::new(),
            loaders: HashMap::new(),
        };
        registry.extractors.insert("csv", make_csv_extractor);
        registry.loaders.insert("csv", make_csv_loader);
        registry.extractors.insert("jsonl", make_jsonl_extractor);
        registry.loaders.insert("jsonl", make_jsonl_loader);
        registry
    }

    /// Builds an extractor from its configuration section.
    pub fn extractor(&self, config: &ConfigValue) -> RecastResult<Box<dyn Extract>> {
        let kind = connector_type(config)?;
        let factory = self.extractors.get(kind.as_str()).ok_or_else(|| {
            ConfigError::validation(format!("unknown extractor type '{}'", kind))
        })?;
        factory(config)
    }

    /// Builds a loader from its configuration section.
    pub fn loader(&self, config: &ConfigValue) -> RecastResult<Box<dyn Load>> {
        let kind = connector_type(config)?;
        let factory = self.loaders.get(kind.as_str()).ok_or_else(|| {
            ConfigError::validation(format!("unknown loader type '{}'", kind))
        })?;
        factory(config)
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn connector_type(config: &ConfigValue) -> Result<String, ConfigError> {
    Ok(config.get("type")?.as_string()?.to_string())
}

fn path_of(config: &ConfigValue) -> Result<String, ConfigError> {
    Ok(config.get("path")?.as_string()?.to_string())
}

fn make_csv_extractor(config: &ConfigValue) -> RecastResult<Box<dyn Extract>> {
    Ok(Box::new(CsvExtractor::new(path_of(config)?)))
}

fn make_csv_loader(config: &ConfigValue) -> RecastResult<Box<dyn Load>> {
    Ok(Box::new(CsvLoader::new(path_of(config)?)))
}

fn make_jsonl_extractor(config: &ConfigValue) -> RecastResult<Box<dyn Extract>> {
    Ok(Box::new(JsonlExtractor::new(path_of(config)?)))
}

fn make_jsonl_loader(config: &ConfigValue) -> RecastResult<Box<dyn Load>> {
    Ok(Box::new(JsonlLoader::new(path_of(config)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecastError;

    fn section(yaml: &str) -> ConfigValue {
        ConfigValue::from_yaml_str(yaml).unwrap()
    }

    #[test]
    fn test_known_types_construct() {
        let registry = ConnectorRegistry::standard();
        assert!(registry.extractor(&section("type: csv\npath: in.csv\n")).is_ok());
        assert!(registry.loader(&section("type: jsonl\npath: out.jsonl\n")).is_ok());
    }

    #[test]
    fn test_unknown_type_is_a_configuration_error() {
        let registry = ConnectorRegistry::standard();
        let err = registry
            .extractor(&section("type: carrier_pigeon\npath: coop\n"))
            .err()
            .unwrap();
        assert!(matches!(err, RecastError::Config(_)));
    }

    #[test]
    fn test_missing_type_is_a_configuration_error() {
        let registry = ConnectorRegistry::standard();
        assert!(registry.extractor(&section("path: in.csv\n")).is_err());
    }
}
