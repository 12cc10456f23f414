//! JSON-lines file connectors: one JSON object per line.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use log::{debug, info};
use serde_json::{Map, Value as Json};

use super::{Extract, Load};
use crate::error::RecastResult;
use crate::expression::ast::Value;
use crate::row::Row;

pub struct JsonlExtractor {
    path: PathBuf,
}

impl JsonlExtractor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Extract for JsonlExtractor {
    fn extract(&mut self) -> RecastResult<Vec<Row>> {
        let file = std::fs::File::open(&self.path)?;
        let mut rows = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let object: Map<String, Json> = serde_json::from_str(&line)?;
            let row: Row = object
                .into_iter()
                .map(|(column, value)| (column, value_from_json(value)))
                .collect();
            rows.push(row);
        }
        debug!("extracted {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}

pub struct JsonlLoader {
    path: PathBuf,
}

impl JsonlLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Load for JsonlLoader {
    fn load(&mut self, rows: Vec<Row>) -> RecastResult<()> {
        if rows.is_empty() {
            debug!("no rows to load; {} left untouched", self.path.display());
            return Ok(());
        }

        let mut file = std::fs::File::create(&self.path)?;
        for row in &rows {
            let object: Map<String, Json> = row
                .iter()
                .map(|(column, value)| (column.to_string(), json_from_value(value)))
                .collect();
            serde_json::to_writer(&mut file, &Json::Object(object))?;
            file.write_all(b"\n")?;
        }
        info!("loaded {} rows into {}", rows.len(), self.path.display());
        Ok(())
    }
}

fn value_from_json(value: Json) -> Value {
    match value {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Json::String(s) => Value::Str(s),
        // Nested structures are flattened to their JSON text; the row model
        // is scalar-only.
        other => Value::Str(other.to_string()),
    }
}

fn json_from_value(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::Number((*i).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::Str(s) => Json::String(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_keeps_types() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.jsonl");

        let rows = vec![
            Row::from([
                ("a", Value::Int(1)),
                ("b", Value::Float(2.5)),
                ("c", Value::Str("x".into())),
                ("d", Value::Null),
            ]),
            Row::from([("a", Value::Int(2)), ("e", Value::Bool(true))]),
        ];
        JsonlLoader::new(&path).load(rows.clone()).unwrap();

        let read = JsonlExtractor::new(&path).extract().unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].get("a"), Some(&Value::Int(1)));
        assert_eq!(read[0].get("b"), Some(&Value::Float(2.5)));
        assert_eq!(read[0].get("d"), Some(&Value::Null));
        assert_eq!(read[1].get("e"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_empty_load_creates_no_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("never.jsonl");
        JsonlLoader::new(&path).load(Vec::new()).unwrap();
        assert!(!path.exists());
    }
}
