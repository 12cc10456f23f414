//! CSV file connectors.

use std::path::PathBuf;

use log::{debug, info};

use super::{Extract, Load};
use crate::error::RecastResult;
use crate::expression::ast::Value;
use crate::row::Row;

/// Reads a headered CSV file into rows of string cells.
///
/// Every cell arrives as a string; the runner's declared column conversions
/// are the typing layer.
pub struct CsvExtractor {
    path: PathBuf,
}

impl CsvExtractor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Extract for CsvExtractor {
    fn extract(&mut self) -> RecastResult<Vec<Row>> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let headers = reader.headers()?.clone();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row: Row = headers
                .iter()
                .zip(record.iter())
                .map(|(column, cell)| (column.to_string(), Value::Str(cell.to_string())))
                .collect();
            rows.push(row);
        }
        debug!("extracted {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}

/// Writes rows to a CSV file.
///
/// The header is the first row's column order, extended with any columns
/// that only appear in later rows; missing cells and nulls are blank.
pub struct CsvLoader {
    path: PathBuf,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Load for CsvLoader {
    fn load(&mut self, rows: Vec<Row>) -> RecastResult<()> {
        if rows.is_empty() {
            debug!("no rows to load; {} left untouched", self.path.display());
            return Ok(());
        }

        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for name in row.column_names() {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.to_string());
                }
            }
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(&columns)?;
        for row in &rows {
            let record: Vec<String> = columns
                .iter()
                .map(|column| match row.get(column) {
                    None | Some(Value::Null) => String::new(),
                    Some(value) => value.to_string(),
                })
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
        info!("loaded {} rows into {}", rows.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");

        let rows = vec![
            Row::from([("a", Value::Str("1".into())), ("b", Value::Str("x".into()))]),
            Row::from([("a", Value::Str("2".into())), ("b", Value::Str("y".into()))]),
        ];
        CsvLoader::new(&path).load(rows.clone()).unwrap();

        let read = CsvExtractor::new(&path).extract().unwrap();
        assert_eq!(read, rows);
    }

    #[test]
    fn test_empty_load_creates_no_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("never.csv");
        CsvLoader::new(&path).load(Vec::new()).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_ragged_rows_blank_missing_cells() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");

        CsvLoader::new(&path)
            .load(vec![
                Row::from([("a", Value::Int(1))]),
                Row::from([("a", Value::Int(2)), ("b", Value::Null)]),
            ])
            .unwrap();

        let read = CsvExtractor::new(&path).extract().unwrap();
        assert_eq!(read[0].get("b"), Some(&Value::Str(String::new())));
        assert_eq!(read[1].get("b"), Some(&Value::Str(String::new())));
    }
}
