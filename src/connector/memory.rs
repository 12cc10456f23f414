//! In-memory connectors, for tests and embedding.

use std::sync::{Arc, Mutex};

use super::{Extract, Load};
use crate::error::RecastResult;
use crate::row::Row;

/// Serves a fixed batch of rows.
pub struct MemoryExtractor {
    rows: Vec<Row>,
}

impl MemoryExtractor {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

impl Extract for MemoryExtractor {
    fn extract(&mut self) -> RecastResult<Vec<Row>> {
        Ok(std::mem::take(&mut self.rows))
    }
}

/// Collects loaded rows into a shared sink the caller keeps a handle to.
pub struct MemoryLoader {
    sink: Arc<Mutex<Vec<Row>>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self {
            sink: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A handle to the rows collected so far.
    pub fn sink(&self) -> Arc<Mutex<Vec<Row>>> {
        Arc::clone(&self.sink)
    }
}

impl Default for MemoryLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Load for MemoryLoader {
    fn load(&mut self, rows: Vec<Row>) -> RecastResult<()> {
        let mut sink = self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        sink.extend(rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ast::Value;

    #[test]
    fn test_memory_round_trip() {
        let rows = vec![Row::from([("a", Value::Int(1))])];
        let mut extractor = MemoryExtractor::new(rows.clone());
        let mut loader = MemoryLoader::new();
        let sink = loader.sink();

        let extracted = extractor.extract().unwrap();
        loader.load(extracted).unwrap();

        assert_eq!(*sink.lock().unwrap(), rows);
    }
}
