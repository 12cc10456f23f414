//! Transformation jobs and the run controller.
//!
//! One job converts one (input format, output format) pair: resolve the
//! conversion path, pull rows from the extractor, run them through the
//! compiled pipeline, hand the survivors to the loader. Jobs share only
//! read-only mapping definitions and configuration, so one job's failure
//! never corrupts another; the controller decides whether a failure stops
//! the run or is recorded and skipped.

use log::{error, info};

use super::pipeline::TransformationPipeline;
use super::runner::TransformationRunner;
use crate::connector::{Extract, Load};
use crate::error::{RecastError, RecastResult};
use crate::expression::evaluator::OperatorTable;
use crate::mapping::format::Format;
use crate::mapping::Mapping;

/// One configured unit of work.
pub struct TransformationJob {
    pub name: String,
    pub input_format: Format,
    pub output_format: Format,
    pub extractor: Box<dyn Extract>,
    pub loader: Box<dyn Load>,
}

impl TransformationJob {
    /// Runs the job to completion, returning the number of rows loaded.
    pub fn run(&mut self, mapping: &Mapping, table: &OperatorTable) -> RecastResult<usize> {
        info!(
            "job '{}': converting {} to {}",
            self.name, self.input_format, self.output_format
        );

        let path = mapping.resolve_path(&self.input_format, &self.output_format)?;
        let pipeline = TransformationPipeline::compile(path)?;

        let rows = self.extractor.extract()?;
        let extracted = rows.len();

        let output = TransformationRunner::new(table).run(&pipeline, rows)?;
        let produced = output.len();
        info!(
            "job '{}': {} of {} rows produced output",
            self.name, produced, extracted
        );

        self.loader.load(output)?;
        Ok(produced)
    }
}

/// Outcome of running a set of jobs.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failures: Vec<(String, RecastError)>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs jobs in declaration order.
///
/// Without `fail_fast`, a failing job is logged with its context and the run
/// continues; the summary carries every failure so the caller can report a
/// non-zero exit. With `fail_fast`, the first failure is re-raised.
pub fn run_jobs(
    jobs: Vec<TransformationJob>,
    mapping: &Mapping,
    table: &OperatorTable,
    fail_fast: bool,
) -> RecastResult<RunSummary> {
    let mut summary = RunSummary::default();
    for mut job in jobs {
        match job.run(mapping, table) {
            Ok(_) => summary.succeeded += 1,
            Err(err) => {
                error!("job '{}' failed: {}", job.name, err);
                if fail_fast {
                    return Err(err);
                }
                summary.failures.push((job.name, err));
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{MemoryExtractor, MemoryLoader};
    use crate::expression::ast::Value;
    use crate::mapping::types::{MappingSpec, TransformationEntry, TransformationSet};
    use crate::row::Row;

    fn mapping() -> Mapping {
        let spec = MappingSpec::new(Format::named("a"), Format::named("b")).with_forward(
            TransformationSet::from_pairs([("c", vec![TransformationEntry::new("a * 2")])]),
        );
        Mapping::new(vec![spec])
    }

    fn job(name: &str, input: &str, output: &str, rows: Vec<Row>) -> TransformationJob {
        TransformationJob {
            name: name.to_string(),
            input_format: Format::named(input),
            output_format: Format::named(output),
            extractor: Box::new(MemoryExtractor::new(rows)),
            loader: Box::new(MemoryLoader::new()),
        }
    }

    #[test]
    fn test_job_runs_end_to_end() {
        let loader = MemoryLoader::new();
        let sink = loader.sink();
        let mut job = TransformationJob {
            name: "ab".to_string(),
            input_format: Format::named("a"),
            output_format: Format::named("b"),
            extractor: Box::new(MemoryExtractor::new(vec![Row::from([("a", Value::Int(3))])])),
            loader: Box::new(loader),
        };

        let table = OperatorTable::standard();
        let produced = job.run(&mapping(), &table).unwrap();
        assert_eq!(produced, 1);
        assert_eq!(sink.lock().unwrap()[0].get("c"), Some(&Value::Int(6)));
    }

    #[test]
    fn test_run_continues_past_failed_jobs() {
        let bad = job("bad", "a", "nowhere", vec![]);
        let good = job("good", "a", "b", vec![Row::from([("a", Value::Int(1))])]);

        let table = OperatorTable::standard();
        let summary = run_jobs(vec![bad, good], &mapping(), &table, false).unwrap();
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].0, "bad");
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn test_fail_fast_re_raises() {
        let bad = job("bad", "a", "nowhere", vec![]);
        let table = OperatorTable::standard();
        let err = run_jobs(vec![bad], &mapping(), &table, true).unwrap_err();
        assert!(matches!(err, RecastError::NoConversionPath { .. }));
    }
}
