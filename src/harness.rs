//! Run configuration and the benchmark driver loop.

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::HarnessError;
use crate::model::AnswerModel;
use crate::report::{self, RunRecord};
use crate::suite::Benchmark;
use crate::BenchmarkKind;

/// Evaluation settings shared by every benchmark in a run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Problems evaluated per task (subset limit for speed).
    pub subset_size: usize,
    /// Few-shot demonstrations taken from the front of each task.
    pub n_shots: usize,
    /// Append a chain-of-thought cue to the answer stem.
    pub enable_cot: bool,
    /// Seed for deterministic subset selection.
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            subset_size: 10,
            n_shots: 3,
            enable_cot: false,
            seed: 42,
        }
    }
}

/// Wall-clock a closure.
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed())
}

/// Drive the selected benchmarks against one model configuration,
/// appending one CSV row per benchmark.
///
/// `skip_missing` controls what happens when a suite has no task data:
/// under `All` it is skipped with a warning, while an explicitly
/// requested suite is an error.
pub fn run_benchmarks(
    model: &dyn AnswerModel,
    kinds: &[BenchmarkKind],
    data_dir: &Path,
    cfg: &RunConfig,
    csv_path: &Path,
    skip_missing: bool,
) -> Result<Vec<RunRecord>, HarnessError> {
    let mut records = Vec::new();

    for &kind in kinds {
        let bench = Benchmark::load(data_dir, kind)?;
        if bench.is_empty() {
            if skip_missing {
                warn!(benchmark = kind.display_name(), "no task data, skipping");
                continue;
            }
            return Err(HarnessError::MissingTaskData {
                benchmark: kind.display_name().to_string(),
                dir: data_dir.join(kind.dir_name()).display().to_string(),
            });
        }

        info!(
            benchmark = kind.display_name(),
            model = %model.model_name(),
            subset_size = cfg.subset_size,
            "running benchmark"
        );

        let (score, elapsed) = timed(|| bench.evaluate(model, cfg));
        let record = RunRecord::new(
            kind.display_name(),
            &model.model_name(),
            cfg.enable_cot,
            score.overall(),
            cfg.subset_size,
            elapsed.as_secs_f64(),
        );
        report::append_record(csv_path, &record)?;

        info!(
            benchmark = kind.display_name(),
            score = record.overall_score,
            secs = record.total_eval_secs,
            "benchmark complete"
        );
        records.push(record);
    }

    Ok(records)
}
