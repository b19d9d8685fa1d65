//! Append-only CSV results file.
//!
//! One row per benchmark/model run. The header is written exactly once,
//! when the file does not yet exist; every run after that appends. The
//! file is opened and closed per write, so interleaved runs from
//! separate invocations accumulate in the same file.

use std::fs::OpenOptions;
use std::path::Path;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// One results row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(rename = "Benchmark")]
    pub benchmark: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Model Name")]
    pub model_name: String,
    #[serde(rename = "CoT Enabled")]
    pub cot_enabled: bool,
    #[serde(rename = "Overall Score")]
    pub overall_score: f64,
    #[serde(rename = "Samples per Benchmark")]
    pub samples: usize,
    #[serde(rename = "Total Evaluation Time (s)")]
    pub total_eval_secs: f64,
}

impl RunRecord {
    /// Build a row stamped with the current local time.
    pub fn new(
        benchmark: &str,
        model_name: &str,
        cot_enabled: bool,
        overall_score: f64,
        samples: usize,
        total_eval_secs: f64,
    ) -> Self {
        Self {
            benchmark: benchmark.to_string(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            model_name: model_name.to_string(),
            cot_enabled,
            overall_score,
            samples,
            total_eval_secs,
        }
    }
}

/// Append one row, writing the header only when creating the file.
pub fn append_record(path: &Path, record: &RunRecord) -> Result<(), HarnessError> {
    let write_header = !path.exists();

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(write_header)
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;
    Ok(())
}

/// Read every row back for plotting. Extra columns are ignored.
pub fn read_records(path: &Path) -> Result<Vec<RunRecord>, HarnessError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let mut records = Vec::new();
    for result in reader.deserialize() {
        records.push(result?);
    }
    Ok(records)
}
