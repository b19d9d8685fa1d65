//! Benchmark task sets: JSONL loading, prompt assembly, evaluation.
//!
//! The benchmark suites themselves (BIG-Bench-Hard, MMLU, ...) are
//! external: their problems arrive as JSON-lines task files, one file
//! per task, under `<data_dir>/<benchmark_dir>/`.
//!
//! # Task file format
//!
//! ```text
//! {"input": "What is 2 + 2?", "target": "4"}
//! {"input": "What is 3 * 3?", "target": "9"}
//! ```
//!
//! Blank lines are skipped; anything else that fails to parse is a
//! hard error naming the file and line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::HarnessError;
use crate::harness::RunConfig;
use crate::model::AnswerModel;
use crate::BenchmarkKind;

/// One benchmark problem.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub input: String,
    pub target: String,
}

/// All problems from a single task file.
#[derive(Clone, Debug)]
pub struct TaskSet {
    /// Task name (file stem), used to pick the answer format.
    pub name: String,
    pub tasks: Vec<Task>,
}

/// Per-task accuracy within a suite run.
#[derive(Clone, Debug)]
pub struct TaskScore {
    pub task: String,
    pub correct: usize,
    pub total: usize,
}

/// Aggregate result of evaluating one benchmark suite.
#[derive(Clone, Debug, Default)]
pub struct SuiteScore {
    pub correct: usize,
    pub total: usize,
    pub per_task: Vec<TaskScore>,
}

impl SuiteScore {
    /// Fraction of evaluated problems answered correctly.
    pub fn overall(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }
}

/// A benchmark suite with its discovered task sets.
#[derive(Clone, Debug)]
pub struct Benchmark {
    pub kind: BenchmarkKind,
    pub task_sets: Vec<TaskSet>,
}

impl Benchmark {
    /// Discover and load every task file for `kind` under `data_dir`.
    pub fn load(data_dir: &Path, kind: BenchmarkKind) -> Result<Self, HarnessError> {
        let task_sets = discover(data_dir, kind)?;
        Ok(Self { kind, task_sets })
    }

    pub fn is_empty(&self) -> bool {
        self.task_sets.iter().all(|s| s.tasks.is_empty())
    }

    /// Evaluate the suite: for each task, a deterministic subset of
    /// problems is answered by the model and scored by exact match.
    ///
    /// The first `n_shots` problems of each task serve as few-shot
    /// demonstrations and are excluded from evaluation.
    pub fn evaluate(&self, model: &dyn AnswerModel, cfg: &RunConfig) -> SuiteScore {
        let mut score = SuiteScore::default();

        for (task_index, set) in self.task_sets.iter().enumerate() {
            if set.tasks.is_empty() {
                warn!(task = %set.name, "empty task file, skipping");
                continue;
            }

            // Demonstrations come off the front; always leave at least
            // one problem to evaluate.
            let shots = cfg.n_shots.min(set.tasks.len() - 1);
            let (demos, pool) = set.tasks.split_at(shots);
            let format = self.kind.answer_format(&set.name);
            let indices =
                subset_indices(pool.len(), cfg.subset_size, per_task_seed(cfg.seed, task_index));

            let mut correct = 0;
            for &i in &indices {
                let task = &pool[i];
                let prompt = build_prompt(demos, &task.input, cfg.enable_cot);
                let answer = model.generate(&prompt, format);
                if answers_match(&answer, &task.target) {
                    correct += 1;
                }
            }

            info!(
                benchmark = self.kind.display_name(),
                task = %set.name,
                correct,
                total = indices.len(),
                "task evaluated"
            );

            score.correct += correct;
            score.total += indices.len();
            score.per_task.push(TaskScore {
                task: set.name.clone(),
                correct,
                total: indices.len(),
            });
        }

        score
    }
}

/// Load one JSONL task file. The task name is the file stem.
pub fn load_task_file(path: &Path) -> Result<TaskSet, HarnessError> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("task")
        .to_string();

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut tasks = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let task: Task =
            serde_json::from_str(&line).map_err(|e| HarnessError::InvalidTaskData {
                path: path.display().to_string(),
                message: format!("line {}: {e}", lineno + 1),
            })?;
        tasks.push(task);
    }

    Ok(TaskSet { name, tasks })
}

/// Find and load every `.jsonl` task file for a suite, sorted by name.
pub fn discover(data_dir: &Path, kind: BenchmarkKind) -> Result<Vec<TaskSet>, HarnessError> {
    let dir = data_dir.join(kind.dir_name());

    let mut paths: Vec<PathBuf> = Vec::new();
    if dir.is_dir() {
        for entry in WalkDir::new(&dir).max_depth(1).into_iter().filter_map(Result::ok) {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
                paths.push(path.to_path_buf());
            }
        }
    }
    paths.sort();

    paths.iter().map(|p| load_task_file(p)).collect()
}

/// Assemble the generation prompt: few-shot Q/A demonstrations, then
/// the problem, then the answer stem (with an optional chain-of-thought
/// cue).
pub fn build_prompt(demos: &[Task], input: &str, enable_cot: bool) -> String {
    let mut prompt = String::new();
    for demo in demos {
        prompt.push_str(&format!("Q: {}\nA: {}\n\n", demo.input, demo.target));
    }
    prompt.push_str(&format!("Q: {input}\n"));
    if enable_cot {
        prompt.push_str("A: Let's think step by step.");
    } else {
        prompt.push_str("A:");
    }
    prompt
}

/// Case-insensitive trimmed exact match, ignoring surrounding
/// punctuation (BBH multiple-choice targets look like `(E)`) and
/// repeated whitespace.
pub fn answers_match(answer: &str, target: &str) -> bool {
    normalize(answer) == normalize(target)
}

fn normalize(s: &str) -> String {
    let collapsed = s
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    collapsed
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string()
}

fn per_task_seed(master_seed: u64, index: usize) -> u64 {
    master_seed
        .wrapping_add(index as u64)
        .wrapping_mul(0x517cc1b727220a95)
}

/// Deterministic subset of problem indices: seeded shuffle, truncate,
/// then restore file order.
fn subset_indices(pool_len: usize, subset_size: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..pool_len).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    indices.truncate(subset_size);
    indices.sort_unstable();
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerFormat;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_jsonl(dir: &Path, name: &str, tasks: &[(&str, &str)]) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        for (input, target) in tasks {
            writeln!(
                file,
                "{}",
                serde_json::to_string(&Task {
                    input: input.to_string(),
                    target: target.to_string(),
                })
                .unwrap()
            )
            .unwrap();
        }
        path
    }

    /// Scripted model: answers every problem with a fixed string.
    struct FixedModel(&'static str);

    impl AnswerModel for FixedModel {
        fn generate(&self, _prompt: &str, _format: AnswerFormat) -> String {
            self.0.to_string()
        }

        fn model_name(&self) -> String {
            "fixed".to_string()
        }
    }

    #[test]
    fn load_task_file_parses_lines() {
        let dir = tempdir().unwrap();
        let path = write_jsonl(dir.path(), "arith.jsonl", &[("1+1?", "2"), ("2+2?", "4")]);

        let set = load_task_file(&path).unwrap();
        assert_eq!(set.name, "arith");
        assert_eq!(set.tasks.len(), 2);
        assert_eq!(set.tasks[1].target, "4");
    }

    #[test]
    fn load_task_file_reports_bad_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        std::fs::write(&path, "{\"input\": \"q\", \"target\": \"a\"}\nnot json\n").unwrap();

        let err = load_task_file(&path).unwrap_err();
        match err {
            HarnessError::InvalidTaskData { message, .. } => assert!(message.contains("line 2")),
            other => panic!("expected InvalidTaskData, got {other:?}"),
        }
    }

    #[test]
    fn discover_sorts_and_filters() {
        let dir = tempdir().unwrap();
        let suite_dir = dir.path().join("gsm8k");
        std::fs::create_dir(&suite_dir).unwrap();
        write_jsonl(&suite_dir, "b_task.jsonl", &[("q", "1")]);
        write_jsonl(&suite_dir, "a_task.jsonl", &[("q", "1")]);
        std::fs::write(suite_dir.join("notes.txt"), "ignored").unwrap();

        let sets = discover(dir.path(), BenchmarkKind::Gsm8k).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].name, "a_task");
        assert_eq!(sets[1].name, "b_task");
    }

    #[test]
    fn discover_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        let sets = discover(dir.path(), BenchmarkKind::Mmlu).unwrap();
        assert!(sets.is_empty());
    }

    #[test]
    fn subset_is_deterministic() {
        let a = subset_indices(100, 10, 42);
        let b = subset_indices(100, 10, 42);
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        assert!(a.windows(2).all(|w| w[0] < w[1]));

        let c = subset_indices(100, 10, 43);
        assert_ne!(a, c);
    }

    #[test]
    fn subset_smaller_pool_takes_everything() {
        let all = subset_indices(4, 10, 7);
        assert_eq!(all, vec![0, 1, 2, 3]);
    }

    #[test]
    fn prompt_includes_shots_and_cot() {
        let demos = vec![
            Task {
                input: "1+1?".to_string(),
                target: "2".to_string(),
            },
            Task {
                input: "2+2?".to_string(),
                target: "4".to_string(),
            },
        ];

        let plain = build_prompt(&demos, "3+3?", false);
        assert!(plain.starts_with("Q: 1+1?\nA: 2\n\nQ: 2+2?\nA: 4\n\nQ: 3+3?\n"));
        assert!(plain.ends_with("A:"));

        let cot = build_prompt(&[], "3+3?", true);
        assert_eq!(cot, "Q: 3+3?\nA: Let's think step by step.");
    }

    #[test]
    fn answer_matching_normalizes() {
        assert!(answers_match("E", "(E)"));
        assert!(answers_match("yes", "Yes"));
        assert!(answers_match(" apple  banana ", "apple banana"));
        assert!(answers_match("42", "42."));
        assert!(!answers_match("A", "B"));
        assert!(!answers_match("apple banana", "banana apple"));
    }

    #[test]
    fn evaluate_scores_and_excludes_demos() {
        let dir = tempdir().unwrap();
        let suite_dir = dir.path().join("boolq");
        std::fs::create_dir(&suite_dir).unwrap();
        // First problem becomes the demonstration with n_shots = 1.
        write_jsonl(
            &suite_dir,
            "main.jsonl",
            &[("demo?", "Yes"), ("q1?", "Yes"), ("q2?", "No"), ("q3?", "Yes")],
        );

        let bench = Benchmark::load(dir.path(), BenchmarkKind::BoolQ).unwrap();
        let cfg = RunConfig {
            subset_size: 10,
            n_shots: 1,
            enable_cot: false,
            seed: 42,
        };

        let score = bench.evaluate(&FixedModel("Yes"), &cfg);
        assert_eq!(score.total, 3);
        assert_eq!(score.correct, 2);
        assert!((score.overall() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(score.per_task.len(), 1);
        assert_eq!(score.per_task[0].task, "main");
    }

    #[test]
    fn evaluate_empty_suite_scores_zero() {
        let dir = tempdir().unwrap();
        let bench = Benchmark::load(dir.path(), BenchmarkKind::Arc).unwrap();
        assert!(bench.is_empty());

        let score = bench.evaluate(&FixedModel("A"), &RunConfig::default());
        assert_eq!(score.total, 0);
        assert_eq!(score.overall(), 0.0);
    }
}
