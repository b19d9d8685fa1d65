use clap::ValueEnum;

use crate::model::AnswerFormat;

pub mod error;
pub mod harness;
pub mod model;
pub mod plot;
pub mod report;
pub mod suite;

/// Benchmark suite to run.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum BenchmarkKind {
    /// Run every suite that has task data present.
    #[default]
    All,
    /// BIG-Bench-Hard complex-reasoning tasks.
    BigBenchHard,
    /// Massive Multitask Language Understanding (multiple choice).
    Mmlu,
    /// Grade-school math word problems (integer answers).
    Gsm8k,
    /// AI2 Reasoning Challenge science questions (multiple choice).
    Arc,
    /// Boolean yes/no reading comprehension.
    BoolQ,
    /// Logical reasoning over passages (multiple choice).
    LogiQa,
    /// Discrete reasoning over paragraphs (free-text answers).
    Drop,
}

impl BenchmarkKind {
    /// Concrete suites, in the order they run under `All`.
    pub const SUITES: [BenchmarkKind; 7] = [
        BenchmarkKind::BigBenchHard,
        BenchmarkKind::Mmlu,
        BenchmarkKind::Gsm8k,
        BenchmarkKind::Arc,
        BenchmarkKind::BoolQ,
        BenchmarkKind::LogiQa,
        BenchmarkKind::Drop,
    ];

    /// Name written to the results CSV.
    pub fn display_name(&self) -> &'static str {
        match self {
            BenchmarkKind::All => "All",
            BenchmarkKind::BigBenchHard => "BIGBenchHard",
            BenchmarkKind::Mmlu => "MMLU",
            BenchmarkKind::Gsm8k => "GSM8K",
            BenchmarkKind::Arc => "ARC",
            BenchmarkKind::BoolQ => "BoolQ",
            BenchmarkKind::LogiQa => "LogiQA",
            BenchmarkKind::Drop => "DROP",
        }
    }

    /// Directory under the data root holding this suite's task files.
    pub fn dir_name(&self) -> &'static str {
        match self {
            BenchmarkKind::All => "",
            BenchmarkKind::BigBenchHard => "big_bench_hard",
            BenchmarkKind::Mmlu => "mmlu",
            BenchmarkKind::Gsm8k => "gsm8k",
            BenchmarkKind::Arc => "arc",
            BenchmarkKind::BoolQ => "boolq",
            BenchmarkKind::LogiQa => "logiqa",
            BenchmarkKind::Drop => "drop",
        }
    }

    /// Answer format for one of this suite's task files.
    ///
    /// Most suites have a single format; BIG-Bench-Hard mixes formats
    /// per task, so the task name (file stem) decides.
    pub fn answer_format(&self, task: &str) -> AnswerFormat {
        match self {
            BenchmarkKind::BigBenchHard => match task {
                "boolean_expressions" | "causal_judgement" | "navigate" | "web_of_lies" => {
                    AnswerFormat::Boolean
                }
                "multistep_arithmetic_two" | "object_counting" => AnswerFormat::Integer,
                "word_sorting" | "dyck_languages" => AnswerFormat::FreeText,
                "date_understanding" => AnswerFormat::MultipleChoice { choices: 6 },
                "logical_deduction_three_objects" => AnswerFormat::MultipleChoice { choices: 5 },
                _ => AnswerFormat::MultipleChoice { choices: 4 },
            },
            BenchmarkKind::Mmlu | BenchmarkKind::Arc | BenchmarkKind::LogiQa => {
                AnswerFormat::MultipleChoice { choices: 4 }
            }
            BenchmarkKind::Gsm8k => AnswerFormat::Integer,
            BenchmarkKind::BoolQ => AnswerFormat::Boolean,
            BenchmarkKind::Drop | BenchmarkKind::All => AnswerFormat::FreeText,
        }
    }
}
